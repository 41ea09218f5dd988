// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentdaemon: start-up configuration, logging, and lifecycle wiring for
//! the `droplet-agent` binary (spec §4.11/§6).

pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod util_mode;

pub use config::Config;
pub use lifecycle::{run, LifecycleError};
pub use logging::setup_logging;
