// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentengine: the reconciliation logic driving every actioner, plus the
//! troubleshooting exporter's orchestration, on top of `agentcore` types and
//! `agentadapters` I/O.

pub mod actioner;
pub mod command_runner;
pub mod exporter;
pub mod file_tailer;
pub mod reconciler;
pub mod reserved_ipv6_actioner;
pub mod ring_buffer;
pub mod ssh_keys_actioner;
pub mod timestamp;
pub mod troubleshooting_actioner;
pub mod watcher;

pub use actioner::{Actioner, Dispatcher};
pub use command_runner::CommandRunner;
pub use exporter::Exporter;
pub use file_tailer::FileTailer;
pub use reconciler::Reconciler;
pub use reserved_ipv6_actioner::ReservedIpv6Actioner;
pub use ssh_keys_actioner::SshKeysActioner;
pub use timestamp::TimestampParser;
pub use troubleshooting_actioner::TroubleshootingActioner;
pub use watcher::{HttpPushWatcher, MetadataWatcher, PortKnockWatcher, RateLimiter};
