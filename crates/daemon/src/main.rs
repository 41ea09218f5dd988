// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! droplet-agent
//!
//! Reconciles metadata-driven SSH access and runs troubleshooting exports
//! for a single droplet (spec §4.11).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use agentdaemon::{lifecycle, logging, util_mode, Config};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `-util` is a hidden sentinel for the authorized_keys helper-subprocess
    // mode (spec §4.3); it has its own argument shape and bypasses clap
    // entirely, the same way a re-exec'd helper never goes through normal
    // start-up.
    let mut args = std::env::args();
    let _program = args.next();
    let rest: Vec<String> = args.collect();
    if rest.first().map(String::as_str) == Some("-util") {
        std::process::exit(util_mode::run(&rest[1..]));
    }

    let config = Config::parse();

    if let Err(err) = logging::setup_logging(&config) {
        eprintln!("failed to set up logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = lifecycle::run(config).await {
        error!(%err, "droplet-agent exited with an error");
        return Err(err.into());
    }

    Ok(())
}
