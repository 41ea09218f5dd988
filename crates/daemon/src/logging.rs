// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: `--debug`/`AGENT_DEBUG` raises the filter to `debug`,
//! `--syslog`/`AGENT_SYSLOG` sends records to the local syslog daemon instead
//! of stdout (spec §6).
//!
//! The syslog path deliberately skips installing a `tracing` `Subscriber`:
//! with the `log` feature enabled, `tracing`'s macros fall back to emitting
//! through the `log` facade whenever no subscriber is active, so pointing
//! `log`'s global logger at syslog is enough to redirect everything there.

use crate::config::Config;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to connect to syslog: {0}")]
    Syslog(#[from] syslog::Error),
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }))
}

fn max_level(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Installs the process-wide logging sink. Returns nothing to keep alive:
/// unlike the teacher's file appender, neither output mode here is
/// non-blocking, so there is no `WorkerGuard` to hold.
pub fn setup_logging(config: &Config) -> Result<(), LoggingError> {
    if config.syslog {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_DAEMON,
            hostname: None,
            process: "droplet-agent".to_string(),
            pid: std::process::id(),
        };
        let logger = syslog::unix(formatter)?;
        if log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger))).is_ok() {
            log::set_max_level(max_level(config.debug));
        }
    } else if config.log_json {
        let filter = env_filter(config.debug);
        tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
    } else {
        let filter = env_filter(config.debug);
        tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    }

    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
