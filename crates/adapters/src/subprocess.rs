// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution for the allow-listed command runner (C8, spec §4.8).

use agentcore::Error;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for a single allow-listed command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `cmd` with a timeout. The child is killed (via `Command`'s drop) if
/// the timeout elapses before it exits.
pub async fn run_with_timeout(mut cmd: Command, timeout: Duration, description: &str) -> Result<Output, Error> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(Error::RunCmdFailed(format!("{description} failed: {io_err}"))),
        Err(_elapsed) => Err(Error::RunCmdFailed(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
