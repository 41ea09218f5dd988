// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Allow-listed command collector (C8, spec §4.8): runs one of a fixed set
//! of diagnostic commands to completion, scans its stdout line by line, and
//! emits each line through the timestamp parser.

use crate::timestamp::TimestampParser;
use agentadapters::subprocess;
use agentadapters::LogEmitter;
use agentcore::{Error, LogEntry, TimeWindow};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::process::Command;

/// How far back `journalctl` looks when no time window was supplied.
const DEFAULT_LOOKBACK: Duration = Duration::minutes(15);

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub executable: &'static str,
    pub argv_prefix: &'static [&'static str],
}

pub fn default_allow_list() -> HashMap<&'static str, CommandSpec> {
    [
        ("top", CommandSpec { executable: "/usr/bin/top", argv_prefix: &["-bn", "1"] }),
        ("ps", CommandSpec { executable: "/usr/bin/ps", argv_prefix: &["aux"] }),
        (
            "journalctl",
            CommandSpec { executable: "/usr/bin/journalctl", argv_prefix: &["--no-pager", "--output=short-iso"] },
        ),
    ]
    .into_iter()
    .collect()
}

/// Builds the `Command` for an allow-listed `command:<tag>` artifact.
/// `tag` is the part after the `command:` prefix; journalctl gets an
/// additional `--since`/`--until` (or just `--since` with no window) appended.
pub fn build_command(
    allow_list: &HashMap<&'static str, CommandSpec>,
    tag: &str,
    window: Option<TimeWindow>,
    now: DateTime<Utc>,
) -> Result<Command, Error> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgs("empty command tag".to_string()));
    }
    let spec = allow_list.get(trimmed).ok_or_else(|| Error::InvalidArgs(format!("command not allow-listed: {trimmed}")))?;

    let mut cmd = Command::new(spec.executable);
    cmd.args(spec.argv_prefix);
    if trimmed == "journalctl" {
        match window {
            Some(w) => {
                cmd.arg(format!("--since={}", w.start.to_rfc3339()));
                cmd.arg(format!("--until={}", w.end.to_rfc3339()));
            }
            None => {
                cmd.arg(format!("--since={}", (now - DEFAULT_LOOKBACK).to_rfc3339()));
            }
        }
    }
    Ok(cmd)
}

pub struct CommandRunner<E: LogEmitter> {
    emitter: Arc<E>,
    parser: Arc<TimestampParser>,
    allow_list: HashMap<&'static str, CommandSpec>,
}

impl<E: LogEmitter> CommandRunner<E> {
    pub fn new(emitter: Arc<E>, parser: Arc<TimestampParser>) -> Self {
        CommandRunner { emitter, parser, allow_list: default_allow_list() }
    }

    #[cfg(test)]
    pub fn with_allow_list(
        emitter: Arc<E>,
        parser: Arc<TimestampParser>,
        allow_list: HashMap<&'static str, CommandSpec>,
    ) -> Self {
        CommandRunner { emitter, parser, allow_list }
    }

    /// Runs the allow-listed command named by `tag` and emits each stdout
    /// line. Surfaces both construction and run failures so the caller can
    /// `emit_error(investigation_uuid, "command_runner", ...)`.
    pub async fn run(&self, investigation_uuid: &str, tag: &str, window: Option<TimeWindow>) -> Result<(), Error> {
        let now = Utc::now();
        let cmd = build_command(&self.allow_list, tag, window, now)?;
        let output = subprocess::run_with_timeout(cmd, subprocess::DEFAULT_COMMAND_TIMEOUT, tag).await?;
        if !output.status.success() {
            return Err(Error::RunCmdFailed(format!("{tag} exited with {:?}", output.status.code())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            let (timestamp, timestamp_parsed) = self.parser.parse(line, now);
            let entry = LogEntry { original: line.to_string(), timestamp, timestamp_parsed };
            self.emitter.emit_log(investigation_uuid, &format!("command:{tag}"), &entry).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_runner_tests.rs"]
mod tests;
