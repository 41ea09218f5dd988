// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-up configuration: CLI flags with an `AGENT_`-prefixed environment
//! fallback for each one (spec §6).

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

fn parse_duration_secs(s: &str) -> Result<Duration, String> {
    s.parse::<u64>().map(Duration::from_secs).map_err(|e| e.to_string())
}

#[derive(Parser, Debug, Clone)]
#[command(name = "droplet-agent", about = "Reconciles SSH access and runs troubleshooting exports from metadata")]
pub struct Config {
    /// Enable debug logging (spec §6).
    #[arg(long, env = "AGENT_DEBUG", default_value_t = false)]
    pub debug: bool,

    /// Log to syslog instead of stdout/stderr (spec §6).
    #[arg(long, env = "AGENT_SYSLOG", default_value_t = false)]
    pub syslog: bool,

    /// sshd's config file, watched for `AuthorizedKeysFile`/`Port` changes.
    #[arg(long = "sshd_config", env = "AGENT_SSHD_CONFIG_PATH", default_value = "/etc/ssh/sshd_config")]
    pub sshd_config_path: String,

    /// Write `authorized_keys` through a re-exec'd `-util` helper subprocess
    /// instead of in-process (spec §4.3). Selected once at start-up, not a
    /// per-write fallback.
    #[arg(long, env = "AGENT_HELPER_MODE", default_value_t = false)]
    pub helper_mode: bool,

    /// Overrides the port used for the port-knock pattern and sshd config
    /// parsing (spec §6, §4.2 precedence).
    #[arg(long = "sshd_port", env = "AGENT_SSHD_PORT")]
    pub sshd_port_override: Option<u16>,

    /// Fallback `os_user` for keys metadata doesn't attribute to one.
    #[arg(long, env = "AGENT_DEFAULT_OS_USER", default_value = "root")]
    pub default_os_user: String,

    /// Base URL of the metadata service (fetch + status-push + completion).
    #[arg(long, env = "AGENT_METADATA_BASE_URL", default_value = "http://169.254.169.254/metadata/v1")]
    pub metadata_base_url: String,

    /// Use the local HTTP-push listener instead of the port-knock sniffer
    /// (spec §4.4's alternate C4 transport).
    #[arg(long, env = "AGENT_METADATA_PUSH", default_value_t = false)]
    pub metadata_push: bool,

    /// Address the push listener binds when `metadata_push` is set.
    #[arg(long, env = "AGENT_METADATA_PUSH_ADDR", default_value = "127.0.0.1:8910")]
    pub metadata_push_addr: SocketAddr,

    /// How often the expired-session-key sweep runs, independent of metadata
    /// change events (spec §4.11 supplement).
    #[arg(long, env = "AGENT_EXPIRY_SWEEP_INTERVAL_SECS", value_parser = parse_duration_secs, default_value = "60")]
    pub expiry_sweep_interval: Duration,

    /// Grace period given to in-flight actioner dispatches and
    /// investigations on shutdown.
    #[arg(long, env = "AGENT_SHUTDOWN_TIMEOUT_SECS", value_parser = parse_duration_secs, default_value = "30")]
    pub shutdown_timeout: Duration,

    /// Emit JSON logs instead of the default human-readable format.
    #[arg(long, env = "AGENT_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
