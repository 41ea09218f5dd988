// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the agent, one per semantic class (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("packet filter pattern has no non-zero field")]
    InvalidIdentifier,

    #[error("failed to create raw socket: {0}")]
    CreateSocket(String),

    #[error("failed to attach packet filter: {0}")]
    ApplyFilter(String),

    #[error("received packet buffer shorter than IP+TCP header")]
    MessageTooShort,

    #[error("failed to read sshd config: {0}")]
    SshdConfigParseFailed(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("failed to read authorized_keys file: {0}")]
    ReadAuthorizedKeysFileFailed(String),

    #[error("failed to write authorized_keys file: {0}")]
    WriteAuthorizedKeysFileFailed(String),

    #[error("invalid port number: {0}")]
    InvalidPortNumber(u32),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("failed to fetch metadata: {0}")]
    FetchMetadataFailed(String),

    #[error("failed to update metadata status: {0}")]
    UpdateMetadataFailed(String),

    #[error("no actioner registered with the watcher")]
    NoRegisteredActioner,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("command failed: {0}")]
    RunCmdFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
