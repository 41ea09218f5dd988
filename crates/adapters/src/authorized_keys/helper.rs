// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helper-subprocess variant of `AuthorizedKeysStore` (spec §4.3): re-execs
//! this same binary in `-util` mode so the read/write happens under the
//! target user's credentials instead of the daemon's own. Selected
//! uniformly at start-up, not a fallback.

use super::{passwd_entry_for_user, AuthorizedKeysStore, PasswdEntry};
use agentcore::{expand_pattern, Error};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const HELPER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HelperAuthorizedKeysStore {
    helper_exe: PathBuf,
    pattern: String,
    passwd_path: PathBuf,
}

impl HelperAuthorizedKeysStore {
    pub fn new(helper_exe: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        HelperAuthorizedKeysStore { helper_exe: helper_exe.into(), pattern: pattern.into(), passwd_path: PathBuf::from("/etc/passwd") }
    }

    pub fn with_passwd_path(mut self, passwd_path: impl Into<PathBuf>) -> Self {
        self.passwd_path = passwd_path.into();
        self
    }

    fn resolve(&self, os_user: &str) -> Result<(PathBuf, PasswdEntry), Error> {
        let entry = passwd_entry_for_user(&self.passwd_path, os_user)?;
        let path = PathBuf::from(expand_pattern(&self.pattern, &entry.home, os_user));
        Ok((path, entry))
    }
}

/// Builds the `-util <subcommand> <path>` invocation, dropped to `entry`'s
/// uid/gid before exec so the helper actually runs under the target user's
/// credentials instead of the daemon's own (spec §4.3).
fn helper_command(helper_exe: &std::path::Path, subcommand: &str, path: &std::path::Path, entry: &PasswdEntry) -> Command {
    let mut cmd = std::process::Command::new(helper_exe);
    cmd.arg("-util").arg(subcommand).arg(path);
    cmd.uid(entry.uid);
    cmd.gid(entry.gid);
    Command::from(cmd)
}

#[async_trait]
impl AuthorizedKeysStore for HelperAuthorizedKeysStore {
    async fn read(&self, os_user: &str) -> Result<String, Error> {
        let (path, entry) = self.resolve(os_user)?;
        let output = tokio::time::timeout(HELPER_TIMEOUT, helper_command(&self.helper_exe, "read", &path, &entry).output())
            .await
            .map_err(|_| Error::ReadAuthorizedKeysFileFailed("helper read timed out".to_string()))?
            .map_err(|e| Error::ReadAuthorizedKeysFileFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(Error::ReadAuthorizedKeysFileFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn write(&self, os_user: &str, contents: &str) -> Result<(), Error> {
        let (path, entry) = self.resolve(os_user)?;
        let mut child = helper_command(&self.helper_exe, "write", &path, &entry)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;

        let mut stdin = child.stdin.take().ok_or_else(|| Error::WriteAuthorizedKeysFileFailed("helper stdin unavailable".to_string()))?;
        stdin.write_all(contents.as_bytes()).await.map_err(map_broken_pipe)?;
        drop(stdin);

        let output = tokio::time::timeout(HELPER_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::WriteAuthorizedKeysFileFailed("helper write timed out".to_string()))?
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(Error::WriteAuthorizedKeysFileFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }
}

fn map_broken_pipe(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::BrokenPipe {
        Error::WriteAuthorizedKeysFileFailed("helper exited before reading all of stdin".to_string())
    } else {
        Error::WriteAuthorizedKeysFileFailed(e.to_string())
    }
}

#[cfg(test)]
#[path = "helper_tests.rs"]
mod tests;
