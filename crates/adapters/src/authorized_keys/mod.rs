// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem access to each user's `authorized_keys` file (spec §4.3).
//! Writes are atomic (temp file + rename) and serialized per user so a slow
//! reconciliation pass for one user can never interleave with another's.

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAuthorizedKeysStore;

mod helper;
pub use helper::HelperAuthorizedKeysStore;

use agentcore::{expand_pattern, Error};
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

#[async_trait]
pub trait AuthorizedKeysStore: Send + Sync + 'static {
    /// Current file contents, or an empty string if the file does not exist
    /// yet (a user with no keys of their own is not an error).
    async fn read(&self, os_user: &str) -> Result<String, Error>;

    /// Atomically replace the file's contents.
    async fn write(&self, os_user: &str, contents: &str) -> Result<(), Error>;
}

/// Real `AuthorizedKeysStore`: resolves each user's home directory from
/// `/etc/passwd`, expands the `AuthorizedKeysFile` pattern against it, and
/// writes through a temp file + rename.
pub struct FsAuthorizedKeysStore {
    pattern: String,
    passwd_path: PathBuf,
    locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FsAuthorizedKeysStore {
    pub fn new(pattern: impl Into<String>) -> Self {
        FsAuthorizedKeysStore {
            pattern: pattern.into(),
            passwd_path: PathBuf::from("/etc/passwd"),
            locks: SyncMutex::new(HashMap::new()),
        }
    }

    /// For tests: point the home-directory lookup at a fixture file instead
    /// of the real `/etc/passwd`.
    pub fn with_passwd_path(mut self, passwd_path: impl Into<PathBuf>) -> Self {
        self.passwd_path = passwd_path.into();
        self
    }

    fn lock_for(&self, os_user: &str) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(os_user.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    fn resolve(&self, os_user: &str) -> Result<(PathBuf, PasswdEntry), Error> {
        let entry = passwd_entry_for_user(&self.passwd_path, os_user)?;
        let path = PathBuf::from(expand_pattern(&self.pattern, &entry.home, os_user));
        Ok((path, entry))
    }
}

/// The `/etc/passwd` fields this crate needs: home directory (for pattern
/// expansion) and uid/gid (so a write can hand the file back to its owner).
pub(crate) struct PasswdEntry {
    pub home: String,
    pub uid: u32,
    pub gid: u32,
}

/// Looks up `os_user`'s passwd record in a `/etc/passwd`-format file. No
/// `libc` FFI: this is a small, well-known text format and parsing it
/// directly avoids the only other unsafe surface this crate would otherwise
/// need.
pub(crate) fn passwd_entry_for_user(passwd_path: &std::path::Path, os_user: &str) -> Result<PasswdEntry, Error> {
    let contents = std::fs::read_to_string(passwd_path)
        .map_err(|e| Error::UserNotFound(format!("{os_user}: reading {}: {e}", passwd_path.display())))?;
    for line in contents.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() >= 6 && fields[0] == os_user {
            let uid = fields[2]
                .parse()
                .map_err(|_| Error::UserNotFound(format!("{os_user}: malformed uid field in passwd")))?;
            let gid = fields[3]
                .parse()
                .map_err(|_| Error::UserNotFound(format!("{os_user}: malformed gid field in passwd")))?;
            return Ok(PasswdEntry { home: fields[5].to_string(), uid, gid });
        }
    }
    Err(Error::UserNotFound(os_user.to_string()))
}

#[async_trait]
impl AuthorizedKeysStore for FsAuthorizedKeysStore {
    async fn read(&self, os_user: &str) -> Result<String, Error> {
        let (path, _entry) = self.resolve(os_user)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(Error::ReadAuthorizedKeysFileFailed(e.to_string())),
        }
    }

    async fn write(&self, os_user: &str, contents: &str) -> Result<(), Error> {
        let (path, entry) = self.resolve(os_user)?;
        let lock = self.lock_for(os_user);
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
            tokio::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
            std::os::unix::fs::chown(parent, Some(entry.uid), Some(entry.gid))
                .map_err(|e| Error::WriteAuthorizedKeysFileFailed(format!("chown {}: {e}", parent.display())))?;
        }

        let tmp_path = path.with_extension("agent-tmp");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
        tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
        std::os::unix::fs::chown(&tmp_path, Some(entry.uid), Some(entry.gid))
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(format!("chown {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
