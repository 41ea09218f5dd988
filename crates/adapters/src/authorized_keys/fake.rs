// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `AuthorizedKeysStore` for reconciler tests.

use super::AuthorizedKeysStore;
use agentcore::Error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeAuthorizedKeysStore {
    files: Mutex<HashMap<String, String>>,
}

impl FakeAuthorizedKeysStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, os_user: &str, contents: impl Into<String>) {
        self.files.lock().insert(os_user.to_string(), contents.into());
    }

    pub fn contents(&self, os_user: &str) -> Option<String> {
        self.files.lock().get(os_user).cloned()
    }
}

#[async_trait]
impl AuthorizedKeysStore for FakeAuthorizedKeysStore {
    async fn read(&self, os_user: &str) -> Result<String, Error> {
        Ok(self.files.lock().get(os_user).cloned().unwrap_or_default())
    }

    async fn write(&self, os_user: &str, contents: &str) -> Result<(), Error> {
        self.files.lock().insert(os_user.to_string(), contents.to_string());
        Ok(())
    }
}
