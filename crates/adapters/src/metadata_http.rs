// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the metadata service: fetching `Metadata`, reporting the
//! hash of the configuration currently applied, and posting troubleshooting
//! completion (spec §4.4/§6/§7).

use agentcore::{Error, Metadata};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Completion POST retry budget (spec §4.7 step 5): up to this many
/// attempts, exponential backoff starting at `COMPLETION_RETRY_BASE` and
/// capped at `COMPLETION_RETRY_CAP`.
const COMPLETION_MAX_ATTEMPTS: u32 = 5;
const COMPLETION_RETRY_BASE: Duration = Duration::from_secs(1);
const COMPLETION_RETRY_CAP: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("droplet-agent/", env!("CARGO_PKG_VERSION"));

fn backoff_delay(attempt: u32) -> Duration {
    let millis = COMPLETION_RETRY_BASE.as_millis().saturating_mul(1u128 << attempt.min(16));
    Duration::from_millis(millis.min(COMPLETION_RETRY_CAP.as_millis()) as u64)
}

#[async_trait]
pub trait MetadataClient: Send + Sync + 'static {
    /// Fetch the current metadata document.
    async fn fetch(&self) -> Result<Metadata, Error>;

    /// Report the agent's run status (`"running"`/`"stopped"`) and the port
    /// its sshd is actually listening on (spec §4.11/§6's `PATCH /v1.json`
    /// body `{dotty_status, ssh_info: {port}}`).
    async fn push_status(&self, dotty_status: &str, ssh_port: u16) -> Result<(), Error>;

    /// Notify the control plane that a troubleshooting investigation has
    /// finished uploading its artifacts.
    async fn post_completion(&self, investigation_uuid: &str, success: bool) -> Result<(), Error>;
}

#[derive(Serialize)]
struct SshInfo {
    port: u16,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    dotty_status: &'a str,
    ssh_info: SshInfo,
}

#[derive(Serialize)]
struct CompletionReport<'a> {
    investigation_uuid: &'a str,
    success: bool,
}

pub struct HttpMetadataClient {
    client: reqwest::Client,
    metadata_url: String,
    status_url: String,
    completion_url: String,
}

impl HttpMetadataClient {
    pub fn new(metadata_url: impl Into<String>, status_url: impl Into<String>, completion_url: impl Into<String>) -> Self {
        crate::tls::ensure_crypto_provider();
        HttpMetadataClient {
            client: reqwest::Client::new(),
            metadata_url: metadata_url.into(),
            status_url: status_url.into(),
            completion_url: completion_url.into(),
        }
    }
}

#[async_trait]
impl MetadataClient for HttpMetadataClient {
    async fn fetch(&self) -> Result<Metadata, Error> {
        let response = self
            .client
            .get(&self.metadata_url)
            .send()
            .await
            .map_err(|e| Error::FetchMetadataFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::FetchMetadataFailed(e.to_string()))?;
        response.json::<Metadata>().await.map_err(|e| Error::FetchMetadataFailed(e.to_string()))
    }

    async fn push_status(&self, dotty_status: &str, ssh_port: u16) -> Result<(), Error> {
        self.client
            .patch(&self.status_url)
            .json(&StatusReport { dotty_status, ssh_info: SshInfo { port: ssh_port } })
            .send()
            .await
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?;
        Ok(())
    }

    async fn post_completion(&self, investigation_uuid: &str, success: bool) -> Result<(), Error> {
        let mut last_err = None;
        for attempt in 0..COMPLETION_MAX_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt - 1)).await;
            }
            let result = self
                .client
                .post(&self.completion_url)
                .header("X-Investigation-UUID", investigation_uuid)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .json(&CompletionReport { investigation_uuid, success })
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => last_err = Some(Error::UpdateMetadataFailed(format!("status {}", response.status()))),
                Err(e) => last_err = Some(Error::UpdateMetadataFailed(e.to_string())),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::UpdateMetadataFailed("completion POST exhausted retries".to_string())))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMetadataClient;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeMetadataClient {
        metadata: Mutex<Option<Metadata>>,
        pushed_statuses: Mutex<Vec<(String, u16)>>,
        completions: Mutex<Vec<(String, bool)>>,
        fail_fetch: Mutex<bool>,
        fail_next_pushes: Mutex<u32>,
    }

    impl FakeMetadataClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_metadata(metadata: Metadata) -> Self {
            FakeMetadataClient { metadata: Mutex::new(Some(metadata)), ..Default::default() }
        }

        pub fn set_metadata(&self, metadata: Metadata) {
            *self.metadata.lock() = Some(metadata);
        }

        pub fn fail_next_fetch(&self) {
            *self.fail_fetch.lock() = true;
        }

        /// The next `n` calls to `push_status` fail before the following
        /// one succeeds, to exercise the infinite-retry startup path.
        pub fn fail_next_pushes(&self, n: u32) {
            *self.fail_next_pushes.lock() = n;
        }

        pub fn pushed_statuses(&self) -> Vec<(String, u16)> {
            self.pushed_statuses.lock().clone()
        }

        pub fn completions(&self) -> Vec<(String, bool)> {
            self.completions.lock().clone()
        }
    }

    #[async_trait]
    impl MetadataClient for FakeMetadataClient {
        async fn fetch(&self) -> Result<Metadata, Error> {
            if std::mem::take(&mut *self.fail_fetch.lock()) {
                return Err(Error::FetchMetadataFailed("fake failure".into()));
            }
            self.metadata.lock().clone().ok_or_else(|| Error::FetchMetadataFailed("no metadata set".into()))
        }

        async fn push_status(&self, dotty_status: &str, ssh_port: u16) -> Result<(), Error> {
            let mut remaining = self.fail_next_pushes.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::UpdateMetadataFailed("fake push failure".into()));
            }
            drop(remaining);
            self.pushed_statuses.lock().push((dotty_status.to_string(), ssh_port));
            Ok(())
        }

        async fn post_completion(&self, investigation_uuid: &str, success: bool) -> Result<(), Error> {
            self.completions.lock().push((investigation_uuid.to_string(), success));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "metadata_http_tests.rs"]
mod tests;
