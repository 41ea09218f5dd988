// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uploads troubleshooting log artifacts to the control plane (spec §4.7).
//! One call per collected line (`emit_log`), one per collector failure
//! (`emit_error`), one at the end of a request (`flush`) — the same shape the
//! black-box log-ingestion contract in spec §6 describes.

use agentcore::{Error, LogEntry};
use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait LogEmitter: Send + Sync + 'static {
    /// Upload one parsed log line collected for `investigation_uuid`.
    async fn emit_log(&self, investigation_uuid: &str, source_tag: &str, entry: &LogEntry) -> Result<(), Error>;

    /// Report that a collector (`source`, e.g. `"command_runner"`,
    /// `"file_tailer"`, `"otlp_flush"`, `"investigation_completion"`) failed.
    async fn emit_error(&self, investigation_uuid: &str, source: &str, message: &str) -> Result<(), Error>;

    /// Signal that every collector for `investigation_uuid` has finished.
    async fn flush(&self, investigation_uuid: &str) -> Result<(), Error>;
}

#[derive(Serialize)]
struct LogUpload<'a> {
    investigation_uuid: &'a str,
    source_tag: &'a str,
    line: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    timestamp_parsed: bool,
}

#[derive(Serialize)]
struct ErrorUpload<'a> {
    investigation_uuid: &'a str,
    source: &'a str,
    message: &'a str,
}

pub struct HttpLogEmitter {
    client: reqwest::Client,
    upload_url: String,
    error_url: String,
    flush_url: String,
}

impl HttpLogEmitter {
    pub fn new(upload_url: impl Into<String>, error_url: impl Into<String>, flush_url: impl Into<String>) -> Self {
        crate::tls::ensure_crypto_provider();
        HttpLogEmitter {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            error_url: error_url.into(),
            flush_url: flush_url.into(),
        }
    }
}

#[async_trait]
impl LogEmitter for HttpLogEmitter {
    async fn emit_log(&self, investigation_uuid: &str, source_tag: &str, entry: &LogEntry) -> Result<(), Error> {
        self.client
            .post(&self.upload_url)
            .json(&LogUpload {
                investigation_uuid,
                source_tag,
                line: &entry.original,
                timestamp: entry.timestamp,
                timestamp_parsed: entry.timestamp_parsed,
            })
            .send()
            .await
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?;
        Ok(())
    }

    async fn emit_error(&self, investigation_uuid: &str, source: &str, message: &str) -> Result<(), Error> {
        self.client
            .post(&self.error_url)
            .json(&ErrorUpload { investigation_uuid, source, message })
            .send()
            .await
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?;
        Ok(())
    }

    async fn flush(&self, investigation_uuid: &str) -> Result<(), Error> {
        self.client
            .post(&self.flush_url)
            .json(&serde_json::json!({ "investigation_uuid": investigation_uuid }))
            .send()
            .await
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UpdateMetadataFailed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLogEmitter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeLogEmitter {
        logs: Mutex<Vec<(String, String, LogEntry)>>,
        errors: Mutex<Vec<(String, String, String)>>,
        flushes: Mutex<Vec<String>>,
    }

    impl FakeLogEmitter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn logs(&self) -> Vec<(String, String, LogEntry)> {
            self.logs.lock().clone()
        }

        pub fn errors(&self) -> Vec<(String, String, String)> {
            self.errors.lock().clone()
        }

        pub fn flushes(&self) -> Vec<String> {
            self.flushes.lock().clone()
        }
    }

    #[async_trait]
    impl LogEmitter for FakeLogEmitter {
        async fn emit_log(&self, investigation_uuid: &str, source_tag: &str, entry: &LogEntry) -> Result<(), Error> {
            self.logs.lock().push((investigation_uuid.to_string(), source_tag.to_string(), entry.clone()));
            Ok(())
        }

        async fn emit_error(&self, investigation_uuid: &str, source: &str, message: &str) -> Result<(), Error> {
            self.errors.lock().push((investigation_uuid.to_string(), source.to_string(), message.to_string()));
            Ok(())
        }

        async fn flush(&self, investigation_uuid: &str) -> Result<(), Error> {
            self.flushes.lock().push(investigation_uuid.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
