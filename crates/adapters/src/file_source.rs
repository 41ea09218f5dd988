// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File I/O backing the log tailer (C9, spec §4.9): reading a file's full
//! contents up front, and following lines appended after that.

use agentcore::Error;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait FileSource: Send + Sync + 'static {
    /// Every line currently in the file, oldest first.
    async fn read_all_lines(&self, path: &str) -> Result<Vec<String>, Error>;

    /// Follows `path` from its current end of file, sending each newly
    /// appended line on `tx` until `cancel` fires.
    async fn follow(&self, path: &str, tx: mpsc::Sender<String>, cancel: CancellationToken) -> Result<(), Error>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct TokioFileSource;

impl Default for TokioFileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioFileSource {
    pub fn new() -> Self {
        TokioFileSource
    }
}

#[async_trait]
impl FileSource for TokioFileSource {
    async fn read_all_lines(&self, path: &str) -> Result<Vec<String>, Error> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| Error::RunCmdFailed(e.to_string()))?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    async fn follow(&self, path: &str, tx: mpsc::Sender<String>, cancel: CancellationToken) -> Result<(), Error> {
        let file = tokio::fs::File::open(path).await.map_err(|e| Error::RunCmdFailed(e.to_string()))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(std::io::SeekFrom::End(0))
            .await
            .map_err(|e| Error::RunCmdFailed(e.to_string()))?;

        loop {
            let mut line = String::new();
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                result = reader.read_line(&mut line) => {
                    let n = result.map_err(|e| Error::RunCmdFailed(e.to_string()))?;
                    if n == 0 {
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(POLL_INTERVAL) => continue,
                        }
                    }
                    let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
                    if tx.send(trimmed.to_string()).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFileSource;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeFileSource {
        files: Mutex<HashMap<String, Vec<String>>>,
    }

    impl FakeFileSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, path: &str, lines: Vec<String>) {
            self.files.lock().insert(path.to_string(), lines);
        }
    }

    #[async_trait]
    impl FileSource for FakeFileSource {
        async fn read_all_lines(&self, path: &str) -> Result<Vec<String>, Error> {
            self.files
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| Error::RunCmdFailed(format!("no such fake file: {path}")))
        }

        async fn follow(&self, _path: &str, _tx: mpsc::Sender<String>, cancel: CancellationToken) -> Result<(), Error> {
            cancel.cancelled().await;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "file_source_tests.rs"]
mod tests;
