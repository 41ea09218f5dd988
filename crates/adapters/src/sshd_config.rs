// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watches sshd's config file and re-parses it on change (spec §4.2).
//! Wraps `notify`, relaying events to the async side over a channel, the
//! same shape the teacher's config watcher uses: a background thread running
//! the (synchronous) watcher, a `tokio::sync::watch` carrying the latest
//! parsed value to every reader.

use agentcore::{parse_sshd_config, Error, SshdConfig};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, warn};

pub struct SshdConfigAdapter {
    rx: watch::Receiver<SshdConfig>,
    // Held only to keep the OS watch alive for as long as this adapter lives.
    _watcher: RecommendedWatcher,
}

impl SshdConfigAdapter {
    /// Reads and parses `path` once, then starts watching it for changes.
    /// `launched_port_override`, if set, always wins over a `Port` directive
    /// found in the file (spec §4.2).
    pub async fn start(path: impl Into<PathBuf>, launched_port_override: Option<u16>) -> Result<Self, Error> {
        let path = path.into();
        let initial = read_and_parse(&path, launched_port_override).await?;
        let (tx, rx) = watch::channel(initial);

        let (notify_tx, mut notify_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = notify_tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(|e| Error::SshdConfigParseFailed(e.to_string()))?;
        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::SshdConfigParseFailed(e.to_string()))?;

        let watched_path = path.clone();
        tokio::spawn(async move {
            while let Some(event) = notify_rx.recv().await {
                match event {
                    Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                        match read_and_parse(&watched_path, launched_port_override).await {
                            Ok(config) => {
                                if *tx.borrow() != config {
                                    debug!(?config, "sshd config changed");
                                    if tx.send(config).is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(err) => warn!(%err, "failed to re-parse sshd config"),
                        }
                    }
                    Ok(_) => {}
                    Err(err) => warn!(%err, "sshd config watch error"),
                }
            }
        });

        Ok(SshdConfigAdapter { rx, _watcher: watcher })
    }

    pub fn current(&self) -> SshdConfig {
        self.rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SshdConfig> {
        self.rx.clone()
    }
}

async fn read_and_parse(path: &Path, launched_port_override: Option<u16>) -> Result<SshdConfig, Error> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::SshdConfigParseFailed(e.to_string()))?;
    Ok(parse_sshd_config(&contents, launched_port_override))
}

#[cfg(test)]
#[path = "sshd_config_tests.rs"]
mod tests;
