// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Actioner`: one unit of metadata-driven reconciliation (C5, spec §4.5).
//! `Dispatcher` fans a metadata snapshot out to every registered actioner
//! concurrently and tracks in-flight work the same way
//! `agentcore::InvestigationState` tracks investigations: an active count,
//! a closing flag, and a `Notify` fired when the count reaches zero.

use agentcore::{Error, Metadata};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{error, warn};

#[async_trait::async_trait]
pub trait Actioner: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Apply one metadata snapshot. Actioners are expected to be idempotent:
    /// the dispatcher makes no guarantee about how often `act` runs for
    /// logically unchanged metadata.
    async fn act(&self, metadata: Arc<Metadata>) -> Result<(), Error>;

    /// Terminal cleanup, run once after the dispatcher has drained every
    /// in-flight `act` call. Most actioners have nothing to do here.
    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }
}

pub struct Dispatcher {
    actioners: Vec<Arc<dyn Actioner>>,
    active: Arc<AtomicUsize>,
    closing: Arc<AtomicBool>,
    drained: Arc<Notify>,
}

impl Dispatcher {
    pub fn new(actioners: Vec<Arc<dyn Actioner>>) -> Self {
        Dispatcher {
            actioners,
            active: Arc::new(AtomicUsize::new(0)),
            closing: Arc::new(AtomicBool::new(false)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Runs every registered actioner against `metadata` concurrently,
    /// logging (not propagating) individual actioner failures so one
    /// actioner's error never blocks the others.
    pub async fn dispatch(&self, metadata: Metadata) -> Result<(), Error> {
        if self.actioners.is_empty() {
            return Err(Error::NoRegisteredActioner);
        }
        if self.closing.load(Ordering::SeqCst) {
            return Err(Error::NoRegisteredActioner);
        }

        self.active.fetch_add(1, Ordering::SeqCst);
        let metadata = Arc::new(metadata);

        let mut tasks = JoinSet::new();
        for actioner in &self.actioners {
            let actioner = actioner.clone();
            let metadata = metadata.clone();
            tasks.spawn(async move {
                let name = actioner.name();
                if let Err(err) = actioner.act(metadata).await {
                    warn!(actioner = name, %err, "actioner failed");
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                error!(%err, "actioner task panicked");
            }
        }

        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 && self.closing.load(Ordering::SeqCst) {
            self.drained.notify_waiters();
        }
        Ok(())
    }

    /// Stops accepting new dispatches, waits up to `timeout` for any
    /// in-flight dispatch to finish, then runs every actioner's terminal
    /// cleanup. The returned bool reflects only the drain step; a cleanup
    /// failure is logged, not propagated, same as a dispatch failure.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.closing.store(true, Ordering::SeqCst);
        let drained = if self.active.load(Ordering::SeqCst) == 0 {
            true
        } else {
            tokio::select! {
                _ = self.drained.notified() => true,
                _ = tokio::time::sleep(timeout) => false,
            }
        };

        let mut tasks = JoinSet::new();
        for actioner in &self.actioners {
            let actioner = actioner.clone();
            tasks.spawn(async move {
                let name = actioner.name();
                if let Err(err) = actioner.shutdown().await {
                    warn!(actioner = name, %err, "actioner shutdown cleanup failed");
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                error!(%err, "actioner shutdown task panicked");
            }
        }

        drained
    }
}

#[cfg(test)]
#[path = "actioner_tests.rs"]
mod tests;
