// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `InvestigationState`: the troubleshooting exporter's process-wide
//! dedup-by-uuid and shutdown bookkeeping (spec §3/§4.5/§4.7).

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct InvestigationState {
    inner: Arc<Inner>,
}

struct Inner {
    running: Mutex<HashSet<String>>,
    active: AtomicUsize,
    drained: Notify,
    cancel: CancellationToken,
}

impl Default for InvestigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl InvestigationState {
    pub fn new() -> Self {
        InvestigationState {
            inner: Arc::new(Inner {
                running: Mutex::new(HashSet::new()),
                active: AtomicUsize::new(0),
                drained: Notify::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Shared cancellation token; cancelled on `shutdown()`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Try-acquire: `None` if shutdown has started or `uuid` is already
    /// running. Holding the returned guard keeps `uuid` reserved; dropping
    /// it releases the slot.
    pub fn try_acquire(&self, uuid: &str) -> Option<InvestigationGuard> {
        if self.inner.cancel.is_cancelled() {
            return None;
        }
        let mut running = self.inner.running.lock();
        if !running.insert(uuid.to_string()) {
            return None;
        }
        drop(running);
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        Some(InvestigationGuard {
            state: self.clone(),
            uuid: uuid.to_string(),
        })
    }

    pub fn is_running(&self, uuid: &str) -> bool {
        self.inner.running.lock().contains(uuid)
    }

    /// Cancel the shared context, then wait up to `timeout` for all
    /// in-flight investigations to release their guard. Returns `true` if
    /// drained cleanly, `false` on timeout.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.inner.cancel.cancel();
        if self.inner.active.load(Ordering::SeqCst) == 0 {
            return true;
        }
        tokio::select! {
            _ = self.inner.drained.notified() => true,
            _ = tokio::time::sleep(timeout) => false,
        }
    }

    fn release(&self, uuid: &str) {
        self.inner.running.lock().remove(uuid);
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

/// Held while one investigation is in flight; releases its dedup slot on drop.
pub struct InvestigationGuard {
    state: InvestigationState,
    uuid: String,
}

impl Drop for InvestigationGuard {
    fn drop(&mut self) {
        self.state.release(&self.uuid);
    }
}

#[cfg(test)]
#[path = "investigation_tests.rs"]
mod tests;
