// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata watcher (C4, spec §4.4): detects "new metadata available",
//! rate-limits, fetches, and fans out to every registered actioner via the
//! `Dispatcher`. Two variants share the same `MetadataWatcher` contract so
//! the supervisor (C11) is platform-agnostic (spec §9 design note).

use crate::actioner::Dispatcher;
use agentadapters::http_push;
use agentadapters::{MetadataClient, PacketSniffer};
use agentcore::tcp::FLAG_SYN;
use agentcore::{Error, TcpPattern};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The fixed port-knock identifier this agent listens for (spec §4.4).
pub const PORT_KNOCK_PATTERN: TcpPattern =
    TcpPattern { target_port: 22, seq_num: 0x0418_8D0F, ack_num: 0x000C_F1A9, flags: FLAG_SYN };

/// At most 5 fetches/second, bucket size 1: surplus is rejected, never queued.
pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(200);
/// Bounded-time graceful shutdown for the HTTP-push variant (spec §4.4).
pub const HTTP_PUSH_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait MetadataWatcher: Send + Sync + 'static {
    /// Blocks until the watcher stops (cleanly, or via `shutdown`).
    async fn run(&self) -> Result<(), Error>;

    /// Stops accepting new signals and waits up to `timeout` for every
    /// registered actioner to finish, via the dispatcher's wait group.
    async fn shutdown(&self, timeout: Duration) -> bool;
}

/// Single-slot token bucket: `try_acquire` succeeds at most once per
/// `interval`, rejecting (not queuing) anything more frequent.
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        RateLimiter { interval, last: Mutex::new(None) }
    }

    pub fn try_acquire(&self) -> bool {
        let mut last = self.last.lock();
        let now = Instant::now();
        match *last {
            Some(prev) if now.duration_since(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

async fn fetch_and_dispatch<M: MetadataClient>(metadata_client: &M, dispatcher: &Dispatcher) {
    match metadata_client.fetch().await {
        Ok(metadata) => {
            if let Err(err) = dispatcher.dispatch(metadata).await {
                warn!(%err, "dispatch failed");
            }
        }
        Err(err) => warn!(%err, "failed to fetch metadata"),
    }
}

/// Port-knock variant: a raw-socket sniffer feeds matching segments; each one
/// (subject to the rate limit) triggers a metadata fetch and dispatch.
pub struct PortKnockWatcher<S: PacketSniffer, M: MetadataClient> {
    sniffer: Arc<S>,
    metadata_client: Arc<M>,
    dispatcher: Arc<Dispatcher>,
    rate_limiter: RateLimiter,
    cancel: CancellationToken,
}

impl<S: PacketSniffer, M: MetadataClient> PortKnockWatcher<S, M> {
    pub fn new(sniffer: Arc<S>, metadata_client: Arc<M>, dispatcher: Arc<Dispatcher>) -> Self {
        PortKnockWatcher {
            sniffer,
            metadata_client,
            dispatcher,
            rate_limiter: RateLimiter::new(RATE_LIMIT_INTERVAL),
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: PacketSniffer, M: MetadataClient> MetadataWatcher for PortKnockWatcher<S, M> {
    async fn run(&self) -> Result<(), Error> {
        let pattern = PORT_KNOCK_PATTERN.validate()?;
        let (handle, mut rx) = self.sniffer.capture(pattern)?;
        info!("port-knock watcher started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    handle.stop();
                    return Ok(());
                }
                packet = rx.recv() => {
                    match packet {
                        Some(_packet) => {
                            if !self.rate_limiter.try_acquire() {
                                warn!("port-knock rate limit exceeded, dropping");
                                continue;
                            }
                            fetch_and_dispatch(self.metadata_client.as_ref(), &self.dispatcher).await;
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    async fn shutdown(&self, timeout: Duration) -> bool {
        self.cancel.cancel();
        self.dispatcher.shutdown(timeout).await
    }
}

/// HTTP-push variant: a local listener receives a bare "metadata changed"
/// hit; each one (subject to the same rate limit) triggers a fetch and
/// dispatch, the same way a knock does for the other variant.
pub struct HttpPushWatcher<M: MetadataClient> {
    listener: Mutex<Option<TcpListener>>,
    serve_task: Mutex<Option<tokio::task::JoinHandle<Result<(), Error>>>>,
    metadata_client: Arc<M>,
    dispatcher: Arc<Dispatcher>,
    rate_limiter: RateLimiter,
    cancel: CancellationToken,
}

impl<M: MetadataClient> HttpPushWatcher<M> {
    pub async fn bind(addr: SocketAddr, metadata_client: Arc<M>, dispatcher: Arc<Dispatcher>) -> Result<(Self, SocketAddr), Error> {
        let (listener, bound) = http_push::bind(addr).await?;
        Ok((
            HttpPushWatcher {
                listener: Mutex::new(Some(listener)),
                serve_task: Mutex::new(None),
                metadata_client,
                dispatcher,
                rate_limiter: RateLimiter::new(RATE_LIMIT_INTERVAL),
                cancel: CancellationToken::new(),
            },
            bound,
        ))
    }
}

#[async_trait::async_trait]
impl<M: MetadataClient> MetadataWatcher for HttpPushWatcher<M> {
    async fn run(&self) -> Result<(), Error> {
        let listener = self.listener.lock().take().ok_or(Error::NoRegisteredActioner)?;
        let (tx, mut rx) = mpsc::channel::<()>(16);
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move { http_push::serve(listener, tx, cancel).await });
        *self.serve_task.lock() = Some(task);

        while rx.recv().await.is_some() {
            if !self.rate_limiter.try_acquire() {
                warn!("metadata push rate limit exceeded, dropping");
                continue;
            }
            fetch_and_dispatch(self.metadata_client.as_ref(), &self.dispatcher).await;
        }

        let task = self.serve_task.lock().take();
        match task {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(err) => Err(Error::FetchMetadataFailed(format!("push listener task panicked: {err}"))),
            },
            None => Ok(()),
        }
    }

    /// Cancelling `self.cancel` triggers the push listener's own
    /// `with_graceful_shutdown`; `timeout` bounds the listener's close *and*
    /// the dispatcher's actioner wait group (spec §4.4's bounded-time
    /// graceful shutdown).
    async fn shutdown(&self, timeout: Duration) -> bool {
        self.cancel.cancel();
        let task = self.serve_task.lock().take();
        let listener_closed = match task {
            Some(task) => tokio::time::timeout(HTTP_PUSH_SHUTDOWN_GRACE, task).await.is_ok(),
            None => true,
        };
        self.dispatcher.shutdown(timeout).await && listener_closed
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
