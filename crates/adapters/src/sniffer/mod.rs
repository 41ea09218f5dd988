// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-knock packet sniffing (spec §4.1): compile a pattern into a kernel
//! filter, open a raw socket, decode matching segments.

pub mod filter;

#[cfg(target_os = "linux")]
mod raw_socket;
#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(target_os = "linux")]
pub use raw_socket::RawSocketSniffer;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSniffer;

use agentcore::{Error, TcpPacket, TcpPattern};
use tokio::sync::mpsc;

/// Opens a capture for `pattern`, returning a receiver of decoded segments
/// and a handle whose `stop()` ends the capture. `capture` itself does not
/// block; decoding happens on a dedicated reader.
pub trait PacketSniffer: Send + Sync + 'static {
    fn capture(&self, pattern: TcpPattern) -> Result<(SnifferHandle, mpsc::Receiver<TcpPacket>), Error>;
}

/// Closing this handle (via `stop`) ends the capture. Dropping it without
/// calling `stop` leaves the reader running until the process exits — callers
/// that need deterministic teardown must call `stop` explicitly.
pub struct SnifferHandle {
    stop_fn: Box<dyn Fn() + Send + Sync>,
}

impl SnifferHandle {
    pub fn new(stop_fn: impl Fn() + Send + Sync + 'static) -> Self {
        SnifferHandle { stop_fn: Box::new(stop_fn) }
    }

    /// Ends the capture. On the real sniffer this closes the raw socket,
    /// causing the blocking reader thread to exit on its next read.
    pub fn stop(&self) {
        (self.stop_fn)();
    }
}
