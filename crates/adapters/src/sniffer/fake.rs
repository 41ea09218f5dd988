// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for `PacketSniffer`: replays a fixed packet stream instead of
//! opening a raw socket.

use super::{PacketSniffer, SnifferHandle};
use agentcore::{Error, TcpPacket, TcpPattern};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct FakeSniffer {
    packets: Mutex<Vec<TcpPacket>>,
    captures: Mutex<Vec<TcpPattern>>,
}

impl Default for FakeSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSniffer {
    pub fn new() -> Self {
        FakeSniffer { packets: Mutex::new(Vec::new()), captures: Mutex::new(Vec::new()) }
    }

    pub fn with_packets(packets: Vec<TcpPacket>) -> Self {
        FakeSniffer { packets: Mutex::new(packets), captures: Mutex::new(Vec::new()) }
    }

    pub fn push(&self, packet: TcpPacket) {
        self.packets.lock().push(packet);
    }

    pub fn captured_patterns(&self) -> Vec<TcpPattern> {
        self.captures.lock().clone()
    }
}

impl PacketSniffer for FakeSniffer {
    fn capture(&self, pattern: TcpPattern) -> Result<(SnifferHandle, mpsc::Receiver<TcpPacket>), Error> {
        pattern.validate()?;
        self.captures.lock().push(pattern);
        let matching: Vec<TcpPacket> =
            self.packets.lock().iter().filter(|p| pattern.matches(p)).copied().collect();

        let (tx, rx) = mpsc::channel(matching.len().max(1));
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_for_task = stopped.clone();
        tokio::spawn(async move {
            for packet in matching {
                if stopped_for_task.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(packet).await.is_err() {
                    break;
                }
            }
        });

        let handle = SnifferHandle::new(move || stopped.store(true, Ordering::SeqCst));
        Ok((handle, rx))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
