// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn packet(dest_port: u16, flags: u8) -> TcpPacket {
    TcpPacket { dest_port, control_flags: flags, ..Default::default() }
}

#[tokio::test]
async fn only_matching_packets_are_delivered() {
    let sniffer = FakeSniffer::with_packets(vec![packet(22, 0), packet(23, 0)]);
    let pattern = TcpPattern { target_port: 22, seq_num: 0, ack_num: 0, flags: 0 };
    let (_handle, mut rx) = sniffer.capture(pattern).unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.dest_port, 22);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn invalid_pattern_is_rejected() {
    let sniffer = FakeSniffer::new();
    let pattern = TcpPattern { target_port: 0, seq_num: 0, ack_num: 0, flags: 0 };
    assert!(sniffer.capture(pattern).is_err());
}

#[tokio::test]
async fn stop_halts_delivery() {
    let sniffer = FakeSniffer::with_packets(vec![packet(22, 0), packet(22, 0), packet(22, 0)]);
    let pattern = TcpPattern { target_port: 22, seq_num: 0, ack_num: 0, flags: 0 };
    let (handle, _rx) = sniffer.capture(pattern).unwrap();
    handle.stop();
    assert_eq!(sniffer.captured_patterns(), vec![pattern]);
}
