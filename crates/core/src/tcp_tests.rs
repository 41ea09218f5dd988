// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn frame_with_tcp(dest_port: u16, seq: u32, ack: u32, flags: u8) -> Vec<u8> {
    let mut frame = vec![0u8; IPV4_HEADER_LEN + TCP_HEADER_LEN];
    let tcp = &mut frame[IPV4_HEADER_LEN..];
    tcp[0..2].copy_from_slice(&1234u16.to_be_bytes());
    tcp[2..4].copy_from_slice(&dest_port.to_be_bytes());
    tcp[4..8].copy_from_slice(&seq.to_be_bytes());
    tcp[8..12].copy_from_slice(&ack.to_be_bytes());
    let word12: u16 = ((5u16) << 12) | (flags as u16 & 0x3F);
    tcp[12..14].copy_from_slice(&word12.to_be_bytes());
    frame
}

#[test]
fn pattern_with_no_nonzero_field_is_invalid() {
    let pattern = TcpPattern {
        target_port: 0,
        seq_num: 0,
        ack_num: 0,
        flags: 0,
    };
    assert!(matches!(pattern.validate(), Err(Error::InvalidIdentifier)));
}

#[test]
fn decode_rejects_short_frames() {
    let short = vec![0u8; IPV4_HEADER_LEN + 5];
    assert!(matches!(TcpPacket::decode(&short), Err(Error::MessageTooShort)));
}

#[test]
fn decode_extracts_port_seq_ack_and_flags() {
    let frame = frame_with_tcp(22, 0x4188D0F, 0xCF1A9, FLAG_SYN);
    let packet = TcpPacket::decode(&frame).unwrap();
    assert_eq!(packet.dest_port, 22);
    assert_eq!(packet.seq_num, 0x4188D0F);
    assert_eq!(packet.ack_num, 0xCF1A9);
    assert_eq!(packet.control_flags, FLAG_SYN);
    assert_eq!(packet.data_offset, 5);
}

#[test]
fn pattern_matches_uses_bits_set_semantics_for_flags() {
    let pattern = TcpPattern {
        target_port: 22,
        seq_num: 0x4188D0F,
        ack_num: 0xCF1A9,
        flags: FLAG_SYN,
    };
    let matching = TcpPacket::decode(&frame_with_tcp(22, 0x4188D0F, 0xCF1A9, FLAG_SYN | FLAG_ACK)).unwrap();
    assert!(pattern.matches(&matching));

    let wrong_port = TcpPacket::decode(&frame_with_tcp(23, 0x4188D0F, 0xCF1A9, FLAG_SYN)).unwrap();
    assert!(!pattern.matches(&wrong_port));

    let missing_flag = TcpPacket::decode(&frame_with_tcp(22, 0x4188D0F, 0xCF1A9, 0)).unwrap();
    assert!(!pattern.matches(&missing_flag));
}

#[test]
fn pattern_with_only_port_ignores_other_fields() {
    let pattern = TcpPattern {
        target_port: 22,
        seq_num: 0,
        ack_num: 0,
        flags: 0,
    };
    let packet = TcpPacket::decode(&frame_with_tcp(22, 999, 888, 0)).unwrap();
    assert!(pattern.matches(&packet));
}
