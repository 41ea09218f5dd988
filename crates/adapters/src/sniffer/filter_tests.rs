// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcore::MAX_FRAME_LEN;

fn frame_with(dest_port: u16, seq: u32, ack: u32, flags: u8) -> Vec<u8> {
    let mut frame = vec![0u8; agentcore::IPV4_HEADER_LEN + agentcore::TCP_HEADER_LEN];
    let tcp = &mut frame[agentcore::IPV4_HEADER_LEN..];
    tcp[0..2].copy_from_slice(&1234u16.to_be_bytes());
    tcp[2..4].copy_from_slice(&dest_port.to_be_bytes());
    tcp[4..8].copy_from_slice(&seq.to_be_bytes());
    tcp[8..12].copy_from_slice(&ack.to_be_bytes());
    let word12 = ((5u16) << 12) | (flags as u16 & 0x3F);
    tcp[12..14].copy_from_slice(&word12.to_be_bytes());
    frame
}

#[test]
fn single_port_field_accepts_matching_and_drops_others() {
    let pattern = TcpPattern { target_port: 22, seq_num: 0, ack_num: 0, flags: 0 };
    let program = compile(pattern).unwrap();
    assert_eq!(program.len(), 4); // load, jeq, ret-accept, ret-drop

    let matching = frame_with(22, 0, 0, 0);
    assert_eq!(interpret(&program, &matching), MAX_FRAME_LEN as u32);

    let other = frame_with(23, 0, 0, 0);
    assert_eq!(interpret(&program, &other), 0);
}

#[test]
fn flags_field_uses_bits_set_semantics() {
    let pattern = TcpPattern {
        target_port: 0,
        seq_num: 0,
        ack_num: 0,
        flags: agentcore::tcp::FLAG_SYN,
    };
    let program = compile(pattern).unwrap();

    let syn_ack = frame_with(0, 0, 0, agentcore::tcp::FLAG_SYN | agentcore::tcp::FLAG_ACK);
    assert_eq!(interpret(&program, &syn_ack), MAX_FRAME_LEN as u32);

    let ack_only = frame_with(0, 0, 0, agentcore::tcp::FLAG_ACK);
    assert_eq!(interpret(&program, &ack_only), 0);
}

#[test]
fn all_fields_must_match() {
    let pattern = TcpPattern { target_port: 4242, seq_num: 100, ack_num: 200, flags: agentcore::tcp::FLAG_SYN };
    let program = compile(pattern).unwrap();
    assert_eq!(program.len(), 11); // 4 checks (one with an extra AND instruction) + 2 rets

    let full_match = frame_with(4242, 100, 200, agentcore::tcp::FLAG_SYN);
    assert_eq!(interpret(&program, &full_match), MAX_FRAME_LEN as u32);

    let wrong_seq = frame_with(4242, 101, 200, agentcore::tcp::FLAG_SYN);
    assert_eq!(interpret(&program, &wrong_seq), 0);
}

#[test]
fn all_zero_pattern_is_rejected() {
    let pattern = TcpPattern { target_port: 0, seq_num: 0, ack_num: 0, flags: 0 };
    assert!(compile(pattern).is_err());
}
