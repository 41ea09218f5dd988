// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentcore: domain types shared by the metadata/SSH-key reconciliation agent.
//!
//! This crate has no I/O of its own — every type here is a plain value or a
//! pure function over one. Adapters (`agentadapters`) and business logic
//! (`agentengine`) depend on it; it depends on neither.

pub mod clock;
pub mod error;
pub mod investigation;
pub mod log_entry;
pub mod managed_keys;
pub mod metadata;
pub mod sshd_config;
pub mod ssh_key;
pub mod tcp;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::Error;
pub use investigation::InvestigationState;
pub use log_entry::{LogEntry, TimeWindow};
pub use managed_keys::ManagedKeySet;
pub use metadata::{Metadata, RawSessionKey, ReservedIpv6, TriState, TroubleshootingRequest};
pub use sshd_config::{expand_pattern, parse_sshd_config, SshdConfig};
pub use ssh_key::{are_same_keys, fingerprint, KeyType, SshKey};
pub use tcp::{TcpPacket, TcpPattern, IPV4_HEADER_LEN, MAX_FRAME_LEN, TCP_HEADER_LEN};
