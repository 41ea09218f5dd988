// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for every external I/O seam: raw-socket sniffing, sshd-config
//! file watching, authorized_keys filesystem writes, metadata HTTP, the
//! troubleshooting push listener, the log emitter, and subprocess spawning.

pub mod authorized_keys;
pub mod emitter;
pub mod file_source;
pub mod http_push;
pub mod metadata_http;
pub mod sniffer;
pub mod sshd_config;
pub mod subprocess;
mod tls;

pub use authorized_keys::{AuthorizedKeysStore, FsAuthorizedKeysStore, HelperAuthorizedKeysStore};
pub use emitter::{HttpLogEmitter, LogEmitter};
pub use file_source::{FileSource, TokioFileSource};
pub use metadata_http::{HttpMetadataClient, MetadataClient};
pub use sniffer::PacketSniffer;
#[cfg(target_os = "linux")]
pub use sniffer::RawSocketSniffer;
pub use sshd_config::SshdConfigAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use authorized_keys::FakeAuthorizedKeysStore;
#[cfg(any(test, feature = "test-support"))]
pub use emitter::FakeLogEmitter;
#[cfg(any(test, feature = "test-support"))]
pub use file_source::FakeFileSource;
#[cfg(any(test, feature = "test-support"))]
pub use metadata_http::FakeMetadataClient;
#[cfg(any(test, feature = "test-support"))]
pub use sniffer::FakeSniffer;
