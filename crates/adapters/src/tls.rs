// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reqwest`'s `rustls-no-provider` feature leaves picking a `CryptoProvider`
//! to the binary: without this, the first HTTPS request panics at runtime
//! instead of at start-up.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the `ring`-backed crypto provider as the process default. Safe to
/// call from every `reqwest::Client` constructor; only the first call does
/// anything.
pub fn ensure_crypto_provider() {
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
