// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SshKey`: a validated droplet or session SSH public key (spec §3).

use crate::error::Error;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// Permanent ("droplet") keys have no TTL; session keys expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Session,
    Permanent,
}

/// A single SSH public key the agent is asked to manage.
///
/// `(os_user, public_key)` is the identity used for dedup and equality —
/// see [`SshKey::eq_identity`].
#[derive(Debug, Clone)]
pub struct SshKey {
    pub os_user: String,
    pub public_key: String,
    pub actor_email: String,
    pub ttl_seconds: i64,
    pub key_type: KeyType,
    pub fingerprint: Option<String>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl SshKey {
    /// Identity for dedup/equality: `(os_user, public_key)`.
    pub fn eq_identity(&self, other: &SshKey) -> bool {
        self.os_user == other.os_user && self.public_key == other.public_key
    }

    /// Validate and finalize a raw key. Computes `fingerprint` (iff the
    /// public key parses) and `expire_at` (iff `key_type == Session`).
    ///
    /// `default_os_user` fills in an empty `os_user`.
    pub fn validate(
        os_user: &str,
        public_key: &str,
        actor_email: &str,
        ttl_seconds: i64,
        key_type: KeyType,
        default_os_user: &str,
        now: DateTime<Utc>,
    ) -> Result<SshKey, Error> {
        let os_user = if os_user.is_empty() {
            default_os_user.to_string()
        } else {
            os_user.to_string()
        };

        if matches!(key_type, KeyType::Session) && ttl_seconds <= 0 {
            return Err(Error::InvalidKey(format!(
                "session key for {os_user} has non-positive ttl_seconds {ttl_seconds}"
            )));
        }

        let public_key = public_key.trim().to_string();
        if contains_newline(&public_key) {
            return Err(Error::InvalidKey(format!(
                "public key for {os_user} contains an embedded newline"
            )));
        }
        let fingerprint = fingerprint(&public_key)
            .ok_or_else(|| Error::InvalidKey(format!("unparseable public key for {os_user}")))?;

        let expire_at = match key_type {
            KeyType::Session => Some(now + Duration::seconds(ttl_seconds)),
            KeyType::Permanent => None,
        };

        Ok(SshKey {
            os_user,
            public_key,
            actor_email: actor_email.to_string(),
            ttl_seconds,
            key_type,
            fingerprint: Some(fingerprint),
            expire_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.key_type, KeyType::Session)
            && self.expire_at.is_some_and(|at| at <= now)
    }
}

/// Rejects a literal `\n`/`\r` or a URL-encoded one (`%0A`/`%0D`, any case):
/// an `authorized_keys` line is one key per line, so an embedded newline in a
/// value we write verbatim is a line-injection vector, not a key.
fn contains_newline(public_key: &str) -> bool {
    if public_key.contains('\n') || public_key.contains('\r') {
        return true;
    }
    let lower = public_key.to_ascii_lowercase();
    lower.contains("%0a") || lower.contains("%0d")
}

/// SHA-256 fingerprint of the base64 key blob (the second whitespace-
/// separated field of an `authorized_keys`-style line), hex-encoded.
///
/// Returns `None` if the line doesn't have an algorithm + base64 blob.
pub fn fingerprint(public_key: &str) -> Option<String> {
    let mut fields = public_key.split_whitespace();
    let _algorithm = fields.next()?;
    let blob_b64 = fields.next()?;
    let blob = base64::engine::general_purpose::STANDARD
        .decode(blob_b64)
        .ok()?;
    if blob.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(&blob);
    Some(format!("{:x}", hasher.finalize()))
}

/// `areSameKeys`: symmetric, reflexive, multiplicity-sensitive,
/// order-independent comparison of two key lists by `(os_user, public_key)`.
pub fn are_same_keys(a: &[SshKey], b: &[SshKey]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut remaining: Vec<&SshKey> = b.iter().collect();
    for key in a {
        let Some(pos) = remaining.iter().position(|k| k.eq_identity(key)) else {
            return false;
        };
        remaining.remove(pos);
    }
    true
}

#[cfg(test)]
#[path = "ssh_key_tests.rs"]
mod tests;
