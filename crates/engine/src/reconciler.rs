// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `authorized_keys` merge algorithm and its reconciliation driver
//! (C3, spec §4.3/§8). Every key this agent manages gets its own marker
//! comment and a trailing indicator suffix so a later pass can tell a
//! managed line from one a user added by hand, without needing a block
//! delimiter that could swallow unrelated lines.

use agentcore::{are_same_keys, fingerprint, managed_keys, KeyType, ManagedKeySet, SshKey};
use agentadapters::AuthorizedKeysStore;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const SESSION_KEY_MARKER: &str = "# Added and Managed by DigitalOcean";
pub const PERMANENT_KEY_MARKER: &str = "# Managed through DigitalOcean";
pub const SESSION_KEY_INDICATOR: &str = "-dotty_ssh";
pub const PERMANENT_KEY_INDICATOR: &str = "-do_managed_key";

fn is_marker_line(trimmed: &str) -> bool {
    trimmed.eq_ignore_ascii_case(SESSION_KEY_MARKER) || trimmed.eq_ignore_ascii_case(PERMANENT_KEY_MARKER)
}

fn ends_with_indicator(trimmed: &str, indicator: &str) -> bool {
    trimmed.len() >= indicator.len() && trimmed[trimmed.len() - indicator.len()..].eq_ignore_ascii_case(indicator)
}

#[derive(Serialize)]
struct SessionKeyComment<'a> {
    os_user: &'a str,
    actor_email: &'a str,
    expire_at: String,
}

fn format_permanent_line(key: &SshKey) -> String {
    format!("{}{}", key.public_key, PERMANENT_KEY_INDICATOR)
}

fn format_session_line(key: &SshKey) -> String {
    let expire_at = key
        .expire_at
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();
    let comment = SessionKeyComment { os_user: &key.os_user, actor_email: &key.actor_email, expire_at };
    let json = serde_json::to_string(&comment).unwrap_or_default();
    format!("{} {}{}", key.public_key, json, SESSION_KEY_INDICATOR)
}

/// Rebuilds an `authorized_keys` file's contents per spec §4.3/§4.6's merge
/// algorithm.
///
/// `permanent` is the `nil`-vs-empty-sensitive authoritative view of droplet
/// keys for this round (spec §9): `None` means "keep whatever permanent
/// lines are already on disk untouched"; `Some(keys)` (possibly empty) means
/// this *is* the authoritative set, so stale marker/indicator/duplicate
/// lines for permanent keys are stripped before `keys` gets re-appended.
/// `droplet_mgmt_enabled` additionally gates whether the stripped permanent
/// keys are appended back at all — a disabled toggle strips but never
/// re-adds.
///
/// `session` is always authoritative: any existing session-marked line is
/// unconditionally stripped and replaced by exactly what `session` holds.
pub fn prepare_authorized_keys(
    existing: &str,
    droplet_mgmt_enabled: bool,
    permanent: Option<&[SshKey]>,
    session: &[SshKey],
) -> String {
    let keep_local_permanent = permanent.is_none();
    let permanent = permanent.unwrap_or(&[]);

    let managed_fingerprints: HashSet<&str> = permanent.iter().filter_map(|k| k.fingerprint.as_deref()).collect();

    let mut kept: Vec<&str> = Vec::new();
    for line in existing.lines() {
        let trimmed = line.trim();
        if is_marker_line(trimmed) {
            continue;
        }
        if ends_with_indicator(trimmed, SESSION_KEY_INDICATOR) {
            continue;
        }
        if !keep_local_permanent {
            if ends_with_indicator(trimmed, PERMANENT_KEY_INDICATOR) {
                continue;
            }
            if fingerprint(trimmed).is_some_and(|fp| managed_fingerprints.contains(fp.as_str())) {
                continue;
            }
        }
        kept.push(line);
    }

    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }

    if droplet_mgmt_enabled {
        for key in permanent {
            out.push_str(PERMANENT_KEY_MARKER);
            out.push('\n');
            out.push_str(&format_permanent_line(key));
            out.push('\n');
        }
    }

    for key in session {
        out.push_str(SESSION_KEY_MARKER);
        out.push('\n');
        out.push_str(&format_session_line(key));
        out.push('\n');
    }

    out
}

/// Drives `authorized_keys` reconciliation for however many users the
/// metadata watcher discovers keys for.
pub struct Reconciler<S: AuthorizedKeysStore + ?Sized> {
    store: Arc<S>,
    /// Whether permanent (droplet) keys are currently managed at all (spec
    /// §4.3/§9): a process-wide flag set by the last non-`Unchanged`
    /// `managed_keys_enabled` signal, defaulting to enabled since managing
    /// droplet keys is the agent's normal behavior absent any signal saying
    /// otherwise.
    droplet_mgmt_enabled: AtomicBool,
}

impl<S: AuthorizedKeysStore + ?Sized> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Reconciler { store, droplet_mgmt_enabled: AtomicBool::new(true) }
    }

    pub fn droplet_mgmt_enabled(&self) -> bool {
        self.droplet_mgmt_enabled.load(Ordering::SeqCst)
    }

    pub fn set_droplet_mgmt_enabled(&self, enabled: bool) {
        self.droplet_mgmt_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Reconcile one user's file against `permanent`/`session`. Returns
    /// whether a write happened.
    pub async fn update_keys(&self, os_user: &str, permanent: Option<&[SshKey]>, session: &[SshKey]) -> Result<bool, agentcore::Error> {
        let existing = self.store.read(os_user).await?;
        let enabled = self.droplet_mgmt_enabled();
        let new_contents = prepare_authorized_keys(&existing, enabled, permanent, session);
        if new_contents == existing {
            debug!(os_user, "authorized_keys already matches desired state");
            return Ok(false);
        }
        self.store.write(os_user, &new_contents).await?;
        info!(os_user, "reconciled authorized_keys");
        Ok(true)
    }

    /// Sweeps `cache` for expired session keys (spec §8 invariant: a session
    /// key past its `expire_at` never survives a sweep), reconciling any
    /// user whose key set changed as a result. The sweep always treats the
    /// cache's permanent entries as authoritative for that user.
    pub async fn remove_expired_keys(&self, cache: &ManagedKeySet, now: DateTime<Utc>) -> ManagedKeySet {
        let swept = managed_keys::remove_expired_keys(cache, now);
        for (os_user, keys) in cache {
            let new_keys = swept.get(os_user).cloned().unwrap_or_default();
            if !are_same_keys(keys, &new_keys) {
                let permanent: Vec<SshKey> = new_keys.iter().filter(|k| matches!(k.key_type, KeyType::Permanent)).cloned().collect();
                let session: Vec<SshKey> = new_keys.iter().filter(|k| matches!(k.key_type, KeyType::Session)).cloned().collect();
                if let Err(err) = self.update_keys(os_user, Some(&permanent), &session).await {
                    tracing::warn!(os_user, %err, "failed to reconcile after expiry sweep");
                }
            }
        }
        swept
    }

    /// Scrubs session keys left behind at shutdown (spec §4.6). Passes
    /// `permanent: None` so permanent lines on disk are left completely
    /// untouched, regardless of whether droplet-key management is currently
    /// enabled.
    pub async fn remove_session_keys(&self, os_user: &str) -> Result<bool, agentcore::Error> {
        self.update_keys(os_user, None, &[]).await
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
