// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the SSH keys out of a metadata snapshot and feeds them to the
//! reconciler (C6, spec §4.6). Owns the `ManagedKeySet` cache the expiry
//! sweep task (spec §4.11 supplement) also sweeps.

use crate::actioner::Actioner;
use crate::reconciler::Reconciler;
use agentadapters::AuthorizedKeysStore;
use agentcore::{are_same_keys, Clock, Error, KeyType, ManagedKeySet, Metadata, SshKey, TriState};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::warn;

pub struct SshKeysActioner<S: AuthorizedKeysStore + ?Sized> {
    reconciler: Arc<Reconciler<S>>,
    default_os_user: String,
    clock: Arc<dyn Clock>,
    cache: Mutex<ManagedKeySet>,
}

impl<S: AuthorizedKeysStore + ?Sized> SshKeysActioner<S> {
    pub fn new(reconciler: Arc<Reconciler<S>>, default_os_user: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        SshKeysActioner {
            reconciler,
            default_os_user: default_os_user.into(),
            clock,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the managed-key cache, for the expiry sweep task.
    pub fn reconciler(&self) -> Arc<Reconciler<S>> {
        self.reconciler.clone()
    }

    pub fn cached_keys(&self) -> ManagedKeySet {
        self.cache.lock().clone()
    }

    pub fn replace_cache(&self, cache: ManagedKeySet) {
        *self.cache.lock() = cache;
    }
}

fn os_user_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-os_user=(\S+)").expect("static regex"))
}

/// Extracts the `os_user` a raw droplet key line names via one or more
/// `-os_user=(\S+)` suffixes (spec §4.6): when more than one is present, the
/// rightmost match wins. Returns an empty string (handled downstream as "no
/// explicit user", falling back to `default_os_user`) when none is present.
fn os_user_from_droplet_key(raw: &str) -> String {
    os_user_suffix_regex()
        .captures_iter(raw)
        .last()
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// The result of validating a metadata snapshot's key fields, keeping the
/// `nil`-vs-empty distinction (spec §9) permanent keys carry and session
/// keys don't.
pub struct DesiredKeys {
    pub permanent: Option<ManagedKeySet>,
    pub session: ManagedKeySet,
}

/// Validates and groups every key a metadata document describes, by
/// destination `os_user`. Invalid entries are skipped, not fatal: one bad
/// key from the control plane shouldn't block every other user's keys.
pub fn build_desired_keys(metadata: &Metadata, default_os_user: &str, now: chrono::DateTime<chrono::Utc>) -> DesiredKeys {
    let permanent = metadata.public_keys.as_ref().map(|raw_keys| {
        let mut map: ManagedKeySet = HashMap::new();
        for raw in raw_keys {
            let os_user = os_user_from_droplet_key(raw);
            match SshKey::validate(&os_user, raw, "", 0, KeyType::Permanent, default_os_user, now) {
                Ok(key) => map.entry(key.os_user.clone()).or_default().push(key),
                Err(err) => warn!(%err, "skipping invalid permanent public key"),
            }
        }
        map
    });

    let mut session: ManagedKeySet = HashMap::new();
    for raw in &metadata.session_keys {
        match SshKey::validate(&raw.os_user, &raw.ssh_key, &raw.actor_email, raw.ttl, KeyType::Session, default_os_user, now) {
            Ok(key) => session.entry(key.os_user.clone()).or_default().push(key),
            Err(err) => warn!(%err, "skipping invalid session key"),
        }
    }

    DesiredKeys { permanent, session }
}

#[async_trait::async_trait]
impl<S: AuthorizedKeysStore + ?Sized> Actioner for SshKeysActioner<S> {
    fn name(&self) -> &'static str {
        "ssh_keys"
    }

    async fn act(&self, metadata: Arc<Metadata>) -> Result<(), Error> {
        match metadata.managed_keys_enabled {
            TriState::Enabled => self.reconciler.set_droplet_mgmt_enabled(true),
            TriState::Disabled => self.reconciler.set_droplet_mgmt_enabled(false),
            TriState::Unchanged => {}
        }

        let now = self.clock.now();
        let desired = build_desired_keys(&metadata, &self.default_os_user, now);

        let mut affected: HashSet<String> = self.cache.lock().keys().cloned().collect();
        if let Some(permanent) = &desired.permanent {
            affected.extend(permanent.keys().cloned());
        }
        affected.extend(desired.session.keys().cloned());

        let mut next_cache: ManagedKeySet = HashMap::new();
        for os_user in affected {
            let previous = self.cache.lock().get(&os_user).cloned().unwrap_or_default();
            let previous_permanent: Vec<SshKey> = previous.iter().filter(|k| matches!(k.key_type, KeyType::Permanent)).cloned().collect();

            let new_session = desired.session.get(&os_user).cloned().unwrap_or_default();
            let new_permanent = match &desired.permanent {
                // What the file will actually hold after this reconcile: a
                // matched permanent key is only really installed when
                // droplet-key management is enabled, so the cache must not
                // record it as present when it isn't (or a later message
                // that doesn't change any key content would look like a
                // no-op and never re-append it once re-enabled).
                Some(map) if self.reconciler.droplet_mgmt_enabled() => map.get(&os_user).cloned().unwrap_or_default(),
                Some(_) => Vec::new(),
                None => previous_permanent,
            };

            let mut combined = new_permanent;
            combined.extend(new_session.clone());

            if !are_same_keys(&previous, &combined) {
                let permanent_arg = desired.permanent.as_ref().map(|map| map.get(&os_user).cloned().unwrap_or_default());
                if let Err(err) = self.reconciler.update_keys(&os_user, permanent_arg.as_deref(), &new_session).await {
                    warn!(os_user = %os_user, %err, "failed to reconcile keys");
                }
            }

            if !combined.is_empty() {
                next_cache.insert(os_user, combined);
            }
        }

        *self.cache.lock() = next_cache;
        Ok(())
    }

    /// Scrubs session keys from every user this actioner has touched,
    /// leaving permanent keys in place (spec §4.6).
    async fn shutdown(&self) -> Result<(), Error> {
        let users: Vec<String> = self.cache.lock().keys().cloned().collect();
        for os_user in users {
            if let Err(err) = self.reconciler.remove_session_keys(&os_user).await {
                warn!(os_user = %os_user, %err, "failed to scrub session keys on shutdown");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ssh_keys_actioner_tests.rs"]
mod tests;
