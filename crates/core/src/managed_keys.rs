// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ManagedKeySet`: the reconciler's per-user cache of managed keys (spec §3).

use crate::ssh_key::{KeyType, SshKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// `os_user -> ordered list of SshKey`. Created empty at start-up, replaced
/// wholesale on each successful reconcile, narrowed by the expiry sweep.
///
/// Note the distinct `nil`-vs-empty concept used elsewhere (spec §9): this
/// type is the reconciler's *cache*, which always exists (possibly empty) and
/// mixes both permanent and session keys together. The separate "no
/// authoritative view of permanent keys this round" signal is carried as the
/// `permanent: Option<&[SshKey]>` argument to
/// `agentengine::reconciler::Reconciler::update_keys` and
/// `agentengine::reconciler::prepare_authorized_keys`, not by this type.
pub type ManagedKeySet = HashMap<String, Vec<SshKey>>;

/// Drop all expired session keys from every user, and drop any user whose
/// resulting list becomes empty. Permanent keys are never dropped by a sweep.
pub fn remove_expired_keys(cache: &ManagedKeySet, now: DateTime<Utc>) -> ManagedKeySet {
    cache
        .iter()
        .filter_map(|(user, keys)| {
            let kept: Vec<SshKey> = keys
                .iter()
                .filter(|k| matches!(k.key_type, KeyType::Permanent) || !k.is_expired(now))
                .cloned()
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some((user.clone(), kept))
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "managed_keys_tests.rs"]
mod tests;
