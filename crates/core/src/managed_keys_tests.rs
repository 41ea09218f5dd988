// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

const SAMPLE_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIBdaiuE9AhVbJQZvP0MW4VPn77EFc3/0q9jQhWd/tUij";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn perm(user: &str) -> SshKey {
    SshKey::validate(user, SAMPLE_KEY, "", 0, KeyType::Permanent, "d", now()).unwrap()
}

fn session(user: &str, ttl: i64) -> SshKey {
    SshKey::validate(user, SAMPLE_KEY, "", ttl, KeyType::Session, "d", now()).unwrap()
}

#[test]
fn sweep_drops_only_expired_session_keys() {
    let mut cache: ManagedKeySet = HashMap::new();
    cache.insert("u1".to_string(), vec![perm("u1"), session("u1", -5)]);
    cache.insert("u2".to_string(), vec![session("u2", -5)]);

    let swept = remove_expired_keys(&cache, now());

    assert_eq!(swept.get("u1").map(|v| v.len()), Some(1));
    assert!(swept["u1"][0].key_type == KeyType::Permanent);
    assert!(!swept.contains_key("u2"));
}

#[test]
fn sweep_keeps_unexpired_session_keys() {
    let mut cache: ManagedKeySet = HashMap::new();
    cache.insert("u1".to_string(), vec![session("u1", 3600)]);
    let swept = remove_expired_keys(&cache, now());
    assert_eq!(swept.get("u1").map(|v| v.len()), Some(1));
}

#[test]
fn sweep_of_empty_cache_is_empty() {
    let cache: ManagedKeySet = HashMap::new();
    assert!(remove_expired_keys(&cache, now()).is_empty());
}
