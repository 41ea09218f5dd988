// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentadapters::FakeAuthorizedKeysStore;
use agentcore::{RawSessionKey, SystemClock};

fn metadata_with(public_keys: Option<Vec<&str>>, session_keys: Vec<RawSessionKey>, enabled: TriState) -> Metadata {
    Metadata {
        public_keys: public_keys.map(|keys| keys.into_iter().map(str::to_string).collect()),
        session_keys,
        managed_keys_enabled: enabled,
        reserved_ipv6: None,
        troubleshooting: None,
        droplet_id: "1".to_string(),
        hostname: "h".to_string(),
        region: "nyc3".to_string(),
    }
}

fn build_actioner() -> (Arc<FakeAuthorizedKeysStore>, SshKeysActioner<FakeAuthorizedKeysStore>) {
    let store = Arc::new(FakeAuthorizedKeysStore::new());
    let reconciler = Arc::new(Reconciler::new(store.clone()));
    let actioner = SshKeysActioner::new(reconciler, "root", Arc::new(SystemClock));
    (store, actioner)
}

#[test]
fn build_desired_keys_groups_by_os_user() {
    let metadata = metadata_with(
        Some(vec!["ssh-ed25519 AAAA owner"]),
        vec![RawSessionKey {
            os_user: "deploy".to_string(),
            ssh_key: "ssh-ed25519 AAAA session".to_string(),
            actor_email: "a@example.com".to_string(),
            ttl: 60,
        }],
        TriState::Unchanged,
    );

    let desired = build_desired_keys(&metadata, "root", chrono::Utc::now());
    let permanent = desired.permanent.expect("public_keys was Some");
    assert_eq!(permanent["root"].len(), 1);
    assert_eq!(desired.session["deploy"].len(), 1);
}

#[test]
fn build_desired_keys_skips_invalid_entries() {
    let metadata = metadata_with(Some(vec!["not-a-key"]), vec![], TriState::Unchanged);
    let desired = build_desired_keys(&metadata, "root", chrono::Utc::now());
    assert!(desired.permanent.expect("public_keys was Some").is_empty());
}

#[test]
fn build_desired_keys_is_nil_when_public_keys_is_absent() {
    let metadata = metadata_with(None, vec![], TriState::Unchanged);
    let desired = build_desired_keys(&metadata, "root", chrono::Utc::now());
    assert!(desired.permanent.is_none());
}

#[test]
fn build_desired_keys_parses_rightmost_os_user_suffix() {
    let metadata = metadata_with(Some(vec!["ssh-ed25519 AAAA owner -os_user=alice -os_user=bob"]), vec![], TriState::Unchanged);
    let desired = build_desired_keys(&metadata, "root", chrono::Utc::now());
    let permanent = desired.permanent.expect("public_keys was Some");
    assert!(permanent.contains_key("bob"));
    assert!(!permanent.contains_key("alice"));
}

#[tokio::test]
async fn act_installs_public_keys_for_the_default_user() {
    let (store, actioner) = build_actioner();
    let metadata = metadata_with(Some(vec!["ssh-ed25519 AAAA owner"]), vec![], TriState::Unchanged);

    actioner.act(Arc::new(metadata)).await.unwrap();
    assert!(store.contents("root").unwrap().contains("owner"));
}

#[tokio::test]
async fn act_with_disabled_and_empty_keys_removes_permanent_keys_but_keeps_session_keys() {
    let (store, actioner) = build_actioner();
    let session_key = RawSessionKey {
        os_user: "root".to_string(),
        ssh_key: "ssh-ed25519 AAAA session".to_string(),
        actor_email: "a@example.com".to_string(),
        ttl: 3600,
    };
    let enabled = metadata_with(Some(vec!["ssh-ed25519 AAAA owner"]), vec![session_key.clone()], TriState::Unchanged);
    actioner.act(Arc::new(enabled)).await.unwrap();
    assert!(store.contents("root").unwrap().contains("owner"));
    assert!(store.contents("root").unwrap().contains("session"));

    // The same session key is still present in metadata this round — only
    // the authoritative (now empty) permanent-key list and the disabled
    // toggle change.
    let disabled = metadata_with(Some(vec![]), vec![session_key], TriState::Disabled);
    actioner.act(Arc::new(disabled)).await.unwrap();
    let contents = store.contents("root").unwrap();
    assert!(!contents.contains("owner"), "permanent key should be stripped once disabled with an authoritative empty list");
    assert!(contents.contains("session"), "disabling droplet-key management must never wipe session keys");
}

#[tokio::test]
async fn act_with_unchanged_after_disabled_does_not_resume_managing_permanent_keys() {
    let (store, actioner) = build_actioner();
    let disabled = metadata_with(Some(vec!["ssh-ed25519 AAAA owner"]), vec![], TriState::Disabled);
    actioner.act(Arc::new(disabled)).await.unwrap();
    assert!(!store.contents("root").unwrap_or_default().contains("owner"));

    let unchanged = metadata_with(Some(vec!["ssh-ed25519 AAAA owner"]), vec![], TriState::Unchanged);
    actioner.act(Arc::new(unchanged)).await.unwrap();
    assert!(
        !store.contents("root").unwrap_or_default().contains("owner"),
        "an Unchanged message must not silently re-enable permanent key management"
    );
}

#[tokio::test]
async fn act_removes_keys_for_a_user_no_longer_present_in_metadata() {
    let (store, actioner) = build_actioner();
    let with_deploy = metadata_with(
        Some(vec![]),
        vec![RawSessionKey {
            os_user: "deploy".to_string(),
            ssh_key: "ssh-ed25519 AAAA session".to_string(),
            actor_email: "a@example.com".to_string(),
            ttl: 3600,
        }],
        TriState::Unchanged,
    );
    actioner.act(Arc::new(with_deploy)).await.unwrap();
    assert!(store.contents("deploy").unwrap().contains("session"));

    let without_deploy = metadata_with(Some(vec![]), vec![], TriState::Unchanged);
    actioner.act(Arc::new(without_deploy)).await.unwrap();
    assert!(!store.contents("deploy").unwrap().contains("session"));
}

#[tokio::test]
async fn shutdown_scrubs_session_keys_but_keeps_permanent_ones() {
    let (store, actioner) = build_actioner();
    let metadata = metadata_with(
        Some(vec!["ssh-ed25519 AAAA owner"]),
        vec![RawSessionKey {
            os_user: "root".to_string(),
            ssh_key: "ssh-ed25519 AAAA session".to_string(),
            actor_email: "a@example.com".to_string(),
            ttl: 3600,
        }],
        TriState::Unchanged,
    );
    actioner.act(Arc::new(metadata)).await.unwrap();
    assert!(store.contents("root").unwrap().contains("session"));

    Actioner::shutdown(&actioner).await.unwrap();
    let contents = store.contents("root").unwrap();
    assert!(contents.contains("owner"));
    assert!(!contents.contains("session"));
}
