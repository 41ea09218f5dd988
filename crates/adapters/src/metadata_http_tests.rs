// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcore::TriState;

fn sample_metadata() -> Metadata {
    Metadata {
        public_keys: vec!["ssh-ed25519 AAAA".to_string()],
        session_keys: vec![],
        managed_keys_enabled: TriState::Enabled,
        reserved_ipv6: None,
        troubleshooting: None,
        droplet_id: "123".to_string(),
        hostname: "web-01".to_string(),
        region: "nyc3".to_string(),
    }
}

#[tokio::test]
async fn fake_client_returns_seeded_metadata() {
    let client = FakeMetadataClient::with_metadata(sample_metadata());
    let fetched = client.fetch().await.unwrap();
    assert_eq!(fetched.droplet_id, "123");
}

#[tokio::test]
async fn fake_client_records_pushed_status_and_completions() {
    let client = FakeMetadataClient::new();
    client.push_status("running", 22).await.unwrap();
    client.post_completion("inv-1", true).await.unwrap();

    assert_eq!(client.pushed_statuses(), vec![("running".to_string(), 22)]);
    assert_eq!(client.completions(), vec![("inv-1".to_string(), true)]);
}

#[tokio::test]
async fn fake_client_push_status_fails_the_requested_number_of_times() {
    let client = FakeMetadataClient::new();
    client.fail_next_pushes(2);
    assert!(client.push_status("running", 22).await.is_err());
    assert!(client.push_status("running", 22).await.is_err());
    client.push_status("running", 22).await.unwrap();
    assert_eq!(client.pushed_statuses(), vec![("running".to_string(), 22)]);
}

#[tokio::test]
async fn fake_client_fetch_failure_is_one_shot() {
    let client = FakeMetadataClient::with_metadata(sample_metadata());
    client.fail_next_fetch();
    assert!(client.fetch().await.is_err());
    assert!(client.fetch().await.is_ok());
}

#[test]
fn tri_state_round_trips_through_metadata_json() {
    let metadata = sample_metadata();
    let json = serde_json::to_string(&metadata).unwrap();
    let back: Metadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back.managed_keys_enabled, TriState::Enabled);
}

#[test]
fn backoff_delay_doubles_then_caps() {
    assert_eq!(backoff_delay(0), Duration::from_secs(1));
    assert_eq!(backoff_delay(1), Duration::from_secs(2));
    assert_eq!(backoff_delay(2), Duration::from_secs(4));
    assert_eq!(backoff_delay(10), COMPLETION_RETRY_CAP);
}
