// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tri_state_absent_field_is_unchanged() {
    let json = r#"{"droplet_id":"d1","hostname":"h","region":"nyc1"}"#;
    let m: Metadata = serde_json::from_str(json).unwrap();
    assert_eq!(m.managed_keys_enabled, TriState::Unchanged);
}

#[test]
fn tri_state_true_is_enabled_false_is_disabled() {
    let on: Metadata = serde_json::from_str(
        r#"{"droplet_id":"d","hostname":"h","region":"r","managed_keys_enabled":true}"#,
    )
    .unwrap();
    let off: Metadata = serde_json::from_str(
        r#"{"droplet_id":"d","hostname":"h","region":"r","managed_keys_enabled":false}"#,
    )
    .unwrap();
    assert_eq!(on.managed_keys_enabled, TriState::Enabled);
    assert_eq!(off.managed_keys_enabled, TriState::Disabled);
}

#[test]
fn public_keys_absent_is_nil_not_empty() {
    let json = r#"{"droplet_id":"d1","hostname":"h","region":"nyc1"}"#;
    let m: Metadata = serde_json::from_str(json).unwrap();
    assert_eq!(m.public_keys, None);
}

#[test]
fn public_keys_explicit_null_is_also_nil() {
    let json = r#"{"droplet_id":"d1","hostname":"h","region":"nyc1","public_keys":null}"#;
    let m: Metadata = serde_json::from_str(json).unwrap();
    assert_eq!(m.public_keys, None);
}

#[test]
fn public_keys_explicit_empty_array_is_authoritatively_empty() {
    let json = r#"{"droplet_id":"d1","hostname":"h","region":"nyc1","public_keys":[]}"#;
    let m: Metadata = serde_json::from_str(json).unwrap();
    assert_eq!(m.public_keys, Some(vec![]));
}

#[test]
fn troubleshooting_round_trips() {
    let json = r#"{
        "droplet_id":"d","hostname":"h","region":"r",
        "troubleshooting": {"investigation_uuid":"abc","triggered_at":"2023-10-15T15:00:00Z","requesting":["command:ps"]}
    }"#;
    let m: Metadata = serde_json::from_str(json).unwrap();
    let t = m.troubleshooting.unwrap();
    assert_eq!(t.investigation_uuid, "abc");
    assert_eq!(t.requesting, vec!["command:ps".to_string()]);
}
