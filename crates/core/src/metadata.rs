// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Metadata`: the remote desired-state document (spec §3), and `TriState`,
//! the "unchanged / on / off" wrapper spec §9 asks for in place of a
//! nullable bool.

use serde::{Deserialize, Serialize};

/// A boolean with a third state: "no change was requested".
///
/// Using a dedicated tagged union instead of `Option<bool>` makes call sites
/// self-documenting: `TriState::Unchanged` cannot be confused with "false".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unchanged,
    Enabled,
    Disabled,
}

impl TriState {
    pub fn from_optional_bool(value: Option<bool>) -> Self {
        match value {
            None => TriState::Unchanged,
            Some(true) => TriState::Enabled,
            Some(false) => TriState::Disabled,
        }
    }
}

/// One raw serialized session key record as delivered in `Metadata::session_keys`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSessionKey {
    #[serde(default)]
    pub os_user: String,
    pub ssh_key: String,
    #[serde(default)]
    pub actor_email: String,
    pub ttl: i64,
}

/// Reserved-IPv6 configuration, carried through to the stub actioner
/// (SPEC_FULL.md supplemental behavior; the reserved-IPv6 actioner itself is
/// external to this core per spec §4.11).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReservedIpv6 {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub address: String,
}

/// A troubleshooting (investigation) request embedded in metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TroubleshootingRequest {
    pub investigation_uuid: String,
    #[serde(default)]
    pub triggered_at: Option<String>,
    #[serde(default)]
    pub requesting: Vec<String>,
}

/// The full metadata document consumed by this agent. Never mutates after
/// construction; constructed once per change event and discarded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metadata {
    /// `None` (absent or JSON `null`) means "no authoritative view of
    /// permanent keys this round, leave whatever is on disk alone";
    /// `Some(vec![])` means "authoritatively zero, clean them all" (spec §9).
    #[serde(default)]
    pub public_keys: Option<Vec<String>>,
    #[serde(default)]
    pub session_keys: Vec<RawSessionKey>,
    #[serde(default, with = "tri_state_serde")]
    pub managed_keys_enabled: TriState,
    #[serde(default)]
    pub reserved_ipv6: Option<ReservedIpv6>,
    #[serde(default)]
    pub troubleshooting: Option<TroubleshootingRequest>,
    pub droplet_id: String,
    pub hostname: String,
    pub region: String,
}

mod tri_state_serde {
    use super::TriState;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &TriState, s: S) -> Result<S::Ok, S::Error> {
        let opt = match value {
            TriState::Unchanged => None,
            TriState::Enabled => Some(true),
            TriState::Disabled => Some(false),
        };
        opt.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TriState, D::Error> {
        let opt = Option::<bool>::deserialize(d)?;
        Ok(TriState::from_optional_bool(opt))
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
