// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reserved-IPv6 actioner: a thin external-facing stub (spec §4.11 step 3).
//! Actually attaching/detaching the address is out of this agent's scope
//! (networkd/netplan territory); this actioner only observes and logs the
//! requested state so the behavior is visible without pretending to own it.

use crate::actioner::Actioner;
use agentcore::{Error, Metadata};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReservedIpv6Actioner;

#[async_trait::async_trait]
impl Actioner for ReservedIpv6Actioner {
    fn name(&self) -> &'static str {
        "reserved_ipv6"
    }

    async fn act(&self, metadata: Arc<Metadata>) -> Result<(), Error> {
        match &metadata.reserved_ipv6 {
            Some(reserved) if reserved.active => {
                info!(address = %reserved.address, "reserved IPv6 requested active");
            }
            Some(reserved) => {
                debug!(address = %reserved.address, "reserved IPv6 present but inactive");
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "reserved_ipv6_actioner_tests.rs"]
mod tests;
