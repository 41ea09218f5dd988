// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wraps the troubleshooting exporter (C7) as an `Actioner` so it is
//! registered and dispatched to like every other actioner (spec §4.11 step
//! 3 names "the troubleshooting actioner" alongside SSH-keys and
//! reserved-IPv6).

use crate::actioner::Actioner;
use crate::exporter::Exporter;
use agentadapters::{FileSource, LogEmitter, MetadataClient};
use agentcore::{Error, Metadata};
use std::sync::Arc;

pub struct TroubleshootingActioner<F: FileSource, E: LogEmitter, M: MetadataClient> {
    exporter: Arc<Exporter<F, E, M>>,
}

impl<F: FileSource, E: LogEmitter, M: MetadataClient> TroubleshootingActioner<F, E, M> {
    pub fn new(exporter: Arc<Exporter<F, E, M>>) -> Self {
        TroubleshootingActioner { exporter }
    }
}

#[async_trait::async_trait]
impl<F: FileSource, E: LogEmitter, M: MetadataClient> Actioner for TroubleshootingActioner<F, E, M> {
    fn name(&self) -> &'static str {
        "troubleshooting"
    }

    /// A metadata document with no `troubleshooting` request is a no-op;
    /// `Exporter::handle_request` already short-circuits everything else
    /// (dedup, allow-list filtering, empty artifact lists).
    async fn act(&self, metadata: Arc<Metadata>) -> Result<(), Error> {
        if let Some(request) = &metadata.troubleshooting {
            self.exporter.handle_request(request).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "troubleshooting_actioner_tests.rs"]
mod tests;
