// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Troubleshooting log export (C7, spec §4.7): for each requested
//! investigation, runs one collector per allow-listed artifact tag (a file
//! tailer for `file:*`, a command runner for `command:*`), keeps only the
//! lines inside `[triggered_at - 15m, triggered_at + 15m]` where that
//! applies, uploads them, flushes, then reports completion. Investigations
//! are deduplicated by UUID.

use crate::command_runner::CommandRunner;
use crate::file_tailer::FileTailer;
use crate::timestamp::TimestampParser;
use agentadapters::{FileSource, LogEmitter, MetadataClient};
use agentcore::{Error, InvestigationState, TimeWindow, TroubleshootingRequest};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Half-width of the time window kept around `triggered_at` (spec §4.7).
pub const WINDOW_HALF_WIDTH: Duration = Duration::minutes(15);
/// `last_lines` passed to the file tailer for every `file:*` artifact.
pub const FILE_TAILER_LAST_LINES: usize = 100;

/// The fixed set of artifact tags this agent will collect (spec §4.7).
/// Anything else requested is silently filtered out.
pub fn allowed_artifacts() -> HashSet<&'static str> {
    ["file:/var/log/syslog", "file:/var/log/messages", "command:top", "command:ps", "command:journalctl"]
        .into_iter()
        .collect()
}

pub struct Exporter<F: FileSource, E: LogEmitter, M: MetadataClient> {
    investigations: InvestigationState,
    file_source: Arc<F>,
    emitter: Arc<E>,
    metadata_client: Arc<M>,
    timestamp_parsers: parking_lot::Mutex<HashMap<String, Arc<TimestampParser>>>,
}

impl<F: FileSource, E: LogEmitter, M: MetadataClient> Exporter<F, E, M> {
    pub fn new(investigations: InvestigationState, file_source: Arc<F>, emitter: Arc<E>, metadata_client: Arc<M>) -> Self {
        Exporter { investigations, file_source, emitter, metadata_client, timestamp_parsers: parking_lot::Mutex::new(HashMap::new()) }
    }

    fn parser_for(&self, tag: &str) -> Arc<TimestampParser> {
        self.timestamp_parsers.lock().entry(tag.to_string()).or_insert_with(|| Arc::new(TimestampParser::new())).clone()
    }

    /// Handles one troubleshooting request. A duplicate or concurrent
    /// request for the same `investigation_uuid` is silently skipped — the
    /// first one already owns the work. An empty allow-listed artifact list
    /// short-circuits: no emitter or completion call is made (spec §4.7's
    /// permitted short-circuit implementation).
    pub async fn handle_request(&self, request: &TroubleshootingRequest) -> Result<(), Error> {
        let Some(_guard) = self.investigations.try_acquire(&request.investigation_uuid) else {
            info!(uuid = %request.investigation_uuid, "investigation already running or agent is shutting down");
            return Ok(());
        };

        let allowed = allowed_artifacts();
        let requested: Vec<String> = request.requesting.iter().filter(|tag| allowed.contains(tag.as_str())).cloned().collect();
        if requested.is_empty() {
            info!(uuid = %request.investigation_uuid, "no allow-listed artifacts requested, short-circuiting");
            return Ok(());
        }

        let window = request
            .triggered_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| TimeWindow::around(t.with_timezone(&Utc), WINDOW_HALF_WIDTH));

        let mut success = true;
        for tag in &requested {
            let parser = self.parser_for(tag);
            let (result, source) = if let Some(path) = tag.strip_prefix("file:") {
                let tailer = FileTailer::new(self.file_source.clone(), self.emitter.clone(), parser);
                (tailer.tail(&request.investigation_uuid, tag, path, FILE_TAILER_LAST_LINES, window).await, "file_tailer")
            } else {
                let cmd_tag = tag.strip_prefix("command:").expect("allowed_artifacts only names file:/command: tags");
                let runner = CommandRunner::new(self.emitter.clone(), parser);
                (runner.run(&request.investigation_uuid, cmd_tag, window).await, "command_runner")
            };
            if let Err(err) = result {
                warn!(%err, tag, uuid = %request.investigation_uuid, "collector failed");
                success = false;
                let _ = self.emitter.emit_error(&request.investigation_uuid, source, &err.to_string()).await;
            }
        }

        if let Err(err) = self.emitter.flush(&request.investigation_uuid).await {
            warn!(%err, uuid = %request.investigation_uuid, "failed to flush emitter");
            success = false;
            let _ = self.emitter.emit_error(&request.investigation_uuid, "otlp_flush", &err.to_string()).await;
        }

        if let Err(err) = self.metadata_client.post_completion(&request.investigation_uuid, success).await {
            warn!(%err, uuid = %request.investigation_uuid, "failed to report investigation completion");
            let _ = self.emitter.emit_error(&request.investigation_uuid, "investigation_completion", &err.to_string()).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod tests;
