// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based collector (C9, spec §4.9): reads an allow-listed log file to
//! its current end, parses each line's timestamp, and emits either every
//! line, the last N lines, or only the lines inside a time window (falling
//! back to the last N if nothing matched).

use crate::ring_buffer::RingBuffer;
use crate::timestamp::TimestampParser;
use agentadapters::{FileSource, LogEmitter};
use agentcore::{Error, LogEntry, TimeWindow};
use chrono::Utc;
use std::sync::Arc;

pub struct FileTailer<F: FileSource, E: LogEmitter> {
    file_source: Arc<F>,
    emitter: Arc<E>,
    parser: Arc<TimestampParser>,
}

impl<F: FileSource, E: LogEmitter> FileTailer<F, E> {
    pub fn new(file_source: Arc<F>, emitter: Arc<E>, parser: Arc<TimestampParser>) -> Self {
        FileTailer { file_source, emitter, parser }
    }

    /// `source_tag` is the full `file:<path>` tag used when emitting.
    pub async fn tail(
        &self,
        investigation_uuid: &str,
        source_tag: &str,
        path: &str,
        last_lines: usize,
        window: Option<TimeWindow>,
    ) -> Result<(), Error> {
        let lines = self.file_source.read_all_lines(path).await?;
        let now = Utc::now();

        match window {
            None if last_lines == 0 => {
                for line in &lines {
                    self.emit(investigation_uuid, source_tag, line, now).await?;
                }
            }
            None => {
                let mut ring = RingBuffer::new(last_lines);
                for line in &lines {
                    ring.push(line.clone());
                }
                for line in ring.into_vec() {
                    self.emit(investigation_uuid, source_tag, &line, now).await?;
                }
            }
            Some(window) => {
                let mut fallback = if last_lines > 0 { Some(RingBuffer::new(last_lines)) } else { None };
                let mut emitted_any = false;
                for line in &lines {
                    let (timestamp, timestamp_parsed) = self.parser.parse(line, now);
                    if timestamp_parsed && window.contains(timestamp) {
                        let entry = LogEntry { original: line.clone(), timestamp, timestamp_parsed };
                        self.emitter.emit_log(investigation_uuid, source_tag, &entry).await?;
                        emitted_any = true;
                        fallback = None;
                    } else if !emitted_any {
                        if let Some(ring) = fallback.as_mut() {
                            ring.push(line.clone());
                        }
                    }
                }
                if !emitted_any {
                    if let Some(ring) = fallback {
                        for line in ring.into_vec() {
                            self.emit(investigation_uuid, source_tag, &line, now).await?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn emit(&self, investigation_uuid: &str, source_tag: &str, line: &str, now: chrono::DateTime<Utc>) -> Result<(), Error> {
        let (timestamp, timestamp_parsed) = self.parser.parse(line, now);
        let entry = LogEntry { original: line.to_string(), timestamp, timestamp_parsed };
        self.emitter.emit_log(investigation_uuid, source_tag, &entry).await
    }
}

#[cfg(test)]
#[path = "file_tailer_tests.rs"]
mod tests;
