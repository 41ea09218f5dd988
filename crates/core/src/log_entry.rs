// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LogEntry`/`TimeWindow` (spec §3), shared between the command runner
//! (C8), file tailer (C9) and the timestamp parser (C10).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub original: String,
    pub timestamp: DateTime<Utc>,
    pub timestamp_parsed: bool,
}

/// Inclusive on both ends; whether the bound is conceptually half-open or
/// closed doesn't matter because inclusion is always `start <= t <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// `[triggered - 15min, triggered + 15min]`, per spec §4.7.
    pub fn around(triggered_at: DateTime<Utc>, half_width: chrono::Duration) -> TimeWindow {
        TimeWindow {
            start: triggered_at - half_width,
            end: triggered_at + half_width,
        }
    }
}

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;
