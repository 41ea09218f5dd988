// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp extraction for log lines (C10, spec §4.10): detects which of a
//! few known layouts a file uses, caches that choice, and falls back to
//! re-detecting when a line doesn't match. Syslog's year-less timestamp is
//! rolled back a year when the parsed date would otherwise land in the
//! future (a log spanning a New Year's Eve).

use chrono::{DateTime, Datelike, TimeZone, Utc};
use parking_lot::Mutex;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Rfc3339,
    SpaceSeparated,
    Syslog,
}

const LAYOUTS: [Layout; 3] = [Layout::Rfc3339, Layout::SpaceSeparated, Layout::Syslog];

fn syslog_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]{3})\s+(\d{1,2})\s+(\d{2}):(\d{2}):(\d{2})").expect("static regex"))
}

fn month_number(name: &str) -> Option<u32> {
    Some(match name.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    })
}

fn try_parse_rfc3339(line: &str) -> Option<DateTime<Utc>> {
    let token = line.split_whitespace().next()?;
    DateTime::parse_from_rfc3339(token).ok().map(|dt| dt.with_timezone(&Utc))
}

fn try_parse_space_separated(line: &str) -> Option<DateTime<Utc>> {
    if line.len() < 19 {
        return None;
    }
    let prefix = &line[..19];
    chrono::NaiveDateTime::parse_from_str(prefix, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// `"Jan  2 03:04:05"`, no year. If the candidate date would be more than a
/// day in `now`'s future, the line is from before a year boundary.
fn try_parse_syslog(line: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = syslog_regex().captures(line)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;
    let second: u32 = caps[5].parse().ok()?;

    let year = now.year();
    let candidate = Utc.with_ymd_and_hms(year, month, day, hour, minute, second).single()?;
    if candidate > now + chrono::Duration::days(1) {
        return Utc.with_ymd_and_hms(year - 1, month, day, hour, minute, second).single();
    }
    Some(candidate)
}

fn try_parse(line: &str, layout: Layout, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match layout {
        Layout::Rfc3339 => try_parse_rfc3339(line),
        Layout::SpaceSeparated => try_parse_space_separated(line),
        Layout::Syslog => try_parse_syslog(line, now),
    }
}

/// Detects and caches a file's timestamp layout across calls, so a
/// multi-thousand-line file only pays for format detection once.
pub struct TimestampParser {
    detected: Mutex<Option<Layout>>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampParser {
    pub fn new() -> Self {
        TimestampParser { detected: Mutex::new(None) }
    }

    /// Returns `(timestamp, was_parsed)`. When no layout matches, `timestamp`
    /// is `now` and `was_parsed` is `false` so callers can tell a real
    /// timestamp from a filler one.
    pub fn parse(&self, line: &str, now: DateTime<Utc>) -> (DateTime<Utc>, bool) {
        if let Some(layout) = *self.detected.lock() {
            if let Some(ts) = try_parse(line, layout, now) {
                return (ts, true);
            }
        }

        for &layout in &LAYOUTS {
            if let Some(ts) = try_parse(line, layout, now) {
                *self.detected.lock() = Some(layout);
                return (ts, true);
            }
        }

        (now, false)
    }
}

#[cfg(test)]
#[path = "timestamp_tests.rs"]
mod tests;
