// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_reports_the_set_time() {
    let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(t);
    assert_eq!(clock.now(), t);
}

#[test]
fn fake_clock_advance_moves_forward() {
    let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(t);
    clock.advance(chrono::Duration::seconds(60));
    assert_eq!(clock.now(), t + chrono::Duration::seconds(60));
}

#[test]
fn system_clock_is_monotonically_sane() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
