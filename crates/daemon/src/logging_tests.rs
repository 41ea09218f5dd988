// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn max_level_tracks_the_debug_flag() {
    assert_eq!(max_level(false), log::LevelFilter::Info);
    assert_eq!(max_level(true), log::LevelFilter::Debug);
}

#[test]
fn env_filter_defaults_to_info_without_debug() {
    assert_eq!(env_filter(false).to_string(), "info");
}

#[test]
fn env_filter_raises_to_debug_when_requested() {
    assert_eq!(env_filter(true).to_string(), "debug");
}
