// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn duplicate_uuid_is_refused_while_first_is_running() {
    let state = InvestigationState::new();
    let guard = state.try_acquire("u1").unwrap();
    assert!(state.try_acquire("u1").is_none());
    drop(guard);
    assert!(state.try_acquire("u1").is_some());
}

#[tokio::test]
async fn distinct_uuids_run_concurrently() {
    let state = InvestigationState::new();
    let g1 = state.try_acquire("u1").unwrap();
    let g2 = state.try_acquire("u2").unwrap();
    assert!(state.is_running("u1"));
    assert!(state.is_running("u2"));
    drop(g1);
    drop(g2);
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_guards_to_drop() {
    let state = InvestigationState::new();
    let guard = state.try_acquire("u1").unwrap();

    let state2 = state.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
    });

    let drained = state2.shutdown(Duration::from_secs(1)).await;
    assert!(drained);
    handle.await.unwrap();
}

#[tokio::test]
async fn shutdown_with_no_in_flight_work_returns_immediately() {
    let state = InvestigationState::new();
    assert!(state.shutdown(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn try_acquire_refuses_after_shutdown_starts() {
    let state = InvestigationState::new();
    state.cancellation_token().cancel();
    assert!(state.try_acquire("u1").is_none());
}
