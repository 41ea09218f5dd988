// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentadapters::FakeMetadataClient;

#[test]
fn lifecycle_error_messages_are_human_readable() {
    let err = LifecycleError::PortKnockUnsupported;
    assert!(err.to_string().contains("--metadata-push"));
}

#[tokio::test(start_paused = true)]
async fn report_running_retries_until_the_push_succeeds() {
    let client = FakeMetadataClient::new();
    client.fail_next_pushes(2);

    report_running(&client, 22).await;

    assert_eq!(client.pushed_statuses(), vec![("running".to_string(), 22)]);
}

#[tokio::test]
async fn report_running_returns_immediately_on_first_success() {
    let client = FakeMetadataClient::new();

    report_running(&client, 2222).await;

    assert_eq!(client.pushed_statuses(), vec![("running".to_string(), 2222)]);
}
