// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::actioner::Actioner;
use agentadapters::{FakeMetadataClient, FakeSniffer};
use agentcore::{TcpPacket, TriState};
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn rate_limiter_rejects_within_interval_and_allows_after() {
    let limiter = RateLimiter::new(Duration::from_millis(50));
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
    std::thread::sleep(Duration::from_millis(60));
    assert!(limiter.try_acquire());
}

struct CountingActioner {
    count: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Actioner for CountingActioner {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn act(&self, _metadata: Arc<Metadata>) -> Result<(), Error> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn sample_metadata() -> Metadata {
    Metadata {
        public_keys: vec![],
        session_keys: vec![],
        managed_keys_enabled: TriState::Unchanged,
        reserved_ipv6: None,
        troubleshooting: None,
        droplet_id: "1".to_string(),
        hostname: "h".to_string(),
        region: "nyc3".to_string(),
    }
}

fn knock_packet() -> TcpPacket {
    TcpPacket {
        dest_port: PORT_KNOCK_PATTERN.target_port,
        seq_num: PORT_KNOCK_PATTERN.seq_num,
        ack_num: PORT_KNOCK_PATTERN.ack_num,
        control_flags: PORT_KNOCK_PATTERN.flags,
        ..Default::default()
    }
}

#[tokio::test]
async fn port_knock_watcher_dispatches_on_a_matching_packet() {
    let count = Arc::new(AtomicUsize::new(0));
    let actioner: Arc<dyn Actioner> = Arc::new(CountingActioner { count: count.clone() });
    let dispatcher = Arc::new(Dispatcher::new(vec![actioner]));
    let sniffer = Arc::new(FakeSniffer::with_packets(vec![knock_packet()]));
    let metadata_client = Arc::new(FakeMetadataClient::with_metadata(sample_metadata()));

    let watcher = Arc::new(PortKnockWatcher::new(sniffer, metadata_client, dispatcher));
    let w = watcher.clone();
    let handle = tokio::spawn(async move { w.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    watcher.shutdown(Duration::from_secs(1)).await;
    handle.await.unwrap().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn port_knock_watcher_rate_limits_rapid_knocks() {
    let count = Arc::new(AtomicUsize::new(0));
    let actioner: Arc<dyn Actioner> = Arc::new(CountingActioner { count: count.clone() });
    let dispatcher = Arc::new(Dispatcher::new(vec![actioner]));
    let sniffer = Arc::new(FakeSniffer::with_packets(vec![knock_packet(), knock_packet(), knock_packet()]));
    let metadata_client = Arc::new(FakeMetadataClient::with_metadata(sample_metadata()));

    let watcher = Arc::new(PortKnockWatcher::new(sniffer, metadata_client, dispatcher));
    let w = watcher.clone();
    let handle = tokio::spawn(async move { w.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    watcher.shutdown(Duration::from_secs(1)).await;
    handle.await.unwrap().unwrap();

    // All three packets arrive well within one rate-limit interval, so only
    // the first is dispatched.
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn http_push_watcher_fetches_and_dispatches_on_a_hit() {
    let count = Arc::new(AtomicUsize::new(0));
    let actioner: Arc<dyn Actioner> = Arc::new(CountingActioner { count: count.clone() });
    let dispatcher = Arc::new(Dispatcher::new(vec![actioner]));
    let metadata_client = Arc::new(FakeMetadataClient::with_metadata(sample_metadata()));

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (watcher, bound) = HttpPushWatcher::bind(addr, metadata_client, dispatcher).await.unwrap();
    let watcher = Arc::new(watcher);
    let w = watcher.clone();
    let handle = tokio::spawn(async move { w.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let client = reqwest::Client::new();
    let response = client.post(format!("http://{bound}/metadata-changed")).send().await.unwrap();
    assert!(response.status().is_success());

    tokio::time::sleep(Duration::from_millis(20)).await;
    watcher.shutdown(Duration::from_secs(1)).await;
    handle.await.unwrap().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
}
