// Watcher run-loop tests: startup sync, live event consumption, and
// graceful cancellation, exercised with real tasks on a multi-thread runtime.

mod common;

use common::*;
use rollcall_core::{event_channel, MemberEvent};
use rollcall_watcher::Watcher;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn watcher_syncs_at_startup_then_applies_live_events() {
    let pool = setup_test_db().await;
    let roster = FakeRoster::new(vec![
        member("1", "alice", "0001"),
        member("2", "bob", "0002"),
    ]);
    let delivery = RecordingDelivery::new();
    let reconciler = Arc::new(build_reconciler(pool.clone(), roster, delivery.clone()).await);

    // Long interval keeps the periodic loop quiet for the whole test.
    let watcher = Watcher::new(reconciler.clone(), Duration::from_secs(3600));
    let cancel_token = watcher.cancel_token();

    let (events_tx, events_rx) = event_channel::create_channel();
    let handle = tokio::spawn(watcher.run(events_rx));

    events_tx
        .send(MemberEvent::Joined {
            record: member("3", "carol", "0003"),
        })
        .await
        .unwrap();

    // Wait for the live loop to drain the event.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while reconciler.member_count().await < 3 {
        assert!(tokio::time::Instant::now() < deadline, "event never applied");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel_token.cancel();
    handle.await.unwrap().unwrap();

    // Startup roster was suppressed (cold), the live join was announced.
    assert_eq!(store_count(&pool).await, 3);
    assert_eq!(delivery.sent(), vec!["<@3> (carol#0003) joined the server"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn watcher_stops_when_the_event_channel_closes() {
    let pool = setup_test_db().await;
    let roster = FakeRoster::new(vec![]);
    let delivery = RecordingDelivery::new();
    let reconciler = Arc::new(build_reconciler(pool, roster, delivery).await);

    let watcher = Watcher::new(reconciler, Duration::from_secs(3600));
    let cancel_token = watcher.cancel_token();

    let (events_tx, events_rx) = event_channel::create_channel();
    let handle = tokio::spawn(watcher.run(events_rx));

    // Intake gone: the live loop exits on its own; stop the periodic loop too.
    drop(events_tx);
    cancel_token.cancel();

    handle.await.unwrap().unwrap();
}
