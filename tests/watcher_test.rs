//! Tests for the match watcher: push delivery and the polling fallback.
//!
//! These run under paused time, so the 5-second poll period elapses
//! instantly whenever every task is idle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MemoryStore, ScriptedFeed, in_progress_match};
use tictac_arena::{MatchStatus, MatchWatcher};

fn fixtures() -> (Arc<MemoryStore>, Arc<ScriptedFeed>) {
    let store = Arc::new(MemoryStore::new());
    store.seed_match(in_progress_match("m1"));
    (store, Arc::new(ScriptedFeed::new()))
}

#[tokio::test(start_paused = true)]
async fn push_updates_are_delivered() {
    let (store, feed) = fixtures();
    let (_handle, mut rx) = MatchWatcher::spawn(store.clone(), feed.clone(), "m1")
        .await
        .expect("watcher starts");

    let mut pushed = in_progress_match("m1");
    pushed.status = MatchStatus::Finished;
    pushed.winner_id = Some("u2".to_string());
    feed.pusher().send(pushed).await.expect("push");

    let row = rx.recv().await.expect("row delivered");
    assert_eq!(row.status, MatchStatus::Finished);
    assert_eq!(row.winner_id.as_deref(), Some("u2"));
}

#[tokio::test(start_paused = true)]
async fn poll_fires_when_pushes_go_quiet() {
    let (store, feed) = fixtures();
    let (_handle, mut rx) = MatchWatcher::spawn(store.clone(), feed.clone(), "m1")
        .await
        .expect("watcher starts");

    // Nothing is pushed; the first poll tick fetches from the store.
    let row = rx.recv().await.expect("polled row delivered");
    assert_eq!(row.id, "m1");
    assert!(store.fetch_count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn poll_is_skipped_while_pushes_are_fresh() {
    let (store, feed) = fixtures();
    let (_handle, mut rx) = MatchWatcher::spawn(store.clone(), feed.clone(), "m1")
        .await
        .expect("watcher starts");

    // Push a row every 3 seconds; each poll tick then sees an update
    // newer than the 4-second quiet window and skips the fetch.
    for _ in 0..5 {
        feed.pusher()
            .send(in_progress_match("m1"))
            .await
            .expect("push");
        let _ = rx.recv().await.expect("row delivered");
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    assert_eq!(store.fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn polling_continues_after_the_feed_closes() {
    let (store, feed) = fixtures();
    let (_handle, mut rx) = MatchWatcher::spawn(store.clone(), feed.clone(), "m1")
        .await
        .expect("watcher starts");

    // Producer side drops the channel (e.g. websocket died).
    feed.close();

    // The session stays alive on polled snapshots.
    let row = rx.recv().await.expect("polled row delivered");
    assert_eq!(row.id, "m1");
    let row = rx.recv().await.expect("next poll also delivers");
    assert_eq!(row.id, "m1");
    assert!(store.fetch_count() >= 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_delivery() {
    let (store, feed) = fixtures();
    let (handle, mut rx) = MatchWatcher::spawn(store.clone(), feed.clone(), "m1")
        .await
        .expect("watcher starts");

    handle.shutdown();

    // The loop exits and drops its sender; the channel drains to None.
    assert!(rx.recv().await.is_none());
}
