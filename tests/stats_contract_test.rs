//! Tests for the exactly-once statistics contract.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{MemoryStore, in_progress_match, profile};
use tictac_arena::{MatchStatus, StatsRecorder};

fn finished_match(winner: Option<&str>) -> tictac_arena::MatchRow {
    let mut row = in_progress_match("m1");
    row.status = MatchStatus::Finished;
    row.winner_id = winner.map(|w| w.to_string());
    row
}

fn store_with_profiles() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let mut mine = profile("u1", "one@example.com");
    mine.wins = 2;
    mine.losses = 1;
    let mut theirs = profile("u2", "two@example.com");
    theirs.losses = 5;
    theirs.draws = 3;
    store.seed_profile(mine);
    store.seed_profile(theirs);
    store
}

#[tokio::test]
async fn win_updates_both_counters_together() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());

    let applied = recorder
        .record_once(&finished_match(Some("u1")), "u1")
        .await
        .expect("stats should apply");
    assert!(applied);

    let mine = store.profile_row("u1").expect("profile exists");
    let theirs = store.profile_row("u2").expect("profile exists");
    assert_eq!(mine.wins, 3);
    assert_eq!(mine.losses, 1);
    assert_eq!(theirs.losses, 6);
    assert_eq!(store.counter_write_count(), 2);
}

#[tokio::test]
async fn opponent_win_mirrors_the_update() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());

    recorder
        .record_once(&finished_match(Some("u2")), "u1")
        .await
        .expect("stats should apply");

    assert_eq!(store.profile_row("u1").unwrap().losses, 2);
    assert_eq!(store.profile_row("u2").unwrap().wins, 1);
}

#[tokio::test]
async fn draw_increments_both_draw_counters() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());

    recorder
        .record_once(&finished_match(None), "u1")
        .await
        .expect("stats should apply");

    assert_eq!(store.profile_row("u1").unwrap().draws, 1);
    assert_eq!(store.profile_row("u2").unwrap().draws, 4);
}

#[tokio::test]
async fn repeated_observations_apply_once() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());
    let row = finished_match(Some("u1"));

    // The same finish arrives three times: own move, push, and poll.
    assert!(recorder.record_once(&row, "u1").await.unwrap());
    assert!(!recorder.record_once(&row, "u1").await.unwrap());
    assert!(!recorder.record_once(&row, "u1").await.unwrap());

    assert_eq!(store.profile_row("u1").unwrap().wins, 3);
    assert_eq!(store.counter_write_count(), 2);
}

#[tokio::test]
async fn unfinished_rows_are_skipped() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());

    let applied = recorder
        .record_once(&in_progress_match("m1"), "u1")
        .await
        .expect("skip is not an error");
    assert!(!applied);
    assert!(!recorder.is_applied());
    assert_eq!(store.counter_write_count(), 0);
}

#[tokio::test]
async fn failed_update_rearms_for_retry() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());
    let row = finished_match(Some("u1"));

    store.fail_counter_updates.store(true, Ordering::SeqCst);
    assert!(recorder.record_once(&row, "u1").await.is_err());
    assert!(!recorder.is_applied());

    // The next observed event retries and succeeds.
    store.fail_counter_updates.store(false, Ordering::SeqCst);
    assert!(recorder.record_once(&row, "u1").await.unwrap());
    assert_eq!(store.profile_row("u1").unwrap().wins, 3);
}

#[tokio::test]
async fn winner_outside_participants_is_an_error() {
    let store = store_with_profiles();
    let recorder = StatsRecorder::new(store.clone());

    let result = recorder
        .record_once(&finished_match(Some("stranger")), "u1")
        .await;
    assert!(result.is_err());
    assert_eq!(store.counter_write_count(), 0);
}
