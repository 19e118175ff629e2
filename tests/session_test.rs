//! Tests for the match session: optimistic moves, rollback, forfeit.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{MemoryStore, board, in_progress_match, profile};
use tictac_arena::{MatchSession, MatchStatus, PlayError, Position, Turn};

fn pos(index: u8) -> Position {
    Position::new(index).expect("test position in range")
}

fn session_over(store: &Arc<MemoryStore>, viewer: &str) -> MatchSession {
    let row = in_progress_match("m1");
    store.seed_match(row.clone());
    store.seed_profile(profile("u1", "one@example.com"));
    store.seed_profile(profile("u2", "two@example.com"));
    MatchSession::new(store.clone(), viewer.to_string(), row)
}

#[tokio::test]
async fn move_persists_and_updates_local_state() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u1");

    let row = session.make_move(pos(4)).await.expect("move accepted");
    assert_eq!(row.board_state, board("....X...."));
    assert_eq!(row.current_turn, Some(Turn::Player2));

    // The store saw the same write.
    let stored = store.match_row("m1").expect("row exists");
    assert_eq!(stored.board_state, board("....X...."));

    // And the audit log got the move.
    let moves = store.moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].position, 4);
    assert_eq!(moves[0].move_number, 1);
    assert_eq!(moves[0].player_id, "u1");
}

#[tokio::test]
async fn failed_persist_rolls_back_to_authoritative() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u1");

    store.fail_match_updates.store(true, Ordering::SeqCst);
    let result = session.make_move(pos(0)).await;
    assert!(matches!(result, Err(PlayError::Backend(_))));

    // Local state reverted to the stored (empty) board.
    assert_eq!(session.current().board_state, board("........."));
    assert_eq!(session.current().current_turn, Some(Turn::Player1));
    assert!(store.moves().is_empty());
}

#[tokio::test]
async fn rejected_move_leaves_everything_untouched() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u2");

    // u2 plays out of turn.
    let result = session.make_move(pos(0)).await;
    assert!(matches!(result, Err(PlayError::Rejected(_))));
    assert_eq!(session.current().board_state, board("........."));
    assert!(store.moves().is_empty());
}

#[tokio::test]
async fn finishing_move_applies_stats_once() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u1");
    let mut row = in_progress_match("m1");
    row.board_state = board("XX..OO...");
    store.seed_match(row.clone());
    session.observe(row).await;

    let finished = session.make_move(pos(2)).await.expect("winning move").clone();
    assert_eq!(finished.status, MatchStatus::Finished);
    assert_eq!(finished.winner_id.as_deref(), Some("u1"));
    assert!(session.stats_applied());
    assert_eq!(store.profile_row("u1").unwrap().wins, 1);
    assert_eq!(store.profile_row("u2").unwrap().losses, 1);

    // A push confirmation of the same finish does not double-count.
    session.observe(finished).await;
    assert_eq!(store.counter_write_count(), 2);
}

#[tokio::test]
async fn observed_finish_applies_stats_for_the_loser_too() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u2");

    // The opponent's winning move arrives over the feed.
    let mut row = in_progress_match("m1");
    row.status = MatchStatus::Finished;
    row.winner_id = Some("u1".to_string());
    row.board_state = board("XXX.OO...");
    session.observe(row).await;

    assert!(session.stats_applied());
    assert_eq!(store.profile_row("u2").unwrap().losses, 1);
    assert_eq!(store.profile_row("u1").unwrap().wins, 1);
}

#[tokio::test]
async fn audit_insert_failure_does_not_undo_the_move() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u1");

    store.fail_move_inserts.store(true, Ordering::SeqCst);
    let row = session.make_move(pos(4)).await.expect("move stands");
    assert_eq!(row.board_state, board("....X...."));
    assert_eq!(
        store.match_row("m1").unwrap().board_state,
        board("....X....")
    );
}

#[tokio::test]
async fn forfeit_awards_the_opponent() {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_over(&store, "u1");

    let row = session.make_move(pos(4)).await.expect("move accepted").clone();
    assert_eq!(row.status, MatchStatus::InProgress);

    let finished = session.forfeit().await.expect("forfeit accepted");
    assert_eq!(finished.status, MatchStatus::Finished);
    assert_eq!(finished.winner_id.as_deref(), Some("u2"));

    // Stats follow the same contract as a played win.
    assert!(session.stats_applied());
    assert_eq!(store.profile_row("u1").unwrap().losses, 1);
    assert_eq!(store.profile_row("u2").unwrap().wins, 1);
}
