//! Tests for the move contract: validation and outcome computation.

mod common;

use common::{board, in_progress_match};
use tictac_arena::{MatchStatus, MoveError, Position, Turn, plan_move};

fn pos(index: u8) -> Position {
    Position::new(index).expect("test position in range")
}

#[test]
fn accepts_move_and_flips_turn() {
    let row = in_progress_match("m1");
    let plan = plan_move(&row, "u1", pos(4)).expect("move should be accepted");

    assert_eq!(plan.status, MatchStatus::InProgress);
    assert_eq!(plan.next_turn, Some(Turn::Player2));
    assert_eq!(plan.winner_id, None);
    assert_eq!(plan.move_number, 1);
    assert_eq!(plan.board, board("....X...."));
}

#[test]
fn move_number_counts_occupied_cells() {
    let mut row = in_progress_match("m1");
    row.board_state = board("XO..X....");
    row.current_turn = Some(Turn::Player2);

    let plan = plan_move(&row, "u2", pos(8)).expect("move should be accepted");
    assert_eq!(plan.move_number, 4);
}

#[test]
fn completing_a_row_wins_for_the_actor() {
    // X has two in the top row; placing the third wins.
    let mut row = in_progress_match("m1");
    row.board_state = board("XX..OO...");

    let plan = plan_move(&row, "u1", pos(2)).expect("winning move should be accepted");
    assert_eq!(plan.status, MatchStatus::Finished);
    assert_eq!(plan.winner_id.as_deref(), Some("u1"));
    assert_eq!(plan.next_turn, None);
    assert_eq!(plan.board, board("XXX.OO..."));
}

#[test]
fn column_and_diagonal_wins_detected() {
    let mut row = in_progress_match("m1");
    row.board_state = board("X.OX.O...");
    let plan = plan_move(&row, "u1", pos(6)).expect("column win");
    assert_eq!(plan.winner_id.as_deref(), Some("u1"));

    let mut row = in_progress_match("m2");
    row.board_state = board("X.O.X.O..");
    let plan = plan_move(&row, "u1", pos(8)).expect("diagonal win");
    assert_eq!(plan.winner_id.as_deref(), Some("u1"));
}

#[test]
fn filling_the_board_without_a_line_draws() {
    // X O X / X O O / O X _ — X at 8 fills the board, no line.
    let mut row = in_progress_match("m1");
    row.board_state = board("XOXXOOOX.");

    let plan = plan_move(&row, "u1", pos(8)).expect("drawing move should be accepted");
    assert_eq!(plan.status, MatchStatus::Finished);
    assert_eq!(plan.winner_id, None);
    assert_eq!(plan.next_turn, None);
}

#[test]
fn rejects_non_participant() {
    let row = in_progress_match("m1");
    assert_eq!(
        plan_move(&row, "stranger", pos(0)),
        Err(MoveError::NotAParticipant)
    );
}

#[test]
fn rejects_out_of_turn_move() {
    let row = in_progress_match("m1");
    assert_eq!(plan_move(&row, "u2", pos(0)), Err(MoveError::NotYourTurn));
}

#[test]
fn rejects_occupied_slot() {
    let mut row = in_progress_match("m1");
    row.board_state = board("X........");
    row.current_turn = Some(Turn::Player2);
    assert_eq!(plan_move(&row, "u2", pos(0)), Err(MoveError::SlotOccupied));
}

#[test]
fn rejects_moves_outside_in_progress() {
    let mut waiting = in_progress_match("m1");
    waiting.status = MatchStatus::Waiting;
    waiting.player2_id = None;
    assert_eq!(
        plan_move(&waiting, "u1", pos(0)),
        Err(MoveError::NotInProgress)
    );

    let mut finished = in_progress_match("m2");
    finished.status = MatchStatus::Finished;
    finished.winner_id = Some("u2".to_string());
    assert_eq!(
        plan_move(&finished, "u1", pos(0)),
        Err(MoveError::NotInProgress)
    );
}

#[test]
fn patch_carries_exactly_the_planned_fields() {
    let mut row = in_progress_match("m1");
    row.board_state = board("XX..OO...");

    let plan = plan_move(&row, "u1", pos(2)).expect("winning move");
    let patch = plan.patch();
    assert_eq!(patch.status, Some(MatchStatus::Finished));
    assert_eq!(patch.winner_id.as_deref(), Some("u1"));
    assert_eq!(patch.board_state, Some(plan.board.clone()));
    // The stored turn is left untouched on a finishing write.
    assert_eq!(patch.current_turn, None);
    assert_eq!(patch.player2_id, None);
}

#[test]
fn apply_to_mirrors_the_patch_locally() {
    let row = in_progress_match("m1");
    let plan = plan_move(&row, "u1", pos(0)).expect("move");
    let updated = plan.apply_to(&row);

    assert_eq!(updated.board_state, board("X........"));
    assert_eq!(updated.current_turn, Some(Turn::Player2));
    assert_eq!(updated.status, MatchStatus::InProgress);
    // Untouched fields survive.
    assert_eq!(updated.id, row.id);
    assert_eq!(updated.player2_id, row.player2_id);
}
