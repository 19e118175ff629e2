//! The move contract: pure validation and state computation for one play.

use derive_more::{Display, Error};
use tracing::{debug, instrument};

use crate::backend::{MatchPatch, MatchRow};
use crate::game::{Board, MatchStatus, Position, Turn};

/// Reasons a move is rejected before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The acting user is not one of the two participants.
    #[display("You are not a participant in this match")]
    NotAParticipant,
    /// It is the other participant's turn.
    #[display("It is not your turn")]
    NotYourTurn,
    /// The target slot already holds a mark.
    #[display("That square is already taken")]
    SlotOccupied,
    /// The match is waiting or already finished.
    #[display("The match is not in progress")]
    NotInProgress,
}

/// Everything a single accepted move changes, computed up front so the
/// optimistic local apply and the remote write use the same values.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    /// Board after the mark is written.
    pub board: Board,
    /// Status after the move: still in progress, or finished.
    pub status: MatchStatus,
    /// Winner's account id when the move concludes the game with a win.
    pub winner_id: Option<String>,
    /// Next turn holder; `None` when the game concluded (the stored turn
    /// is left untouched on the finishing write).
    pub next_turn: Option<Turn>,
    /// 1-based ordinal of this move within the match.
    pub move_number: i32,
    /// Where the mark was placed.
    pub position: Position,
}

impl MovePlan {
    /// The partial update to persist for this move.
    pub fn patch(&self) -> MatchPatch {
        MatchPatch {
            board_state: Some(self.board.clone()),
            current_turn: self.next_turn,
            status: Some(self.status),
            winner_id: self.winner_id.clone(),
            ..MatchPatch::default()
        }
    }

    /// Applies the plan to a local row copy for the optimistic update.
    pub fn apply_to(&self, row: &MatchRow) -> MatchRow {
        let mut updated = row.clone();
        updated.board_state = self.board.clone();
        updated.status = self.status;
        if let Some(turn) = self.next_turn {
            updated.current_turn = Some(turn);
        }
        if self.winner_id.is_some() {
            updated.winner_id = self.winner_id.clone();
        }
        updated
    }
}

/// Validates a move against the current row and computes the outcome.
///
/// Acceptance requires that the user is a participant, the match is in
/// progress, it is that participant's turn, and the target slot is
/// empty. On acceptance the returned plan carries the new board, the
/// win/draw verdict, and either the flipped turn or the finished status.
///
/// # Errors
///
/// Returns [`MoveError`] naming the violated condition.
#[instrument(skip(row), fields(match_id = %row.id, position = position.index()))]
pub fn plan_move(
    row: &MatchRow,
    user_id: &str,
    position: Position,
) -> Result<MovePlan, MoveError> {
    if row.status != MatchStatus::InProgress {
        return Err(MoveError::NotInProgress);
    }
    let seat = row.seat_of(user_id).ok_or(MoveError::NotAParticipant)?;
    if row.current_turn != Some(seat) {
        debug!(seat = %seat, current_turn = ?row.current_turn, "Move out of turn");
        return Err(MoveError::NotYourTurn);
    }
    if !row.board_state.is_empty(position) {
        return Err(MoveError::SlotOccupied);
    }

    let board = row.board_state.with_mark(position, seat.mark());
    let move_number = row.board_state.occupied() as i32 + 1;

    let plan = if board.winner().is_some() {
        // The mover just placed the completing mark, so the winner is
        // always the acting user.
        MovePlan {
            board,
            status: MatchStatus::Finished,
            winner_id: Some(user_id.to_string()),
            next_turn: None,
            move_number,
            position,
        }
    } else if board.is_full() {
        MovePlan {
            board,
            status: MatchStatus::Finished,
            winner_id: None,
            next_turn: None,
            move_number,
            position,
        }
    } else {
        MovePlan {
            board,
            status: MatchStatus::InProgress,
            winner_id: None,
            next_turn: Some(seat.other()),
            move_number,
            position,
        }
    };

    debug!(
        status = %plan.status,
        winner = ?plan.winner_id,
        move_number = plan.move_number,
        "Move planned"
    );
    Ok(plan)
}
