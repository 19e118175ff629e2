//! Wire models mirroring the hosted tables.
//!
//! Field names and shapes match the remote schema exactly; these structs
//! cross the REST and realtime boundaries unmodified.

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::game::{Board, MatchStatus, Turn};

/// A row in `user_profiles`. Created lazily on first lobby visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    /// Account id from the auth provider.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name; defaults to the email local part when absent.
    pub name: Option<String>,
    /// Lifetime win counter.
    pub wins: i32,
    /// Lifetime draw counter.
    pub draws: i32,
    /// Lifetime loss counter.
    pub losses: i32,
}

impl ProfileRow {
    /// Name to show in the UI, falling back to the email local part.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// Insertable profile for the lazy-create path.
#[derive(Debug, Clone, Serialize, new)]
pub struct NewProfile {
    /// Account id from the auth provider.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

/// A row in `matches`, the single source of truth for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    /// Match id.
    pub id: String,
    /// Creator's account id; always plays X.
    pub player1_id: String,
    /// Joiner's account id; always plays O. Null while waiting.
    pub player2_id: Option<String>,
    /// Whose turn it is; null until the match starts.
    pub current_turn: Option<Turn>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// The 9-cell board.
    pub board_state: Board,
    /// Winner's account id; null for draws and unfinished matches.
    pub winner_id: Option<String>,
    /// Whether the match is joinable only by code.
    pub is_private: bool,
    /// 6-character join code for private matches.
    pub code: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last row update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MatchRow {
    /// Returns the seat the given user occupies, if any.
    pub fn seat_of(&self, user_id: &str) -> Option<Turn> {
        if self.player1_id == user_id {
            Some(Turn::Player1)
        } else if self.player2_id.as_deref() == Some(user_id) {
            Some(Turn::Player2)
        } else {
            None
        }
    }

    /// Returns the opponent's account id from the given user's view.
    pub fn opponent_of(&self, user_id: &str) -> Option<&str> {
        match self.seat_of(user_id)? {
            Turn::Player1 => self.player2_id.as_deref(),
            Turn::Player2 => Some(self.player1_id.as_str()),
        }
    }

    /// A finished match with no winner is a draw.
    pub fn is_draw(&self) -> bool {
        self.status == MatchStatus::Finished && self.winner_id.is_none()
    }
}

/// Insertable match for the create paths.
#[derive(Debug, Clone, Serialize, new)]
pub struct NewMatch {
    /// Creator's account id.
    pub player1_id: String,
    /// Always `waiting` at creation.
    pub status: MatchStatus,
    /// Join-by-code only.
    pub is_private: bool,
    /// Join code; set only for private matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Partial update to a match row. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchPatch {
    /// Joiner's account id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2_id: Option<String>,
    /// New turn holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<Turn>,
    /// New lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
    /// New board contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_state: Option<Board>,
    /// Winner's account id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
}

/// Insertable row for the append-only `moves` audit log.
///
/// Never read back for gameplay; the match row is the source of truth.
#[derive(Debug, Clone, Serialize, new)]
pub struct NewMove {
    /// Match the move belongs to.
    pub match_id: String,
    /// Acting player's account id.
    pub player_id: String,
    /// Board index 0-8.
    pub position: u8,
    /// 1-based ordinal within the match.
    pub move_number: i32,
}

/// Absolute counter values written to a profile when a match concludes.
///
/// The hosted schema stores plain integers, so updates are
/// read-modify-write of absolute values rather than increments.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CounterPatch {
    /// New win count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wins: Option<i32>,
    /// New draw count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draws: Option<i32>,
    /// New loss count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub losses: Option<i32>,
}
