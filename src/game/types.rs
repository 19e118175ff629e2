//! Core domain types shared between the game rules and the wire models.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A player's mark on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Mark {
    /// The X mark, placed by player 1.
    X,
    /// The O mark, placed by player 2.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Which seat's turn it is, as stored in the match row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Turn {
    /// Player 1 (always plays X).
    Player1,
    /// Player 2 (always plays O).
    Player2,
}

impl Turn {
    /// Returns the mark this seat plays.
    pub fn mark(self) -> Mark {
        match self {
            Turn::Player1 => Mark::X,
            Turn::Player2 => Mark::O,
        }
    }

    /// Returns the other seat.
    pub fn other(self) -> Self {
        match self {
            Turn::Player1 => Turn::Player2,
            Turn::Player2 => Turn::Player1,
        }
    }
}

/// Lifecycle of a match row: waiting → in_progress → finished.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    /// Created, waiting for a second player.
    Waiting,
    /// Both seats filled, moves being played.
    InProgress,
    /// Concluded; winner_id and board are immutable from here on.
    Finished,
}

/// A board index in 0..9, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

/// Error returned for an out-of-range board index.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Position {index} out of range (expected 0-8)")]
pub struct PositionError {
    /// The rejected index.
    pub index: u8,
}

impl Position {
    /// Creates a position from a 0-8 board index.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if the index is 9 or greater.
    pub fn new(index: u8) -> Result<Self, PositionError> {
        if index < 9 {
            Ok(Self(index))
        } else {
            Err(PositionError { index })
        }
    }

    /// Returns the 0-8 board index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the (row, column) pair for this position.
    pub fn coords(self) -> (usize, usize) {
        (self.0 as usize / 3, self.0 as usize % 3)
    }
}

impl TryFrom<u8> for Position {
    type Error = PositionError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<Position> for u8 {
    fn from(pos: Position) -> u8 {
        pos.0
    }
}

/// 3x3 board in row-major order, exactly 9 cells.
///
/// The wire format is a JSON array of 9 entries where a cell is `"X"`,
/// `"O"`, or empty. The hosted schema stores empties as either `null`
/// or `""` depending on which client wrote the row, so deserialization
/// accepts both; serialization always writes `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Option<Mark>; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self { cells: [None; 9] }
    }

    /// Returns the cell at the given position.
    pub fn get(&self, pos: Position) -> Option<Mark> {
        self.cells[pos.index()]
    }

    /// Checks whether the cell at the given position is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.cells[pos.index()].is_none()
    }

    /// Returns a copy with the mark written at the given position.
    ///
    /// The caller is responsible for having checked emptiness; this is
    /// enforced one level up by the move contract.
    pub fn with_mark(&self, pos: Position, mark: Mark) -> Self {
        let mut cells = self.cells;
        cells[pos.index()] = Some(mark);
        Self { cells }
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Option<Mark>; 9] {
        &self.cells
    }

    /// Counts occupied cells; used for move numbering.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

impl From<[Option<Mark>; 9]> for Board {
    fn from(cells: [Option<Mark>; 9]) -> Self {
        Self { cells }
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire: Vec<Option<&str>> = self
            .cells
            .iter()
            .map(|c| match c {
                Some(Mark::X) => Some("X"),
                Some(Mark::O) => Some("O"),
                None => None,
            })
            .collect();
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire: Vec<Option<String>> = Vec::deserialize(deserializer)?;
        if wire.len() != 9 {
            return Err(D::Error::custom(format!(
                "board_state must have 9 cells, got {}",
                wire.len()
            )));
        }
        let mut cells = [None; 9];
        for (i, raw) in wire.iter().enumerate() {
            cells[i] = match raw.as_deref() {
                None | Some("") => None,
                Some("X") => Some(Mark::X),
                Some("O") => Some(Mark::O),
                Some(other) => {
                    return Err(D::Error::custom(format!("invalid cell value: '{other}'")));
                }
            };
        }
        Ok(Self { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_rejects_out_of_range() {
        assert!(Position::new(8).is_ok());
        assert!(Position::new(9).is_err());
    }

    #[test]
    fn board_deserializes_empty_string_cells() {
        let board: Board = serde_json::from_str(r#"["X","","O",null,"","",null,null,""]"#)
            .expect("deserialize failed");
        assert_eq!(board.get(Position::new(0).unwrap()), Some(Mark::X));
        assert_eq!(board.get(Position::new(1).unwrap()), None);
        assert_eq!(board.get(Position::new(2).unwrap()), Some(Mark::O));
        assert_eq!(board.occupied(), 2);
    }

    #[test]
    fn board_rejects_wrong_length() {
        let result: Result<Board, _> = serde_json::from_str(r#"[null,null,null]"#);
        assert!(result.is_err());
    }

    #[test]
    fn board_serializes_empties_as_null() {
        let board = Board::new().with_mark(Position::new(4).unwrap(), Mark::X);
        let json = serde_json::to_string(&board).expect("serialize failed");
        assert_eq!(json, r#"[null,null,null,null,"X",null,null,null,null]"#);
    }
}
