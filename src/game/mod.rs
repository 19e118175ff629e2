//! Pure tic-tac-toe game logic: board, marks, and the win/draw rules.

mod rules;
mod types;

pub use types::{Board, Mark, MatchStatus, Position, PositionError, Turn};
