//! Win and draw detection over the 9-cell board.

use super::types::{Board, Mark};

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

impl Board {
    /// Returns the winning mark, if some line of three is uniform and
    /// non-empty.
    pub fn winner(&self) -> Option<Mark> {
        let cells = self.cells();
        for [a, b, c] in LINES {
            if let Some(mark) = cells[a]
                && cells[b] == Some(mark)
                && cells[c] == Some(mark)
            {
                return Some(mark);
            }
        }
        None
    }

    /// Checks if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells().iter().all(|c| c.is_some())
    }

    /// A full board with no winning line is a draw.
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{Board, Mark, Position};

    fn board_from(marks: &[(u8, Mark)]) -> Board {
        let mut board = Board::new();
        for (idx, mark) in marks {
            board = board.with_mark(Position::new(*idx).unwrap(), *mark);
        }
        board
    }

    #[test]
    fn top_row_wins() {
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::O),
        ]);
        assert_eq!(board.winner(), Some(Mark::X));
        assert!(!board.is_draw());
    }

    #[test]
    fn column_and_diagonal_wins() {
        let col = board_from(&[(1, Mark::O), (4, Mark::O), (7, Mark::O)]);
        assert_eq!(col.winner(), Some(Mark::O));

        let diag = board_from(&[(2, Mark::X), (4, Mark::X), (6, Mark::X)]);
        assert_eq!(diag.winner(), Some(Mark::X));
    }

    #[test]
    fn no_winner_on_mixed_line() {
        let board = board_from(&[(0, Mark::X), (1, Mark::O), (2, Mark::X)]);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn full_board_without_line_is_draw() {
        // X O X / X O O / O X X
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::X),
            (4, Mark::O),
            (5, Mark::O),
            (6, Mark::O),
            (7, Mark::X),
            (8, Mark::X),
        ]);
        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        assert!(board.is_draw());
    }

    #[test]
    fn partial_board_is_not_draw() {
        let board = board_from(&[(0, Mark::X)]);
        assert!(!board.is_draw());
    }
}
