//! Live game screen: board, cursor, turn indicator, and forfeit.

use crossterm::event::{KeyCode, KeyEvent};
use derive_getters::Getters;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, instrument, warn};

use crate::backend::MatchRow;
use crate::game::{MatchStatus, Position, Turn};
use crate::lobby::screen::{Screen, ScreenTransition};

/// State for the live game screen.
///
/// Renders from a local copy of the match row; the controller pushes
/// fresh rows in via [`set_row`](Self::set_row) as the session
/// reconciles push and poll updates.
#[derive(Debug, Getters)]
pub struct InGameScreen {
    row: MatchRow,
    seat: Turn,
    #[getter(skip)]
    cursor: u8,
    confirm_forfeit: bool,
    notice: Option<String>,
}

impl InGameScreen {
    /// Creates a game screen for the given row and viewer seat.
    #[instrument(skip(row), fields(match_id = %row.id, seat = %seat))]
    pub fn new(row: MatchRow, seat: Turn) -> Self {
        debug!("Initializing InGameScreen");
        Self {
            row,
            seat,
            cursor: 4,
            confirm_forfeit: false,
            notice: None,
        }
    }

    /// Replaces the rendered row with a fresh authoritative copy.
    pub fn set_row(&mut self, row: MatchRow) {
        self.row = row;
    }

    /// Shows a rejected-move or backend message under the board.
    #[instrument(skip(self, message))]
    pub fn set_notice(&mut self, message: String) {
        self.notice = Some(message);
    }

    fn my_turn(&self) -> bool {
        self.row.status == MatchStatus::InProgress && self.row.current_turn == Some(self.seat)
    }

    fn move_cursor(&mut self, delta_row: i8, delta_col: i8) {
        let row = (self.cursor / 3) as i8 + delta_row;
        let col = (self.cursor % 3) as i8 + delta_col;
        let row = row.rem_euclid(3) as u8;
        let col = col.rem_euclid(3) as u8;
        self.cursor = row * 3 + col;
    }

    /// Draws the 3x3 grid with the cursor cell bracketed.
    fn board_text(&self) -> String {
        let cell = |idx: u8| -> String {
            let pos = match Position::new(idx) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "Cursor index out of range");
                    return "   ".to_string();
                }
            };
            let mark = self
                .row
                .board_state
                .get(pos)
                .map(|m| m.to_string())
                .unwrap_or_else(|| " ".to_string());
            if idx == self.cursor && self.my_turn() {
                format!("[{mark}]")
            } else {
                format!(" {mark} ")
            }
        };

        let mut lines = Vec::with_capacity(5);
        for board_row in 0..3 {
            let base = board_row * 3;
            lines.push(format!(
                "{}│{}│{}",
                cell(base),
                cell(base + 1),
                cell(base + 2)
            ));
            if board_row < 2 {
                lines.push("───┼───┼───".to_string());
            }
        }
        lines.join("\n")
    }

    fn status_text(&self) -> (String, Color) {
        match self.row.status {
            MatchStatus::InProgress => {
                if self.my_turn() {
                    (format!("Your turn ({})", self.seat.mark()), Color::Green)
                } else {
                    (
                        format!("Opponent's turn ({})", self.seat.other().mark()),
                        Color::Yellow,
                    )
                }
            }
            MatchStatus::Finished => ("Match finished".to_string(), Color::Cyan),
            MatchStatus::Waiting => ("Waiting for opponent".to_string(), Color::DarkGray),
        }
    }
}

impl Screen for InGameScreen {
    #[instrument(skip(self, frame))]
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(7),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new(format!("Tic-Tac Arena — Match {}", self.row.id))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let (status, color) = self.status_text();
        let status_bar = Paragraph::new(status)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status_bar, chunks[1]);

        let board = Paragraph::new(self.board_text())
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Board"));
        frame.render_widget(board, chunks[2]);

        let notice_text = if self.confirm_forfeit {
            "Forfeit the match? The opponent wins. (y/n)"
        } else {
            self.notice.as_deref().unwrap_or("")
        };
        let notice_color = if self.confirm_forfeit {
            Color::Yellow
        } else {
            Color::Red
        };
        let notice = Paragraph::new(notice_text)
            .style(Style::default().fg(notice_color))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(notice, chunks[3]);

        let help = Paragraph::new("↑↓←→: Move cursor | Enter: Place mark | f: Forfeit | q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[4]);
    }

    #[instrument(skip(self, key))]
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition {
        if self.confirm_forfeit {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_forfeit = false;
                    ScreenTransition::Forfeit
                }
                _ => {
                    self.confirm_forfeit = false;
                    ScreenTransition::Stay
                }
            };
        }

        match key.code {
            KeyCode::Up => {
                self.move_cursor(-1, 0);
                ScreenTransition::Stay
            }
            KeyCode::Down => {
                self.move_cursor(1, 0);
                ScreenTransition::Stay
            }
            KeyCode::Left => {
                self.move_cursor(0, -1);
                ScreenTransition::Stay
            }
            KeyCode::Right => {
                self.move_cursor(0, 1);
                ScreenTransition::Stay
            }
            KeyCode::Enter | KeyCode::Char(' ') => match Position::new(self.cursor) {
                Ok(position) => {
                    self.notice = None;
                    ScreenTransition::PlaceMark { position }
                }
                Err(e) => {
                    warn!(error = %e, "Cursor produced an invalid position");
                    ScreenTransition::Stay
                }
            },
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if self.row.status == MatchStatus::InProgress {
                    self.confirm_forfeit = true;
                }
                ScreenTransition::Stay
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => ScreenTransition::Quit,
            _ => ScreenTransition::Stay,
        }
    }
}
