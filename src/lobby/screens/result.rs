//! Result screen: win, loss, or draw banner with the final board.

use crossterm::event::{KeyCode, KeyEvent};
use derive_getters::Getters;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, instrument};

use crate::backend::MatchRow;
use crate::lobby::screen::{Screen, ScreenTransition};

/// Outcome of a finished match from the viewer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The viewer won.
    Won,
    /// The opponent won (including forfeits).
    Lost,
    /// The board filled with no winner.
    Draw,
}

impl MatchOutcome {
    /// Reads the outcome for the given viewer off a finished row.
    pub fn of(row: &MatchRow, viewer_id: &str) -> Self {
        match row.winner_id.as_deref() {
            None => Self::Draw,
            Some(winner) if winner == viewer_id => Self::Won,
            Some(_) => Self::Lost,
        }
    }

    fn banner(self) -> (&'static str, Color) {
        match self {
            Self::Won => ("You won!", Color::Green),
            Self::Lost => ("You lost.", Color::Red),
            Self::Draw => ("It's a draw.", Color::Yellow),
        }
    }
}

/// State for the result screen.
#[derive(Debug, Getters)]
pub struct ResultScreen {
    row: MatchRow,
    outcome: MatchOutcome,
}

impl ResultScreen {
    /// Creates a result screen from the finished row.
    #[instrument(skip(row), fields(match_id = %row.id))]
    pub fn new(row: MatchRow, viewer_id: &str) -> Self {
        let outcome = MatchOutcome::of(&row, viewer_id);
        debug!(outcome = ?outcome, "Initializing ResultScreen");
        Self { row, outcome }
    }

    fn board_text(&self) -> String {
        let cells = self.row.board_state.cells();
        let cell = |idx: usize| -> String {
            match cells[idx] {
                Some(mark) => format!(" {mark} "),
                None => "   ".to_string(),
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
}

impl Screen for ResultScreen {
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
            ])
            .split(area);

        let title = Paragraph::new("Match Over")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let (banner, color) = self.outcome.banner();
        let outcome = Paragraph::new(banner)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(outcome, chunks[1]);

        let board = Paragraph::new(self.board_text())
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Final Board"));
        frame.render_widget(board, chunks[2]);

        let help = Paragraph::new("Enter: Back to lobby | q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);
    }

    #[instrument(skip(self, key))]
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => ScreenTransition::GoToLobby,
            KeyCode::Char('q') | KeyCode::Char('Q') => ScreenTransition::Quit,
            _ => ScreenTransition::Stay,
        }
    }
}
