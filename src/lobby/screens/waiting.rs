//! Waiting room screen, shown while a created match waits for an opponent.

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

/// State for the waiting room screen.
///
/// The transition into the game happens when the controller observes the
/// second seat fill; this screen only displays and offers cancellation.
#[derive(Debug, Getters)]
pub struct WaitingScreen {
    match_id: String,
    code: Option<String>,
    error_message: Option<String>,
}

impl WaitingScreen {
    /// Creates a waiting room for the given match row.
    #[instrument(skip(row), fields(match_id = %row.id))]
    pub fn new(row: &MatchRow) -> Self {
        debug!(code = ?row.code, "Initializing WaitingScreen");
        Self {
            match_id: row.id.clone(),
            code: row.code.clone(),
            error_message: None,
        }
    }

    /// Shows an error from a failed cancellation.
    #[instrument(skip(self, message))]
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }
}

impl Screen for WaitingScreen {
    #[instrument(skip(self, frame))]
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new("Waiting for Opponent")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let body = match &self.code {
            Some(code) => format!(
                "Your match is ready.\n\nShare this code with your opponent:\n\n    {code}\n\nThe game starts as soon as they join."
            ),
            None => "Your match is open to anyone.\n\nThe game starts as soon as someone joins."
                .to_string(),
        };
        let waiting = Paragraph::new(body)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(waiting, chunks[1]);

        let error_text = self.error_message.as_deref().unwrap_or("");
        let error = Paragraph::new(error_text)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[2]);

        let help = Paragraph::new("Esc: Cancel match | q: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);
    }

    #[instrument(skip(self, key))]
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition {
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C') => {
                ScreenTransition::CancelWaiting
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => ScreenTransition::Quit,
            _ => ScreenTransition::Stay,
        }
    }
}
