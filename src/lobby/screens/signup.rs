//! Account creation screen: email, password, and optional display name.

use crossterm::event::{KeyCode, KeyEvent};
use derive_getters::Getters;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, instrument};

use crate::lobby::screen::{Screen, ScreenTransition};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignUpField {
    Email,
    Password,
    Name,
}

impl SignUpField {
    fn next(self) -> Self {
        match self {
            Self::Email => Self::Password,
            Self::Password => Self::Name,
            Self::Name => Self::Email,
        }
    }
}

/// State for the account creation screen.
#[derive(Debug, Getters)]
pub struct SignUpScreen {
    email: String,
    password: String,
    name: String,
    #[getter(skip)]
    focus: SignUpField,
    error_message: Option<String>,
}

impl SignUpScreen {
    /// Creates an empty sign-up screen.
    #[instrument]
    pub fn new() -> Self {
        debug!("Initializing SignUpScreen");
        Self {
            email: String::new(),
            password: String::new(),
            name: String::new(),
            focus: SignUpField::Email,
            error_message: None,
        }
    }

    /// Shows an error from a failed sign-up attempt.
    #[instrument(skip(self, message))]
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    fn active_input(&mut self) -> &mut String {
        match self.focus {
            SignUpField::Email => &mut self.email,
            SignUpField::Password => &mut self.password,
            SignUpField::Name => &mut self.name,
        }
    }

    fn field_style(&self, field: SignUpField) -> Style {
        if self.focus == field {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        Ok(())
    }
}

impl Default for SignUpScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for SignUpScreen {
    #[instrument(skip(self, frame))]
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new("Tic-Tac Arena — Create Account")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let email = Paragraph::new(self.email.as_str())
            .style(self.field_style(SignUpField::Email))
            .block(Block::default().borders(Borders::ALL).title("Email"));
        frame.render_widget(email, chunks[1]);

        let masked = "*".repeat(self.password.chars().count());
        let password = Paragraph::new(masked)
            .style(self.field_style(SignUpField::Password))
            .block(Block::default().borders(Borders::ALL).title("Password (6+ characters)"));
        frame.render_widget(password, chunks[2]);

        let name = Paragraph::new(self.name.as_str())
            .style(self.field_style(SignUpField::Name))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Display Name (optional)"),
            );
        frame.render_widget(name, chunks[3]);

        let error_text = self.error_message.as_deref().unwrap_or("");
        let error = Paragraph::new(error_text)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[4]);

        let help = Paragraph::new("Tab: Switch field | Enter: Create account | Esc: Back to sign in")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[6]);
    }

    #[instrument(skip(self, key))]
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition {
        match key.code {
            KeyCode::Char(c) => {
                self.active_input().push(c);
                ScreenTransition::Stay
            }
            KeyCode::Backspace => {
                self.active_input().pop();
                ScreenTransition::Stay
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                ScreenTransition::Stay
            }
            KeyCode::Enter => match self.validate() {
                Ok(()) => {
                    self.error_message = None;
                    ScreenTransition::SubmitSignUp {
                        email: self.email.trim().to_string(),
                        password: self.password.clone(),
                        name: self.name.trim().to_string(),
                    }
                }
                Err(message) => {
                    self.error_message = Some(message);
                    ScreenTransition::Stay
                }
            },
            KeyCode::Esc => ScreenTransition::GoToLogin,
            _ => ScreenTransition::Stay,
        }
    }
}
