//! Sign-in screen: email and password entry.

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

/// Which input field currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Email,
    Password,
}

/// State for the sign-in screen.
#[derive(Debug, Getters)]
pub struct LoginScreen {
    email: String,
    password: String,
    #[getter(skip)]
    focus: LoginField,
    error_message: Option<String>,
}

impl LoginScreen {
    /// Creates an empty sign-in screen.
    #[instrument]
    pub fn new() -> Self {
        debug!("Initializing LoginScreen");
        Self {
            email: String::new(),
            password: String::new(),
            focus: LoginField::Email,
            error_message: None,
        }
    }

    /// Shows an error from a failed sign-in attempt.
    #[instrument(skip(self, message))]
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    fn active_input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn field_style(&self, field: LoginField) -> Style {
        if self.focus == field {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for LoginScreen {
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
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new("Tic-Tac Arena — Sign In")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let email = Paragraph::new(self.email.as_str())
            .style(self.field_style(LoginField::Email))
            .block(Block::default().borders(Borders::ALL).title("Email"));
        frame.render_widget(email, chunks[1]);

        let masked = "*".repeat(self.password.chars().count());
        let password = Paragraph::new(masked)
            .style(self.field_style(LoginField::Password))
            .block(Block::default().borders(Borders::ALL).title("Password"));
        frame.render_widget(password, chunks[2]);

        let error_text = self.error_message.as_deref().unwrap_or("");
        let error = Paragraph::new(error_text)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[3]);

        let help = Paragraph::new("Tab: Switch field | Enter: Sign in | F2: Create account | Esc: Quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[5]);
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
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                self.focus = match self.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
                ScreenTransition::Stay
            }
            KeyCode::Enter => {
                let email = self.email.trim().to_string();
                if email.is_empty() || self.password.is_empty() {
                    self.error_message = Some("Email and password are required".to_string());
                    return ScreenTransition::Stay;
                }
                self.error_message = None;
                ScreenTransition::SubmitLogin {
                    email,
                    password: self.password.clone(),
                }
            }
            KeyCode::F(2) => ScreenTransition::GoToSignUp,
            KeyCode::Esc => ScreenTransition::Quit,
            _ => ScreenTransition::Stay,
        }
    }
}
