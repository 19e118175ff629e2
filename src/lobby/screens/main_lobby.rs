//! Main lobby screen: match creation, quick match, and join-by-code.

use crossterm::event::{KeyCode, KeyEvent};
use derive_getters::Getters;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::{debug, info, instrument};

use crate::backend::ProfileRow;
use crate::lobby::screen::{Screen, ScreenTransition};

/// Menu options available in the main lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LobbyOption {
    QuickMatch,
    CreatePublic,
    CreatePrivate,
    JoinByCode,
    LogOut,
    Quit,
}

impl LobbyOption {
    fn label(self) -> &'static str {
        match self {
            Self::QuickMatch => "Quick Match",
            Self::CreatePublic => "Create Public Match",
            Self::CreatePrivate => "Create Private Match",
            Self::JoinByCode => "Join with Code",
            Self::LogOut => "Log Out",
            Self::Quit => "Quit",
        }
    }

    fn all() -> &'static [LobbyOption] {
        &[
            Self::QuickMatch,
            Self::CreatePublic,
            Self::CreatePrivate,
            Self::JoinByCode,
            Self::LogOut,
            Self::Quit,
        ]
    }
}

/// State for the main lobby screen.
#[derive(Debug, Getters)]
pub struct MainLobbyScreen {
    profile: ProfileRow,
    #[getter(skip)]
    list_state: ListState,
    code_input: String,
    input_mode: bool,
    error_message: Option<String>,
}

impl MainLobbyScreen {
    /// Creates a lobby screen for the given profile.
    #[instrument(skip(profile), fields(user_id = %profile.id))]
    pub fn new(profile: ProfileRow) -> Self {
        debug!("Initializing MainLobbyScreen");
        let mut state = ListState::default();
        state.select(Some(0));
        Self {
            profile,
            list_state: state,
            code_input: String::new(),
            input_mode: false,
            error_message: None,
        }
    }

    /// Shows an error from a failed lobby operation.
    #[instrument(skip(self, message))]
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Replaces the profile shown in the stats bar.
    pub fn set_profile(&mut self, profile: ProfileRow) {
        self.profile = profile;
    }

    fn select_previous(&mut self) {
        let count = LobbyOption::all().len();
        let i = match self.list_state.selected() {
            Some(i) if i > 0 => i - 1,
            _ => count - 1,
        };
        self.list_state.select(Some(i));
    }

    fn select_next(&mut self) {
        let count = LobbyOption::all().len();
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn selected_option(&self) -> LobbyOption {
        let options = LobbyOption::all();
        let idx = self.list_state.selected().unwrap_or(0);
        options[idx.min(options.len() - 1)]
    }
}

impl Screen for MainLobbyScreen {
    #[instrument(skip(self, frame))]
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new("Tic-Tac Arena — Lobby")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let stats_text = format!(
            "Player: {}   W:{} / L:{} / D:{}",
            self.profile.display_name(),
            self.profile.wins,
            self.profile.losses,
            self.profile.draws,
        );
        let profile_bar = Paragraph::new(stats_text)
            .style(Style::default().fg(Color::Green))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(profile_bar, chunks[1]);

        let items: Vec<ListItem> = LobbyOption::all()
            .iter()
            .map(|opt| ListItem::new(opt.label()))
            .collect();

        let menu = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = self.list_state.clone();
        frame.render_stateful_widget(menu, chunks[2], &mut list_state);

        let input_title = if self.input_mode {
            "Join Code (Enter to join, Esc to cancel)"
        } else {
            "Select 'Join with Code' to enter a code"
        };
        let input_style = if self.input_mode {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let input = Paragraph::new(self.code_input.as_str())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(input_title));
        frame.render_widget(input, chunks[3]);

        let error_text = self.error_message.as_deref().unwrap_or("");
        let error = Paragraph::new(error_text)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(error, chunks[4]);

        let help_text = if self.input_mode {
            "Type code | Enter: Join | Esc: Cancel"
        } else {
            "↑↓: Navigate | Enter: Select | q: Quit"
        };
        let help = Paragraph::new(help_text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[5]);
    }

    #[instrument(skip(self, key))]
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition {
        if self.input_mode {
            match key.code {
                KeyCode::Char(c) => {
                    self.code_input.push(c.to_ascii_uppercase());
                    ScreenTransition::Stay
                }
                KeyCode::Backspace => {
                    self.code_input.pop();
                    ScreenTransition::Stay
                }
                KeyCode::Enter => {
                    let code = self.code_input.trim().to_string();
                    self.input_mode = false;
                    self.code_input.clear();
                    self.error_message = None;
                    ScreenTransition::JoinByCode { code }
                }
                KeyCode::Esc => {
                    self.input_mode = false;
                    self.code_input.clear();
                    self.error_message = None;
                    ScreenTransition::Stay
                }
                _ => ScreenTransition::Stay,
            }
        } else {
            match key.code {
                KeyCode::Up => {
                    self.select_previous();
                    ScreenTransition::Stay
                }
                KeyCode::Down => {
                    self.select_next();
                    ScreenTransition::Stay
                }
                KeyCode::Enter => {
                    let option = self.selected_option();
                    info!(option = ?option, "Lobby option selected");
                    match option {
                        LobbyOption::QuickMatch => ScreenTransition::QuickMatch,
                        LobbyOption::CreatePublic => {
                            ScreenTransition::CreateMatch { private: false }
                        }
                        LobbyOption::CreatePrivate => {
                            ScreenTransition::CreateMatch { private: true }
                        }
                        LobbyOption::JoinByCode => {
                            self.input_mode = true;
                            self.error_message = None;
                            ScreenTransition::Stay
                        }
                        LobbyOption::LogOut => ScreenTransition::LogOut,
                        LobbyOption::Quit => ScreenTransition::Quit,
                    }
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => ScreenTransition::Quit,
                _ => ScreenTransition::Stay,
            }
        }
    }
}
