//! Screen trait and transition type for the lobby state machine.

use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::game::Position;

/// The result of handling an input event on a screen.
///
/// Screens return this from [`Screen::handle_key`] to drive the
/// [`LobbyController`](crate::LobbyController) state machine. Variants
/// that require backend calls are executed by the controller; the screen
/// itself never talks to the network.
#[derive(Clone)]
pub enum ScreenTransition {
    /// Stay on the current screen; no state change.
    Stay,
    /// Navigate to the sign-in screen.
    GoToLogin,
    /// Navigate to the account creation screen.
    GoToSignUp,
    /// Attempt sign-in with the entered credentials.
    SubmitLogin {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// Attempt account creation with the entered credentials.
    SubmitSignUp {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
        /// Optional display name; empty falls back to the email local part.
        name: String,
    },
    /// Revoke the session and return to sign-in.
    LogOut,
    /// Create a new match with the current user as player 1.
    CreateMatch {
        /// Joinable only by code when true.
        private: bool,
    },
    /// Join any open public match, or create one if none is waiting.
    QuickMatch,
    /// Join a private match by its entered code.
    JoinByCode {
        /// The code as typed; validated by the matchmaker.
        code: String,
    },
    /// Delete the waiting match and return to the lobby.
    CancelWaiting,
    /// Play a move at the cursor position.
    PlaceMark {
        /// Target board position.
        position: Position,
    },
    /// Concede the match to the opponent.
    Forfeit,
    /// Return to the main lobby screen.
    GoToLobby,
    /// Exit the application cleanly.
    Quit,
}

// Hand-written so transitions can be logged without leaking passwords.
impl std::fmt::Debug for ScreenTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stay => f.write_str("Stay"),
            Self::GoToLogin => f.write_str("GoToLogin"),
            Self::GoToSignUp => f.write_str("GoToSignUp"),
            Self::SubmitLogin { email, .. } => f
                .debug_struct("SubmitLogin")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::SubmitSignUp { email, name, .. } => f
                .debug_struct("SubmitSignUp")
                .field("email", email)
                .field("name", name)
                .finish_non_exhaustive(),
            Self::LogOut => f.write_str("LogOut"),
            Self::CreateMatch { private } => f
                .debug_struct("CreateMatch")
                .field("private", private)
                .finish(),
            Self::QuickMatch => f.write_str("QuickMatch"),
            Self::JoinByCode { code } => {
                f.debug_struct("JoinByCode").field("code", code).finish()
            }
            Self::CancelWaiting => f.write_str("CancelWaiting"),
            Self::PlaceMark { position } => f
                .debug_struct("PlaceMark")
                .field("position", position)
                .finish(),
            Self::Forfeit => f.write_str("Forfeit"),
            Self::GoToLobby => f.write_str("GoToLobby"),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// Trait implemented by each screen in the lobby state machine.
///
/// Each screen owns its own state, renders its UI, and handles key events.
/// The controller calls these methods in the event loop.
pub trait Screen {
    /// Renders the screen into the provided [`Frame`].
    fn render(&self, frame: &mut Frame);

    /// Handles a key event and returns the resulting [`ScreenTransition`].
    fn handle_key(&mut self, key: KeyEvent) -> ScreenTransition;
}
