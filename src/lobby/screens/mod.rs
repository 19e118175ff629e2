//! Screen implementations for the lobby state machine.

mod in_game;
mod login;
mod main_lobby;
mod result;
mod signup;
mod waiting;

pub use in_game::InGameScreen;
pub use login::LoginScreen;
pub use main_lobby::MainLobbyScreen;
pub use result::{MatchOutcome, ResultScreen};
pub use signup::SignUpScreen;
pub use waiting::WaitingScreen;
