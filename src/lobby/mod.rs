//! Multi-screen terminal lobby: authentication, matchmaking, and the
//! live game view.

mod controller;
mod screen;
pub mod screens;

pub use controller::LobbyController;
pub use screen::{Screen, ScreenTransition};
