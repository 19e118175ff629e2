//! Tic-Tac Arena library - online two-player tic-tac-toe client
//!
//! This library implements a terminal client for tic-tac-toe matches
//! hosted on a managed backend (auth, row storage, and realtime change
//! notifications are all remote services).
//!
//! # Architecture
//!
//! - **Game**: pure board rules, marks, positions, win and draw detection
//! - **Backend**: HTTP and websocket clients for the hosted services
//! - **Sync**: the match session: optimistic moves, push/poll
//!   reconciliation, and exactly-once stats updates
//! - **Lobby**: the multi-screen TUI driving it all
//!
//! # Example
//!
//! ```no_run
//! use tictac_arena::{BackendConfig, LobbyController};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BackendConfig::from_file("arena.toml")?;
//! let mut controller = LobbyController::new(config);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod backend;
mod config;
mod game;
mod lobby;
mod matchmaking;
mod sync;

// Crate-level exports - Configuration
pub use config::{BackendConfig, ConfigError};

// Crate-level exports - Backend clients and wire models
pub use backend::{
    AuthClient, AuthSession, BackendError, ChangeFeed, CounterPatch, MatchPatch, MatchRow,
    MatchStore, MatchSubscription, NewMatch, NewMove, NewProfile, ProfileRow, RealtimeFeed,
    RestStore,
};

// Crate-level exports - Game rules
pub use game::{Board, Mark, MatchStatus, Position, PositionError, Turn};

// Crate-level exports - Sync core
pub use sync::{
    MatchSession, MatchWatcher, MoveError, MovePlan, PlayError, StatsRecorder, WatcherHandle,
    plan_move, POLL_PERIOD, PUSH_QUIET_WINDOW,
};

// Crate-level exports - Matchmaking
pub use matchmaking::{JoinError, Matchmaker, QuickMatch};

// Crate-level exports - Lobby TUI
pub use lobby::{LobbyController, Screen, ScreenTransition};
