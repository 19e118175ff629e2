//! Match-state synchronization: the move contract, optimistic sessions,
//! the one-shot statistics guard, and the push-with-polling-fallback
//! watcher.

mod plan;
mod session;
mod stats;
mod watcher;

pub use plan::{MoveError, MovePlan, plan_move};
pub use session::{MatchSession, PlayError};
pub use stats::StatsRecorder;
pub use watcher::{MatchWatcher, POLL_PERIOD, PUSH_QUIET_WINDOW, WatcherHandle};
