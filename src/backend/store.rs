//! Async seams over the hosted table store and row-change feed.
//!
//! The sync core and matchmaking layers are written against these traits
//! so they can be exercised with in-memory fakes; the production
//! implementations live in [`rest`](super::rest) and
//! [`realtime`](super::realtime).

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::backend::{
    BackendError, CounterPatch, MatchPatch, MatchRow, NewMatch, NewMove, NewProfile, ProfileRow,
};

/// Row CRUD against the hosted tables, filtered the way the client needs.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fetches one match row by id.
    async fn fetch_match(&self, id: &str) -> Result<MatchRow, BackendError>;

    /// Inserts a new match and returns the stored row.
    async fn insert_match(&self, new: NewMatch) -> Result<MatchRow, BackendError>;

    /// Applies a partial update and returns the updated row.
    async fn update_match(&self, id: &str, patch: MatchPatch) -> Result<MatchRow, BackendError>;

    /// Deletes a match row.
    async fn delete_match(&self, id: &str) -> Result<(), BackendError>;

    /// Finds a waiting public match with an open second seat, excluding
    /// matches created by the given player.
    async fn find_waiting_public(
        &self,
        exclude_player: &str,
    ) -> Result<Option<MatchRow>, BackendError>;

    /// Finds a waiting match by join code with an open second seat.
    async fn find_waiting_by_code(&self, code: &str) -> Result<Option<MatchRow>, BackendError>;

    /// Checks whether any match row already carries the given join code.
    async fn code_exists(&self, code: &str) -> Result<bool, BackendError>;

    /// Appends a row to the move audit log.
    async fn insert_move(&self, mv: NewMove) -> Result<(), BackendError>;

    /// Fetches a profile row, `None` if the user has no profile yet.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError>;

    /// Inserts a new profile row and returns it.
    async fn insert_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError>;

    /// Writes new counter values to a profile.
    async fn update_counters(
        &self,
        user_id: &str,
        counters: CounterPatch,
    ) -> Result<(), BackendError>;
}

impl std::fmt::Debug for dyn MatchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MatchStore")
    }
}

/// Push notifications of UPDATE events for a single match row.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription scoped to the given match id.
    async fn subscribe(&self, match_id: &str) -> Result<MatchSubscription, BackendError>;
}

impl std::fmt::Debug for dyn ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangeFeed")
    }
}

/// An open row-change subscription.
///
/// Dropping the subscription (or calling [`shutdown`](Self::shutdown))
/// signals the producer to tear down its channel.
#[derive(Debug)]
pub struct MatchSubscription {
    rx: mpsc::Receiver<MatchRow>,
    cancel: Option<oneshot::Sender<()>>,
}

impl MatchSubscription {
    /// Pairs a subscription with the sender half handed to the producer.
    pub fn channel(capacity: usize) -> (mpsc::Sender<MatchRow>, oneshot::Receiver<()>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        (
            tx,
            cancel_rx,
            Self {
                rx,
                cancel: Some(cancel_tx),
            },
        )
    }

    /// Receives the next authoritative row snapshot.
    ///
    /// Returns `None` once the producer side has closed (e.g. the
    /// websocket dropped); the caller is expected to fall back to polling.
    pub async fn recv(&mut self) -> Option<MatchRow> {
        self.rx.recv().await
    }

    /// Tears the subscription down explicitly.
    pub fn shutdown(mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("Shutting down match subscription");
            let _ = cancel.send(());
        }
    }
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
