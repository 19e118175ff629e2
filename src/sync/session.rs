//! Per-match client session: optimistic moves, reconciliation, forfeit.

use std::sync::Arc;

use derive_more::{Display, Error, From};
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendError, MatchPatch, MatchRow, MatchStore, NewMove};
use crate::game::{MatchStatus, Position};
use crate::sync::plan::{MoveError, plan_move};
use crate::sync::stats::StatsRecorder;

/// Error from attempting a play against the live match.
#[derive(Debug, Display, Error, From)]
pub enum PlayError {
    /// The move violated the contract; nothing was written.
    #[display("{_0}")]
    Rejected(MoveError),
    /// A remote call failed; local state was reverted to authoritative.
    #[display("{_0}")]
    Backend(BackendError),
}

/// One client's view of one live match.
///
/// Keeps a local copy of the row, applies moves optimistically before
/// confirming against the store, and funnels every finish observation
/// (own move, push, or poll) through the same [`StatsRecorder`].
#[derive(Debug)]
pub struct MatchSession {
    store: Arc<dyn MatchStore>,
    viewer_id: String,
    current: MatchRow,
    stats: StatsRecorder,
}

impl MatchSession {
    /// Creates a session from the initially loaded row.
    #[instrument(skip(store, row), fields(match_id = %row.id, viewer_id = %viewer_id))]
    pub fn new(store: Arc<dyn MatchStore>, viewer_id: String, row: MatchRow) -> Self {
        info!("Opening match session");
        let stats = StatsRecorder::new(store.clone());
        Self {
            store,
            viewer_id,
            current: row,
            stats,
        }
    }

    /// The local copy of the match row.
    pub fn current(&self) -> &MatchRow {
        &self.current
    }

    /// The viewing user's account id.
    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    /// Whether stats have been applied in this session.
    pub fn stats_applied(&self) -> bool {
        self.stats.is_applied()
    }

    /// Reconciles an authoritative row delivered by push or poll.
    ///
    /// Triggers the one-shot statistics update when the row shows a
    /// finished match; a failed update is logged and left for the next
    /// event to retry.
    #[instrument(skip(self, row), fields(match_id = %row.id, status = %row.status))]
    pub async fn observe(&mut self, row: MatchRow) -> &MatchRow {
        if row.status == MatchStatus::Finished
            && let Err(e) = self.stats.record_once(&row, &self.viewer_id).await
        {
            warn!(error = %e, "Stats update from observed finish failed");
        }
        self.current = row;
        &self.current
    }

    /// Re-fetches authoritative state and reconciles it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the fetch fails; the local copy is
    /// kept unchanged in that case.
    #[instrument(skip(self), fields(match_id = %self.current.id))]
    pub async fn refresh(&mut self) -> Result<&MatchRow, BackendError> {
        let row = self.store.fetch_match(&self.current.id).await?;
        Ok(self.observe(row).await)
    }

    /// Plays a move at the given position.
    ///
    /// The plan is applied to the local copy first, then persisted; on a
    /// persistence failure the local copy is rolled back by re-fetching
    /// authoritative state. An accepted move also appends to the move
    /// audit log (a failure there is logged and the move stands) and,
    /// when it concludes the game, runs the statistics contract.
    ///
    /// # Errors
    ///
    /// Returns [`PlayError::Rejected`] when the contract refuses the
    /// move, [`PlayError::Backend`] when persistence fails.
    #[instrument(skip(self), fields(match_id = %self.current.id, position = position.index()))]
    pub async fn make_move(&mut self, position: Position) -> Result<&MatchRow, PlayError> {
        let plan = plan_move(&self.current, &self.viewer_id, position)?;
        let match_id = self.current.id.clone();

        // Optimistic: show the move locally before the store confirms it.
        self.current = plan.apply_to(&self.current);
        debug!(move_number = plan.move_number, "Move applied optimistically");

        match self.store.update_match(&match_id, plan.patch()).await {
            Ok(row) => {
                self.current = row;
            }
            Err(e) => {
                warn!(error = %e, "Move persist failed, reverting to authoritative state");
                if let Err(fetch_err) = self.refresh().await {
                    warn!(error = %fetch_err, "Rollback fetch also failed");
                }
                return Err(e.into());
            }
        }

        let record = NewMove::new(
            match_id,
            self.viewer_id.clone(),
            position.into(),
            plan.move_number,
        );
        if let Err(e) = self.store.insert_move(record).await {
            // Audit log only; the match row is the source of truth.
            warn!(error = %e, "Move audit insert failed");
        }

        if self.current.status == MatchStatus::Finished {
            info!(winner = ?self.current.winner_id, "Match concluded by this move");
            if let Err(e) = self.stats.record_once(&self.current, &self.viewer_id).await {
                warn!(error = %e, "Stats update after finishing move failed");
            }
        }

        Ok(&self.current)
    }

    /// Forfeits the match: the opponent wins, and the same statistics
    /// contract applies.
    ///
    /// # Errors
    ///
    /// Returns [`PlayError::Rejected`] if the viewer is not a seated
    /// participant with an opponent, [`PlayError::Backend`] if the
    /// finishing write fails.
    #[instrument(skip(self), fields(match_id = %self.current.id))]
    pub async fn forfeit(&mut self) -> Result<&MatchRow, PlayError> {
        let winner_id = self
            .current
            .opponent_of(&self.viewer_id)
            .ok_or(MoveError::NotAParticipant)?
            .to_string();

        info!(winner_id = %winner_id, "Forfeiting match");
        let patch = MatchPatch {
            status: Some(MatchStatus::Finished),
            winner_id: Some(winner_id),
            ..MatchPatch::default()
        };
        let row = self
            .store
            .update_match(&self.current.id, patch)
            .await
            .map_err(PlayError::Backend)?;

        if let Err(e) = self.stats.record_once(&row, &self.viewer_id).await {
            warn!(error = %e, "Stats update after forfeit failed");
        }
        self.current = row;
        Ok(&self.current)
    }
}
