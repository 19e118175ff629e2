//! Exactly-once statistics updates for finished matches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendError, CounterPatch, MatchRow, MatchStore, ProfileRow};
use crate::game::MatchStatus;

/// One-shot guard that applies the statistics contract at most once per
/// match session.
///
/// A finished match can be observed several times by the same client:
/// the optimistic local finish, the push confirmation, and a fallback
/// poll may all fire for the same transition. The guard arms itself
/// before the counter writes start; a failed update re-arms it so the
/// next observed event can retry.
#[derive(Debug)]
pub struct StatsRecorder {
    store: Arc<dyn MatchStore>,
    applied: AtomicBool,
}

impl StatsRecorder {
    /// Creates a recorder for one match session.
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self {
            store,
            applied: AtomicBool::new(false),
        }
    }

    /// Whether the update has been applied in this session.
    pub fn is_applied(&self) -> bool {
        self.applied.load(Ordering::SeqCst)
    }

    /// Applies the statistics contract once for a finished match.
    ///
    /// Both participants' counters are updated together in one routine:
    /// draw → both +1 draw; win for the viewer → viewer +1 win and
    /// opponent +1 loss; win for the opponent mirrors that. Returns
    /// `Ok(true)` if the update ran, `Ok(false)` if it was skipped
    /// (not finished, or already applied).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if any fetch or write fails; the guard
    /// is re-armed in that case.
    #[instrument(skip(self, row), fields(match_id = %row.id, viewer_id = %viewer_id))]
    pub async fn record_once(
        &self,
        row: &MatchRow,
        viewer_id: &str,
    ) -> Result<bool, BackendError> {
        if row.status != MatchStatus::Finished {
            return Ok(false);
        }
        if self.applied.swap(true, Ordering::SeqCst) {
            debug!("Stats already applied this session, skipping");
            return Ok(false);
        }

        match self.apply(row, viewer_id).await {
            Ok(()) => {
                info!("Stats applied for both participants");
                Ok(true)
            }
            Err(e) => {
                // Re-arm so the next observed event can retry.
                warn!(error = %e, "Stats update failed, re-arming guard");
                self.applied.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Fetches both profiles, computes the new counters, and writes both.
    async fn apply(&self, row: &MatchRow, viewer_id: &str) -> Result<(), BackendError> {
        let opponent_id = row
            .opponent_of(viewer_id)
            .ok_or_else(|| BackendError::new("viewer or opponent missing from match"))?
            .to_string();

        let mine = self.require_profile(viewer_id).await?;
        let theirs = self.require_profile(&opponent_id).await?;

        let (my_patch, their_patch) = if row.is_draw() {
            (
                CounterPatch {
                    draws: Some(mine.draws + 1),
                    ..CounterPatch::default()
                },
                CounterPatch {
                    draws: Some(theirs.draws + 1),
                    ..CounterPatch::default()
                },
            )
        } else if row.winner_id.as_deref() == Some(viewer_id) {
            (
                CounterPatch {
                    wins: Some(mine.wins + 1),
                    ..CounterPatch::default()
                },
                CounterPatch {
                    losses: Some(theirs.losses + 1),
                    ..CounterPatch::default()
                },
            )
        } else if row.winner_id.as_deref() == Some(opponent_id.as_str()) {
            (
                CounterPatch {
                    losses: Some(mine.losses + 1),
                    ..CounterPatch::default()
                },
                CounterPatch {
                    wins: Some(theirs.wins + 1),
                    ..CounterPatch::default()
                },
            )
        } else {
            return Err(BackendError::new(format!(
                "finished match {} has a winner outside its participants",
                row.id
            )));
        };

        self.store.update_counters(viewer_id, my_patch).await?;
        self.store.update_counters(&opponent_id, their_patch).await?;
        Ok(())
    }

    async fn require_profile(&self, user_id: &str) -> Result<ProfileRow, BackendError> {
        self.store
            .fetch_profile(user_id)
            .await?
            .ok_or_else(|| BackendError::new(format!("profile not found for user {user_id}")))
    }
}
