//! Lobby operations: lazy profiles, match creation, quick match, join
//! codes, and waiting-room cancellation.

use std::sync::Arc;

use derive_more::{Display, Error, From};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::backend::{
    AuthSession, BackendError, MatchPatch, MatchRow, MatchStore, NewMatch, NewProfile, ProfileRow,
};
use crate::game::{MatchStatus, Turn};

const CODE_LEN: usize = 6;
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 10;

/// Error from joining a match by code.
#[derive(Debug, Display, Error, From)]
pub enum JoinError {
    /// The code is not 6 characters.
    #[display("Join code must be 6 characters")]
    InvalidCode,
    /// No waiting match carries the code (or it already started).
    #[display("Match not found. Check the code, or the match may have started")]
    NotFound,
    /// The caller created the match.
    #[display("You cannot join your own match")]
    OwnMatch,
    /// A remote call failed.
    #[display("{_0}")]
    #[from]
    Backend(BackendError),
}

/// Outcome of a quick-match request.
#[derive(Debug, Clone)]
pub enum QuickMatch {
    /// An open public match was found and joined; the game is live.
    Joined(MatchRow),
    /// No open match existed; a fresh public match is now waiting.
    Created(MatchRow),
}

/// Service layer over the table store for lobby operations.
#[derive(Debug, Clone)]
pub struct Matchmaker {
    store: Arc<dyn MatchStore>,
}

impl Matchmaker {
    /// Creates a matchmaker over the given store.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        info!("Creating Matchmaker");
        Self { store }
    }

    /// Returns the session user's profile, creating it on first visit.
    ///
    /// The display name defaults to the email local part, as the sign-up
    /// form does.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the fetch or insert fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn ensure_profile(&self, session: &AuthSession) -> Result<ProfileRow, BackendError> {
        if let Some(profile) = self.store.fetch_profile(session.user_id()).await? {
            debug!("Existing profile found");
            return Ok(profile);
        }

        info!("Creating profile on first lobby visit");
        let name = session
            .email()
            .split('@')
            .next()
            .unwrap_or(session.email())
            .to_string();
        self.store
            .insert_profile(NewProfile::new(
                session.user_id().clone(),
                session.email().clone(),
                Some(name),
            ))
            .await
    }

    /// Creates a waiting match with the session user as player 1.
    ///
    /// Private matches get a join code; public ones are discoverable by
    /// quick match.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if code generation or the insert fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id(), private))]
    pub async fn create_match(
        &self,
        session: &AuthSession,
        private: bool,
    ) -> Result<MatchRow, BackendError> {
        let code = if private {
            Some(self.generate_join_code().await?)
        } else {
            None
        };
        let row = self
            .store
            .insert_match(NewMatch::new(
                session.user_id().clone(),
                MatchStatus::Waiting,
                private,
                code,
            ))
            .await?;
        info!(match_id = %row.id, code = ?row.code, "Match created");
        Ok(row)
    }

    /// Joins any open public match, or creates one if none is waiting.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the search, join, or create fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn quick_match(&self, session: &AuthSession) -> Result<QuickMatch, BackendError> {
        if let Some(open) = self
            .store
            .find_waiting_public(session.user_id())
            .await?
        {
            info!(match_id = %open.id, "Joining open public match");
            let joined = self
                .store
                .update_match(&open.id, join_patch(session.user_id()))
                .await?;
            return Ok(QuickMatch::Joined(joined));
        }

        info!("No open match found, creating a public one");
        let created = self.create_match(session, false).await?;
        Ok(QuickMatch::Created(created))
    }

    /// Joins a private match by its 6-character code.
    ///
    /// The code is trimmed and uppercased before lookup.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError`] naming the rejection, or wrapping the
    /// remote failure.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn join_by_code(
        &self,
        session: &AuthSession,
        code: &str,
    ) -> Result<MatchRow, JoinError> {
        let code = code.trim().to_uppercase();
        if code.len() != CODE_LEN {
            return Err(JoinError::InvalidCode);
        }

        let open = self
            .store
            .find_waiting_by_code(&code)
            .await?
            .ok_or(JoinError::NotFound)?;

        if open.player1_id == *session.user_id() {
            warn!(match_id = %open.id, "Attempted to join own match");
            return Err(JoinError::OwnMatch);
        }

        info!(match_id = %open.id, "Joining match by code");
        let joined = self
            .store
            .update_match(&open.id, join_patch(session.user_id()))
            .await?;
        Ok(joined)
    }

    /// Deletes a waiting match, but only if the caller created it and no
    /// second player has joined.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the fetch or delete fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id(), match_id = %match_id))]
    pub async fn cancel_waiting(
        &self,
        session: &AuthSession,
        match_id: &str,
    ) -> Result<(), BackendError> {
        let row = self.store.fetch_match(match_id).await?;
        if row.player1_id != *session.user_id() {
            debug!("Not the creator, leaving the match row in place");
            return Ok(());
        }
        if row.player2_id.is_some() || row.status != MatchStatus::Waiting {
            debug!("Match already joined, leaving the row in place");
            return Ok(());
        }
        info!("Cancelling waiting match");
        self.store.delete_match(match_id).await
    }

    /// Generates a join code not currently carried by any match.
    ///
    /// 6 uppercase alphanumerics; regenerated on collision up to 10
    /// attempts, then the last candidate gets the final two digits of
    /// the current unix-millis timestamp appended.
    async fn generate_join_code(&self) -> Result<String, BackendError> {
        let mut code = random_code();
        for attempt in 0..MAX_CODE_ATTEMPTS {
            if !self.store.code_exists(&code).await? {
                debug!(attempts = attempt + 1, "Join code generated");
                return Ok(code);
            }
            warn!(code = %code, "Join code collision, regenerating");
            code = random_code();
        }

        let millis = chrono::Utc::now().timestamp_millis().to_string();
        let suffix = &millis[millis.len().saturating_sub(2)..];
        let fallback = format!("{code}{suffix}");
        warn!(code = %fallback, "Code collisions exhausted attempts, using timestamp suffix");
        Ok(fallback)
    }
}

/// The write that fills the second seat and starts the game.
fn join_patch(user_id: &str) -> MatchPatch {
    MatchPatch {
        player2_id: Some(user_id.to_string()),
        status: Some(MatchStatus::InProgress),
        current_turn: Some(Turn::Player1),
        ..MatchPatch::default()
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::random_code;

    #[test]
    fn codes_are_six_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = random_code();
            assert_eq!(code.len(), 6);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
