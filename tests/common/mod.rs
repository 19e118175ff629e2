//! In-memory fakes for the table store and change feed, plus row builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use tictac_arena::{
    BackendError, Board, ChangeFeed, CounterPatch, Mark, MatchPatch, MatchRow, MatchStatus,
    MatchStore, MatchSubscription, NewMatch, NewMove, NewProfile, ProfileRow, Turn,
};

#[derive(Default)]
struct StoreState {
    matches: HashMap<String, MatchRow>,
    profiles: HashMap<String, ProfileRow>,
    moves: Vec<NewMove>,
    next_id: u32,
}

/// In-memory [`MatchStore`] with failure injection switches.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    /// When set, `update_match` fails.
    pub fail_match_updates: AtomicBool,
    /// When set, `update_counters` fails.
    pub fail_counter_updates: AtomicBool,
    /// When set, `insert_move` fails.
    pub fail_move_inserts: AtomicBool,
    fetches: AtomicUsize,
    counter_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `fetch_match` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `update_counters` calls so far.
    pub fn counter_write_count(&self) -> usize {
        self.counter_writes.load(Ordering::SeqCst)
    }

    /// Puts a match row in place directly.
    pub fn seed_match(&self, row: MatchRow) {
        self.state
            .lock()
            .unwrap()
            .matches
            .insert(row.id.clone(), row);
    }

    /// Puts a profile row in place directly.
    pub fn seed_profile(&self, row: ProfileRow) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(row.id.clone(), row);
    }

    /// Reads a match row back out, if present.
    pub fn match_row(&self, id: &str) -> Option<MatchRow> {
        self.state.lock().unwrap().matches.get(id).cloned()
    }

    /// Reads a profile row back out, if present.
    pub fn profile_row(&self, id: &str) -> Option<ProfileRow> {
        self.state.lock().unwrap().profiles.get(id).cloned()
    }

    /// All recorded audit-log moves.
    pub fn moves(&self) -> Vec<NewMove> {
        self.state.lock().unwrap().moves.clone()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn fetch_match(&self, id: &str) -> Result<MatchRow, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .matches
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::new(format!("match {id} not found")))
    }

    async fn insert_match(&self, new: NewMatch) -> Result<MatchRow, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let row = MatchRow {
            id: format!("m{}", state.next_id),
            player1_id: new.player1_id,
            player2_id: None,
            current_turn: None,
            status: new.status,
            board_state: Board::new(),
            winner_id: None,
            is_private: new.is_private,
            code: new.code,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.matches.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update_match(&self, id: &str, patch: MatchPatch) -> Result<MatchRow, BackendError> {
        if self.fail_match_updates.load(Ordering::SeqCst) {
            return Err(BackendError::new("injected update failure"));
        }
        let mut state = self.state.lock().unwrap();
        let row = state
            .matches
            .get_mut(id)
            .ok_or_else(|| BackendError::new(format!("match {id} not found")))?;
        if let Some(player2_id) = patch.player2_id {
            row.player2_id = Some(player2_id);
        }
        if let Some(current_turn) = patch.current_turn {
            row.current_turn = Some(current_turn);
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(board_state) = patch.board_state {
            row.board_state = board_state;
        }
        if let Some(winner_id) = patch.winner_id {
            row.winner_id = Some(winner_id);
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_match(&self, id: &str) -> Result<(), BackendError> {
        self.state.lock().unwrap().matches.remove(id);
        Ok(())
    }

    async fn find_waiting_public(
        &self,
        exclude_player: &str,
    ) -> Result<Option<MatchRow>, BackendError> {
        let state = self.state.lock().unwrap();
        let mut open: Vec<&MatchRow> = state
            .matches
            .values()
            .filter(|m| {
                m.status == MatchStatus::Waiting
                    && !m.is_private
                    && m.player1_id != exclude_player
                    && m.player2_id.is_none()
            })
            .collect();
        open.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(open.first().map(|m| (*m).clone()))
    }

    async fn find_waiting_by_code(&self, code: &str) -> Result<Option<MatchRow>, BackendError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .matches
            .values()
            .find(|m| {
                m.code.as_deref() == Some(code)
                    && m.status == MatchStatus::Waiting
                    && m.player2_id.is_none()
            })
            .cloned())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, BackendError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .matches
            .values()
            .any(|m| m.code.as_deref() == Some(code)))
    }

    async fn insert_move(&self, mv: NewMove) -> Result<(), BackendError> {
        if self.fail_move_inserts.load(Ordering::SeqCst) {
            return Err(BackendError::new("injected move insert failure"));
        }
        self.state.lock().unwrap().moves.push(mv);
        Ok(())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRow>, BackendError> {
        Ok(self.state.lock().unwrap().profiles.get(user_id).cloned())
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<ProfileRow, BackendError> {
        let row = ProfileRow {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            wins: 0,
            draws: 0,
            losses: 0,
        };
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn update_counters(
        &self,
        user_id: &str,
        counters: CounterPatch,
    ) -> Result<(), BackendError> {
        if self.fail_counter_updates.load(Ordering::SeqCst) {
            return Err(BackendError::new("injected counter failure"));
        }
        self.counter_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let profile = state
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| BackendError::new(format!("profile {user_id} not found")))?;
        if let Some(wins) = counters.wins {
            profile.wins = wins;
        }
        if let Some(draws) = counters.draws {
            profile.draws = draws;
        }
        if let Some(losses) = counters.losses {
            profile.losses = losses;
        }
        Ok(())
    }
}

/// [`ChangeFeed`] fake whose rows are pushed by the test.
#[derive(Default)]
pub struct ScriptedFeed {
    pusher: Mutex<Option<mpsc::Sender<MatchRow>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sender half of the open subscription. Panics if nothing has
    /// subscribed yet.
    pub fn pusher(&self) -> mpsc::Sender<MatchRow> {
        self.pusher
            .lock()
            .unwrap()
            .clone()
            .expect("no subscription open")
    }

    /// Drops the sender half, closing the feed from the producer side.
    pub fn close(&self) {
        self.pusher.lock().unwrap().take();
    }
}

#[async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn subscribe(&self, _match_id: &str) -> Result<MatchSubscription, BackendError> {
        let (tx, _cancel_rx, subscription) = MatchSubscription::channel(16);
        *self.pusher.lock().unwrap() = Some(tx);
        Ok(subscription)
    }
}

/// A live match row between `u1` (X, to move) and `u2` (O).
pub fn in_progress_match(id: &str) -> MatchRow {
    MatchRow {
        id: id.to_string(),
        player1_id: "u1".to_string(),
        player2_id: Some("u2".to_string()),
        current_turn: Some(Turn::Player1),
        status: MatchStatus::InProgress,
        board_state: Board::new(),
        winner_id: None,
        is_private: false,
        code: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A fresh profile row with zeroed counters.
pub fn profile(id: &str, email: &str) -> ProfileRow {
    ProfileRow {
        id: id.to_string(),
        email: email.to_string(),
        name: None,
        wins: 0,
        draws: 0,
        losses: 0,
    }
}

/// Builds a board from a 9-character pattern of `X`, `O`, and `.`.
pub fn board(pattern: &str) -> Board {
    assert_eq!(pattern.len(), 9, "board pattern must have 9 cells");
    let mut cells = [None; 9];
    for (i, c) in pattern.chars().enumerate() {
        cells[i] = match c {
            'X' => Some(Mark::X),
            'O' => Some(Mark::O),
            '.' => None,
            other => panic!("invalid board pattern cell: {other}"),
        };
    }
    Board::from(cells)
}
