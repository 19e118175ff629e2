//! Lobby controller: the state machine driving the multi-screen TUI.

use std::sync::Arc;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, instrument, warn};

use crate::backend::{
    AuthClient, AuthSession, BackendError, ChangeFeed, MatchRow, MatchStore, ProfileRow,
    RealtimeFeed, RestStore,
};
use crate::config::BackendConfig;
use crate::game::{MatchStatus, Turn};
use crate::lobby::screen::{Screen, ScreenTransition};
use crate::lobby::screens::{
    InGameScreen, LoginScreen, MainLobbyScreen, ResultScreen, SignUpScreen, WaitingScreen,
};
use crate::matchmaking::{Matchmaker, QuickMatch};
use crate::sync::{MatchSession, MatchWatcher, PlayError, WatcherHandle};

/// Active screen in the lobby state machine.
#[derive(Debug)]
enum ActiveScreen {
    Login(LoginScreen),
    SignUp(SignUpScreen),
    MainLobby(MainLobbyScreen),
    Waiting(WaitingScreen),
    InGame(InGameScreen),
    Result(ResultScreen),
}

/// Everything that exists only while a match is open: the session, the
/// background watcher, and the channel its updates arrive on.
#[derive(Debug)]
struct LiveMatch {
    session: MatchSession,
    watcher: WatcherHandle,
    updates: mpsc::Receiver<MatchRow>,
}

/// Controller that drives the lobby state machine.
///
/// Call [`LobbyController::run`] to start the event loop. Screens handle
/// keys and return transitions; every backend call happens here.
#[derive(Debug)]
pub struct LobbyController {
    config: BackendConfig,
    auth: AuthClient,
    auth_session: Option<AuthSession>,
    store: Option<Arc<RestStore>>,
    feed: Option<Arc<RealtimeFeed>>,
    matchmaker: Option<Matchmaker>,
    profile: Option<ProfileRow>,
    live: Option<LiveMatch>,
}

impl LobbyController {
    /// Creates a new lobby controller.
    #[instrument(skip(config))]
    pub fn new(config: BackendConfig) -> Self {
        info!("Creating LobbyController");
        let auth = AuthClient::new(&config);
        Self {
            config,
            auth,
            auth_session: None,
            store: None,
            feed: None,
            matchmaker: None,
            profile: None,
            live: None,
        }
    }

    /// Runs the lobby event loop until the user quits.
    #[instrument(skip(self, terminal))]
    pub async fn run<B: Backend + std::io::Write>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        info!("Starting lobby event loop");

        let mut screen = ActiveScreen::Login(LoginScreen::new());

        loop {
            // Reconcile any rows the watcher delivered since last frame.
            if let Some(row) = self.pump_updates().await {
                screen = self.reconcile_screen(screen, row);
            }

            terminal.draw(|f| match &screen {
                ActiveScreen::Login(s) => s.render(f),
                ActiveScreen::SignUp(s) => s.render(f),
                ActiveScreen::MainLobby(s) => s.render(f),
                ActiveScreen::Waiting(s) => s.render(f),
                ActiveScreen::InGame(s) => s.render(f),
                ActiveScreen::Result(s) => s.render(f),
            })?;

            // Poll for input with short timeout to keep the loop responsive.
            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
            {
                // Skip key release events (crossterm fires both press and release).
                if key.kind == KeyEventKind::Release {
                    continue;
                }

                let transition = match &mut screen {
                    ActiveScreen::Login(s) => s.handle_key(key),
                    ActiveScreen::SignUp(s) => s.handle_key(key),
                    ActiveScreen::MainLobby(s) => s.handle_key(key),
                    ActiveScreen::Waiting(s) => s.handle_key(key),
                    ActiveScreen::InGame(s) => s.handle_key(key),
                    ActiveScreen::Result(s) => s.handle_key(key),
                };

                screen = match self.apply_transition(transition, screen).await {
                    Some(next) => next,
                    None => {
                        info!("Lobby quitting");
                        self.teardown_live();
                        return Ok(());
                    }
                };
            }

            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Drains the watcher channel through the session, returning the
    /// latest reconciled row if anything arrived.
    async fn pump_updates(&mut self) -> Option<MatchRow> {
        let live = self.live.as_mut()?;
        let mut latest = None;
        while let Ok(row) = live.updates.try_recv() {
            live.session.observe(row).await;
            latest = Some(live.session.current().clone());
        }
        latest
    }

    /// Moves the screen forward when a fresh row changes what the user
    /// should be looking at.
    #[instrument(skip(self, current, row), fields(match_id = %row.id, status = %row.status))]
    fn reconcile_screen(&mut self, current: ActiveScreen, row: MatchRow) -> ActiveScreen {
        match current {
            ActiveScreen::Waiting(s) => {
                if row.status == MatchStatus::InProgress && row.player2_id.is_some() {
                    info!("Opponent joined, entering game");
                    // The waiting player created the match, so always seat 1.
                    ActiveScreen::InGame(InGameScreen::new(row, Turn::Player1))
                } else {
                    ActiveScreen::Waiting(s)
                }
            }
            ActiveScreen::InGame(mut s) => {
                if row.status == MatchStatus::Finished {
                    info!(winner = ?row.winner_id, "Match finished");
                    let viewer = self.viewer_id().unwrap_or_default();
                    self.teardown_live();
                    ActiveScreen::Result(ResultScreen::new(row, &viewer))
                } else {
                    s.set_row(row);
                    ActiveScreen::InGame(s)
                }
            }
            other => other,
        }
    }

    /// Applies a screen transition, returning the next screen or `None` to quit.
    #[instrument(skip(self, current))]
    async fn apply_transition(
        &mut self,
        transition: ScreenTransition,
        current: ActiveScreen,
    ) -> Option<ActiveScreen> {
        debug!(transition = ?transition, "Applying screen transition");
        match transition {
            ScreenTransition::Stay => Some(current),

            ScreenTransition::GoToLogin => {
                info!("Navigating to Login");
                Some(ActiveScreen::Login(LoginScreen::new()))
            }

            ScreenTransition::GoToSignUp => {
                info!("Navigating to SignUp");
                Some(ActiveScreen::SignUp(SignUpScreen::new()))
            }

            ScreenTransition::SubmitLogin { email, password } => {
                match self.auth.sign_in(&email, &password).await {
                    Ok(session) => self.enter_lobby(session, current).await,
                    Err(e) => {
                        warn!(error = %e, "Sign-in failed");
                        Some(show_error(current, e.message))
                    }
                }
            }

            ScreenTransition::SubmitSignUp {
                email,
                password,
                name,
            } => {
                let name = if name.is_empty() { None } else { Some(name) };
                match self.auth.sign_up(&email, &password, name.as_deref()).await {
                    Ok(session) => self.enter_lobby(session, current).await,
                    Err(e) => {
                        warn!(error = %e, "Sign-up failed");
                        Some(show_error(current, e.message))
                    }
                }
            }

            ScreenTransition::LogOut => {
                self.teardown_live();
                if let Some(session) = self.auth_session.take()
                    && let Err(e) = self.auth.sign_out(&session).await
                {
                    // The local session is discarded regardless.
                    warn!(error = %e, "Sign-out failed");
                }
                self.store = None;
                self.feed = None;
                self.matchmaker = None;
                self.profile = None;
                info!("Logged out, returning to Login");
                Some(ActiveScreen::Login(LoginScreen::new()))
            }

            ScreenTransition::CreateMatch { private } => {
                let Some((matchmaker, session)) = self.lobby_services() else {
                    return Some(ActiveScreen::Login(LoginScreen::new()));
                };
                match matchmaker.create_match(&session, private).await {
                    Ok(row) => match self.open_live(row.clone()).await {
                        Ok(()) => Some(ActiveScreen::Waiting(WaitingScreen::new(&row))),
                        Err(e) => {
                            warn!(error = %e, "Could not watch created match");
                            Some(show_error(current, e.message))
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Match creation failed");
                        Some(show_error(current, e.message))
                    }
                }
            }

            ScreenTransition::QuickMatch => {
                let Some((matchmaker, session)) = self.lobby_services() else {
                    return Some(ActiveScreen::Login(LoginScreen::new()));
                };
                match matchmaker.quick_match(&session).await {
                    Ok(QuickMatch::Joined(row)) => self.enter_game(row, Turn::Player2, current).await,
                    Ok(QuickMatch::Created(row)) => match self.open_live(row.clone()).await {
                        Ok(()) => Some(ActiveScreen::Waiting(WaitingScreen::new(&row))),
                        Err(e) => {
                            warn!(error = %e, "Could not watch created match");
                            Some(show_error(current, e.message))
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Quick match failed");
                        Some(show_error(current, e.message))
                    }
                }
            }

            ScreenTransition::JoinByCode { code } => {
                let Some((matchmaker, session)) = self.lobby_services() else {
                    return Some(ActiveScreen::Login(LoginScreen::new()));
                };
                match matchmaker.join_by_code(&session, &code).await {
                    Ok(row) => self.enter_game(row, Turn::Player2, current).await,
                    Err(e) => {
                        warn!(error = %e, "Join by code failed");
                        Some(show_error(current, e.to_string()))
                    }
                }
            }

            ScreenTransition::CancelWaiting => {
                let Some((matchmaker, session)) = self.lobby_services() else {
                    return Some(ActiveScreen::Login(LoginScreen::new()));
                };
                let match_id = self
                    .live
                    .as_ref()
                    .map(|live| live.session.current().id.clone());
                match match_id {
                    Some(id) => {
                        if let Err(e) = matchmaker.cancel_waiting(&session, &id).await {
                            warn!(error = %e, "Cancel failed");
                            return Some(show_error(current, e.message));
                        }
                        self.teardown_live();
                        self.lobby_screen().await
                    }
                    None => {
                        warn!("Cancel requested with no live match");
                        self.lobby_screen().await
                    }
                }
            }

            ScreenTransition::PlaceMark { position } => {
                let Some(live) = self.live.as_mut() else {
                    warn!("Move requested with no live match");
                    return self.lobby_screen().await;
                };
                match live.session.make_move(position).await {
                    Ok(row) => {
                        let row = row.clone();
                        if row.status == MatchStatus::Finished {
                            let viewer = live.session.viewer_id().to_string();
                            self.teardown_live();
                            return Some(ActiveScreen::Result(ResultScreen::new(row, &viewer)));
                        }
                        let mut next = current;
                        if let ActiveScreen::InGame(s) = &mut next {
                            s.set_row(row);
                        }
                        Some(next)
                    }
                    Err(PlayError::Rejected(e)) => {
                        debug!(reason = %e, "Move rejected");
                        Some(show_error(current, e.to_string()))
                    }
                    Err(PlayError::Backend(e)) => {
                        warn!(error = %e, "Move failed at the store");
                        // The session already reverted to authoritative state.
                        let row = live.session.current().clone();
                        let mut next = current;
                        if let ActiveScreen::InGame(s) = &mut next {
                            s.set_row(row);
                        }
                        Some(show_error(next, e.message))
                    }
                }
            }

            ScreenTransition::Forfeit => {
                let Some(live) = self.live.as_mut() else {
                    warn!("Forfeit requested with no live match");
                    return self.lobby_screen().await;
                };
                match live.session.forfeit().await {
                    Ok(row) => {
                        let row = row.clone();
                        let viewer = live.session.viewer_id().to_string();
                        self.teardown_live();
                        Some(ActiveScreen::Result(ResultScreen::new(row, &viewer)))
                    }
                    Err(e) => {
                        warn!(error = %e, "Forfeit failed");
                        Some(show_error(current, e.to_string()))
                    }
                }
            }

            ScreenTransition::GoToLobby => {
                self.teardown_live();
                self.lobby_screen().await
            }

            ScreenTransition::Quit => None,
        }
    }

    /// Builds the per-session services after authentication and lands on
    /// the main lobby.
    async fn enter_lobby(
        &mut self,
        session: AuthSession,
        current: ActiveScreen,
    ) -> Option<ActiveScreen> {
        match self.establish(session).await {
            Ok(profile) => {
                info!(user_id = %profile.id, "Entering lobby");
                self.profile = Some(profile.clone());
                Some(ActiveScreen::MainLobby(MainLobbyScreen::new(profile)))
            }
            Err(e) => {
                warn!(error = %e, "Could not establish lobby services");
                Some(show_error(current, e.message))
            }
        }
    }

    /// Wires up the store, feed, and matchmaker for a fresh session, and
    /// ensures the user's profile row exists.
    async fn establish(&mut self, session: AuthSession) -> Result<ProfileRow, BackendError> {
        let store = Arc::new(RestStore::new(
            &self.config,
            session.access_token().clone(),
        ));
        let feed = Arc::new(RealtimeFeed::new(&self.config)?);
        let matchmaker = Matchmaker::new(store.clone() as Arc<dyn MatchStore>);
        let profile = matchmaker.ensure_profile(&session).await?;

        self.auth_session = Some(session);
        self.store = Some(store);
        self.feed = Some(feed);
        self.matchmaker = Some(matchmaker);
        Ok(profile)
    }

    /// Opens the session and watcher for a joined match and lands in game.
    async fn enter_game(
        &mut self,
        row: MatchRow,
        seat: Turn,
        current: ActiveScreen,
    ) -> Option<ActiveScreen> {
        match self.open_live(row.clone()).await {
            Ok(()) => {
                info!(match_id = %row.id, seat = %seat, "Entering game");
                Some(ActiveScreen::InGame(InGameScreen::new(row, seat)))
            }
            Err(e) => {
                warn!(error = %e, "Could not open match session");
                Some(show_error(current, e.message))
            }
        }
    }

    /// Starts the match session and background watcher for the row.
    async fn open_live(&mut self, row: MatchRow) -> Result<(), BackendError> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| BackendError::new("no table store for this session"))?;
        let feed = self
            .feed
            .clone()
            .ok_or_else(|| BackendError::new("no change feed for this session"))?;
        let viewer = self
            .viewer_id()
            .ok_or_else(|| BackendError::new("no authenticated user"))?;

        let (watcher, updates) = MatchWatcher::spawn(
            store.clone() as Arc<dyn MatchStore>,
            feed as Arc<dyn ChangeFeed>,
            &row.id,
        )
        .await?;

        let session = MatchSession::new(store as Arc<dyn MatchStore>, viewer, row);
        self.live = Some(LiveMatch {
            session,
            watcher,
            updates,
        });
        Ok(())
    }

    /// Stops the watcher and drops the match session.
    fn teardown_live(&mut self) {
        if let Some(live) = self.live.take() {
            debug!("Tearing down live match");
            live.watcher.shutdown();
        }
    }

    /// Builds a main lobby screen with freshly fetched stats, falling
    /// back to the sign-in screen when there is no session to refresh.
    async fn lobby_screen(&mut self) -> Option<ActiveScreen> {
        let Some((matchmaker, session)) = self.lobby_services() else {
            return Some(ActiveScreen::Login(LoginScreen::new()));
        };
        match matchmaker.ensure_profile(&session).await {
            Ok(profile) => {
                self.profile = Some(profile.clone());
                Some(ActiveScreen::MainLobby(MainLobbyScreen::new(profile)))
            }
            Err(e) => {
                warn!(error = %e, "Profile refresh failed, using cached copy");
                match self.profile.clone() {
                    Some(profile) => {
                        let mut screen = MainLobbyScreen::new(profile);
                        screen.set_error(e.message);
                        Some(ActiveScreen::MainLobby(screen))
                    }
                    None => Some(ActiveScreen::Login(LoginScreen::new())),
                }
            }
        }
    }

    /// The matchmaker and session, or a redirect-worthy `None` when the
    /// user is somehow not signed in.
    fn lobby_services(&self) -> Option<(Matchmaker, AuthSession)> {
        match (self.matchmaker.clone(), self.auth_session.clone()) {
            (Some(m), Some(s)) => Some((m, s)),
            _ => {
                warn!("Lobby operation without an authenticated session");
                None
            }
        }
    }

    fn viewer_id(&self) -> Option<String> {
        self.auth_session
            .as_ref()
            .map(|s| s.user_id().clone())
    }
}

/// Routes an error message to whatever screen is showing.
fn show_error(mut screen: ActiveScreen, message: String) -> ActiveScreen {
    match &mut screen {
        ActiveScreen::Login(s) => s.set_error(message),
        ActiveScreen::SignUp(s) => s.set_error(message),
        ActiveScreen::MainLobby(s) => s.set_error(message),
        ActiveScreen::Waiting(s) => s.set_error(message),
        ActiveScreen::InGame(s) => s.set_notice(message),
        ActiveScreen::Result(_) => {}
    }
    screen
}
