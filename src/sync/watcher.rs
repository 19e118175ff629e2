//! Background watcher: push subscription with a time-boxed polling
//! fallback, converging on a single delivery channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendError, ChangeFeed, MatchRow, MatchStore};

/// How often the fallback poll fires.
pub const POLL_PERIOD: Duration = Duration::from_secs(5);

/// A poll is skipped if a push update arrived within this window.
pub const PUSH_QUIET_WINDOW: Duration = Duration::from_secs(4);

/// Handle for tearing the watcher down.
///
/// Dropping the handle stops the watcher task, its subscription, and its
/// polling timer; [`shutdown`](Self::shutdown) does the same explicitly.
#[derive(Debug)]
pub struct WatcherHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stops the watcher.
    pub fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            debug!("Shutting down match watcher");
            let _ = stop.send(());
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.abort();
    }
}

/// Watches one match row, delivering authoritative snapshots from both
/// the push feed and the fallback poll through one channel.
#[derive(Debug)]
pub struct MatchWatcher;

impl MatchWatcher {
    /// Subscribes to the match and spawns the watch loop.
    ///
    /// Every delivered row, pushed or polled, arrives on the returned
    /// receiver, so the consumer reconciles through a single path.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the subscription cannot be opened.
    #[instrument(skip(store, feed))]
    pub async fn spawn(
        store: Arc<dyn MatchStore>,
        feed: Arc<dyn ChangeFeed>,
        match_id: &str,
    ) -> Result<(WatcherHandle, mpsc::Receiver<MatchRow>), BackendError> {
        info!(match_id = %match_id, "Starting match watcher");
        let subscription = feed.subscribe(match_id).await?;
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(watch_loop(
            store,
            subscription,
            match_id.to_string(),
            tx,
            stop_rx,
        ));

        Ok((
            WatcherHandle {
                stop: Some(stop_tx),
                task,
            },
            rx,
        ))
    }
}

async fn watch_loop(
    store: Arc<dyn MatchStore>,
    mut subscription: crate::backend::MatchSubscription,
    match_id: String,
    tx: mpsc::Sender<MatchRow>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut last_push = Instant::now();
    let mut feed_open = true;

    let mut poll = tokio::time::interval(POLL_PERIOD);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first real
    // poll happens one full period after startup.
    poll.tick().await;

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!(match_id = %match_id, "Watcher stopped");
                break;
            }
            pushed = subscription.recv(), if feed_open => {
                match pushed {
                    Some(row) => {
                        last_push = Instant::now();
                        debug!(match_id = %match_id, status = %row.status, "Push update");
                        if tx.send(row).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Feed dropped; the poll below keeps the session
                        // alive on its own.
                        warn!(match_id = %match_id, "Change feed closed, polling only");
                        feed_open = false;
                    }
                }
            }
            _ = poll.tick() => {
                if feed_open && last_push.elapsed() <= PUSH_QUIET_WINDOW {
                    continue;
                }
                debug!(match_id = %match_id, "Fallback poll: no recent push update");
                match store.fetch_match(&match_id).await {
                    Ok(row) => {
                        if tx.send(row).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Not fatal; the next tick retries.
                        warn!(match_id = %match_id, error = %e, "Fallback poll failed");
                    }
                }
            }
        }
    }

    subscription.shutdown();
}
