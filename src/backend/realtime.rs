//! [`ChangeFeed`] implementation over the hosted realtime websocket.
//!
//! The feed speaks the phoenix-channels framing: join a topic scoped by
//! table and row id, answer with heartbeats, and receive `UPDATE` events
//! carrying the full updated row in `payload.record`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::backend::store::{ChangeFeed, MatchSubscription};
use crate::backend::{BackendError, MatchRow};
use crate::config::BackendConfig;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

/// Realtime feed client for match-row UPDATE events.
#[derive(Debug, Clone)]
pub struct RealtimeFeed {
    ws_url: String,
    api_key: String,
}

impl RealtimeFeed {
    /// Creates a feed client from the backend config.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the configured base URL cannot be
    /// rewritten into a websocket URL.
    #[instrument(skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut url = Url::parse(config.base_url())
            .map_err(|e| BackendError::new(format!("invalid base URL: {e}")))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(BackendError::new(format!(
                    "unsupported URL scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| BackendError::new("failed to set websocket scheme"))?;
        let ws_url = format!(
            "{}/realtime/v1/websocket",
            url.as_str().trim_end_matches('/')
        );
        info!(ws_url = %ws_url, "Creating RealtimeFeed");
        Ok(Self {
            ws_url,
            api_key: config.api_key().clone(),
        })
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    #[instrument(skip(self))]
    async fn subscribe(&self, match_id: &str) -> Result<MatchSubscription, BackendError> {
        let url = format!("{}?apikey={}&vsn=1.0.0", self.ws_url, self.api_key);
        let (ws, _response) = tokio_tungstenite::connect_async(&url).await?;
        let (mut write, read) = ws.split();

        let topic = format!("realtime:public:matches:id=eq.{match_id}");
        let join = json!({
            "topic": topic,
            "event": "phx_join",
            "payload": {},
            "ref": "1",
        });
        write.send(Message::Text(join.to_string().into())).await?;
        info!(topic = %topic, "Joined realtime channel");

        let (tx, cancel_rx, subscription) = MatchSubscription::channel(16);
        tokio::spawn(pump_events(write, read, topic, tx, cancel_rx));
        Ok(subscription)
    }
}

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;
type WsSource = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Drives one channel subscription: forwards UPDATE records, answers
/// heartbeats, and exits on cancellation or socket close.
async fn pump_events(
    mut write: WsSink,
    mut read: WsSource,
    topic: String,
    tx: mpsc::Sender<MatchRow>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_PERIOD);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; consume it.
    heartbeat.tick().await;
    let mut heartbeat_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                debug!(topic = %topic, "Subscription cancelled, leaving channel");
                let leave = json!({
                    "topic": topic,
                    "event": "phx_leave",
                    "payload": {},
                    "ref": "leave",
                });
                let _ = write.send(Message::Text(leave.to_string().into())).await;
                let _ = write.close().await;
                break;
            }
            _ = heartbeat.tick() => {
                let beat = json!({
                    "topic": "phoenix",
                    "event": "heartbeat",
                    "payload": {},
                    "ref": heartbeat_ref.to_string(),
                });
                heartbeat_ref += 1;
                if write.send(Message::Text(beat.to_string().into())).await.is_err() {
                    warn!(topic = %topic, "Heartbeat send failed, closing feed");
                    break;
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(row) = parse_update(&text)
                            && tx.send(row).await.is_err()
                        {
                            // Consumer gone; nothing left to deliver.
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!(topic = %topic, "Realtime socket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(topic = %topic, error = %e, "Realtime socket error");
                        break;
                    }
                }
            }
        }
    }
    debug!(topic = %topic, "Realtime pump exited");
}

/// Extracts the updated row from an UPDATE event frame, ignoring replies
/// and other channel chatter.
fn parse_update(text: &str) -> Option<MatchRow> {
    let frame: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Unparseable realtime frame");
            return None;
        }
    };
    match frame.get("event").and_then(|e| e.as_str()) {
        Some("UPDATE") => {}
        Some("phx_reply") => {
            debug!(payload = %frame.get("payload").cloned().unwrap_or_default(), "Channel reply");
            return None;
        }
        _ => return None,
    }
    let record = frame.get("payload")?.get("record")?;
    match serde_json::from_value::<MatchRow>(record.clone()) {
        Ok(row) => {
            debug!(match_id = %row.id, status = %row.status, "Realtime update received");
            Some(row)
        }
        Err(e) => {
            warn!(error = %e, "UPDATE record did not match the row shape");
            None
        }
    }
}
