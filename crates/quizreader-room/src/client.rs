//! **Room Client**: One WebSocket connection to a multiplayer room.
//!
//! ```text
//!  disconnected ──connect()──► connecting ──open──► connected
//!        ▲                                              │
//!        └────────── disconnect() / transport close ────┘
//! ```
//!
//! While connected three tasks run: a writer draining the outbound queue, a
//! reader dispatching inbound messages, and a keepalive sending `ping`. They
//! are torn down together. There is no automatic reconnect.

use crate::actions::ClientAction;
use crate::config::RoomConfig;
use crate::dispatcher::{Dispatcher, Subscription};
use crate::error::{RoomError, RoomResult};
use crate::events::{ServerEvent, CONNECTED, DISCONNECTED};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Identity of the current connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    pub room_name: String,
    pub user_id: String,
    pub username: String,
}

struct Connection {
    identity: RoomIdentity,
    outbound: mpsc::UnboundedSender<Message>,
    reader: AbortHandle,
    writer: AbortHandle,
    keepalive: AbortHandle,
}

/// State shared with the connection tasks.
struct Shared {
    dispatcher: Dispatcher,
    state_tx: watch::Sender<ConnectionState>,
    /// Bumped on every connect and disconnect; tasks of an older generation stay silent
    generation: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}

pub struct RoomClient {
    config: RoomConfig,
    shared: Arc<Shared>,
    connection: Option<Connection>,
}

impl RoomClient {
    pub fn new(config: RoomConfig) -> RoomResult<Self> {
        config.validate()?;
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                dispatcher: Dispatcher::new(),
                state_tx,
                generation: AtomicU64::new(0),
            }),
            connection: None,
        })
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Identity of the live connection
    pub fn identity(&self) -> Option<&RoomIdentity> {
        self.connection
            .as_ref()
            .filter(|_| self.is_connected())
            .map(|c| &c.identity)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.shared.dispatcher
    }

    /// Register a handler for an inbound event type (or `"_connected"` / `"_disconnected"`).
    pub fn on<F>(&self, event_type: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared.dispatcher.on(event_type, handler)
    }

    /// Register a wildcard handler receiving `(type, payload)` for every event.
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.shared.dispatcher.on_any(handler)
    }

    /// Register a typed handler. Messages that fail to parse are skipped.
    pub fn on_event<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.shared.dispatcher.on_any(move |event_type, payload| {
            if event_type.starts_with('_') {
                return;
            }
            match ServerEvent::from_value(payload) {
                Ok(event) => handler(&event),
                Err(e) => debug!(event_type, error = %e, "Untyped room event"),
            }
        })
    }

    pub fn set_error_sink<F>(&self, sink: F)
    where
        F: Fn(&RoomError) + Send + Sync + 'static,
    {
        self.shared.dispatcher.set_error_sink(sink);
    }

    /// Open a connection to `room_name`. A missing `user_id` is generated.
    ///
    /// Any existing connection is closed first.
    pub async fn connect(
        &mut self,
        room_name: &str,
        username: &str,
        user_id: Option<String>,
    ) -> RoomResult<()> {
        self.disconnect();

        let user_id = user_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let url = self.config.connection_url(room_name, &user_id, username)?;
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.shared.set_state(ConnectionState::Connecting);
        debug!(room = room_name, %user_id, "Connecting to room");

        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!(room = room_name, error = %e, "Room connection failed");
                if self.shared.is_current(generation) {
                    self.shared.set_state(ConnectionState::Disconnected);
                    self.shared.dispatcher.emit(
                        DISCONNECTED,
                        &json!({
                            "type": DISCONNECTED,
                            "code": Value::Null,
                            "reason": e.to_string(),
                        }),
                    );
                }
                return Err(e.into());
            }
        };
        let (mut sink, mut source) = stream.split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();

        let writer = tokio::spawn(async move {
            while let Some(message) = queue.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    debug!(error = %e, "Room writer stopped");
                    break;
                }
                if closing {
                    break;
                }
            }
        })
        .abort_handle();

        let keepalive = spawn_keepalive(outbound.clone(), self.config.keepalive_interval);

        let identity = RoomIdentity {
            room_name: room_name.to_string(),
            user_id: user_id.clone(),
            username: username.to_string(),
        };

        self.shared.set_state(ConnectionState::Connected);
        info!(room = room_name, %user_id, username, "✅ Connected to room");
        self.shared.dispatcher.emit(
            CONNECTED,
            &json!({
                "type": CONNECTED,
                "roomName": identity.room_name,
                "userId": identity.user_id,
                "username": identity.username,
            }),
        );

        let shared = Arc::clone(&self.shared);
        let keepalive_for_reader = keepalive.clone();
        let writer_for_reader = writer.clone();
        let reader = tokio::spawn(async move {
            let mut close_code: Option<u16> = None;
            let mut close_reason = String::new();

            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if !shared.is_current(generation) {
                            break;
                        }
                        shared.dispatcher.dispatch_raw(text.as_str());
                    }
                    Ok(Message::Close(frame)) => {
                        if let Some(frame) = frame {
                            close_code = Some(u16::from(frame.code));
                            close_reason = frame.reason.as_str().to_string();
                        }
                        break;
                    }
                    Ok(Message::Binary(_)) => debug!("Ignoring binary room frame"),
                    Ok(_) => {}
                    Err(e) => {
                        close_reason = e.to_string();
                        break;
                    }
                }
            }

            keepalive_for_reader.abort();
            writer_for_reader.abort();

            if shared.is_current(generation) {
                // Unexpected close: retire this generation before telling listeners
                shared.generation.fetch_add(1, Ordering::SeqCst);
                shared.set_state(ConnectionState::Disconnected);
                warn!(code = ?close_code, reason = %close_reason, "Room connection closed");
                shared.dispatcher.emit(
                    DISCONNECTED,
                    &json!({
                        "type": DISCONNECTED,
                        "code": close_code,
                        "reason": close_reason,
                    }),
                );
            }
        })
        .abort_handle();

        self.connection = Some(Connection {
            identity,
            outbound,
            reader,
            writer,
            keepalive,
        });
        Ok(())
    }

    /// Close the connection. Later inbound messages are not dispatched. Idempotent.
    pub fn disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let was_live = self.is_connected();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        connection.keepalive.abort();
        connection.reader.abort();
        // The writer exits on its own after flushing the close frame
        let closing = was_live && connection.outbound.send(Message::Close(None)).is_ok();
        if !closing {
            connection.writer.abort();
        }

        self.shared.set_state(ConnectionState::Disconnected);
        info!(room = %connection.identity.room_name, "Left room");
    }

    /// Send `{type, ...data}`. Returns `false` (and sends nothing) unless connected.
    pub fn send(&self, event_type: &str, data: Map<String, Value>) -> bool {
        let mut message = data;
        message.insert("type".to_string(), Value::String(event_type.to_string()));
        self.transmit(Value::Object(message))
    }

    /// Send a typed action.
    pub fn send_action(&self, action: &ClientAction) -> bool {
        match serde_json::to_value(action) {
            Ok(value) => self.transmit(value),
            Err(e) => {
                warn!(action = action.type_name(), error = %e, "Action serialization failed");
                false
            }
        }
    }

    pub fn buzz(&self) -> bool {
        self.send_action(&ClientAction::Buzz)
    }

    /// Ask the room for the next question
    pub fn next(&self) -> bool {
        self.send_action(&ClientAction::Next)
    }

    /// Pause (`true`) or resume (`false`) the reading.
    pub fn pause(&self, pausing: bool) -> bool {
        self.send_action(&ClientAction::pause(pausing))
    }

    pub fn chat(&self, message: &str) -> bool {
        self.send_action(&ClientAction::Chat {
            message: message.to_string(),
        })
    }

    /// Submit a final answer.
    pub fn give_answer(&self, answer: &str) -> bool {
        self.send_action(&ClientAction::GiveAnswer {
            given_answer: answer.to_string(),
        })
    }

    /// Share the answer typed or spoken so far.
    pub fn give_answer_live_update(&self, answer: &str) -> bool {
        self.send_action(&ClientAction::GiveAnswerLiveUpdate {
            given_answer: answer.to_string(),
        })
    }

    pub fn start_bonus_answer(&self) -> bool {
        self.send_action(&ClientAction::StartBonusAnswer)
    }

    fn transmit(&self, message: Value) -> bool {
        let Some(connection) = self.connection.as_ref().filter(|_| self.is_connected()) else {
            debug!(message = %message, "Not connected; message dropped");
            return false;
        };
        let text = message.to_string();
        connection.outbound.send(Message::Text(text.into())).is_ok()
    }
}

fn spawn_keepalive(
    outbound: mpsc::UnboundedSender<Message>,
    every: std::time::Duration,
) -> AbortHandle {
    tokio::spawn(async move {
        let ping = json!({ "type": ClientAction::Ping.type_name() }).to_string();
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            interval.tick().await;
            if outbound.send(Message::Text(ping.clone().into())).is_err() {
                break;
            }
            debug!("Keepalive ping queued");
        }
    })
    .abort_handle()
}

impl Drop for RoomClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn keepalive_task_ends_with_its_handle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_keepalive(tx, Duration::from_millis(30));

        let first = rx.recv().await.unwrap();
        assert_eq!(first, Message::Text(r#"{"type":"ping"}"#.to_string().into()));

        handle.abort();
        tokio::time::sleep(Duration::from_millis(300)).await;
        // The aborted task dropped its sender without queueing more pings
        assert!(rx.recv().await.is_none());
    }
}
