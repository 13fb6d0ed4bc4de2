//! # Quizreader Room - Multiplayer Room Client
//!
//! A persistent WebSocket connection to a quiz room: connect lifecycle,
//! keepalive, publish/subscribe dispatch of inbound events and typed outbound
//! actions.
//!
//! ```text
//!  server ──text──► reader task ──► Dispatcher ──► on("type") handlers
//!                                             └──► on_any wildcard handlers
//!  RoomClient::send / send_action ──► outbound queue ──► writer task ──► server
//!  keepalive task ──ping every 30s──┘
//! ```

pub mod actions;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;

pub use actions::ClientAction;
pub use client::{ConnectionState, RoomClient, RoomIdentity};
pub use config::RoomConfig;
pub use dispatcher::{Dispatcher, ErrorSink, EventHandler, Subscription, WildcardHandler, WILDCARD};
pub use error::{RoomError, RoomResult};
pub use events::{Directive, ServerEvent, CONNECTED, DISCONNECTED};
