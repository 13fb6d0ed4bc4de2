//! Error types for the room client

use thiserror::Error;

/// Result type alias for room operations
pub type RoomResult<T> = Result<T, RoomError>;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Handler for '{event_type}' panicked: {message}")]
    Handler { event_type: String, message: String },
}
