//! Error types for the quizreader voice layer

use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur while reading questions aloud or capturing answers.
///
/// Expected outcomes (a cancelled utterance, an aborted recognition, silence,
/// a denied microphone) are never reported through this type; they surface
/// as state fields and notices instead.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings file error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
