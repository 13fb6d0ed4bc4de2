//! # Quizreader Voice - Word-Synchronized Question Reading
//!
//! Reads quiz questions aloud through a platform speech engine while keeping a
//! monotonic "revealed so far" word index, and captures spoken answers through
//! a platform recognizer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Reveal Engine                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │  Question    │→ │   Chunker    │→ │  Strategy    │       │
//! │  │ (power mark) │  │ (punctuation)│  │  (per speak) │       │
//! │  └──────────────┘  └──────────────┘  └──────────────┘       │
//! │                                             ↓                │
//! │  ┌──────────────┐   session-gated   ┌──────────────┐        │
//! │  │ RevealCursor │←──── reducer ─────│ Synthesizer  │        │
//! │  │ (advance-only)│                  │  callbacks   │        │
//! │  └──────────────┘                   └──────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//!
//!  VoiceCapture: SpeechRecognizer → interim / final transcript
//! ```

pub mod capture;
pub mod chunker;
pub mod config;
pub mod cursor;
pub mod error;
pub mod question;
pub mod reveal;
pub mod synthesizer;

pub use capture::{
    CaptureEvent, CaptureNotice, CaptureState, RecognitionErrorKind, RecognitionEvents,
    RecognitionSlot, SpeechRecognizer, UnsupportedRecognizer, VoiceCapture,
};
pub use chunker::{build_chunks, Chunk, CLAUSE_TERMINATORS};
pub use config::{CaptureConfig, ReaderConfig, Settings};
pub use cursor::{advance, RevealCursor};
pub use error::{VoiceError, VoiceResult};
pub use question::{tokenize, PreparedQuestion, POWER_MARK};
pub use reveal::{RevealEngine, RevealNotice, RevealState, Strategy};
pub use synthesizer::{
    select_voice, PlaceholderSynthesizer, PlatformCapabilities, SpeechSynthesizer,
    SynthErrorKind, SynthEventKind, Utterance, UtteranceEvents, UtteranceId, VoiceDescriptor,
    VoicesChanged,
};
