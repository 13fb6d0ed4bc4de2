//! **Speech synthesizer seam**: The platform TTS engine as an owned dependency.
//!
//! The reveal engine owns one [`SpeechSynthesizer`] and hands it one
//! [`Utterance`] at a time together with an [`UtteranceEvents`] handle. The
//! platform glue reports start, word boundary, end, and error through that
//! handle; the engine ignores anything reported for an utterance that belongs
//! to a superseded session.

use crate::error::VoiceResult;
use crate::reveal::EngineEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A voice enumerated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Engine-unique identifier (a voice URI on browser engines)
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// BCP 47 language tag, e.g. `en-US`
    pub lang: String,
    /// Engine default voice
    #[serde(default)]
    pub is_default: bool,
}

/// Pick a voice: the preferred id when listed, else the first voice whose
/// language starts with `language_prefix`, else `None` (engine default).
pub fn select_voice<'a>(
    voices: &'a [VoiceDescriptor],
    preferred: Option<&str>,
    language_prefix: &str,
) -> Option<&'a VoiceDescriptor> {
    if let Some(id) = preferred {
        if let Some(voice) = voices.iter().find(|v| v.id == id) {
            return Some(voice);
        }
    }
    let prefix = language_prefix.to_ascii_lowercase();
    voices
        .iter()
        .find(|v| v.lang.to_ascii_lowercase().starts_with(&prefix))
}

/// Identifies one utterance within one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId {
    /// Playback session that issued the utterance
    pub session: u64,
    /// Chunk index within the session (0 for single-utterance playback)
    pub index: usize,
}

/// One request to vocalize text.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub rate: f32,
    /// `None` leaves voice choice to the engine
    pub voice: Option<VoiceDescriptor>,
}

/// Error kinds an engine may report for an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthErrorKind {
    /// The utterance was cancelled (expected after stop/reset)
    Canceled,
    /// The utterance was interrupted by a newer one (expected after speak)
    Interrupted,
    /// Anything else
    Other(String),
}

impl SynthErrorKind {
    /// Whether this error is an expected outcome of the engine's own control calls.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Canceled | Self::Interrupted)
    }
}

/// Callback kinds for an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthEventKind {
    Start,
    /// Engine reached `char_index` (Unicode scalar offset into the utterance text)
    Boundary { char_index: usize },
    End,
    Error(SynthErrorKind),
}

/// Handle through which platform glue reports callbacks for one utterance.
///
/// Cheap to clone. Reports after the owning engine is dropped are discarded.
#[derive(Debug, Clone)]
pub struct UtteranceEvents {
    id: UtteranceId,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl UtteranceEvents {
    pub(crate) fn new(id: UtteranceId, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> UtteranceId {
        self.id
    }

    pub fn started(&self) {
        self.report(SynthEventKind::Start);
    }

    pub fn boundary(&self, char_index: usize) {
        self.report(SynthEventKind::Boundary { char_index });
    }

    pub fn ended(&self) {
        self.report(SynthEventKind::End);
    }

    pub fn failed(&self, kind: SynthErrorKind) {
        self.report(SynthEventKind::Error(kind));
    }

    fn report(&self, kind: SynthEventKind) {
        if self
            .tx
            .send(EngineEvent::Synth {
                utterance: self.id,
                kind,
            })
            .is_err()
        {
            debug!(session = self.id.session, "Synth event after engine drop");
        }
    }
}

/// Handle through which platform glue reports that the voice list changed.
#[derive(Debug, Clone)]
pub struct VoicesChanged {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl VoicesChanged {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn notify(&self) {
        let _ = self.tx.send(EngineEvent::VoicesChanged);
    }
}

/// Platform text-to-speech engine. Exactly one utterance is meaningfully
/// active at a time; `cancel` drops the current and all pending utterances.
pub trait SpeechSynthesizer: Send {
    /// Currently enumerated voices. May be empty until the engine reports a change.
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Start vocalizing `utterance`, reporting callbacks through `events`.
    fn speak(&mut self, utterance: Utterance, events: UtteranceEvents) -> VoiceResult<()>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn cancel(&mut self);
}

/// Timing guarantees of the platform engine, supplied by platform detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Word boundary callbacks arrive reliably with character offsets
    pub word_boundaries: bool,
    /// Per-utterance start/end callbacks are trustworthy
    pub utterance_events: bool,
}

impl PlatformCapabilities {
    /// Desktop-class engines: fine-grained boundaries available.
    pub fn desktop() -> Self {
        Self {
            word_boundaries: true,
            utterance_events: true,
        }
    }

    /// Mobile-class engines: start/end only.
    pub fn mobile() -> Self {
        Self {
            word_boundaries: false,
            utterance_events: true,
        }
    }
}

/// Placeholder engine: every utterance starts and ends immediately with no
/// boundaries. Use for headless runs where reveal timing does not matter.
#[derive(Debug, Default)]
pub struct PlaceholderSynthesizer;

impl SpeechSynthesizer for PlaceholderSynthesizer {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        Vec::new()
    }

    fn speak(&mut self, _utterance: Utterance, events: UtteranceEvents) -> VoiceResult<()> {
        events.started();
        events.ended();
        Ok(())
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn cancel(&mut self) {}
}
