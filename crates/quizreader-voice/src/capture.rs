//! **Voice Capture**: Single-utterance speech recognition for spoken answers.
//!
//! [`VoiceCapture`] owns one [`SpeechRecognizer`] and runs at most one
//! recognition session at a time. Engine callbacks arrive through a
//! [`RecognitionEvents`] handle and are applied only while their session is
//! current; callbacks from an aborted or replaced session are dropped, so a
//! late result after [`VoiceCapture::stop`] never produces a final transcript.

use crate::config::CaptureConfig;
use crate::error::VoiceResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One result slot reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionSlot {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionSlot {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Error kinds a recognizer may report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Silence timeout
    NoSpeech,
    /// Session aborted (expected after stop)
    Aborted,
    /// Microphone permission denied
    NotAllowed,
    Other(String),
}

#[derive(Debug)]
enum RecognitionSignal {
    Start,
    Results {
        resume_index: usize,
        slots: Vec<RecognitionSlot>,
    },
    End,
    Error(RecognitionErrorKind),
}

/// Handle through which platform glue reports callbacks for one recognition session.
#[derive(Debug, Clone)]
pub struct RecognitionEvents {
    session: u64,
    tx: mpsc::UnboundedSender<(u64, RecognitionSignal)>,
}

impl RecognitionEvents {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn started(&self) {
        self.report(RecognitionSignal::Start);
    }

    /// Report the result list; slots before `resume_index` were already delivered.
    pub fn results(&self, resume_index: usize, slots: Vec<RecognitionSlot>) {
        self.report(RecognitionSignal::Results {
            resume_index,
            slots,
        });
    }

    pub fn ended(&self) {
        self.report(RecognitionSignal::End);
    }

    pub fn failed(&self, kind: RecognitionErrorKind) {
        self.report(RecognitionSignal::Error(kind));
    }

    fn report(&self, signal: RecognitionSignal) {
        if self.tx.send((self.session, signal)).is_err() {
            debug!(session = self.session, "Recognition event after capture drop");
        }
    }
}

/// Platform speech-to-text engine.
pub trait SpeechRecognizer: Send {
    /// Whether recognition is available on this platform. Queried once.
    fn is_supported(&self) -> bool;

    /// Begin a single, non-continuous recognition session.
    fn start(&mut self, options: &CaptureConfig, events: RecognitionEvents) -> VoiceResult<()>;

    /// Abort the current session, if any.
    fn abort(&mut self);
}

/// Recognizer for platforms without speech recognition.
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _options: &CaptureConfig, _events: RecognitionEvents) -> VoiceResult<()> {
        Ok(())
    }

    fn abort(&mut self) {}
}

/// Observable capture state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureState {
    pub supported: bool,
    pub listening: bool,
    /// Latest interim or final text
    pub transcript: String,
    pub permission_denied: bool,
}

/// Events emitted by [`VoiceCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Transcript so far (also sent with the final text just before `Final`)
    Interim(String),
    /// Trimmed final transcript, ready to submit
    Final(String),
    /// Recognition ended without speech
    Silence,
    /// Microphone access refused; fall back to typed input
    PermissionDenied,
    /// Unexpected engine failure
    Failed(String),
}

/// An emitted capture event with its time.
#[derive(Debug, Clone)]
pub struct CaptureNotice {
    pub event: CaptureEvent,
    pub timestamp: DateTime<Utc>,
}

struct RecognitionSession {
    id: u64,
    manually_stopped: bool,
    got_final: bool,
    errored: bool,
}

/// Voice answer capture around a [`SpeechRecognizer`].
pub struct VoiceCapture<R: SpeechRecognizer> {
    recognizer: R,
    config: CaptureConfig,
    session: Option<RecognitionSession>,
    next_session_id: u64,

    state: CaptureState,
    state_tx: watch::Sender<CaptureState>,

    signal_tx: mpsc::UnboundedSender<(u64, RecognitionSignal)>,
    signal_rx: mpsc::UnboundedReceiver<(u64, RecognitionSignal)>,
    notice_tx: mpsc::UnboundedSender<CaptureNotice>,
}

impl<R: SpeechRecognizer> VoiceCapture<R> {
    pub fn new(
        recognizer: R,
        config: CaptureConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureNotice>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let state = CaptureState {
            supported: recognizer.is_supported(),
            ..CaptureState::default()
        };
        let (state_tx, _) = watch::channel(state.clone());

        if !state.supported {
            info!("Speech recognition unsupported; typed answers only");
        }

        let capture = Self {
            recognizer,
            config,
            session: None,
            next_session_id: 1,
            state,
            state_tx,
            signal_tx,
            signal_rx,
            notice_tx,
        };
        (capture, notice_rx)
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state_tx.subscribe()
    }

    pub fn is_supported(&self) -> bool {
        self.state.supported
    }

    pub fn is_listening(&self) -> bool {
        self.state.listening
    }

    pub fn transcript(&self) -> &str {
        &self.state.transcript
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn recognizer_mut(&mut self) -> &mut R {
        &mut self.recognizer
    }

    /// Begin listening for one utterance. No-op when unsupported.
    pub fn start(&mut self) {
        if !self.state.supported {
            debug!("Recognition start ignored (unsupported)");
            return;
        }
        if self.session.take().is_some_and(|s| !s.manually_stopped) {
            self.recognizer.abort();
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        self.session = Some(RecognitionSession {
            id,
            manually_stopped: false,
            got_final: false,
            errored: false,
        });
        self.state.permission_denied = false;
        self.publish();

        let events = RecognitionEvents {
            session: id,
            tx: self.signal_tx.clone(),
        };
        info!(session = id, language = %self.config.language, "🎤 Listening for answer");

        if let Err(e) = self.recognizer.start(&self.config, events) {
            warn!(session = id, error = %e, "Recognition failed to start");
            self.session = None;
            self.state.listening = false;
            self.publish();
            self.emit(CaptureEvent::Failed(e.to_string()));
        }
    }

    /// Stop listening. Idempotent.
    ///
    /// The session is kept, marked as stopped, until the engine reports its end,
    /// so that end is treated as a cancellation rather than silence.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_mut().filter(|s| !s.manually_stopped) {
            session.manually_stopped = true;
            self.recognizer.abort();
            debug!(session = session.id, "Recognition stopped");
        }
        if self.state.listening {
            self.state.listening = false;
            self.publish();
        }
    }

    /// Stop and clear the transcript.
    pub fn reset(&mut self) {
        self.stop();
        if !self.state.transcript.is_empty() {
            self.state.transcript.clear();
            self.publish();
        }
    }

    /// Apply every queued recognizer callback.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((session, signal)) = self.signal_rx.try_recv() {
            self.apply(session, signal);
            applied += 1;
        }
        applied
    }

    /// Wait for the next recognizer callback and apply it.
    pub async fn next_event(&mut self) {
        if let Some((session, signal)) = self.signal_rx.recv().await {
            self.apply(session, signal);
        }
    }

    fn apply(&mut self, id: u64, signal: RecognitionSignal) {
        let Some(session) = self.session.as_mut().filter(|s| s.id == id) else {
            debug!(session = id, ?signal, "Stale recognition event ignored");
            return;
        };

        if session.manually_stopped {
            // Only the engine's end (or abort error) is awaited; results are dropped
            if matches!(signal, RecognitionSignal::End | RecognitionSignal::Error(_)) {
                debug!(session = id, "Stopped recognition session closed");
                self.session = None;
            }
            return;
        }

        match signal {
            RecognitionSignal::Start => {
                self.state.listening = true;
                self.publish();
            }
            RecognitionSignal::Results {
                resume_index,
                slots,
            } => {
                let fresh = slots.get(resume_index..).unwrap_or_default();
                let final_text: String = fresh
                    .iter()
                    .filter(|s| s.is_final)
                    .map(|s| s.transcript.as_str())
                    .collect();
                let interim_text: String = fresh
                    .iter()
                    .filter(|s| !s.is_final)
                    .map(|s| s.transcript.as_str())
                    .collect();

                if !final_text.is_empty() {
                    session.got_final = true;
                    let submitted = final_text.trim().to_string();
                    self.state.transcript = final_text.clone();
                    self.publish();
                    info!(session = id, transcript = %submitted, "Final transcript");
                    self.emit(CaptureEvent::Interim(final_text));
                    self.emit(CaptureEvent::Final(submitted));
                } else if !interim_text.is_empty() {
                    self.state.transcript = interim_text.clone();
                    self.publish();
                    self.emit(CaptureEvent::Interim(interim_text));
                }
            }
            RecognitionSignal::End => {
                let silent = !session.got_final && !session.errored;
                self.session = None;
                self.state.listening = false;
                self.publish();
                if silent {
                    debug!(session = id, "Recognition ended without a result");
                    self.emit(CaptureEvent::Silence);
                }
            }
            RecognitionSignal::Error(kind) => {
                session.errored = true;
                self.state.listening = false;
                match kind {
                    RecognitionErrorKind::Aborted => {
                        debug!(session = id, "Recognition aborted");
                    }
                    RecognitionErrorKind::NoSpeech => {
                        debug!(session = id, "No speech detected");
                        self.emit(CaptureEvent::Silence);
                    }
                    RecognitionErrorKind::NotAllowed => {
                        warn!(session = id, "Microphone permission denied");
                        self.state.permission_denied = true;
                        self.emit(CaptureEvent::PermissionDenied);
                    }
                    RecognitionErrorKind::Other(message) => {
                        warn!(session = id, %message, "Speech recognition failed");
                        self.emit(CaptureEvent::Failed(message));
                    }
                }
                self.publish();
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn emit(&self, event: CaptureEvent) {
        let notice = CaptureNotice {
            event,
            timestamp: Utc::now(),
        };
        if self.notice_tx.send(notice).is_err() {
            debug!("Capture notice dropped (receiver closed)");
        }
    }
}

impl<R: SpeechRecognizer> Drop for VoiceCapture<R> {
    fn drop(&mut self) {
        if self.session.take().is_some_and(|s| !s.manually_stopped) {
            self.recognizer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ScriptedRecognizer {
        starts: usize,
        aborts: usize,
        handles: Vec<RecognitionEvents>,
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn is_supported(&self) -> bool {
            true
        }

        fn start(
            &mut self,
            _options: &CaptureConfig,
            events: RecognitionEvents,
        ) -> VoiceResult<()> {
            self.starts += 1;
            self.handles.push(events);
            Ok(())
        }

        fn abort(&mut self) {
            self.aborts += 1;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<CaptureNotice>) -> Vec<CaptureEvent> {
        std::iter::from_fn(|| rx.try_recv().ok().map(|n| n.event)).collect()
    }

    #[test]
    fn unsupported_start_is_noop() {
        let (mut capture, mut rx) =
            VoiceCapture::new(UnsupportedRecognizer, CaptureConfig::default());
        assert!(!capture.is_supported());
        capture.start();
        capture.process_pending();
        assert!(!capture.is_listening());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn final_result_emits_interim_then_trimmed_final() {
        let (mut capture, mut rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.start();
        let events = capture.recognizer().handles[0].clone();
        events.started();
        events.results(0, vec![RecognitionSlot::interim("moby")]);
        events.results(0, vec![RecognitionSlot::final_result(" moby dick ")]);
        capture.process_pending();

        assert_eq!(capture.transcript(), " moby dick ");
        assert_eq!(
            drain(&mut rx),
            vec![
                CaptureEvent::Interim("moby".into()),
                CaptureEvent::Interim(" moby dick ".into()),
                CaptureEvent::Final("moby dick".into()),
            ]
        );
    }

    #[test]
    fn resume_index_skips_delivered_slots() {
        let (mut capture, mut rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.start();
        let events = capture.recognizer().handles[0].clone();
        events.results(
            1,
            vec![RecognitionSlot::final_result("old"), RecognitionSlot::interim("new")],
        );
        events.results(5, vec![RecognitionSlot::interim("ignored")]);
        capture.process_pending();
        assert_eq!(drain(&mut rx), vec![CaptureEvent::Interim("new".into())]);
    }

    #[test]
    fn engine_end_without_result_is_silence() {
        let (mut capture, mut rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.start();
        let events = capture.recognizer().handles[0].clone();
        events.started();
        events.ended();
        capture.process_pending();
        assert!(!capture.is_listening());
        assert_eq!(drain(&mut rx), vec![CaptureEvent::Silence]);
    }

    #[test]
    fn error_kinds_are_classified() {
        let (mut capture, mut rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());

        capture.start();
        let events = capture.recognizer().handles[0].clone();
        events.started();
        events.failed(RecognitionErrorKind::NotAllowed);
        events.ended();
        capture.process_pending();
        assert!(capture.state().permission_denied);
        assert!(!capture.is_listening());
        assert_eq!(drain(&mut rx), vec![CaptureEvent::PermissionDenied]);

        capture.start();
        let events = capture.recognizer().handles[1].clone();
        events.failed(RecognitionErrorKind::Aborted);
        events.ended();
        capture.process_pending();
        assert!(drain(&mut rx).is_empty());

        capture.start();
        let events = capture.recognizer().handles[2].clone();
        events.failed(RecognitionErrorKind::Other("network".into()));
        capture.process_pending();
        assert_eq!(drain(&mut rx), vec![CaptureEvent::Failed("network".into())]);
    }

    #[test]
    fn restart_aborts_previous_session() {
        let (mut capture, _rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.start();
        capture.start();
        assert_eq!(capture.recognizer().starts, 2);
        assert_eq!(capture.recognizer().aborts, 1);
    }

    #[test]
    fn stop_and_reset_are_idempotent() {
        let (mut capture, _rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.stop();
        capture.reset();
        assert!(!capture.is_listening());
        assert_eq!(capture.recognizer().aborts, 0);

        capture.start();
        capture.stop();
        capture.stop();
        assert_eq!(capture.recognizer().aborts, 1);
    }

    #[test]
    fn drop_aborts_active_session() {
        let recognizer = ScriptedRecognizer::default();
        let (mut capture, _rx) = VoiceCapture::new(recognizer, CaptureConfig::default());
        capture.start();
        let events = capture.recognizer().handles[0].clone();
        drop(capture);
        // Events after drop are discarded without panicking.
        events.ended();
    }

    #[test]
    fn engine_end_after_manual_stop_is_not_silence() {
        let (mut capture, mut rx) =
            VoiceCapture::new(ScriptedRecognizer::default(), CaptureConfig::default());
        capture.start();
        let events = capture.recognizer().handles[0].clone();
        events.started();
        capture.process_pending();

        capture.stop();
        events.started();
        events.results(0, vec![RecognitionSlot::interim("dick")]);
        events.ended();
        capture.process_pending();

        assert!(!capture.is_listening());
        assert!(drain(&mut rx).is_empty());
        assert_eq!(capture.recognizer().aborts, 1);

        // The engine already confirmed the stop, so a fresh start aborts nothing
        capture.start();
        assert_eq!(capture.recognizer().aborts, 1);
    }
}
