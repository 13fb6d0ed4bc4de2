//! **Reveal Engine**: Drives the synthesizer and keeps the revealed-word timeline.
//!
//! Every synthesizer callback, timer expiry and voice-list change is delivered
//! as an [`EngineEvent`] on one channel and applied by a single reducer. Each
//! event carries the id of the playback session that produced it; the reducer
//! drops events whose session is no longer live, so a superseded utterance
//! can never move the cursor or flip `done`.
//!
//! ```text
//!  speak(words) ──► Strategy::select(capabilities)
//!                    ├─ SingleUtterance : one utterance, boundary → offset table → word
//!                    ├─ Chunked         : one utterance per chunk, start → reveal chunk,
//!                    │                    end → pause → next chunk
//!                    └─ TimerFallback   : one utterance + rate-estimated ticks until the
//!                                         first real boundary arrives
//! ```
//!
//! The engine spawns its timers on the ambient tokio runtime.

use crate::chunker::{build_chunks, Chunk};
use crate::config::ReaderConfig;
use crate::cursor::RevealCursor;
use crate::error::VoiceResult;
use crate::synthesizer::{
    select_voice, PlatformCapabilities, SpeechSynthesizer, SynthErrorKind, SynthEventKind,
    Utterance, UtteranceEvents, UtteranceId, VoiceDescriptor, VoicesChanged,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Events applied by the engine's reducer.
#[derive(Debug)]
pub(crate) enum EngineEvent {
    Synth {
        utterance: UtteranceId,
        kind: SynthEventKind,
    },
    Timer {
        session: u64,
        timer: TimerKind,
    },
    VoicesChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    NextChunk(usize),
    Watchdog(usize),
    EstimateTick,
}

/// How a playback session is turned into synthesizer calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// One utterance for the whole sequence, word position from boundary offsets
    SingleUtterance,
    /// One utterance per chunk, played sequentially, whole chunk revealed on start
    Chunked,
    /// One utterance, position estimated from elapsed time until a boundary is seen
    TimerFallback,
}

impl Strategy {
    /// Pick the strategy the platform's timing guarantees support.
    pub fn select(capabilities: PlatformCapabilities) -> Self {
        if capabilities.word_boundaries {
            Self::SingleUtterance
        } else if capabilities.utterance_events {
            Self::Chunked
        } else {
            Self::TimerFallback
        }
    }
}

/// Observable engine state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    pub speaking: bool,
    pub paused: bool,
    pub done: bool,
    /// Highest word index revealed so far; `None` before the first reveal
    pub word_index: Option<usize>,
    /// Length of the current word sequence
    pub word_count: usize,
}

/// One-shot notices for the engine's owner.
#[derive(Debug, Clone)]
pub enum RevealNotice {
    /// Session reached its end; every word is revealed
    Finished {
        session: u64,
        word_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// Engine reported an unexpected failure; playback is over
    Failed {
        session: u64,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionMode {
    Local(Strategy),
    Feed,
}

#[derive(Debug, Default)]
struct SessionTimers {
    next_chunk: Option<AbortHandle>,
    watchdog: Option<AbortHandle>,
    estimator: Option<AbortHandle>,
}

impl SessionTimers {
    fn abort_all(&mut self) {
        for handle in [
            self.next_chunk.take(),
            self.watchdog.take(),
            self.estimator.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

fn abort(slot: &mut Option<AbortHandle>) {
    if let Some(handle) = slot.take() {
        handle.abort();
    }
}

struct PlaybackSession {
    id: u64,
    mode: SessionMode,
    words: Vec<String>,
    chunks: Vec<Chunk>,
    /// Character offset of each word, per utterance
    offsets: Vec<Vec<usize>>,
    cursor: RevealCursor,
    cancelled: bool,
    finished: bool,
    /// Chunk whose start was due while paused
    held_chunk: Option<usize>,
    boundary_seen: bool,
    timers: SessionTimers,
}

impl PlaybackSession {
    fn new(id: u64, mode: SessionMode, words: Vec<String>) -> Self {
        Self {
            id,
            mode,
            words,
            chunks: Vec::new(),
            offsets: Vec::new(),
            cursor: RevealCursor::new(),
            cancelled: false,
            finished: false,
            held_chunk: None,
            boundary_seen: false,
            timers: SessionTimers::default(),
        }
    }

    fn is_live(&self) -> bool {
        !self.cancelled && !self.finished
    }

    fn strategy(&self) -> Option<Strategy> {
        match self.mode {
            SessionMode::Local(strategy) => Some(strategy),
            SessionMode::Feed => None,
        }
    }

    fn last_index(&self) -> Option<usize> {
        self.words.len().checked_sub(1)
    }
}

/// Character offset of each word in `words.join(" ")`.
fn word_offsets<S: AsRef<str>>(words: &[S]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(words.len());
    let mut position = 0;
    for word in words {
        offsets.push(position);
        position += word.as_ref().chars().count() + 1;
    }
    offsets
}

/// Word whose offset is the highest one not exceeding `char_index`.
fn word_at_offset(offsets: &[usize], char_index: usize) -> usize {
    offsets
        .partition_point(|&offset| offset <= char_index)
        .saturating_sub(1)
}

/// Reads word sequences through a [`SpeechSynthesizer`] and maintains the
/// advance-only revealed index.
pub struct RevealEngine<S: SpeechSynthesizer> {
    synth: S,
    config: ReaderConfig,
    capabilities: PlatformCapabilities,
    voices: Vec<VoiceDescriptor>,

    session: Option<PlaybackSession>,
    next_session_id: u64,

    state: RevealState,
    state_tx: watch::Sender<RevealState>,

    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    notice_tx: mpsc::UnboundedSender<RevealNotice>,
}

impl<S: SpeechSynthesizer> RevealEngine<S> {
    /// Create an engine owning `synth`. Returns the engine and a receiver of notices.
    pub fn new(
        synth: S,
        config: ReaderConfig,
        capabilities: PlatformCapabilities,
    ) -> VoiceResult<(Self, mpsc::UnboundedReceiver<RevealNotice>)> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(RevealState::default());
        let voices = synth.voices();

        info!(
            strategy = ?Strategy::select(capabilities),
            voices = voices.len(),
            "Reveal engine ready"
        );

        let engine = Self {
            synth,
            config,
            capabilities,
            voices,
            session: None,
            next_session_id: 1,
            state: RevealState::default(),
            state_tx,
            events_tx,
            events_rx,
            notice_tx,
        };

        Ok((engine, notice_rx))
    }

    /// Current observable state
    pub fn state(&self) -> &RevealState {
        &self.state
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.state_tx.subscribe()
    }

    /// Highest revealed word index
    pub fn word_index(&self) -> Option<usize> {
        self.state.word_index
    }

    /// Word sequence of the current (or last stopped) session
    pub fn words(&self) -> &[String] {
        self.session
            .as_ref()
            .map(|s| s.words.as_slice())
            .unwrap_or(&[])
    }

    /// Words revealed so far, joined with spaces
    pub fn revealed_text(&self) -> String {
        let Some(session) = self.session.as_ref() else {
            return String::new();
        };
        let revealed = session.cursor.revealed().min(session.words.len());
        session.words[..revealed].join(" ")
    }

    /// Enumerated voices, refreshed when the engine reports a change
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    /// Strategy of the current session (`None` for idle or remote feed)
    pub fn strategy(&self) -> Option<Strategy> {
        self.session.as_ref().and_then(PlaybackSession::strategy)
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Capabilities used for strategy selection from the next `speak` on.
    pub fn set_capabilities(&mut self, capabilities: PlatformCapabilities) {
        self.capabilities = capabilities;
    }

    /// Handle for platform glue to report voice-list changes.
    pub fn voices_changed_handle(&self) -> VoicesChanged {
        VoicesChanged::new(self.events_tx.clone())
    }

    pub fn synthesizer(&self) -> &S {
        &self.synth
    }

    pub fn synthesizer_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    // ── control surface ────────────────────────────────────────────────

    /// Start reading `words`, superseding any current session.
    pub fn speak<W: AsRef<str>>(&mut self, words: &[W]) {
        self.supersede();

        let id = self.allocate_session_id();
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();
        let strategy = Strategy::select(self.capabilities);

        self.state = RevealState {
            speaking: true,
            paused: false,
            done: false,
            word_index: None,
            word_count: words.len(),
        };

        if words.is_empty() {
            debug!(session = id, "Nothing to read");
            let mut session = PlaybackSession::new(id, SessionMode::Local(strategy), words);
            session.finished = true;
            self.session = Some(session);
            self.state.speaking = false;
            self.state.done = true;
            self.publish();
            self.notify(RevealNotice::Finished {
                session: id,
                word_count: 0,
                timestamp: Utc::now(),
            });
            return;
        }

        info!(session = id, words = words.len(), ?strategy, "🔊 Reading question");

        let mut session = PlaybackSession::new(id, SessionMode::Local(strategy), words);
        match strategy {
            Strategy::SingleUtterance | Strategy::TimerFallback => {
                session.offsets = vec![word_offsets(&session.words)];
            }
            Strategy::Chunked => {
                session.chunks = build_chunks(&session.words, self.config.max_chunk_words);
                session.offsets = session
                    .chunks
                    .iter()
                    .map(|chunk| word_offsets(&session.words[chunk.start_index..=chunk.end_index]))
                    .collect();
            }
        }
        let text = match strategy {
            Strategy::Chunked => session.chunks[0].text.clone(),
            _ => session.words.join(" "),
        };
        self.session = Some(session);
        self.publish();

        if strategy == Strategy::TimerFallback {
            let handle = self.schedule_ticker(id, self.config.word_interval());
            if let Some(session) = self.session.as_mut() {
                session.timers.estimator = Some(handle);
            }
        }

        self.speak_utterance(id, 0, text);
    }

    /// Pause the engine. The session keeps its position.
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_ref().filter(|s| s.is_live()) else {
            return;
        };
        if self.state.paused {
            return;
        }
        if session.mode != SessionMode::Feed {
            self.synth.pause();
        }
        self.state.paused = true;
        self.publish();
    }

    /// Resume after `pause`.
    pub fn resume(&mut self) {
        let Some(session) = self.session.as_mut().filter(|s| s.is_live()) else {
            return;
        };
        if !self.state.paused {
            return;
        }
        let held = session.held_chunk.take();
        let is_feed = session.mode == SessionMode::Feed;
        let id = session.id;

        if !is_feed {
            self.synth.resume();
        }
        self.state.paused = false;
        self.publish();

        if let Some(index) = held {
            self.start_chunk(id, index);
        }
    }

    /// Cancel playback. Returns the last revealed word index.
    pub fn stop(&mut self) -> Option<usize> {
        if let Some(session) = self.session.as_mut() {
            if session.is_live() {
                session.cancelled = true;
                session.timers.abort_all();
                if session.mode != SessionMode::Feed {
                    self.synth.cancel();
                }
                info!(session = session.id, index = ?self.state.word_index, "Playback stopped");
            }
        }
        if self.state.speaking || self.state.paused {
            self.state.speaking = false;
            self.state.paused = false;
            self.publish();
        }
        self.state.word_index
    }

    /// Stop and clear the word sequence and revealed index.
    pub fn reset(&mut self) {
        self.stop();
        self.session = None;
        self.state = RevealState::default();
        self.publish();
    }

    // ── remote feed ────────────────────────────────────────────────────

    /// Start a server-driven session; words arrive through [`Self::feed_word`].
    pub fn begin_feed(&mut self) {
        self.supersede();
        let id = self.allocate_session_id();
        self.session = Some(PlaybackSession::new(id, SessionMode::Feed, Vec::new()));
        self.state = RevealState {
            speaking: true,
            ..RevealState::default()
        };
        debug!(session = id, "Remote feed started");
        self.publish();
    }

    /// Append a server-pushed word and reveal it. Ignored outside a live feed.
    pub fn feed_word(&mut self, word: &str) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.is_live() && s.mode == SessionMode::Feed)
        else {
            debug!("Word outside a remote feed dropped");
            return;
        };
        for token in word.split_whitespace() {
            session.words.push(token.to_string());
        }
        self.state.word_count = session.words.len();
        if let Some(last) = session.last_index() {
            self.reveal(last);
        }
        self.publish();
    }

    /// End the current remote feed.
    pub fn finish_feed(&mut self) {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.is_live() && s.mode == SessionMode::Feed)
        {
            self.finish();
        }
    }

    // ── event pump ─────────────────────────────────────────────────────

    /// Apply every event already queued. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it.
    pub async fn next_event(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.apply(event);
        }
    }

    /// Apply events until the current session is no longer speaking.
    ///
    /// Does not return while paused.
    pub async fn run_until_idle(&mut self) {
        while self.state.speaking {
            self.next_event().await;
        }
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::VoicesChanged => self.refresh_voices(),
            EngineEvent::Synth { utterance, kind } => {
                if !self.is_live_session(utterance.session) {
                    debug!(session = utterance.session, ?kind, "Stale synth event ignored");
                    return;
                }
                match kind {
                    SynthEventKind::Start => self.on_start(utterance.index),
                    SynthEventKind::Boundary { char_index } => {
                        self.on_boundary(utterance.index, char_index)
                    }
                    SynthEventKind::End => self.on_end(utterance.index),
                    SynthEventKind::Error(kind) => self.on_error(kind),
                }
            }
            EngineEvent::Timer { session, timer } => {
                if !self.is_live_session(session) {
                    return;
                }
                match timer {
                    TimerKind::NextChunk(index) => self.on_next_chunk(session, index),
                    TimerKind::Watchdog(index) => self.on_watchdog(index),
                    TimerKind::EstimateTick => self.on_estimate_tick(),
                }
            }
        }
    }

    fn is_live_session(&self, id: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == id && s.is_live())
    }

    fn on_start(&mut self, index: usize) {
        let watchdog = self.config.boundary_watchdog;
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.strategy() != Some(Strategy::Chunked) {
            return;
        }
        let Some(end_index) = session.chunks.get(index).map(|c| c.end_index) else {
            return;
        };
        let id = session.id;

        match watchdog {
            Some(after) => {
                let handle = self.schedule(id, TimerKind::Watchdog(index), after);
                if let Some(session) = self.session.as_mut() {
                    abort(&mut session.timers.watchdog);
                    session.timers.watchdog = Some(handle);
                }
            }
            None => self.reveal(end_index),
        }
    }

    fn on_boundary(&mut self, index: usize, char_index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(offsets) = session.offsets.get(index) else {
            return;
        };
        let base = match session.strategy() {
            Some(Strategy::Chunked) => session.chunks.get(index).map_or(0, |c| c.start_index),
            _ => 0,
        };
        let word = base + word_at_offset(offsets, char_index);

        if !session.boundary_seen {
            session.boundary_seen = true;
            if session.timers.estimator.is_some() {
                debug!(session = session.id, "Boundary observed, estimator retired");
            }
        }
        abort(&mut session.timers.estimator);
        abort(&mut session.timers.watchdog);

        self.reveal(word);
    }

    fn on_end(&mut self, index: usize) {
        let pause = self.config.inter_chunk_pause;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.strategy() != Some(Strategy::Chunked) {
            self.finish();
            return;
        }

        abort(&mut session.timers.watchdog);
        let Some(end_index) = session.chunks.get(index).map(|c| c.end_index) else {
            return;
        };
        let is_last = index + 1 >= session.chunks.len();
        let id = session.id;
        self.reveal(end_index);

        if is_last {
            self.finish();
            return;
        }

        let handle = self.schedule(id, TimerKind::NextChunk(index + 1), pause);
        if let Some(session) = self.session.as_mut() {
            abort(&mut session.timers.next_chunk);
            session.timers.next_chunk = Some(handle);
        }
    }

    fn on_error(&mut self, kind: SynthErrorKind) {
        if kind.is_expected() {
            debug!(?kind, "Utterance cancelled");
            return;
        }
        let message = match kind {
            SynthErrorKind::Other(message) => message,
            other => format!("{other:?}"),
        };
        self.fail(message);
    }

    fn on_next_chunk(&mut self, id: u64, index: usize) {
        let paused = self.state.paused;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.timers.next_chunk = None;
        if paused {
            session.held_chunk = Some(index);
            return;
        }
        self.start_chunk(id, index);
    }

    fn on_watchdog(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.timers.watchdog = None;
        if let Some(end_index) = session.chunks.get(index).map(|c| c.end_index) {
            debug!(session = session.id, chunk = index, "Watchdog revealed chunk");
            self.reveal(end_index);
        }
    }

    fn on_estimate_tick(&mut self) {
        if self.state.paused {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.boundary_seen {
            return;
        }
        let Some(last) = session.last_index() else {
            return;
        };
        let candidate = session.cursor.index().map_or(0, |i| i + 1).min(last);
        self.reveal(candidate);
    }

    // ── helpers ────────────────────────────────────────────────────────

    fn start_chunk(&mut self, id: u64, index: usize) {
        let Some(chunk) = self.session.as_ref().and_then(|s| s.chunks.get(index)) else {
            return;
        };
        debug!(session = id, chunk = index, words = chunk.len(), "Starting next chunk");
        let text = chunk.text.clone();
        self.speak_utterance(id, index, text);
    }

    fn speak_utterance(&mut self, session: u64, index: usize, text: String) {
        let id = UtteranceId { session, index };
        let voice = select_voice(
            &self.voices,
            self.config.preferred_voice.as_deref(),
            &self.config.language_prefix,
        )
        .cloned();
        let utterance = Utterance {
            id,
            text,
            rate: self.config.rate,
            voice,
        };
        let events = UtteranceEvents::new(id, self.events_tx.clone());

        if let Err(e) = self.synth.speak(utterance, events) {
            self.fail(e.to_string());
        }
    }

    fn reveal(&mut self, candidate: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(last) = session.last_index() else {
            return;
        };
        if session.cursor.advance(candidate.min(last)) {
            self.state.word_index = session.cursor.index();
            self.publish();
        }
    }

    fn finish(&mut self) {
        let Some(last) = self.session.as_ref().and_then(PlaybackSession::last_index) else {
            self.close_session();
            return self.mark_done();
        };
        self.reveal(last);
        self.close_session();
        self.mark_done();
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.finished = true;
            session.held_chunk = None;
            session.timers.abort_all();
        }
    }

    fn mark_done(&mut self) {
        let (session, word_count) = self
            .session
            .as_ref()
            .map_or((0, 0), |s| (s.id, s.words.len()));
        self.state.speaking = false;
        self.state.paused = false;
        self.state.done = true;
        self.publish();
        info!(session, word_count, "✅ Question fully revealed");
        self.notify(RevealNotice::Finished {
            session,
            word_count,
            timestamp: Utc::now(),
        });
    }

    fn fail(&mut self, message: String) {
        self.close_session();
        let session = self.session.as_ref().map_or(0, |s| s.id);
        warn!(session, %message, "Speech synthesis failed");
        self.state.speaking = false;
        self.state.paused = false;
        self.publish();
        self.notify(RevealNotice::Failed {
            session,
            message,
            timestamp: Utc::now(),
        });
    }

    /// Invalidate the current session before a new one starts.
    fn supersede(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_live() {
                session.cancelled = true;
                session.timers.abort_all();
                if session.mode != SessionMode::Feed {
                    self.synth.cancel();
                }
                debug!(session = session.id, "Session superseded");
            }
        }
    }

    fn allocate_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    fn refresh_voices(&mut self) {
        self.voices = self.synth.voices();
        debug!(voices = self.voices.len(), "Voice list refreshed");
    }

    fn schedule(&self, session: u64, timer: TimerKind, after: Duration) -> AbortHandle {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(EngineEvent::Timer { session, timer });
        })
        .abort_handle()
    }

    fn schedule_ticker(&self, session: u64, every: Duration) -> AbortHandle {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + every;
            let mut interval = tokio::time::interval_at(start, every);
            loop {
                interval.tick().await;
                let event = EngineEvent::Timer {
                    session,
                    timer: TimerKind::EstimateTick,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        })
        .abort_handle()
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn notify(&self, notice: RevealNotice) {
        if self.notice_tx.send(notice).is_err() {
            debug!("Reveal notice dropped (receiver closed)");
        }
    }
}

impl<S: SpeechSynthesizer> Drop for RevealEngine<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.timers.abort_all();
            if session.is_live() && session.mode != SessionMode::Feed {
                self.synth.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_joined_text() {
        let words = ["The", "quick", "brown"];
        assert_eq!(word_offsets(&words), vec![0, 4, 10]);
    }

    #[test]
    fn offset_lookup_uses_highest_offset_not_above() {
        let offsets = vec![0, 4, 10];
        assert_eq!(word_at_offset(&offsets, 0), 0);
        assert_eq!(word_at_offset(&offsets, 3), 0);
        assert_eq!(word_at_offset(&offsets, 4), 1);
        assert_eq!(word_at_offset(&offsets, 9), 1);
        assert_eq!(word_at_offset(&offsets, 200), 2);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let words = ["café", "olé"];
        assert_eq!(word_offsets(&words), vec![0, 5]);
    }

    #[test]
    fn strategy_selection() {
        assert_eq!(
            Strategy::select(PlatformCapabilities::desktop()),
            Strategy::SingleUtterance
        );
        assert_eq!(Strategy::select(PlatformCapabilities::mobile()), Strategy::Chunked);
        assert_eq!(
            Strategy::select(PlatformCapabilities::default()),
            Strategy::TimerFallback
        );
    }
}
