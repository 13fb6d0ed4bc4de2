//! Example: Read a Question
//!
//! Reads a question through a simulated engine that reports a word boundary
//! every 200ms, printing the revealed text as it grows. Pass `--mobile` to
//! use chunked playback instead of boundary tracking.

use quizreader_voice::{
    PlatformCapabilities, PreparedQuestion, ReaderConfig, RevealEngine, SpeechSynthesizer,
    Utterance, UtteranceEvents, VoiceDescriptor, VoiceResult,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const QUESTION: &str = "This author described a white whale hunted by Captain Ahab. \
    For 10 points, name this author (*) of Moby-Dick.";

/// Pretends to speak: one boundary per word, then end.
#[derive(Default)]
struct SimulatedEngine {
    current: Option<JoinHandle<()>>,
}

impl SpeechSynthesizer for SimulatedEngine {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        vec![VoiceDescriptor {
            id: "sim-en".into(),
            name: "Simulated".into(),
            lang: "en-US".into(),
            is_default: true,
        }]
    }

    fn speak(&mut self, utterance: Utterance, events: UtteranceEvents) -> VoiceResult<()> {
        self.cancel();
        self.current = Some(tokio::spawn(async move {
            events.started();
            let mut offset = 0;
            for word in utterance.text.split(' ') {
                events.boundary(offset);
                offset += word.chars().count() + 1;
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            events.ended();
        }));
        Ok(())
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.abort();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let capabilities = if std::env::args().any(|a| a == "--mobile") {
        PlatformCapabilities::mobile()
    } else {
        PlatformCapabilities::desktop()
    };

    let question = PreparedQuestion::from_raw(QUESTION);
    let (mut engine, _notices) =
        RevealEngine::new(SimulatedEngine::default(), ReaderConfig::from_env(), capabilities)?;
    let mut state = engine.subscribe();

    engine.speak(&question.words);

    let printer = tokio::spawn(async move {
        let mut last = None;
        while state.changed().await.is_ok() {
            let index = state.borrow().word_index;
            if index != last {
                last = index;
                if let Some(i) = index {
                    println!("revealed through word {i}");
                }
            }
        }
    });

    engine.run_until_idle().await;
    info!("Done: {}", engine.revealed_text());
    info!(
        "Buzz at word 5 would be {}",
        if question.is_power_buzz(Some(5)) { "a power" } else { "a regular buzz" }
    );

    drop(engine);
    let _ = printer.await;
    Ok(())
}
