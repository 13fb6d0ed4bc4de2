//! Reader and capture configuration loaded from the environment or a TOML file.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | QUIZREADER_RATE | 1.0 | Speech rate multiplier (0.1–10.0). |
//! | QUIZREADER_VOICE | unset | Preferred voice id; used when the engine lists it. |
//! | QUIZREADER_LANGUAGE | en | Language prefix for fallback voice selection. |
//! | QUIZREADER_MAX_CHUNK_WORDS | 15 | Forced chunk break without punctuation (0 disables). |
//! | QUIZREADER_CHUNK_PAUSE_MS | 150 | Pause between sequential chunk utterances. |
//! | QUIZREADER_WATCHDOG_MS | unset | Reveal a started chunk if no boundary arrives in time. |
//! | QUIZREADER_WORD_INTERVAL_MS | 150 | Estimator interval per word at rate 1.0. |
//! | QUIZREADER_RECOGNITION_LANGUAGE | en-US | Recognizer language tag. |

use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_rate() -> f32 {
    1.0
}

fn default_language_prefix() -> String {
    "en".to_string()
}

fn default_max_chunk_words() -> Option<usize> {
    Some(15)
}

fn default_inter_chunk_pause() -> Duration {
    Duration::from_millis(150)
}

fn default_base_word_interval() -> Duration {
    Duration::from_millis(150)
}

fn default_recognition_language() -> String {
    "en-US".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_alternatives() -> u32 {
    1
}

/// Configuration for the reveal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Speech rate multiplier passed to every utterance
    #[serde(default = "default_rate")]
    pub rate: f32,
    /// Voice id to use when the engine lists it
    #[serde(default)]
    pub preferred_voice: Option<String>,
    /// Language prefix for fallback voice selection (matched against voice language tags)
    #[serde(default = "default_language_prefix")]
    pub language_prefix: String,
    /// Force a chunk break after this many words without punctuation
    #[serde(default = "default_max_chunk_words")]
    pub max_chunk_words: Option<usize>,
    /// Delay between the end of one chunk and the start of the next
    #[serde(default = "default_inter_chunk_pause", with = "duration_ms")]
    pub inter_chunk_pause: Duration,
    /// When set, a started chunk waits this long for boundary events before
    /// revealing the whole chunk. When unset, chunk start reveals immediately.
    #[serde(default, with = "opt_duration_ms")]
    pub boundary_watchdog: Option<Duration>,
    /// Estimated time per word at rate 1.0 for the timer strategy
    #[serde(default = "default_base_word_interval", with = "duration_ms")]
    pub base_word_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            preferred_voice: None,
            language_prefix: default_language_prefix(),
            max_chunk_words: default_max_chunk_words(),
            inter_chunk_pause: default_inter_chunk_pause(),
            boundary_watchdog: None,
            base_word_interval: default_base_word_interval(),
        }
    }
}

impl ReaderConfig {
    /// Load from environment. Unset or invalid => defaults (see module docs).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rate: env_parse("QUIZREADER_RATE").unwrap_or(defaults.rate),
            preferred_voice: env_opt_string("QUIZREADER_VOICE"),
            language_prefix: env_opt_string("QUIZREADER_LANGUAGE")
                .unwrap_or(defaults.language_prefix),
            max_chunk_words: match env_parse::<usize>("QUIZREADER_MAX_CHUNK_WORDS") {
                Some(0) => None,
                Some(n) => Some(n),
                None => defaults.max_chunk_words,
            },
            inter_chunk_pause: env_millis("QUIZREADER_CHUNK_PAUSE_MS")
                .unwrap_or(defaults.inter_chunk_pause),
            boundary_watchdog: env_millis("QUIZREADER_WATCHDOG_MS"),
            base_word_interval: env_millis("QUIZREADER_WORD_INTERVAL_MS")
                .unwrap_or(defaults.base_word_interval),
        }
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> VoiceResult<()> {
        if !(0.1..=10.0).contains(&self.rate) {
            return Err(VoiceError::Config(format!(
                "Speech rate must be within 0.1..=10.0, got {}",
                self.rate
            )));
        }
        if self.max_chunk_words == Some(0) {
            return Err(VoiceError::Config(
                "max_chunk_words must be at least 1 (use None to disable)".to_string(),
            ));
        }
        if self.base_word_interval.is_zero() {
            return Err(VoiceError::Config(
                "base_word_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Estimator interval between word reveals at the configured rate.
    pub fn word_interval(&self) -> Duration {
        let nanos = self.base_word_interval.as_nanos() as f64 / f64::from(self.rate.max(0.1));
        Duration::from_nanos(nanos.round() as u64)
    }
}

/// Configuration for the voice capture adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Recognizer language tag (e.g. en-US)
    #[serde(default = "default_recognition_language")]
    pub language: String,
    /// Deliver interim transcripts while the user is still speaking
    #[serde(default = "default_true")]
    pub interim_results: bool,
    /// Alternatives per result slot
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: default_recognition_language(),
            interim_results: true,
            max_alternatives: default_max_alternatives(),
        }
    }
}

impl CaptureConfig {
    /// Load from environment. Unset => defaults.
    pub fn from_env() -> Self {
        Self {
            language: env_opt_string("QUIZREADER_RECOGNITION_LANGUAGE")
                .unwrap_or_else(default_recognition_language),
            ..Self::default()
        }
    }
}

/// Combined settings file (`quizreader.toml`).
///
/// ```toml
/// [reader]
/// rate = 1.2
/// inter_chunk_pause = 200
///
/// [capture]
/// language = "en-GB"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Settings {
    /// Default settings file name, resolved against the working directory.
    pub const FILE_NAME: &'static str = "quizreader.toml";

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> VoiceResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.reader.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> VoiceResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.reader.validate()?;
        Ok(settings)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_opt_string(name).and_then(|v| v.parse().ok())
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_defaults() {
        let c = ReaderConfig::default();
        assert!((c.rate - 1.0).abs() < 1e-6);
        assert_eq!(c.language_prefix, "en");
        assert_eq!(c.max_chunk_words, Some(15));
        assert_eq!(c.inter_chunk_pause, Duration::from_millis(150));
        assert_eq!(c.boundary_watchdog, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn word_interval_scales_inversely_with_rate() {
        let mut c = ReaderConfig::default();
        assert_eq!(c.word_interval(), Duration::from_millis(150));
        c.rate = 2.0;
        assert_eq!(c.word_interval(), Duration::from_millis(75));
    }

    #[test]
    fn invalid_reader_config_is_rejected() {
        let c = ReaderConfig { rate: 0.0, ..Default::default() };
        assert!(c.validate().is_err());
        let c = ReaderConfig { max_chunk_words: Some(0), ..Default::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn settings_from_toml_fill_defaults() {
        let s = Settings::from_toml(
            r#"
            [reader]
            rate = 1.5
            boundary_watchdog = 100

            [capture]
            language = "en-GB"
            "#,
        )
        .unwrap();
        assert!((s.reader.rate - 1.5).abs() < 1e-6);
        assert_eq!(s.reader.boundary_watchdog, Some(Duration::from_millis(100)));
        assert_eq!(s.reader.inter_chunk_pause, Duration::from_millis(150));
        assert_eq!(s.capture.language, "en-GB");
        assert!(s.capture.interim_results);
    }

    #[test]
    fn settings_reject_bad_rate() {
        assert!(Settings::from_toml("[reader]\nrate = 50.0\n").is_err());
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let s = Settings::load_from_path(Path::new("/nonexistent/quizreader.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }
}
