//! Configuration types for Recall.
//!
//! Settings live in `recall.json` and control where lessons and reports are
//! stored, how long the feedback pulse lasts, the starting card orientation,
//! and the sound and speech behaviour of a review session.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "recall.json";

/// Upper bound for the feedback delay in milliseconds.
const MAX_FEEDBACK_DELAY_MS: u64 = 5000;

/// Upper bound for speech rates.
const MAX_SPEECH_RATE: f32 = 2.0;

/// Default lessons directory.
fn default_lessons_dir() -> String {
    "lessons".to_string()
}

/// Default output directory for reports.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Default delay between a judgment and advancing to the next card.
const fn default_feedback_delay_ms() -> u64 {
    400
}

const fn default_word_rate() -> f32 {
    0.9
}

const fn default_example_rate() -> f32 {
    0.95
}

const fn default_gap_ms() -> u64 {
    500
}

const fn default_true() -> bool {
    true
}

/// Main configuration for Recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one JSON file per lesson.
    #[serde(default = "default_lessons_dir")]
    pub lessons_dir: String,

    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// How long the feedback pulse is shown before the next card, in milliseconds.
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,

    /// Orientation a new session starts in.
    #[serde(default)]
    pub orientation: Orientation,

    /// Feedback sound settings.
    #[serde(default)]
    pub sound: SoundConfig,

    /// Speech settings.
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lessons_dir: default_lessons_dir(),
            output_dir: default_output_dir(),
            feedback_delay_ms: default_feedback_delay_ms(),
            orientation: Orientation::default(),
            sound: SoundConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `recall.json` in the current directory. If not found, returns
    /// the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            RecallError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `recall.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `RecallError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON, and `RecallError::ConfigValidationError` if a
    /// value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(RecallError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| RecallError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `RecallError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.lessons_dir.trim().is_empty() {
            return Err(RecallError::config_validation(
                "lessonsDir must not be empty",
                "Provide a lessons directory in your recall.json",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(RecallError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your recall.json (use '.' for current directory)",
            ));
        }

        if self.feedback_delay_ms == 0 || self.feedback_delay_ms > MAX_FEEDBACK_DELAY_MS {
            return Err(RecallError::config_validation(
                format!(
                    "feedbackDelayMs must be between 1 and {MAX_FEEDBACK_DELAY_MS}, got {}",
                    self.feedback_delay_ms
                ),
                "Set feedbackDelayMs to a value like 400 in your recall.json",
            ));
        }

        validate_rate("speech.wordRate", self.speech.word_rate)?;
        validate_rate("speech.exampleRate", self.speech.example_rate)?;

        Ok(())
    }

    /// Returns the feedback delay as a `Duration`.
    #[must_use]
    pub const fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

fn validate_rate(key: &str, rate: f32) -> Result<()> {
    if rate.is_finite() && rate > 0.0 && rate <= MAX_SPEECH_RATE {
        Ok(())
    } else {
        Err(RecallError::config_validation(
            format!("{key} must be greater than 0 and at most {MAX_SPEECH_RATE}, got {rate}"),
            format!("Set {key} to a value like 1.0 in your recall.json"),
        ))
    }
}

/// Which side of a card is the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Word on the front, definition and example on the back (default).
    #[default]
    Forward,
    /// Definition and example on the front, word on the back.
    Reverse,
}

impl Orientation {
    /// Parses a string into an `Orientation`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "reverse" => Some(Self::Reverse),
            _ => None,
        }
    }

    /// Returns the other orientation.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Returns the lowercase name used in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid orientation '{s}': expected one of 'forward', 'reverse'"
            ))
        })
    }
}

impl Serialize for Orientation {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Feedback sound configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundConfig {
    /// Whether judgment cues are played.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

/// Speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    /// Speak the word and example automatically when the back face is revealed.
    #[serde(default)]
    pub auto_speak_on_flip: bool,

    /// Speech rate for the word.
    #[serde(default = "default_word_rate")]
    pub word_rate: f32,

    /// Speech rate for the example sentence.
    #[serde(default = "default_example_rate")]
    pub example_rate: f32,

    /// Pause between the word and the example, in milliseconds.
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            auto_speak_on_flip: false,
            word_rate: default_word_rate(),
            example_rate: default_example_rate(),
            gap_ms: default_gap_ms(),
        }
    }
}
