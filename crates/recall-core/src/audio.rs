//! Sound cues and speech output.
//!
//! The review core only describes what should be heard; an [`AudioOutput`]
//! implementation decides how. Both operations are fire-and-forget: audio
//! failures are the implementation's problem and never reach the session.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;

/// Sound played when a card is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCue {
    /// Bright rising "ding" for a known card.
    Correct,
    /// Low falling "buzz" for a forgotten card.
    Wrong,
}

/// Oscillator waveform of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Pure sine.
    Sine,
    /// Sawtooth.
    Sawtooth,
}

/// How a parameter moves from its start to its end value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ramp {
    /// Exponential ramp.
    Exponential,
    /// Linear ramp.
    Linear,
}

/// Synthesis parameters of a feedback tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneCue {
    /// Oscillator waveform.
    pub waveform: Waveform,
    /// Starting frequency in Hz.
    pub start_hz: f32,
    /// Frequency reached at the end of `sweep`.
    pub end_hz: f32,
    /// Duration of the frequency sweep.
    pub sweep: Duration,
    /// Curve of the frequency sweep and the gain fade.
    pub ramp: Ramp,
    /// Initial gain.
    pub gain: f32,
    /// Gain at the end of the tone.
    pub end_gain: f32,
    /// Total length of the tone.
    pub duration: Duration,
}

impl FeedbackCue {
    /// Returns the cue for a judgment.
    #[must_use]
    pub const fn for_known(known: bool) -> Self {
        if known {
            Self::Correct
        } else {
            Self::Wrong
        }
    }

    /// Synthesis parameters for this cue.
    #[must_use]
    pub const fn tone(self) -> ToneCue {
        match self {
            Self::Correct => ToneCue {
                waveform: Waveform::Sine,
                start_hz: 500.0,
                end_hz: 1000.0,
                sweep: Duration::from_millis(100),
                ramp: Ramp::Exponential,
                gain: 0.3,
                end_gain: 0.01,
                duration: Duration::from_millis(500),
            },
            Self::Wrong => ToneCue {
                waveform: Waveform::Sawtooth,
                start_hz: 150.0,
                end_hz: 100.0,
                sweep: Duration::from_millis(200),
                ramp: Ramp::Linear,
                gain: 0.3,
                end_gain: 0.01,
                duration: Duration::from_millis(300),
            },
        }
    }
}

/// A single utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// BCP 47 language tag.
    pub lang: String,
    /// Speech rate, 1.0 being normal.
    pub rate: f32,
}

/// An ordered speech request. Starting one interrupts whatever is being spoken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Utterances to speak in order.
    pub utterances: Vec<Utterance>,
    /// Pause between consecutive utterances.
    pub gap: Duration,
}

impl SpeechRequest {
    const LANG: &'static str = "en-US";

    /// A single utterance at normal rate.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            utterances: vec![Utterance {
                text: text.into(),
                lang: Self::LANG.to_string(),
                rate: 1.0,
            }],
            gap: Duration::ZERO,
        }
    }

    /// The word followed by its example sentence, paced per `speech`.
    #[must_use]
    pub fn word_and_example(word: &str, example: &str, speech: &SpeechConfig) -> Self {
        Self {
            utterances: vec![
                Utterance {
                    text: word.to_string(),
                    lang: Self::LANG.to_string(),
                    rate: speech.word_rate,
                },
                Utterance {
                    text: example.to_string(),
                    lang: Self::LANG.to_string(),
                    rate: speech.example_rate,
                },
            ],
            gap: Duration::from_millis(speech.gap_ms),
        }
    }
}

/// Where cues and speech go.
pub trait AudioOutput {
    /// Plays a feedback cue.
    fn play_cue(&self, cue: FeedbackCue);

    /// Speaks a request, cancelling any speech still in progress.
    fn speak(&self, request: SpeechRequest);
}

/// Discards all audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn play_cue(&self, _cue: FeedbackCue) {}

    fn speak(&self, _request: SpeechRequest) {}
}

/// Something heard through a [`RecordingAudio`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// A cue was played.
    Cue(FeedbackCue),
    /// A speech request was started.
    Speech(SpeechRequest),
}

/// Records everything it is asked to play, for assertions and transcripts.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    log: Rc<RefCell<Vec<AudioEvent>>>,
}

impl RecordingAudio {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<AudioEvent> {
        self.log.borrow().clone()
    }

    /// Only the cues, in order.
    #[must_use]
    pub fn cues(&self) -> Vec<FeedbackCue> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                AudioEvent::Cue(cue) => Some(*cue),
                AudioEvent::Speech(_) => None,
            })
            .collect()
    }

    /// The most recent speech request.
    #[must_use]
    pub fn last_speech(&self) -> Option<SpeechRequest> {
        self.log.borrow().iter().rev().find_map(|e| match e {
            AudioEvent::Speech(req) => Some(req.clone()),
            AudioEvent::Cue(_) => None,
        })
    }
}

impl AudioOutput for RecordingAudio {
    fn play_cue(&self, cue: FeedbackCue) {
        self.log.borrow_mut().push(AudioEvent::Cue(cue));
    }

    fn speak(&self, request: SpeechRequest) {
        self.log.borrow_mut().push(AudioEvent::Speech(request));
    }
}
