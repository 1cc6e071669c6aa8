//! Recall review core
//!
//! Round-robin flashcard review over a lesson's vocabulary: the session state
//! machine, card presentation with timed feedback, lesson storage, and the
//! validation of vocabulary coming from outside.

use std::sync::Arc;

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod lookup;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod vocabulary;

pub use audio::{AudioOutput, FeedbackCue, NullAudio, RecordingAudio, SpeechRequest, ToneCue};
pub use config::{Config, Orientation, SoundConfig, SpeechConfig};
pub use error::{RecallError, Result};
pub use events::{EventBroadcaster, ReviewEvent};
pub use lookup::{DictionaryEntry, DictionaryLookup, ImageReference};
pub use presenter::{
    CardFace, CardPresenter, CardSide, FaceContent, Feedback, PresenterOptions, PresenterState,
    SessionSnapshot,
};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use session::{Judgment, ReviewSession, RoundRecord, SessionPhase};
pub use store::{Capabilities, JsonLessonStore, LessonStore};
pub use vocabulary::{
    parse_extraction_payload, ExtractedVocabulary, ExtractionRequest, Lesson, RejectedEntry,
    VocabularyExtractor, VocabularyItem,
};

/// A running review session.
pub type SessionHandle<S, A> = CardPresenter<S, A>;

/// Creates a presenter over `items` and starts round 1.
///
/// # Errors
///
/// Returns `RecallError::EmptyVocabulary` if `items` is empty.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use recall_core::{create_session, ManualScheduler, NullAudio, PresenterOptions, VocabularyItem};
///
/// let items: Arc<[VocabularyItem]> = Arc::from(vec![
///     VocabularyItem::new("serene", "calm", "The lake was serene."),
/// ]);
/// let session = create_session(items, ManualScheduler::new(), NullAudio, PresenterOptions::default())
///     .unwrap();
/// assert_eq!(session.progress().unwrap(), (1, 1));
/// ```
pub fn create_session<S: Scheduler, A: AudioOutput>(
    items: Arc<[VocabularyItem]>,
    scheduler: S,
    audio: A,
    options: PresenterOptions,
) -> Result<SessionHandle<S, A>> {
    let mut presenter = CardPresenter::new(items, scheduler, audio, options);
    presenter.start()?;
    Ok(presenter)
}
