//! Card presentation on top of a [`ReviewSession`].
//!
//! The presenter decides what the learner sees: which side of the card is up,
//! which orientation the cards use, and the short feedback pulse between a
//! judgment and the next card.
//!
//! ```text
//! Idle --start--> Studying --judge--> AwaitingAdvance --timer--> Studying
//!                                                          |
//!                                                          +--> RoundSummary --continue--> Studying
//!                                                                     |
//!                                                                     +--> SessionComplete
//! ```
//!
//! The session is judged immediately; only the visual advance waits for the
//! timer. At most one timer is outstanding, and timers that do not belong to
//! this presenter are ignored.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{AudioOutput, FeedbackCue, SpeechRequest};
use crate::config::{Config, Orientation, SpeechConfig};
use crate::error::{RecallError, Result};
use crate::events::{CardJudgedPayload, CardShownPayload, EventBroadcaster, ReviewEvent};
use crate::lookup::{image_references, ImageReference};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::session::{Judgment, ReviewSession, SessionPhase};
use crate::vocabulary::VocabularyItem;

// ============================================================================
// State types
// ============================================================================

/// Lifecycle state of a [`CardPresenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterState {
    /// Created, not started.
    Idle,
    /// A card is shown and can be flipped or judged.
    Studying,
    /// A card was judged; the feedback pulse is showing.
    AwaitingAdvance,
    /// The round is over.
    RoundSummary,
    /// Every card has been known once.
    SessionComplete,
}

impl PresenterState {
    /// Returns `true` once the session is complete.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionComplete)
    }
}

impl std::fmt::Display for PresenterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Studying => "studying",
            Self::AwaitingAdvance => "awaiting advance",
            Self::RoundSummary => "showing the round summary",
            Self::SessionComplete => "the session is complete",
        };
        f.write_str(s)
    }
}

/// Visual feedback after a judgment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    /// No pulse.
    #[default]
    None,
    /// The card was known.
    Correct,
    /// The card was forgotten.
    Wrong,
}

/// Which side of the card is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSide {
    /// The prompt.
    Front,
    /// The answer.
    Back,
}

/// What a face of the card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceContent {
    /// The word with its pronunciation and pictures.
    Word {
        /// The word.
        word: String,
        /// Phonetic transcription.
        ipa: Option<String>,
        /// Thumbnails for the word.
        images: Vec<ImageReference>,
    },
    /// The meaning of the word.
    Meaning {
        /// Definition.
        definition: String,
        /// Example sentence.
        example: String,
    },
}

/// The visible face of the current card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    /// Side that is up.
    pub side: CardSide,
    /// What that side shows.
    pub content: FaceContent,
    /// The word was forgotten earlier in the session.
    pub previously_forgotten: bool,
}

/// Tunables for a presenter.
#[derive(Debug, Clone)]
pub struct PresenterOptions {
    /// How long the feedback pulse lasts before advancing.
    pub feedback_delay: Duration,
    /// Starting orientation.
    pub orientation: Orientation,
    /// Play a cue on each judgment.
    pub sound_enabled: bool,
    /// Speech pacing and auto-speak.
    pub speech: SpeechConfig,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PresenterOptions {
    /// Builds options from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            feedback_delay: config.feedback_delay(),
            orientation: config.orientation,
            sound_enabled: config.sound.enabled,
            speech: config.speech.clone(),
        }
    }
}

/// The card currently on screen.
#[derive(Debug, Clone, Copy)]
struct ShownCard {
    index: usize,
    position: usize,
    round_length: usize,
}

/// State handed back by [`CardPresenter::close`].
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Presenter state at close time.
    pub state: PresenterState,
    /// Orientation at close time.
    pub orientation: Orientation,
    /// The session, if one was started.
    pub session: Option<ReviewSession>,
}

impl SessionSnapshot {
    /// Returns `true` if the session had completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.state.is_terminal()
    }
}

// ============================================================================
// CardPresenter
// ============================================================================

/// Drives one flashcard session.
pub struct CardPresenter<S: Scheduler, A: AudioOutput> {
    items: Arc<[VocabularyItem]>,
    session: Option<ReviewSession>,
    state: PresenterState,
    flipped: bool,
    orientation: Orientation,
    feedback: Feedback,
    shown: Option<ShownCard>,
    pending_timer: Option<TimerHandle>,
    scheduler: S,
    audio: A,
    options: PresenterOptions,
    events: Option<EventBroadcaster>,
}

impl<S: Scheduler, A: AudioOutput> std::fmt::Debug for CardPresenter<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPresenter")
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("flipped", &self.flipped)
            .field("orientation", &self.orientation)
            .field("feedback", &self.feedback)
            .field("pending_timer", &self.pending_timer)
            .finish_non_exhaustive()
    }
}

impl<S: Scheduler, A: AudioOutput> CardPresenter<S, A> {
    /// Creates an idle presenter over a lesson's vocabulary.
    #[must_use]
    pub fn new(
        items: Arc<[VocabularyItem]>,
        scheduler: S,
        audio: A,
        options: PresenterOptions,
    ) -> Self {
        Self {
            items,
            session: None,
            state: PresenterState::Idle,
            flipped: false,
            orientation: options.orientation,
            feedback: Feedback::None,
            shown: None,
            pending_timer: None,
            scheduler,
            audio,
            options,
            events: None,
        }
    }

    /// Publishes review events through `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = Some(events);
        self
    }

    /// Starts round 1 over every item in lesson order.
    ///
    /// # Errors
    ///
    /// Returns a contract violation unless idle, and
    /// `RecallError::EmptyVocabulary` if there are no items.
    pub fn start(&mut self) -> Result<()> {
        if self.state != PresenterState::Idle {
            return Err(RecallError::contract("start", self.state));
        }

        let session = ReviewSession::start(self.items.len())?;
        self.session = Some(session);
        self.state = PresenterState::Studying;
        self.flipped = false;
        self.feedback = Feedback::None;
        self.emit(ReviewEvent::session_started(self.items.len(), self.orientation));
        self.show_current_card()
    }

    /// Turns the card over and returns whether the back is now up.
    ///
    /// Speaks the card when the back is revealed and auto-speak is on.
    ///
    /// # Errors
    ///
    /// Returns a contract violation unless studying.
    pub fn flip(&mut self) -> Result<bool> {
        self.require(PresenterState::Studying, "flip")?;
        self.flipped = !self.flipped;
        debug!(flipped = self.flipped, "Card flipped");

        if self.flipped && self.options.speech.auto_speak_on_flip {
            self.speak_current()?;
        }
        Ok(self.flipped)
    }

    /// Judges the current card and starts the feedback pulse.
    ///
    /// The session records the verdict at once; the presenter moves on when the
    /// returned timer is passed to [`on_timer`](Self::on_timer).
    ///
    /// # Errors
    ///
    /// Returns a contract violation unless studying, which includes while a
    /// previous judgment's timer is still pending.
    pub fn judge(&mut self, outcome: Judgment) -> Result<TimerHandle> {
        self.require(PresenterState::Studying, "judge")?;
        let shown = self
            .shown
            .ok_or_else(|| RecallError::contract("judge", self.state))?;
        let word = self.item(shown.index)?.word.clone();

        let handle = self.scheduler.schedule(self.options.feedback_delay)?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| RecallError::contract("judge", PresenterState::Idle))?;
        let phase = match session.judge(outcome, &word) {
            Ok(phase) => phase,
            Err(e) => {
                self.cancel_timer(handle);
                return Err(e);
            }
        };
        let round = session.round();

        self.feedback = match outcome {
            Judgment::Known => Feedback::Correct,
            Judgment::Forgot => Feedback::Wrong,
        };
        if self.options.sound_enabled {
            self.audio
                .play_cue(FeedbackCue::for_known(outcome == Judgment::Known));
        }
        self.pending_timer = Some(handle);
        self.state = PresenterState::AwaitingAdvance;
        debug!(%handle, ?outcome, ?phase, "Awaiting advance");

        self.emit(ReviewEvent::CardJudged(CardJudgedPayload {
            round,
            item_index: shown.index,
            word,
            judgment: outcome,
        }));
        Ok(handle)
    }

    /// Handles a fired timer.
    ///
    /// Returns `false` and changes nothing if `handle` is not this presenter's
    /// pending timer.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.state != PresenterState::AwaitingAdvance || self.pending_timer != Some(handle) {
            debug!(%handle, state = %self.state, "Ignoring timer not owned by this presenter");
            return false;
        }

        self.pending_timer = None;
        self.feedback = Feedback::None;
        self.flipped = false;

        let Some(session) = self.session.as_ref() else {
            return false;
        };
        match session.phase() {
            SessionPhase::Studying => {
                self.state = PresenterState::Studying;
                if let Err(e) = self.show_current_card() {
                    warn!(error = %e, "Could not show the next card");
                }
            }
            SessionPhase::RoundSummary => {
                self.state = PresenterState::RoundSummary;
                self.shown = None;
                if let Some(record) = session.history().last() {
                    let event = ReviewEvent::round_complete(
                        record.round,
                        record.reviewed,
                        record.forgotten.len(),
                    );
                    self.emit(event);
                }
            }
            SessionPhase::SessionComplete => {
                self.state = PresenterState::SessionComplete;
                self.shown = None;
            }
        }
        true
    }

    /// Leaves the round summary for the next round, or completes the session.
    ///
    /// # Errors
    ///
    /// Returns a contract violation unless the round summary is showing.
    pub fn continue_session(&mut self) -> Result<PresenterState> {
        self.require(PresenterState::RoundSummary, "continue_session")?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| RecallError::contract("continue_session", PresenterState::Idle))?;

        match session.advance_round()? {
            SessionPhase::SessionComplete => {
                let event =
                    ReviewEvent::session_complete(session.round(), session.ever_forgotten().to_vec());
                self.state = PresenterState::SessionComplete;
                info!(rounds = session.round(), "All cards known");
                self.emit(event);
            }
            SessionPhase::Studying | SessionPhase::RoundSummary => {
                self.state = PresenterState::Studying;
                self.flipped = false;
                self.show_current_card()?;
            }
        }
        Ok(self.state)
    }

    /// Switches orientation for the rest of the session. The card goes face down.
    ///
    /// # Errors
    ///
    /// Returns a contract violation once the session is complete.
    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        if self.state.is_terminal() {
            return Err(RecallError::contract("set_orientation", self.state));
        }
        self.orientation = orientation;
        self.flipped = false;
        debug!(%orientation, "Orientation changed");
        Ok(())
    }

    /// Flips between forward and reverse orientation.
    ///
    /// # Errors
    ///
    /// Returns a contract violation once the session is complete.
    pub fn toggle_orientation(&mut self) -> Result<Orientation> {
        self.set_orientation(self.orientation.toggled())?;
        Ok(self.orientation)
    }

    /// Speaks the current word followed by its example sentence.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when no card is shown.
    pub fn speak_current(&self) -> Result<()> {
        let item = self.current()?;
        self.audio.speak(SpeechRequest::word_and_example(
            &item.word,
            &item.example,
            &self.options.speech,
        ));
        Ok(())
    }

    /// Ends the session early or after completion and returns its final state.
    pub fn close(mut self) -> SessionSnapshot {
        if let Some(handle) = self.pending_timer.take() {
            self.cancel_timer(handle);
        }
        let round = self.session.as_ref().map_or(0, ReviewSession::round);
        self.emit(ReviewEvent::session_closed(self.state.is_terminal(), round));
        info!(state = %self.state, round, "Review session closed");

        SessionSnapshot {
            state: self.state,
            orientation: self.orientation,
            session: self.session.take(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The card on screen.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when no card is shown.
    pub fn current(&self) -> Result<&VocabularyItem> {
        let shown = self.shown_card("current")?;
        self.item(shown.index)
    }

    /// The visible face of the card on screen.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when no card is shown.
    pub fn current_face(&self) -> Result<CardFace> {
        let item = self.current()?;
        let side = if self.flipped {
            CardSide::Back
        } else {
            CardSide::Front
        };
        let word_side = match self.orientation {
            Orientation::Forward => CardSide::Front,
            Orientation::Reverse => CardSide::Back,
        };

        let content = if side == word_side {
            FaceContent::Word {
                word: item.word.clone(),
                ipa: item.ipa.clone(),
                images: image_references(&item.word).to_vec(),
            }
        } else {
            FaceContent::Meaning {
                definition: item.definition.clone(),
                example: item.example.clone(),
            }
        };

        Ok(CardFace {
            side,
            content,
            previously_forgotten: self
                .session
                .as_ref()
                .is_some_and(|s| s.was_forgotten(&item.word)),
        })
    }

    /// `(position, round_length)` of the card on screen, 1-based.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when no card is shown.
    pub fn progress(&self) -> Result<(usize, usize)> {
        let shown = self.shown_card("progress")?;
        Ok((shown.position, shown.round_length))
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PresenterState {
        self.state
    }

    /// Phase of the underlying session, once started.
    #[must_use]
    pub fn phase(&self) -> Option<SessionPhase> {
        self.session.as_ref().map(ReviewSession::phase)
    }

    /// The underlying session, once started.
    #[must_use]
    pub const fn session(&self) -> Option<&ReviewSession> {
        self.session.as_ref()
    }

    /// Whether the back of the card is up.
    #[must_use]
    pub const fn flipped(&self) -> bool {
        self.flipped
    }

    /// Current orientation.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Current feedback pulse.
    #[must_use]
    pub const fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// The outstanding advance timer, if any.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending_timer
    }

    /// The vocabulary being studied.
    #[must_use]
    pub fn items(&self) -> &[VocabularyItem] {
        &self.items
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require(&self, expected: PresenterState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RecallError::contract(operation, self.state))
        }
    }

    fn shown_card(&self, operation: &'static str) -> Result<ShownCard> {
        match (self.state, self.shown) {
            (PresenterState::Studying | PresenterState::AwaitingAdvance, Some(shown)) => {
                Ok(shown)
            }
            _ => Err(RecallError::contract(operation, self.state)),
        }
    }

    fn item(&self, index: usize) -> Result<&VocabularyItem> {
        self.items
            .get(index)
            .ok_or_else(|| RecallError::contract("current", format!("item {index} is out of range")))
    }

    fn show_current_card(&mut self) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| RecallError::contract("show card", self.state))?;
        let index = session.current_item_index()?;
        let (position, round_length) = session.progress()?;
        let round = session.round();
        let word = self.item(index)?.word.clone();
        let previously_forgotten = session.was_forgotten(&word);

        self.shown = Some(ShownCard {
            index,
            position,
            round_length,
        });
        debug!(round, position, round_length, index, "Card shown");
        self.emit(ReviewEvent::CardShown(CardShownPayload {
            round,
            position,
            round_length,
            item_index: index,
            word,
            previously_forgotten,
        }));
        Ok(())
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        match self.scheduler.cancel(handle) {
            Ok(true) => debug!(%handle, "Advance timer cancelled"),
            Ok(false) => debug!(%handle, "Advance timer had already fired"),
            Err(e) => warn!(%handle, error = %e, "Failed to cancel advance timer"),
        }
    }

    fn emit(&self, event: ReviewEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }
}

impl<S: Scheduler, A: AudioOutput> Drop for CardPresenter<S, A> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_timer.take() {
            self.cancel_timer(handle);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
