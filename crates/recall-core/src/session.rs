//! Round-robin review session.
//!
//! A session walks the lesson's vocabulary in rounds. Round 1 is every item in
//! lesson order; every later round is exactly the items judged
//! [`Judgment::Forgot`] in the round before, in the order they were judged. The
//! session completes after the first round in which nothing was forgotten.
//!
//! ```text
//! Studying --judge(last item)--> RoundSummary --advance_round--> Studying
//!                                     |
//!                                     +--(nothing forgotten)--> SessionComplete
//! ```
//!
//! Items are referred to by their position in the lesson, never by their word,
//! because a lesson may contain the same word twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RecallError, Result};

// ============================================================================
// SessionPhase
// ============================================================================

/// Phase of a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Cards of the current round are being judged.
    Studying,
    /// Every card of the round has been judged; waiting for the learner to continue.
    RoundSummary,
    /// A round finished with nothing forgotten.
    SessionComplete,
}

impl SessionPhase {
    /// Returns `true` if the session has ended.
    ///
    /// # Examples
    ///
    /// ```
    /// use recall_core::SessionPhase;
    ///
    /// assert!(SessionPhase::SessionComplete.is_terminal());
    /// assert!(!SessionPhase::RoundSummary.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionComplete)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Studying => "studying",
            Self::RoundSummary => "showing the round summary",
            Self::SessionComplete => "the session is complete",
        };
        f.write_str(s)
    }
}

/// The learner's verdict on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    /// The learner recalled the item.
    Known,
    /// The learner did not recall the item; it comes back next round.
    Forgot,
}

// ============================================================================
// RoundRecord
// ============================================================================

/// Record of a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-indexed).
    pub round: u32,

    /// Number of cards judged in this round.
    pub reviewed: usize,

    /// Item indices judged forgot, in judgment order.
    pub forgotten: Vec<usize>,

    /// When the round started.
    pub started_at: DateTime<Utc>,

    /// When the last card of the round was judged.
    pub ended_at: DateTime<Utc>,
}

impl RoundRecord {
    /// Number of cards judged known in this round.
    #[must_use]
    pub fn known(&self) -> usize {
        self.reviewed.saturating_sub(self.forgotten.len())
    }
}

// ============================================================================
// ReviewSession
// ============================================================================

/// State of one review session over a lesson's vocabulary.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    item_count: usize,
    round: u32,
    current_round_queue: Vec<usize>,
    current_position: usize,
    next_round_queue: Vec<usize>,
    ever_forgotten: Vec<String>,
    phase: SessionPhase,
    history: Vec<RoundRecord>,
    started_at: DateTime<Utc>,
    round_started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Starts a session over `item_count` items.
    ///
    /// Round 1 contains every index `0..item_count` in order.
    ///
    /// # Errors
    ///
    /// Returns `RecallError::EmptyVocabulary` if `item_count` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use recall_core::{ReviewSession, SessionPhase};
    ///
    /// let session = ReviewSession::start(3).unwrap();
    /// assert_eq!(session.phase(), SessionPhase::Studying);
    /// assert_eq!(session.progress().unwrap(), (1, 3));
    /// assert!(ReviewSession::start(0).is_err());
    /// ```
    pub fn start(item_count: usize) -> Result<Self> {
        if item_count == 0 {
            return Err(RecallError::EmptyVocabulary);
        }

        let now = Utc::now();
        info!(item_count, "Review session started");
        Ok(Self {
            item_count,
            round: 1,
            current_round_queue: (0..item_count).collect(),
            current_position: 0,
            next_round_queue: Vec::new(),
            ever_forgotten: Vec::new(),
            phase: SessionPhase::Studying,
            history: Vec::new(),
            started_at: now,
            round_started_at: now,
            ended_at: None,
        })
    }

    /// Returns the lesson index of the card being studied.
    ///
    /// # Errors
    ///
    /// Returns a contract violation outside [`SessionPhase::Studying`].
    pub fn current_item_index(&self) -> Result<usize> {
        self.require_studying("current_item_index")?;
        self.current_round_queue
            .get(self.current_position)
            .copied()
            .ok_or_else(|| RecallError::contract("current_item_index", self.phase))
    }

    /// Records the learner's verdict on the current card and moves on.
    ///
    /// `Forgot` queues the card for the next round and remembers `word` as
    /// troublesome for the rest of the session. After the last card of the
    /// round the phase becomes [`SessionPhase::RoundSummary`]; this never
    /// completes the session by itself.
    ///
    /// # Errors
    ///
    /// Returns a contract violation outside [`SessionPhase::Studying`].
    pub fn judge(&mut self, outcome: Judgment, word: &str) -> Result<SessionPhase> {
        let index = self
            .current_item_index()
            .map_err(|_| RecallError::contract("judge", self.phase))?;

        if outcome == Judgment::Forgot {
            self.next_round_queue.push(index);
            if !self.ever_forgotten.iter().any(|w| w == word) {
                self.ever_forgotten.push(word.to_string());
            }
        }
        debug!(index, ?outcome, round = self.round, "Card judged");

        self.current_position += 1;
        if self.current_position == self.current_round_queue.len() {
            self.phase = SessionPhase::RoundSummary;
            self.history.push(RoundRecord {
                round: self.round,
                reviewed: self.current_round_queue.len(),
                forgotten: self.next_round_queue.clone(),
                started_at: self.round_started_at,
                ended_at: Utc::now(),
            });
            info!(
                round = self.round,
                to_review = self.next_round_queue.len(),
                "Round finished"
            );
        }

        Ok(self.phase)
    }

    /// Leaves the round summary.
    ///
    /// Completes the session if nothing was forgotten this round; otherwise the
    /// forgotten items, in judgment order, become the next round.
    ///
    /// # Errors
    ///
    /// Returns a contract violation outside [`SessionPhase::RoundSummary`].
    pub fn advance_round(&mut self) -> Result<SessionPhase> {
        if self.phase != SessionPhase::RoundSummary {
            return Err(RecallError::contract("advance_round", self.phase));
        }

        if self.next_round_queue.is_empty() {
            self.phase = SessionPhase::SessionComplete;
            self.ended_at = Some(Utc::now());
            info!(
                rounds = self.round,
                forgotten = self.ever_forgotten.len(),
                "Review session complete"
            );
            return Ok(self.phase);
        }

        self.current_round_queue = std::mem::take(&mut self.next_round_queue);
        self.current_position = 0;
        self.round += 1;
        self.round_started_at = Utc::now();
        self.phase = SessionPhase::Studying;
        info!(
            round = self.round,
            cards = self.current_round_queue.len(),
            "Round started"
        );
        Ok(self.phase)
    }

    /// Returns `(position, round_length)` with a 1-based position.
    ///
    /// # Errors
    ///
    /// Returns a contract violation outside [`SessionPhase::Studying`].
    pub fn progress(&self) -> Result<(usize, usize)> {
        self.require_studying("progress")?;
        Ok((self.current_position + 1, self.current_round_queue.len()))
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current round number (1-indexed).
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Number of items in the lesson.
    #[must_use]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    /// Items of the current round, in study order.
    #[must_use]
    pub fn current_round_queue(&self) -> &[usize] {
        &self.current_round_queue
    }

    /// Items forgotten so far this round, in judgment order.
    #[must_use]
    pub fn next_round_queue(&self) -> &[usize] {
        &self.next_round_queue
    }

    /// Number of cards waiting for the next round.
    #[must_use]
    pub fn pending_review_count(&self) -> usize {
        self.next_round_queue.len()
    }

    /// Words forgotten at least once this session, in first-forgotten order.
    #[must_use]
    pub fn ever_forgotten(&self) -> &[String] {
        &self.ever_forgotten
    }

    /// Returns `true` if `word` has been forgotten at least once this session.
    #[must_use]
    pub fn was_forgotten(&self, word: &str) -> bool {
        self.ever_forgotten.iter().any(|w| w == word)
    }

    /// Finished rounds, oldest first.
    #[must_use]
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// When the session started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the session completed, if it has.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    fn require_studying(&self, operation: &'static str) -> Result<()> {
        if self.phase == SessionPhase::Studying {
            Ok(())
        } else {
            Err(RecallError::contract(operation, self.phase))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
