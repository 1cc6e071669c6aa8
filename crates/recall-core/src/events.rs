//! Review events and broadcasting.
//!
//! A [`CardPresenter`](crate::CardPresenter) can publish what happens during a
//! session so that observers (the terminal renderer, a transcript writer) can
//! follow along without polling. Events are serialized as JSON objects with
//! `event` and `payload` fields.
//!
//! # Example
//!
//! ```
//! use recall_core::{EventBroadcaster, ReviewEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(64);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(ReviewEvent::session_started(3, recall_core::Orientation::Forward));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{}", event.event_name());
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::Orientation;
use crate::session::Judgment;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `session_started` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedPayload {
    /// Number of items in the session.
    pub item_count: usize,
    /// Orientation the session starts in.
    pub orientation: Orientation,
    /// When the session started.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `card_shown` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardShownPayload {
    /// Round number (1-indexed).
    pub round: u32,
    /// Position within the round (1-indexed).
    pub position: usize,
    /// Number of cards in the round.
    pub round_length: usize,
    /// Lesson index of the card.
    pub item_index: usize,
    /// The card's word.
    pub word: String,
    /// Whether the word has been forgotten earlier in the session.
    pub previously_forgotten: bool,
}

/// Payload for the `card_judged` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardJudgedPayload {
    /// Round number (1-indexed).
    pub round: u32,
    /// Lesson index of the card.
    pub item_index: usize,
    /// The card's word.
    pub word: String,
    /// The verdict.
    pub judgment: Judgment,
}

/// Payload for the `round_complete` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCompletePayload {
    /// Round number (1-indexed).
    pub round: u32,
    /// Cards judged this round.
    pub reviewed: usize,
    /// Cards going into the next round.
    pub to_review: usize,
}

/// Payload for the `session_complete` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompletePayload {
    /// Number of rounds played.
    pub rounds: u32,
    /// Words forgotten at least once, in first-forgotten order.
    pub troublesome_words: Vec<String>,
}

/// Payload for the `session_closed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosedPayload {
    /// Whether the session had completed before it was closed.
    pub completed: bool,
    /// Round the session was in.
    pub round: u32,
}

// ============================================================================
// ReviewEvent
// ============================================================================

/// Events published while a session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// The first card is about to be shown.
    SessionStarted(SessionStartedPayload),
    /// A card became current.
    CardShown(CardShownPayload),
    /// A card was judged.
    CardJudged(CardJudgedPayload),
    /// The last card of a round was judged.
    RoundComplete(RoundCompletePayload),
    /// A round ended with nothing forgotten.
    SessionComplete(SessionCompletePayload),
    /// The presenter was closed.
    SessionClosed(SessionClosedPayload),
}

impl ReviewEvent {
    /// Creates a `SessionStarted` event.
    #[must_use]
    pub fn session_started(item_count: usize, orientation: Orientation) -> Self {
        Self::SessionStarted(SessionStartedPayload {
            item_count,
            orientation,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `RoundComplete` event.
    #[must_use]
    pub const fn round_complete(round: u32, reviewed: usize, to_review: usize) -> Self {
        Self::RoundComplete(RoundCompletePayload {
            round,
            reviewed,
            to_review,
        })
    }

    /// Creates a `SessionComplete` event.
    #[must_use]
    pub const fn session_complete(rounds: u32, troublesome_words: Vec<String>) -> Self {
        Self::SessionComplete(SessionCompletePayload {
            rounds,
            troublesome_words,
        })
    }

    /// Creates a `SessionClosed` event.
    #[must_use]
    pub const fn session_closed(completed: bool, round: u32) -> Self {
        Self::SessionClosed(SessionClosedPayload { completed, round })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionStarted(_) => "session_started",
            Self::CardShown(_) => "card_shown",
            Self::CardJudged(_) => "card_judged",
            Self::RoundComplete(_) => "round_complete",
            Self::SessionComplete(_) => "session_complete",
            Self::SessionClosed(_) => "session_closed",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts review events to every subscriber.
///
/// Events are not kept for subscribers that join later. A subscriber that
/// falls more than `capacity` events behind receives a `Lagged` error.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ReviewEvent>,
}

impl EventBroadcaster {
    /// Creates a new `EventBroadcaster` with the given per-subscriber buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event and returns how many subscribers will see it.
    pub fn send(&self, event: ReviewEvent) -> usize {
        // Err only means nobody is listening.
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
