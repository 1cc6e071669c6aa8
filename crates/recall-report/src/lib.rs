//! Recall Report Generation
//!
//! Turns the outcome of a review session into a report that can be written as
//! JSON for programmatic access or rendered to Markdown for the learner.
//!
//! # Types
//!
//! - [`SessionReport`] - The complete report
//! - [`ReportSummary`] - Headline figures of the session
//! - [`RoundSummary`] - One row per round played
//!
//! # Generators
//!
//! - [`ReportGenerator`] - Builds a [`SessionReport`] from a [`ReportInput`]
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use recall_report::{ReportGenerator, ReportInput, RoundInput, MarkdownGenerator};
//!
//! let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
//! let input = ReportInput {
//!     lesson_title: "Week 3".to_string(),
//!     total_words: 2,
//!     completed: true,
//!     started_at: start,
//!     ended_at: start + chrono::Duration::seconds(30),
//!     rounds: vec![RoundInput {
//!         round: 1,
//!         reviewed: 2,
//!         forgotten_words: vec![],
//!         started_at: start,
//!         ended_at: start + chrono::Duration::seconds(30),
//!     }],
//!     troublesome_words: vec![],
//! };
//!
//! let report = ReportGenerator::new(input).generate().unwrap();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Recall Session Report: Week 3"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report Status
// ============================================================================

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Every word was known once.
    Completed,
    /// The learner left before the session completed.
    #[default]
    Abandoned,
}

impl ReportStatus {
    /// Returns `true` if the session completed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns a human-readable description of the status.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Abandoned => "Ended early",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Report
// ============================================================================

/// Complete session report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Title of the studied lesson.
    pub lesson_title: String,

    /// Headline figures.
    pub summary: ReportSummary,

    /// One entry per round played, in order.
    pub rounds: Vec<RoundSummary>,

    /// Words forgotten at least once, in first-forgotten order.
    pub troublesome_words: Vec<String>,
}

impl SessionReport {
    /// Serializes the report to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }
}

/// Headline figures of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// How the session ended.
    pub status: ReportStatus,

    /// Number of rounds played, including an unfinished last round.
    pub rounds: u32,

    /// Number of words in the lesson.
    pub total_words: usize,

    /// Number of distinct words forgotten at least once.
    pub words_forgotten: usize,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// Wall-clock length of the session.
    pub duration_seconds: u64,
}

/// One round of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Round number (1-indexed).
    pub round: u32,

    /// Cards judged.
    pub reviewed: usize,

    /// Cards judged known.
    pub known: usize,

    /// Words judged forgot, in judgment order.
    pub forgotten_words: Vec<String>,

    /// Wall-clock length of the round.
    pub duration_seconds: u64,
}

// ============================================================================
// Report Input
// ============================================================================

/// One finished round, as recorded by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInput {
    /// Round number (1-indexed).
    pub round: u32,
    /// Cards judged in the round.
    pub reviewed: usize,
    /// Words judged forgot, in judgment order.
    pub forgotten_words: Vec<String>,
    /// When the round started.
    pub started_at: DateTime<Utc>,
    /// When the last card was judged.
    pub ended_at: DateTime<Utc>,
}

/// Everything needed to build a [`SessionReport`].
///
/// Kept independent of the review core so the report crate has no dependency
/// on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInput {
    /// Title of the studied lesson.
    pub lesson_title: String,
    /// Number of words in the lesson.
    pub total_words: usize,
    /// Whether the session reached completion.
    pub completed: bool,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session ended or was closed.
    pub ended_at: DateTime<Utc>,
    /// Finished rounds, oldest first.
    pub rounds: Vec<RoundInput>,
    /// Words forgotten at least once.
    pub troublesome_words: Vec<String>,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds a [`SessionReport`] from a [`ReportInput`].
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    input: ReportInput,
}

impl ReportGenerator {
    /// Creates a generator for the given input.
    #[must_use]
    pub const fn new(input: ReportInput) -> Self {
        Self { input }
    }

    /// Validates the input and assembles the report.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidData`] if the session ended before it
    /// started, rounds are not numbered 1, 2, 3, ..., or a round forgot more
    /// cards than it reviewed.
    pub fn generate(self) -> Result<SessionReport> {
        let input = self.input;

        if input.ended_at < input.started_at {
            return Err(ReportError::InvalidData(
                "session ends before it starts".to_string(),
            ));
        }

        let mut rounds = Vec::with_capacity(input.rounds.len());
        for (i, round) in input.rounds.into_iter().enumerate() {
            let expected = u32::try_from(i + 1).unwrap_or(u32::MAX);
            if round.round != expected {
                return Err(ReportError::InvalidData(format!(
                    "expected round {expected}, found round {}",
                    round.round
                )));
            }
            if round.forgotten_words.len() > round.reviewed {
                return Err(ReportError::InvalidData(format!(
                    "round {} forgot {} of {} cards",
                    round.round,
                    round.forgotten_words.len(),
                    round.reviewed
                )));
            }
            rounds.push(RoundSummary {
                round: round.round,
                reviewed: round.reviewed,
                known: round.reviewed - round.forgotten_words.len(),
                duration_seconds: seconds_between(round.started_at, round.ended_at),
                forgotten_words: round.forgotten_words,
            });
        }

        let status = if input.completed {
            ReportStatus::Completed
        } else {
            ReportStatus::Abandoned
        };

        Ok(SessionReport {
            lesson_title: input.lesson_title,
            summary: ReportSummary {
                status,
                rounds: rounds.last().map_or(0, |r| r.round),
                total_words: input.total_words,
                words_forgotten: input.troublesome_words.len(),
                started_at: input.started_at,
                duration_seconds: seconds_between(input.started_at, input.ended_at),
            },
            rounds,
            troublesome_words: input.troublesome_words,
        })
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}
