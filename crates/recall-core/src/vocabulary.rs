//! Vocabulary items, lessons, and the extraction boundary.
//!
//! Vocabulary reaches the review core from two places: lesson files in the
//! [`LessonStore`](crate::LessonStore), and the content extraction service that
//! turns raw text, images or documents into word lists. The second is an
//! untrusted payload, so it is validated here before it can ever become part of
//! a lesson.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RecallError, Result};

/// A single vocabulary entry of a lesson.
///
/// Owned by the lesson; the review core only ever reads it. Scheduling uses the
/// item's position in the lesson, not its `word`, because words may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// The word or phrase being learned.
    pub word: String,

    /// Phonetic transcription (e.g. `/wɜːrd/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipa: Option<String>,

    /// Meaning of the word in the learner's language.
    pub definition: String,

    /// Example sentence using the word.
    pub example: String,
}

impl VocabularyItem {
    /// Creates a new item without phonetics.
    #[must_use]
    pub fn new(
        word: impl Into<String>,
        definition: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            ipa: None,
            definition: definition.into(),
            example: example.into(),
        }
    }

    /// Sets the phonetic transcription.
    #[must_use]
    pub fn with_ipa(mut self, ipa: impl Into<String>) -> Self {
        self.ipa = Some(ipa.into());
        self
    }
}

/// A lesson: a dated, titled, ordered vocabulary list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Stable identifier, also used as the file stem in the lesson store.
    pub id: String,

    /// Lesson date as `YYYY-MM-DD`.
    pub date: String,

    /// Title of the vocabulary set.
    #[serde(default = "default_vocabulary_title")]
    pub vocabulary_title: String,

    /// Ordered vocabulary of the lesson.
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,

    /// Title of the accompanying reading text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_title: Option<String>,

    /// When the lesson was created.
    pub created_at: DateTime<Utc>,

    /// Manual sort position; lessons without one sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

fn default_vocabulary_title() -> String {
    "Untitled Vocabulary".to_string()
}

impl Lesson {
    /// Creates a new lesson dated today with the given vocabulary.
    #[must_use]
    pub fn new(id: impl Into<String>, vocabulary: Vec<VocabularyItem>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            date: now.format("%Y-%m-%d").to_string(),
            vocabulary_title: default_vocabulary_title(),
            vocabulary,
            story_title: None,
            created_at: now,
            order: None,
        }
    }

    /// Returns the title to show for this lesson.
    ///
    /// Prefers the story title, falling back to the vocabulary title.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.story_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.vocabulary_title)
    }

    /// Returns a shared, read-only view of the vocabulary for a review session.
    #[must_use]
    pub fn shared_vocabulary(&self) -> Arc<[VocabularyItem]> {
        Arc::from(self.vocabulary.as_slice())
    }
}

// ============================================================================
// Extraction boundary
// ============================================================================

/// Input handed to the content extraction service.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Raw text, or a URL whose content should be analysed.
    pub source_text: String,

    /// Optional attached document or image.
    pub file: Option<Vec<u8>>,

    /// MIME type of `file`.
    pub mime_type: String,
}

impl ExtractionRequest {
    /// Creates a text-only request.
    #[must_use]
    pub fn text(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            file: None,
            mime_type: "image/jpeg".to_string(),
        }
    }

    /// Attaches a file with its MIME type.
    #[must_use]
    pub fn with_file(mut self, file: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.file = Some(file);
        self.mime_type = mime_type.into();
        self
    }
}

/// The content extraction service.
///
/// Implementations talk to whatever produces vocabulary lists and must run
/// their raw output through [`parse_extraction_payload`] before returning.
/// Failures are reported as recoverable [`RecallError::Service`] errors.
pub trait VocabularyExtractor {
    /// Extracts vocabulary from the given input.
    fn extract_vocabulary(&self, request: &ExtractionRequest) -> Result<Vec<VocabularyItem>>;
}

/// Why an extracted entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position of the entry in the payload's `vocabulary` array.
    pub index: usize,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of validating an extraction payload.
#[derive(Debug, Clone, Default)]
pub struct ExtractedVocabulary {
    /// Entries that passed validation, in payload order.
    pub items: Vec<VocabularyItem>,
    /// Entries that were dropped.
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    vocabulary: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    ipa: Option<String>,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

/// Validates an extraction service payload.
///
/// Accepts `{"vocabulary": [...]}`, optionally wrapped in a Markdown code fence.
/// Every field is trimmed; entries missing a non-blank `word`, `definition` or
/// `example` are dropped and reported in [`ExtractedVocabulary::rejected`]. An
/// empty `ipa` becomes `None`. Duplicates are kept.
///
/// # Errors
///
/// Returns `RecallError::InvalidPayload` if the payload is not JSON or has no
/// `vocabulary` array.
pub fn parse_extraction_payload(raw: &str) -> Result<ExtractedVocabulary> {
    let body = strip_code_fence(raw);
    let payload: RawPayload = serde_json::from_str(body)
        .map_err(|e| RecallError::invalid_payload("extraction", e.to_string()))?;

    let mut extracted = ExtractedVocabulary::default();
    for (index, value) in payload.vocabulary.into_iter().enumerate() {
        match sanitize_entry(value) {
            Ok(item) => extracted.items.push(item),
            Err(reason) => {
                warn!(index, reason = %reason, "Dropping extracted vocabulary entry");
                extracted.rejected.push(RejectedEntry { index, reason });
            }
        }
    }

    debug!(
        accepted = extracted.items.len(),
        rejected = extracted.rejected.len(),
        "Extraction payload validated"
    );
    Ok(extracted)
}

fn sanitize_entry(value: serde_json::Value) -> std::result::Result<VocabularyItem, String> {
    if !value.is_object() {
        return Err("entry is not an object".to_string());
    }
    let raw: RawItem =
        serde_json::from_value(value).map_err(|e| format!("entry has wrong field types: {e}"))?;

    let word = required_field(raw.word, "word")?;
    let definition = required_field(raw.definition, "definition")?;
    let example = required_field(raw.example, "example")?;
    let ipa = raw
        .ipa
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(VocabularyItem {
        word,
        ipa,
        definition,
        example,
    })
}

fn required_field(value: Option<String>, name: &str) -> std::result::Result<String, String> {
    match value.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) => Err(format!("'{name}' is blank")),
        None => Err(format!("'{name}' is missing")),
    }
}

/// Removes a surrounding Markdown code fence (```` ```json ... ``` ````), if present.
fn strip_code_fence(raw: &str) -> &str {
    let Ok(re) = Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*$") else {
        return raw.trim();
    };
    re.captures(raw)
        .and_then(|cap| cap.get(1))
        .map_or_else(|| raw.trim(), |m| m.as_str())
}
