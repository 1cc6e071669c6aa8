//! Image and dictionary lookups.
//!
//! Purely cosmetic enrichment of a card. Nothing here affects scheduling, and
//! a failed lookup is reported as a recoverable error the caller may ignore.

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};

/// Base URL of the free dictionary API.
pub const DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

/// Number of meanings, and definitions per meaning, shown in a summary.
const SUMMARY_LIMIT: usize = 2;

/// Search flavour of a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    /// The word on its own.
    Plain,
    /// The word plus "photo".
    Photo,
    /// The word plus "illustration".
    Illustration,
}

/// A thumbnail search URL for a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Which variant of the search this is.
    pub variant: ImageVariant,
    /// Thumbnail URL.
    pub url: String,
}

/// Returns three thumbnail URLs for a word, one per [`ImageVariant`].
///
/// # Examples
///
/// ```
/// use recall_core::lookup::{image_references, ImageVariant};
///
/// let refs = image_references("ice cream");
/// assert_eq!(refs[1].variant, ImageVariant::Photo);
/// assert!(refs[0].url.contains("q=ice%20cream&"));
/// ```
#[must_use]
pub fn image_references(word: &str) -> [ImageReference; 3] {
    let thumbnail = |host: u8, query: String, variant: ImageVariant| ImageReference {
        variant,
        url: format!(
            "https://tse{host}.mm.bing.net/th?q={}&w=300&h=300&c=7&rs=1&p=0",
            urlencoding::encode(&query)
        ),
    };

    [
        thumbnail(1, word.to_string(), ImageVariant::Plain),
        thumbnail(2, format!("{word} photo"), ImageVariant::Photo),
        thumbnail(3, format!("{word} illustration"), ImageVariant::Illustration),
    ]
}

/// Returns a full image search URL for a word.
#[must_use]
pub fn image_search_url(word: &str) -> String {
    format!(
        "https://www.google.com/search?tbm=isch&q={}",
        urlencoding::encode(word)
    )
}

/// Returns the dictionary API URL for a word.
#[must_use]
pub fn dictionary_url(word: &str) -> String {
    format!("{DICTIONARY_API_URL}/{}", urlencoding::encode(word.trim()))
}

/// One dictionary definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// The definition text.
    pub definition: String,
    /// Usage example, when the dictionary has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Definitions grouped under a part of speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    /// Part of speech ("noun", "verb", ...).
    pub part_of_speech: String,
    /// Definitions in dictionary order.
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

/// A dictionary entry for a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Headword.
    pub word: String,
    /// Phonetic transcription, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    /// Meanings in dictionary order.
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

impl DictionaryEntry {
    /// Parses a dictionary API response body.
    ///
    /// The API answers with an array of entries; only the first is kept. An
    /// empty array means the word is unknown and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `RecallError::InvalidPayload` if the body is not an array of
    /// entries.
    pub fn from_api_response(body: &str) -> Result<Option<Self>> {
        let entries: Vec<Self> = serde_json::from_str(body)
            .map_err(|e| RecallError::invalid_payload("dictionary", e.to_string()))?;
        Ok(entries.into_iter().next())
    }

    /// The first two meanings with at most two definitions each.
    #[must_use]
    pub fn summary(&self) -> Vec<Meaning> {
        self.meanings
            .iter()
            .take(SUMMARY_LIMIT)
            .map(|m| Meaning {
                part_of_speech: m.part_of_speech.clone(),
                definitions: m.definitions.iter().take(SUMMARY_LIMIT).cloned().collect(),
            })
            .collect()
    }
}

/// A dictionary service.
pub trait DictionaryLookup {
    /// Looks a word up. `Ok(None)` means the dictionary has no entry.
    fn lookup_dictionary(&self, word: &str) -> Result<Option<DictionaryEntry>>;
}
