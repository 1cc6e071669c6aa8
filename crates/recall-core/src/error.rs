//! Error types for the Recall review core.
//!
//! This module defines the error hierarchy for all core operations, split into
//! three families: contract violations (an operation called in a state that does
//! not allow it), recoverable failures of external collaborators (lesson store,
//! extraction service, lookups), and configuration errors.

use std::path::PathBuf;

/// A specialized `Result` type for Recall core operations.
pub type Result<T> = std::result::Result<T, RecallError>;

/// Errors that can occur in the Recall review core.
///
/// Variants carry an actionable suggestion where the user can do something
/// about them.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// An operation was invoked in a state that does not permit it.
    ///
    /// This is a programming error in the caller, never a runtime fault.
    #[error("Contract violation: '{operation}' is not allowed while {state}")]
    ContractViolation {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the component was in.
        state: String,
    },

    /// A review session was started with no vocabulary.
    #[error("Cannot start a review session: the lesson has no vocabulary\n\nSuggestion: Add at least one word to the lesson before studying it")]
    EmptyVocabulary,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your recall.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Lesson Store Errors
    // ========================================================================
    /// A lesson file was expected but does not exist.
    #[error("Lesson not found: '{id}'\n\nSuggestion: Run 'recall list' to see the available lessons")]
    LessonNotFound {
        /// Identifier of the missing lesson.
        id: String,
    },

    /// A lesson file exists but could not be parsed.
    #[error("Invalid lesson file '{path}': {message}\n\nSuggestion: Check the file against the lesson format or re-import it")]
    LessonParseError {
        /// Path to the lesson file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// A lesson identifier cannot be used as a file name.
    #[error("Invalid lesson id '{id}'\n\nSuggestion: Use letters, digits, '-' and '_' only")]
    InvalidLessonId {
        /// The rejected identifier.
        id: String,
    },

    /// The caller lacks the capability required for the operation.
    #[error("Permission denied: {action} requires edit access\n\nSuggestion: Re-run the command with --admin")]
    PermissionDenied {
        /// The action that was refused.
        action: String,
    },

    // ========================================================================
    // External Service Errors
    // ========================================================================
    /// An external collaborator (extraction, dictionary, image lookup) failed.
    #[error("{service} failed: {message}")]
    Service {
        /// Name of the failing service.
        service: String,
        /// Description of the failure.
        message: String,
    },

    /// An external payload did not have the expected shape.
    #[error("Invalid {source_name} payload: {message}")]
    InvalidPayload {
        /// Where the payload came from (e.g. "extraction", "dictionary").
        source_name: &'static str,
        /// Description of what was wrong.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecallError {
    /// Creates a new `ContractViolation` for the given operation and state.
    #[must_use]
    pub fn contract(operation: &'static str, state: impl std::fmt::Display) -> Self {
        Self::ContractViolation {
            operation,
            state: state.to_string(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `LessonNotFound` error.
    #[must_use]
    pub fn lesson_not_found(id: impl Into<String>) -> Self {
        Self::LessonNotFound { id: id.into() }
    }

    /// Creates a new `LessonParseError`.
    #[must_use]
    pub fn lesson_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LessonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidLessonId` error.
    #[must_use]
    pub fn invalid_lesson_id(id: impl Into<String>) -> Self {
        Self::InvalidLessonId { id: id.into() }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// Creates a new `Service` error.
    #[must_use]
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPayload` error.
    #[must_use]
    pub fn invalid_payload(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            source_name,
            message: message.into(),
        }
    }

    /// Returns `true` if this error is a programming error in the caller.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. } | Self::EmptyVocabulary)
    }

    /// Returns `true` if this error came from an external collaborator and the
    /// caller may report it and carry on.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Service { .. }
                | Self::InvalidPayload { .. }
                | Self::LessonNotFound { .. }
                | Self::LessonParseError { .. }
                | Self::Io(_)
                | Self::Json(_)
        )
    }
}
