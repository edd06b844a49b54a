//! Error taxonomy for focuscoach.
//!
//! Every failure here is locally recoverable. Provider errors are defined in
//! `focuscoach-core` so the content pipeline can downcast and classify them for
//! retry decisions without string matching.

use thiserror::Error;

use crate::session::Mode;

/// Errors that can occur when talking to a content-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The provider answered but the reply carried no text.
    #[error("provider returned no content")]
    EmptyContent,
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Why a structured reply could not be turned into questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Sanitized text is still not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(String),

    /// Valid JSON, but the top level is not an array.
    #[error("expected a JSON array of questions")]
    NotASequence,

    /// The array has the wrong number of records.
    #[error("expected {expected} questions, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// One record is missing fields or has out-of-range values.
    #[error("question {index} is malformed: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Failure of a content request. The caller decides whether to retry.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Network or provider failure.
    #[error("content generation failed: {0}")]
    Generation(String),

    /// The provider answered with nothing usable.
    #[error("content generation returned an empty response")]
    EmptyResponse,

    /// The reply could not be decoded into the expected shape.
    #[error("content decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl ContentError {
    /// Whether this is a generation-side failure (as opposed to decode).
    pub fn is_generation(&self) -> bool {
        matches!(self, ContentError::Generation(_) | ContentError::EmptyResponse)
    }
}

/// A store write or read was rejected.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The store refused the operation.
    #[error("store rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// No record has the given id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Underlying I/O or serialization failure.
    #[error("store I/O failure: {0}")]
    Io(String),
}

/// A curriculum definition that cannot be used at all.
#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("curriculum declares no domains")]
    NoDomains,

    #[error("invalid curriculum: {0}")]
    Invalid(String),
}

/// Errors returned by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The action is not allowed in the current mode.
    #[error("cannot {action} while in {mode:?} mode")]
    InvalidTransition { mode: Mode, action: &'static str },

    /// No learner profile is loaded yet.
    #[error("no learner profile loaded")]
    NoProfile,

    /// The current question has already been answered.
    #[error("question {0} has already been answered")]
    AlreadyAnswered(usize),

    /// The current question has not been answered yet.
    #[error("question {0} has not been answered yet")]
    NotAnswered(usize),

    /// The selected option index is outside the question's options.
    #[error("option {0} is out of range")]
    InvalidOption(usize),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
