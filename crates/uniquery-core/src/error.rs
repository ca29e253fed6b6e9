//! Error types for extraction, sessions and generation backends.
//!
//! All of these are recoverable by the caller. Extraction failures usually
//! prompt a retry of the generation call; session errors indicate the caller
//! invoked an operation out of sequence.

use thiserror::Error;

use crate::session::SessionPhase;

/// Failures while recovering questions from model output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// No span resembling a JSON array of objects was found.
    #[error("no JSON question array found in the response")]
    NoStructureFound,

    /// The candidate span was not valid JSON, even after relaxation.
    #[error("malformed JSON: {detail}")]
    MalformedJson { detail: String, raw: String },

    /// The JSON was not an array, or the array was empty.
    #[error("unexpected shape: {0}")]
    EmptyOrWrongShape(String),

    /// An element lacks `question`, `options` or `answer`, or has the wrong type.
    #[error("question {index}: {detail}")]
    MissingFields { index: usize, detail: String },

    /// An element has the wrong number of options.
    #[error("question {index}: expected {expected} options, found {found}")]
    WrongOptionCount {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// An element's answer is not one of its options (strict mode).
    #[error("question {index}: answer {answer:?} is not one of the options")]
    AnswerNotInOptions { index: usize, answer: String },

    /// Every element was dropped during lenient filtering.
    #[error("no valid questions left after dropping {dropped} invalid element(s)")]
    NoValidQuestions { dropped: usize },
}

/// Discriminant of an [`ExtractionError`], for callers that branch on kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionErrorKind {
    NoStructureFound,
    MalformedJson,
    EmptyOrWrongShape,
    MissingFields,
    WrongOptionCount,
    AnswerNotInOptions,
    NoValidQuestions,
}

impl ExtractionError {
    pub fn kind(&self) -> ExtractionErrorKind {
        match self {
            ExtractionError::NoStructureFound => ExtractionErrorKind::NoStructureFound,
            ExtractionError::MalformedJson { .. } => ExtractionErrorKind::MalformedJson,
            ExtractionError::EmptyOrWrongShape(_) => ExtractionErrorKind::EmptyOrWrongShape,
            ExtractionError::MissingFields { .. } => ExtractionErrorKind::MissingFields,
            ExtractionError::WrongOptionCount { .. } => ExtractionErrorKind::WrongOptionCount,
            ExtractionError::AnswerNotInOptions { .. } => ExtractionErrorKind::AnswerNotInOptions,
            ExtractionError::NoValidQuestions { .. } => ExtractionErrorKind::NoValidQuestions,
        }
    }

    /// The raw text carried for diagnostics, if this error keeps it.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ExtractionError::MalformedJson { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Misuse of an [`AssessmentSession`](crate::session::AssessmentSession).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation is not valid in the session's current phase.
    #[error("cannot {operation} while {phase}: {reason}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
        reason: String,
    },

    /// An explicit question index is outside the loaded question set.
    #[error("question index {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },

    /// The selected text is not one of the question's options.
    #[error("question {index} has no option {option:?}")]
    UnknownOption { index: usize, option: String },
}

/// Errors that can occur when interacting with a text-generation backend.
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

    /// The response carried no generated text.
    #[error("empty completion from {0}")]
    EmptyCompletion(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_keeps_raw_text() {
        let err = ExtractionError::MalformedJson {
            detail: "EOF".into(),
            raw: "[{".into(),
        };
        assert_eq!(err.kind(), ExtractionErrorKind::MalformedJson);
        assert_eq!(err.raw_text(), Some("[{"));
        assert_eq!(ExtractionError::NoStructureFound.raw_text(), None);
    }

    #[test]
    fn display_includes_index() {
        let err = ExtractionError::WrongOptionCount {
            index: 2,
            expected: 4,
            found: 3,
        };
        assert_eq!(err.to_string(), "question 2: expected 4 options, found 3");
    }

    #[test]
    fn provider_error_classification() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
        assert_eq!(ProviderError::NetworkError("reset".into()).retry_after_ms(), None);
    }
}
