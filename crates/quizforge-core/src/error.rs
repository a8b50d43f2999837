//! Error types for the quiz engine and its collaborators.
//!
//! Defined in `quizforge-core` so the engine can classify provider and
//! storage failures without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a generation provider.
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
}

/// Errors from the session-state, chapter-history, and analytics stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("record corrupted: {0}")]
    Corrupted(String),
}

/// Errors surfaced by the engine's own operations.
///
/// Missing-entity errors are fatal to session start. Storage errors at
/// finalization are fatal and must be retried by the caller before the
/// session is reported complete. Generation-provider failures never appear
/// here: `next_question` recovers locally with a fallback question.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("student not found: {0}")]
    StudentNotFound(String),

    #[error("assignment not found: {0}")]
    AssignmentNotFound(String),

    #[error("subtopic content not found: {0}")]
    SubtopicNotFound(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_engine_error() {
        let err: EngineError = StoreError::Unavailable("connection refused".into()).into();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn missing_entity_errors_name_the_entity() {
        assert_eq!(
            EngineError::StudentNotFound("s1".into()).to_string(),
            "student not found: s1"
        );
        assert_eq!(
            EngineError::AssignmentNotFound("quiz-7".into()).to_string(),
            "assignment not found: quiz-7"
        );
    }
}
