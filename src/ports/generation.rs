//! Generation port - interface for the text generation backend.
//!
//! This port abstracts the LLM behind the interview: slot extraction,
//! acknowledgements, next questions, and the final summary. The
//! orchestrator treats every call as fallible and substitutes a
//! deterministic fallback on any error, so implementations never have
//! to be available for the conversation to make progress.
//!
//! # Design
//!
//! - Four logical operations, no wire format in the signatures
//! - The slot schema travels as the closed [`SlotName`] enum, so an
//!   implementation cannot return keys outside the schema
//! - Errors carry enough shape for retry classification, nothing more
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct CannedGenerator;
//!
//! #[async_trait]
//! impl Generator for CannedGenerator {
//!     async fn extract_slots(
//!         &self,
//!         _answer: &str,
//!         _slots: &SlotValues,
//!     ) -> Result<SlotUpdate, GenerationError> {
//!         Ok(SlotUpdate::new())
//!     }
//!     // ... other methods
//! }
//! ```

use async_trait::async_trait;

use crate::domain::report::{Exchange, SlotName, SlotUpdate, SlotValues};

/// Port for the text generation backend.
///
/// Implementations connect to an external completion service and
/// translate between its API and the domain types. Every method is
/// expected to be wrapped in a caller-side timeout.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Extracts slot values mentioned in the answer.
    ///
    /// `slots` carries the current values so the backend can skip what
    /// is already known. The returned update may be empty.
    ///
    /// # Errors
    ///
    /// Any [`GenerationError`]; the caller substitutes an empty update.
    async fn extract_slots(
        &self,
        answer: &str,
        slots: &SlotValues,
    ) -> Result<SlotUpdate, GenerationError>;

    /// Produces a short acknowledgement of the answer.
    ///
    /// Implementations keep it within their configured length bound.
    ///
    /// # Errors
    ///
    /// Any [`GenerationError`]; the caller substitutes a neutral line.
    async fn acknowledge(
        &self,
        answer: &str,
        slots: &SlotValues,
    ) -> Result<String, GenerationError>;

    /// Produces the next interview question.
    ///
    /// `focus`, when set, names a slot the question must target (urgent
    /// follow-up steering).
    ///
    /// # Errors
    ///
    /// Any [`GenerationError`]; the caller substitutes a canned
    /// question for the first unfilled slot.
    async fn next_question(
        &self,
        transcript: &[Exchange],
        slots: &SlotValues,
        focus: Option<SlotName>,
    ) -> Result<String, GenerationError>;

    /// Produces the final report summary from the full transcript.
    ///
    /// # Errors
    ///
    /// Any [`GenerationError`]; the caller substitutes a placeholder
    /// summary built from the filled slots.
    async fn summarize(
        &self,
        transcript: &[Exchange],
        slots: &SlotValues,
    ) -> Result<String, GenerationError>;
}

/// Generation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Request exceeded its deadline.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Rate limited by the backend.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Backend is unavailable.
    #[error("generation backend unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Backend replied with something unusable.
    #[error("parse error: {0}")]
    Parse(String),

    /// Backend rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Creates a timeout error.
    pub fn timeout(timeout_secs: u32) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout { .. }
                | GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_object_safe() {
        fn _accepts_dyn(_generator: &dyn Generator) {}
    }

    #[test]
    fn error_constructors_work() {
        assert!(matches!(
            GenerationError::timeout(30),
            GenerationError::Timeout { timeout_secs: 30 }
        ));
        assert!(matches!(
            GenerationError::rate_limited(10),
            GenerationError::RateLimited { retry_after_secs: 10 }
        ));
        assert!(matches!(
            GenerationError::unavailable("down"),
            GenerationError::Unavailable { .. }
        ));
    }

    #[test]
    fn retryable_classification() {
        assert!(GenerationError::timeout(30).is_retryable());
        assert!(GenerationError::rate_limited(10).is_retryable());
        assert!(GenerationError::unavailable("down").is_retryable());
        assert!(GenerationError::network("reset").is_retryable());

        assert!(!GenerationError::AuthenticationFailed.is_retryable());
        assert!(!GenerationError::parse("not json").is_retryable());
        assert!(!GenerationError::InvalidRequest("bad body".into()).is_retryable());
    }

    #[test]
    fn errors_display_correctly() {
        assert_eq!(
            GenerationError::timeout(30).to_string(),
            "request timed out after 30s"
        );
        assert_eq!(
            GenerationError::parse("truncated").to_string(),
            "parse error: truncated"
        );
    }
}
