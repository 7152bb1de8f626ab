//! Session store port - persistence contract for report sessions.
//!
//! Defines how sessions are created, loaded, updated, and deleted
//! between turns. Implementations are pluggable: a durable TTL-based
//! key-value store in production, an in-process map as fallback and in
//! tests.
//!
//! # Design
//!
//! - **Per-key atomicity**: `update` applies a closure under a per-key
//!   lock so two racing turns on one session cannot interleave
//! - **Whole-record writes**: sessions serialize as one value; there is
//!   no partial update surface
//! - **TTL semantics**: stores expire idle sessions; every write
//!   refreshes the clock

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::report::ReportSession;

/// Mutation applied to a session inside [`SessionStore::update`].
///
/// Runs under the store's per-key lock. The closure sees the freshly
/// loaded record and edits it in place; it must re-check its own
/// preconditions there, since the record may differ from whatever copy
/// the caller loaded earlier.
pub type SessionMutation<'a> = &'a (dyn Fn(&mut ReportSession) + Send + Sync);

/// Store port for report session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a new session.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    /// - `Unavailable` on backend failure
    async fn create(&self, session: &ReportSession) -> Result<(), SessionStoreError>;

    /// Loads a session by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent or expired
    /// - `Unavailable` on backend failure
    async fn get(&self, id: &SessionId) -> Result<ReportSession, SessionStoreError>;

    /// Applies a mutation to a session atomically and returns the
    /// post-mutation record.
    ///
    /// Read-modify-write safe per key: no concurrent update on the same
    /// id observes a half-applied record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent or expired
    /// - `Unavailable` on backend failure
    async fn update(
        &self,
        id: &SessionId,
        apply: SessionMutation<'_>,
    ) -> Result<ReportSession, SessionStoreError>;

    /// Removes a session.
    ///
    /// Deleting an absent session is not an error.
    ///
    /// # Errors
    ///
    /// - `Unavailable` on backend failure
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// No session under that id (never stored, expired, or deleted).
    #[error("session not found: {id}")]
    NotFound {
        /// The id that missed.
        id: SessionId,
    },

    /// Create hit an id that already exists.
    #[error("session already exists: {id}")]
    AlreadyExists {
        /// The colliding id.
        id: SessionId,
    },

    /// Backend unreachable or failing.
    #[error("session store unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Stored bytes did not deserialize as a session record.
    #[error("corrupt session record: {message}")]
    Corrupt {
        /// Error details.
        message: String,
    },
}

impl SessionStoreError {
    /// Creates a not-found error.
    pub fn not_found(id: SessionId) -> Self {
        Self::NotFound { id }
    }

    /// Creates an already-exists error.
    pub fn already_exists(id: SessionId) -> Self {
        Self::AlreadyExists { id }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a corrupt-record error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Returns true when a fallback store should take over.
    ///
    /// Only backend availability qualifies; a missing or corrupt record
    /// is an answer, not an outage.
    pub fn is_availability(&self) -> bool {
        matches!(self, SessionStoreError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }

    #[test]
    fn availability_classification() {
        let id = SessionId::new();
        assert!(SessionStoreError::unavailable("conn refused").is_availability());

        assert!(!SessionStoreError::not_found(id).is_availability());
        assert!(!SessionStoreError::already_exists(id).is_availability());
        assert!(!SessionStoreError::corrupt("bad json").is_availability());
    }

    #[test]
    fn errors_display_the_session_id() {
        let id = SessionId::new();
        let message = SessionStoreError::not_found(id).to_string();
        assert!(message.contains(&id.to_string()));
    }
}
