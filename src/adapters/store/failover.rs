//! Failover session store - wrapper that rides out primary-store outages.
//!
//! When the primary store fails with an availability error, the same
//! operation replays against the fallback store so the interview keeps
//! moving. Reads that miss on the primary also consult the fallback,
//! because a session created during an outage lives only there.
//!
//! # Example
//!
//! ```ignore
//! let primary = RedisSessionStore::connect(&url, ttl).await?;
//! let fallback = MemorySessionStore::new(ttl);
//!
//! let store = FailoverSessionStore::new(primary, fallback);
//! ```

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::report::ReportSession;
use crate::ports::{SessionMutation, SessionStore, SessionStoreError};

/// Session store wrapper with automatic failover support.
///
/// Wraps a primary store and a fallback store. Availability errors on
/// the primary replay the operation on the fallback; domain answers
/// (not found, already exists, corrupt) pass through untouched except
/// for the read-miss consult described above.
#[derive(Debug)]
pub struct FailoverSessionStore<P: SessionStore, F: SessionStore> {
    primary: P,
    fallback: F,
}

impl<P: SessionStore, F: SessionStore> FailoverSessionStore<P, F> {
    /// Creates a failover store from a primary and a fallback.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: SessionStore + 'static, F: SessionStore + 'static> SessionStore
    for FailoverSessionStore<P, F>
{
    async fn create(&self, session: &ReportSession) -> Result<(), SessionStoreError> {
        match self.primary.create(session).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_availability() => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Primary session store unavailable, creating on fallback"
                );
                self.fallback.create(session).await
            }
            Err(err) => Err(err),
        }
    }

    async fn get(&self, id: &SessionId) -> Result<ReportSession, SessionStoreError> {
        match self.primary.get(id).await {
            Ok(session) => Ok(session),
            Err(err) if err.is_availability() => {
                tracing::warn!(
                    session_id = %id,
                    error = %err,
                    "Primary session store unavailable, reading from fallback"
                );
                self.fallback.get(id).await
            }
            // The record may have been created while the primary was down.
            Err(SessionStoreError::NotFound { .. }) => self.fallback.get(id).await,
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        id: &SessionId,
        apply: SessionMutation<'_>,
    ) -> Result<ReportSession, SessionStoreError> {
        match self.primary.update(id, apply).await {
            Ok(session) => Ok(session),
            Err(err) if err.is_availability() => {
                tracing::warn!(
                    session_id = %id,
                    error = %err,
                    "Primary session store unavailable, updating on fallback"
                );
                self.fallback.update(id, apply).await
            }
            Err(SessionStoreError::NotFound { .. }) => self.fallback.update(id, apply).await,
            Err(err) => Err(err),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        match self.primary.delete(id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_availability() => {
                tracing::warn!(
                    session_id = %id,
                    error = %err,
                    "Primary session store unavailable, deleting on fallback"
                );
                self.fallback.delete(id).await
            }
            Err(err) => Err(err),
        }
    }
}
