//! EndSessionHandler - Force session completion with a summary
//!
//! Caller-forced termination that skips the completion policy. The
//! summary comes from the generation backend when it is healthy and
//! from the deterministic placeholder when it is not.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::foundation::SessionId;
use crate::domain::report::{script, ReportSession};
use crate::ports::{Generator, SessionStore, SessionStoreError};

/// Deadline for the summary generation call.
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Command to end a session
#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: SessionId,
}

/// Result of ending a session
#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub session: ReportSession,
    pub summary: String,
}

/// Error type for ending sessions
#[derive(Debug, Clone)]
pub enum EndSessionError {
    /// Session not found
    NotFound(SessionId),
    /// Storage error
    Storage(String),
}

impl std::fmt::Display for EndSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndSessionError::NotFound(id) => write!(f, "Session not found: {}", id),
            EndSessionError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for EndSessionError {}

impl From<SessionStoreError> for EndSessionError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound { id } => EndSessionError::NotFound(id),
            other => EndSessionError::Storage(other.to_string()),
        }
    }
}

/// Handler for ending sessions
pub struct EndSessionHandler<G: ?Sized + Generator> {
    store: Arc<dyn SessionStore>,
    generator: Arc<G>,
    generation_timeout: Duration,
}

impl<G: ?Sized + Generator> EndSessionHandler<G> {
    pub fn new(store: Arc<dyn SessionStore>, generator: Arc<G>) -> Self {
        Self {
            store,
            generator,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Sets the summary generation deadline.
    pub fn with_generation_timeout(mut self, generation_timeout: Duration) -> Self {
        self.generation_timeout = generation_timeout;
        self
    }

    pub async fn handle(&self, cmd: EndSessionCommand) -> Result<EndSessionResult, EndSessionError> {
        // 1. Load the stored record
        let session = self.store.get(&cmd.session_id).await?;

        // 2. Already completed: return the stored summary, never regenerate
        if session.is_completed() {
            let summary = session.summary().unwrap_or_default().to_string();
            return Ok(EndSessionResult { session, summary });
        }

        // 3. Summarize what was gathered so far
        let summary = self.generate_summary(&session).await;

        // 4. Persist the transition; a concurrent completion wins unchanged
        let apply = |s: &mut ReportSession| {
            let _ = s.complete(summary.clone());
        };
        let stored = self.store.update(&cmd.session_id, &apply).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            turns = stored.turn_count(),
            "Report session ended by caller"
        );

        let summary = stored.summary().unwrap_or_default().to_string();
        Ok(EndSessionResult {
            session: stored,
            summary,
        })
    }

    /// Summary with its fallback: the deterministic placeholder.
    async fn generate_summary(&self, session: &ReportSession) -> String {
        let call = self.generator.summarize(session.history(), session.slots());
        match timeout(self.generation_timeout, call).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Summary generation failed, using the placeholder"
                );
                script::placeholder_summary(session.slots(), session.turn_count())
            }
            Err(_) => script::placeholder_summary(session.slots(), session.turn_count()),
        }
    }
}
