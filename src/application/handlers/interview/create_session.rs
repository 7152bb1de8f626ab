//! CreateSessionHandler - Start a new report interview

use std::sync::Arc;

use crate::domain::foundation::{DomainError, SessionId, UserId};
use crate::domain::report::{script, ReportSession, SlotUpdate};
use crate::ports::{SessionStore, SessionStoreError};

/// Command to start a report session
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub user_id: UserId,
    /// Caller-supplied id; generated when absent.
    pub session_id: Option<SessionId>,
    /// Slot values known before the first question (CRM context).
    pub seed: Option<SlotUpdate>,
}

impl CreateSessionCommand {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            session_id: None,
            seed: None,
        }
    }
}

/// Result of starting a session
#[derive(Debug, Clone)]
pub struct CreateSessionResult {
    pub session: ReportSession,
    pub first_question: String,
}

/// Error type for starting sessions
#[derive(Debug, Clone)]
pub enum CreateSessionError {
    /// A session with the supplied id already exists
    AlreadyExists(SessionId),
    /// Storage error
    Storage(String),
    /// Domain error
    Domain(DomainError),
}

impl std::fmt::Display for CreateSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateSessionError::AlreadyExists(id) => {
                write!(f, "Session already exists: {}", id)
            }
            CreateSessionError::Storage(err) => write!(f, "Storage error: {}", err),
            CreateSessionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreateSessionError {}

impl From<DomainError> for CreateSessionError {
    fn from(err: DomainError) -> Self {
        CreateSessionError::Domain(err)
    }
}

impl From<SessionStoreError> for CreateSessionError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::AlreadyExists { id } => CreateSessionError::AlreadyExists(id),
            other => CreateSessionError::Storage(other.to_string()),
        }
    }
}

/// Handler for starting report sessions
pub struct CreateSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl CreateSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<CreateSessionResult, CreateSessionError> {
        // 1. Initialize the session with the fixed opening question
        let id = cmd.session_id.unwrap_or_else(SessionId::new);
        let mut session = ReportSession::new(id, cmd.user_id);

        // 2. Apply seed values, schema-checked like any other slot write
        if let Some(seed) = &cmd.seed {
            session.merge_slots(seed)?;
        }

        // 3. Persist; a duplicate id surfaces to the caller
        self.store.create(&session).await?;

        tracing::info!(session_id = %session.id(), "Report session started");

        let first_question = session
            .current_question()
            .unwrap_or(script::OPENING_QUESTION)
            .to_string();

        Ok(CreateSessionResult {
            session,
            first_question,
        })
    }
}
