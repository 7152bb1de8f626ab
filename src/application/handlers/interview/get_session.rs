//! GetSessionHandler - Query current session state

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::report::ReportSession;
use crate::ports::{SessionStore, SessionStoreError};

/// Query to get session state
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

/// Result of getting session state
#[derive(Debug, Clone)]
pub struct GetSessionResult {
    pub session: ReportSession,
}

/// Error type for getting session state
#[derive(Debug, Clone)]
pub enum GetSessionError {
    /// Session not found
    NotFound(SessionId),
    /// Storage error
    Storage(String),
}

impl std::fmt::Display for GetSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetSessionError::NotFound(id) => write!(f, "Session not found: {}", id),
            GetSessionError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for GetSessionError {}

impl From<SessionStoreError> for GetSessionError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound { id } => GetSessionError::NotFound(id),
            other => GetSessionError::Storage(other.to_string()),
        }
    }
}

/// Handler for getting session state
pub struct GetSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl GetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<GetSessionResult, GetSessionError> {
        let session = self.store.get(&query.session_id).await?;

        Ok(GetSessionResult { session })
    }
}
