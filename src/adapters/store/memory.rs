//! In-memory session store for testing and as a degradation fallback.
//!
//! Keeps sessions in a process-local map with simulated TTL semantics:
//! every write restamps the expiry deadline, reads past the deadline
//! miss. Not durable across restarts; the Redis store is the primary.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::domain::foundation::SessionId;
use crate::domain::report::ReportSession;
use crate::ports::{SessionMutation, SessionStore, SessionStoreError};

/// TTL applied when none is configured.
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// One stored session with its expiry deadline.
#[derive(Debug)]
struct SessionEntry {
    session: ReportSession,
    expires_at: Instant,
}

/// In-memory session store.
///
/// The outer map lock is held only to look up or change entries; each
/// entry carries its own mutex, so turns on different sessions never
/// contend and racing turns on one session serialize per key.
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Creates a store with the given session TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Removes every expired entry and returns how many went.
    ///
    /// Expiry is otherwise lazy (checked on access); call this
    /// periodically to bound memory on long-running processes.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let expired: Vec<SessionId> = entries
            .iter()
            .filter_map(|(id, entry)| {
                // A locked entry is mid-turn, leave it for the next sweep.
                let guard = entry.try_lock().ok()?;
                (guard.expires_at <= now).then_some(*id)
            })
            .collect();

        for id in &expired {
            entries.remove(id);
        }
        expired.len()
    }

    /// Looks up a live entry, removing it when expired.
    async fn live_entry(
        &self,
        id: &SessionId,
    ) -> Result<Arc<Mutex<SessionEntry>>, SessionStoreError> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(id).cloned()
        };
        let Some(entry) = entry else {
            return Err(SessionStoreError::not_found(*id));
        };

        let expired = { entry.lock().await.expires_at <= Instant::now() };
        if expired {
            let mut entries = self.entries.write().await;
            if let Some(current) = entries.get(id) {
                if Arc::ptr_eq(current, &entry) {
                    entries.remove(id);
                }
            }
            return Err(SessionStoreError::not_found(*id));
        }

        Ok(entry)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &ReportSession) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.get(session.id()) {
            let live = existing.lock().await.expires_at > Instant::now();
            if live {
                return Err(SessionStoreError::already_exists(*session.id()));
            }
        }

        entries.insert(
            *session.id(),
            Arc::new(Mutex::new(SessionEntry {
                session: session.clone(),
                expires_at: Instant::now() + self.ttl,
            })),
        );
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<ReportSession, SessionStoreError> {
        let entry = self.live_entry(id).await?;
        let guard = entry.lock().await;
        Ok(guard.session.clone())
    }

    async fn update(
        &self,
        id: &SessionId,
        apply: SessionMutation<'_>,
    ) -> Result<ReportSession, SessionStoreError> {
        let entry = self.live_entry(id).await?;
        let mut guard = entry.lock().await;

        apply(&mut guard.session);
        guard.expires_at = Instant::now() + self.ttl;
        Ok(guard.session.clone())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use tokio::time::sleep;

    fn test_session() -> ReportSession {
        ReportSession::new(SessionId::new(), UserId::new("worker-1").unwrap())
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = MemorySessionStore::default();
        let session = test_session();

        store.create(&session).await.unwrap();
        let loaded = store.get(session.id()).await.unwrap();

        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn create_twice_reports_the_collision() {
        let store = MemorySessionStore::default();
        let session = test_session();

        store.create(&session).await.unwrap();
        let err = store.create(&session).await.unwrap_err();

        assert!(matches!(err, SessionStoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemorySessionStore::default();
        let err = store.get(&SessionId::new()).await.unwrap_err();

        assert!(matches!(err, SessionStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_applies_and_returns_the_new_state() {
        let store = MemorySessionStore::default();
        let session = test_session();
        store.create(&session).await.unwrap();

        let updated = store
            .update(session.id(), &|s| {
                let _ = s.record_answer("first answer");
            })
            .await
            .unwrap();

        assert_eq!(updated.turn_count(), 1);
        assert_eq!(store.get(session.id()).await.unwrap().turn_count(), 1);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemorySessionStore::default();
        let err = store
            .update(&SessionId::new(), &|_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, SessionStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_removes_and_is_idempotent() {
        let store = MemorySessionStore::default();
        let session = test_session();
        store.create(&session).await.unwrap();

        store.delete(session.id()).await.unwrap();
        assert!(store.get(session.id()).await.is_err());

        store.delete(session.id()).await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_are_not_found() {
        let store = MemorySessionStore::new(Duration::from_millis(40));
        let session = test_session();
        store.create(&session).await.unwrap();

        sleep(Duration::from_millis(90)).await;

        let err = store.get(session.id()).await.unwrap_err();
        assert!(matches!(err, SessionStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn updates_slide_the_expiry_deadline() {
        let store = MemorySessionStore::new(Duration::from_millis(400));
        let session = test_session();
        store.create(&session).await.unwrap();

        sleep(Duration::from_millis(250)).await;
        store.update(session.id(), &|_| {}).await.unwrap();

        // Past the original deadline, inside the refreshed one.
        sleep(Duration::from_millis(250)).await;
        assert!(store.get(session.id()).await.is_ok());

        sleep(Duration::from_millis(450)).await;
        assert!(store.get(session.id()).await.is_err());
    }

    #[tokio::test]
    async fn expired_id_can_be_created_again() {
        let store = MemorySessionStore::new(Duration::from_millis(40));
        let session = test_session();
        store.create(&session).await.unwrap();

        sleep(Duration::from_millis(90)).await;
        store.create(&session).await.unwrap();
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() {
        let store = MemorySessionStore::new(Duration::from_millis(40));
        let first = test_session();
        let second = test_session();
        store.create(&first).await.unwrap();
        store.create(&second).await.unwrap();

        sleep(Duration::from_millis(90)).await;
        let third = test_session();
        store.create(&third).await.unwrap();

        assert_eq!(store.purge_expired().await, 2);
        assert!(store.get(third.id()).await.is_ok());
    }

    #[tokio::test]
    async fn racing_updates_on_one_session_both_apply() {
        let store = Arc::new(MemorySessionStore::default());
        let session = test_session();
        store.create(&session).await.unwrap();

        let id = *session.id();
        let mut handles = Vec::new();
        for turn in 0..2 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update(&id, &move |s| {
                        let _ = s.record_answer(format!("answer {}", turn));
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get(&id).await.unwrap().turn_count(), 2);
    }
}
