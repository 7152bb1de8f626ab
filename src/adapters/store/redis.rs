//! Redis-backed session store for production deployments.
//!
//! Sessions serialize as one JSON value per key with a TTL that every
//! write refreshes. Per-key atomicity for `update` comes from a short
//! `SET NX PX` lock beside the session key:
//!
//! 1. SET lock NX PX to claim the key (bounded retries)
//! 2. GET, deserialize, apply the mutation, serialize, SET EX
//! 3. DEL the lock
//!
//! The lock TTL is a crash backstop only; the critical section is a
//! handful of commands, so a lock surviving to its TTL means the holder
//! died mid-update.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::SessionId;
use crate::domain::report::ReportSession;
use crate::ports::{SessionMutation, SessionStore, SessionStoreError};

/// Key prefix for session records.
const KEY_PREFIX: &str = "fieldscribe:session:";

/// Redis-backed session store.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
    ttl: Duration,
    lock_ttl: Duration,
    lock_retries: u32,
    lock_retry_delay: Duration,
}

impl RedisSessionStore {
    /// Creates a store over an existing connection.
    pub fn new(conn: MultiplexedConnection, ttl: Duration) -> Self {
        Self {
            conn,
            ttl,
            lock_ttl: Duration::from_secs(5),
            lock_retries: 10,
            lock_retry_delay: Duration::from_millis(50),
        }
    }

    /// Opens a connection to the given URL and wraps it.
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionStoreError::unavailable(format!("Invalid Redis URL: {}", e)))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| SessionStoreError::unavailable(e.to_string()))?;
        Ok(Self::new(conn, ttl))
    }

    /// Sets the per-key lock TTL.
    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    /// Sets how often a contended lock is retried before giving up.
    pub fn with_lock_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.lock_retries = retries;
        self.lock_retry_delay = delay;
        self
    }

    fn session_key(id: &SessionId) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }

    fn lock_key(id: &SessionId) -> String {
        format!("{}{}:lock", KEY_PREFIX, id)
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }

    /// Claims the per-session lock, retrying while contended.
    async fn acquire_lock(&self, lock_key: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();

        for _ in 0..=self.lock_retries {
            let claimed: Option<String> = redis::cmd("SET")
                .arg(lock_key)
                .arg("1")
                .arg("NX")
                .arg("PX")
                .arg(self.lock_ttl.as_millis() as u64)
                .query_async(&mut conn)
                .await
                .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

            if claimed.is_some() {
                return Ok(());
            }
            sleep(self.lock_retry_delay).await;
        }

        Err(SessionStoreError::unavailable(
            "Could not acquire session lock",
        ))
    }

    /// Drops the per-session lock, best effort.
    async fn release_lock(&self, lock_key: &str) {
        let mut conn = self.conn.clone();
        let _: Result<(), redis::RedisError> = conn.del(lock_key).await;
    }

    /// The read-modify-write cycle, run while holding the lock.
    async fn update_locked(
        &self,
        id: &SessionId,
        key: &str,
        apply: SessionMutation<'_>,
    ) -> Result<ReportSession, SessionStoreError> {
        let mut conn = self.conn.clone();

        let payload: Option<String> = conn
            .get(key)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;
        let Some(payload) = payload else {
            return Err(SessionStoreError::not_found(*id));
        };

        let mut session: ReportSession = serde_json::from_str(&payload)
            .map_err(|e| SessionStoreError::corrupt(e.to_string()))?;

        apply(&mut session);

        let updated = serde_json::to_string(&session)
            .map_err(|e| SessionStoreError::corrupt(e.to_string()))?;
        conn.set_ex::<_, _, ()>(key, updated, self.ttl_secs())
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

        Ok(session)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &ReportSession) -> Result<(), SessionStoreError> {
        let key = Self::session_key(session.id());
        let payload = serde_json::to_string(session)
            .map_err(|e| SessionStoreError::corrupt(e.to_string()))?;

        let mut conn = self.conn.clone();
        let stored: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&payload)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;

        if stored.is_none() {
            return Err(SessionStoreError::already_exists(*session.id()));
        }
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<ReportSession, SessionStoreError> {
        let key = Self::session_key(id);
        let mut conn = self.conn.clone();

        let payload: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;
        let Some(payload) = payload else {
            return Err(SessionStoreError::not_found(*id));
        };

        serde_json::from_str(&payload).map_err(|e| SessionStoreError::corrupt(e.to_string()))
    }

    async fn update(
        &self,
        id: &SessionId,
        apply: SessionMutation<'_>,
    ) -> Result<ReportSession, SessionStoreError> {
        let key = Self::session_key(id);
        let lock_key = Self::lock_key(id);

        self.acquire_lock(&lock_key).await?;
        let result = self.update_locked(id, &key, apply).await;
        self.release_lock(&lock_key).await;
        result
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        let key = Self::session_key(id);
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(&key)
            .await
            .map_err(|e: redis::RedisError| SessionStoreError::unavailable(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("ttl", &self.ttl)
            .field("lock_ttl", &self.lock_ttl)
            .finish_non_exhaustive()
    }
}
