//! Session store adapters.
//!
//! - `memory` - in-process store with TTL expiry, the development default
//! - `redis` - Redis-backed store for multi-instance deployments
//! - `failover` - wrapper that degrades to a fallback store during outages

mod failover;
mod memory;
mod redis;

pub use failover::FailoverSessionStore;
pub use memory::MemorySessionStore;
pub use redis::RedisSessionStore;

use std::sync::Arc;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::ports::SessionStore;

/// Builds the session store for the configured deployment.
///
/// With Redis configured, the store is Redis fronted by an in-memory
/// fallback, so an outage degrades to process-local persistence instead
/// of failing interviews mid-turn. Without Redis, or when the initial
/// connection fails, the in-memory store runs alone.
pub async fn build_session_store(
    redis: Option<&RedisConfig>,
    session_ttl: Duration,
) -> Arc<dyn SessionStore> {
    let Some(config) = redis else {
        tracing::info!("No Redis configured, using in-memory session store");
        return Arc::new(MemorySessionStore::new(session_ttl));
    };

    let connect = tokio::time::timeout(
        config.connect_timeout(),
        RedisSessionStore::connect(&config.url, session_ttl),
    )
    .await;

    match connect {
        Ok(Ok(primary)) => {
            tracing::info!("Session store: Redis with in-memory failover");
            Arc::new(FailoverSessionStore::new(
                primary,
                MemorySessionStore::new(session_ttl),
            ))
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Redis connection failed, using in-memory session store");
            Arc::new(MemorySessionStore::new(session_ttl))
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = config.connect_timeout_secs,
                "Redis connection timed out, using in-memory session store"
            );
            Arc::new(MemorySessionStore::new(session_ttl))
        }
    }
}
