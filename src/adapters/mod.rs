//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `generation` - Text generation backends (Anthropic, mock)
//! - `store` - Session persistence (in-memory, Redis, failover)

pub mod generation;
pub mod store;

pub use generation::{AnthropicGenerator, AnthropicGeneratorConfig, MockGenerator};
pub use store::{build_session_store, FailoverSessionStore, MemorySessionStore, RedisSessionStore};
