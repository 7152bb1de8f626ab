//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Generation
//!
//! - `Generator` - Port for the text generation backend
//!
//! ## Persistence
//!
//! - `SessionStore` - Port for report session persistence

mod generation;
mod session_store;

pub use generation::{GenerationError, Generator};
pub use session_store::{SessionMutation, SessionStore, SessionStoreError};
