//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the Fieldscribe domain.

mod ids;
mod timestamp;
mod session_status;
mod errors;

pub use ids::{SessionId, UserId};
pub use timestamp::Timestamp;
pub use session_status::SessionStatus;
pub use errors::{DomainError, ErrorCode, ValidationError};
