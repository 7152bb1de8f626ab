//! Interview policy - pure completion and follow-up decisions.
//!
//! Everything here is deterministic and side-effect free so the
//! decision logic stays testable without a store or generation backend.

mod completion;
mod follow_up;

pub use completion::{CompletionPolicy, CompletionTunables};
pub use follow_up::urgent_follow_up;
