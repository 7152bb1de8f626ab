//! Lifecycle state of a report session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a report session.
///
/// The only valid transition is `Active -> Completed`; it happens at
/// most once and never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
}

impl SessionStatus {
    /// True while the session still accepts answers.
    pub fn is_mutable(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    /// True once the session has reached its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }

    /// Whether moving from this status into `target` is allowed.
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!((self, target), (Active, Completed))
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "Active",
            SessionStatus::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}
