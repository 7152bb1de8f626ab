//! Report session aggregate entity.
//!
//! A session is one in-progress conversation with a field worker. The
//! orchestrator holds the working copy for the duration of a turn; the
//! session store owns the serialized form between turns.

use crate::domain::foundation::{
    DomainError, ErrorCode, SessionId, SessionStatus, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

use super::script;
use super::slots::{SlotName, SlotUpdate, SlotValues};

/// One question/answer exchange in the transcript.
///
/// Insertion order is meaningful: the history is replayed verbatim into
/// generation prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub answered_at: Timestamp,
}

/// Report session aggregate.
///
/// # Invariants
///
/// - `slots` always holds the full declared key set
/// - `history` is append-only; one record per answered turn
/// - `status` moves `Active -> Completed` at most once; a completed
///   session accepts no further mutation
/// - `current_question` is set while active, cleared on completion
/// - `summary` is written exactly once, at completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSession {
    /// Unique identifier for this session.
    id: SessionId,

    /// Field worker the report is attributed to.
    owner_id: UserId,

    /// Current status (Active or Completed).
    status: SessionStatus,

    /// When the session was created.
    started_at: Timestamp,

    /// When the session completed; None while active.
    ended_at: Option<Timestamp>,

    /// The full slot map (empty string = unfilled).
    slots: SlotValues,

    /// Ordered conversation transcript.
    history: Vec<Exchange>,

    /// The question currently awaiting an answer.
    current_question: Option<String>,

    /// Final summary, written once at completion.
    summary: Option<String>,

    /// Whether an urgent follow-up already deferred completion once.
    follow_up_used: bool,
}

impl ReportSession {
    /// Creates a new active session with the fixed opening question.
    pub fn new(id: SessionId, owner_id: UserId) -> Self {
        Self {
            id,
            owner_id,
            status: SessionStatus::Active,
            started_at: Timestamp::now(),
            ended_at: None,
            slots: SlotValues::new(),
            history: Vec::new(),
            current_question: Some(script::OPENING_QUESTION.to_string()),
            summary: None,
            follow_up_used: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the owner's user ID.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Returns the current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true while the session accepts answers.
    pub fn is_active(&self) -> bool {
        self.status.is_mutable()
    }

    /// Returns true once the session has completed.
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns when the session was created.
    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    /// Returns when the session completed, if it has.
    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    /// Returns the slot values.
    pub fn slots(&self) -> &SlotValues {
        &self.slots
    }

    /// Returns the conversation transcript.
    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    /// Number of answered turns.
    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the question currently awaiting an answer.
    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    /// Returns the final summary, if written.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns whether an urgent follow-up already deferred completion.
    pub fn follow_up_used(&self) -> bool {
        self.follow_up_used
    }

    /// Returns the last `n` answers, oldest first.
    pub fn recent_answers(&self, n: usize) -> Vec<&str> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].iter().map(|e| e.answer.as_str()).collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Merges extracted slot values into the session.
    ///
    /// Returns the slots that actually changed. Filled slots are never
    /// un-filled (see [`SlotValues::merge`]).
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is completed
    pub fn merge_slots(&mut self, update: &SlotUpdate) -> Result<Vec<SlotName>, DomainError> {
        self.ensure_mutable()?;
        Ok(self.slots.merge(update))
    }

    /// Appends the answer to the open question onto the history.
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is completed
    pub fn record_answer(&mut self, answer: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;

        let question = self.current_question.clone().unwrap_or_default();
        self.history.push(Exchange {
            question,
            answer: answer.into(),
            answered_at: Timestamp::now(),
        });
        Ok(())
    }

    /// Sets the next question to wait on.
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is completed
    pub fn set_current_question(&mut self, question: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.current_question = Some(question.into());
        Ok(())
    }

    /// Records that an urgent follow-up deferred a completion decision.
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is completed
    pub fn mark_follow_up_used(&mut self) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.follow_up_used = true;
        Ok(())
    }

    /// Completes the session with its one-time summary.
    ///
    /// Clears the open question and stamps `ended_at`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if already completed
    pub fn complete(&mut self, summary: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(&SessionStatus::Completed) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Session is already completed",
            ));
        }

        self.status = SessionStatus::Completed;
        self.ended_at = Some(Timestamp::now());
        self.summary = Some(summary.into());
        self.current_question = None;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates that the session can be modified.
    fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.status.is_mutable() {
            Ok(())
        } else {
            Err(DomainError::session_completed(self.id))
        }
    }
}
