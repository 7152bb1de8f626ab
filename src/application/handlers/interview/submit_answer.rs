//! SubmitAnswerHandler - Process one interview turn
//!
//! The turn pipeline: extract slot updates from the answer, evaluate
//! the completion policy and urgent-follow-up rules against a working
//! copy, generate the acknowledgement concurrently with the next
//! question or summary, then persist through the store's atomic update.
//! Every generation call degrades to a deterministic fallback, so a
//! turn never fails because the generation backend did.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::policy::{urgent_follow_up, CompletionPolicy};
use crate::domain::report::{script, ReportSession, SlotName, SlotUpdate};
use crate::ports::{Generator, SessionStore, SessionStoreError};

/// Deadline for each generation call within a turn.
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Command to submit one answer
#[derive(Debug, Clone)]
pub struct SubmitAnswerCommand {
    pub session_id: SessionId,
    pub answer: String,
}

/// Result of one interview turn
#[derive(Debug, Clone)]
pub struct SubmitAnswerResult {
    /// Short reaction to the answer, always present.
    pub acknowledgement: String,
    /// The next question; `None` once the session is complete.
    pub next_question: Option<String>,
    pub is_complete: bool,
    /// The report summary; present once the session is complete.
    pub summary: Option<String>,
    /// Post-turn session snapshot as persisted.
    pub session: ReportSession,
}

/// Error type for submitting answers
#[derive(Debug, Clone)]
pub enum SubmitAnswerError {
    /// Session not found
    NotFound(SessionId),
    /// Storage error
    Storage(String),
    /// Domain error
    Domain(DomainError),
}

impl std::fmt::Display for SubmitAnswerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitAnswerError::NotFound(id) => write!(f, "Session not found: {}", id),
            SubmitAnswerError::Storage(err) => write!(f, "Storage error: {}", err),
            SubmitAnswerError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SubmitAnswerError {}

impl From<DomainError> for SubmitAnswerError {
    fn from(err: DomainError) -> Self {
        SubmitAnswerError::Domain(err)
    }
}

impl From<SessionStoreError> for SubmitAnswerError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound { id } => SubmitAnswerError::NotFound(id),
            other => SubmitAnswerError::Storage(other.to_string()),
        }
    }
}

/// Handler for interview turns
pub struct SubmitAnswerHandler<G: ?Sized + Generator> {
    store: Arc<dyn SessionStore>,
    generator: Arc<G>,
    policy: CompletionPolicy,
    generation_timeout: Duration,
}

impl<G: ?Sized + Generator> SubmitAnswerHandler<G> {
    pub fn new(store: Arc<dyn SessionStore>, generator: Arc<G>, policy: CompletionPolicy) -> Self {
        Self {
            store,
            generator,
            policy,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Sets the per-call generation deadline.
    pub fn with_generation_timeout(mut self, generation_timeout: Duration) -> Self {
        self.generation_timeout = generation_timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: SubmitAnswerCommand,
    ) -> Result<SubmitAnswerResult, SubmitAnswerError> {
        // 1. Load the stored record
        let session = self.store.get(&cmd.session_id).await?;

        // 2. A completed session absorbs the call without mutating
        if session.is_completed() {
            return Ok(SubmitAnswerResult {
                acknowledgement: script::NEUTRAL_ACKNOWLEDGEMENT.to_string(),
                next_question: None,
                is_complete: true,
                summary: session.summary().map(str::to_string),
                session,
            });
        }

        // 3. Extract slot updates; a degraded backend yields an empty update
        let update = self.extract_slot_update(&cmd.answer, &session).await;

        // 4. Run the turn against a working copy for the policy decision
        let loaded_turns = session.turn_count();
        let mut working = session;
        working.record_answer(cmd.answer.clone())?;
        working.merge_slots(&update)?;

        // 5. Decide completion; an urgent follow-up defers it once per session
        let mut completing = self.policy.should_complete(&working);
        let focus = urgent_follow_up(&working);
        let mut defer_follow_up = false;
        if completing && !working.follow_up_used() {
            if let Some(slot) = focus {
                completing = false;
                defer_follow_up = true;
                tracing::info!(
                    session_id = %cmd.session_id,
                    slot = slot.key(),
                    "Urgent follow-up deferred completion"
                );
            }
        }

        // 6. Generate the acknowledgement and the reply concurrently
        let (acknowledgement, next_question, summary) = if completing {
            let (ack, summary) = tokio::join!(
                self.generate_acknowledgement(&cmd.answer, &working),
                self.generate_summary(&working)
            );
            (ack, None, Some(summary))
        } else {
            let (ack, question) = tokio::join!(
                self.generate_acknowledgement(&cmd.answer, &working),
                self.generate_next_question(&working, focus)
            );
            (ack, Some(question), None)
        };

        // 7. Persist on a spawned task so a dropped caller cannot lose the turn
        let store = Arc::clone(&self.store);
        let session_id = cmd.session_id;
        let answer = cmd.answer;
        let question_to_store = next_question;
        let summary_to_store = summary;
        let persisted = tokio::spawn(async move {
            let apply = move |s: &mut ReportSession| {
                // Lost race: leave the winner's turn intact.
                if !s.is_active() || s.turn_count() != loaded_turns {
                    return;
                }
                let _ = s.record_answer(answer.clone());
                let _ = s.merge_slots(&update);
                if defer_follow_up {
                    let _ = s.mark_follow_up_used();
                }
                if let Some(summary) = &summary_to_store {
                    let _ = s.complete(summary.clone());
                } else if let Some(question) = &question_to_store {
                    let _ = s.set_current_question(question.clone());
                }
            };
            store.update(&session_id, &apply).await
        });

        let stored = persisted
            .await
            .map_err(|err| SubmitAnswerError::Storage(err.to_string()))??;

        // 8. Answer from the stored record, which also covers a lost race
        Ok(SubmitAnswerResult {
            acknowledgement,
            next_question: stored.current_question().map(str::to_string),
            is_complete: stored.is_completed(),
            summary: stored.summary().map(str::to_string),
            session: stored,
        })
    }

    /// Extraction with its fallback: an empty update.
    async fn extract_slot_update(&self, answer: &str, session: &ReportSession) -> SlotUpdate {
        let call = self.generator.extract_slots(answer, session.slots());
        match timeout(self.generation_timeout, call).await {
            Ok(Ok(update)) => update,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Slot extraction failed, continuing without updates"
                );
                SlotUpdate::new()
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %session.id(),
                    "Slot extraction timed out, continuing without updates"
                );
                SlotUpdate::new()
            }
        }
    }

    /// Acknowledgement with its fallback: the fixed neutral text.
    async fn generate_acknowledgement(&self, answer: &str, session: &ReportSession) -> String {
        let call = self.generator.acknowledge(answer, session.slots());
        match timeout(self.generation_timeout, call).await {
            Ok(Ok(ack)) => ack,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Acknowledgement generation failed, using the neutral text"
                );
                script::NEUTRAL_ACKNOWLEDGEMENT.to_string()
            }
            Err(_) => script::NEUTRAL_ACKNOWLEDGEMENT.to_string(),
        }
    }

    /// Next question with its fallback: the scripted first-unfilled question.
    async fn generate_next_question(
        &self,
        session: &ReportSession,
        focus: Option<SlotName>,
    ) -> String {
        let call = self
            .generator
            .next_question(session.history(), session.slots(), focus);
        match timeout(self.generation_timeout, call).await {
            Ok(Ok(question)) => question,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Question generation failed, using the scripted fallback"
                );
                script::next_fallback_question(session.slots()).to_string()
            }
            Err(_) => script::next_fallback_question(session.slots()).to_string(),
        }
    }

    /// Summary with its fallback: the deterministic placeholder.
    async fn generate_summary(&self, session: &ReportSession) -> String {
        let call = self.generator.summarize(session.history(), session.slots());
        match timeout(self.generation_timeout, call).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %session.id(),
                    error = %err,
                    "Summary generation failed, using the placeholder"
                );
                script::placeholder_summary(session.slots(), session.turn_count())
            }
            Err(_) => script::placeholder_summary(session.slots(), session.turn_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generation::{GeneratorCall, MockGenerator};
    use crate::adapters::store::MemorySessionStore;
    use crate::domain::foundation::UserId;
    use crate::domain::policy::CompletionTunables;

    fn handler(
        store: Arc<MemorySessionStore>,
        generator: MockGenerator,
        policy: CompletionPolicy,
    ) -> SubmitAnswerHandler<MockGenerator> {
        SubmitAnswerHandler::new(store, Arc::new(generator), policy)
    }

    fn default_policy() -> CompletionPolicy {
        CompletionPolicy::new(CompletionTunables::default())
    }

    /// Policy that completes as soon as the required slots are filled.
    fn eager_policy() -> CompletionPolicy {
        CompletionPolicy::new(CompletionTunables {
            min_turns: 1,
            score_gate_turn: 1,
            score_threshold: 0.0,
            ..Default::default()
        })
    }

    async fn seeded_session(store: &MemorySessionStore) -> SessionId {
        let session = ReportSession::new(SessionId::new(), UserId::new("worker-1").unwrap());
        let id = *session.id();
        store.create(&session).await.unwrap();
        id
    }

    fn required_extraction() -> SlotUpdate {
        SlotUpdate::new()
            .with(SlotName::Customer, "Acme")
            .with(SlotName::Project, "Project X")
            .with(SlotName::NextAction, "send a quote")
    }

    #[tokio::test]
    async fn test_first_answer_fills_slots_and_continues() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let mock = MockGenerator::new()
            .with_extraction(required_extraction())
            .with_acknowledgement("Noted, Acme and Project X.")
            .with_question("Who attended the meeting?");
        let handler = handler(store.clone(), mock, default_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "Visited customer Acme, discussed Project X, next step is to send a quote"
                    .to_string(),
            })
            .await
            .unwrap();

        assert!(!result.is_complete);
        assert_eq!(result.acknowledgement, "Noted, Acme and Project X.");
        assert_eq!(
            result.next_question.as_deref(),
            Some("Who attended the meeting?")
        );
        assert!(result.session.slots().required_complete());
        assert_eq!(result.session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_result_mirrors_the_stored_record() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let handler = handler(store.clone(), MockGenerator::new(), default_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "We met at their office".to_string(),
            })
            .await
            .unwrap();

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored, result.session);
        assert_eq!(
            stored.current_question().map(str::to_string),
            result.next_question
        );
    }

    #[tokio::test]
    async fn test_history_grows_one_per_turn() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let handler = handler(store.clone(), MockGenerator::new(), default_policy());

        for turn in 1..=2 {
            let result = handler
                .handle(SubmitAnswerCommand {
                    session_id: id,
                    answer: format!("answer number {}", turn),
                })
                .await
                .unwrap();
            assert_eq!(result.session.turn_count(), turn);
        }
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let store = Arc::new(MemorySessionStore::default());
        let handler = handler(store, MockGenerator::new(), default_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: SessionId::new(),
                answer: "hello".to_string(),
            })
            .await;

        assert!(matches!(result, Err(SubmitAnswerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_completed_session_submission_is_a_noop() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        store
            .update(&id, &|s: &mut ReportSession| {
                let _ = s.complete("Visit summary.");
            })
            .await
            .unwrap();

        let mock = MockGenerator::new();
        let handler = handler(store.clone(), mock.clone(), default_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "one more thing".to_string(),
            })
            .await
            .unwrap();

        assert!(result.is_complete);
        assert_eq!(result.summary.as_deref(), Some("Visit summary."));
        assert_eq!(result.next_question, None);
        assert_eq!(result.session.turn_count(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_outage_still_advances_the_interview() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let handler = handler(store.clone(), MockGenerator::new().failing(), default_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "We talked about the new rollout".to_string(),
            })
            .await
            .unwrap();

        assert!(!result.is_complete);
        assert_eq!(result.acknowledgement, script::NEUTRAL_ACKNOWLEDGEMENT);
        assert_eq!(
            result.next_question.as_deref(),
            Some(script::fallback_question(SlotName::Customer))
        );
        assert_eq!(store.get(&id).await.unwrap().turn_count(), 1);
    }

    #[tokio::test]
    async fn test_urgent_follow_up_defers_completion_and_steers_the_question() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let mock = MockGenerator::new()
            .with_extraction(required_extraction())
            .with_question("Which competitor came up?");
        let handler = handler(store.clone(), mock.clone(), eager_policy());

        let result = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "All agreed, though a competitor was also pitching".to_string(),
            })
            .await
            .unwrap();

        assert!(!result.is_complete);
        assert_eq!(result.next_question.as_deref(), Some("Which competitor came up?"));
        assert!(result.session.follow_up_used());
        assert!(mock.get_calls().contains(&GeneratorCall::NextQuestion {
            focus: Some(SlotName::Competitors),
            transcript_len: 1,
        }));
    }

    #[tokio::test]
    async fn test_urgent_follow_up_defers_completion_only_once() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        let mock = MockGenerator::new()
            .with_extraction(required_extraction())
            .with_summary("Deal summary with competitor context.");
        let handler = handler(store.clone(), mock, eager_policy());

        let first = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "Signed off, though a competitor was mentioned".to_string(),
            })
            .await
            .unwrap();
        assert!(!first.is_complete);

        let second = handler
            .handle(SubmitAnswerCommand {
                session_id: id,
                answer: "No details on the competitor, they kept it vague".to_string(),
            })
            .await
            .unwrap();

        assert!(second.is_complete);
        assert_eq!(
            second.summary.as_deref(),
            Some("Deal summary with competitor context.")
        );
        assert_eq!(second.next_question, None);
    }

    #[tokio::test]
    async fn test_racing_submissions_append_exactly_once() {
        let store = Arc::new(MemorySessionStore::default());
        let id = seeded_session(&store).await;
        // The delay keeps both turns in generation until both have loaded
        // the same stored record, forcing the duplicate-delivery race.
        let slow_mock = MockGenerator::new().with_delay(Duration::from_millis(50));
        let handler = Arc::new(handler(store.clone(), slow_mock, default_policy()));

        let first = handler.handle(SubmitAnswerCommand {
            session_id: id,
            answer: "duplicate delivery A".to_string(),
        });
        let second = handler.handle(SubmitAnswerCommand {
            session_id: id,
            answer: "duplicate delivery B".to_string(),
        });
        let (a, b) = tokio::join!(first, second);

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(store.get(&id).await.unwrap().turn_count(), 1);
    }
}
