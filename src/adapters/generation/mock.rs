//! Mock generator for testing.
//!
//! Provides a configurable mock implementation of the Generator port,
//! allowing tests to run interviews without a real model behind them.
//!
//! # Features
//!
//! - Pre-scripted responses per operation (consumed in order)
//! - Neutral defaults when a script runs dry
//! - Simulated delays for timeout testing
//! - A fail-all switch for outage testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockGenerator::new()
//!     .with_extraction(SlotUpdate::new().with(SlotName::Customer, "Acme"))
//!     .with_question("Which project did you discuss?");
//!
//! let update = generator.extract_slots("Visited Acme", &slots).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::report::{Exchange, SlotName, SlotUpdate, SlotValues};
use crate::ports::{GenerationError, Generator};

/// Default acknowledgement when no script is queued.
const DEFAULT_ACKNOWLEDGEMENT: &str = "Understood.";

/// Default question when no script is queued.
const DEFAULT_QUESTION: &str = "Could you tell me a bit more about the visit?";

/// Default summary when no script is queued.
const DEFAULT_SUMMARY: &str = "Mock visit summary.";

/// One recorded call, for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorCall {
    /// `extract_slots` was called with this answer.
    ExtractSlots { answer: String },
    /// `acknowledge` was called with this answer.
    Acknowledge { answer: String },
    /// `next_question` was called with this focus and transcript size.
    NextQuestion {
        focus: Option<SlotName>,
        transcript_len: usize,
    },
    /// `summarize` was called with this transcript size.
    Summarize { transcript_len: usize },
}

/// Mock generator for testing.
///
/// Clones share their scripts and call history, so a test can keep one
/// handle for assertions while the handler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    /// Scripted slot extractions (consumed in order).
    extractions: Arc<Mutex<VecDeque<SlotUpdate>>>,
    /// Scripted acknowledgements.
    acknowledgements: Arc<Mutex<VecDeque<String>>>,
    /// Scripted next questions.
    questions: Arc<Mutex<VecDeque<String>>>,
    /// Scripted summaries.
    summaries: Arc<Mutex<VecDeque<String>>>,
    /// When set, every operation fails as unavailable.
    fail_all: Arc<Mutex<bool>>,
    /// Simulated latency per call.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<GeneratorCall>>>,
}

impl MockGenerator {
    /// Creates a mock with empty scripts and neutral defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a slot extraction result.
    pub fn with_extraction(self, update: SlotUpdate) -> Self {
        self.extractions.lock().unwrap().push_back(update);
        self
    }

    /// Queues an acknowledgement.
    pub fn with_acknowledgement(self, text: impl Into<String>) -> Self {
        self.acknowledgements.lock().unwrap().push_back(text.into());
        self
    }

    /// Queues a next question.
    pub fn with_question(self, text: impl Into<String>) -> Self {
        self.questions.lock().unwrap().push_back(text.into());
        self
    }

    /// Queues a summary.
    pub fn with_summary(self, text: impl Into<String>) -> Self {
        self.summaries.lock().unwrap().push_back(text.into());
        self
    }

    /// Makes every operation fail as unavailable.
    pub fn failing(self) -> Self {
        *self.fail_all.lock().unwrap() = true;
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Flips the fail-all switch at runtime.
    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    /// Returns the number of calls made to this generator.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Records a call, waits out the delay, and checks the fail switch.
    async fn observe(&self, call: GeneratorCall) -> Result<(), GenerationError> {
        self.calls.lock().unwrap().push(call);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if *self.fail_all.lock().unwrap() {
            return Err(GenerationError::unavailable("mock generation outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn extract_slots(
        &self,
        answer: &str,
        _slots: &SlotValues,
    ) -> Result<SlotUpdate, GenerationError> {
        self.observe(GeneratorCall::ExtractSlots {
            answer: answer.to_string(),
        })
        .await?;

        Ok(self
            .extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn acknowledge(
        &self,
        answer: &str,
        _slots: &SlotValues,
    ) -> Result<String, GenerationError> {
        self.observe(GeneratorCall::Acknowledge {
            answer: answer.to_string(),
        })
        .await?;

        Ok(self
            .acknowledgements
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_ACKNOWLEDGEMENT.to_string()))
    }

    async fn next_question(
        &self,
        transcript: &[Exchange],
        _slots: &SlotValues,
        focus: Option<SlotName>,
    ) -> Result<String, GenerationError> {
        self.observe(GeneratorCall::NextQuestion {
            focus,
            transcript_len: transcript.len(),
        })
        .await?;

        Ok(self
            .questions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_QUESTION.to_string()))
    }

    async fn summarize(
        &self,
        transcript: &[Exchange],
        _slots: &SlotValues,
    ) -> Result<String, GenerationError> {
        self.observe(GeneratorCall::Summarize {
            transcript_len: transcript.len(),
        })
        .await?;

        Ok(self
            .summaries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()))
    }
}
