//! Anthropic generator - Generator implementation for the Claude API.
//!
//! Drives the four interview operations (extraction, acknowledgement,
//! next question, summary) through Anthropic's messages endpoint.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicGeneratorConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let generator = AnthropicGenerator::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::report::{Exchange, SlotName, SlotUpdate, SlotValues};
use crate::ports::{GenerationError, Generator};

use super::parse::{extract_json_object, truncate_chars};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic generator.
#[derive(Debug, Clone)]
pub struct AnthropicGeneratorConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Character bound for acknowledgements.
    pub ack_max_chars: usize,
}

impl AnthropicGeneratorConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            max_tokens: 1024,
            ack_max_chars: 120,
        }
    }

    /// Overrides the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the retry budget for transient failures.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the completion token cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Overrides the acknowledgement character bound.
    pub fn with_ack_max_chars(mut self, ack_max_chars: usize) -> Self {
        self.ack_max_chars = ack_max_chars;
        self
    }

    /// Exposes the key for request headers.
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API generator implementation.
pub struct AnthropicGenerator {
    config: AnthropicGeneratorConfig,
    client: Client,
}

impl AnthropicGenerator {
    /// Creates a new Anthropic generator with the given configuration.
    pub fn new(config: AnthropicGeneratorConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    /// Runs one completion with retries and returns the text content.
    async fn complete_text(
        &self,
        system: String,
        user_content: String,
        temperature: Option<f32>,
    ) -> Result<String, GenerationError> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: user_content,
            }],
            system: Some(system),
            max_tokens: self.config.max_tokens,
            temperature,
        };

        let mut last_error = GenerationError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&request).await {
                Ok(response) => match self.parse_text_response(response).await {
                    Ok(text) => return Ok(text),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }

    /// Sends a request and maps transport failures.
    async fn send_request(&self, request: &AnthropicRequest) -> Result<Response, GenerationError> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::timeout(self.config.timeout.as_secs() as u32)
                } else if e.is_connect() {
                    GenerationError::network(format!("Connection failed: {}", e))
                } else {
                    GenerationError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, GenerationError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(GenerationError::AuthenticationFailed),
            429 => {
                let retry_after = Self::parse_retry_after(&error_body);
                Err(GenerationError::rate_limited(retry_after))
            }
            400 => Err(GenerationError::InvalidRequest(error_body)),
            500..=599 => Err(GenerationError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(GenerationError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Reads a "try again in Ns" hint out of a 429 body, defaulting to 60.
    fn parse_retry_after(error_body: &str) -> u32 {
        let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) else {
            return 60;
        };
        parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .and_then(|s| s.split_once("try again in "))
            .and_then(|(_, rest)| {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            })
            .unwrap_or(60)
    }

    /// Extracts the joined text content from a response.
    async fn parse_text_response(&self, response: Response) -> Result<String, GenerationError> {
        let response = self.handle_response_status(response).await?;

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::parse(format!("Failed to parse response: {}", e)))?;

        if anthropic_response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(
                model = %self.config.model,
                "Generation stopped at the max_tokens limit"
            );
        }

        let text = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(GenerationError::parse("Response contained no text"));
        }
        Ok(text)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Prompt construction
    // ─────────────────────────────────────────────────────────────────────────

    /// One line per schema slot: key, then what belongs in it.
    fn schema_lines() -> String {
        SlotName::all()
            .iter()
            .map(|slot| format!("- {}: {}", slot.key(), slot.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One line per slot with its current value or an unfilled marker.
    fn slot_state_lines(slots: &SlotValues) -> String {
        SlotName::all()
            .iter()
            .map(|slot| {
                let value = slots.get(*slot);
                if value.is_empty() {
                    format!("- {}: (not captured yet)", slot.key())
                } else {
                    format!("- {}: {}", slot.key(), value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders the transcript as alternating question/answer lines.
    fn render_transcript(transcript: &[Exchange]) -> String {
        transcript
            .iter()
            .map(|exchange| format!("Q: {}\nA: {}", exchange.question, exchange.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extraction_system_prompt(slots: &SlotValues) -> String {
        format!(
            "You extract structured fields from a field sales rep's answer \
             about a customer visit.\n\n\
             Schema (the ONLY allowed keys):\n{}\n\n\
             Current values:\n{}\n\n\
             Reply with a single JSON object containing only keys whose value \
             the answer newly provides or improves. Values are short strings. \
             Reply with {{}} if the answer adds nothing. No prose, no code \
             fences, JSON only.",
            Self::schema_lines(),
            Self::slot_state_lines(slots),
        )
    }

    fn acknowledgement_system_prompt(&self) -> String {
        format!(
            "You are collecting a field activity report in a friendly chat. \
             Acknowledge the rep's answer in one short sentence of at most \
             {} characters. No questions, no advice, no emoji.",
            self.config.ack_max_chars
        )
    }

    fn question_system_prompt(slots: &SlotValues, focus: Option<SlotName>) -> String {
        let mut prompt = format!(
            "You are collecting a field activity report in a friendly chat. \
             Ask exactly one short question that fills a gap in the report.\n\n\
             Report state:\n{}",
            Self::slot_state_lines(slots),
        );
        if let Some(slot) = focus {
            prompt.push_str(&format!(
                "\n\nThe rep just touched on something urgent: ask specifically \
                 about {} ({}).",
                slot.label(),
                slot.description(),
            ));
        }
        prompt
    }

    fn summary_system_prompt() -> String {
        "You write concise field activity reports. Summarize the conversation \
         as a short structured report a sales manager can scan: customer and \
         occasion first, then what was discussed, agreed, and open. Plain \
         text, no markdown headings."
            .to_string()
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn extract_slots(
        &self,
        answer: &str,
        slots: &SlotValues,
    ) -> Result<SlotUpdate, GenerationError> {
        let text = self
            .complete_text(
                Self::extraction_system_prompt(slots),
                answer.to_string(),
                Some(0.0),
            )
            .await?;

        let value = extract_json_object(&text)
            .ok_or_else(|| GenerationError::parse("No JSON object in extraction output"))?;
        let parsed = SlotUpdate::from_json(&value)
            .ok_or_else(|| GenerationError::parse("Extraction output is not a JSON object"))?;

        if !parsed.unknown_keys.is_empty() {
            tracing::warn!(
                keys = ?parsed.unknown_keys,
                "Dropped slot keys outside the schema"
            );
        }
        Ok(parsed.update)
    }

    async fn acknowledge(
        &self,
        answer: &str,
        _slots: &SlotValues,
    ) -> Result<String, GenerationError> {
        let text = self
            .complete_text(self.acknowledgement_system_prompt(), answer.to_string(), None)
            .await?;

        let ack = truncate_chars(&text, self.config.ack_max_chars);
        if ack.is_empty() {
            return Err(GenerationError::parse("Empty acknowledgement"));
        }
        Ok(ack)
    }

    async fn next_question(
        &self,
        transcript: &[Exchange],
        slots: &SlotValues,
        focus: Option<SlotName>,
    ) -> Result<String, GenerationError> {
        let text = self
            .complete_text(
                Self::question_system_prompt(slots, focus),
                format!("Conversation so far:\n{}", Self::render_transcript(transcript)),
                None,
            )
            .await?;

        let question = text.trim().to_string();
        if question.is_empty() {
            return Err(GenerationError::parse("Empty question"));
        }
        Ok(question)
    }

    async fn summarize(
        &self,
        transcript: &[Exchange],
        slots: &SlotValues,
    ) -> Result<String, GenerationError> {
        let text = self
            .complete_text(
                Self::summary_system_prompt(),
                format!(
                    "Conversation:\n{}\n\nCaptured fields:\n{}",
                    Self::render_transcript(transcript),
                    Self::slot_state_lines(slots),
                ),
                None,
            )
            .await?;

        let summary = text.trim().to_string();
        if summary.is_empty() {
            return Err(GenerationError::parse("Empty summary"));
        }
        Ok(summary)
    }
}

impl std::fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[test]
    fn config_builder_works() {
        let config = AnthropicGeneratorConfig::new("test-key")
            .with_model("claude-3-haiku-20240307")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(5)
            .with_max_tokens(512)
            .with_ack_max_chars(80);

        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.ack_max_chars, 80);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn extraction_prompt_lists_every_schema_key() {
        let prompt = AnthropicGenerator::extraction_system_prompt(&SlotValues::new());

        for slot in SlotName::all() {
            assert!(
                prompt.contains(slot.key()),
                "schema prompt is missing {}",
                slot.key()
            );
        }
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn extraction_prompt_shows_current_values() {
        let mut slots = SlotValues::new();
        slots.set(SlotName::Customer, "Acme");

        let prompt = AnthropicGenerator::extraction_system_prompt(&slots);
        assert!(prompt.contains("- customer: Acme"));
        assert!(prompt.contains("- budget: (not captured yet)"));
    }

    #[test]
    fn question_prompt_carries_the_focus_instruction() {
        let without = AnthropicGenerator::question_system_prompt(&SlotValues::new(), None);
        let with = AnthropicGenerator::question_system_prompt(
            &SlotValues::new(),
            Some(SlotName::Competitors),
        );

        assert!(!without.contains("urgent"));
        assert!(with.contains("urgent"));
        assert!(with.contains("Competitors"));
    }

    #[test]
    fn transcript_renders_as_question_answer_lines() {
        let transcript = vec![
            Exchange {
                question: "Which customer?".to_string(),
                answer: "Acme.".to_string(),
                answered_at: Timestamp::now(),
            },
            Exchange {
                question: "What next?".to_string(),
                answer: "Send a quote.".to_string(),
                answered_at: Timestamp::now(),
            },
        ];

        let rendered = AnthropicGenerator::render_transcript(&transcript);
        assert_eq!(
            rendered,
            "Q: Which customer?\nA: Acme.\nQ: What next?\nA: Send a quote."
        );
    }

    #[test]
    fn parse_retry_after_reads_the_hint() {
        let error = r#"{"error":{"message":"Rate limited, try again in 12s"}}"#;
        assert_eq!(AnthropicGenerator::parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_defaults_without_a_hint() {
        let error = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        assert_eq!(AnthropicGenerator::parse_retry_after(error), 60);
    }
}
