//! Text generation configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::generation::AnthropicGeneratorConfig;

use super::error::ValidationError;

/// Text generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Character bound for acknowledgements
    #[serde(default = "default_ack_max_chars")]
    pub ack_max_chars: usize,
}

impl GenerationConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Builds the generator configuration from this section.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequired` when no API key is configured.
    pub fn generator_config(&self) -> Result<AnthropicGeneratorConfig, ValidationError> {
        let Some(key) = self.anthropic_api_key.as_ref().filter(|k| !k.is_empty()) else {
            return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
        };

        Ok(AnthropicGeneratorConfig::new(key.clone())
            .with_model(self.model.clone())
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries)
            .with_max_tokens(self.max_tokens)
            .with_ack_max_chars(self.ack_max_chars))
    }

    /// Validate generation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_anthropic() {
            return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            max_tokens: default_max_tokens(),
            ack_max_chars: default_ack_max_chars(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_ack_max_chars() -> usize {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.ack_max_chars, 120);
    }

    #[test]
    fn test_timeout_duration() {
        let config = GenerationConfig {
            timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_has_anthropic_checks() {
        let config = GenerationConfig {
            anthropic_api_key: Some("sk-ant-xxx".to_string()),
            ..Default::default()
        };
        assert!(config.has_anthropic());
        assert!(!GenerationConfig::default().has_anthropic());
    }

    #[test]
    fn test_empty_key_counts_as_missing() {
        let config = GenerationConfig {
            anthropic_api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!config.has_anthropic());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_missing_key() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = GenerationConfig {
            anthropic_api_key: Some("sk-ant-xxx".to_string()),
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_generator_config_mapping() {
        let config = GenerationConfig {
            anthropic_api_key: Some("sk-ant-xxx".to_string()),
            model: "claude-haiku-3-5".to_string(),
            timeout_secs: 15,
            max_retries: 1,
            max_tokens: 512,
            ack_max_chars: 80,
        };

        let generator = config.generator_config().unwrap();
        assert_eq!(generator.model, "claude-haiku-3-5");
        assert_eq!(generator.timeout, Duration::from_secs(15));
        assert_eq!(generator.max_retries, 1);
        assert_eq!(generator.max_tokens, 512);
        assert_eq!(generator.ack_max_chars, 80);
    }

    #[test]
    fn test_generator_config_requires_key() {
        assert!(GenerationConfig::default().generator_config().is_err());
    }
}
