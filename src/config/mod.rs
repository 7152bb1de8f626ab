//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables through the
//! `config` and `dotenvy` crates. Variables carry the `FIELDSCRIBE`
//! prefix, with double underscores separating nested sections.
//!
//! # Example
//!
//! ```no_run
//! use fieldscribe::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Interview hard cap: {}", config.interview.hard_turn_cap);
//! ```

mod error;
mod generation;
mod interview;
mod redis;

pub use error::{ConfigError, ValidationError};
pub use generation::GenerationConfig;
pub use interview::InterviewConfig;
pub use redis::RedisConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the FieldScribe service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Text generation configuration (Anthropic)
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Interview pacing configuration
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Redis configuration; absent means sessions stay in process memory
    pub redis: Option<RedisConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file first when one exists, then deserializes every
    /// `FIELDSCRIBE`-prefixed variable into the typed sections.
    ///
    /// # Environment Variable Format
    ///
    /// - `FIELDSCRIBE__GENERATION__ANTHROPIC_API_KEY=...` -> `generation.anthropic_api_key = ...`
    /// - `FIELDSCRIBE__INTERVIEW__HARD_TURN_CAP=15` -> `interview.hard_turn_cap = 15`
    /// - `FIELDSCRIBE__REDIS__URL=redis://...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FIELDSCRIBE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.generation.validate()?;
        self.interview.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        Ok(())
    }
}
