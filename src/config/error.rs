//! Configuration error types

use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors raised while validating configuration values
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Session TTL must be at least one second")]
    InvalidSessionTtl,

    #[error("Minimum turns must be below the hard turn cap")]
    InvalidTurnBounds,

    #[error("Completion score weights must sum to 1.0")]
    InvalidScoreWeights,

    #[error("Completion thresholds must lie in 0.0..=1.0")]
    InvalidThreshold,

    #[error("Answer depth window must be at least one turn")]
    InvalidDepthWindow,

    #[error("Answer depth target must be at least one character")]
    InvalidDepthTarget,
}
