//! Interview pacing configuration
//!
//! Session lifetime plus every tunable the completion policy reads.
//! Defaults match [`CompletionTunables::default`], so an empty section
//! yields the standard pacing.

use serde::Deserialize;
use std::time::Duration;

use crate::domain::policy::CompletionTunables;

use super::error::ValidationError;

/// Interview pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Idle session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// No session completes before this many turns
    #[serde(default = "default_min_turns")]
    pub min_turns: usize,

    /// Every session completes at this many turns
    #[serde(default = "default_hard_turn_cap")]
    pub hard_turn_cap: usize,

    /// Turn from which the blended score can complete the session
    #[serde(default = "default_score_gate_turn")]
    pub score_gate_turn: usize,

    /// Blended score needed at the score gate
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Turn from which quality coverage alone can complete the session
    #[serde(default = "default_quality_gate_turn")]
    pub quality_gate_turn: usize,

    /// Quality ratio needed at the quality gate
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Weight of the required-coverage signal
    #[serde(default = "default_required_weight")]
    pub required_weight: f64,

    /// Weight of the quality-coverage signal
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,

    /// Weight of the answer-depth signal
    #[serde(default = "default_depth_weight")]
    pub depth_weight: f64,

    /// How many recent answers feed the depth signal
    #[serde(default = "default_depth_window")]
    pub depth_window: usize,

    /// Average answer length (chars) that counts as full depth
    #[serde(default = "default_depth_target_chars")]
    pub depth_target_chars: usize,
}

impl InterviewConfig {
    /// Get the session TTL as Duration
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Builds the completion tunables from this section.
    pub fn tunables(&self) -> CompletionTunables {
        CompletionTunables {
            required_weight: self.required_weight,
            quality_weight: self.quality_weight,
            depth_weight: self.depth_weight,
            min_turns: self.min_turns,
            hard_turn_cap: self.hard_turn_cap,
            score_gate_turn: self.score_gate_turn,
            score_threshold: self.score_threshold,
            quality_gate_turn: self.quality_gate_turn,
            quality_threshold: self.quality_threshold,
            depth_window: self.depth_window,
            depth_target_chars: self.depth_target_chars,
        }
    }

    /// Validate interview configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.min_turns >= self.hard_turn_cap {
            return Err(ValidationError::InvalidTurnBounds);
        }

        let weights = [self.required_weight, self.quality_weight, self.depth_weight];
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|w| *w < 0.0) || (sum - 1.0).abs() > 1e-9 {
            return Err(ValidationError::InvalidScoreWeights);
        }

        for threshold in [self.score_threshold, self.quality_threshold] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ValidationError::InvalidThreshold);
            }
        }

        if self.depth_window == 0 {
            return Err(ValidationError::InvalidDepthWindow);
        }
        if self.depth_target_chars == 0 {
            return Err(ValidationError::InvalidDepthTarget);
        }
        Ok(())
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            min_turns: default_min_turns(),
            hard_turn_cap: default_hard_turn_cap(),
            score_gate_turn: default_score_gate_turn(),
            score_threshold: default_score_threshold(),
            quality_gate_turn: default_quality_gate_turn(),
            quality_threshold: default_quality_threshold(),
            required_weight: default_required_weight(),
            quality_weight: default_quality_weight(),
            depth_weight: default_depth_weight(),
            depth_window: default_depth_window(),
            depth_target_chars: default_depth_target_chars(),
        }
    }
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_min_turns() -> usize {
    3
}

fn default_hard_turn_cap() -> usize {
    12
}

fn default_score_gate_turn() -> usize {
    5
}

fn default_score_threshold() -> f64 {
    0.8
}

fn default_quality_gate_turn() -> usize {
    8
}

fn default_quality_threshold() -> f64 {
    0.875
}

fn default_required_weight() -> f64 {
    0.4
}

fn default_quality_weight() -> f64 {
    0.4
}

fn default_depth_weight() -> f64 {
    0.2
}

fn default_depth_window() -> usize {
    3
}

fn default_depth_target_chars() -> usize {
    120
}
