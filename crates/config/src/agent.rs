//! Agent configuration
//!
//! Thresholds and budgets that drive the per-call state machine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{channels, context, escalation, recognition};

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Consecutive unclear turns that trigger escalation
    #[serde(default = "default_unclear_threshold")]
    pub unclear_threshold: u32,

    /// Consecutive negative turns that trigger escalation
    #[serde(default = "default_anger_threshold")]
    pub anger_threshold: u32,

    /// Number of turns kept in the rolling history
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Transcripts below this confidence skip the classifier (0.0 - 1.0)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Intent classifier response budget in milliseconds
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Buffered inbound events per call worker
    #[serde(default = "default_input_capacity")]
    pub input_channel_capacity: usize,

    /// How often the registry drops calls whose workers have exited
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
}

fn default_unclear_threshold() -> u32 {
    escalation::UNCLEAR_THRESHOLD
}
fn default_anger_threshold() -> u32 {
    escalation::ANGER_THRESHOLD
}
fn default_history_window() -> usize {
    context::HISTORY_WINDOW
}
fn default_min_confidence() -> f32 {
    recognition::MIN_CONFIDENCE
}
fn default_classifier_timeout_ms() -> u64 {
    recognition::CLASSIFIER_TIMEOUT_MS
}
fn default_input_capacity() -> usize {
    channels::INPUT_CAPACITY
}
fn default_cleanup_interval_ms() -> u64 {
    channels::CLEANUP_INTERVAL_MS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            unclear_threshold: default_unclear_threshold(),
            anger_threshold: default_anger_threshold(),
            history_window: default_history_window(),
            min_confidence: default_min_confidence(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
            input_channel_capacity: default_input_capacity(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
        }
    }
}

impl AgentConfig {
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.unclear_threshold, 2);
        assert_eq!(config.anger_threshold, 2);
        assert_eq!(config.history_window, 3);
        assert_eq!(config.classifier_timeout(), Duration::from_secs(10));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"min_confidence": 0.7}"#).unwrap();
        assert!((config.min_confidence - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.unclear_threshold, 2);
    }
}
