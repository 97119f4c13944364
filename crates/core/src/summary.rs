//! Session snapshots and end-of-call summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::conversation::{CallState, Turn};
use crate::escalation::EscalationReason;
use crate::intent::{InfoTopic, Intent};

/// Overall caller sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn is_negative(&self) -> bool {
        matches!(self, Sentiment::Negative)
    }
}

/// Noteworthy events recorded for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallTag {
    /// Classifier exceeded its response budget at least once
    ProcessingTimeout,
    /// Classifier could not be reached at least once
    ClassifierUnavailable,
    /// Speech recognition confidence fell below threshold at least once
    LowConfidence,
    /// A requested knowledge-base field had no configured value
    KnowledgeBaseGap,
}

impl CallTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallTag::ProcessingTimeout => "processing_timeout",
            CallTag::ClassifierUnavailable => "classifier_unavailable",
            CallTag::LowConfidence => "low_confidence",
            CallTag::KnowledgeBaseGap => "knowledge_base_gap",
        }
    }
}

/// Immutable copy of a call's context, taken for summary generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub session_id: String,
    pub state: CallState,
    pub caller_name: Option<String>,
    pub caller_phone: Option<String>,
    pub current_intent: Option<Intent>,
    /// Bounded window of recent turns, oldest first
    pub history: Vec<Turn>,
    pub unclear_count: u32,
    pub anger_signal_count: u32,
    pub escalation_triggered: bool,
    pub escalation_reason: Option<EscalationReason>,
    /// Sentiment of the most recent caller utterance
    pub last_sentiment: Sentiment,
    /// Intents seen over the whole call, first occurrence order
    pub intents_seen: Vec<Intent>,
    /// Knowledge-base fields that were asked for but not configured
    pub missing_topics: Vec<InfoTopic>,
    pub tags: BTreeSet<CallTag>,
    /// Caller turns received over the whole call
    pub turn_count: usize,
    /// Set when the session was aborted by an internal error
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Structured end-of-call report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub session_id: String,
    /// Caller name, or "Unknown" when never provided
    pub caller_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_phone: Option<String>,
    /// Last classified intent
    pub intent: Option<Intent>,
    pub issues_discussed: Vec<String>,
    pub escalated: bool,
    pub escalation_reason: Option<EscalationReason>,
    pub sentiment: Sentiment,
    pub action_items: Vec<String>,
    pub final_state: CallState,
    pub turn_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<CallTag>,
    /// True when the session was force-closed by an internal error
    pub error: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_serialization() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"NEGATIVE\"");
        assert_eq!(Sentiment::default(), Sentiment::Neutral);
    }

    #[test]
    fn test_tag_serialization() {
        let json = serde_json::to_string(&CallTag::ProcessingTimeout).unwrap();
        assert_eq!(json, "\"processing_timeout\"");
        assert_eq!(CallTag::ProcessingTimeout.as_str(), "processing_timeout");
    }
}
