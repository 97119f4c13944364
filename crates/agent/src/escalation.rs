//! Escalation rule engine
//!
//! A pure function over the current turn and the rolling counters. Rules
//! are checked in a fixed order and the first one that holds wins:
//!
//! 1. explicit request for a person
//! 2. order / reservation / complaint intent
//! 3. anger threshold
//! 4. repeated-unclear threshold
//! 5. information request the knowledge base cannot answer

use call_agent_config::AgentConfig;
use call_agent_core::{EscalationDecision, EscalationReason, Intent};

/// Thresholds the rules compare the counters against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub unclear_threshold: u32,
    pub anger_threshold: u32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for EscalationPolicy {
    fn from(config: &AgentConfig) -> Self {
        Self {
            unclear_threshold: config.unclear_threshold,
            anger_threshold: config.anger_threshold,
        }
    }
}

/// Facts about one turn the rules are evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationInput {
    pub intent: Intent,
    pub unclear_count: u32,
    pub anger_signal_count: u32,
    /// Whether an information request found a configured answer. Ignored
    /// for other intents.
    pub knowledge_base_hit: bool,
}

pub fn evaluate(input: &EscalationInput, policy: &EscalationPolicy) -> EscalationDecision {
    if let Some(reason) = EscalationReason::from_intent(input.intent) {
        return EscalationDecision::escalate(reason);
    }

    if input.anger_signal_count >= policy.anger_threshold {
        return EscalationDecision::escalate(EscalationReason::AngerDetected);
    }

    if input.unclear_count >= policy.unclear_threshold {
        return EscalationDecision::escalate(EscalationReason::RepeatedUnclear);
    }

    if input.intent == Intent::InformationRequest && !input.knowledge_base_hit {
        return EscalationDecision::escalate(EscalationReason::OutOfScope);
    }

    EscalationDecision::none()
}
