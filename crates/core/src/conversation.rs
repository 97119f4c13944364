//! Call lifecycle states and conversation turns

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    /// Call connected, caller has not spoken yet
    #[default]
    Greeting,
    /// Waiting for the caller to say what they need
    InformationGathering,
    /// An answer from the knowledge base was just given
    ResponseProviding,
    /// Escalation decided, waiting for the transport to hand the call over
    EscalationPending,
    /// Terminal: summary generated, no further decisions
    CallClosing,
}

/// Static transition table. Only forward or lateral moves are listed.
static STATE_TRANSITIONS: Lazy<HashMap<CallState, &'static [CallState]>> = Lazy::new(|| {
    use CallState::*;
    let mut map = HashMap::new();
    map.insert(
        Greeting,
        &[InformationGathering, EscalationPending, CallClosing] as &[_],
    );
    map.insert(
        InformationGathering,
        &[
            InformationGathering,
            ResponseProviding,
            EscalationPending,
            CallClosing,
        ] as &[_],
    );
    map.insert(
        ResponseProviding,
        &[InformationGathering, EscalationPending, CallClosing] as &[_],
    );
    map.insert(EscalationPending, &[CallClosing] as &[_]);
    map.insert(CallClosing, &[] as &[_]);
    map
});

impl CallState {
    /// States reachable from this one in a single step
    pub fn allowed_transitions(&self) -> &'static [CallState] {
        STATE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    pub fn can_transition_to(&self, target: CallState) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::CallClosing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Greeting => "GREETING",
            CallState::InformationGathering => "INFORMATION_GATHERING",
            CallState::ResponseProviding => "RESPONSE_PROVIDING",
            CallState::EscalationPending => "ESCALATION_PENDING",
            CallState::CallClosing => "CALL_CLOSING",
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    /// The person on the phone
    Caller,
    /// The call agent
    Agent,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Caller => "caller",
            SpeakerRole::Agent => "agent",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single utterance in the call history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: SpeakerRole,
    /// What was said
    pub text: String,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: SpeakerRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn caller(text: impl Into<String>) -> Self {
        Self::new(SpeakerRole::Caller, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(SpeakerRole::Agent, text)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
