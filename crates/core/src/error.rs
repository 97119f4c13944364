//! Error taxonomy for call handling
//!
//! Every variant except [`CallError::InvalidStateTransition`] is recoverable
//! inside the owning session: the state machine degrades it to an unclear
//! turn or an escalation. None of them propagate beyond that session.

use thiserror::Error;

use crate::conversation::CallState;
use crate::intent::InfoTopic;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("Intent classification exceeded {budget_ms}ms budget")]
    ClassificationTimeout { budget_ms: u64 },

    #[error("Intent classifier unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Knowledge base has no value for {0}")]
    KnowledgeBaseGap(InfoTopic),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: CallState, to: CallState },

    #[error("Transport disconnected: {0}")]
    TransportDisconnect(String),
}

impl CallError {
    /// Fatal errors end the session with an error summary
    pub fn is_fatal(&self) -> bool {
        matches!(self, CallError::InvalidStateTransition { .. })
    }
}

pub type Result<T> = std::result::Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_transition_is_fatal() {
        let fatal = CallError::InvalidStateTransition {
            from: CallState::CallClosing,
            to: CallState::Greeting,
        };
        assert!(fatal.is_fatal());
        assert!(!CallError::ClassificationTimeout { budget_ms: 10_000 }.is_fatal());
        assert!(!CallError::KnowledgeBaseGap(InfoTopic::Hours).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = CallError::InvalidStateTransition {
            from: CallState::EscalationPending,
            to: CallState::ResponseProviding,
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition from ESCALATION_PENDING to RESPONSE_PROVIDING"
        );
    }
}
