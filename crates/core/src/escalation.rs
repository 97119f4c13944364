//! Escalation reasons and decisions

use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// Why a call was handed to a human
///
/// Variants are declared in priority order: when several conditions hold on
/// the same turn, the first one listed wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Caller asked for a person
    HumanRequested,
    OrderRequest,
    ReservationRequest,
    Complaint,
    /// Negative sentiment on consecutive turns
    AngerDetected,
    /// Consecutive turns that could not be understood
    RepeatedUnclear,
    /// Question the knowledge base cannot answer
    OutOfScope,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::HumanRequested => "human_requested",
            EscalationReason::OrderRequest => "order_request",
            EscalationReason::ReservationRequest => "reservation_request",
            EscalationReason::Complaint => "complaint",
            EscalationReason::AngerDetected => "anger_detected",
            EscalationReason::RepeatedUnclear => "repeated_unclear",
            EscalationReason::OutOfScope => "out_of_scope",
        }
    }

    /// Reason tied directly to an intent, if that intent always escalates
    pub fn from_intent(intent: Intent) -> Option<Self> {
        match intent {
            Intent::HumanRequest => Some(EscalationReason::HumanRequested),
            Intent::OrderRequest => Some(EscalationReason::OrderRequest),
            Intent::ReservationRequest => Some(EscalationReason::ReservationRequest),
            Intent::Complaint => Some(EscalationReason::Complaint),
            _ => None,
        }
    }

    /// Follow-up the staff should take once the call is handed over
    pub fn action_item(&self) -> &'static str {
        match self {
            EscalationReason::HumanRequested => "Staff to call back the caller who asked for a person",
            EscalationReason::OrderRequest => "Staff to take the caller's order",
            EscalationReason::ReservationRequest => "Staff to book the caller's reservation",
            EscalationReason::Complaint => "Manager to follow up on the caller's complaint",
            EscalationReason::AngerDetected => "Manager to follow up with an upset caller",
            EscalationReason::RepeatedUnclear => "Staff to call back: caller could not be understood",
            EscalationReason::OutOfScope => "Staff to answer a question outside the knowledge base",
        }
    }
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating the escalation rules for one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub escalate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EscalationReason>,
}

impl EscalationDecision {
    pub fn none() -> Self {
        Self {
            escalate: false,
            reason: None,
        }
    }

    pub fn escalate(reason: EscalationReason) -> Self {
        Self {
            escalate: true,
            reason: Some(reason),
        }
    }
}

impl Default for EscalationDecision {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_follows_declaration() {
        assert!(EscalationReason::HumanRequested < EscalationReason::OrderRequest);
        assert!(EscalationReason::Complaint < EscalationReason::AngerDetected);
        assert!(EscalationReason::AngerDetected < EscalationReason::RepeatedUnclear);
        assert!(EscalationReason::RepeatedUnclear < EscalationReason::OutOfScope);
    }

    #[test]
    fn test_reason_from_intent() {
        assert_eq!(
            EscalationReason::from_intent(Intent::OrderRequest),
            Some(EscalationReason::OrderRequest)
        );
        assert_eq!(EscalationReason::from_intent(Intent::InformationRequest), None);
        assert_eq!(EscalationReason::from_intent(Intent::Unclear), None);
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&EscalationReason::RepeatedUnclear).unwrap();
        assert_eq!(json, "\"repeated_unclear\"");
        assert_eq!(EscalationReason::OutOfScope.to_string(), "out_of_scope");
    }
}
