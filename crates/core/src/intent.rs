//! Caller intents and knowledge-base topics
//!
//! The intent set is closed. Classifiers map free text onto exactly one of
//! these variants, falling back to [`Intent::Unclear`] when they abstain.

use serde::{Deserialize, Serialize};

/// What the caller wants from this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Question answerable from the knowledge base (hours, address, ...)
    InformationRequest,
    /// Caller wants to place an order
    OrderRequest,
    /// Caller wants to book a table
    ReservationRequest,
    /// Caller is reporting a problem
    Complaint,
    /// Hello / good evening
    GeneralGreeting,
    /// Goodbye / thanks, that's all
    ClosingIntent,
    /// Caller explicitly asked for a person
    HumanRequest,
    /// Classifier abstained, speech recognition failed, or budget exceeded
    Unclear,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::InformationRequest => "INFORMATION_REQUEST",
            Intent::OrderRequest => "ORDER_REQUEST",
            Intent::ReservationRequest => "RESERVATION_REQUEST",
            Intent::Complaint => "COMPLAINT",
            Intent::GeneralGreeting => "GENERAL_GREETING",
            Intent::ClosingIntent => "CLOSING_INTENT",
            Intent::HumanRequest => "HUMAN_REQUEST",
            Intent::Unclear => "UNCLEAR",
        }
    }

    /// Intents that always hand the call to staff
    pub fn requires_staff(&self) -> bool {
        matches!(
            self,
            Intent::OrderRequest | Intent::ReservationRequest | Intent::Complaint
        )
    }

    /// Short human-readable label used in summaries
    pub fn display_name(&self) -> &'static str {
        match self {
            Intent::InformationRequest => "Information request",
            Intent::OrderRequest => "Order request",
            Intent::ReservationRequest => "Reservation request",
            Intent::Complaint => "Complaint",
            Intent::GeneralGreeting => "Greeting",
            Intent::ClosingIntent => "Closing",
            Intent::HumanRequest => "Asked for staff",
            Intent::Unclear => "Unclear",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knowledge-base field a caller can ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoTopic {
    Name,
    Address,
    Hours,
    Menu,
    Delivery,
    Phone,
}

impl InfoTopic {
    pub const ALL: [InfoTopic; 6] = [
        InfoTopic::Name,
        InfoTopic::Address,
        InfoTopic::Hours,
        InfoTopic::Menu,
        InfoTopic::Delivery,
        InfoTopic::Phone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfoTopic::Name => "name",
            InfoTopic::Address => "address",
            InfoTopic::Hours => "hours",
            InfoTopic::Menu => "menu",
            InfoTopic::Delivery => "delivery",
            InfoTopic::Phone => "phone",
        }
    }
}

impl std::fmt::Display for InfoTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of an intent classifier for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Requested field, only meaningful for information requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<InfoTopic>,
}

impl Classification {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            topic: None,
        }
    }

    pub fn information(topic: InfoTopic) -> Self {
        Self {
            intent: Intent::InformationRequest,
            topic: Some(topic),
        }
    }

    pub fn unclear() -> Self {
        Self::new(Intent::Unclear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_string(&Intent::OrderRequest).unwrap();
        assert_eq!(json, "\"ORDER_REQUEST\"");
        let back: Intent = serde_json::from_str("\"CLOSING_INTENT\"").unwrap();
        assert_eq!(back, Intent::ClosingIntent);
    }

    #[test]
    fn test_requires_staff() {
        assert!(Intent::OrderRequest.requires_staff());
        assert!(Intent::Complaint.requires_staff());
        assert!(!Intent::InformationRequest.requires_staff());
        assert!(!Intent::HumanRequest.requires_staff());
    }

    #[test]
    fn test_classification_constructors() {
        let c = Classification::information(InfoTopic::Hours);
        assert_eq!(c.intent, Intent::InformationRequest);
        assert_eq!(c.topic, Some(InfoTopic::Hours));
        assert_eq!(Classification::unclear().topic, None);
    }
}
