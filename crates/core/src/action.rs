//! Outbound actions rendered by the telephony / speech layer

use serde::{Deserialize, Serialize};

use crate::escalation::EscalationReason;

/// Action the transport should carry out for a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Say the given text to the caller
    Speak { text: String },
    /// Hand the call over to staff
    TransferToHuman { reason: EscalationReason },
    /// Hang up
    EndCall,
}

impl Action {
    pub fn speak(text: impl Into<String>) -> Self {
        Self::Speak { text: text.into() }
    }

    pub fn transfer(reason: EscalationReason) -> Self {
        Self::TransferToHuman { reason }
    }

    /// Spoken text, if this is a speak action
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            Action::Speak { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Action::TransferToHuman { .. })
    }
}
