//! Core traits and types for the restaurant call agent
//!
//! This crate provides foundational types used across all other crates:
//! - Call lifecycle states and conversation turns
//! - The closed intent set and knowledge-base topics
//! - Escalation reasons and decisions
//! - Outbound actions and end-of-call summaries
//! - Boundary traits (classifier, knowledge base, sinks)
//! - Error types

pub mod action;
pub mod conversation;
pub mod error;
pub mod escalation;
pub mod intent;
pub mod summary;
pub mod traits;

pub use action::Action;
pub use conversation::{CallState, SpeakerRole, Turn};
pub use error::{CallError, Result};
pub use escalation::{EscalationDecision, EscalationReason};
pub use intent::{Classification, InfoTopic, Intent};
pub use summary::{CallTag, ContextSnapshot, Sentiment, Summary};

pub use traits::{
    configured_value, ActionSink, IntentClassifier, KnowledgeBase, StaticKnowledgeBase, SummarySink,
    PLACEHOLDER,
};
