//! Per-call dialogue and escalation engine
//!
//! Features:
//! - Call lifecycle state machine with a validated transition table
//! - Bounded per-call context (history window, counters, caller facts)
//! - Rule-based escalation to staff
//! - Keyword intent classifier and lexicon sentiment detector
//! - End-of-call summaries
//! - One tokio worker per call, routed by session id

pub mod classifier;
pub mod context;
pub mod escalation;
pub mod registry;
pub mod sentiment;
pub mod sinks;
pub mod state_machine;
pub mod summary;
pub mod worker;

pub use classifier::{extract_caller_name, KeywordClassifier};
pub use context::ContextStore;
pub use escalation::{evaluate, EscalationInput, EscalationPolicy};
pub use registry::CallRegistry;
pub use sentiment::SentimentDetector;
pub use sinks::{
    ChannelActionSink, CollectingSummarySink, FanoutSummarySink, SessionAction,
    TracingSummarySink,
};
pub use state_machine::{CallStateMachine, ClassifyRequest, TurnOutcome, TurnStep};
pub use worker::{spawn_call, CallDeps, CallHandle, CallInput};

use thiserror::Error;

/// Errors surfaced to the transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Call session closed: {0}")]
    SessionClosed(String),

    #[error("Unknown call session: {0}")]
    UnknownSession(String),

    #[error("Call session already exists: {0}")]
    DuplicateSession(String),

    #[error("Call worker failed: {0}")]
    Worker(String),
}
