//! Boundary traits for the call agent
//!
//! The decision core consumes these capabilities; implementations live
//! outside it (transport layer, speech recognition, configuration).
//!
//! ```text
//! Inbound:
//!   - IntentClassifier: utterance + recent history → Classification
//!   - KnowledgeBase: read-only restaurant facts
//!
//! Outbound:
//!   - ActionSink: Speak / TransferToHuman / EndCall per call
//!   - SummarySink: one Summary per call at CALL_CLOSING
//! ```

mod classifier;
mod knowledge;
mod sink;

pub use classifier::IntentClassifier;
pub use knowledge::{configured_value, KnowledgeBase, StaticKnowledgeBase, PLACEHOLDER};
pub use sink::{ActionSink, SummarySink};
