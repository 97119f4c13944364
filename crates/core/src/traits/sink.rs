//! Outbound sinks for actions and summaries

use async_trait::async_trait;

use crate::action::Action;
use crate::summary::Summary;

/// Receives the actions decided for a call
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn emit(&self, session_id: &str, action: Action);
}

/// Receives exactly one summary per call
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn on_summary(&self, session_id: &str, summary: Summary);
}
