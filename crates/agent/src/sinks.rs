//! Action and summary sinks

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use call_agent_core::{Action, ActionSink, Summary, SummarySink};

/// An action tagged with the call it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAction {
    pub session_id: String,
    pub action: Action,
}

/// Forwards actions to an mpsc receiver owned by the transport
pub struct ChannelActionSink {
    tx: mpsc::Sender<SessionAction>,
}

impl ChannelActionSink {
    pub fn new(tx: mpsc::Sender<SessionAction>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionAction>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ActionSink for ChannelActionSink {
    async fn emit(&self, session_id: &str, action: Action) {
        let message = SessionAction {
            session_id: session_id.to_string(),
            action,
        };
        if self.tx.send(message).await.is_err() {
            tracing::debug!(session_id, "Action receiver dropped");
        }
    }
}

/// Logs each summary as JSON
#[derive(Debug, Default)]
pub struct TracingSummarySink;

#[async_trait]
impl SummarySink for TracingSummarySink {
    async fn on_summary(&self, session_id: &str, summary: Summary) {
        match serde_json::to_string(&summary) {
            Ok(json) => tracing::info!(session_id, summary = %json, "Call summary"),
            Err(e) => tracing::warn!(session_id, error = %e, "Failed to serialize summary"),
        }
    }
}

/// Keeps every summary in memory
#[derive(Debug, Default)]
pub struct CollectingSummarySink {
    summaries: Mutex<Vec<Summary>>,
}

impl CollectingSummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> Vec<Summary> {
        self.summaries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.summaries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.lock().is_empty()
    }
}

#[async_trait]
impl SummarySink for CollectingSummarySink {
    async fn on_summary(&self, _session_id: &str, summary: Summary) {
        self.summaries.lock().push(summary);
    }
}

/// Delivers each summary to several sinks in order
pub struct FanoutSummarySink {
    sinks: Vec<Arc<dyn SummarySink>>,
}

impl FanoutSummarySink {
    pub fn new(sinks: Vec<Arc<dyn SummarySink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl SummarySink for FanoutSummarySink {
    async fn on_summary(&self, session_id: &str, summary: Summary) {
        for sink in &self.sinks {
            sink.on_summary(session_id, summary.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_action_sink() {
        let (sink, mut rx) = ChannelActionSink::channel(4);
        sink.emit("call-1", Action::speak("Hello")).await;
        sink.emit("call-1", Action::EndCall).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.session_id, "call-1");
        assert_eq!(first.action, Action::speak("Hello"));
        assert_eq!(rx.recv().await.unwrap().action, Action::EndCall);
    }

    #[tokio::test]
    async fn test_emit_after_receiver_dropped_does_not_fail() {
        let (sink, rx) = ChannelActionSink::channel(1);
        drop(rx);
        sink.emit("call-1", Action::EndCall).await;
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all() {
        let a = Arc::new(CollectingSummarySink::new());
        let b = Arc::new(CollectingSummarySink::new());
        let sinks: Vec<Arc<dyn SummarySink>> =
            vec![a.clone(), b.clone(), Arc::new(TracingSummarySink)];
        let fanout = FanoutSummarySink::new(sinks);

        let snapshot = crate::context::ContextStore::new("call-1", 3).snapshot();
        fanout
            .on_summary("call-1", crate::summary::generate(&snapshot))
            .await;

        assert_eq!(a.len(), 1);
        assert_eq!(b.summaries()[0].session_id, "call-1");
    }
}
