//! Routing of transport events to call workers by session id

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use call_agent_core::Summary;

use crate::worker::{spawn_call, CallDeps, CallHandle, CallInput};
use crate::AgentError;

/// Active calls keyed by session id.
///
/// A call stays registered until [`CallRegistry::finish`] collects it or the
/// cleanup task finds its worker gone.
pub struct CallRegistry {
    deps: CallDeps,
    calls: RwLock<HashMap<String, CallHandle>>,
}

impl CallRegistry {
    pub fn new(deps: CallDeps) -> Self {
        Self {
            deps,
            calls: RwLock::new(HashMap::new()),
        }
    }

    /// Start a worker for a new call
    pub fn start(
        &self,
        session_id: impl Into<String>,
        caller_phone: Option<String>,
    ) -> Result<CallInput, AgentError> {
        let session_id = session_id.into();
        let mut calls = self.calls.write();
        if calls.contains_key(&session_id) {
            return Err(AgentError::DuplicateSession(session_id));
        }

        let handle = spawn_call(session_id.clone(), caller_phone, self.deps.clone());
        let input = handle.input();
        calls.insert(session_id, handle);
        Ok(input)
    }

    pub fn get(&self, session_id: &str) -> Option<CallInput> {
        self.calls.read().get(session_id).map(CallHandle::input)
    }

    pub async fn on_turn(
        &self,
        session_id: &str,
        text: impl Into<String>,
        confidence: f32,
    ) -> Result<(), AgentError> {
        self.input(session_id)?.on_turn(text, confidence).await
    }

    pub async fn transfer_acknowledged(&self, session_id: &str) -> Result<(), AgentError> {
        self.input(session_id)?.transfer_acknowledged().await
    }

    pub fn hang_up(&self, session_id: &str) -> Result<(), AgentError> {
        self.input(session_id)?.hang_up();
        Ok(())
    }

    /// Remove a call and wait for its worker to exit
    pub async fn finish(&self, session_id: &str) -> Result<Option<Summary>, AgentError> {
        let handle = self
            .calls
            .write()
            .remove(session_id)
            .ok_or_else(|| AgentError::UnknownSession(session_id.to_string()))?;
        tracing::debug!(session_id, "Finishing call");
        handle.join().await
    }

    /// Drop calls whose workers have already exited
    pub fn reap_finished(&self) -> Vec<String> {
        let mut calls = self.calls.write();
        let finished: Vec<String> = calls
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &finished {
            calls.remove(id);
            tracing::debug!(session_id = %id, "Reaped finished call");
        }
        finished
    }

    /// Periodically drop calls whose workers have exited.
    ///
    /// Returns a sender; send `true` to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);
        let interval = self.deps.config.cleanup_interval();

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let reaped = registry.reap_finished();
                        if !reaped.is_empty() {
                            tracing::info!(
                                reaped = reaped.len(),
                                active = registry.count(),
                                "Removed finished calls"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Registry cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    pub fn count(&self) -> usize {
        self.calls.read().len()
    }

    pub fn list(&self) -> Vec<String> {
        self.calls.read().keys().cloned().collect()
    }

    fn input(&self, session_id: &str) -> Result<CallInput, AgentError> {
        self.get(session_id)
            .ok_or_else(|| AgentError::UnknownSession(session_id.to_string()))
    }
}
