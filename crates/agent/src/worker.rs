//! Per-call async worker
//!
//! One tokio task per active call. The task owns the call's state machine
//! outright, so calls never share mutable state. Inbound events arrive on an
//! mpsc channel in order; an out-of-band hang-up arrives on a `watch`
//! channel and interrupts a classification that is still in flight.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use call_agent_config::{AgentConfig, PhrasesConfig, Settings};
use call_agent_core::{
    ActionSink, CallError, IntentClassifier, KnowledgeBase, Summary, SummarySink,
};

use crate::state_machine::{CallStateMachine, TurnOutcome, TurnStep};
use crate::AgentError;

/// Collaborators shared by every call
#[derive(Clone)]
pub struct CallDeps {
    pub config: AgentConfig,
    pub classifier: Arc<dyn IntentClassifier>,
    pub knowledge: Arc<dyn KnowledgeBase>,
    pub phrases: Arc<PhrasesConfig>,
    pub actions: Arc<dyn ActionSink>,
    pub summaries: Arc<dyn SummarySink>,
}

impl CallDeps {
    /// Build from loaded settings; the knowledge base is frozen here
    pub fn from_settings(
        settings: &Settings,
        classifier: Arc<dyn IntentClassifier>,
        actions: Arc<dyn ActionSink>,
        summaries: Arc<dyn SummarySink>,
    ) -> Self {
        Self {
            config: settings.agent.clone(),
            classifier,
            knowledge: Arc::new(settings.knowledge_base.clone()),
            phrases: Arc::new(settings.phrases.clone()),
            actions,
            summaries,
        }
    }
}

#[derive(Debug)]
enum CallEvent {
    Turn { text: String, confidence: f32 },
    TransferAcknowledged,
    HangUp,
}

/// Cloneable sending side of a call
#[derive(Clone)]
pub struct CallInput {
    session_id: String,
    events: mpsc::Sender<CallEvent>,
    hang_up: Arc<watch::Sender<bool>>,
}

impl CallInput {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Deliver a transcribed utterance
    pub async fn on_turn(&self, text: impl Into<String>, confidence: f32) -> Result<(), AgentError> {
        self.send(CallEvent::Turn {
            text: text.into(),
            confidence,
        })
        .await
    }

    /// The transport finished transferring the call to staff
    pub async fn transfer_acknowledged(&self) -> Result<(), AgentError> {
        self.send(CallEvent::TransferAcknowledged).await
    }

    /// Queue a hang-up behind the events already sent
    pub async fn disconnect(&self) -> Result<(), AgentError> {
        self.send(CallEvent::HangUp).await
    }

    /// Hang up now, abandoning any in-flight classification
    pub fn hang_up(&self) {
        // Fails only once the worker has exited
        let _ = self.hang_up.send(true);
    }

    async fn send(&self, event: CallEvent) -> Result<(), AgentError> {
        self.events
            .send(event)
            .await
            .map_err(|_| AgentError::SessionClosed(self.session_id.clone()))
    }
}

/// Owner of a running call worker
pub struct CallHandle {
    input: CallInput,
    task: JoinHandle<Option<Summary>>,
}

impl CallHandle {
    pub fn session_id(&self) -> &str {
        self.input.session_id()
    }

    pub fn input(&self) -> CallInput {
        self.input.clone()
    }

    pub async fn on_turn(&self, text: impl Into<String>, confidence: f32) -> Result<(), AgentError> {
        self.input.on_turn(text, confidence).await
    }

    pub async fn transfer_acknowledged(&self) -> Result<(), AgentError> {
        self.input.transfer_acknowledged().await
    }

    pub async fn disconnect(&self) -> Result<(), AgentError> {
        self.input.disconnect().await
    }

    pub fn hang_up(&self) {
        self.input.hang_up();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the worker to exit and return the call's summary.
    ///
    /// Drops this handle's input; once every [`CallInput`] clone is gone the
    /// worker drains the queued events and then treats the call as hung up.
    pub async fn join(self) -> Result<Option<Summary>, AgentError> {
        let CallHandle { input, task } = self;
        let session_id = input.session_id.clone();
        let hang_up = Arc::clone(&input.hang_up);
        drop(input);

        let result = task
            .await
            .map_err(|e| AgentError::Worker(format!("{}: {}", session_id, e)));
        drop(hang_up);
        result
    }
}

/// Start the worker for a new call
pub fn spawn_call(
    session_id: impl Into<String>,
    caller_phone: Option<String>,
    deps: CallDeps,
) -> CallHandle {
    let session_id = session_id.into();
    let (events_tx, events_rx) = mpsc::channel(deps.config.input_channel_capacity.max(1));
    let (hang_up_tx, hang_up_rx) = watch::channel(false);

    let machine = CallStateMachine::new(
        session_id.clone(),
        deps.config.clone(),
        Arc::clone(&deps.knowledge),
        Arc::clone(&deps.phrases),
    )
    .with_caller_phone(caller_phone.as_deref());

    tracing::info!(
        session_id = %session_id,
        caller_phone = ?caller_phone,
        classifier = deps.classifier.name(),
        "Call started"
    );

    let worker = CallWorker {
        machine,
        deps,
        events: events_rx,
        hang_up: hang_up_rx,
        summary: None,
    };
    let task = tokio::spawn(worker.run());

    CallHandle {
        input: CallInput {
            session_id,
            events: events_tx,
            hang_up: Arc::new(hang_up_tx),
        },
        task,
    }
}

enum Next {
    Event(CallEvent),
    HangUp,
    InputClosed,
}

struct CallWorker {
    machine: CallStateMachine,
    deps: CallDeps,
    events: mpsc::Receiver<CallEvent>,
    hang_up: watch::Receiver<bool>,
    summary: Option<Summary>,
}

impl CallWorker {
    async fn run(mut self) -> Option<Summary> {
        while !self.machine.is_closed() {
            let next = tokio::select! {
                biased;
                _ = self.hang_up.changed() => Next::HangUp,
                event = self.events.recv() => match event {
                    Some(event) => Next::Event(event),
                    None => Next::InputClosed,
                },
            };

            match next {
                Next::Event(CallEvent::Turn { text, confidence }) => {
                    self.handle_turn(&text, confidence).await;
                },
                Next::Event(CallEvent::TransferAcknowledged) => {
                    let outcome = self.machine.on_transfer_acknowledged();
                    self.dispatch(outcome).await;
                },
                Next::Event(CallEvent::HangUp) | Next::HangUp => {
                    let outcome = self.machine.on_hang_up();
                    self.dispatch(outcome).await;
                },
                Next::InputClosed => {
                    let err = CallError::TransportDisconnect("input channel closed".to_string());
                    tracing::warn!(
                        session_id = %self.machine.session_id(),
                        error = %err,
                        "Closing call without hang-up"
                    );
                    let outcome = self.machine.on_hang_up();
                    self.dispatch(outcome).await;
                },
            }
        }

        tracing::debug!(session_id = %self.machine.session_id(), "Call worker exiting");
        self.summary
    }

    async fn handle_turn(&mut self, text: &str, confidence: f32) {
        let request = match self.machine.begin_turn(text, confidence) {
            TurnStep::Decided(outcome) => return self.dispatch(outcome).await,
            TurnStep::Classify(request) => request,
        };

        let budget = self.deps.config.classifier_timeout();
        let classifier = Arc::clone(&self.deps.classifier);

        let outcome = tokio::select! {
            biased;
            _ = self.hang_up.changed() => {
                tracing::info!(
                    session_id = %self.machine.session_id(),
                    turn_id = request.turn_id,
                    "Hang-up during classification, result discarded"
                );
                self.machine.on_hang_up()
            },
            result = tokio::time::timeout(budget, classifier.classify(&request.text, &request.history)) => {
                let result = result.unwrap_or_else(|_| {
                    Err(CallError::ClassificationTimeout {
                        budget_ms: self.deps.config.classifier_timeout_ms,
                    })
                });
                self.machine.complete_turn(request.turn_id, result)
            },
        };

        self.dispatch(outcome).await;
    }

    async fn dispatch(&mut self, outcome: TurnOutcome) {
        let session_id = self.machine.session_id().to_string();

        for action in outcome.actions {
            self.deps.actions.emit(&session_id, action).await;
        }

        if let Some(summary) = outcome.summary {
            self.deps
                .summaries
                .on_summary(&session_id, summary.clone())
                .await;
            self.summary = Some(summary);
        }
    }
}
