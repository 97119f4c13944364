//! Conversation state machine
//!
//! Owns the lifecycle of one call and decides, turn by turn, what the agent
//! does next. Classification happens in two phases so the state machine is
//! never borrowed across the classifier await:
//!
//! ```text
//! begin_turn(text, confidence) ──► TurnStep::Decided(outcome)
//!                               └─► TurnStep::Classify(request)
//!                                        │ classifier runs outside
//!                                        ▼
//!                         complete_turn(turn_id, result) ──► outcome
//! ```
//!
//! A completion whose turn id is no longer pending (the call hung up, or a
//! newer turn superseded it) is discarded.

use std::sync::Arc;

use call_agent_config::{AgentConfig, PhrasesConfig};
use call_agent_core::{
    configured_value, Action, CallError, CallState, CallTag, Classification, EscalationReason,
    Intent, KnowledgeBase, SpeakerRole, Summary, Turn,
};

use crate::classifier::extract_caller_name;
use crate::context::ContextStore;
use crate::escalation::{evaluate, EscalationInput, EscalationPolicy};
use crate::sentiment::SentimentDetector;
use crate::summary;

/// Classification the caller of [`CallStateMachine::begin_turn`] must obtain
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub turn_id: u64,
    pub text: String,
    /// Turns before this one, oldest first
    pub history: Vec<Turn>,
}

/// Result of applying an event to the state machine
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Actions for the transport, in order
    pub actions: Vec<Action>,
    /// Present exactly once per call, when it reaches CALL_CLOSING
    pub summary: Option<Summary>,
}

impl TurnOutcome {
    fn speak(&mut self, text: impl Into<String>) {
        self.actions.push(Action::speak(text));
    }
}

#[derive(Debug)]
pub enum TurnStep {
    Decided(TurnOutcome),
    Classify(ClassifyRequest),
}

pub struct CallStateMachine {
    context: ContextStore,
    config: AgentConfig,
    policy: EscalationPolicy,
    knowledge: Arc<dyn KnowledgeBase>,
    phrases: Arc<PhrasesConfig>,
    sentiment: SentimentDetector,
    next_turn_id: u64,
    pending_turn: Option<u64>,
    summary_emitted: bool,
}

impl CallStateMachine {
    pub fn new(
        session_id: impl Into<String>,
        config: AgentConfig,
        knowledge: Arc<dyn KnowledgeBase>,
        phrases: Arc<PhrasesConfig>,
    ) -> Self {
        let context = ContextStore::new(session_id, config.history_window);
        Self {
            context,
            policy: EscalationPolicy::from(&config),
            config,
            knowledge,
            phrases,
            sentiment: SentimentDetector::new(),
            next_turn_id: 0,
            pending_turn: None,
            summary_emitted: false,
        }
    }

    /// Record the caller's number from the call-start event
    pub fn with_caller_phone(mut self, phone: Option<&str>) -> Self {
        self.context.set_caller_fact(None, phone);
        self
    }

    pub fn session_id(&self) -> &str {
        self.context.session_id()
    }

    pub fn state(&self) -> CallState {
        self.context.state()
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// Accept a transcribed caller utterance
    pub fn begin_turn(&mut self, text: &str, confidence: f32) -> TurnStep {
        let state = self.state();
        if state.is_terminal() {
            tracing::debug!(
                session_id = %self.session_id(),
                "Ignoring turn after call closed"
            );
            return TurnStep::Decided(TurnOutcome::default());
        }

        // A new utterance supersedes any classification still outstanding
        if let Some(stale) = self.pending_turn.take() {
            tracing::debug!(
                session_id = %self.session_id(),
                turn_id = stale,
                "Superseding unfinished turn"
            );
        }

        let history = self.context.history();
        self.context.record_turn(SpeakerRole::Caller, text);

        if let Some(name) = extract_caller_name(text) {
            self.context.set_caller_fact(Some(&name), None);
        }

        let sentiment = self.sentiment.detect(text);
        let anger = self
            .context
            .record_sentiment(sentiment, self.policy.anger_threshold);

        tracing::debug!(
            session_id = %self.session_id(),
            state = %state,
            confidence,
            sentiment = ?sentiment,
            anger_signals = anger,
            "Caller turn received"
        );

        if state == CallState::EscalationPending {
            // Already handed over: log the turn, never classify it
            let mut outcome = TurnOutcome::default();
            self.say(&mut outcome, self.phrases.hold.clone());
            return TurnStep::Decided(outcome);
        }

        let low_confidence = confidence.is_nan() || confidence < self.config.min_confidence;
        if text.trim().is_empty() || low_confidence {
            self.context.add_tag(CallTag::LowConfidence);
            tracing::debug!(
                session_id = %self.session_id(),
                confidence,
                min_confidence = self.config.min_confidence,
                "Low-confidence transcript treated as unclear"
            );
            return TurnStep::Decided(self.apply(Classification::unclear()));
        }

        self.next_turn_id += 1;
        let turn_id = self.next_turn_id;
        self.pending_turn = Some(turn_id);

        TurnStep::Classify(ClassifyRequest {
            turn_id,
            text: text.to_string(),
            history,
        })
    }

    /// Apply the classifier's answer for a pending turn
    pub fn complete_turn(
        &mut self,
        turn_id: u64,
        result: Result<Classification, CallError>,
    ) -> TurnOutcome {
        if self.is_closed() || self.pending_turn != Some(turn_id) {
            tracing::debug!(
                session_id = %self.session_id(),
                turn_id,
                state = %self.state(),
                "Discarding stale classification"
            );
            return TurnOutcome::default();
        }
        self.pending_turn = None;

        let classification = match result {
            Ok(classification) => classification,
            Err(err) if err.is_fatal() => return self.fail(err),
            Err(err) => {
                let tag = match err {
                    CallError::ClassificationTimeout { .. } => Some(CallTag::ProcessingTimeout),
                    CallError::ClassificationUnavailable(_) => Some(CallTag::ClassifierUnavailable),
                    _ => None,
                };
                if let Some(tag) = tag {
                    self.context.add_tag(tag);
                }
                tracing::warn!(
                    session_id = %self.session_id(),
                    turn_id,
                    error = %err,
                    "Classification failed, treating turn as unclear"
                );
                Classification::unclear()
            },
        };

        self.apply(classification)
    }

    /// The transport finished handing the call to staff
    pub fn on_transfer_acknowledged(&mut self) -> TurnOutcome {
        if self.state() != CallState::EscalationPending {
            tracing::debug!(
                session_id = %self.session_id(),
                state = %self.state(),
                "Transfer acknowledgement without pending escalation ignored"
            );
            return TurnOutcome::default();
        }

        let mut outcome = TurnOutcome::default();
        match self.transition(CallState::CallClosing) {
            Ok(()) => {
                tracing::info!(session_id = %self.session_id(), "Transfer acknowledged");
                outcome.summary = self.finish();
                outcome
            },
            Err(err) => self.fail(err),
        }
    }

    /// The caller hung up or the transport dropped. Valid in any state.
    pub fn on_hang_up(&mut self) -> TurnOutcome {
        if self.is_closed() {
            return TurnOutcome::default();
        }

        self.pending_turn = None;
        let from = self.state();
        let mut outcome = TurnOutcome::default();
        match self.transition(CallState::CallClosing) {
            Ok(()) => {
                tracing::info!(session_id = %self.session_id(), from = %from, "Caller hung up");
                outcome.summary = self.finish();
                outcome
            },
            Err(err) => self.fail(err),
        }
    }

    /// Force the call closed after an internal error
    pub fn abort(&mut self, err: CallError) -> TurnOutcome {
        if self.is_closed() {
            return TurnOutcome::default();
        }
        self.fail(err)
    }

    fn apply(&mut self, classification: Classification) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();
        match self.decide(classification, &mut outcome) {
            Ok(()) => outcome,
            Err(err) => self.fail(err),
        }
    }

    fn decide(
        &mut self,
        classification: Classification,
        outcome: &mut TurnOutcome,
    ) -> Result<(), CallError> {
        let intent = classification.intent;
        self.context.record_intent(intent);

        match self.state() {
            CallState::Greeting => {
                self.transition(CallState::InformationGathering)?;
                if intent == Intent::GeneralGreeting {
                    self.context.reset_unclear();
                    if self.anger_reached() {
                        return self.escalate(EscalationReason::AngerDetected, outcome);
                    }
                    let greeting = self.phrases.greeting(self.restaurant_name().as_deref());
                    self.say(outcome, greeting);
                    return Ok(());
                }
            },
            CallState::ResponseProviding if intent != Intent::ClosingIntent => {
                // Anything but goodbye continues the conversation
                self.transition(CallState::InformationGathering)?;
            },
            CallState::InformationGathering | CallState::ResponseProviding => {},
            CallState::EscalationPending | CallState::CallClosing => return Ok(()),
        }

        self.gather(classification, outcome)
    }

    fn gather(
        &mut self,
        classification: Classification,
        outcome: &mut TurnOutcome,
    ) -> Result<(), CallError> {
        let intent = classification.intent;

        let unclear_count = if intent == Intent::Unclear {
            self.context.increment_unclear(self.policy.unclear_threshold)
        } else {
            self.context.reset_unclear();
            0
        };

        let answer = if intent == Intent::InformationRequest {
            self.lookup(classification)
        } else {
            None
        };

        let decision = evaluate(
            &EscalationInput {
                intent,
                unclear_count,
                anger_signal_count: self.context.anger_signal_count(),
                knowledge_base_hit: answer.is_some(),
            },
            &self.policy,
        );

        if let Some(reason) = decision.reason.filter(|_| decision.escalate) {
            return self.escalate(reason, outcome);
        }

        match intent {
            Intent::InformationRequest => {
                if let Some(answer) = answer {
                    self.transition(CallState::ResponseProviding)?;
                    self.say(outcome, answer);
                }
            },
            Intent::GeneralGreeting => {
                self.transition(CallState::InformationGathering)?;
                let greeting = self.phrases.greeting(self.restaurant_name().as_deref());
                self.say(outcome, greeting);
            },
            Intent::ClosingIntent => {
                self.transition(CallState::CallClosing)?;
                let farewell = self.phrases.farewell(self.restaurant_name().as_deref());
                self.say(outcome, farewell);
                outcome.actions.push(Action::EndCall);
                outcome.summary = self.finish();
            },
            Intent::Unclear
            | Intent::HumanRequest
            | Intent::OrderRequest
            | Intent::ReservationRequest
            | Intent::Complaint => {
                self.transition(CallState::InformationGathering)?;
                self.say(outcome, self.phrases.repeat.clone());
            },
        }

        Ok(())
    }

    /// Rendered answer for an information request, or `None` on a gap
    fn lookup(&mut self, classification: Classification) -> Option<String> {
        let Some(topic) = classification.topic else {
            tracing::warn!(
                session_id = %self.session_id(),
                "Question with no recognised topic"
            );
            return None;
        };

        // Blank or placeholder values are gaps whatever the backing store says
        match self.knowledge.lookup(topic).and_then(|v| configured_value(&v)) {
            Some(value) => Some(self.phrases.answer(
                topic,
                &value,
                self.restaurant_name().as_deref(),
            )),
            None => {
                let gap = CallError::KnowledgeBaseGap(topic);
                tracing::warn!(session_id = %self.session_id(), error = %gap, "Knowledge base gap");
                self.context.record_missing_topic(topic);
                None
            },
        }
    }

    fn anger_reached(&self) -> bool {
        self.context.anger_signal_count() >= self.policy.anger_threshold
    }

    fn escalate(
        &mut self,
        reason: EscalationReason,
        outcome: &mut TurnOutcome,
    ) -> Result<(), CallError> {
        self.transition(CallState::EscalationPending)?;
        self.context.mark_escalated(reason);

        tracing::info!(
            session_id = %self.session_id(),
            reason = %reason,
            "Escalation triggered"
        );

        self.say(outcome, self.phrases.transfer.clone());
        outcome.actions.push(Action::transfer(reason));
        Ok(())
    }

    fn transition(&mut self, to: CallState) -> Result<(), CallError> {
        let from = self.state();
        if !from.can_transition_to(to) {
            return Err(CallError::InvalidStateTransition { from, to });
        }
        if from != to {
            tracing::debug!(
                session_id = %self.session_id(),
                from = %from,
                to = %to,
                "State transition"
            );
        }
        self.context.set_state(to);
        Ok(())
    }

    fn fail(&mut self, err: CallError) -> TurnOutcome {
        tracing::error!(
            session_id = %self.session_id(),
            state = %self.state(),
            error = %err,
            "Fatal session error, closing call"
        );

        self.pending_turn = None;
        self.context.mark_error(err.to_string());
        // Recovery path, not subject to the transition table
        self.context.set_state(CallState::CallClosing);

        let mut outcome = TurnOutcome::default();
        self.say(&mut outcome, self.phrases.apology.clone());
        outcome.actions.push(Action::EndCall);
        outcome.summary = self.finish();
        outcome
    }

    fn say(&mut self, outcome: &mut TurnOutcome, text: String) {
        self.context.record_turn(SpeakerRole::Agent, text.clone());
        outcome.speak(text);
    }

    fn restaurant_name(&self) -> Option<String> {
        self.knowledge
            .restaurant_name()
            .and_then(|name| configured_value(&name))
    }

    /// Build the summary the first time the call closes
    fn finish(&mut self) -> Option<Summary> {
        if self.summary_emitted {
            return None;
        }
        self.summary_emitted = true;
        self.context.mark_ended();

        let summary = summary::generate(&self.context.snapshot());
        tracing::info!(
            session_id = %self.session_id(),
            escalated = summary.escalated,
            reason = ?summary.escalation_reason,
            error = summary.error,
            turns = summary.turn_count,
            "Call summary generated"
        );
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_agent_core::{InfoTopic, StaticKnowledgeBase};

    fn knowledge() -> Arc<dyn KnowledgeBase> {
        Arc::new(
            StaticKnowledgeBase::new()
                .with(InfoTopic::Name, "Spice Garden")
                .with(InfoTopic::Hours, "open from 10 AM to 10 PM daily"),
        )
    }

    fn machine() -> CallStateMachine {
        CallStateMachine::new(
            "call-1",
            AgentConfig::default(),
            knowledge(),
            Arc::new(PhrasesConfig::default()),
        )
    }

    /// Run one turn with a fixed classification
    fn turn(sm: &mut CallStateMachine, text: &str, classification: Classification) -> TurnOutcome {
        match sm.begin_turn(text, 0.9) {
            TurnStep::Decided(outcome) => outcome,
            TurnStep::Classify(req) => sm.complete_turn(req.turn_id, Ok(classification)),
        }
    }

    fn spoken(outcome: &TurnOutcome) -> Vec<&str> {
        outcome.actions.iter().filter_map(Action::spoken_text).collect()
    }

    #[test]
    fn test_greeting_then_hours_answer() {
        let mut sm = machine();

        let out = turn(&mut sm, "Hello", Classification::new(Intent::GeneralGreeting));
        assert_eq!(sm.state(), CallState::InformationGathering);
        assert_eq!(
            spoken(&out),
            vec!["Hello! Thank you for calling Spice Garden. How can I assist you today?"]
        );

        let out = turn(
            &mut sm,
            "What time do you open?",
            Classification::information(InfoTopic::Hours),
        );
        assert_eq!(sm.state(), CallState::ResponseProviding);
        assert!(spoken(&out)[0].starts_with("We are open from 10 AM to 10 PM daily."));
        assert!(!sm.context().escalation_triggered());
        assert!(out.summary.is_none());
    }

    #[test]
    fn test_first_turn_question_is_answered_in_same_turn() {
        let mut sm = machine();
        let out = turn(
            &mut sm,
            "What time do you open?",
            Classification::information(InfoTopic::Hours),
        );
        assert_eq!(sm.state(), CallState::ResponseProviding);
        assert_eq!(out.actions.len(), 1);
    }

    #[test]
    fn test_two_unclear_turns_escalate() {
        let mut sm = machine();
        turn(&mut sm, "hello", Classification::new(Intent::GeneralGreeting));

        let out = turn(&mut sm, "mmm", Classification::unclear());
        assert_eq!(sm.state(), CallState::InformationGathering);
        assert_eq!(
            spoken(&out),
            vec!["I'm sorry, I couldn't hear that clearly. Could you please repeat?"]
        );

        let out = turn(&mut sm, "uhh", Classification::unclear());
        assert_eq!(sm.state(), CallState::EscalationPending);
        assert_eq!(
            out.actions.last(),
            Some(&Action::transfer(EscalationReason::RepeatedUnclear))
        );
    }

    #[test]
    fn test_low_confidence_skips_classifier() {
        let mut sm = machine();
        match sm.begin_turn("what time", 0.2) {
            TurnStep::Decided(out) => assert_eq!(out.actions.len(), 1),
            TurnStep::Classify(_) => panic!("low confidence must not be classified"),
        }
        assert_eq!(sm.context().unclear_count(), 1);
        assert!(sm.context().snapshot().tags.contains(&CallTag::LowConfidence));
    }

    #[test]
    fn test_order_escalates_immediately() {
        let mut sm = machine();
        let out = turn(
            &mut sm,
            "I want to order biryani.",
            Classification::new(Intent::OrderRequest),
        );
        assert_eq!(sm.state(), CallState::EscalationPending);
        assert_eq!(
            out.actions,
            vec![
                Action::speak("I'll connect you with our staff who can better assist you."),
                Action::transfer(EscalationReason::OrderRequest),
            ]
        );

        let out = sm.on_transfer_acknowledged();
        assert_eq!(sm.state(), CallState::CallClosing);
        let summary = out.summary.expect("summary at close");
        assert!(summary.escalated);
        assert_eq!(summary.escalation_reason, Some(EscalationReason::OrderRequest));
    }

    #[test]
    fn test_turns_after_escalation_are_recorded_not_classified() {
        let mut sm = machine();
        turn(&mut sm, "Table for two", Classification::new(Intent::ReservationRequest));

        match sm.begin_turn("Hello? Are you still there?", 0.9) {
            TurnStep::Decided(out) => {
                assert_eq!(
                    spoken(&out),
                    vec!["Please hold while I transfer you to our staff."]
                );
            },
            TurnStep::Classify(_) => panic!("no classification after escalation"),
        }
        assert!(sm.context().escalation_triggered());
        assert_eq!(sm.state(), CallState::EscalationPending);
    }

    #[test]
    fn test_knowledge_gap_escalates_out_of_scope() {
        let mut sm = machine();
        let out = turn(
            &mut sm,
            "Do you deliver?",
            Classification::information(InfoTopic::Delivery),
        );
        assert_eq!(sm.state(), CallState::EscalationPending);
        assert_eq!(
            out.actions.last(),
            Some(&Action::transfer(EscalationReason::OutOfScope))
        );
        // Never answers with invented content
        assert!(!spoken(&out).iter().any(|t| t.contains("deliver")));
        assert_eq!(sm.context().snapshot().missing_topics, vec![InfoTopic::Delivery]);
    }

    #[test]
    fn test_anger_beats_information_answer() {
        let mut sm = machine();
        turn(
            &mut sm,
            "What time do you open? This is ridiculous",
            Classification::information(InfoTopic::Hours),
        );
        assert_eq!(sm.state(), CallState::ResponseProviding);

        let out = turn(
            &mut sm,
            "I'm furious, what are your hours again?",
            Classification::information(InfoTopic::Hours),
        );
        assert_eq!(sm.state(), CallState::EscalationPending);
        assert_eq!(
            out.actions.last(),
            Some(&Action::transfer(EscalationReason::AngerDetected))
        );
    }

    #[test]
    fn test_closing_from_response_providing() {
        let mut sm = machine();
        turn(&mut sm, "hours?", Classification::information(InfoTopic::Hours));

        let out = turn(&mut sm, "Thanks, bye", Classification::new(Intent::ClosingIntent));
        assert_eq!(sm.state(), CallState::CallClosing);
        assert_eq!(out.actions.last(), Some(&Action::EndCall));
        assert_eq!(
            spoken(&out),
            vec!["Thank you for calling Spice Garden. Have a great day!"]
        );
        let summary = out.summary.expect("summary at close");
        assert!(!summary.escalated);
        assert_eq!(summary.sentiment, call_agent_core::Sentiment::Positive);
    }

    #[test]
    fn test_timeout_then_success_resets_unclear() {
        let mut sm = machine();
        turn(&mut sm, "hi", Classification::new(Intent::GeneralGreeting));

        let TurnStep::Classify(req) = sm.begin_turn("what time do you open", 0.9) else {
            panic!("expected classification request");
        };
        let out = sm.complete_turn(
            req.turn_id,
            Err(CallError::ClassificationTimeout { budget_ms: 10_000 }),
        );
        assert_eq!(sm.context().unclear_count(), 1);
        assert_eq!(sm.state(), CallState::InformationGathering);
        assert!(!out.actions.iter().any(Action::is_transfer));

        turn(
            &mut sm,
            "what time do you open",
            Classification::information(InfoTopic::Hours),
        );
        assert_eq!(sm.context().unclear_count(), 0);
        assert!(!sm.context().escalation_triggered());
        assert!(sm
            .context()
            .snapshot()
            .tags
            .contains(&CallTag::ProcessingTimeout));
    }

    #[test]
    fn test_hang_up_discards_in_flight_classification() {
        let mut sm = machine();
        let TurnStep::Classify(req) = sm.begin_turn("I want to order", 0.9) else {
            panic!("expected classification request");
        };

        let out = sm.on_hang_up();
        let summary = out.summary.expect("summary on hang-up");
        assert_eq!(summary.caller_name, "Unknown");
        assert!(!summary.escalated);

        let late = sm.complete_turn(req.turn_id, Ok(Classification::new(Intent::OrderRequest)));
        assert!(late.actions.is_empty());
        assert!(late.summary.is_none());
        assert!(!sm.context().escalation_triggered());
    }

    #[test]
    fn test_stale_turn_id_is_discarded() {
        let mut sm = machine();
        let TurnStep::Classify(first) = sm.begin_turn("hello there", 0.9) else {
            panic!("expected classification request");
        };
        let TurnStep::Classify(second) = sm.begin_turn("what time do you open", 0.9) else {
            panic!("expected classification request");
        };

        let stale = sm.complete_turn(first.turn_id, Ok(Classification::new(Intent::Complaint)));
        assert!(stale.actions.is_empty());

        sm.complete_turn(second.turn_id, Ok(Classification::information(InfoTopic::Hours)));
        assert_eq!(sm.state(), CallState::ResponseProviding);
    }

    #[test]
    fn test_fatal_error_closes_with_error_summary() {
        let mut sm = machine();
        let out = sm.abort(CallError::InvalidStateTransition {
            from: CallState::EscalationPending,
            to: CallState::ResponseProviding,
        });

        assert_eq!(sm.state(), CallState::CallClosing);
        assert_eq!(out.actions.last(), Some(&Action::EndCall));
        assert!(spoken(&out)[0].contains("technical difficulties"));
        let summary = out.summary.expect("error summary");
        assert!(summary.error);

        // Summary is emitted once
        assert!(sm.on_hang_up().summary.is_none());
    }

    #[test]
    fn test_caller_facts_are_captured() {
        let mut sm = machine().with_caller_phone(Some("+15550123"));
        turn(
            &mut sm,
            "Hi, my name is Priya",
            Classification::new(Intent::GeneralGreeting),
        );
        let summary = sm.on_hang_up().summary.expect("summary");
        assert_eq!(summary.caller_name, "Priya");
        assert_eq!(summary.caller_phone.as_deref(), Some("+15550123"));
    }

    /// Returns every value verbatim, placeholder included
    struct UnfilteredKnowledgeBase;

    impl KnowledgeBase for UnfilteredKnowledgeBase {
        fn lookup(&self, topic: InfoTopic) -> Option<String> {
            match topic {
                InfoTopic::Name => Some("Spice Garden".to_string()),
                _ => Some("[TO BE PROVIDED]".to_string()),
            }
        }
    }

    fn fail_classification(sm: &mut CallStateMachine, text: &str, err: CallError) -> TurnOutcome {
        let TurnStep::Classify(req) = sm.begin_turn(text, 0.9) else {
            panic!("expected classification request");
        };
        sm.complete_turn(req.turn_id, Err(err))
    }

    #[test]
    fn test_placeholder_value_escalates_out_of_scope() {
        let stores: Vec<Arc<dyn KnowledgeBase>> = vec![
            Arc::new(StaticKnowledgeBase::new().with(InfoTopic::Hours, "[TO BE PROVIDED]")),
            Arc::new(UnfilteredKnowledgeBase),
        ];

        for knowledge in stores {
            let mut sm = CallStateMachine::new(
                "call-1",
                AgentConfig::default(),
                knowledge,
                Arc::new(PhrasesConfig::default()),
            );
            let out = turn(
                &mut sm,
                "What time do you open?",
                Classification::information(InfoTopic::Hours),
            );

            assert_eq!(sm.state(), CallState::EscalationPending);
            assert_eq!(
                out.actions.last(),
                Some(&Action::transfer(EscalationReason::OutOfScope))
            );
            assert!(!spoken(&out).iter().any(|t| t.contains("TO BE PROVIDED")));
            assert_eq!(sm.context().snapshot().missing_topics, vec![InfoTopic::Hours]);
        }
    }

    #[test]
    fn test_two_unavailable_classifications_escalate() {
        let mut sm = machine();
        turn(&mut sm, "hello", Classification::new(Intent::GeneralGreeting));

        let unavailable = || CallError::ClassificationUnavailable("connection refused".to_string());
        let out = fail_classification(&mut sm, "do you have parking", unavailable());
        assert_eq!(sm.state(), CallState::InformationGathering);
        assert_eq!(
            spoken(&out),
            vec!["I'm sorry, I couldn't hear that clearly. Could you please repeat?"]
        );

        let out = fail_classification(&mut sm, "do you have parking", unavailable());
        assert_eq!(sm.state(), CallState::EscalationPending);
        assert_eq!(
            out.actions.last(),
            Some(&Action::transfer(EscalationReason::RepeatedUnclear))
        );
        assert!(sm
            .context()
            .snapshot()
            .tags
            .contains(&CallTag::ClassifierUnavailable));
    }

    #[test]
    fn test_two_timeouts_escalate() {
        let mut sm = machine();
        let timeout = || CallError::ClassificationTimeout { budget_ms: 10_000 };

        fail_classification(&mut sm, "what time do you open", timeout());
        assert!(!sm.context().escalation_triggered());

        let out = fail_classification(&mut sm, "what time do you open", timeout());
        assert_eq!(
            out.actions.last(),
            Some(&Action::transfer(EscalationReason::RepeatedUnclear))
        );
        assert!(sm.context().snapshot().tags.contains(&CallTag::ProcessingTimeout));
    }

    #[test]
    fn test_nan_confidence_is_low_confidence() {
        let mut sm = machine();
        match sm.begin_turn("what time do you open", f32::NAN) {
            TurnStep::Decided(_) => {},
            TurnStep::Classify(_) => panic!("NaN confidence must not be classified"),
        }
        assert_eq!(sm.context().unclear_count(), 1);
        assert!(sm.context().snapshot().tags.contains(&CallTag::LowConfidence));
    }

    #[test]
    fn test_history_never_exceeds_window() {
        let mut sm = machine();
        for _ in 0..6 {
            turn(&mut sm, "hello", Classification::new(Intent::GeneralGreeting));
            assert!(sm.context().history_len() <= 3);
        }
    }
}
