//! Per-call context store
//!
//! Holds everything the agent knows about one call: caller facts, a bounded
//! window of recent turns, and the rolling counters the escalation rules
//! read. It does no I/O and is owned by exactly one state machine.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, VecDeque};

use call_agent_core::{
    CallState, CallTag, ContextSnapshot, EscalationReason, InfoTopic, Intent, Sentiment,
    SpeakerRole, Turn,
};

#[derive(Debug)]
pub struct ContextStore {
    session_id: String,
    state: CallState,
    caller_name: Option<String>,
    caller_phone: Option<String>,
    current_intent: Option<Intent>,
    history: VecDeque<Turn>,
    history_window: usize,
    unclear_count: u32,
    anger_signal_count: u32,
    escalation_triggered: bool,
    escalation_reason: Option<EscalationReason>,
    last_sentiment: Sentiment,
    intents_seen: Vec<Intent>,
    missing_topics: Vec<InfoTopic>,
    tags: BTreeSet<CallTag>,
    turn_count: usize,
    error: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ContextStore {
    pub fn new(session_id: impl Into<String>, history_window: usize) -> Self {
        Self {
            session_id: session_id.into(),
            state: CallState::Greeting,
            caller_name: None,
            caller_phone: None,
            current_intent: None,
            history: VecDeque::with_capacity(history_window.max(1)),
            history_window: history_window.max(1),
            unclear_count: 0,
            anger_signal_count: 0,
            escalation_triggered: false,
            escalation_reason: None,
            last_sentiment: Sentiment::Neutral,
            intents_seen: Vec::new(),
            missing_topics: Vec::new(),
            tags: BTreeSet::new(),
            turn_count: 0,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Only the state machine moves the call between states
    pub(crate) fn set_state(&mut self, state: CallState) {
        self.state = state;
    }

    /// Append a turn, evicting the oldest once the window is full
    pub fn record_turn(&mut self, role: SpeakerRole, text: impl Into<String>) {
        while self.history.len() >= self.history_window {
            self.history.pop_front();
        }
        self.history.push_back(Turn::new(role, text));
        if role == SpeakerRole::Caller {
            self.turn_count += 1;
        }
    }

    /// Set caller name and/or phone. Empty values never overwrite.
    pub fn set_caller_fact(&mut self, name: Option<&str>, phone: Option<&str>) {
        if let Some(name) = non_empty(name) {
            self.caller_name = Some(name);
        }
        if let Some(phone) = non_empty(phone) {
            self.caller_phone = Some(phone);
        }
    }

    pub fn caller_name(&self) -> Option<&str> {
        self.caller_name.as_deref()
    }

    /// Recent turns, oldest first
    pub fn history(&self) -> Vec<Turn> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn record_intent(&mut self, intent: Intent) {
        self.current_intent = Some(intent);
        if !self.intents_seen.contains(&intent) {
            self.intents_seen.push(intent);
        }
    }

    pub fn unclear_count(&self) -> u32 {
        self.unclear_count
    }

    /// Count one more unclear turn, never past `cap`
    pub fn increment_unclear(&mut self, cap: u32) -> u32 {
        self.unclear_count = (self.unclear_count + 1).min(cap);
        self.unclear_count
    }

    pub fn reset_unclear(&mut self) {
        self.unclear_count = 0;
    }

    pub fn anger_signal_count(&self) -> u32 {
        self.anger_signal_count
    }

    /// Negative turns extend the streak (capped), anything else ends it
    pub fn record_sentiment(&mut self, sentiment: Sentiment, cap: u32) -> u32 {
        self.last_sentiment = sentiment;
        if sentiment.is_negative() {
            self.anger_signal_count = (self.anger_signal_count + 1).min(cap);
        } else {
            self.anger_signal_count = 0;
        }
        self.anger_signal_count
    }

    pub fn escalation_triggered(&self) -> bool {
        self.escalation_triggered
    }

    /// Latch the escalation flag. Returns false if it was already set, in
    /// which case the original reason is kept.
    pub fn mark_escalated(&mut self, reason: EscalationReason) -> bool {
        if self.escalation_triggered {
            return false;
        }
        self.escalation_triggered = true;
        self.escalation_reason = Some(reason);
        true
    }

    pub fn record_missing_topic(&mut self, topic: InfoTopic) {
        if !self.missing_topics.contains(&topic) {
            self.missing_topics.push(topic);
        }
        self.tags.insert(CallTag::KnowledgeBaseGap);
    }

    pub fn add_tag(&mut self, tag: CallTag) {
        self.tags.insert(tag);
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub(crate) fn mark_ended(&mut self) {
        if self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Immutable copy for summary generation
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            caller_name: self.caller_name.clone(),
            caller_phone: self.caller_phone.clone(),
            current_intent: self.current_intent,
            history: self.history(),
            unclear_count: self.unclear_count,
            anger_signal_count: self.anger_signal_count,
            escalation_triggered: self.escalation_triggered,
            escalation_reason: self.escalation_reason,
            last_sentiment: self.last_sentiment,
            intents_seen: self.intents_seen.clone(),
            missing_topics: self.missing_topics.clone(),
            tags: self.tags.clone(),
            turn_count: self.turn_count,
            error: self.error.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded_and_chronological() {
        let mut ctx = ContextStore::new("call-1", 3);
        for i in 0..10 {
            ctx.record_turn(SpeakerRole::Caller, format!("utterance {}", i));
            assert!(ctx.history_len() <= 3);
        }

        let texts: Vec<String> = ctx.history().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["utterance 7", "utterance 8", "utterance 9"]);
        assert_eq!(ctx.snapshot().turn_count, 10);
    }

    #[test]
    fn test_agent_turns_do_not_count_as_caller_turns() {
        let mut ctx = ContextStore::new("call-1", 3);
        ctx.record_turn(SpeakerRole::Caller, "hello");
        ctx.record_turn(SpeakerRole::Agent, "Hello! How can I help?");
        assert_eq!(ctx.snapshot().turn_count, 1);
        assert_eq!(ctx.history_len(), 2);
    }

    #[test]
    fn test_caller_facts_never_overwritten_with_empty() {
        let mut ctx = ContextStore::new("call-1", 3);
        ctx.set_caller_fact(Some("Priya"), Some("+15550100"));
        ctx.set_caller_fact(Some("  "), None);
        ctx.set_caller_fact(None, Some(""));

        let snap = ctx.snapshot();
        assert_eq!(snap.caller_name.as_deref(), Some("Priya"));
        assert_eq!(snap.caller_phone.as_deref(), Some("+15550100"));

        ctx.set_caller_fact(Some("Priya Sharma"), None);
        assert_eq!(ctx.caller_name(), Some("Priya Sharma"));
    }

    #[test]
    fn test_counters_are_capped_and_reset() {
        let mut ctx = ContextStore::new("call-1", 3);
        assert_eq!(ctx.increment_unclear(2), 1);
        assert_eq!(ctx.increment_unclear(2), 2);
        assert_eq!(ctx.increment_unclear(2), 2);
        ctx.reset_unclear();
        assert_eq!(ctx.unclear_count(), 0);

        assert_eq!(ctx.record_sentiment(Sentiment::Negative, 2), 1);
        assert_eq!(ctx.record_sentiment(Sentiment::Negative, 2), 2);
        assert_eq!(ctx.record_sentiment(Sentiment::Negative, 2), 2);
        assert_eq!(ctx.record_sentiment(Sentiment::Neutral, 2), 0);
    }

    #[test]
    fn test_escalation_latches_first_reason() {
        let mut ctx = ContextStore::new("call-1", 3);
        assert!(ctx.mark_escalated(EscalationReason::OrderRequest));
        assert!(!ctx.mark_escalated(EscalationReason::AngerDetected));

        let snap = ctx.snapshot();
        assert!(snap.escalation_triggered);
        assert_eq!(snap.escalation_reason, Some(EscalationReason::OrderRequest));
    }

    #[test]
    fn test_missing_topic_tags_gap() {
        let mut ctx = ContextStore::new("call-1", 3);
        ctx.record_missing_topic(InfoTopic::Delivery);
        ctx.record_missing_topic(InfoTopic::Delivery);

        let snap = ctx.snapshot();
        assert_eq!(snap.missing_topics, vec![InfoTopic::Delivery]);
        assert!(snap.tags.contains(&CallTag::KnowledgeBaseGap));
    }
}
