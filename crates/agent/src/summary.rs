//! End-of-call summary generation
//!
//! [`generate`] is total: every missing field degrades to a default
//! ("Unknown", empty list) instead of failing.

use chrono::Utc;

use call_agent_core::{CallTag, ContextSnapshot, Intent, Sentiment, SpeakerRole, Summary};

const UNKNOWN_CALLER: &str = "Unknown";

/// Intents that say something about why the caller rang
fn is_substantive(intent: Intent) -> bool {
    !matches!(
        intent,
        Intent::GeneralGreeting | Intent::ClosingIntent | Intent::Unclear
    )
}

fn issues_discussed(snapshot: &ContextSnapshot) -> Vec<String> {
    let mut issues: Vec<String> = snapshot
        .intents_seen
        .iter()
        .copied()
        .filter(|i| is_substantive(*i))
        .map(|i| i.display_name().to_string())
        .collect();

    issues.extend(
        snapshot
            .missing_topics
            .iter()
            .map(|topic| format!("Asked about {} (not in knowledge base)", topic)),
    );

    // Nothing classified: fall back to what the caller last said
    if issues.is_empty() {
        if let Some(turn) = snapshot
            .history
            .iter()
            .rev()
            .find(|t| t.role == SpeakerRole::Caller && !t.text.trim().is_empty())
        {
            issues.push(format!("Caller said: \"{}\"", turn.text.trim()));
        }
    }

    issues
}

fn overall_sentiment(snapshot: &ContextSnapshot) -> Sentiment {
    if snapshot.anger_signal_count >= 1 {
        Sentiment::Negative
    } else if snapshot.last_sentiment == Sentiment::Positive {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

fn action_items(snapshot: &ContextSnapshot) -> Vec<String> {
    let mut items = Vec::new();

    if snapshot.escalation_triggered {
        if let Some(reason) = snapshot.escalation_reason {
            items.push(reason.action_item().to_string());
        }
        if snapshot.caller_name.is_none() {
            items.push("Collect caller name on transfer".to_string());
        }
    }

    items.extend(
        snapshot
            .missing_topics
            .iter()
            .map(|topic| format!("Add knowledge base entry: {}", topic)),
    );

    if snapshot.tags.contains(&CallTag::ProcessingTimeout) {
        items.push("Review intent classifier latency".to_string());
    }
    if snapshot.tags.contains(&CallTag::ClassifierUnavailable) {
        items.push("Check intent classifier availability".to_string());
    }
    if let Some(error) = &snapshot.error {
        items.push(format!("Investigate internal error: {}", error));
    }

    items
}

/// Fold a context snapshot into the end-of-call report
pub fn generate(snapshot: &ContextSnapshot) -> Summary {
    let ended_at = snapshot.ended_at.unwrap_or_else(Utc::now);
    let duration_secs = (ended_at - snapshot.started_at).num_seconds().max(0);

    Summary {
        session_id: snapshot.session_id.clone(),
        caller_name: snapshot
            .caller_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_CALLER.to_string()),
        caller_phone: snapshot.caller_phone.clone(),
        intent: snapshot.current_intent,
        issues_discussed: issues_discussed(snapshot),
        escalated: snapshot.escalation_triggered,
        escalation_reason: snapshot.escalation_reason,
        sentiment: overall_sentiment(snapshot),
        action_items: action_items(snapshot),
        final_state: snapshot.state,
        turn_count: snapshot.turn_count,
        tags: snapshot.tags.iter().copied().collect(),
        error: snapshot.error.is_some(),
        started_at: snapshot.started_at,
        ended_at,
        duration_secs,
    }
}
