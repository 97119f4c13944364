//! Deterministic keyword classifier
//!
//! Stands in for a model-backed classifier in tests and in the simulator.
//! Matching is word-bounded and case-insensitive. When several intents
//! match, precedence is:
//!
//! human request > complaint > order > reservation > information >
//! closing > greeting > bare question
//!
//! Anything else is [`Intent::Unclear`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use call_agent_core::{CallError, Classification, InfoTopic, Intent, IntentClassifier, Turn};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| {
            Regex::new(p)
                .map_err(|e| tracing::error!(pattern = p, error = %e, "Invalid classifier pattern"))
                .ok()
        })
        .collect()
}

static HUMAN_REQUEST: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(speak|talk)\s+(to|with)\b.*\b(manager|human|person|someone|somebody|staff|owner|representative)\b",
        r"\b(real person|human being|operator|representative)\b",
        r"\b(transfer|connect|put)\s+me\b",
        r"\b(get|want|need)\s+(a|the|your)\s+manager\b",
    ])
});

static COMPLAINT: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(complain|complaint|complaining|problem|issue|refund)\b",
        r"\bwrong\s+(order|food|dish|item)\b",
        r"\b(cold|burnt|raw|stale|undercooked)\s+food\b",
        r"\bfood\s+(was|is)\s+(cold|bad|terrible|awful|raw|burnt)\b",
        r"\bnever\s+(arrived|came|showed up)\b",
        r"\bfood\s+poisoning\b",
        r"\bwas\s+rude\b",
    ])
});

static ORDER: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(order|ordering)\b",
        r"\b(takeout|take out|takeaway|take away|to go)\b",
    ])
});

static RESERVATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(reserve|reservation|reservations|book|booking)\b",
        r"\btable\s+for\b",
    ])
});

/// Checked in order; the first topic that matches is the one asked about
static TOPICS: Lazy<Vec<(InfoTopic, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            InfoTopic::Delivery,
            compile(&[r"\b(deliver|delivers|delivery|delivering)\b"]),
        ),
        (
            InfoTopic::Hours,
            compile(&[
                r"\b(hours|open|opening|closing time|close|closes|what time)\b",
                r"\bwhen\s+(do|are|does)\s+you\b",
            ]),
        ),
        (
            InfoTopic::Address,
            compile(&[
                r"\b(address|located|location|directions|find you)\b",
                r"\bwhere\s+(are|is)\s+(you|the restaurant)\b",
            ]),
        ),
        (
            InfoTopic::Menu,
            compile(&[
                r"\b(menu|dishes|cuisine|vegetarian|vegan|gluten|specials)\b",
                r"\bwhat\s+(do|does)\s+you\s+(serve|have|offer)\b",
            ]),
        ),
        (
            InfoTopic::Phone,
            compile(&[r"\b(phone number|your number|contact number|number to call)\b"]),
        ),
        (
            InfoTopic::Name,
            compile(&[
                r"\bname of (the|your|this) (restaurant|place)\b",
                r"\bwhat('?s| is) (the|your) (restaurant'?s )?name\b",
                r"\bwhat restaurant\b",
            ]),
        ),
    ]
});

static CLOSING: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(bye|goodbye|good bye|see you)\b",
        r"\b(that'?s all|that is all|that'?s it|nothing else)\b",
        r"\b(thank you|thanks)\b",
        r"\bhave a (good|great|nice) (day|night|evening)\b",
    ])
});

static GREETING: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"\b(hello|hi|hey|hiya|good (morning|afternoon|evening))\b"])
});

static QUESTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\?\s*$",
        r"^\s*(do|does|can|could|is|are|what|where|when|how|which|who|will|would)\b",
    ])
});

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bmy name is\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*)?)",
        r"(?i)\bthis is\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*)?)\s+(?:speaking|calling|here)\b",
        r"(?i)\b(?:i am|i'm)\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*)?)\s+(?:speaking|calling|here)\b",
        r"(?i)\bcall me\s+([a-z][a-z'\-]*)",
    ])
});

/// Words that end a captured name ("my name is Sam and ...")
const NAME_STOPWORDS: &[&str] = &[
    "and", "i", "i'm", "calling", "speaking", "here", "from", "to", "the", "a", "an", "with",
    "about", "please", "want", "wanted", "would", "like", "but", "so", "not", "no",
];

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('\u{2019}', "'")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Best-effort caller name from an introduction
pub fn extract_caller_name(text: &str) -> Option<String> {
    let text = text.replace('\u{2019}', "'");
    NAME_PATTERNS.iter().find_map(|re| {
        let captured = re.captures(&text)?.get(1)?.as_str();
        let words: Vec<String> = captured
            .split_whitespace()
            .take_while(|w| !NAME_STOPWORDS.contains(&w.to_lowercase().as_str()))
            .map(title_case)
            .collect();
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    })
}

/// Keyword-table intent classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous classification of a single utterance
    pub fn classify_text(&self, text: &str) -> Classification {
        let text = normalize(text);
        if text.is_empty() {
            return Classification::unclear();
        }

        if any_match(&HUMAN_REQUEST, &text) {
            return Classification::new(Intent::HumanRequest);
        }
        if any_match(&COMPLAINT, &text) {
            return Classification::new(Intent::Complaint);
        }
        if any_match(&ORDER, &text) {
            return Classification::new(Intent::OrderRequest);
        }
        if any_match(&RESERVATION, &text) {
            return Classification::new(Intent::ReservationRequest);
        }
        if let Some((topic, _)) = TOPICS.iter().find(|(_, patterns)| any_match(patterns, &text)) {
            return Classification::information(*topic);
        }
        if any_match(&CLOSING, &text) {
            return Classification::new(Intent::ClosingIntent);
        }
        // An introduction on its own is treated as a greeting
        if any_match(&GREETING, &text) || extract_caller_name(&text).is_some() {
            return Classification::new(Intent::GeneralGreeting);
        }
        if any_match(&QUESTION, &text) {
            return Classification::new(Intent::InformationRequest);
        }

        Classification::unclear()
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str, _history: &[Turn]) -> Result<Classification, CallError> {
        Ok(self.classify_text(text))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
