//! Read-only knowledge base lookup

use std::collections::HashMap;

use crate::intent::InfoTopic;

/// Marker left in templates for fields nobody filled in
pub const PLACEHOLDER: &str = "[TO BE PROVIDED]";

/// A knowledge-base value fit to be spoken: trimmed, non-empty and free of
/// the placeholder marker
pub fn configured_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.to_ascii_uppercase().contains(PLACEHOLDER) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Static restaurant facts, populated externally
///
/// The core never writes to it. `None` means the field is not configured
/// and must never be answered with invented content.
pub trait KnowledgeBase: Send + Sync {
    fn lookup(&self, topic: InfoTopic) -> Option<String>;

    /// Restaurant name used in greetings and farewells
    fn restaurant_name(&self) -> Option<String> {
        self.lookup(InfoTopic::Name)
    }
}

/// In-memory knowledge base, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct StaticKnowledgeBase {
    entries: HashMap<InfoTopic, String>,
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, topic: InfoTopic, value: impl Into<String>) -> Self {
        self.entries.insert(topic, value.into());
        self
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn lookup(&self, topic: InfoTopic) -> Option<String> {
        self.entries
            .get(&topic)
            .and_then(|v| configured_value(v))
    }
}
