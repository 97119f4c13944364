//! Restaurant knowledge base configuration
//!
//! Loaded once at startup and shared read-only by every call. A field that
//! is missing, blank, or still holds the `[TO BE PROVIDED]` placeholder is
//! treated as absent, which the state machine escalates as out of scope.

use serde::{Deserialize, Serialize};

use call_agent_core::{configured_value, InfoTopic, KnowledgeBase};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    /// Opening hours, phrased to follow "We are ..."
    #[serde(default)]
    pub hours: Option<String>,

    #[serde(default)]
    pub menu_categories: Vec<String>,

    #[serde(default)]
    pub delivery_policy: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

impl KnowledgeBaseConfig {
    /// Topics that have a usable value
    pub fn configured_topics(&self) -> Vec<InfoTopic> {
        InfoTopic::ALL
            .iter()
            .copied()
            .filter(|topic| self.lookup(*topic).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configured_topics().is_empty()
    }
}

impl KnowledgeBase for KnowledgeBaseConfig {
    fn lookup(&self, topic: InfoTopic) -> Option<String> {
        match topic {
            InfoTopic::Name => self.name.as_deref().and_then(configured_value),
            InfoTopic::Address => self.address.as_deref().and_then(configured_value),
            InfoTopic::Hours => self.hours.as_deref().and_then(configured_value),
            InfoTopic::Delivery => self.delivery_policy.as_deref().and_then(configured_value),
            InfoTopic::Phone => self.phone.as_deref().and_then(configured_value),
            InfoTopic::Menu => {
                let categories: Vec<String> = self
                    .menu_categories
                    .iter()
                    .filter_map(|c| configured_value(c))
                    .collect();
                if categories.is_empty() {
                    None
                } else {
                    Some(categories.join(", "))
                }
            },
        }
    }
}
