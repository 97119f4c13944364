//! Fixed phrases spoken by the agent
//!
//! The agent never generates free text. Every spoken line comes from one of
//! these templates; `{name}` is replaced with the restaurant name and
//! `{value}` with the knowledge-base value being answered.

use serde::{Deserialize, Serialize};

use call_agent_core::InfoTopic;

/// Used for `{name}` when the restaurant name is not configured
const UNNAMED_RESTAURANT: &str = "us";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhrasesConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Spoken after an unclear turn that did not escalate
    #[serde(default = "default_repeat")]
    pub repeat: String,

    /// Spoken when the caller talks while a transfer is pending
    #[serde(default = "default_hold")]
    pub hold: String,

    #[serde(default = "default_transfer")]
    pub transfer: String,

    /// Spoken before ending a call that hit an internal error
    #[serde(default = "default_apology")]
    pub apology: String,

    #[serde(default = "default_farewell")]
    pub farewell: String,

    /// Appended to every knowledge-base answer
    #[serde(default = "default_follow_up")]
    pub follow_up: String,

    #[serde(default)]
    pub answers: AnswerTemplates,
}

/// Per-topic answer templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerTemplates {
    #[serde(default = "default_answer_name")]
    pub name: String,
    #[serde(default = "default_answer_address")]
    pub address: String,
    #[serde(default = "default_answer_hours")]
    pub hours: String,
    #[serde(default = "default_answer_menu")]
    pub menu: String,
    #[serde(default = "default_answer_delivery")]
    pub delivery: String,
    #[serde(default = "default_answer_phone")]
    pub phone: String,
}

fn default_greeting() -> String {
    "Hello! Thank you for calling {name}. How can I assist you today?".to_string()
}
fn default_repeat() -> String {
    "I'm sorry, I couldn't hear that clearly. Could you please repeat?".to_string()
}
fn default_hold() -> String {
    "Please hold while I transfer you to our staff.".to_string()
}
fn default_transfer() -> String {
    "I'll connect you with our staff who can better assist you.".to_string()
}
fn default_apology() -> String {
    "I'm sorry, I'm experiencing technical difficulties. Please call us again shortly.".to_string()
}
fn default_farewell() -> String {
    "Thank you for calling {name}. Have a great day!".to_string()
}
fn default_follow_up() -> String {
    "Is there anything else I can help you with?".to_string()
}
fn default_answer_name() -> String {
    "You've reached {value}.".to_string()
}
fn default_answer_address() -> String {
    "We are located at {value}.".to_string()
}
fn default_answer_hours() -> String {
    "We are {value}.".to_string()
}
fn default_answer_menu() -> String {
    "Our menu includes {value}.".to_string()
}
fn default_answer_delivery() -> String {
    "{value}".to_string()
}
fn default_answer_phone() -> String {
    "You can reach us at {value}.".to_string()
}

impl Default for AnswerTemplates {
    fn default() -> Self {
        Self {
            name: default_answer_name(),
            address: default_answer_address(),
            hours: default_answer_hours(),
            menu: default_answer_menu(),
            delivery: default_answer_delivery(),
            phone: default_answer_phone(),
        }
    }
}

impl AnswerTemplates {
    pub fn for_topic(&self, topic: InfoTopic) -> &str {
        match topic {
            InfoTopic::Name => &self.name,
            InfoTopic::Address => &self.address,
            InfoTopic::Hours => &self.hours,
            InfoTopic::Menu => &self.menu,
            InfoTopic::Delivery => &self.delivery,
            InfoTopic::Phone => &self.phone,
        }
    }
}

impl Default for PhrasesConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            repeat: default_repeat(),
            hold: default_hold(),
            transfer: default_transfer(),
            apology: default_apology(),
            farewell: default_farewell(),
            follow_up: default_follow_up(),
            answers: AnswerTemplates::default(),
        }
    }
}

fn render(template: &str, name: Option<&str>, value: Option<&str>) -> String {
    let mut out = template.replace("{name}", name.unwrap_or(UNNAMED_RESTAURANT));
    if let Some(value) = value {
        out = out.replace("{value}", value);
    }
    out
}

impl PhrasesConfig {
    pub fn greeting(&self, restaurant: Option<&str>) -> String {
        render(&self.greeting, restaurant, None)
    }

    pub fn farewell(&self, restaurant: Option<&str>) -> String {
        render(&self.farewell, restaurant, None)
    }

    /// Answer for a knowledge-base topic, followed by the follow-up prompt
    pub fn answer(&self, topic: InfoTopic, value: &str, restaurant: Option<&str>) -> String {
        let answer = render(self.answers.for_topic(topic), restaurant, Some(value));
        if self.follow_up.trim().is_empty() {
            answer
        } else {
            format!("{} {}", answer, self.follow_up)
        }
    }

    /// Names of the fixed phrases that are blank
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("phrases.greeting", &self.greeting),
            ("phrases.repeat", &self.repeat),
            ("phrases.hold", &self.hold),
            ("phrases.transfer", &self.transfer),
            ("phrases.apology", &self.apology),
            ("phrases.farewell", &self.farewell),
        ]
        .into_iter()
        .filter(|(_, text)| text.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_with_and_without_name() {
        let phrases = PhrasesConfig::default();
        assert_eq!(
            phrases.greeting(Some("Spice Garden")),
            "Hello! Thank you for calling Spice Garden. How can I assist you today?"
        );
        assert_eq!(
            phrases.farewell(None),
            "Thank you for calling us. Have a great day!"
        );
    }

    #[test]
    fn test_answer_rendering() {
        let phrases = PhrasesConfig::default();
        let text = phrases.answer(
            InfoTopic::Hours,
            "open from 10 AM to 10 PM daily",
            Some("Spice Garden"),
        );
        assert_eq!(
            text,
            "We are open from 10 AM to 10 PM daily. Is there anything else I can help you with?"
        );
    }

    #[test]
    fn test_answer_without_follow_up() {
        let mut phrases = PhrasesConfig::default();
        phrases.follow_up.clear();
        assert_eq!(
            phrases.answer(InfoTopic::Address, "12 Curry Lane", None),
            "We are located at 12 Curry Lane."
        );
    }

    #[test]
    fn test_blank_fields() {
        let mut phrases = PhrasesConfig::default();
        assert!(phrases.blank_fields().is_empty());
        phrases.hold = "  ".to_string();
        assert_eq!(phrases.blank_fields(), vec!["phrases.hold"]);
    }
}
