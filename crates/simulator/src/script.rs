//! Call scripts
//!
//! A script lists calls, each a sequence of transport events:
//!
//! ```yaml
//! calls:
//!   - session_id: demo-hours
//!     caller_phone: "+15550100"
//!     events:
//!       - turn: { text: "Hello", confidence: 0.95 }
//!       - turn: { text: "What time do you open?" }
//!       - hang_up
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub calls: Vec<ScriptedCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedCall {
    /// Generated when absent
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub caller_phone: Option<String>,

    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl ScriptedCall {
    pub fn session_id_or_new(&self) -> String {
        self.session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEvent {
    Turn {
        text: String,
        #[serde(default = "default_confidence")]
        confidence: f32,
    },
    TransferAcknowledged,
    HangUp,
}

fn default_confidence() -> f32 {
    1.0
}

impl Script {
    /// Parse YAML, or JSON when the file ends in `.json`
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let script = if is_json {
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid JSON script {}", path.display()))?
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Invalid YAML script {}", path.display()))?
        };
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_script() {
        let script: Script = serde_json::from_str(
            r#"{
                "calls": [{
                    "session_id": "call-1",
                    "events": [
                        {"turn": {"text": "Hello", "confidence": 0.8}},
                        {"turn": {"text": "Do you deliver?"}},
                        "transfer_acknowledged",
                        "hang_up"
                    ]
                }]
            }"#,
        )
        .unwrap();

        let call = &script.calls[0];
        assert_eq!(call.session_id_or_new(), "call-1");
        assert_eq!(call.caller_phone, None);
        assert_eq!(
            call.events,
            vec![
                ScriptEvent::Turn {
                    text: "Hello".to_string(),
                    confidence: 0.8
                },
                ScriptEvent::Turn {
                    text: "Do you deliver?".to_string(),
                    confidence: 1.0
                },
                ScriptEvent::TransferAcknowledged,
                ScriptEvent::HangUp,
            ]
        );
    }

    #[test]
    fn test_missing_session_id_is_generated() {
        let call = ScriptedCall {
            session_id: None,
            caller_phone: None,
            events: Vec::new(),
        };
        let a = call.session_id_or_new();
        let b = call.session_id_or_new();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "calls:\n  - caller_phone: \"+15550100\"\n    events:\n      - hang_up"
        )
        .unwrap();

        let script = Script::load(file.path()).unwrap();
        assert_eq!(script.calls.len(), 1);
        assert_eq!(script.calls[0].caller_phone.as_deref(), Some("+15550100"));
        assert_eq!(script.calls[0].events, vec![ScriptEvent::HangUp]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Script::load(Path::new("/nonexistent/script.yaml")).is_err());
    }
}
