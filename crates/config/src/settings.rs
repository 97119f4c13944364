//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{AgentConfig, ConfigError, KnowledgeBaseConfig, PhrasesConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Per-call thresholds and budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// Restaurant facts, read-only after load
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    #[serde(default)]
    pub phrases: PhrasesConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_agent()?;
        self.validate_phrases()?;
        self.validate_knowledge_base()?;
        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if agent.unclear_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.unclear_threshold".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if agent.anger_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.anger_threshold".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if agent.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.history_window".to_string(),
                message: "Must keep at least one turn".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&agent.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "agent.min_confidence".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", agent.min_confidence),
            });
        }

        if agent.classifier_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.classifier_timeout_ms".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        if agent.input_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.input_channel_capacity".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        if agent.cleanup_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.cleanup_interval_ms".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    fn validate_phrases(&self) -> Result<(), ConfigError> {
        if let Some(field) = self.phrases.blank_fields().first() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "Phrase must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_knowledge_base(&self) -> Result<(), ConfigError> {
        if !self.knowledge_base.is_empty() {
            return Ok(());
        }

        if self.environment.is_production() {
            return Err(ConfigError::MissingField(
                "knowledge_base (no field configured)".to_string(),
            ));
        }

        tracing::warn!(
            environment = ?self.environment,
            "Knowledge base is empty; every information request will be escalated"
        );
        Ok(())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from `config/default`, `config/{env}` and `CALL_AGENT__*`
/// environment variables, in increasing precedence
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name(&format!("{}/default", dir)).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&format!("{}/{}", dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CALL_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

/// Load settings from one explicit file plus environment overrides
pub fn load_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config = Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix("CALL_AGENT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
