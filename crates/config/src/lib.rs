//! Configuration management for the call agent
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (`config/default`, then `config/{env}`)
//! - Environment variables (`CALL_AGENT__` prefix, `__` separator)
//!
//! The knowledge base is loaded once and shared read-only by every call.

pub mod agent;
pub mod constants;
pub mod knowledge;
pub mod phrases;
pub mod settings;

pub use agent::AgentConfig;
pub use knowledge::KnowledgeBaseConfig;
pub use phrases::{AnswerTemplates, PhrasesConfig};
pub use settings::{
    load_settings, load_settings_file, load_settings_from, ObservabilityConfig, RuntimeEnvironment,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
