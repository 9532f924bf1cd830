//! Process configuration.
//!
//! One [`AppConfig`] is built at startup from defaults, an optional TOML file
//! and environment overrides, then handed to the components that need it.

pub mod loader;
pub mod schema;

pub use loader::{ConfigLoader, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
pub use schema::{AppConfig, LlmConfig, LogFormat, LoggingConfig, PipelineConfig, ServerConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No API key configured: set llm.api_key or the {0} environment variable")]
    MissingApiKey(String),
}
