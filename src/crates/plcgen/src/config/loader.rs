//! Configuration loader
//!
//! Layers, later wins:
//! 1. Default values
//! 2. Config file: explicit path, else `$PLCGEN_CONFIG`, else `./plcgen.toml`
//!    when present
//! 3. Environment overrides
//!
//! Command-line flags are applied by the binaries on top of the result.

use super::schema::AppConfig;
use super::ConfigError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "plcgen.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "PLCGEN_CONFIG";

/// Builds an [`AppConfig`] from its layers
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this file instead of the default lookup. A missing file is an error.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// File to read, and whether it must exist.
    fn config_source(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.explicit_path {
            return Some((path.clone(), true));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Some((PathBuf::from(path), true));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some((local, false))
    }

    /// Load, override from the environment, and validate.
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.config_source() {
            Some((path, required)) if required || path.exists() => {
                let config = Self::load_from_path(&path).await?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            _ => {
                debug!("No configuration file found, using defaults");
                AppConfig::default()
            }
        };

        config.resolve_env_vars();
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a single TOML file. Missing sections and fields take defaults.
    pub async fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
