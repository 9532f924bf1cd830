//! Configuration schema for plcgen

use super::ConfigError;
use crate::gateway::DEFAULT_TEMPERATURE;
use crate::lint::{SkeletonLint, DEFAULT_SKELETON_PATTERNS};
use crate::package::validate_project_name;
use crate::pipeline::{DEFAULT_MAX_CRITIC_ROUNDS, DEFAULT_PROJECT_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main plcgen configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Model name
    pub model: String,

    /// API key (supports `${VAR}` interpolation). Falls back to `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Organization header for providers that support it
    pub organization: Option<String>,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            organization: None,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: 120,
        }
    }
}

/// Pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory for generated projects
    pub out_dir: PathBuf,

    /// Project name used when a request does not supply one
    pub default_project_name: String,

    /// Upper bound on critic/patch rounds; 0 skips the critic
    pub max_critic_rounds: u32,

    /// Reject generated files that match a red-flag pattern
    pub skeleton_lint: bool,

    /// Replacement pattern list for the skeleton lint
    pub skeleton_patterns: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            max_critic_rounds: DEFAULT_MAX_CRITIC_ROUNDS,
            skeleton_lint: false,
            skeleton_patterns: None,
        }
    }
}

impl PipelineConfig {
    /// Compile the lint if it is enabled.
    pub fn build_lint(&self) -> Result<Option<SkeletonLint>, ConfigError> {
        if !self.skeleton_lint {
            return Ok(None);
        }

        let lint = match &self.skeleton_patterns {
            Some(patterns) => SkeletonLint::new(patterns.as_slice()),
            None => SkeletonLint::new(DEFAULT_SKELETON_PATTERNS),
        }
        .map_err(|e| ConfigError::Invalid(format!("invalid skeleton pattern: {}", e)))?;

        Ok(Some(lint))
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown log format: {}", other))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Resolve `${VAR}` references in string fields
    pub fn resolve_env_vars(&mut self) {
        self.resolve_env_vars_with(|name| std::env::var(name).ok());
    }

    pub fn resolve_env_vars_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ref api_key) = self.llm.api_key {
            self.llm.api_key = Some(expand_env_var(api_key, &lookup));
        }
        self.llm.base_url = expand_env_var(&self.llm.base_url, &lookup);
        if let Some(ref org) = self.llm.organization {
            self.llm.organization = Some(expand_env_var(org, &lookup));
        }
    }

    /// Apply `PLCGEN_*` (and the conventional `PORT`, `MODEL_NAME`)
    /// environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_with(|name| std::env::var(name).ok())
    }

    pub fn apply_env_overrides_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = first_set(&lookup, &["PLCGEN_HOST", "HOST"]) {
            self.server.host = host;
        }
        if let Some(port) = first_set(&lookup, &["PLCGEN_PORT", "PORT"]) {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(model) = first_set(&lookup, &["PLCGEN_MODEL", "MODEL_NAME"]) {
            self.llm.model = model;
        }
        if let Some(base_url) = first_set(&lookup, &["PLCGEN_BASE_URL", "OPENAI_BASE_URL"]) {
            self.llm.base_url = base_url;
        }
        if let Some(temperature) = first_set(&lookup, &["PLCGEN_TEMPERATURE"]) {
            self.llm.temperature = parse_value("PLCGEN_TEMPERATURE", &temperature)?;
        }
        if let Some(out_dir) = first_set(&lookup, &["PLCGEN_OUT_DIR"]) {
            self.pipeline.out_dir = PathBuf::from(out_dir);
        }
        if let Some(rounds) = first_set(&lookup, &["PLCGEN_MAX_CRITIC_ROUNDS"]) {
            self.pipeline.max_critic_rounds = parse_value("PLCGEN_MAX_CRITIC_ROUNDS", &rounds)?;
        }
        if let Some(lint) = first_set(&lookup, &["PLCGEN_SKELETON_LINT"]) {
            self.pipeline.skeleton_lint = parse_value("PLCGEN_SKELETON_LINT", &lint)?;
        }
        if let Some(level) = first_set(&lookup, &["PLCGEN_LOG_LEVEL"]) {
            self.logging.level = level;
        }
        if let Some(format) = first_set(&lookup, &["PLCGEN_LOG_FORMAT"]) {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "llm.base_url must be an http(s) URL: {}",
                self.llm.base_url
            )));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must not be 0".to_string()));
        }
        if self.pipeline.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("pipeline.out_dir must not be empty".to_string()));
        }
        validate_project_name(&self.pipeline.default_project_name)
            .map_err(|e| ConfigError::Invalid(format!("pipeline.default_project_name: {}", e)))?;
        self.pipeline.build_lint()?;

        Ok(())
    }

    /// API key from `llm.api_key`, else from the `llm.api_key_env` variable.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !is_unresolved_reference(key))
            .map(str::to_string)
            .or_else(|| lookup(&self.llm.api_key_env).filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| ConfigError::MissingApiKey(self.llm.api_key_env.clone()))
    }
}

fn first_set(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| lookup(*name).filter(|v| !v.trim().is_empty()))
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value: {}", name, raw)))
}

/// Expand a whole-value `${VAR_NAME}` reference. Unknown variables are kept
/// verbatim.
fn expand_env_var(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    if is_unresolved_reference(value) {
        let var_name = &value[2..value.len() - 1];
        lookup(var_name).unwrap_or_else(|| value.to_string())
    } else {
        value.to_string()
    }
}

fn is_unresolved_reference(value: &str) -> bool {
    value.len() > 3 && value.starts_with("${") && value.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.pipeline.max_critic_rounds, 3);
        assert_eq!(config.pipeline.default_project_name, "PandauraProject");
        assert!(!config.pipeline.skeleton_lint);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[llm]
model = "gpt-4o"

[pipeline]
max_critic_rounds = 5
"#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.pipeline.max_critic_rounds, 5);
        assert_eq!(config.pipeline.out_dir, PathBuf::from("output"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides_with(env(&[
                ("PORT", "9000"),
                ("MODEL_NAME", "gpt-4.1"),
                ("PLCGEN_OUT_DIR", "/tmp/plc"),
                ("PLCGEN_MAX_CRITIC_ROUNDS", "1"),
                ("PLCGEN_SKELETON_LINT", "true"),
                ("PLCGEN_LOG_FORMAT", "JSON"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.pipeline.out_dir, PathBuf::from("/tmp/plc"));
        assert_eq!(config.pipeline.max_critic_rounds, 1);
        assert!(config.pipeline.skeleton_lint);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_prefixed_env_wins_over_conventional() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides_with(env(&[("PORT", "9000"), ("PLCGEN_PORT", "9100")]))
            .unwrap();
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides_with(env(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.llm.base_url = "api.openai.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pipeline.default_project_name = "../x".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pipeline.skeleton_lint = true;
        config.pipeline.skeleton_patterns = Some(vec!["(".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_lint() {
        let mut pipeline = PipelineConfig::default();
        assert!(pipeline.build_lint().unwrap().is_none());

        pipeline.skeleton_lint = true;
        let lint = pipeline.build_lint().unwrap().unwrap();
        assert_eq!(lint.len(), DEFAULT_SKELETON_PATTERNS.len());

        pipeline.skeleton_patterns = Some(vec!["FIXME".to_string()]);
        assert_eq!(pipeline.build_lint().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_api_key_resolution() {
        let mut config = AppConfig::default();
        let lookup = env(&[("OPENAI_API_KEY", "sk-env"), ("MY_KEY", "sk-custom")]);

        assert_eq!(config.resolve_api_key_with(&lookup).unwrap(), "sk-env");

        config.llm.api_key = Some("sk-inline".to_string());
        assert_eq!(config.resolve_api_key_with(&lookup).unwrap(), "sk-inline");

        config.llm.api_key = Some("${MY_KEY}".to_string());
        config.resolve_env_vars_with(&lookup);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-custom"));
        assert_eq!(config.resolve_api_key_with(&lookup).unwrap(), "sk-custom");
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("${UNSET_VARIABLE}".to_string());
        config.resolve_env_vars_with(env(&[]));

        let err = config.resolve_api_key_with(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(var) if var == "OPENAI_API_KEY"));
    }
}
