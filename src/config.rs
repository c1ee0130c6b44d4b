//! askdb configuration
//!
//! Loaded from a JSON file (default `./askdb.json`). Every field has a
//! default, so `{}` is a valid configuration. Validation runs after load;
//! an invalid file fails startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "ASKDB_CONFIG_READ",
            ConfigError::Parse { .. } => "ASKDB_CONFIG_PARSE",
            ConfigError::Invalid(_) => "ASKDB_CONFIG_INVALID",
        }
    }
}

/// Model endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ollama-compatible generate endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Seconds to wait for a reply
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `<collection>.json` files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Schema registry file; the built-in registry when unset
    #[serde(default)]
    pub schema_file: Option<String>,

    /// Reject candidates naming unregistered collections
    #[serde(default = "default_strict_collections")]
    pub strict_collections: bool,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Append-only audit file; in-memory audit when unset
    #[serde(default)]
    pub audit_log: Option<String>,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_strict_collections() -> bool {
    true
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            schema_file: None,
            strict_collections: default_strict_collections(),
            log_level: default_log_level(),
            audit_log: None,
            model: ModelConfig::default(),
            http: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Checks values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be > 0".into()));
        }

        let endpoint = self.model.endpoint.as_str();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "model.endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model.model must not be empty".into()));
        }

        if self.log_severity().is_none() {
            return Err(ConfigError::Invalid(format!(
                "Unknown log_level '{}'",
                self.log_level
            )));
        }

        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        self.http.validate().map_err(ConfigError::Invalid)
    }

    pub fn log_severity(&self) -> Option<Severity> {
        Severity::parse(&self.log_level)
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn schema_path(&self) -> Option<PathBuf> {
        self.schema_file.as_ref().map(PathBuf::from)
    }

    pub fn audit_path(&self) -> Option<PathBuf> {
        self.audit_log.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json).unwrap();
        config.validate().map(|_| config)
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.model.model, "llama3");
        assert_eq!(config.model.timeout(), Duration::from_secs(30));
        assert!(config.strict_collections);
        assert_eq!(config.log_severity(), Some(Severity::Info));
    }

    #[test]
    fn test_partial_model_section() {
        let config = parse(r#"{"model": {"model": "mistral"}}"#).unwrap();
        assert_eq!(config.model.model, "mistral");
        assert_eq!(config.model.endpoint, "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse(r#"{"model": {"timeout_secs": 0}}"#).unwrap_err();
        assert_eq!(err.code(), "ASKDB_CONFIG_INVALID");
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        assert!(parse(r#"{"model": {"endpoint": "localhost:11434"}}"#).is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(parse(r#"{"log_level": "LOUD"}"#).is_err());
        assert!(parse(r#"{"log_level": "warn"}"#).is_ok());
    }

    #[test]
    fn test_http_section_validated() {
        let err = parse(r#"{"http": {"host": "example.com"}}"#).unwrap_err();
        assert_eq!(err.code(), "ASKDB_CONFIG_INVALID");
        assert!(parse(r#"{"http": {"cors_origins": ["http://localhost:3000"]}}"#).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/srv/askdb", "http": {{"port": 8080}}}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.data_path(), Path::new("/srv/askdb"));
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/askdb.json")).unwrap_err();
        assert_eq!(err.code(), "ASKDB_CONFIG_READ");
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
