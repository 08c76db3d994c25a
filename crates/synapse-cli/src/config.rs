//! CLI configuration.
//!
//! Resolved in three layers, later layers winning:
//!
//! 1. A YAML file passed with `--config`.
//! 2. Environment variables:
//!    - `SYNAPSE_OPENAPI_SPEC`
//!    - `SYNAPSE_ASYNCAPI_SPEC`
//!    - `SYNAPSE_BASE_URL`
//!    - `SYNAPSE_VALIDATE_FORMATS` (`true`/`false`/`1`/`0`)
//!    - `SYNAPSE_HTTP_TIMEOUT_SECS` (default: 30)
//! 3. Subcommand flags, applied by each subcommand.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use synapse_schema::EngineOptions;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Root OpenAPI document.
    pub openapi_spec: Option<PathBuf>,
    /// AsyncAPI document.
    pub asyncapi_spec: Option<PathBuf>,
    /// Base URL of the service under test.
    pub base_url: Option<String>,
    /// Assert `format` keywords.
    pub validate_formats: bool,
    /// Per-request timeout for `probe`.
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            openapi_spec: None,
            asyncapi_spec: None,
            base_url: None,
            validate_formats: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl CliConfig {
    /// Read the optional file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env(|var| std::env::var(var).ok())
    }

    /// Parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.check()?;
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("SYNAPSE_OPENAPI_SPEC") {
            self.openapi_spec = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SYNAPSE_ASYNCAPI_SPEC") {
            self.asyncapi_spec = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("SYNAPSE_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(raw) = lookup("SYNAPSE_VALIDATE_FORMATS") {
            self.validate_formats = parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                var: "SYNAPSE_VALIDATE_FORMATS",
                value: raw.clone(),
                reason: "expected true, false, 1 or 0".to_string(),
            })?;
        }
        if let Some(raw) = lookup("SYNAPSE_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: "SYNAPSE_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            Url::parse(url).map_err(|e| ConfigError::InvalidUrl(url.clone(), e.to_string()))?;
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::default().with_format_validation(self.validate_formats)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid base URL {0}: {1}")]
    InvalidUrl(String, String),
    #[error("http_timeout_secs must be greater than zero")]
    ZeroTimeout,
}
