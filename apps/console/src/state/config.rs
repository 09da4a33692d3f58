//! # Console Configuration
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BAKERY_*`)
//! 2. Config file (`console.toml` in the platform config directory)
//! 3. Defaults (this file)
//!
//! ## File Format
//! ```toml
//! [api]
//! base_url = "https://api.example.vn/api"
//! timeout_secs = 15
//!
//! [channel]
//! url = "wss://api.example.vn/ws"
//! max_retries = 5
//!
//! [shipper_webhook]
//! url = "https://hooks.example.vn/shipper"
//! timeout_secs = 10
//!
//! [session]
//! credential_file = "/var/lib/bakery/session.json"
//! ```
//!
//! Configuration is read-only after startup, so no lock is needed.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use bakery_sync::{ChannelConfig, SessionCredentials, SyncError};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid [channel] section: {0}")]
    Channel(#[from] SyncError),

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[api]`: the order REST backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_api_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_api_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[shipper_webhook]`: where shipper notifications go. No URL, no posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        WebhookConfig {
            url: None,
            timeout_secs: default_webhook_timeout(),
        }
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[session]`: where the login credential is kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub credential_file: Option<PathBuf>,
}

impl SessionConfig {
    /// The configured file, else the platform data directory.
    pub fn credential_path(&self) -> Option<PathBuf> {
        self.credential_file
            .clone()
            .or_else(SessionCredentials::default_path)
    }
}

// =============================================================================
// Console Configuration
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub shipper_webhook: WebhookConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl ConsoleConfig {
    /// Loads configuration from file, environment and defaults.
    ///
    /// `config_path` overrides the platform location. A missing file is not
    /// an error; an unreadable or invalid one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading console config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration as TOML, creating the directory if needed.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        info!(?path, "Console config saved");
        Ok(path)
    }

    /// `console.toml` in the platform config directory.
    ///
    /// - Linux: `~/.config/bakery-console/console.toml`
    /// - macOS: `~/Library/Application Support/vn.bakery.bakery-console/console.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("vn", "bakery", "bakery-console")
            .map(|dirs| dirs.config_dir().join("console.toml"))
    }

    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        check_http_url("api.base_url", &self.api.base_url)?;
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        self.channel.validate()?;

        if let Some(url) = &self.shipper_webhook.url {
            check_http_url("shipper_webhook.url", url)?;
        }
        if self.shipper_webhook.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "shipper_webhook.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `BAKERY_*` environment variable overrides.
    ///
    /// ## Environment Variables
    /// - `BAKERY_API_URL`, `BAKERY_API_TIMEOUT_SECS`
    /// - `BAKERY_WEBHOOK_URL`
    /// - `BAKERY_CREDENTIAL_FILE`
    /// - `BAKERY_WS_*` (see [`ChannelConfig::apply_env_overrides`])
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BAKERY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("BAKERY_API_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid BAKERY_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(url) = std::env::var("BAKERY_WEBHOOK_URL") {
            self.shipper_webhook.url = Some(url).filter(|u| !u.trim().is_empty());
        }

        if let Ok(path) = std::env::var("BAKERY_CREDENTIAL_FILE") {
            self.session.credential_file = Some(PathBuf::from(path));
        }

        self.channel.apply_env_overrides();
    }
}

fn check_http_url(field: &str, value: &str) -> ConfigResult<()> {
    let parsed = reqwest::Url::parse(value)
        .map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL: {}", field, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::Invalid(format!(
            "{} must start with http:// or https://, got: {}",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout(), Duration::from_secs(15));
        assert!(config.shipper_webhook.url.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.vn/api"

            [channel]
            max_retries = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.vn/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.channel.max_retries, 2);
        assert_eq!(config.channel.url, "ws://localhost:3000/ws");
    }

    #[test]
    fn test_validation() {
        let mut config = ConsoleConfig::default();
        config.api.base_url = "ws://localhost:3000".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ConsoleConfig::default();
        config.channel.url = "http://localhost:3000/ws".into();
        assert!(matches!(config.validate(), Err(ConfigError::Channel(_))));

        let mut config = ConsoleConfig::default();
        config.shipper_webhook.url = Some("not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.toml");

        let mut config = ConsoleConfig::default();
        config.api.timeout_secs = 30;
        config.shipper_webhook.url = Some("https://hooks.example.vn/shipper".into());
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ConsoleConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();

        assert!(matches!(
            ConsoleConfig::load(Some(path)),
            Err(ConfigError::Parse(_))
        ));
    }
}
