//! # Channel Configuration
//!
//! Settings for the real-time order channel. The console embeds this as the
//! `[channel]` section of `console.toml`.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BAKERY_WS_URL=wss://api.example.vn/ws                              │
//! │     BAKERY_WS_MAX_RETRIES=10                                           │
//! │                                                                         │
//! │  2. TOML Config File, [channel] section                                │
//! │     ~/.config/bakery-console/console.toml (Linux)                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Section Format
//! ```toml
//! [channel]
//! url = "ws://localhost:3000/ws"
//! connect_timeout_secs = 10
//! retry_interval_ms = 3000
//! max_retries = 5
//! ping_interval_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::state::RetryPolicy;
use crate::transport::TransportConfig;

// =============================================================================
// Channel Configuration
// =============================================================================

/// Real-time channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// WebSocket URL of the order broadcast endpoint.
    #[serde(default = "default_url")]
    pub url: String,

    /// Handshake timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Fixed wait between reconnection attempts (milliseconds).
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,

    /// Reconnection attempts after a loss before giving up.
    /// Zero disables reconnection.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Keepalive ping interval (seconds).
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

fn default_url() -> String {
    "ws://localhost:3000/ws".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_retry_interval() -> u64 {
    3000
}
fn default_max_retries() -> u32 {
    5
}
fn default_ping_interval() -> u64 {
    30
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            url: default_url(),
            connect_timeout_secs: default_connect_timeout(),
            retry_interval_ms: default_retry_interval(),
            max_retries: default_max_retries(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

impl ChannelConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let parsed = url::Url::parse(&self.url)?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SyncError::InvalidUrl(format!(
                "Channel URL must start with ws:// or wss://, got: {}",
                self.url
            )));
        }

        if self.connect_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.ping_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "ping_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `BAKERY_WS_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BAKERY_WS_URL") {
            debug!(url = %url, "Overriding channel URL from environment");
            self.url = url;
        }

        if let Ok(retries) = std::env::var("BAKERY_WS_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid BAKERY_WS_MAX_RETRIES"),
            }
        }

        if let Ok(interval) = std::env::var("BAKERY_WS_RETRY_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) => self.retry_interval_ms = ms,
                Err(_) => warn!(value = %interval, "Ignoring invalid BAKERY_WS_RETRY_INTERVAL_MS"),
            }
        }
    }

    /// The reconnection policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(self.retry_interval_ms),
            max_attempts: self.max_retries,
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            retry: self.retry_policy(),
            ping_interval: Duration::from_secs(self.ping_interval_secs),
        }
    }
}
