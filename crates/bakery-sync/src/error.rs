//! # Sync Error Types
//!
//! Error types for the synchronization channel.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  SerializationFailed    │ │
//! │  │  InvalidUrl     │  │  Disconnected   │  │                         │ │
//! │  │                 │  │  Timeout        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │   Credentials   │  │    Lifecycle    │                              │
//! │  │                 │  │                 │                              │
//! │  │  NoCredential   │  │  ChannelError   │                              │
//! │  │  Rejected       │  │                 │                              │
//! │  │  CredentialStore│  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these reach the user directly. The channel logs them and reports
//! the resulting [`ChannelState`](crate::state::ChannelState) instead.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every channel failure.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid channel configuration.
    #[error("Invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// Invalid channel URL.
    #[error("Invalid channel URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// No credential could be found for the connection.
    ///
    /// ## When This Occurs
    /// - `connect(None)` before anyone logged in
    /// - The persisted fallback file is missing or empty
    #[error("No credential available; log in before connecting")]
    NoCredential,

    /// The server refused the credential during the handshake (401/403).
    /// Retrying with the same credential cannot succeed.
    #[error("Server rejected the credential (HTTP {0})")]
    Rejected(u16),

    /// Reading or writing the persisted credential failed.
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Failed to establish the WebSocket connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket disconnected unexpectedly.
    #[error("Disconnected from the order channel")]
    Disconnected,

    /// Connection timeout.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// WebSocket protocol error.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// JSON (de)serialization failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// An internal task channel closed.
    #[error("Internal channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed => SyncError::Disconnected,
            WsError::AlreadyClosed => SyncError::Disconnected,
            WsError::Http(response) => {
                let status = response.status().as_u16();
                if status == 401 || status == 403 {
                    SyncError::Rejected(status)
                } else {
                    SyncError::ConnectionFailed(format!("handshake returned HTTP {}", status))
                }
            }
            WsError::Protocol(p) => SyncError::WebSocketError(p.to_string()),
            WsError::Io(io) => SyncError::ConnectionFailed(io.to_string()),
            WsError::Tls(tls) => SyncError::TlsError(tls.to_string()),
            other => SyncError::WebSocketError(other.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the transport should try again after this error.
    ///
    /// ## Retryable Errors
    /// - Connection failures (network issues)
    /// - Timeouts
    /// - Temporary disconnections
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - A rejected or missing credential
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_)
                | SyncError::Disconnected
                | SyncError::Timeout(_)
                | SyncError::WebSocketError(_)
                | SyncError::TlsError(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::InvalidConfig(_) | SyncError::InvalidUrl(_))
    }

    /// Returns true if the credential is missing or was refused.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SyncError::NoCredential | SyncError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("network error".into()).is_retryable());
        assert!(SyncError::Disconnected.is_retryable());
        assert!(SyncError::Timeout(30).is_retryable());

        assert!(!SyncError::InvalidConfig("bad config".into()).is_retryable());
        assert!(!SyncError::NoCredential.is_retryable());
        assert!(!SyncError::Rejected(401).is_retryable());
    }

    #[test]
    fn test_auth_errors() {
        assert!(SyncError::Rejected(403).is_auth_error());
        assert!(SyncError::NoCredential.is_auth_error());
        assert!(!SyncError::Disconnected.is_auth_error());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidConfig("retry interval is zero".into()).is_config_error());
        assert!(SyncError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(!SyncError::CredentialStore("disk full".into()).is_config_error());
        assert!(!SyncError::Timeout(10).is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Rejected(401);
        assert!(err.to_string().contains("401"));
        assert!(SyncError::InvalidUrl("http://x".into())
            .to_string()
            .contains("http://x"));
    }
}
