//! # Channel State Machine
//!
//! The connection lifecycle as a pure function: `state.on(event, policy)`
//! returns the next state. The transport feeds it events and acts on the
//! result, so the rules live here and nowhere else.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Channel Lifecycle                                  │
//! │                                                                         │
//! │                 ConnectRequested                                        │
//! │  Disconnected ──────────────────► Connecting                            │
//! │       ▲                              │    │                             │
//! │       │                   Established│    │AttemptFailed                │
//! │       │                              ▼    ▼                             │
//! │       │                        Connected  Reconnecting{1}               │
//! │       │                              │        │    ▲                    │
//! │       │               TransientLoss  │        │    │ AttemptFailed      │
//! │       │                              ▼        │    │ (attempt < max)    │
//! │       │                     Reconnecting{1} ──┴────┘                    │
//! │       │                              │                                  │
//! │       │                   Established└──────► Connected                 │
//! │       │                                                                 │
//! │       └── Closed / Rejected (from anywhere)                             │
//! │       └── AttemptFailed at attempt == max                               │
//! │                                                                         │
//! │  Disconnected is left only by an explicit connect.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Retry Policy
// =============================================================================

/// Fixed-interval, capped reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before each reconnection attempt.
    pub interval: Duration,
    /// Reconnection attempts after a loss. Zero disables reconnection.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            interval: Duration::from_secs(3),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// The state after attempt `attempt` failed.
    fn after_failure(&self, attempt: u32) -> ChannelState {
        if attempt < self.max_attempts {
            ChannelState::Reconnecting {
                attempt: attempt + 1,
            }
        } else {
            ChannelState::Disconnected
        }
    }
}

// =============================================================================
// States and Events
// =============================================================================

/// Where the channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Waiting to make reconnection attempt number `attempt` (1-based).
    Reconnecting { attempt: u32 },
}

/// Something that happened to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// `connect` was called.
    ConnectRequested,
    /// The handshake completed.
    Established,
    /// An open connection dropped without anyone asking.
    TransientLoss,
    /// A connection attempt failed with a retryable error.
    AttemptFailed,
    /// `disconnect`, logout or credential change.
    Closed,
    /// The server refused the credential.
    Rejected,
}

impl ChannelState {
    /// Computes the next state. Events that make no sense in the current
    /// state leave it unchanged.
    pub fn on(self, event: ChannelEvent, policy: &RetryPolicy) -> ChannelState {
        use ChannelEvent as E;
        use ChannelState as S;

        match (self, event) {
            (_, E::Closed) | (_, E::Rejected) => S::Disconnected,

            (S::Disconnected, E::ConnectRequested) => S::Connecting,

            (S::Connecting, E::Established) | (S::Reconnecting { .. }, E::Established) => {
                S::Connected
            }

            // An initial failure counts as attempt zero.
            (S::Connecting, E::AttemptFailed) => policy.after_failure(0),
            (S::Connected, E::TransientLoss) => policy.after_failure(0),
            (S::Reconnecting { attempt }, E::AttemptFailed) => policy.after_failure(attempt),

            (state, _) => state,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }

    /// Anything but `Disconnected`: a transport task owns the connection.
    pub fn is_active(&self) -> bool {
        !matches!(self, ChannelState::Disconnected)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Disconnected => write!(f, "Disconnected"),
            ChannelState::Connecting => write!(f, "Connecting"),
            ChannelState::Connected => write!(f, "Connected"),
            ChannelState::Reconnecting { attempt } => write!(f, "Reconnecting (attempt {})", attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChannelEvent as E;
    use ChannelState as S;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(10),
            max_attempts,
        }
    }

    #[test]
    fn test_happy_path() {
        let p = policy(3);
        let state = S::Disconnected.on(E::ConnectRequested, &p);
        assert_eq!(state, S::Connecting);
        let state = state.on(E::Established, &p);
        assert!(state.is_connected());
        assert_eq!(state.on(E::Closed, &p), S::Disconnected);
    }

    #[test]
    fn test_transient_loss_reconnects() {
        let p = policy(3);
        let state = S::Connected.on(E::TransientLoss, &p);
        assert_eq!(state, S::Reconnecting { attempt: 1 });
        let state = state.on(E::AttemptFailed, &p);
        assert_eq!(state, S::Reconnecting { attempt: 2 });
        assert_eq!(state.on(E::Established, &p), S::Connected);
    }

    #[test]
    fn test_retries_are_capped() {
        let p = policy(2);
        let mut state = S::Connected.on(E::TransientLoss, &p);
        state = state.on(E::AttemptFailed, &p);
        assert_eq!(state, S::Reconnecting { attempt: 2 });
        state = state.on(E::AttemptFailed, &p);
        assert_eq!(state, S::Disconnected);

        // Stays down until an explicit connect.
        assert_eq!(state.on(E::Established, &p), S::Disconnected);
        assert_eq!(state.on(E::ConnectRequested, &p), S::Connecting);
    }

    #[test]
    fn test_initial_failure_enters_reconnecting() {
        assert_eq!(
            S::Connecting.on(E::AttemptFailed, &policy(1)),
            S::Reconnecting { attempt: 1 }
        );
        assert_eq!(S::Connecting.on(E::AttemptFailed, &policy(0)), S::Disconnected);
    }

    #[test]
    fn test_rejection_is_terminal_from_anywhere() {
        let p = policy(5);
        for state in [
            S::Connecting,
            S::Connected,
            S::Reconnecting { attempt: 3 },
        ] {
            assert_eq!(state.on(E::Rejected, &p), S::Disconnected);
        }
    }

    #[test]
    fn test_irrelevant_events_are_ignored() {
        let p = policy(5);
        assert_eq!(S::Connected.on(E::ConnectRequested, &p), S::Connected);
        assert_eq!(S::Disconnected.on(E::TransientLoss, &p), S::Disconnected);
        assert_eq!(S::Connecting.on(E::TransientLoss, &p), S::Connecting);
    }

    #[test]
    fn test_display_and_wire() {
        assert_eq!(
            S::Reconnecting { attempt: 2 }.to_string(),
            "Reconnecting (attempt 2)"
        );
        let json = serde_json::to_string(&S::Reconnecting { attempt: 2 }).unwrap();
        assert_eq!(json, r#"{"state":"reconnecting","attempt":2}"#);
    }
}
