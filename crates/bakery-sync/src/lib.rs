//! # bakery-sync: Real-time Synchronization Channel
//!
//! Keeps every console's [`Store`](bakery_store::Store) in step with the
//! backend. When any console creates, edits or deletes an order, the backend
//! broadcasts the result and this crate writes it into the local Store.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Channel Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      SyncChannel (per session)                   │  │
//! │  │                                                                  │  │
//! │  │  connect(credential?) / disconnect() / logout()                  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  Credentials   │  │   Transport    │  │  InboundHandler        │    │
//! │  │                │  │                │  │                        │    │
//! │  │ in-memory +    │  │ WebSocket,     │  │ order:* → Store        │    │
//! │  │ persisted file │  │ bearer auth,   │  │ shipper:response →     │    │
//! │  │                │  │ capped retries │  │   Store + notice       │    │
//! │  └────────────────┘  └───────┬────────┘  └────────────────────────┘    │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                     ChannelState::on(event)                             │
//! │                     (pure state machine)                                │
//! │                                                                         │
//! │  EMITTED EVENTS (SyncEventEmitter):                                     │
//! │  • emit_state  - Disconnected / Connecting / Connected / Reconnecting  │
//! │  • emit_notice - shipper replies                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! Connection errors never reach the Store. They are logged and show up only
//! as state changes; the Store keeps its last known contents.
//!
//! ## Module Organization
//!
//! - [`channel`] - `SyncChannel`, `ChannelHandle`, `SyncEventEmitter`
//! - [`config`] - Channel configuration (`[channel]` section)
//! - [`credential`] - Credential source with persisted fallback
//! - [`error`] - Sync error types
//! - [`inbound`] - Applies events to the Store
//! - [`protocol`] - Wire events
//! - [`state`] - Channel state machine and retry policy
//! - [`transport`] - WebSocket client with reconnection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bakery_store::Store;
//! use bakery_sync::{ChannelConfig, Credential, SyncChannelBuilder};
//!
//! let store = Store::new();
//! let channel = SyncChannelBuilder::new(ChannelConfig::default(), store.clone())
//!     .with_emitter(emitter)
//!     .build()?;
//!
//! let handle = channel.connect(Some(Credential::new(token))).await?;
//! println!("State: {}", handle.state());
//!
//! channel.logout().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod channel;
pub mod config;
pub mod credential;
pub mod error;
pub mod inbound;
pub mod protocol;
pub mod state;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use channel::{ChannelHandle, NoOpEmitter, SyncChannel, SyncChannelBuilder, SyncEventEmitter};
pub use config::ChannelConfig;
pub use credential::{Credential, CredentialSource, SessionCredentials};
pub use error::{SyncError, SyncResult};
pub use inbound::{Applied, InboundHandler};
pub use protocol::{ServerEvent, ShipperOutcome};
pub use state::{ChannelEvent, ChannelState, RetryPolicy};
pub use transport::{TransportConfig, TransportHandle};
