//! # Sync Channel
//!
//! Owns the real-time connection for one console session. Starts and stops
//! the transport and inbound tasks, and reports what happens through a
//! [`SyncEventEmitter`].
//!
//! ## Channel Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncChannel Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SyncChannel                              │  │
//! │  │                                                                  │  │
//! │  │  • connect(credential?)  resolve credential, spawn tasks         │  │
//! │  │  • disconnect()          stop and join both tasks                │  │
//! │  │  • logout()              disconnect + forget credential + clear  │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │              ┌────────────────┴─────────────────┐                       │
//! │              ▼                                  ▼                       │
//! │  ┌────────────────────────┐  mpsc  ┌────────────────────────────┐      │
//! │  │   Transport task       │ ─────► │   Inbound task             │      │
//! │  │   (WebSocket)          │ events │   (InboundHandler)         │      │
//! │  │                        │        │                            │      │
//! │  │ state machine,         │        │ Store writes, notices      │      │
//! │  │ reconnects             │        │                            │      │
//! │  └────────────────────────┘        └────────────────────────────┘      │
//! │                                                                         │
//! │  EMITTED EVENTS:                                                        │
//! │  ───────────────                                                        │
//! │  emit_state(ChannelState)  - every lifecycle change                     │
//! │  emit_notice(Notice)       - shipper replies                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use bakery_core::Notice;
use bakery_store::Store;

use crate::config::ChannelConfig;
use crate::credential::{Credential, CredentialSource, SessionCredentials};
use crate::error::{SyncError, SyncResult};
use crate::inbound::InboundHandler;
use crate::state::ChannelState;
use crate::transport::{Transport, TransportHandle};

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives channel events for whatever presents them (console log, UI).
pub trait SyncEventEmitter: Send + Sync {
    /// The channel moved to `state`.
    fn emit_state(&self, state: ChannelState);

    /// A message for the user.
    fn emit_notice(&self, notice: Notice);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_state(&self, _state: ChannelState) {}
    fn emit_notice(&self, _notice: Notice) {}
}

// =============================================================================
// Channel Handle
// =============================================================================

/// View of a running channel returned by [`SyncChannel::connect`].
#[derive(Clone)]
pub struct ChannelHandle {
    transport: TransportHandle,
}

impl ChannelHandle {
    pub fn state(&self) -> ChannelState {
        self.transport.state()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.transport.subscribe()
    }

    /// Waits until the state satisfies `predicate`.
    ///
    /// Fails if the transport stops in a state that does not satisfy it.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ChannelState) -> bool,
    ) -> SyncResult<ChannelState> {
        let mut rx = self.transport.subscribe();
        let state = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| SyncError::ChannelError("transport stopped".into()))?;
        Ok(*state)
    }
}

// =============================================================================
// Sync Channel
// =============================================================================

/// The tasks behind one connection.
struct ActiveChannel {
    credential: Credential,
    transport: TransportHandle,
    transport_task: JoinHandle<()>,
    inbound_task: JoinHandle<()>,
}

/// Real-time channel for one console session.
pub struct SyncChannel {
    /// Channel configuration.
    config: ChannelConfig,

    /// Store the inbound handler writes to.
    store: Store,

    /// Where `connect(None)` finds a credential.
    credentials: Arc<dyn CredentialSource>,

    /// Event emitter for state changes and notices.
    emitter: Arc<dyn SyncEventEmitter>,

    /// The running connection, if any.
    active: Mutex<Option<ActiveChannel>>,
}

impl SyncChannel {
    /// Creates a channel with an in-memory credential source and no emitter.
    pub fn new(config: ChannelConfig, store: Store) -> Self {
        SyncChannel {
            config,
            store,
            credentials: Arc::new(SessionCredentials::new(None)),
            emitter: Arc::new(NoOpEmitter),
            active: Mutex::new(None),
        }
    }

    /// Current channel state. `Disconnected` when nothing is running.
    pub async fn state(&self) -> ChannelState {
        match self.active.lock().await.as_ref() {
            Some(active) => active.transport.state(),
            None => ChannelState::Disconnected,
        }
    }

    /// Opens the channel.
    ///
    /// ## Behavior
    /// - Credential: the argument, else the credential source, else
    ///   `NoCredential` (the channel stays disconnected)
    /// - Already running with the same credential: returns the running
    ///   channel, nothing is restarted
    /// - Running with another credential, or stopped after giving up: the old
    ///   tasks are stopped and joined before the new connection starts
    pub async fn connect(&self, credential: Option<Credential>) -> SyncResult<ChannelHandle> {
        let credential = match credential
            .filter(|c| !c.is_empty())
            .or_else(|| self.credentials.current())
        {
            Some(credential) => credential,
            None => {
                warn!("No credential available, channel stays disconnected");
                return Err(SyncError::NoCredential);
            }
        };

        self.config.validate()?;

        let mut active = self.active.lock().await;

        if let Some(existing) = active.as_ref() {
            let state = existing.transport.state();
            if existing.credential == credential && state.is_active() {
                debug!(%state, "Channel already running with this credential");
                return Ok(ChannelHandle {
                    transport: existing.transport.clone(),
                });
            }
        }

        if let Some(old) = active.take() {
            info!("Replacing existing channel");
            Self::teardown(old).await;
        }

        info!(url = %self.config.url, "Opening order channel");

        let (transport, events_rx, transport_task) = Transport::spawn(
            self.config.transport_config(),
            credential.clone(),
            self.emitter.clone(),
        );
        let inbound = InboundHandler::new(self.store.clone(), self.emitter.clone());
        let inbound_task = tokio::spawn(inbound.run(events_rx));

        let handle = ChannelHandle {
            transport: transport.clone(),
        };

        *active = Some(ActiveChannel {
            credential,
            transport,
            transport_task,
            inbound_task,
        });

        Ok(handle)
    }

    /// Closes the channel. A no-op when nothing is running.
    pub async fn disconnect(&self) -> SyncResult<()> {
        let Some(old) = self.active.lock().await.take() else {
            debug!("Channel already disconnected");
            return Ok(());
        };

        info!("Closing order channel");
        Self::teardown(old).await;
        Ok(())
    }

    /// Ends the session: closes the channel, forgets the credential and
    /// empties the Store.
    pub async fn logout(&self) -> SyncResult<()> {
        self.disconnect().await?;
        self.credentials.clear()?;
        self.store.clear();
        Ok(())
    }

    /// Stops the transport and waits for both tasks. The inbound task ends
    /// once the transport drops its event sender.
    async fn teardown(active: ActiveChannel) {
        if let Err(e) = active.transport.shutdown().await {
            warn!(error = %e, "Failed to signal transport shutdown");
        }

        if let Err(e) = active.transport_task.await {
            error!(error = %e, "Transport task failed");
        }
        if let Err(e) = active.inbound_task.await {
            error!(error = %e, "Inbound task failed");
        }

        debug!("Channel tasks joined");
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.transport_task.abort();
            active.inbound_task.abort();
        }
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a SyncChannel with options.
pub struct SyncChannelBuilder {
    config: ChannelConfig,
    store: Store,
    credentials: Option<Arc<dyn CredentialSource>>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncChannelBuilder {
    /// Creates a new builder with the given config and Store.
    pub fn new(config: ChannelConfig, store: Store) -> Self {
        SyncChannelBuilder {
            config,
            store,
            credentials: None,
            emitter: None,
        }
    }

    /// Sets the credential source.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Builds the SyncChannel. Fails on an invalid configuration.
    pub fn build(self) -> SyncResult<SyncChannel> {
        self.config.validate()?;

        let mut channel = SyncChannel::new(self.config, self.store);
        if let Some(credentials) = self.credentials {
            channel.credentials = credentials;
        }
        if let Some(emitter) = self.emitter {
            channel.emitter = emitter;
        }
        Ok(channel)
    }
}
