//! # WebSocket Transport
//!
//! WebSocket client with bearer authentication and fixed-interval, capped
//! reconnection.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transport Task                                       │
//! │                                                                         │
//! │  spawn() ──► Connecting ──handshake──► Connected ──frames──► inbound    │
//! │                  │  (Authorization:        │                            │
//! │                  │   Bearer <token>)       │ drop / close frame         │
//! │                  │                         ▼                            │
//! │                  └──failure──────► Reconnecting{n}                      │
//! │                                        │  sleep(interval)               │
//! │                                        │  retry while n <= max          │
//! │                                        ▼                                │
//! │                                   Disconnected ◄── 401/403, shutdown    │
//! │                                                                         │
//! │  RETRY STRATEGY (Constant)                                              │
//! │  ─────────────────────────                                              │
//! │  Attempt 1: interval                                                    │
//! │  Attempt 2: interval                                                    │
//! │  ...                                                                    │
//! │  Attempt max: interval, then give up until the next connect()           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transport decides nothing on its own: every change goes through
//! [`ChannelState::on`].

use backoff::backoff::{Backoff, Constant};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::channel::SyncEventEmitter;
use crate::credential::Credential;
use crate::error::{SyncError, SyncResult};
use crate::protocol::ServerEvent;
use crate::state::{ChannelEvent, ChannelState, RetryPolicy};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Transport Configuration
// =============================================================================

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket URL to connect to.
    pub url: String,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Reconnection interval and cap.
    pub retry: RetryPolicy,

    /// Ping interval for keepalive.
    pub ping_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            ping_interval: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Transport Handle
// =============================================================================

/// Handle for observing and stopping the transport task.
#[derive(Clone)]
pub struct TransportHandle {
    /// Current connection state.
    state_rx: watch::Receiver<ChannelState>,

    /// Shutdown signal.
    shutdown_tx: mpsc::Sender<()>,
}

impl TransportHandle {
    /// Returns the current connection state.
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Returns true if currently connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Triggers graceful shutdown. Succeeds if the task already stopped.
    pub async fn shutdown(&self) -> SyncResult<()> {
        match self.shutdown_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Transport already stopped");
                Ok(())
            }
        }
    }
}

// =============================================================================
// WebSocket Transport
// =============================================================================

/// Why the connection loop returned.
enum LoopExit {
    /// Shutdown requested or the inbound side went away.
    Stopped,
    /// The connection dropped on its own.
    Lost,
}

/// WebSocket transport with capped reconnection.
///
/// ## Usage
/// ```rust,ignore
/// let (handle, events_rx, task) = Transport::spawn(config, credential, emitter);
///
/// while let Some(event) = events_rx.recv().await {
///     println!("Received: {}", event.name());
/// }
/// ```
pub struct Transport {
    config: TransportConfig,
    credential: Credential,
    state_tx: watch::Sender<ChannelState>,
    incoming_tx: mpsc::Sender<ServerEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl Transport {
    /// Creates a new transport and spawns its background task.
    ///
    /// Returns a handle, the receiver for decoded events, and the task's join
    /// handle. The event receiver closes when the task stops.
    pub fn spawn(
        config: TransportConfig,
        credential: Credential,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> (
        TransportHandle,
        mpsc::Receiver<ServerEvent>,
        tokio::task::JoinHandle<()>,
    ) {
        let (incoming_tx, incoming_rx) = mpsc::channel::<ServerEvent>(100);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);

        let transport = Transport {
            config,
            credential,
            state_tx,
            incoming_tx,
            shutdown_rx,
            emitter,
        };

        transport.transition(ChannelEvent::ConnectRequested);
        let task = tokio::spawn(transport.run());

        let handle = TransportHandle {
            state_rx,
            shutdown_tx,
        };

        (handle, incoming_rx, task)
    }

    /// Main transport loop.
    async fn run(mut self) {
        info!(url = %self.config.url, "Transport starting");

        let mut backoff = Constant::new(self.config.retry.interval);

        loop {
            let attempt = tokio::select! {
                result = connect_with_timeout(&self.config, &self.credential) => result,
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown during connect");
                    self.transition(ChannelEvent::Closed);
                    break;
                }
            };

            match attempt {
                Ok(ws_stream) => {
                    info!("WebSocket connected");
                    self.transition(ChannelEvent::Established);
                    backoff.reset();

                    match self.connection_loop(ws_stream).await {
                        Ok(LoopExit::Stopped) => {
                            self.transition(ChannelEvent::Closed);
                            break;
                        }
                        Ok(LoopExit::Lost) => {
                            warn!("Connection closed by server");
                            self.transition(ChannelEvent::TransientLoss);
                        }
                        Err(e) => {
                            warn!(error = %e, "Connection loop ended");
                            self.transition(ChannelEvent::TransientLoss);
                        }
                    }
                }
                Err(SyncError::Rejected(status)) => {
                    error!(status, "Credential rejected by server, not retrying");
                    self.transition(ChannelEvent::Rejected);
                    break;
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, "Connection failed permanently");
                    self.transition(ChannelEvent::Closed);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to connect");
                    self.transition(ChannelEvent::AttemptFailed);
                }
            }

            let ChannelState::Reconnecting { attempt } = self.current() else {
                error!(
                    max_retries = self.config.retry.max_attempts,
                    "Max reconnection attempts reached"
                );
                break;
            };

            let wait = backoff
                .next_backoff()
                .unwrap_or(self.config.retry.interval);
            debug!(?wait, attempt, "Waiting before reconnect");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown during backoff");
                    self.transition(ChannelEvent::Closed);
                    break;
                }
            }
        }

        info!(state = %self.current(), "Transport stopped");
    }

    fn current(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Feeds `event` to the state machine and publishes the result.
    fn transition(&self, event: ChannelEvent) {
        let policy = self.config.retry;
        let mut next = ChannelState::Disconnected;
        let changed = self.state_tx.send_if_modified(|state| {
            next = state.on(event, &policy);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });

        if changed {
            info!(?event, state = %next, "Channel state changed");
            self.emitter.emit_state(next);
        }
    }

    /// Main connection loop: forwards events, answers pings, sends keepalives.
    async fn connection_loop(&mut self, ws_stream: WsStream) -> SyncResult<LoopExit> {
        let (mut write, mut read) = ws_stream.split();

        let period = self.config.ping_interval.max(Duration::from_millis(100));
        let mut ping_interval = tokio::time::interval(period);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = read.next() => {
                    let Some(result) = frame else {
                        return Ok(LoopExit::Lost);
                    };
                    match result {
                        Ok(WsMessage::Text(text)) => {
                            let text: &str = &text;
                            match ServerEvent::decode(text) {
                                Ok(Some(event)) => {
                                    debug!(event = event.name(), "Received event");
                                    if self.incoming_tx.send(event).await.is_err() {
                                        warn!("Inbound receiver dropped");
                                        return Ok(LoopExit::Stopped);
                                    }
                                }
                                Ok(None) => {
                                    debug!(frame = %text, "Skipping unknown event");
                                }
                                Err(e) => {
                                    warn!(error = %e, "Failed to parse event");
                                }
                            }
                        }
                        Ok(WsMessage::Ping(data)) => {
                            write.send(WsMessage::Pong(data)).await?;
                        }
                        Ok(WsMessage::Pong(_)) => {
                            debug!("Received pong");
                        }
                        Ok(WsMessage::Close(frame)) => {
                            info!(?frame, "Received close frame");
                            return Ok(LoopExit::Lost);
                        }
                        Ok(WsMessage::Binary(_)) => {
                            warn!("Received unexpected binary message");
                        }
                        Ok(WsMessage::Frame(_)) => {
                            // Raw frame, ignore
                        }
                        Err(e) => {
                            return Err(SyncError::from(e));
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    write.send(WsMessage::Ping(Default::default())).await?;
                    debug!("Sent ping");
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received, closing connection");
                    let _ = write.send(WsMessage::Close(None)).await;
                    return Ok(LoopExit::Stopped);
                }
            }
        }
    }
}

/// Opens the WebSocket with the bearer credential, bounded by the timeout.
async fn connect_with_timeout(
    config: &TransportConfig,
    credential: &Credential,
) -> SyncResult<WsStream> {
    let mut request = config.url.as_str().into_client_request()?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| SyncError::InvalidConfig("credential is not a valid header value".into()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);

    match timeout(config.connect_timeout, connect_async(request)).await {
        Ok(Ok((ws_stream, response))) => {
            debug!(status = ?response.status(), "WebSocket handshake complete");
            Ok(ws_stream)
        }
        Ok(Err(e)) => Err(SyncError::from(e)),
        Err(_) => Err(SyncError::Timeout(config.connect_timeout.as_secs())),
    }
}
