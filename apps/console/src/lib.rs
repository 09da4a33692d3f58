//! # Bakery Console Library
//!
//! Headless console for the bakery order board: loads configuration, keeps
//! the Store current over the sync channel and runs order commands against
//! the REST API.
//!
//! ## Module Organization
//! ```text
//! bakery_console_lib/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── api/
//! │   ├── mod.rs      ◄─── OrderApi trait, request/response bodies
//! │   ├── envelope.rs ◄─── Response envelope decoding
//! │   └── http.rs     ◄─── reqwest implementation
//! ├── commands/
//! │   ├── mod.rs      ◄─── CommandResult, CommandContext
//! │   ├── order.rs    ◄─── Order CRUD, status, production
//! │   ├── payment.rs  ◄─── Payments
//! │   └── shipper.rs  ◄─── Shipper assignment
//! ├── state/
//! │   ├── config.rs   ◄─── console.toml + BAKERY_* env
//! │   └── notify.rs   ◄─── ConsoleEmitter
//! ├── webhook.rs      ◄─── Shipper notification post
//! └── error.rs        ◄─── ApiError returned by commands
//! ```
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   commands ──► OrderApi (REST) ──► server                               │
//! │      │                               │                                  │
//! │      ▼                               ▼ broadcast                        │
//! │   Store  ◄──────────────────── SyncChannel (WebSocket)                  │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │   subscribers (views, logs)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod commands;
pub mod error;
pub mod state;
pub mod webhook;

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bakery_store::Store;
use bakery_sync::{SessionCredentials, SyncChannel, SyncChannelBuilder, SyncError};

use api::HttpOrderApi;
use commands::CommandContext;
use error::ApiError;
use state::{ConfigError, ConsoleConfig, ConsoleEmitter};
use webhook::HttpShipperDispatch;

/// Why the console could not start.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client setup failed: {0}")]
    Client(#[from] ApiError),

    #[error("Channel setup failed: {0}")]
    Channel(#[from] SyncError),

    #[error("Signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

/// A started console: the command context plus the channel feeding its Store.
pub struct Console {
    pub ctx: CommandContext,
    pub channel: SyncChannel,
    pub emitter: Arc<ConsoleEmitter>,
}

impl Console {
    /// Wires everything from `config`. Nothing touches the network yet.
    pub fn build(config: &ConsoleConfig) -> Result<Self, StartupError> {
        let store = Store::new();
        let credentials = Arc::new(SessionCredentials::new(config.session.credential_path()));
        let emitter = Arc::new(ConsoleEmitter::new());

        let api = HttpOrderApi::new(&config.api, credentials.clone())?;
        let mut ctx = CommandContext::new(Arc::new(api), store.clone(), emitter.clone());
        match HttpShipperDispatch::from_config(&config.shipper_webhook)? {
            Some(dispatch) => ctx = ctx.with_dispatcher(Arc::new(dispatch)),
            None => info!("No shipper webhook configured, assignments are not announced"),
        }

        let channel = SyncChannelBuilder::new(config.channel.clone(), store)
            .with_credentials(credentials)
            .with_emitter(emitter.clone())
            .build()?;

        Ok(Console {
            ctx,
            channel,
            emitter,
        })
    }

    /// Opens the channel with the saved credential and loads the order list.
    ///
    /// A missing credential or an unreachable API leaves the console running
    /// with whatever the channel delivers later.
    pub async fn start(&self) {
        match self.channel.connect(None).await {
            Ok(handle) => info!(state = %handle.state(), "Order channel started"),
            Err(SyncError::NoCredential) => {
                warn!("Not signed in; live order updates are off until a credential is saved")
            }
            Err(e) => warn!(error = %e, "Order channel did not start"),
        }

        let result = commands::refresh_orders(&self.ctx).await;
        if let Some(error) = result.error {
            warn!(code = ?error.code, error = %error.message, "Initial order load failed");
        }
    }

    /// Logs the order count whenever the Store's order list changes.
    pub fn watch_orders(&self) -> JoinHandle<()> {
        let mut orders = self.ctx.store.orders().subscribe();
        tokio::spawn(async move {
            while orders.changed().await.is_ok() {
                let count = orders.borrow_and_update().len();
                debug!(count, "Order list changed");
            }
        })
    }

    /// Closes the channel.
    pub async fn shutdown(&self) -> Result<(), StartupError> {
        self.channel.disconnect().await?;
        info!("Console stopped");
        Ok(())
    }
}

/// Runs the console until Ctrl-C.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize logging (RUST_LOG, default info + bakery=debug)          │
/// │  2. Load console.toml, apply BAKERY_* overrides, validate               │
/// │  3. Build Store, credentials, API client, webhook, channel              │
/// │  4. Connect the channel and load orders                                 │
/// │  5. Wait for Ctrl-C, then disconnect                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config_path: Option<PathBuf>) -> Result<(), StartupError> {
    init_tracing();

    info!("Starting bakery console");

    let config = ConsoleConfig::load(config_path)?;
    info!(api = %config.api.base_url, channel = %config.channel.url, "Configuration loaded");

    let console = Console::build(&config)?;
    console.start().await;
    let watcher = console.watch_orders();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    watcher.abort();
    console.shutdown().await
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bakery_sync=trace` - Trace the channel only
/// - Default: INFO, DEBUG for every `bakery*` target
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bakery=debug"));

    // Ignored when a subscriber is already installed
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
