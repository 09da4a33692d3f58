//! # State Module
//!
//! Process-wide console state, built once at startup and passed explicitly.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  ConsoleConfig   │  │  Store           │  │  ConsoleEmitter      │  │
//! │  │                  │  │  (bakery-store)  │  │                      │  │
//! │  │  [api]           │  │                  │  │  channel state       │  │
//! │  │  [channel]       │  │  orders, ...     │  │  recent notices      │  │
//! │  │  [shipper_...]   │  │                  │  │                      │  │
//! │  │  [session]       │  │                  │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • ConsoleConfig: read-only after startup                              │
//! │  • Store: cheap clone, internal watch channels                         │
//! │  • ConsoleEmitter: RwLock around state and notices                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod notify;

pub use config::{
    ApiConfig, ConfigError, ConfigResult, ConsoleConfig, SessionConfig, WebhookConfig,
};
pub use notify::ConsoleEmitter;
