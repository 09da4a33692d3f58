//! # bakery-store: Client State Store for the Bakery Console
//!
//! This crate holds the in-memory collections (orders, customers, products,
//! shippers, users) for one authenticated session and tells subscribers when
//! they change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bakery Console Data Flow                         │
//! │                                                                         │
//! │  Command success (REST)          Channel event (WebSocket)              │
//! │       │                                 │                               │
//! │       └──────────────┬──────────────────┘                               │
//! │                      ▼                                                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bakery-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Store      │    │  Collection   │    │   watch      │  │   │
//! │  │   │  (store.rs)   │───►│ set_all       │───►│  Receiver    │  │   │
//! │  │   │               │    │ upsert_one    │    │  per view    │  │   │
//! │  │   │ orders, ...   │    │ remove_one    │    │              │  │   │
//! │  │   │               │    │ patch_one     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both write paths use the same operations with the server's entity, so
//! whichever arrives second is either a no-op or the newer value. There is no
//! cross-path ordering: the last write applied wins.
//!
//! ## Module Organization
//!
//! - [`store`] - The shared `Store` handle
//! - [`collection`] - Generic `Collection<T>` and order queries
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bakery_store::Store;
//!
//! let store = Store::new();
//! let mut orders_rx = store.orders().subscribe();
//!
//! store.orders().upsert_one(order);
//! orders_rx.changed().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collection;
pub mod error;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use collection::{Collection, Entity, UpsertOutcome};
pub use error::{StoreError, StoreResult};
pub use store::Store;
