//! # bakery-core: Pure Business Logic for the Bakery Console
//!
//! This crate holds the order model and the rules every other layer obeys.
//! It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bakery Console Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Console commands                             │   │
//! │  │    create_order, record_payment, assign_shipper, ...            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bakery-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ lifecycle │  │ validation│  │   │
//! │  │   │   Order   │  │   Money   │  │  status   │  │   rules   │  │   │
//! │  │   │ LineItem  │  │  (đồng)   │  │  graph    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           bakery-store (in-memory collections)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, LineItem, Customer, Shipper, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`lifecycle`] - Order status graph and production gate
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`notice`] - User-facing success/failure notices
//!
//! ## Example Usage
//!
//! ```rust
//! use bakery_core::lifecycle::{advance_status, mark_item_complete, OrderStatus};
//! use bakery_core::{CustomerRef, Fulfillment, LineItem, Money, Order};
//! use chrono::Utc;
//!
//! let mut order = Order::draft(
//!     CustomerRef { id: None, name: "Lan".into(), phone: "0901234567".into(), address: None },
//!     vec![LineItem::european("p-1", "Croissant", 2, Money::from_dong(50_000))],
//!     Fulfillment::StorePickup,
//!     Utc::now(),
//! );
//! order.status = OrderStatus::InProduction;
//!
//! let done = mark_item_complete(&order, 0).unwrap();
//! let ready = advance_status(&done, OrderStatus::Ready).unwrap();
//! assert_eq!(ready.status, OrderStatus::Ready);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod notice;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::OrderStatus;
pub use money::Money;
pub use notice::{Notice, NoticeLevel};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items in a single order.
pub const MAX_ORDER_ITEMS: usize = 50;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before the kitchen sees them.
pub const MAX_ITEM_QUANTITY: i64 = 500;

/// Maximum length of a free-text note.
pub const MAX_NOTE_LENGTH: usize = 1000;
