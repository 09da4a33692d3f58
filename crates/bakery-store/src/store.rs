//! # Store
//!
//! The session's single source of truth: one [`Collection`] per entity kind.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Who Holds the Store                                │
//! │                                                                         │
//! │  console startup                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Store::new() ← created exactly once per session                        │
//! │       │                                                                 │
//! │       ├──► Command layer     (clone)  writes server-returned entities   │
//! │       ├──► Sync channel      (clone)  writes broadcast entities         │
//! │       └──► Views / loggers   (clone)  subscribe and read snapshots      │
//! │                                                                         │
//! │  Clones share the same collections. There is no global instance:        │
//! │  every collaborator gets the Store it should use, tests get their own.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::info;

use bakery_core::{Customer, Order, Product, Shipper, StaffUser};

use crate::collection::Collection;

#[derive(Debug, Default)]
struct StoreInner {
    orders: Collection<Order>,
    customers: Collection<Customer>,
    products: Collection<Product>,
    shippers: Collection<Shipper>,
    users: Collection<StaffUser>,
}

/// Shared handle to the session's collections. Cloning is cheap.
///
/// ## Example
/// ```rust
/// use bakery_store::Store;
///
/// let store = Store::new();
/// let other = store.clone();
/// assert!(other.orders().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Creates a store with empty collections.
    pub fn new() -> Self {
        Store::default()
    }

    pub fn orders(&self) -> &Collection<Order> {
        &self.inner.orders
    }

    pub fn customers(&self) -> &Collection<Customer> {
        &self.inner.customers
    }

    pub fn products(&self) -> &Collection<Product> {
        &self.inner.products
    }

    pub fn shippers(&self) -> &Collection<Shipper> {
        &self.inner.shippers
    }

    pub fn users(&self) -> &Collection<StaffUser> {
        &self.inner.users
    }

    /// Empties every collection. Called when the session ends.
    pub fn clear(&self) {
        self.orders().clear();
        self.customers().clear();
        self.products().clear();
        self.shippers().clear();
        self.users().clear();
        info!("Store cleared");
    }

    /// Resolves a shipper reference held by an order.
    pub fn shipper_for(&self, order: &Order) -> Option<Shipper> {
        order
            .shipper_id
            .as_deref()
            .and_then(|id| self.shippers().get(id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
