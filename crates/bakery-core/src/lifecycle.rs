//! # Order Lifecycle
//!
//! The single place that knows the order status graph. Labels, allowed next
//! statuses and the production gate are all answered here, so no caller ever
//! re-encodes the graph by branching on status strings.
//!
//! ## Status Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  draft ──► created ──► in_production ──► ready ──► ready_to_deliver     │
//! │                                            ▲              │             │
//! │                                            │              ▼             │
//! │                         production gate ───┘      out_for_delivery      │
//! │                         (every line item                  │             │
//! │                          completed)              ┌────────┴────────┐    │
//! │                                                  ▼                 ▼    │
//! │                                             completed     delivery_failed│
//! │                                                                         │
//! │  Only the immediate successor is reachable, plus the single side edge   │
//! │  out_for_delivery → delivery_failed. Both end states are terminal.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ready vs. Ready To Deliver
//! Both values exist on the wire and both mean "production finished, awaiting
//! dispatch". They share the label `Ready` and both are gated on production
//! completion. The graph keeps them as consecutive steps so the dispatch desk
//! can acknowledge a finished order before handing it to a shipper.
//!
//! ## Why Re-derive Production Completion?
//! The pastry station and the cream cake station mark their own items
//! independently. The order is ready only when both are done, so the gate is
//! computed from the items every time instead of being stored as a flag.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, ProductionCategory, ProductionStatus};

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being composed at the front desk, not yet accepted by the server.
    #[default]
    Draft,
    /// Accepted and waiting for the kitchen.
    Created,
    /// At least one station is working on it.
    InProduction,
    /// Every line item is completed.
    Ready,
    /// Acknowledged by dispatch, waiting for a shipper or pickup.
    ReadyToDeliver,
    /// With a shipper.
    OutForDelivery,
    /// Delivered or picked up.
    Completed,
    /// The shipper could not deliver. Terminal.
    DeliveryFailed,
}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Draft,
        OrderStatus::Created,
        OrderStatus::InProduction,
        OrderStatus::Ready,
        OrderStatus::ReadyToDeliver,
        OrderStatus::OutForDelivery,
        OrderStatus::Completed,
        OrderStatus::DeliveryFailed,
    ];

    /// Wire name of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Created => "created",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Ready => "ready",
            OrderStatus::ReadyToDeliver => "ready_to_deliver",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::DeliveryFailed => "delivery_failed",
        }
    }

    /// Human-readable label. `ready_to_deliver` is displayed as `Ready`.
    pub const fn label(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "Draft",
            OrderStatus::Created => "Created",
            OrderStatus::InProduction => "In production",
            OrderStatus::Ready | OrderStatus::ReadyToDeliver => "Ready",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Completed => "Completed",
            OrderStatus::DeliveryFailed => "Delivery failed",
        }
    }

    /// The next status on the main path, if any.
    pub const fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Draft => Some(OrderStatus::Created),
            OrderStatus::Created => Some(OrderStatus::InProduction),
            OrderStatus::InProduction => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::ReadyToDeliver),
            OrderStatus::ReadyToDeliver => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::DeliveryFailed => None,
        }
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::DeliveryFailed)
    }

    /// Whether this status is the "production finished" milestone.
    pub const fn is_production_done(&self) -> bool {
        matches!(self, OrderStatus::Ready | OrderStatus::ReadyToDeliver)
    }

    /// Entering this status requires every line item to be completed.
    pub const fn requires_production_complete(&self) -> bool {
        self.is_production_done()
    }

    /// Line items may still be added or removed in this status.
    pub const fn allows_item_edits(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Created)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transition Policy
// =============================================================================

/// Whether `target` may directly follow `current`.
///
/// True for the immediate successor, and for the single side edge
/// `out_for_delivery → delivery_failed`. Everything else is false,
/// including staying in the same status.
pub fn can_transition(current: OrderStatus, target: OrderStatus) -> bool {
    if current.successor() == Some(target) {
        return true;
    }
    current == OrderStatus::OutForDelivery && target == OrderStatus::DeliveryFailed
}

/// [`can_transition`] as a `Result`, for `?` chains.
pub fn check_transition(current: OrderStatus, target: OrderStatus) -> CoreResult<()> {
    if can_transition(current, target) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

/// Every status reachable in one step from `current`.
///
/// Buttons offered for an order are exactly this list.
pub fn allowed_targets(current: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|target| can_transition(current, *target))
        .collect()
}

// =============================================================================
// Production Gate
// =============================================================================

/// True iff every line item is completed. An order with no items is
/// vacuously complete.
pub fn is_production_complete(order: &Order) -> bool {
    order
        .items
        .iter()
        .all(|item| item.production_status == ProductionStatus::Completed)
}

/// True iff every item of `category` is completed. A category absent from the
/// order is vacuously complete.
pub fn is_category_complete(order: &Order, category: ProductionCategory) -> bool {
    order
        .items
        .iter()
        .filter(|item| item.category() == category)
        .all(|item| item.production_status == ProductionStatus::Completed)
}

/// Categories that still have pending items, in declaration order.
pub fn incomplete_categories(order: &Order) -> Vec<ProductionCategory> {
    ProductionCategory::ALL
        .into_iter()
        .filter(|category| !is_category_complete(order, *category))
        .collect()
}

/// Returns a copy of `order` with item `index` marked completed.
///
/// Marking an already completed item is a no-op copy.
pub fn mark_item_complete(order: &Order, index: usize) -> CoreResult<Order> {
    let len = order.items.len();
    if index >= len {
        return Err(CoreError::IndexOutOfRange { index, len });
    }

    let mut next = order.clone();
    next.items[index].production_status = ProductionStatus::Completed;
    Ok(next)
}

/// Returns a copy of `order` moved to `target`.
///
/// ## Checks
/// 1. `target` must be reachable in one step ([`can_transition`])
/// 2. Entering `ready` / `ready_to_deliver` requires [`is_production_complete`]
///
/// On failure the input is untouched and the error says which rule failed.
pub fn advance_status(order: &Order, target: OrderStatus) -> CoreResult<Order> {
    check_transition(order.status, target)?;

    if target.requires_production_complete() && !is_production_complete(order) {
        return Err(CoreError::ProductionIncomplete {
            categories: incomplete_categories(order),
        });
    }

    let mut next = order.clone();
    next.status = target;
    Ok(next)
}

// =============================================================================
// Unit Tests
// =============================================================================
