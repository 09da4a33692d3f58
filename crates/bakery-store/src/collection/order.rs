//! # Order Queries
//!
//! Read-only views over the order collection used by the kitchen board and
//! the dispatch desk. All of them read one snapshot, so a result never mixes
//! two versions of the collection.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use bakery_core::lifecycle::is_production_complete;
use bakery_core::{Money, Order, OrderStatus};

use super::Collection;

impl Collection<Order> {
    /// Orders currently in `status`, in collection order.
    pub fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.snapshot()
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Orders scheduled for delivery in `[from, to)`, earliest first.
    pub fn due_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Order> {
        let mut due: Vec<Order> = self
            .snapshot()
            .iter()
            .filter(|o| o.delivery_at >= from && o.delivery_at < to)
            .cloned()
            .collect();
        due.sort_by_key(|o| o.delivery_at);
        due
    }

    /// Orders assigned to `shipper_id`.
    pub fn assigned_to(&self, shipper_id: &str) -> Vec<Order> {
        self.snapshot()
            .iter()
            .filter(|o| o.shipper_id.as_deref() == Some(shipper_id))
            .cloned()
            .collect()
    }

    /// In production with every line item done: ready to be advanced.
    pub fn awaiting_ready(&self) -> Vec<Order> {
        self.snapshot()
            .iter()
            .filter(|o| o.status == OrderStatus::InProduction && is_production_complete(o))
            .cloned()
            .collect()
    }

    /// Σ amount owed over orders that are not terminal.
    pub fn outstanding_balance(&self) -> Money {
        self.snapshot()
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.amount_owed)
            .sum()
    }

    /// Count of orders per status, in lifecycle order. Statuses with no
    /// orders are omitted.
    pub fn status_counts(&self) -> Vec<(OrderStatus, usize)> {
        let snapshot = self.snapshot();
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for order in snapshot.iter() {
            let rank = OrderStatus::ALL
                .iter()
                .position(|s| *s == order.status)
                .unwrap_or(0);
            *counts.entry(rank).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(rank, count)| (OrderStatus::ALL[rank], count))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
