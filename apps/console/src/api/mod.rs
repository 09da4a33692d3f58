//! # Order API
//!
//! The REST backend as seen by the command layer.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Order REST API                                 │
//! │                                                                         │
//! │  GET    /orders                 → [Order]         list_orders           │
//! │  POST   /orders                 → Order           create_order          │
//! │  PUT    /orders/{id}            → Order           update_order          │
//! │  DELETE /orders/{id}            → (ack)           delete_order          │
//! │  POST   /orders/{id}/payments   → PaymentState    record_payment        │
//! │  PUT    /orders/{id}/shipper    → Order           assign_shipper        │
//! │                                                                         │
//! │  Every body may come as { success, message?, data? } or bare.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`OrderApi`] is a trait so commands can run against a fake in tests.

pub mod envelope;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bakery_core::{
    CustomerRef, Fulfillment, LineItem, Money, Order, OrderStatus, PaymentLogEntry, PaymentMethod,
};

use crate::error::ApiResult;

pub use http::HttpOrderApi;

// =============================================================================
// API Trait
// =============================================================================

/// Calls against the order backend. Every method returns the server's view.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list_orders(&self) -> ApiResult<Vec<Order>>;

    /// Submits a new order. The server assigns the id and timestamps.
    async fn create_order(&self, order: &Order) -> ApiResult<Order>;

    async fn update_order(&self, id: &str, patch: &OrderPatch) -> ApiResult<Order>;

    async fn delete_order(&self, id: &str) -> ApiResult<()>;

    async fn record_payment(&self, id: &str, payment: &PaymentRequest) -> ApiResult<PaymentState>;

    async fn assign_shipper(&self, id: &str, assignment: &ShipperAssignment) -> ApiResult<Order>;
}

// =============================================================================
// Request / Response Bodies
// =============================================================================

/// Partial order update. Only the fields that are set go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<Fulfillment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_by: Option<String>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        OrderPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn items(items: Vec<LineItem>) -> Self {
        OrderPatch {
            items: Some(items),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == OrderPatch::default()
    }

    /// `order` with this patch laid over it, for local policy checks.
    pub fn apply_to(&self, order: &Order) -> Order {
        let mut next = order.clone();
        if let Some(customer) = &self.customer {
            next.customer = customer.clone();
        }
        if let Some(items) = &self.items {
            next.items = items.clone();
        }
        if let Some(fulfillment) = self.fulfillment {
            next.fulfillment = fulfillment;
        }
        if let Some(delivery_at) = self.delivery_at {
            next.delivery_at = delivery_at;
        }
        if let Some(fee) = self.shipping_fee {
            next.shipping_fee = fee;
        }
        if let Some(method) = self.payment_method {
            next.payment_method = method;
        }
        if let Some(note) = &self.note {
            next.note = Some(note.clone());
        }
        if let Some(received_by) = &self.received_by {
            next.received_by = Some(received_by.clone());
        }
        next.with_recomputed_totals()
    }
}

/// A payment taken at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub employee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PaymentRequest {
    /// The log entry this payment would become, stamped now.
    pub fn to_log_entry(&self) -> PaymentLogEntry {
        PaymentLogEntry {
            amount: self.amount,
            method: self.method,
            employee: self.employee.clone(),
            note: self.note.clone(),
            recorded_at: Utc::now(),
        }
    }
}

/// The payment fields of an order after the server recorded a payment.
///
/// Serializes to exactly the fields it carries, so it can be merged into the
/// stored order with `patch_with`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentState {
    pub deposit: Money,
    pub amount_owed: Money,
    pub payment_logs: Vec<PaymentLogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipperAssignment {
    pub shipper_id: String,
}
