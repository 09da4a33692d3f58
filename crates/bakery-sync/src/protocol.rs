//! # Channel Protocol Messages
//!
//! Events pushed by the backend over the real-time channel.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Channel Events                               │
//! │                                                                         │
//! │  ORDER MUTATIONS (any console → backend → every console)               │
//! │  ───────────────────────────────────────────────────────               │
//! │  SERVER ───► order:created   { order, message }                        │
//! │  SERVER ───► order:updated   { order, message }                        │
//! │  SERVER ───► order:deleted   { id, message }                           │
//! │                                                                         │
//! │  SHIPPER REPLIES (messaging bot → backend → every console)             │
//! │  ─────────────────────────────────────────────────────────             │
//! │  SERVER ───► shipper:response { id, outcome, order, message }          │
//! │              outcome = accept | reject | cancel | delivered            │
//! │                                                                         │
//! │  The console never sends application frames. Keepalive uses            │
//! │  WebSocket ping/pong control frames.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Text frames holding adjacently tagged JSON:
//! ```json
//! { "event": "order:deleted", "data": { "id": "ORD-1", "message": "Order deleted" } }
//! ```
//!
//! Delivery is at-least-once. Every event carries the full server state of the
//! entity, so applying it twice gives the same result as applying it once.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bakery_core::Order;

use crate::error::SyncResult;

/// Event names this client understands.
pub const KNOWN_EVENTS: [&str; 4] = [
    "order:created",
    "order:updated",
    "order:deleted",
    "shipper:response",
];

// =============================================================================
// Main Event Enum (Tagged Union)
// =============================================================================

/// All events the backend pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A new order was accepted by the backend.
    #[serde(rename = "order:created")]
    OrderCreated(OrderPayload),

    /// An order changed (status, items, payment, shipper).
    #[serde(rename = "order:updated")]
    OrderUpdated(OrderPayload),

    /// An order was deleted.
    #[serde(rename = "order:deleted")]
    OrderDeleted(DeletedPayload),

    /// A shipper answered a delivery request.
    #[serde(rename = "shipper:response")]
    ShipperResponse(ShipperResponsePayload),
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub order: Order,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedPayload {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// A shipper's reply, with the order as the backend stored it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipperResponsePayload {
    /// Order id.
    pub id: String,
    pub outcome: ShipperOutcome,
    pub order: Order,
    #[serde(default)]
    pub message: String,
}

/// What the shipper answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipperOutcome {
    Accept,
    Reject,
    Cancel,
    Delivered,
}

impl ShipperOutcome {
    /// Accept and delivered are good news; reject and cancel need a new shipper.
    pub fn is_positive(&self) -> bool {
        matches!(self, ShipperOutcome::Accept | ShipperOutcome::Delivered)
    }
}

impl std::fmt::Display for ShipperOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipperOutcome::Accept => write!(f, "accept"),
            ShipperOutcome::Reject => write!(f, "reject"),
            ShipperOutcome::Cancel => write!(f, "cancel"),
            ShipperOutcome::Delivered => write!(f, "delivered"),
        }
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

/// Just enough structure to route a frame before parsing its payload.
#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
}

impl ServerEvent {
    /// Returns the wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::OrderCreated(_) => "order:created",
            ServerEvent::OrderUpdated(_) => "order:updated",
            ServerEvent::OrderDeleted(_) => "order:deleted",
            ServerEvent::ShipperResponse(_) => "shipper:response",
        }
    }

    /// The message text the backend attached for display.
    pub fn message(&self) -> &str {
        match self {
            ServerEvent::OrderCreated(p) | ServerEvent::OrderUpdated(p) => &p.message,
            ServerEvent::OrderDeleted(p) => &p.message,
            ServerEvent::ShipperResponse(p) => &p.message,
        }
    }

    /// Decodes one text frame.
    ///
    /// Returns `Ok(None)` for a well-formed frame with an event name this
    /// client does not handle, so newer backends can add events freely.
    /// A known event with a malformed payload is an error.
    pub fn decode(text: &str) -> SyncResult<Option<Self>> {
        let value: Value = serde_json::from_str(text)?;
        let raw: RawFrame = serde_json::from_value(value.clone())?;
        if !KNOWN_EVENTS.contains(&raw.event.as_str()) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Serializes to a text frame. Used by test servers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
