//! # Inbound Event Handler
//!
//! Applies backend broadcasts to the local [`Store`].
//!
//! ## Event Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inbound Event Handling                               │
//! │                                                                         │
//! │  order:created     ──► orders.upsert_one(order)                         │
//! │  order:updated     ──► orders.upsert_one(order)                         │
//! │  order:deleted     ──► orders.remove_one(id)                            │
//! │  shipper:response  ──► orders.upsert_one(order)                         │
//! │                        + notice (success for accept / delivered,        │
//! │                                  failure for reject / cancel)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every event carries the server's whole entity, so:                    │
//! │  • a repeated upsert finds identical data and publishes nothing        │
//! │  • a repeated delete finds nothing to remove                           │
//! │  • a repeated shipper reply shows its notice again, the order is the   │
//! │    same                                                                 │
//! │                                                                         │
//! │  The console's own command responses go through the same operations,   │
//! │  so a broadcast echoing a local change is a no-op.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use bakery_core::Notice;
use bakery_store::{Store, UpsertOutcome};

use crate::channel::SyncEventEmitter;
use crate::protocol::{ServerEvent, ShipperResponsePayload};

// =============================================================================
// Inbound Handler
// =============================================================================

/// What applying one event did to the Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Upserted(UpsertOutcome),
    Removed,
    /// A delete for an order this console never had (or already removed).
    AlreadyAbsent,
}

/// Applies channel events to the Store, one at a time, in arrival order.
pub struct InboundHandler {
    store: Store,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl InboundHandler {
    pub fn new(store: Store, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        InboundHandler { store, emitter }
    }

    /// Drains `events` until the transport closes it.
    pub async fn run(self, mut events: mpsc::Receiver<ServerEvent>) {
        info!("Inbound handler starting");

        while let Some(event) = events.recv().await {
            self.apply(event);
        }

        info!("Inbound handler stopped");
    }

    /// Applies one event. Never fails: the Store mutations used here only
    /// take whole entities.
    pub fn apply(&self, event: ServerEvent) -> Applied {
        let name = event.name();
        let applied = match event {
            ServerEvent::OrderCreated(payload) | ServerEvent::OrderUpdated(payload) => {
                Applied::Upserted(self.store.orders().upsert_one(payload.order))
            }
            ServerEvent::OrderDeleted(payload) => {
                if self.store.orders().remove_one(&payload.id) {
                    Applied::Removed
                } else {
                    Applied::AlreadyAbsent
                }
            }
            ServerEvent::ShipperResponse(payload) => self.apply_shipper_response(payload),
        };

        debug!(event = name, ?applied, "Event applied");
        applied
    }

    fn apply_shipper_response(&self, payload: ShipperResponsePayload) -> Applied {
        let ShipperResponsePayload {
            id,
            outcome,
            order,
            message,
        } = payload;

        let outcome_applied = self.store.orders().upsert_one(order);

        let text = if message.trim().is_empty() {
            format!("Shipper replied '{}' for order {}", outcome, id)
        } else {
            message
        };
        info!(order_id = %id, %outcome, "Shipper response received");

        let notice = if outcome.is_positive() {
            Notice::success(text)
        } else {
            Notice::failure(text)
        };
        self.emitter.emit_notice(notice);

        Applied::Upserted(outcome_applied)
    }
}
