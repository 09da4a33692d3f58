//! # Shipper Commands
//!
//! ```text
//! assign_shipper(id, shipper_id)
//!      │
//!      ▼
//! PUT /orders/{id}/shipper ── fails ──► failure notice, nothing stored
//!      │
//!      ▼
//! orders.upsert_one(server order) + success notice
//!      │
//!      └──► spawned: webhook post to the shipper
//!                   fails ──► failure notice, assignment stays
//! ```

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use bakery_core::{Notice, Order};
use bakery_sync::SyncEventEmitter;

use super::order::store_server_order;
use super::{CommandContext, CommandResult};
use crate::api::ShipperAssignment;
use crate::error::{ApiError, ApiResult};
use crate::webhook::{DispatchRequest, ShipperDispatch};

/// Assigns a shipper and notifies them in the background.
pub async fn assign_shipper(
    ctx: &CommandContext,
    id: &str,
    shipper_id: &str,
) -> CommandResult<Order> {
    assign_and_dispatch(ctx, id, shipper_id).await.0
}

/// [`assign_shipper`], also returning the webhook task when one was started.
pub(crate) async fn assign_and_dispatch(
    ctx: &CommandContext,
    id: &str,
    shipper_id: &str,
) -> (CommandResult<Order>, Option<JoinHandle<()>>) {
    let outcome = try_assign(ctx, id, shipper_id).await;

    let shipper = ctx.store.shippers().get(shipper_id);
    let shipper_name = shipper
        .as_ref()
        .map_or_else(|| shipper_id.to_string(), |s| s.name.clone());
    let result = ctx.finish("assign_shipper", outcome, |order| {
        format!("Order {} assigned to {}", order.id, shipper_name)
    });

    // Started after the success notice so a failure notice always follows it.
    let dispatch = match (&result.data, &ctx.dispatcher) {
        (Some(order), Some(dispatcher)) => {
            let request = DispatchRequest::for_order(order, shipper_id, shipper.as_ref());
            Some(spawn_dispatch(
                dispatcher.clone(),
                ctx.emitter.clone(),
                request,
            ))
        }
        (Some(_), None) => {
            debug!(order_id = %id, "No shipper webhook configured");
            None
        }
        (None, _) => None,
    };

    (result, dispatch)
}

async fn try_assign(ctx: &CommandContext, id: &str, shipper_id: &str) -> ApiResult<Order> {
    if shipper_id.trim().is_empty() {
        return Err(ApiError::validation("shipper is required"));
    }
    if let Some(shipper) = ctx.store.shippers().get(shipper_id) {
        if !shipper.is_active {
            return Err(ApiError::validation(format!(
                "Shipper {} is not active",
                shipper.name
            )));
        }
    }

    let assignment = ShipperAssignment {
        shipper_id: shipper_id.to_string(),
    };
    let order = ctx.api.assign_shipper(id, &assignment).await?;
    store_server_order(ctx, id, order)
}

/// Posts the webhook without holding up the command.
fn spawn_dispatch(
    dispatcher: Arc<dyn ShipperDispatch>,
    emitter: Arc<dyn SyncEventEmitter>,
    request: DispatchRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match dispatcher.dispatch(&request).await {
            Ok(()) => {
                debug!(order_id = %request.order_id, shipper_id = %request.shipper_id, "Shipper notified");
            }
            Err(e) => {
                warn!(
                    order_id = %request.order_id,
                    shipper_id = %request.shipper_id,
                    error = %e,
                    "Shipper notification failed"
                );
                emitter.emit_notice(Notice::failure(format!(
                    "Order {} is assigned, but the shipper could not be notified: {}",
                    request.order_id, e.message
                )));
            }
        }
    })
}
