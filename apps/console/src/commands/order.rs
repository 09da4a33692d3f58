//! # Order Commands
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Commands                                   │
//! │                                                                         │
//! │  refresh_orders()                       GET    → orders.set_all         │
//! │  create_order(draft)                    POST   → orders.upsert_one      │
//! │  update_order(id, patch)                PUT    → orders.upsert_one      │
//! │  delete_order(id)                       DELETE → orders.remove_one      │
//! │  advance_order_status(id, target)       policy check, then update       │
//! │  mark_item_complete(id, index)          policy check, then update       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use bakery_core::lifecycle::{self, OrderStatus};
use bakery_core::validation::{validate_items, validate_order};
use bakery_core::{CoreError, Order};

use super::{CommandContext, CommandResult};
use crate::api::OrderPatch;
use crate::error::{ApiError, ApiResult};

/// Replaces the whole order collection with the server's list.
///
/// This is the recovery path after the channel was down: whatever the Store
/// held is discarded.
pub async fn refresh_orders(ctx: &CommandContext) -> CommandResult<usize> {
    let outcome = async {
        let orders = ctx.api.list_orders().await?;
        let count = orders.len();
        ctx.store.orders().set_all(orders);
        Ok::<_, ApiError>(count)
    }
    .await;

    ctx.finish("refresh_orders", outcome, |count| {
        format!("Loaded {} orders", count)
    })
}

/// Submits a new order.
///
/// The draft is validated locally and its totals recomputed. The server
/// assigns the id and timestamps, and its reply is what lands in the Store.
pub async fn create_order(ctx: &CommandContext, draft: Order) -> CommandResult<Order> {
    let outcome = try_create(ctx, draft).await;
    ctx.finish("create_order", outcome, |order| {
        format!("Order {} created", order.id)
    })
}

async fn try_create(ctx: &CommandContext, draft: Order) -> ApiResult<Order> {
    validate_order(&draft)?;
    let draft = draft.with_recomputed_totals();

    let created = ctx.api.create_order(&draft).await?;
    if created.id.trim().is_empty() {
        return Err(ApiError::invalid_response(
            "Server returned an order without an id",
        ));
    }

    ctx.store.orders().upsert_one(created.clone());
    Ok(created)
}

/// Sends a partial update and stores the server's full order.
///
/// When the patch changes the status of an order this console holds, the
/// transition policy runs first (against the order with the patch applied),
/// so an invalid move never reaches the server. Replacement items are
/// validated the same way as on creation.
pub async fn update_order(ctx: &CommandContext, id: &str, patch: OrderPatch) -> CommandResult<Order> {
    let outcome = try_update(ctx, id, &patch).await;
    ctx.finish("update_order", outcome, |order| {
        format!("Order {} updated", order.id)
    })
}

async fn try_update(ctx: &CommandContext, id: &str, patch: &OrderPatch) -> ApiResult<Order> {
    if patch.is_empty() {
        return Err(ApiError::validation("Nothing to update"));
    }

    if let (Some(target), Some(current)) = (patch.status, ctx.store.orders().get(id)) {
        if target != current.status {
            lifecycle::advance_status(&patch.apply_to(&current), target)?;
        }
    }

    if let Some(items) = &patch.items {
        validate_items(items)?;
    }

    if let (Some(items), Some(current)) = (&patch.items, ctx.store.orders().get(id)) {
        if !current.status.allows_item_edits() && items.len() != current.items.len() {
            return Err(ApiError::validation(format!(
                "Items of a {} order can no longer be added or removed",
                current.status.label()
            )));
        }
    }

    let updated = ctx.api.update_order(id, patch).await?;
    store_server_order(ctx, id, updated)
}

/// Writes an order the server returned for `id`.
pub(super) fn store_server_order(ctx: &CommandContext, id: &str, order: Order) -> ApiResult<Order> {
    if order.id != id {
        return Err(ApiError::invalid_response(format!(
            "Asked for order {} but the server returned {}",
            id, order.id
        )));
    }
    let outcome = ctx.store.orders().upsert_one(order.clone());
    debug!(order_id = %id, ?outcome, "Server order stored");
    Ok(order)
}

/// Deletes an order. Returns the id.
///
/// The local removal is a no-op when a broadcast already removed it.
pub async fn delete_order(ctx: &CommandContext, id: &str) -> CommandResult<String> {
    let outcome = async {
        ctx.api.delete_order(id).await?;
        let removed = ctx.store.orders().remove_one(id);
        debug!(order_id = %id, removed, "Order removed locally");
        Ok::<_, ApiError>(id.to_string())
    }
    .await;

    ctx.finish("delete_order", outcome, |id| format!("Order {} deleted", id))
}

/// Moves an order one step along its lifecycle.
///
/// Checks [`lifecycle::advance_status`] against the Store's copy, so the
/// front desk gets "Production is not finished for: Cream cake" without a
/// round trip.
pub async fn advance_order_status(
    ctx: &CommandContext,
    id: &str,
    target: OrderStatus,
) -> CommandResult<Order> {
    let outcome = try_advance(ctx, id, target).await;
    ctx.finish("advance_order_status", outcome, |order| {
        format!("Order {} is now {}", order.id, order.status.label())
    })
}

async fn try_advance(ctx: &CommandContext, id: &str, target: OrderStatus) -> ApiResult<Order> {
    let current = loaded_order(ctx, id)?;
    lifecycle::advance_status(&current, target)?;

    let updated = ctx.api.update_order(id, &OrderPatch::status(target)).await?;
    store_server_order(ctx, id, updated)
}

/// Marks one line item as produced. Used by the kitchen stations.
pub async fn mark_item_complete(ctx: &CommandContext, id: &str, index: usize) -> CommandResult<Order> {
    let outcome = try_mark_complete(ctx, id, index).await;
    ctx.finish("mark_item_complete", outcome, |order| {
        let name = order.items.get(index).map_or("item", |item| item.name());
        format!("{} marked done for order {}", name, order.id)
    })
}

async fn try_mark_complete(ctx: &CommandContext, id: &str, index: usize) -> ApiResult<Order> {
    let current = loaded_order(ctx, id)?;
    let next = lifecycle::mark_item_complete(&current, index).map_err(|e| {
        if let CoreError::IndexOutOfRange { .. } = e {
            tracing::error!(order_id = %id, index, items = current.items.len(), "Stale line item index");
        }
        ApiError::from(e)
    })?;

    let updated = ctx.api.update_order(id, &OrderPatch::items(next.items)).await?;
    store_server_order(ctx, id, updated)
}

fn loaded_order(ctx: &CommandContext, id: &str) -> ApiResult<Order> {
    ctx.store
        .orders()
        .get(id)
        .ok_or_else(|| ApiError::not_found("Order", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{context, order, Call, Reply};
    use crate::error::ErrorCode;
    use bakery_core::{LineItem, Money, ProductionStatus};
    use bakery_sync::protocol::OrderPayload;
    use bakery_sync::{InboundHandler, ServerEvent};
    use std::sync::Arc;

    fn completed(mut order: Order) -> Order {
        for item in &mut order.items {
            item.production_status = ProductionStatus::Completed;
        }
        order
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let (ctx, api, emitter) = context();
        ctx.store.orders().upsert_one(order("OLD", OrderStatus::Created));

        api.reply(Reply::Orders(vec![
            order("ORD-1", OrderStatus::Created),
            order("ORD-2", OrderStatus::InProduction),
        ]));
        let result = refresh_orders(&ctx).await;

        assert_eq!(result.data, Some(2));
        assert!(!ctx.store.orders().contains("OLD"));
        assert_eq!(emitter.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_create_stores_server_entity() {
        let (ctx, api, emitter) = context();
        let mut draft = order("", OrderStatus::Draft);
        draft.total = bakery_core::Money::zero();

        let mut server = order("ORD-100", OrderStatus::Created);
        server.created_at = Some(chrono::Utc::now());
        api.reply(Reply::Order(server.clone()));

        let result = create_order(&ctx, draft).await;
        assert!(result.is_success());
        assert_eq!(ctx.store.orders().get("ORD-100"), Some(server));

        // The draft went out with recomputed totals.
        let Call::Create(sent) = &api.calls()[0] else {
            panic!("expected a create call");
        };
        assert_eq!(sent.total.dong(), 400_000);
        assert!(emitter.notices()[0].message.contains("ORD-100"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft_locally() {
        let (ctx, api, emitter) = context();
        let mut draft = order("", OrderStatus::Draft);
        draft.items.clear();

        let result = create_order(&ctx, draft).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::ValidationError);
        assert!(api.calls().is_empty());
        assert!(!emitter.notices()[0].is_success());
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure_result() {
        let (ctx, api, emitter) = context();
        api.reply(Reply::Fail(ApiError::timeout(std::time::Duration::from_secs(15))));

        let result = refresh_orders(&ctx).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().code, ErrorCode::Timeout);
        assert_eq!(emitter.notices(), vec![bakery_core::Notice::failure("Request timed out after 15s")]);
    }

    #[tokio::test]
    async fn test_advance_blocked_until_production_complete() {
        let (ctx, api, emitter) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::InProduction));

        let result = advance_order_status(&ctx, "ORD-1", OrderStatus::Ready).await;
        let error = result.error.unwrap();
        assert_eq!(error.code, ErrorCode::ProductionIncomplete);
        assert!(error.message.contains("European pastry"));
        assert!(error.message.contains("Cream cake"));
        assert!(api.calls().is_empty());
        assert_eq!(emitter.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_order_untouched() {
        let (ctx, api, _) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::Draft));

        let result = advance_order_status(&ctx, "ORD-1", OrderStatus::OutForDelivery).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidTransition);
        assert_eq!(ctx.store.orders().get("ORD-1").unwrap().status, OrderStatus::Draft);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_checks_status_policy() {
        let (ctx, api, _) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::Created));

        let result = update_order(&ctx, "ORD-1", OrderPatch::status(OrderStatus::Completed)).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidTransition);

        let result = update_order(&ctx, "ORD-1", OrderPatch::default()).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::ValidationError);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_items_locally() {
        let (ctx, api, emitter) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::Created));

        let mut items = order("ORD-1", OrderStatus::Created).items;
        items[0].quantity = -3;
        items[1].quantity = 0;
        items[1].unit_price = Money::from_dong(-1);
        let result = update_order(&ctx, "ORD-1", OrderPatch::items(items)).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::ValidationError);

        // Not held locally: the items are still checked.
        let unnamed = vec![LineItem::european("p-1", "", 1, Money::from_dong(10_000))];
        let result = update_order(&ctx, "ORD-9", OrderPatch::items(unnamed)).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::ValidationError);

        let result = update_order(&ctx, "ORD-1", OrderPatch::items(vec![])).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::ValidationError);

        assert!(api.calls().is_empty());
        assert_eq!(
            ctx.store.orders().get("ORD-1"),
            Some(order("ORD-1", OrderStatus::Created))
        );
        assert!(emitter.notices().iter().all(|n| !n.is_success()));
    }

    #[tokio::test]
    async fn test_mark_item_complete_sends_items() {
        let (ctx, api, _) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::InProduction));

        let mut server = order("ORD-1", OrderStatus::InProduction);
        server.items[0].production_status = ProductionStatus::Completed;
        api.reply(Reply::Order(server.clone()));

        let result = mark_item_complete(&ctx, "ORD-1", 0).await;
        assert!(result.is_success());
        assert_eq!(ctx.store.orders().get("ORD-1"), Some(server.clone()));
        assert_eq!(
            api.calls(),
            vec![Call::Update("ORD-1".into(), OrderPatch::items(server.items))]
        );
    }

    #[tokio::test]
    async fn test_mark_item_complete_bad_index() {
        let (ctx, api, _) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::InProduction));

        let result = mark_item_complete(&ctx, "ORD-1", 7).await;
        assert_eq!(result.error.unwrap().code, ErrorCode::Internal);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (ctx, api, emitter) = context();
        ctx.store.orders().upsert_one(order("ORD-1", OrderStatus::Created));
        api.reply(Reply::Ack).reply(Reply::Ack);

        assert!(delete_order(&ctx, "ORD-1").await.is_success());
        assert!(delete_order(&ctx, "ORD-1").await.is_success());
        assert!(ctx.store.orders().is_empty());
        assert_eq!(emitter.notices().len(), 2);
    }

    #[tokio::test]
    async fn test_server_failure_keeps_store() {
        let (ctx, api, _) = context();
        let before = order("ORD-1", OrderStatus::Created);
        ctx.store.orders().upsert_one(before.clone());
        api.reply(Reply::Fail(ApiError::new(ErrorCode::ServerError, "Order is locked")));

        let result = advance_order_status(&ctx, "ORD-1", OrderStatus::InProduction).await;
        assert_eq!(result.error.unwrap().message, "Order is locked");
        assert_eq!(ctx.store.orders().get("ORD-1"), Some(before));
    }

    #[tokio::test]
    async fn test_command_then_own_broadcast_is_noop() {
        let (ctx, api, _) = context();
        ctx.store
            .orders()
            .upsert_one(completed(order("ORD-1", OrderStatus::InProduction)));

        let e1 = completed(order("ORD-1", OrderStatus::Ready));
        api.reply(Reply::Order(e1.clone()));
        assert!(advance_order_status(&ctx, "ORD-1", OrderStatus::Ready).await.is_success());

        let changes = ctx.store.orders().subscribe();

        let inbound = InboundHandler::new(ctx.store.clone(), Arc::new(bakery_sync::NoOpEmitter));
        inbound.apply(ServerEvent::OrderUpdated(OrderPayload {
            order: e1.clone(),
            message: String::new(),
        }));

        assert_eq!(ctx.store.orders().get("ORD-1"), Some(e1));
        assert!(!changes.has_changed().unwrap());
    }

    /// A stale broadcast applied after the command response wins: there is
    /// no ordering between the two paths.
    #[tokio::test]
    async fn test_stale_broadcast_after_command_wins() {
        let (ctx, api, _) = context();
        let e0 = completed(order("ORD-1", OrderStatus::InProduction));
        ctx.store.orders().upsert_one(e0.clone());

        let mut e1 = completed(order("ORD-1", OrderStatus::Ready));
        e1.updated_at = Some(chrono::Utc::now());
        api.reply(Reply::Order(e1.clone()));

        let result = update_order(&ctx, "ORD-1", OrderPatch::status(OrderStatus::Ready)).await;
        assert_eq!(result.data, Some(e1));

        let inbound = InboundHandler::new(ctx.store.clone(), Arc::new(bakery_sync::NoOpEmitter));
        inbound.apply(ServerEvent::OrderUpdated(OrderPayload {
            order: e0.clone(),
            message: String::new(),
        }));

        let stored = ctx.store.orders().get("ORD-1").unwrap();
        assert_eq!(stored, e0);
        assert_eq!(stored.status, OrderStatus::InProduction);
    }
}
