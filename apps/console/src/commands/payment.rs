//! # Payment Commands
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record_payment                                    │
//! │                                                                         │
//! │  Store copy: total 1.000.000, deposit 400.000, owed 600.000             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Order::apply_payment (local)  ── amount ≤ 0 / > owed ──► rejected      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  POST /orders/{id}/payments                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  { deposit, amountOwed, paymentLogs } ──► orders.patch_with(id, ..)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use bakery_core::Money;

use super::{CommandContext, CommandResult};
use crate::api::{PaymentRequest, PaymentState};
use crate::error::{ApiError, ApiResult};

/// Records a payment against an order.
///
/// Checked locally against the Store's copy first: the amount must be
/// positive and may not exceed what is still owed. The server's payment
/// fields are then merged into the stored order; the rest of the order is
/// left as it is.
pub async fn record_payment(
    ctx: &CommandContext,
    id: &str,
    payment: PaymentRequest,
) -> CommandResult<PaymentState> {
    let amount = payment.amount;
    let outcome = try_record(ctx, id, &payment).await;
    ctx.finish("record_payment", outcome, |state| {
        format!(
            "Recorded {} for order {}, {} still owed",
            amount, id, state.amount_owed
        )
    })
}

async fn try_record(
    ctx: &CommandContext,
    id: &str,
    payment: &PaymentRequest,
) -> ApiResult<PaymentState> {
    if payment.employee.trim().is_empty() {
        return Err(ApiError::validation("employee is required"));
    }

    let current = ctx
        .store
        .orders()
        .get(id)
        .ok_or_else(|| ApiError::not_found("Order", id))?;
    let expected = current.apply_payment(payment.to_log_entry())?;

    let state = ctx.api.record_payment(id, payment).await?;
    if state.amount_owed < Money::zero() {
        return Err(ApiError::invalid_response(format!(
            "Server reported a negative amount owed ({})",
            state.amount_owed
        )));
    }
    if state.amount_owed != expected.amount_owed {
        debug!(
            order_id = %id,
            expected = %expected.amount_owed,
            server = %state.amount_owed,
            "Server amount owed differs from local estimate"
        );
    }

    let changed = ctx.store.orders().patch_with(id, &state)?;
    debug!(order_id = %id, changed, "Payment state merged");
    Ok(state)
}
