//! # Commands Module
//!
//! User-initiated order mutations.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (CommandResult, CommandContext)
//! ├── order.rs    ◄─── refresh, create, update, delete, status, production
//! ├── payment.rs  ◄─── record_payment
//! └── shipper.rs  ◄─── assign_shipper (+ webhook dispatch)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  record_payment(ctx, "ORD-1", payment)                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  local checks against the Store's copy (policy, amounts)                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  OrderApi call ───────── fails ──────────┐                              │
//! │         │                                │                              │
//! │         ▼                                ▼                              │
//! │  Store write with the SERVER's entity    CommandResult { success: false}│
//! │  (upsert_one / remove_one / patch_with)  + failure notice               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CommandResult { success: true, data }  + success notice                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation With The Channel
//! Other consoles learn about the same change from the sync channel, whose
//! handler performs the same Store write. This console may receive its own
//! change back as a broadcast; writing identical data twice is a no-op.
//!
//! Nothing orders a command response against a broadcast. Whichever is
//! applied last stays in the Store until the next write for that order, even
//! if it is older.

pub mod order;
pub mod payment;
pub mod shipper;

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use bakery_core::Notice;
use bakery_store::Store;
use bakery_sync::SyncEventEmitter;

use crate::api::OrderApi;
use crate::error::{ApiError, ApiResult};
use crate::webhook::ShipperDispatch;

pub use order::{
    advance_order_status, create_order, delete_order, mark_item_complete, refresh_orders,
    update_order,
};
pub use payment::record_payment;
pub use shipper::assign_shipper;

// =============================================================================
// Command Result
// =============================================================================

/// What every command returns. Commands never fail any other way.
///
/// ```json
/// { "success": true,  "data": { "id": "ORD-1", ... } }
/// { "success": false, "error": { "code": "TIMEOUT", "message": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        CommandResult {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: ApiError) -> Self {
        CommandResult {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Back to a `Result`, for callers that chain commands.
    pub fn into_result(self) -> ApiResult<T> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ApiError::internal("Command returned neither data nor error")),
        }
    }
}

impl<T> From<ApiResult<T>> for CommandResult<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => CommandResult::ok(data),
            Err(error) => CommandResult::fail(error),
        }
    }
}

// =============================================================================
// Command Context
// =============================================================================

/// Everything a command needs, passed explicitly.
#[derive(Clone)]
pub struct CommandContext {
    pub api: Arc<dyn OrderApi>,
    pub store: Store,
    pub emitter: Arc<dyn SyncEventEmitter>,
    /// Shipper webhook. `None` skips the notification.
    pub dispatcher: Option<Arc<dyn ShipperDispatch>>,
}

impl CommandContext {
    pub fn new(api: Arc<dyn OrderApi>, store: Store, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        CommandContext {
            api,
            store,
            emitter,
            dispatcher: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn ShipperDispatch>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Logs the outcome, emits exactly one notice and wraps the result.
    pub(crate) fn finish<T>(
        &self,
        command: &'static str,
        outcome: ApiResult<T>,
        success_message: impl FnOnce(&T) -> String,
    ) -> CommandResult<T> {
        match &outcome {
            Ok(data) => {
                let message = success_message(data);
                info!(command, %message, "Command succeeded");
                self.emitter.emit_notice(Notice::success(message));
            }
            Err(error) => {
                warn!(command, code = ?error.code, error = %error.message, "Command failed");
                self.emitter.emit_notice(Notice::failure(error.message.clone()));
            }
        }
        outcome.into()
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted [`OrderApi`] and a recording emitter.

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use bakery_core::{CustomerRef, Fulfillment, LineItem, Money, Notice, Order, OrderStatus};
    use bakery_store::Store;
    use bakery_sync::{ChannelState, SyncEventEmitter};

    use super::CommandContext;
    use crate::api::{OrderApi, OrderPatch, PaymentRequest, PaymentState, ShipperAssignment};
    use crate::error::{ApiError, ApiResult};

    /// One recorded API call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        List,
        Create(Order),
        Update(String, OrderPatch),
        Delete(String),
        Payment(String, PaymentRequest),
        AssignShipper(String, String),
    }

    /// Scripted reply for the next call.
    pub enum Reply {
        Order(Order),
        Orders(Vec<Order>),
        Payment(PaymentState),
        Ack,
        Fail(ApiError),
    }

    #[derive(Default)]
    pub struct FakeApi {
        pub calls: Mutex<Vec<Call>>,
        replies: Mutex<VecDeque<Reply>>,
    }

    impl FakeApi {
        pub fn reply(&self, reply: Reply) -> &Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, call: Call) -> ApiResult<Reply> {
            self.calls.lock().unwrap().push(call);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted API call");
            match reply {
                Reply::Fail(e) => Err(e),
                other => Ok(other),
            }
        }
    }

    #[async_trait]
    impl OrderApi for FakeApi {
        async fn list_orders(&self) -> ApiResult<Vec<Order>> {
            match self.next(Call::List)? {
                Reply::Orders(orders) => Ok(orders),
                _ => panic!("expected Orders reply"),
            }
        }

        async fn create_order(&self, order: &Order) -> ApiResult<Order> {
            match self.next(Call::Create(order.clone()))? {
                Reply::Order(order) => Ok(order),
                _ => panic!("expected Order reply"),
            }
        }

        async fn update_order(&self, id: &str, patch: &OrderPatch) -> ApiResult<Order> {
            match self.next(Call::Update(id.to_string(), patch.clone()))? {
                Reply::Order(order) => Ok(order),
                _ => panic!("expected Order reply"),
            }
        }

        async fn delete_order(&self, id: &str) -> ApiResult<()> {
            match self.next(Call::Delete(id.to_string()))? {
                Reply::Ack => Ok(()),
                _ => panic!("expected Ack reply"),
            }
        }

        async fn record_payment(
            &self,
            id: &str,
            payment: &PaymentRequest,
        ) -> ApiResult<PaymentState> {
            match self.next(Call::Payment(id.to_string(), payment.clone()))? {
                Reply::Payment(state) => Ok(state),
                _ => panic!("expected Payment reply"),
            }
        }

        async fn assign_shipper(
            &self,
            id: &str,
            assignment: &ShipperAssignment,
        ) -> ApiResult<Order> {
            match self
                .next(Call::AssignShipper(id.to_string(), assignment.shipper_id.clone()))
                ?
            {
                Reply::Order(order) => Ok(order),
                _ => panic!("expected Order reply"),
            }
        }
    }

    #[derive(Default)]
    pub struct RecordingEmitter {
        pub notices: Mutex<Vec<Notice>>,
    }

    impl RecordingEmitter {
        pub fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl SyncEventEmitter for RecordingEmitter {
        fn emit_state(&self, _state: ChannelState) {}
        fn emit_notice(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    pub fn context() -> (CommandContext, Arc<FakeApi>, Arc<RecordingEmitter>) {
        let api = Arc::new(FakeApi::default());
        let emitter = Arc::new(RecordingEmitter::default());
        let ctx = CommandContext::new(api.clone(), Store::new(), emitter.clone());
        (ctx, api, emitter)
    }

    /// The bakery order used throughout: two croissants and a custom cake.
    pub fn order(id: &str, status: OrderStatus) -> Order {
        let mut order = Order::draft(
            CustomerRef {
                id: None,
                name: "Lan".to_string(),
                phone: "0901234567".to_string(),
                address: Some("12 Hang Bac".to_string()),
            },
            vec![
                LineItem::european("p-croissant", "Croissant", 2, Money::from_dong(50_000)),
                LineItem::custom_cream_cake(
                    "Birthday cake",
                    1,
                    Money::from_dong(300_000),
                    Some("Write 'Happy 5th'".to_string()),
                    vec![],
                ),
            ],
            Fulfillment::StorePickup,
            Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
        );
        order.id = id.to_string();
        order.status = status;
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_command_result_shape() {
        let ok = CommandResult::ok(3usize);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "success": true, "data": 3 })
        );

        let failed: CommandResult<usize> = CommandResult::fail(ApiError::validation("bad"));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json.get("data").is_none());
        assert_eq!(failed.into_result().unwrap_err().code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_finish_emits_one_notice() {
        let (ctx, _, emitter) = testing::context();

        let result = ctx.finish("noop", Ok(1), |n| format!("did {}", n));
        assert!(result.is_success());

        let result: CommandResult<i32> =
            ctx.finish("noop", Err(ApiError::internal("boom")), |_| unreachable!());
        assert!(!result.is_success());

        let notices = emitter.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], Notice::success("did 1"));
        assert_eq!(notices[1], Notice::failure("boom"));
    }
}
