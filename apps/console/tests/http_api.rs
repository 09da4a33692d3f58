//! Command layer over the real HTTP client, against an in-process axum
//! backend that answers in both the bare and the enveloped shape.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use bakery_console_lib::api::{HttpOrderApi, PaymentRequest};
use bakery_console_lib::commands::{self, CommandContext};
use bakery_console_lib::error::ErrorCode;
use bakery_console_lib::state::{ApiConfig, WebhookConfig};
use bakery_console_lib::webhook::{DispatchRequest, HttpShipperDispatch, ShipperDispatch};
use bakery_core::{CustomerRef, Fulfillment, LineItem, Money, Order, OrderStatus, PaymentMethod};
use bakery_store::Store;
use bakery_sync::{Credential, NoOpEmitter, SessionCredentials};

// =============================================================================
// Mock Backend
// =============================================================================

#[derive(Default)]
struct Backend {
    orders: Mutex<Vec<Order>>,
    webhook_bodies: Mutex<Vec<Value>>,
}

type Shared = State<Arc<Backend>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == "Bearer tok-1")
}

/// The list answers with a bare array.
async fn list_orders(headers: HeaderMap, State(backend): Shared) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "message": "Sign in" })))
            .into_response();
    }
    Json(backend.orders.lock().unwrap().clone()).into_response()
}

async fn create_order(State(backend): Shared, Json(mut order): Json<Order>) -> Response {
    order.id = "ORD-100".to_string();
    order.status = OrderStatus::Created;
    backend.orders.lock().unwrap().push(order.clone());
    Json(json!({ "success": true, "data": order })).into_response()
}

async fn update_order(
    Path(id): Path<String>,
    State(backend): Shared,
    Json(patch): Json<Value>,
) -> Response {
    let mut orders = backend.orders.lock().unwrap();
    let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "No such order" })))
            .into_response();
    };
    if let Some(status) = patch.get("status") {
        order.status = serde_json::from_value(status.clone()).unwrap();
    }
    Json(json!({ "success": true, "data": order.clone() })).into_response()
}

async fn delete_order(Path(id): Path<String>, State(backend): Shared) -> Response {
    backend.orders.lock().unwrap().retain(|o| o.id != id);
    Json(json!({ "success": true })).into_response()
}

async fn record_payment(Path(id): Path<String>, Json(payment): Json<Value>) -> Response {
    if id == "ORD-LOCKED" {
        return Json(json!({ "success": false, "message": "Order is locked" })).into_response();
    }
    let amount = payment["amount"].as_i64().unwrap();
    Json(json!({
        "success": true,
        "data": {
            "deposit": amount,
            "amountOwed": 400_000 - amount,
            "paymentLogs": [{
                "amount": amount,
                "method": "cash",
                "employee": "Mai",
                "recordedAt": "2026-05-01T08:00:00Z"
            }]
        }
    }))
    .into_response()
}

async fn slow_list() -> Response {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!([])).into_response()
}

async fn webhook(State(backend): Shared, Json(body): Json<Value>) -> StatusCode {
    backend.webhook_bodies.lock().unwrap().push(body);
    StatusCode::BAD_GATEWAY
}

async fn spawn_backend(backend: Arc<Backend>) -> SocketAddr {
    let app = Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/{id}", put(update_order).delete(delete_order))
        .route("/api/orders/{id}/payments", post(record_payment))
        .route("/slow/orders", get(slow_list))
        .route("/hook", post(webhook))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Helpers
// =============================================================================

fn stored_order() -> Order {
    let mut order = Order::draft(
        CustomerRef {
            id: None,
            name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            address: None,
        },
        vec![
            LineItem::european("p-croissant", "Croissant", 2, Money::from_dong(50_000)),
            LineItem::custom_cream_cake("Birthday cake", 1, Money::from_dong(300_000), None, vec![]),
        ],
        Fulfillment::StorePickup,
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
    );
    order.id = "ORD-1".to_string();
    order.status = OrderStatus::Created;
    order
}

fn context(
    addr: SocketAddr,
    path: &str,
    timeout_secs: u64,
) -> (CommandContext, Arc<SessionCredentials>) {
    let credentials = Arc::new(SessionCredentials::new(None));
    let config = ApiConfig {
        base_url: format!("http://{}/{}", addr, path),
        timeout_secs,
    };
    let api = HttpOrderApi::new(&config, credentials.clone()).unwrap();
    let ctx = CommandContext::new(Arc::new(api), Store::new(), Arc::new(NoOpEmitter));
    (ctx, credentials)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_requires_credential() {
    let backend = Arc::new(Backend::default());
    backend.orders.lock().unwrap().push(stored_order());
    let addr = spawn_backend(backend).await;
    let (ctx, credentials) = context(addr, "api", 5);

    let result = commands::refresh_orders(&ctx).await;
    assert_eq!(result.error.unwrap().code, ErrorCode::Unauthorized);
    assert!(ctx.store.orders().is_empty());

    credentials.store(Credential::new("tok-1")).unwrap();
    let result = commands::refresh_orders(&ctx).await;
    assert_eq!(result.data, Some(1));
    assert_eq!(ctx.store.orders().get("ORD-1"), Some(stored_order()));
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let backend = Arc::new(Backend::default());
    let addr = spawn_backend(backend.clone()).await;
    let (ctx, _) = context(addr, "api", 5);

    let mut draft = stored_order();
    draft.id = String::new();
    draft.status = OrderStatus::Draft;

    let created = commands::create_order(&ctx, draft).await.into_result().unwrap();
    assert_eq!(created.id, "ORD-100");
    assert_eq!(ctx.store.orders().get("ORD-100").unwrap().status, OrderStatus::Created);

    let updated = commands::advance_order_status(&ctx, "ORD-100", OrderStatus::InProduction)
        .await
        .into_result()
        .unwrap();
    assert_eq!(updated.status, OrderStatus::InProduction);
    assert_eq!(
        backend.orders.lock().unwrap()[0].status,
        OrderStatus::InProduction
    );

    // Production is not finished, so this never reaches the server.
    let result = commands::advance_order_status(&ctx, "ORD-100", OrderStatus::Ready).await;
    assert_eq!(result.error.unwrap().code, ErrorCode::ProductionIncomplete);
    assert_eq!(
        backend.orders.lock().unwrap()[0].status,
        OrderStatus::InProduction
    );

    let deleted = commands::delete_order(&ctx, "ORD-100").await;
    assert!(deleted.is_success());
    assert!(ctx.store.orders().is_empty());
    assert!(backend.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_envelope_and_failed_envelope() {
    let addr = spawn_backend(Arc::new(Backend::default())).await;
    let (ctx, _) = context(addr, "api", 5);
    ctx.store.orders().upsert_one(stored_order());

    let payment = PaymentRequest {
        amount: Money::from_dong(100_000),
        method: PaymentMethod::Cash,
        employee: "Mai".to_string(),
        note: None,
    };
    let state = commands::record_payment(&ctx, "ORD-1", payment.clone())
        .await
        .into_result()
        .unwrap();
    assert_eq!(state.amount_owed, Money::from_dong(300_000));

    let stored = ctx.store.orders().get("ORD-1").unwrap();
    assert_eq!(stored.deposit, Money::from_dong(100_000));
    assert_eq!(stored.payment_logs.len(), 1);

    let mut locked = stored_order();
    locked.id = "ORD-LOCKED".to_string();
    ctx.store.orders().upsert_one(locked);
    let error = commands::record_payment(&ctx, "ORD-LOCKED", payment)
        .await
        .error
        .unwrap();
    assert_eq!(error.code, ErrorCode::ServerError);
    assert_eq!(error.message, "Order is locked");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let addr = spawn_backend(Arc::new(Backend::default())).await;
    let (ctx, _) = context(addr, "api", 5);

    let result = commands::update_order(
        &ctx,
        "ORD-404",
        bakery_console_lib::api::OrderPatch::status(OrderStatus::Created),
    )
    .await;
    assert_eq!(result.error.unwrap().code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let addr = spawn_backend(Arc::new(Backend::default())).await;
    let (ctx, _) = context(addr, "slow", 1);

    let error = commands::refresh_orders(&ctx).await.error.unwrap();
    assert_eq!(error.code, ErrorCode::Timeout);
    assert_eq!(error.message, "Request timed out after 1s");
}

#[tokio::test]
async fn test_webhook_rejection_is_reported() {
    let backend = Arc::new(Backend::default());
    let addr = spawn_backend(backend.clone()).await;

    let config = WebhookConfig {
        url: Some(format!("http://{}/hook", addr)),
        timeout_secs: 5,
    };
    let dispatch = HttpShipperDispatch::from_config(&config).unwrap().unwrap();

    let request = DispatchRequest::for_order(&stored_order(), "sh-1", None);
    let error = dispatch.dispatch(&request).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ServerError);
    assert!(error.message.contains("502"));

    let bodies = backend.webhook_bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["orderId"], "ORD-1");
    assert_eq!(bodies[0]["amountDue"], 400_000);
}
