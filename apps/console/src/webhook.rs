//! # Shipper Webhook
//!
//! Tells a shipper they have a new delivery by posting to the messaging
//! webhook. The reply is advisory: a failed post is reported to the user and
//! nothing else happens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use bakery_core::{Money, Order, Shipper};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::WebhookConfig;

/// Body of the webhook post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,
    pub delivery_at: DateTime<Utc>,
    pub amount_due: Money,
    pub shipper_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper_handle: Option<String>,
}

impl DispatchRequest {
    /// Builds the notification for `order`. `shipper` is the Store's record,
    /// when the console has one.
    pub fn for_order(order: &Order, shipper_id: &str, shipper: Option<&Shipper>) -> Self {
        DispatchRequest {
            order_id: order.id.clone(),
            customer_name: order.customer.name.clone(),
            customer_phone: order.customer.phone.clone(),
            customer_address: order.customer.address.clone(),
            delivery_at: order.delivery_at,
            amount_due: order.amount_owed,
            shipper_id: shipper_id.to_string(),
            shipper_name: shipper.map(|s| s.name.clone()),
            shipper_handle: shipper.and_then(|s| s.messaging_handle.clone()),
        }
    }
}

/// Sends shipper notifications.
#[async_trait]
pub trait ShipperDispatch: Send + Sync {
    async fn dispatch(&self, request: &DispatchRequest) -> ApiResult<()>;
}

/// [`ShipperDispatch`] that posts JSON to a webhook URL.
pub struct HttpShipperDispatch {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpShipperDispatch {
    /// `None` when no webhook URL is configured.
    pub fn from_config(config: &WebhookConfig) -> ApiResult<Option<Self>> {
        let Some(url) = config.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        let url = Url::parse(url)
            .map_err(|e| ApiError::internal(format!("Invalid webhook URL: {}", e)))?;
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            url,
            timeout,
        }))
    }
}

#[async_trait]
impl ShipperDispatch for HttpShipperDispatch {
    async fn dispatch(&self, request: &DispatchRequest) -> ApiResult<()> {
        debug!(order_id = %request.order_id, shipper_id = %request.shipper_id, "Posting shipper webhook");

        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| match ApiError::from(e) {
                err if err.code == ErrorCode::Timeout => ApiError::timeout(self.timeout),
                err => err,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::new(
                ErrorCode::ServerError,
                format!("Webhook answered {}", status),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bakery_core::{CustomerRef, Fulfillment, LineItem};

    #[test]
    fn test_dispatch_request_wire_shape() {
        let mut order = Order::draft(
            CustomerRef {
                id: None,
                name: "Lan".into(),
                phone: "0901234567".into(),
                address: Some("12 Hang Bac".into()),
            },
            vec![LineItem::european("p-1", "Croissant", 2, Money::from_dong(50_000))],
            Fulfillment::HomeDelivery,
            Utc::now(),
        );
        order.id = "ORD-7".into();
        let shipper = Shipper {
            id: "sh-1".into(),
            name: "Tuan".into(),
            phone: "0907654321".into(),
            messaging_handle: None,
            is_active: true,
        };

        let json =
            serde_json::to_value(DispatchRequest::for_order(&order, "sh-1", Some(&shipper))).unwrap();
        assert_eq!(json["orderId"], "ORD-7");
        assert_eq!(json["customerPhone"], "0901234567");
        assert_eq!(json["amountDue"], 100_000);
        assert_eq!(json["shipperName"], "Tuan");
        assert!(json.get("shipperHandle").is_none());
    }

    #[test]
    fn test_unconfigured_webhook_is_disabled() {
        let dispatch = HttpShipperDispatch::from_config(&WebhookConfig::default()).unwrap();
        assert!(dispatch.is_none());
    }
}
