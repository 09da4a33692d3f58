//! HTTP client for the order REST API

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use bakery_core::Order;
use bakery_sync::CredentialSource;

use super::envelope::{decode, decode_ack, decode_failure};
use super::{OrderApi, OrderPatch, PaymentRequest, PaymentState, ShipperAssignment};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::ApiConfig;

/// [`OrderApi`] over HTTP with a per-request timeout and bearer auth.
pub struct HttpOrderApi {
    client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpOrderApi {
    /// Creates a client from the `[api]` section.
    ///
    /// The credential is read on every request, so a login or logout takes
    /// effect without rebuilding the client.
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialSource>) -> ApiResult<Self> {
        let timeout = config.timeout();
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::internal(format!("Invalid API base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            credentials,
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::internal(format!("API base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build authorization header value
    fn auth_header(&self) -> Option<String> {
        self.credentials
            .current()
            .map(|credential| format!("Bearer {}", credential.expose()))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<Vec<u8>> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "API request");

        let mut request = self.client.request(method, url);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            return Err(decode_failure(status, &body));
        }
        Ok(body.to_vec())
    }

    fn map_error(&self, err: reqwest::Error) -> ApiError {
        let err = ApiError::from(err);
        if err.code == ErrorCode::Timeout {
            ApiError::timeout(self.timeout)
        } else {
            err
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn list_orders(&self) -> ApiResult<Vec<Order>> {
        let body = self.send::<()>(Method::GET, &["orders"], None).await?;
        decode(&body)
    }

    async fn create_order(&self, order: &Order) -> ApiResult<Order> {
        let body = self.send(Method::POST, &["orders"], Some(order)).await?;
        decode(&body)
    }

    async fn update_order(&self, id: &str, patch: &OrderPatch) -> ApiResult<Order> {
        let body = self.send(Method::PUT, &["orders", id], Some(patch)).await?;
        decode(&body)
    }

    async fn delete_order(&self, id: &str) -> ApiResult<()> {
        let body = self.send::<()>(Method::DELETE, &["orders", id], None).await?;
        decode_ack(&body)
    }

    async fn record_payment(&self, id: &str, payment: &PaymentRequest) -> ApiResult<PaymentState> {
        let body = self
            .send(Method::POST, &["orders", id, "payments"], Some(payment))
            .await?;
        decode(&body)
    }

    async fn assign_shipper(&self, id: &str, assignment: &ShipperAssignment) -> ApiResult<Order> {
        let body = self
            .send(Method::PUT, &["orders", id, "shipper"], Some(assignment))
            .await?;
        decode(&body)
    }
}
