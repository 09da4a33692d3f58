//! # API Error Type
//!
//! Unified error type for console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Console                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Policy Error? ─── CoreError::InvalidTransition ────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  HTTP Error? ───── reqwest::Error (timeout) ──── ApiError       │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Server said no? ─ envelope { success: false } ─ CommandResult  │  │
//! │  │         │                                     { success: false }│  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────── Store write ─────────── CommandResult     │  │
//! │  │                                               { success: true } │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands never return `Err`. Every failure ends up as an [`ApiError`]
//! inside a failed `CommandResult` plus one failure notice.

use serde::Serialize;
use std::time::Duration;

use bakery_core::{CoreError, ValidationError};
use bakery_store::StoreError;

/// API error carried by a failed command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INVALID_TRANSITION",
///   "message": "Cannot move order from draft to out_for_delivery"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Result type for API calls and command bodies.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400 / local checks)
    ValidationError,

    /// Status change not reachable from the current status
    InvalidTransition,

    /// Line items still pending
    ProductionIncomplete,

    /// Payment rejected (non-positive amount, overpayment)
    PaymentError,

    /// Credential missing or refused (401 / 403)
    Unauthorized,

    /// The request did not complete in time
    Timeout,

    /// Could not reach the server
    Network,

    /// The server answered with something we could not read
    InvalidResponse,

    /// The server reported a failure (5xx or `success: false`)
    ServerError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(after: Duration) -> Self {
        ApiError::new(
            ErrorCode::Timeout,
            format!("Request timed out after {}s", after.as_secs()),
        )
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, message)
            }
            CoreError::ProductionIncomplete { .. } => {
                ApiError::new(ErrorCode::ProductionIncomplete, message)
            }
            CoreError::IndexOutOfRange { .. } => ApiError::internal(message),
            CoreError::Overpayment { .. } | CoreError::InvalidPaymentAmount { .. } => {
                ApiError::new(ErrorCode::PaymentError, message)
            }
            CoreError::InconsistentTotals { .. } => {
                tracing::error!(error = %message, "Order totals are inconsistent");
                ApiError::invalid_response(message)
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts store errors to API errors.
///
/// A store error after a successful API call means the server's answer did
/// not fit the local entity shape.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store rejected server data");
        ApiError::invalid_response(err.to_string())
    }
}

/// Converts HTTP client errors to API errors.
///
/// Timeouts are recognised here; callers that know the configured limit
/// replace the message with [`ApiError::timeout`].
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::new(ErrorCode::Timeout, "Request timed out")
        } else if err.is_connect() {
            ApiError::new(ErrorCode::Network, format!("Cannot reach server: {}", err))
        } else if err.is_decode() {
            ApiError::invalid_response(err.to_string())
        } else if err.is_builder() {
            ApiError::internal(err.to_string())
        } else {
            ApiError::new(ErrorCode::Network, err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_response(format!("Malformed response body: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
