//! # Error Types
//!
//! Domain-specific error types for bakery-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bakery-core errors (this file)                                         │
//! │  ├── CoreError        - Lifecycle and payment rule violations           │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  bakery-store errors                                                    │
//! │  └── StoreError       - Patches that cannot be merged                   │
//! │                                                                         │
//! │  bakery-sync errors                                                     │
//! │  └── SyncError        - Channel / credential / transport failures       │
//! │                                                                         │
//! │  console errors (in app)                                                │
//! │  └── ApiError         - What a command result carries                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → CommandResult          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, status, index)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::lifecycle::OrderStatus;
use crate::money::Money;
use crate::types::ProductionCategory;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// Every one of them leaves the input order untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The requested status is not reachable from the current status.
    ///
    /// ## When This Occurs
    /// - Skipping a stage (`draft → out_for_delivery`)
    /// - Moving backwards (`ready → in_production`)
    /// - Leaving a terminal status (`completed`, `delivery_failed`)
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Tried to mark an order ready while some line item is still pending.
    ///
    /// ## User Workflow
    /// ```text
    /// Front desk presses "Ready"
    ///      │
    ///      ▼
    /// advance_status(order, Ready)
    ///      │
    ///      ▼
    /// cream cake station has not finished
    ///      │
    ///      ▼
    /// ProductionIncomplete { categories: [CreamCake] }
    ///      │
    ///      ▼
    /// Notice: "Production is not finished for: Cream cake"
    /// ```
    #[error("Production is not finished for: {}", join_labels(.categories))]
    ProductionIncomplete { categories: Vec<ProductionCategory> },

    /// A line item index does not exist on the order.
    ///
    /// ## When This Occurs
    /// Only on a programming error (a stale index held across an order
    /// update). UI-driven calls always index items they just rendered.
    #[error("Line item index {index} out of range (order has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A payment larger than what the customer still owes.
    #[error("Payment of {amount} exceeds the amount owed ({owed})")]
    Overpayment { amount: Money, owed: Money },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Stored totals disagree with what the line items add up to.
    #[error("Order {field} is {actual} but should be {expected}")]
    InconsistentTotals {
        field: &'static str,
        expected: Money,
        actual: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn join_labels(categories: &[ProductionCategory]) -> String {
    categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before an order is sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
