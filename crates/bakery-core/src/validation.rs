//! # Validation Module
//!
//! Input validation for orders and payments before they leave the console.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command (console)                                             │
//! │  ├── THIS MODULE: shape checks (names, phone, quantities, prices)       │
//! │  └── lifecycle / payment rules (bakery_core::lifecycle, Order)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Order API (server)                                            │
//! │  └── Authoritative: its returned entity replaces ours                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bakery_core::validation::{validate_phone, validate_quantity};
//!
//! assert!(validate_phone("0901 234 567").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Goods, LineItem, Order};
use crate::{MAX_ITEM_QUANTITY, MAX_NOTE_LENGTH, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name: non-empty, at most 120 characters.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if name.chars().count() > 120 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 120,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits, spaces, dashes and one leading `+` only
/// - 8 to 15 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces and dashes".to_string(),
        });
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(8..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!("must have 8 to 15 digits, got {}", digits),
        });
    }

    Ok(())
}

/// Validates a free-text note (order note, decorator note).
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    match note {
        Some(text) if text.chars().count() > MAX_NOTE_LENGTH => Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LENGTH,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity: 1..=MAX_ITEM_QUANTITY.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price. Free items are allowed, negative prices are not.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "unit price".to_string(),
        });
    }
    Ok(())
}

/// Validates a payment amount.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates one line item.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_quantity(item.quantity)?;
    validate_unit_price(item.unit_price)?;

    if item.name().trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item name".to_string(),
        });
    }

    if let Goods::CreamCake { note, .. } = &item.goods {
        validate_note(note.as_deref())?;
    }

    Ok(())
}

/// Validates a full item list: 1..=MAX_ORDER_ITEMS items, each valid.
///
/// Used on its own when an update replaces the items of an order.
pub fn validate_items(items: &[LineItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    items.iter().try_for_each(validate_line_item)
}

/// Validates an order before it is sent for creation or update.
///
/// ## Rules
/// - Customer name and phone are valid
/// - Delivery orders have an address
/// - 1..=MAX_ORDER_ITEMS line items, each valid
/// - Shipping fee and deposit are not negative
pub fn validate_order(order: &Order) -> ValidationResult<()> {
    validate_customer_name(&order.customer.name)?;
    validate_phone(&order.customer.phone)?;
    validate_note(order.note.as_deref())?;

    if order.is_delivery()
        && order
            .customer
            .address
            .as_deref()
            .map_or(true, |a| a.trim().is_empty())
    {
        return Err(ValidationError::Required {
            field: "delivery address".to_string(),
        });
    }

    validate_items(&order.items)?;

    if order.shipping_fee.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "shipping fee".to_string(),
        });
    }

    if order.deposit.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "deposit".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
