//! # Domain Types
//!
//! Core domain types used throughout the bakery console.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐                                                │
//! │  │       Order         │ 1 ──── * ┌────────────────────────────────┐    │
//! │  │  ─────────────────  │          │           LineItem             │    │
//! │  │  id (server)        │          │  quantity, unit_price          │    │
//! │  │  customer           │          │  production_status             │    │
//! │  │  fulfillment        │          │  goods: ┌─────────────────────┐│    │
//! │  │  total / deposit    │          │         │ European {product}  ││    │
//! │  │  amount_owed        │          │         │ CreamCake {note,    ││    │
//! │  │  status             │          │         │   image_urls, ...}  ││    │
//! │  │  payment_logs  ─────┼──► PaymentLogEntry └─────────────────────┘│    │
//! │  │  edit_logs     ─────┼──► EditLogEntry    └────────────────────────┘   │
//! │  └─────────────────────┘                                                │
//! │                                                                         │
//! │  Reference entities: Customer, Shipper, StaffUser, Product              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every id is assigned by the server. A draft that has not been accepted yet
//! carries an empty id; the client never invents one.
//!
//! ## Wire Shape
//! Field names are camelCase on the wire (the order API is a JavaScript
//! backend); enum values are snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::lifecycle::OrderStatus;
use crate::money::Money;
use crate::validation::validate_payment_amount;

// =============================================================================
// Enumerations
// =============================================================================

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Fulfillment {
    /// Customer collects at the shop. No shipping fee.
    #[default]
    StorePickup,
    /// A shipper brings it. The shipping fee is added to the total.
    HomeDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    Card,
}

/// Per line item kitchen progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    #[default]
    Pending,
    Completed,
}

/// The two kitchen stations. Each line item belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductionCategory {
    European,
    CreamCake,
}

impl ProductionCategory {
    pub const ALL: [ProductionCategory; 2] =
        [ProductionCategory::European, ProductionCategory::CreamCake];

    pub const fn label(&self) -> &'static str {
        match self {
            ProductionCategory::European => "European pastry",
            ProductionCategory::CreamCake => "Cream cake",
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// What a line item produces. Tagged by `category` on the wire.
///
/// Cream cakes may be custom: no catalog product, a free-text name, a note
/// for the decorator and reference photos. European pastries are always
/// catalog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Goods {
    European {
        #[serde(rename = "productId")]
        product_id: String,
        name: String,
    },
    CreamCake {
        #[serde(default, rename = "productId")]
        product_id: Option<String>,
        name: String,
        #[serde(default)]
        note: Option<String>,
        #[serde(default, rename = "imageUrls")]
        image_urls: Vec<String>,
    },
}

/// One produced good within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub production_status: ProductionStatus,
    #[serde(flatten)]
    pub goods: Goods,
}

impl LineItem {
    /// A catalog pastry.
    pub fn european(
        product_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        LineItem {
            quantity,
            unit_price,
            production_status: ProductionStatus::Pending,
            goods: Goods::European {
                product_id: product_id.into(),
                name: name.into(),
            },
        }
    }

    /// A made-to-order cream cake with no catalog product.
    pub fn custom_cream_cake(
        name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        note: Option<String>,
        image_urls: Vec<String>,
    ) -> Self {
        LineItem {
            quantity,
            unit_price,
            production_status: ProductionStatus::Pending,
            goods: Goods::CreamCake {
                product_id: None,
                name: name.into(),
                note,
                image_urls,
            },
        }
    }

    /// quantity × unit_price
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    pub fn category(&self) -> ProductionCategory {
        match self.goods {
            Goods::European { .. } => ProductionCategory::European,
            Goods::CreamCake { .. } => ProductionCategory::CreamCake,
        }
    }

    pub fn name(&self) -> &str {
        match &self.goods {
            Goods::European { name, .. } | Goods::CreamCake { name, .. } => name,
        }
    }

    /// True for cream cakes without a catalog product.
    pub fn is_custom(&self) -> bool {
        matches!(self.goods, Goods::CreamCake { product_id: None, .. })
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.production_status == ProductionStatus::Completed
    }
}

// =============================================================================
// Audit Logs
// =============================================================================

/// One recorded payment. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLogEntry {
    pub amount: Money,
    pub method: PaymentMethod,
    /// Staff member who took the money.
    pub employee: String,
    #[serde(default)]
    pub note: Option<String>,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

/// One field change made by staff. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EditLogEntry {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub employee: String,
    #[ts(as = "String")]
    pub edited_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// Customer details as captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    /// Set when the customer exists in the customer list.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// The root aggregate.
///
/// `total` and `amount_owed` are stored as the server computed them. The
/// methods below recompute them from the items so callers can check or
/// rebuild them, see [`Order::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    pub customer: CustomerRef,
    pub items: Vec<LineItem>,
    pub fulfillment: Fulfillment,
    #[ts(as = "String")]
    pub delivery_at: DateTime<Utc>,
    #[serde(default)]
    pub shipping_fee: Money,
    #[serde(default)]
    pub total: Money,
    #[serde(default)]
    pub deposit: Money,
    #[serde(default)]
    pub amount_owed: Money,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub received_by: Option<String>,
    #[serde(default)]
    pub shipper_id: Option<String>,
    #[serde(default)]
    pub payment_logs: Vec<PaymentLogEntry>,
    #[serde(default)]
    pub edit_logs: Vec<EditLogEntry>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A new draft with totals computed from `items`.
    pub fn draft(
        customer: CustomerRef,
        items: Vec<LineItem>,
        fulfillment: Fulfillment,
        delivery_at: DateTime<Utc>,
    ) -> Self {
        Order {
            id: String::new(),
            customer,
            items,
            fulfillment,
            delivery_at,
            shipping_fee: Money::zero(),
            total: Money::zero(),
            deposit: Money::zero(),
            amount_owed: Money::zero(),
            payment_method: PaymentMethod::default(),
            note: None,
            status: OrderStatus::Draft,
            created_by: None,
            received_by: None,
            shipper_id: None,
            payment_logs: Vec::new(),
            edit_logs: Vec::new(),
            created_at: None,
            updated_at: None,
        }
        .with_recomputed_totals()
    }

    #[inline]
    pub fn is_delivery(&self) -> bool {
        self.fulfillment == Fulfillment::HomeDelivery
    }

    /// Σ line item subtotals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Subtotal plus the shipping fee when the order is delivered.
    pub fn computed_total(&self) -> Money {
        if self.is_delivery() {
            self.subtotal() + self.shipping_fee
        } else {
            self.subtotal()
        }
    }

    /// max(0, total − deposit), from the stored total.
    pub fn computed_amount_owed(&self) -> Money {
        (self.total - self.deposit).floor_zero()
    }

    /// A copy with `total` and `amount_owed` rebuilt from items and deposit.
    pub fn with_recomputed_totals(mut self) -> Self {
        self.total = self.computed_total();
        self.amount_owed = self.computed_amount_owed();
        self
    }

    /// Verifies the stored totals against the items.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let expected_total = self.computed_total();
        if self.total != expected_total {
            return Err(CoreError::InconsistentTotals {
                field: "total",
                expected: expected_total,
                actual: self.total,
            });
        }

        let expected_owed = self.computed_amount_owed();
        if self.amount_owed != expected_owed {
            return Err(CoreError::InconsistentTotals {
                field: "amountOwed",
                expected: expected_owed,
                actual: self.amount_owed,
            });
        }

        Ok(())
    }

    /// Returns a copy with `payment` applied to the deposit.
    ///
    /// ## Business Rule
    /// A payment may settle at most what is still owed. Anything larger is
    /// rejected with [`CoreError::Overpayment`] rather than clipped, so the
    /// cashier notices and hands back the change.
    ///
    /// ```text
    /// total 1.000.000, deposit 400.000 → owed 600.000
    ///   pay 600.000 → deposit 1.000.000, owed 0        ✅
    ///   pay 100.000 → Overpayment { owed: 0 }          ❌
    /// ```
    pub fn apply_payment(&self, payment: PaymentLogEntry) -> CoreResult<Order> {
        validate_payment_amount(payment.amount).map_err(|e| CoreError::InvalidPaymentAmount {
            reason: e.to_string(),
        })?;

        let owed = self.computed_amount_owed();
        if payment.amount > owed {
            return Err(CoreError::Overpayment {
                amount: payment.amount,
                owed,
            });
        }

        let mut next = self.clone();
        next.deposit += payment.amount;
        next.amount_owed = next.computed_amount_owed();
        next.payment_logs.push(payment);
        Ok(next)
    }
}

// =============================================================================
// Reference Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shipper {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Handle on the messaging app the dispatch webhook posts to.
    #[serde(default)]
    pub messaging_handle: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A catalog cake or pastry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: ProductionCategory,
    pub price: Money,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Unit Tests
// =============================================================================
