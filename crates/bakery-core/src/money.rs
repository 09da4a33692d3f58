//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer đồng                                             │
//! │    The shop prices in VND, which has no minor unit in circulation.      │
//! │    Every amount is a whole number of đồng held in an i64.               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bakery_core::money::Money;
//!
//! let croissant = Money::from_dong(50_000);
//! let line = croissant * 2;
//! assert_eq!(line.dong(), 100_000);
//!
//! // Amount owed never goes below zero
//! let owed = (Money::from_dong(400_000) - Money::from_dong(500_000)).floor_zero();
//! assert!(owed.is_zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole đồng.
///
/// ## Design Decisions
/// - **i64 (signed)**: Intermediate results such as `total - deposit` may be
///   negative before they are floored
/// - **Single field tuple struct**: serializes as a bare JSON number, which is
///   what the order API sends
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.unit_price × quantity ──► LineItem.subtotal                   │
/// │                                          │                              │
/// │                  Σ subtotals + shipping_fee (delivery only)             │
/// │                                          ▼                              │
/// │                                     Order.total                         │
/// │                                          │                              │
/// │                     max(0, total − deposit) ──► Order.amount_owed       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole đồng.
    #[inline]
    pub const fn from_dong(dong: i64) -> Self {
        Money(dong)
    }

    /// Returns the value in whole đồng.
    #[inline]
    pub const fn dong(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use bakery_core::money::Money;
    ///
    /// let unit_price = Money::from_dong(50_000);
    /// assert_eq!(unit_price.multiply_quantity(2).dong(), 100_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Clamps negative values to zero.
    ///
    /// Used for the amount still owed: a customer who prepaid more than the
    /// total owes nothing, never a negative amount.
    #[inline]
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates: totals are recomputed from server data, and a
// malformed order must not panic the console.

/// Display groups thousands with dots, the way receipts print VND.
///
/// ## Note
/// This is for logs and notices. The frontend formats for its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} ₫", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dong() {
        let money = Money::from_dong(300_000);
        assert_eq!(money.dong(), 300_000);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_dong(400_000).to_string(), "400.000 ₫");
        assert_eq!(Money::from_dong(1_000_000).to_string(), "1.000.000 ₫");
        assert_eq!(Money::from_dong(999).to_string(), "999 ₫");
        assert_eq!(Money::from_dong(0).to_string(), "0 ₫");
        assert_eq!(Money::from_dong(-25_000).to_string(), "-25.000 ₫");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_dong(1000);
        let b = Money::from_dong(500);

        assert_eq!((a + b).dong(), 1500);
        assert_eq!((a - b).dong(), 500);
        assert_eq!((a * 3).dong(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_dong(200);
        assert_eq!(c.dong(), 1300);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100_000, 300_000]
            .into_iter()
            .map(Money::from_dong)
            .sum();
        assert_eq!(total.dong(), 400_000);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_dong(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(1_000).dong(), i64::MAX);
        assert_eq!((huge * -1_000).dong(), i64::MIN);
        assert_eq!((huge + huge + huge).dong(), i64::MAX);
        assert_eq!((Money::from_dong(i64::MIN) - Money::from_dong(1)).dong(), i64::MIN);

        let total: Money = [Money::from_dong(i64::MAX), Money::from_dong(1)]
            .into_iter()
            .sum();
        assert_eq!(total.dong(), i64::MAX);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_dong(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_dong(42).floor_zero().dong(), 42);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_dong(1).is_positive());
        assert!(Money::from_dong(-1).is_negative());
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&Money::from_dong(50_000)).unwrap();
        assert_eq!(json, "50000");

        let back: Money = serde_json::from_str("300000").unwrap();
        assert_eq!(back.dong(), 300_000);
    }
}
