//! # Money Module
//!
//! Integer-cent amounts for prices, discounts and totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Discount tiers are whole percentages of quantity × unit price.         │
//! │                                                                         │
//! │    f64:    0.1 × 3 × 19.90 = 5.970000000000001                          │
//! │    cents:  (5970 × 1000 + 5000) / 10000 = 597                           │
//! │                                                                         │
//! │  Every amount stays an i64 count of cents from request to storage.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Arithmetic saturates at the i64 bounds. Validation caps unit prices well
//! below them, so saturation only shows on rows written outside the service.
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1000); // $10.00
//! let gross = price.multiply_quantity(5); // $50.00
//! assert_eq!(gross.percentage(1000).cents(), 500); // 10% = $5.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// An amount in cents.
///
/// ```text
/// SaleLineCommand.unitPriceCents ──► SaleItem.unit_price
///                                        │
///                                        ├──► discount (tiered rule)
///                                        ▼
///                            SaleItem.total_amount ──► Sale.total_amount
/// ```
///
/// Serializes as a bare integer, so `{"unitPriceCents": 1990}` reads as
/// $19.90.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

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

    /// Gross amount of `quantity` units at this price.
    #[inline]
    pub const fn multiply_quantity(&self, quantity: i64) -> Self {
        Money(self.0.saturating_mul(quantity))
    }

    /// `bps` basis points of this amount (1000 bps = 10%), rounded half-up
    /// to the cent.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(20000).percentage(2000).cents(), 4000);
    /// assert_eq!(Money::from_cents(45).percentage(1000).cents(), 5);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        // i128: cents × bps can exceed i64
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(part.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Parses a decimal amount such as `"100"`, `"100.5"` or `"100.50"`.
    ///
    /// Used by the list filters, where callers speak in currency units.
    /// More than two fractional digits is rejected, not rounded.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("100.50"), Some(Money::from_cents(10050)));
    /// assert_eq!(Money::parse_decimal("-2.5"), Some(Money::from_cents(-250)));
    /// assert_eq!(Money::parse_decimal("1.234"), None);
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Money> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || fraction.len() > 2 || !all_digits(whole) || !all_digits(fraction) {
            return None;
        }

        let whole: i64 = whole.parse().ok()?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };

        let cents = whole.checked_mul(100)?.checked_add(fraction)?;
        Some(Money(if negative { -cents } else { cents }))
    }
}

/// `$10.99`, `-$5.50`
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
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
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
