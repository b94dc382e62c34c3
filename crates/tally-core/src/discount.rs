//! # Discount Module
//!
//! Tiered quantity discount applied to every sale line.
//!
//! ## Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Quantity        Tier        Discount                                   │
//! │  ──────────────  ──────────  ─────────────────────────────────          │
//! │  < 4             None        0                                          │
//! │  4 ..= 9         Standard    10% of (quantity × unit price)             │
//! │  10 ..= 20       Bulk        20% of (quantity × unit price)             │
//! │  > 20            Bulk        20% (line is rejected by validation)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rule itself never rejects a quantity. A merge inside the aggregate
//! can push a line above the per-product cap before validation runs, so the
//! cap lives in [`crate::validation`] and nowhere else.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Smallest quantity that earns the standard discount.
pub const STANDARD_TIER_MIN_QUANTITY: i64 = 4;

/// Smallest quantity that earns the bulk discount.
pub const BULK_TIER_MIN_QUANTITY: i64 = 10;

/// Standard tier rate: 10%.
pub const STANDARD_TIER_BPS: u32 = 1000;

/// Bulk tier rate: 20%.
pub const BULK_TIER_BPS: u32 = 2000;

/// Discount tier selected by line quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountTier {
    /// Fewer than 4 units.
    None,
    /// 4 to 9 units.
    Standard,
    /// 10 units and above.
    Bulk,
}

impl DiscountTier {
    /// Selects the tier for a quantity.
    pub const fn for_quantity(quantity: i64) -> Self {
        if quantity >= BULK_TIER_MIN_QUANTITY {
            DiscountTier::Bulk
        } else if quantity >= STANDARD_TIER_MIN_QUANTITY {
            DiscountTier::Standard
        } else {
            DiscountTier::None
        }
    }

    /// Discount rate in basis points.
    pub const fn bps(&self) -> u32 {
        match self {
            DiscountTier::None => 0,
            DiscountTier::Standard => STANDARD_TIER_BPS,
            DiscountTier::Bulk => BULK_TIER_BPS,
        }
    }
}

/// Computes the discount for a line of `quantity` units at `unit_price`.
///
/// ## Example
/// ```rust
/// use tally_core::discount::line_discount;
/// use tally_core::money::Money;
///
/// let price = Money::from_cents(1000); // $10.00
/// assert_eq!(line_discount(3, price), Money::zero());
/// assert_eq!(line_discount(5, price), Money::from_cents(500));   // 10% of $50
/// assert_eq!(line_discount(20, price), Money::from_cents(4000)); // 20% of $200
/// ```
pub fn line_discount(quantity: i64, unit_price: Money) -> Money {
    let tier = DiscountTier::for_quantity(quantity);
    if tier == DiscountTier::None {
        return Money::zero();
    }

    unit_price.multiply_quantity(quantity).percentage(tier.bps())
}

// =============================================================================
// Unit Tests
// =============================================================================
