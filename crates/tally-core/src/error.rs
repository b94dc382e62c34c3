//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Rejections: conflict, not found, invalid input │
//! │  └── ValidationError  - One broken rule on one field                   │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  sales-api errors (in app)                                             │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → ValidationReport → CoreError → ApiError       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-rule failures are never raised while validating: the rule sets
//! collect [`ValidationError`]s into a [`ValidationReport`] and the caller
//! decides whether that becomes a [`CoreError::Validation`] rejection.

use thiserror::Error;
use uuid::Uuid;

use crate::money::Money;
use crate::validation::ValidationReport;
use crate::{MAX_UNITS_PER_PRODUCT, MAX_UNIT_PRICE_CENTS};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No sale exists with the given id.
    ///
    /// ## When This Occurs
    /// - Update, cancel or delete of an id that was never created
    /// - The sale was hard-deleted earlier
    #[error("Sale with ID {0} not found")]
    SaleNotFound(Uuid),

    /// Another sale already owns this sale number.
    ///
    /// ## When This Occurs
    /// - Create with a number that is already taken
    /// - Update that renames a sale to a number owned by a different sale
    #[error("Sale with number {0} already exists")]
    DuplicateSaleNumber(String),

    /// A line quantity update with a non-positive value.
    #[error("Quantity must be greater than zero, got {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// One or more validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationReport),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single broken validation rule.
///
/// The quantity and price messages are part of the public contract: HTTP
/// clients match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// An identifier equals the nil UUID.
    #[error("{field} must not be empty")]
    EmptyIdentifier { field: String },

    /// A collection must hold at least one entry.
    #[error("{field} must contain at least one item")]
    NoItems { field: String },

    /// Line quantity is zero or negative.
    #[error("The quantity must be greater than zero.")]
    QuantityNotPositive,

    /// Line quantity exceeds the per-product cap.
    #[error("The quantity cannot be greater than {max}.")]
    QuantityTooLarge { max: i64 },

    /// Unit price is zero or negative.
    #[error("The unit price must be greater than zero.")]
    UnitPriceNotPositive,

    /// Unit price above [`MAX_UNIT_PRICE_CENTS`](crate::MAX_UNIT_PRICE_CENTS).
    #[error("The unit price cannot be greater than {max}.")]
    UnitPriceTooLarge { max: Money },

    /// Summed quantity of one product across the request's lines exceeds
    /// the per-product cap.
    #[error("The grouped quantity cannot be greater than {max}.")]
    GroupedQuantityTooLarge {
        product_id: Uuid,
        total: i64,
        max: i64,
    },
}

impl ValidationError {
    /// Per-product cap violation with the crate-wide cap.
    pub fn quantity_too_large() -> Self {
        ValidationError::QuantityTooLarge {
            max: MAX_UNITS_PER_PRODUCT,
        }
    }

    pub fn unit_price_too_large() -> Self {
        ValidationError::UnitPriceTooLarge {
            max: Money::from_cents(MAX_UNIT_PRICE_CENTS),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateSaleNumber("S-001".to_string());
        assert_eq!(err.to_string(), "Sale with number S-001 already exists");

        let err = CoreError::SaleNotFound(Uuid::nil());
        assert_eq!(
            err.to_string(),
            "Sale with ID 00000000-0000-0000-0000-000000000000 not found"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::quantity_too_large().to_string(),
            "The quantity cannot be greater than 20."
        );
        assert_eq!(
            ValidationError::QuantityNotPositive.to_string(),
            "The quantity must be greater than zero."
        );
        assert_eq!(
            ValidationError::UnitPriceNotPositive.to_string(),
            "The unit price must be greater than zero."
        );
        let grouped = ValidationError::GroupedQuantityTooLarge {
            product_id: Uuid::nil(),
            total: 30,
            max: 20,
        };
        assert_eq!(
            grouped.to_string(),
            "The grouped quantity cannot be greater than 20."
        );
        let required = ValidationError::Required {
            field: "saleNumber".to_string(),
        };
        assert_eq!(required.to_string(), "saleNumber is required");
    }

    #[test]
    fn test_validation_report_converts_to_core_error() {
        let mut report = ValidationReport::new();
        report.push("saleNumber", ValidationError::Required {
            field: "saleNumber".to_string(),
        });
        let core_err: CoreError = report.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
