//! # Validation Module
//!
//! Business rule validation for sales, at two layers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command (plain request data, BEFORE any merge)               │
//! │  ├── validate_create_command / validate_update_command                 │
//! │  ├── required header fields, at least one line                         │
//! │  ├── per line: product id, 0 < quantity ≤ 20, 0 < unit price ≤ cap     │
//! │  └── cross-item: Σ quantity per product ≤ 20                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Aggregate (constructed Sale, AFTER merge)                    │
//! │  ├── validate_sale (also Sale::validate)                               │
//! │  └── per line: product id, 0 < quantity ≤ 20, unit price ≤ cap         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE sale_number                                                │
//! │  └── Foreign key sale_items → sales                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two rule sets stay independent: a request listing one product twice
//! with 15 + 15 units passes every per-line check, and only the command
//! layer's grouped rule sees it before the aggregate merges it into one
//! line of 30.
//!
//! Rule sets never fail. They return a [`ValidationReport`]; the caller
//! decides whether an invalid report becomes a rejection.
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_item_quantity, validate_sale_number};
//!
//! assert!(validate_sale_number("S-0001").is_ok());
//! assert!(validate_item_quantity(21).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::command::{CreateSaleCommand, SaleLineCommand, UpdateSaleCommand};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::sale::Sale;
use crate::{MAX_UNITS_PER_PRODUCT, MAX_UNIT_PRICE_CENTS};

/// Result type for single-value validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Validation Report
// =============================================================================

/// One failed rule, located by field path (`"items[1].quantity"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

/// Outcome of a rule set: every failure found, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationReport {
    failures: Vec<FieldFailure>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, error: ValidationError) {
        self.failures.push(FieldFailure {
            field: field.into(),
            message: error.to_string(),
        });
    }

    /// Records the failure of a single-value validator, if it failed.
    pub fn check(&mut self, field: impl Into<String>, result: ValidationResult<()>) {
        if let Err(error) = result {
            self.push(field, error);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<FieldFailure> {
        self.failures
    }

    /// True if any failure carries exactly `message`.
    pub fn has_message(&self, message: &str) -> bool {
        self.failures.iter().any(|f| f.message == message)
    }

    /// `Ok` when valid, otherwise [`CoreError::Validation`] with this report.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", failure.field, failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

// =============================================================================
// Single-Value Validators
// =============================================================================

/// Validates a sale number.
///
/// ## Rules
/// - Must not be empty or whitespace
pub fn validate_sale_number(sale_number: &str) -> ValidationResult<()> {
    if sale_number.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "saleNumber".to_string(),
        });
    }

    Ok(())
}

/// Validates a reference id (customer, branch, product).
///
/// ## Rules
/// - Must not be the nil UUID
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_reference_id;
/// use uuid::Uuid;
///
/// assert!(validate_reference_id("customerId", Uuid::new_v4()).is_ok());
/// assert!(validate_reference_id("customerId", Uuid::nil()).is_err());
/// ```
pub fn validate_reference_id(field: &str, id: Uuid) -> ValidationResult<()> {
    if id.is_nil() {
        return Err(ValidationError::EmptyIdentifier {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_UNITS_PER_PRODUCT (20)
///
/// ## Where It Runs
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Request line {productId, quantity: 21}                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_item_quantity(21) ← THIS FUNCTION (command layer)            │
/// │       │                                                                 │
/// │       ├── qty <= 0? → "The quantity must be greater than zero."        │
/// │       │                                                                 │
/// │       ├── qty > 20? → "The quantity cannot be greater than 20."        │
/// │       │                                                                 │
/// │       └── OK → grouped rule, then Sale::add_item                       │
/// │                                                                         │
/// │  Runs again per merged line inside validate_sale (aggregate layer).    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_item_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::QuantityNotPositive);
    }

    if quantity > MAX_UNITS_PER_PRODUCT {
        return Err(ValidationError::quantity_too_large());
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be positive (> 0). Free lines are not allowed.
/// - Must not exceed MAX_UNIT_PRICE_CENTS
pub fn validate_unit_price(unit_price: Money) -> ValidationResult<()> {
    if !unit_price.is_positive() {
        return Err(ValidationError::UnitPriceNotPositive);
    }

    validate_unit_price_ceiling(unit_price)
}

/// Upper bound only. The aggregate runs this on built lines.
pub fn validate_unit_price_ceiling(unit_price: Money) -> ValidationResult<()> {
    if unit_price.cents() > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::unit_price_too_large());
    }

    Ok(())
}

/// Validates the summed quantity per product across a request's lines.
///
/// ## Rules
/// - For every product id, Σ quantity ≤ MAX_UNITS_PER_PRODUCT (20)
///
/// Reports the first offending product in request order.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_grouped_quantities;
/// use uuid::Uuid;
///
/// let beer = Uuid::new_v4();
/// assert!(validate_grouped_quantities([(beer, 10), (beer, 10)]).is_ok());
/// assert!(validate_grouped_quantities([(beer, 15), (beer, 15)]).is_err());
/// ```
pub fn validate_grouped_quantities<I>(lines: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = (Uuid, i64)>,
{
    // Vec keeps first-seen order; requests hold a handful of lines
    let mut totals: Vec<(Uuid, i64)> = Vec::new();
    for (product_id, quantity) in lines {
        match totals.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => totals.push((product_id, quantity)),
        }
    }

    match totals
        .into_iter()
        .find(|(_, total)| *total > MAX_UNITS_PER_PRODUCT)
    {
        Some((product_id, total)) => Err(ValidationError::GroupedQuantityTooLarge {
            product_id,
            total,
            max: MAX_UNITS_PER_PRODUCT,
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Aggregate Rule Set
// =============================================================================

/// Validates a constructed sale.
///
/// ## Rules
/// - saleNumber required
/// - customerId, branchId not nil
/// - each line: productId not nil, 0 < quantity ≤ 20, unit price ≤ cap
///
/// Runs after merging, so two added lines of 15 + 15 for one product show
/// up here as a single line of 30.
pub fn validate_sale(sale: &Sale) -> ValidationReport {
    let mut report = ValidationReport::new();

    report.check("saleNumber", validate_sale_number(sale.sale_number()));
    report.check(
        "customerId",
        validate_reference_id("customerId", sale.customer_id()),
    );
    report.check("branchId", validate_reference_id("branchId", sale.branch_id()));

    for (i, item) in sale.items().iter().enumerate() {
        report.check(
            format!("items[{i}].productId"),
            validate_reference_id("productId", item.product_id()),
        );
        report.check(
            format!("items[{i}].quantity"),
            validate_item_quantity(item.quantity()),
        );
        report.check(
            format!("items[{i}].unitPriceCents"),
            validate_unit_price_ceiling(item.unit_price()),
        );
    }

    report
}

// =============================================================================
// Command Rule Sets
// =============================================================================

/// Validates a create request before any sale is built.
///
/// ## Rules
/// - saleNumber required, saleDate required
/// - customerId, branchId not nil
/// - at least one line
/// - each line: productId not nil, 0 < quantity ≤ 20, 0 < unit price ≤ cap
/// - Σ quantity per product ≤ 20
pub fn validate_create_command(command: &CreateSaleCommand) -> ValidationReport {
    let mut report = ValidationReport::new();

    report.check("saleNumber", validate_sale_number(&command.sale_number));
    if command.sale_date.is_none() {
        report.push(
            "saleDate",
            ValidationError::Required {
                field: "saleDate".to_string(),
            },
        );
    }
    report.check(
        "customerId",
        validate_reference_id("customerId", command.customer_id),
    );
    report.check(
        "branchId",
        validate_reference_id("branchId", command.branch_id),
    );

    if command.items.is_empty() {
        report.push(
            "items",
            ValidationError::NoItems {
                field: "items".to_string(),
            },
        );
        return report;
    }

    for (i, line) in command.items.iter().enumerate() {
        check_line(&mut report, i, line);
    }

    report.check(
        "items",
        validate_grouped_quantities(command.items.iter().map(|l| (l.product_id, l.quantity))),
    );

    report
}

/// Validates an update request: the target id plus every create rule.
pub fn validate_update_command(command: &UpdateSaleCommand) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.check("id", validate_reference_id("id", command.id));

    let sale_report = validate_create_command(&command.sale);
    report.failures.extend(sale_report.into_failures());
    report
}

fn check_line(report: &mut ValidationReport, index: usize, line: &SaleLineCommand) {
    report.check(
        format!("items[{index}].productId"),
        validate_reference_id("productId", line.product_id),
    );
    report.check(
        format!("items[{index}].quantity"),
        validate_item_quantity(line.quantity),
    );
    report.check(
        format!("items[{index}].unitPriceCents"),
        validate_unit_price(line.unit_price),
    );
}

// =============================================================================
// Unit Tests
// =============================================================================
