//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of the Tally sales service. It contains the
//! sale aggregate, the discount rule and the validation rules as pure code
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    sales-api (axum)                             │   │
//! │  │    POST / PUT / PATCH cancel / DELETE / GET /api/sales          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   sale    │  │ discount  │  │  command  │  │ validation│  │   │
//! │  │   │   Sale    │  │   tiers   │  │  Create   │  │  reports  │  │   │
//! │  │   │ SaleItem  │  │   Money   │  │  Update   │  │  rules    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`discount`] - Tiered quantity discount
//! - [`sale`] - Sale aggregate and its lines
//! - [`types`] - Reference value objects, product lookup, paging
//! - [`command`] - Inbound create/update payloads
//! - [`validation`] - Aggregate and command rule sets
//! - [`events`] - Sale events and the dispatcher seam
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tally_core::{Branch, Customer, Money, Product, Sale};
//! use uuid::Uuid;
//!
//! let customer = Customer::new(Uuid::new_v4(), "Ana");
//! let branch = Branch::new(Uuid::new_v4(), "Downtown", "1 Main St");
//! let mut sale = Sale::new("S-0001", Utc::now(), Some(&customer), Some(&branch));
//!
//! let beer = Product::new(Uuid::new_v4(), "Beer");
//! sale.add_item(&beer, 5, Money::from_cents(1000)).unwrap();
//!
//! // 5 × $10.00 = $50.00, 10% off
//! assert_eq!(sale.total_amount().cents(), 4500);
//! assert!(sale.validate().is_valid());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod command;
pub mod discount;
pub mod error;
pub mod events;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use command::{CreateSaleCommand, SaleLineCommand, UpdateSaleCommand};
pub use error::{CoreError, CoreResult, ValidationError};
pub use events::{EventDispatcher, NullDispatcher, SaleEvent};
pub use money::Money;
pub use sale::{NewSaleLine, Sale, SaleItem};
pub use types::*;
pub use validation::{FieldFailure, ValidationReport};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum units of one product in a single sale.
///
/// Applies per line on the aggregate and per product across a request's
/// lines on commands.
pub const MAX_UNITS_PER_PRODUCT: i64 = 20;

/// Highest accepted unit price, in cents ($1,000,000,000.00).
///
/// Keeps `quantity × unit_price × bps` far inside i64 for any line that
/// passes the quantity cap.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;
