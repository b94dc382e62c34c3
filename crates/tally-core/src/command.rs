//! # Sale Commands
//!
//! Inbound create/update payloads, as received at the transport boundary.
//!
//! Every field has a serde default, so a body that omits `saleNumber` or
//! `customerId` still deserializes and is then reported by
//! [`crate::validation::validate_create_command`] with field-level messages,
//! instead of failing as an opaque parse error.
//!
//! ## Flow
//! ```text
//! JSON body ──► CreateSaleCommand ──► validate_create_command ──► Sale
//!                                      (plain data, pre-merge)    (post-merge)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::sale::NewSaleLine;
use crate::types::ProductLookup;

/// One requested line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct SaleLineCommand {
    pub product_id: Uuid,
    pub quantity: i64,

    /// Unit price in cents.
    #[serde(rename = "unitPriceCents")]
    pub unit_price: Money,
}

impl SaleLineCommand {
    pub fn new(product_id: Uuid, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }
}

/// Create a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CreateSaleCommand {
    pub sale_number: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub items: Vec<SaleLineCommand>,
}

impl CreateSaleCommand {
    /// Resolves each requested line's product and returns the lines in
    /// request order, duplicates included.
    pub fn lines(&self, products: &dyn ProductLookup) -> Vec<NewSaleLine> {
        self.items
            .iter()
            .map(|line| {
                NewSaleLine::new(
                    products.resolve(line.product_id),
                    line.quantity,
                    line.unit_price,
                )
            })
            .collect()
    }
}

/// Replace an existing sale's header and full item set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct UpdateSaleCommand {
    /// Target sale.
    pub id: Uuid,

    #[serde(flatten)]
    pub sale: CreateSaleCommand,
}

impl UpdateSaleCommand {
    pub fn new(id: Uuid, sale: CreateSaleCommand) -> Self {
        Self { id, sale }
    }
}
