//! Response bodies.
//!
//! Request bodies are the command types from `tally_core::command`; the
//! types here only shape what goes back to the client. Money is sent as
//! integer cents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use tally_core::{Sale, SaleItem};

/// `{ success, message, data }` wrapper for write responses.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiEnvelope {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// A sale as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub total_amount_cents: i64,
    pub is_cancelled: bool,
    pub items: Vec<SaleItemResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_amount_cents: i64,
}

impl From<&SaleItem> for SaleItemResponse {
    fn from(item: &SaleItem) -> Self {
        SaleItemResponse {
            id: item.id(),
            product_id: item.product_id(),
            quantity: item.quantity(),
            unit_price_cents: item.unit_price().cents(),
            discount_cents: item.discount().cents(),
            total_amount_cents: item.total_amount().cents(),
        }
    }
}

impl From<&Sale> for SaleResponse {
    fn from(sale: &Sale) -> Self {
        SaleResponse {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer_id: sale.customer_id(),
            branch_id: sale.branch_id(),
            total_amount_cents: sale.total_amount().cents(),
            is_cancelled: sale.is_cancelled(),
            items: sale.items().iter().map(SaleItemResponse::from).collect(),
        }
    }
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        SaleResponse::from(&sale)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CancelResponse {
    pub id: Uuid,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub deleted: bool,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`
    pub status: String,
    /// `"connected"` or `"unavailable"`
    pub database: String,
}
