//! Sale application service.
//!
//! Sits between the HTTP handlers and the repository. Every write follows
//! the same order:
//!
//! ```text
//!  command ──► command rules ──► existence / ownership checks
//!                                        │
//!                                        ▼
//!              publish event ◄── persist ◄── aggregate rules ◄── build/apply
//! ```
//!
//! Nothing is written unless both rule sets pass.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::validation::{validate_create_command, validate_update_command};
use tally_core::{
    Branch, CoreError, CreateSaleCommand, Customer, EventDispatcher, PagedResult, ProductLookup,
    Sale, SaleEvent, UpdateSaleCommand,
};
use tally_db::{Database, SaleQuery};

use crate::error::ApiResult;

/// Sale use cases.
#[derive(Clone)]
pub struct SaleService {
    db: Database,
    events: Arc<dyn EventDispatcher>,
    products: Arc<dyn ProductLookup>,
}

impl SaleService {
    pub fn new(
        db: Database,
        events: Arc<dyn EventDispatcher>,
        products: Arc<dyn ProductLookup>,
    ) -> Self {
        SaleService { db, events, products }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a sale. Fails with a conflict if the number is taken.
    pub async fn create(&self, command: CreateSaleCommand) -> ApiResult<Sale> {
        let report = validate_create_command(&command);
        if !report.is_valid() {
            warn!(sale_number = %command.sale_number, %report, "Create sale rejected");
            return Err(CoreError::Validation(report).into());
        }

        let sales = self.db.sales();
        if sales.get_by_sale_number(&command.sale_number).await?.is_some() {
            warn!(sale_number = %command.sale_number, "Create sale rejected: number taken");
            return Err(CoreError::DuplicateSaleNumber(command.sale_number).into());
        }

        let mut sale = Sale::new(
            command.sale_number.clone(),
            command.sale_date.unwrap_or_else(Utc::now),
            Some(&customer_ref(command.customer_id)),
            Some(&branch_ref(command.branch_id)),
        );
        sale.add_items(command.lines(self.products.as_ref()))?;
        sale.validate().into_result()?;

        sales.create(&sale).await?;

        info!(
            sale_id = %sale.id(),
            sale_number = %sale.sale_number(),
            total = %sale.total_amount(),
            "Sale created"
        );
        self.events.publish(&SaleEvent::Created(sale.clone()));

        Ok(sale)
    }

    /// Replaces header fields and all items of an existing sale.
    pub async fn update(&self, command: UpdateSaleCommand) -> ApiResult<Sale> {
        let report = validate_update_command(&command);
        if !report.is_valid() {
            warn!(sale_id = %command.id, %report, "Update sale rejected");
            return Err(CoreError::Validation(report).into());
        }

        let sales = self.db.sales();
        let mut sale = sales
            .get_by_id(command.id)
            .await?
            .ok_or(CoreError::SaleNotFound(command.id))?;

        if let Some(owner) = sales.get_by_sale_number(&command.sale.sale_number).await? {
            if owner.id() != command.id {
                warn!(
                    sale_id = %command.id,
                    sale_number = %command.sale.sale_number,
                    owner = %owner.id(),
                    "Update sale rejected: number owned by another sale"
                );
                return Err(CoreError::DuplicateSaleNumber(command.sale.sale_number).into());
            }
        }

        let body = &command.sale;
        let sale_date = body.sale_date.unwrap_or(sale.sale_date());
        sale.apply_update(
            body.sale_number.clone(),
            sale_date,
            Some(&customer_ref(body.customer_id)),
            Some(&branch_ref(body.branch_id)),
            body.lines(self.products.as_ref()),
        )?;
        sale.validate().into_result()?;

        sales.update(&sale).await?;

        info!(
            sale_id = %sale.id(),
            sale_number = %sale.sale_number(),
            total = %sale.total_amount(),
            "Sale updated"
        );
        self.events.publish(&SaleEvent::Updated(sale.clone()));

        Ok(sale)
    }

    /// Marks a sale cancelled. Returns false if it does not exist.
    pub async fn cancel(&self, id: Uuid) -> ApiResult<bool> {
        let cancelled = self.db.sales().cancel(id).await?;

        if cancelled {
            info!(sale_id = %id, "Sale cancelled");
            self.events.publish(&SaleEvent::Cancelled { sale_id: id });
        } else {
            debug!(sale_id = %id, "Cancel of unknown sale");
        }

        Ok(cancelled)
    }

    /// Hard-deletes a sale and its items. Returns false if it does not exist.
    pub async fn delete(&self, id: Uuid) -> ApiResult<bool> {
        let deleted = self.db.sales().delete(id).await?;

        if deleted {
            info!(sale_id = %id, "Sale deleted");
            self.events.publish(&SaleEvent::Deleted { sale_id: id });
        } else {
            debug!(sale_id = %id, "Delete of unknown sale");
        }

        Ok(deleted)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Sale> {
        let sale = self
            .db
            .sales()
            .get_by_id(id)
            .await?
            .ok_or(CoreError::SaleNotFound(id))?;
        Ok(sale)
    }

    /// One page of sales matching the query-string filters.
    pub async fn list(&self, params: &HashMap<String, String>) -> ApiResult<PagedResult<Sale>> {
        let query = SaleQuery::from_params(params);
        debug!(
            page = query.page(),
            page_size = query.page_size(),
            filtered = !query.filters().is_empty(),
            "Listing sales"
        );

        Ok(self.db.sales().list(&query).await?)
    }
}

// Customers and branches live outside this service; only their ids are kept.
fn customer_ref(id: Uuid) -> Customer {
    Customer::new(id, String::new())
}

fn branch_ref(id: Uuid) -> Branch {
    Branch::new(id, String::new(), String::new())
}
