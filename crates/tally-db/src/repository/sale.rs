//! # Sale Repository
//!
//! Database operations for sales and their items.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Writes                                       │
//! │                                                                         │
//! │  create(sale)                                                          │
//! │     └── BEGIN → INSERT sales → INSERT sale_items × n → COMMIT          │
//! │                                                                         │
//! │  update(sale)                                                          │
//! │     └── BEGIN → UPDATE sales → DELETE sale_items                       │
//! │               → INSERT sale_items × n → COMMIT                         │
//! │                                                                         │
//! │  cancel(id)                                                            │
//! │     └── load → Sale::cancel() → UPDATE sales.is_cancelled              │
//! │                                                                         │
//! │  delete(id)                                                            │
//! │     └── DELETE sales (items cascade)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never read from storage. Items are loaded through
//! `SaleItem::restore`, which recomputes each discount from quantity and
//! price.

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::query::{SaleFilters, SaleQuery};
use tally_core::{Money, PagedResult, Sale, SaleItem};

const SALE_COLUMNS: &str =
    "s.id, s.sale_number, s.sale_date, s.customer_id, s.branch_id, s.is_cancelled";

/// Per-sale item aggregates, joined so list filters can range over them.
const FILTERED_FROM: &str = r#"
    FROM sales s
    LEFT JOIN (
        SELECT sale_id,
               SUM(quantity) AS total_quantity,
               SUM(discount_cents) AS total_discount_cents,
               SUM(quantity * unit_price_cents - discount_cents) AS total_amount_cents
        FROM sale_items
        GROUP BY sale_id
    ) t ON t.sale_id = s.id
    WHERE 1 = 1"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a sale and its items in one transaction.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` on `sale_number` when another sale owns
    /// the number.
    pub async fn create(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id(), sale_number = %sale.sale_number(), "Inserting sale");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, sale_date, customer_id, branch_id,
                is_cancelled, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(sale.id().to_string())
        .bind(sale.sale_number())
        .bind(sale.sale_date())
        .bind(sale.customer_id().to_string())
        .bind(sale.branch_id().to_string())
        .bind(sale.is_cancelled())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| sale_number_conflict(e.into(), sale))?;

        insert_items(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Rewrites the header and replaces the full item set in one
    /// transaction.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if no sale has this id
    /// - `DbError::UniqueViolation` if the new number belongs to another sale
    pub async fn update(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id(), items = sale.items().len(), "Updating sale");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET sale_number = ?1,
                sale_date = ?2,
                customer_id = ?3,
                branch_id = ?4,
                is_cancelled = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(sale.sale_number())
        .bind(sale.sale_date())
        .bind(sale.customer_id().to_string())
        .bind(sale.branch_id().to_string())
        .bind(sale.is_cancelled())
        .bind(Utc::now())
        .bind(sale.id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| sale_number_conflict(e.into(), sale))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale.id().to_string()));
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale.id().to_string())
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, sale).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Loads the sale, cancels it and persists the flag.
    ///
    /// ## Returns
    /// `false` if no sale has this id.
    pub async fn cancel(&self, id: Uuid) -> DbResult<bool> {
        let Some(mut sale) = self.get_by_id(id).await? else {
            return Ok(false);
        };

        sale.cancel();
        debug!(id = %id, "Cancelling sale");

        sqlx::query("UPDATE sales SET is_cancelled = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(sale.is_cancelled())
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(true)
    }

    /// Hard-deletes the sale. Its items go with it.
    ///
    /// ## Returns
    /// `false` if no sale has this id.
    pub async fn delete(&self, id: Uuid) -> DbResult<bool> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Sale>> {
        let record = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => self.hydrate_one(record).await.map(Some),
            None => Ok(None),
        }
    }

    /// Gets a sale by its exact sale number.
    pub async fn get_by_sale_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let record = sqlx::query_as::<_, SaleRecord>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE s.sale_number = ?1"
        ))
        .bind(sale_number)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => self.hydrate_one(record).await.map(Some),
            None => Ok(None),
        }
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Returns one page of sales matching the query's filters, newest sale
    /// date first.
    pub async fn list(&self, query: &SaleQuery) -> DbResult<PagedResult<Sale>> {
        let filters = query.filters();
        debug!(
            page = query.page(),
            page_size = query.page_size(),
            ?filters,
            "Listing sales"
        );

        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        count_builder.push(FILTERED_FROM);
        push_filters(&mut count_builder, filters);
        let total: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut page_builder = QueryBuilder::<Sqlite>::new("SELECT ");
        page_builder.push(SALE_COLUMNS);
        page_builder.push(FILTERED_FROM);
        push_filters(&mut page_builder, filters);
        page_builder.push(" ORDER BY s.sale_date DESC, s.sale_number ASC LIMIT ");
        page_builder.push_bind(query.page_size() as i64);
        page_builder.push(" OFFSET ");
        page_builder.push_bind(query.offset());

        let records = page_builder
            .build_query_as::<SaleRecord>()
            .fetch_all(&self.pool)
            .await?;

        let sales = self.hydrate(records).await?;

        Ok(PagedResult::new(
            sales,
            query.page(),
            query.page_size(),
            total.max(0) as u64,
        ))
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    async fn hydrate_one(&self, record: SaleRecord) -> DbResult<Sale> {
        let mut sales = self.hydrate(vec![record]).await?;
        sales
            .pop()
            .ok_or_else(|| DbError::Internal("sale lost during hydration".to_string()))
    }

    /// Loads the items of every record in one query and rebuilds the
    /// aggregates in record order.
    async fn hydrate(&self, records: Vec<SaleRecord>) -> DbResult<Vec<Sale>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, sale_id, product_id, quantity, unit_price_cents FROM sale_items WHERE sale_id IN (",
        );
        let mut ids = builder.separated(", ");
        for record in &records {
            ids.push_bind(record.id.clone());
        }
        ids.push_unseparated(") ORDER BY rowid");

        let item_records = builder
            .build_query_as::<SaleItemRecord>()
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in item_records {
            let sale_id = item.sale_id.clone();
            items_by_sale
                .entry(sale_id)
                .or_default()
                .push(item.into_item()?);
        }

        records
            .into_iter()
            .map(|record| {
                let items = items_by_sale.remove(&record.id).unwrap_or_default();
                record.into_sale(items)
            })
            .collect()
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn insert_items(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    for item in sale.items() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity, unit_price_cents, discount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(item.id().to_string())
        .bind(sale.id().to_string())
        .bind(item.product_id().to_string())
        .bind(item.quantity())
        .bind(item.unit_price().cents())
        .bind(item.discount().cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Names the sale number in a unique violation raised by the `sales` table.
fn sale_number_conflict(err: DbError, sale: &Sale) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field.contains("sale_number") => {
            DbError::duplicate("sale_number", sale.sale_number())
        }
        other => other,
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &SaleFilters) {
    if let Some(product_id) = filters.product_id {
        builder.push(
            " AND EXISTS (SELECT 1 FROM sale_items i WHERE i.sale_id = s.id AND i.product_id = ",
        );
        builder.push_bind(product_id.to_string());
        builder.push(")");
    }

    if let Some(sale_number) = &filters.sale_number {
        builder.push(" AND instr(lower(s.sale_number), lower(");
        builder.push_bind(sale_number.clone());
        builder.push(")) > 0");
    }

    if let Some(date) = filters.date {
        let start: DateTime<Utc> = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);
        builder.push(" AND s.sale_date >= ");
        builder.push_bind(start);
        builder.push(" AND s.sale_date < ");
        builder.push_bind(end);
    }

    push_range(
        builder,
        "COALESCE(t.total_amount_cents, 0)",
        filters.total_amount_min.map(|m| m.cents()),
        filters.total_amount_max.map(|m| m.cents()),
    );
    push_range(
        builder,
        "COALESCE(t.total_quantity, 0)",
        filters.quantity_min,
        filters.quantity_max,
    );
    push_range(
        builder,
        "COALESCE(t.total_discount_cents, 0)",
        filters.discount_min.map(|m| m.cents()),
        filters.discount_max.map(|m| m.cents()),
    );
}

fn push_range(
    builder: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    min: Option<i64>,
    max: Option<i64>,
) {
    if let Some(min) = min {
        builder.push(format!(" AND {column} >= "));
        builder.push_bind(min);
    }
    if let Some(max) = max {
        builder.push(format!(" AND {column} <= "));
        builder.push_bind(max);
    }
}

fn parse_id(column: &str, value: &str) -> DbResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| DbError::corrupt(column, value))
}

// =============================================================================
// Record Types
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRecord {
    id: String,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: String,
    branch_id: String,
    is_cancelled: bool,
}

impl SaleRecord {
    fn into_sale(self, items: Vec<SaleItem>) -> DbResult<Sale> {
        Ok(Sale::restore(
            parse_id("sales.id", &self.id)?,
            self.sale_number,
            self.sale_date,
            parse_id("sales.customer_id", &self.customer_id)?,
            parse_id("sales.branch_id", &self.branch_id)?,
            self.is_cancelled,
            items,
        ))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleItemRecord {
    id: String,
    sale_id: String,
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl SaleItemRecord {
    fn into_item(self) -> DbResult<SaleItem> {
        Ok(SaleItem::restore(
            parse_id("sale_items.id", &self.id)?,
            parse_id("sale_items.sale_id", &self.sale_id)?,
            parse_id("sale_items.product_id", &self.product_id)?,
            self.quantity,
            Money::from_cents(self.unit_price_cents),
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use tally_core::{Branch, Customer, Product};

    async fn repo() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    fn sale_on(number: &str, date: DateTime<Utc>) -> Sale {
        let customer = Customer::new(Uuid::new_v4(), "Ana");
        let branch = Branch::new(Uuid::new_v4(), "Downtown", "1 Main St");
        Sale::new(number, date, Some(&customer), Some(&branch))
    }

    fn march(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn dollars(d: i64) -> Money {
        Money::from_cents(d * 100)
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let repo = repo().await;
        let mut sale = sale_on("S-0001", march(1));
        let beer = Product::new(Uuid::new_v4(), "Beer");
        let soda = Product::new(Uuid::new_v4(), "Soda");
        sale.add_item(&beer, 5, dollars(10)).unwrap();
        sale.add_item(&soda, 3, dollars(20)).unwrap();

        repo.create(&sale).await.unwrap();

        let loaded = repo.get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(loaded, sale);
        assert_eq!(loaded.total_amount(), dollars(105));
        assert_eq!(loaded.items()[0].product_id(), beer.id);
    }

    #[tokio::test]
    async fn test_get_missing_sale() {
        let repo = repo().await;
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(repo.get_by_sale_number("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_sale_number() {
        let repo = repo().await;
        let sale = sale_on("S-0042", march(2));
        repo.create(&sale).await.unwrap();

        let found = repo.get_by_sale_number("S-0042").await.unwrap().unwrap();
        assert_eq!(found.id(), sale.id());
    }

    #[tokio::test]
    async fn test_duplicate_sale_number_is_rejected() {
        let repo = repo().await;
        repo.create(&sale_on("S-0001", march(1))).await.unwrap();

        let err = repo.create(&sale_on("S-0001", march(2))).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value } if field == "sale_number" && value == "S-0001"
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_items() {
        let repo = repo().await;
        let mut sale = sale_on("S-0001", march(1));
        sale.add_item(&Product::new(Uuid::new_v4(), "Beer"), 5, dollars(10))
            .unwrap();
        repo.create(&sale).await.unwrap();

        let wine = Product::new(Uuid::new_v4(), "Wine");
        sale.apply_update(
            "S-0001-B",
            march(3),
            Some(&Customer::new(Uuid::new_v4(), "Bruno")),
            Some(&Branch::new(Uuid::new_v4(), "Uptown", "9 Hill Rd")),
            vec![tally_core::NewSaleLine::new(wine.clone(), 10, dollars(30))],
        )
        .unwrap();
        repo.update(&sale).await.unwrap();

        let loaded = repo.get_by_id(sale.id()).await.unwrap().unwrap();
        assert_eq!(loaded.sale_number(), "S-0001-B");
        assert_eq!(loaded.items().len(), 1);
        assert_eq!(loaded.items()[0].product_id(), wine.id);
        // 10 × $30 = $300, 20% off
        assert_eq!(loaded.total_amount(), dollars(240));
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let repo = repo().await;
        let err = repo.update(&sale_on("S-0001", march(1))).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_to_taken_number() {
        let repo = repo().await;
        repo.create(&sale_on("S-0001", march(1))).await.unwrap();
        let mut other = sale_on("S-0002", march(1));
        repo.create(&other).await.unwrap();

        other
            .apply_update("S-0001", march(1), None, None, Vec::new())
            .unwrap();
        let err = repo.update(&other).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_cancel() {
        let repo = repo().await;
        let sale = sale_on("S-0001", march(1));
        repo.create(&sale).await.unwrap();

        assert!(repo.cancel(sale.id()).await.unwrap());
        assert!(repo
            .get_by_id(sale.id())
            .await
            .unwrap()
            .unwrap()
            .is_cancelled());

        // Cancelling twice still finds the sale
        assert!(repo.cancel(sale.id()).await.unwrap());
        assert!(!repo.cancel(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_items() {
        let repo = repo().await;
        let mut sale = sale_on("S-0001", march(1));
        sale.add_item(&Product::new(Uuid::new_v4(), "Beer"), 5, dollars(10))
            .unwrap();
        repo.create(&sale).await.unwrap();

        assert!(repo.delete(sale.id()).await.unwrap());
        assert!(repo.get_by_id(sale.id()).await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(!repo.delete(sale.id()).await.unwrap());
    }

    /// Three sales:
    /// - S-0001 on Mar 1: beer × 5 @ $10  → total $45, qty 5,  discount $5
    /// - S-0002 on Mar 2: soda × 3 @ $20  → total $60, qty 3,  discount $0
    /// - X-0003 on Mar 3: beer × 10 @ $10 → total $80, qty 10, discount $20
    async fn seeded() -> (SaleRepository, Product, Product) {
        let repo = repo().await;
        let beer = Product::new(Uuid::new_v4(), "Beer");
        let soda = Product::new(Uuid::new_v4(), "Soda");

        let mut a = sale_on("S-0001", march(1));
        a.add_item(&beer, 5, dollars(10)).unwrap();
        let mut b = sale_on("S-0002", march(2));
        b.add_item(&soda, 3, dollars(20)).unwrap();
        let mut c = sale_on("X-0003", march(3));
        c.add_item(&beer, 10, dollars(10)).unwrap();

        for sale in [&a, &b, &c] {
            repo.create(sale).await.unwrap();
        }
        (repo, beer, soda)
    }

    fn numbers(page: &PagedResult<Sale>) -> Vec<&str> {
        page.items.iter().map(Sale::sale_number).collect()
    }

    #[tokio::test]
    async fn test_list_paging() {
        let (repo, _, _) = seeded().await;

        let page = repo.list(&SaleQuery::new(1, 2)).await.unwrap();
        assert_eq!(numbers(&page), vec!["X-0003", "S-0002"]);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);

        let page = repo.list(&SaleQuery::new(2, 2)).await.unwrap();
        assert_eq!(numbers(&page), vec!["S-0001"]);
        assert_eq!(page.items[0].items().len(), 1);

        let page = repo.list(&SaleQuery::new(5, 2)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn test_list_filter_by_product() {
        let (repo, beer, soda) = seeded().await;

        let query = SaleQuery::from_params([("productId", beer.id.to_string())]);
        let page = repo.list(&query).await.unwrap();
        assert_eq!(numbers(&page), vec!["X-0003", "S-0001"]);

        let query = SaleQuery::from_params([("productId", soda.id.to_string())]);
        assert_eq!(repo.list(&query).await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn test_list_filter_by_sale_number_substring() {
        let (repo, _, _) = seeded().await;

        let page = repo.list(&SaleQuery::from_params([("saleNumber", "s-00")])).await.unwrap();
        assert_eq!(numbers(&page), vec!["S-0002", "S-0001"]);
    }

    #[tokio::test]
    async fn test_list_filter_by_date() {
        let (repo, _, _) = seeded().await;

        let page = repo.list(&SaleQuery::from_params([("date", "2026-03-02")])).await.unwrap();
        assert_eq!(numbers(&page), vec!["S-0002"]);
    }

    #[tokio::test]
    async fn test_list_numeric_ranges() {
        let (repo, _, _) = seeded().await;

        let query = SaleQuery::from_params([("totalAmount_min", "50"), ("totalAmount_max", "70")]);
        assert_eq!(numbers(&repo.list(&query).await.unwrap()), vec!["S-0002"]);

        let query = SaleQuery::from_params([("quantity_min", "5")]);
        assert_eq!(
            numbers(&repo.list(&query).await.unwrap()),
            vec!["X-0003", "S-0001"]
        );

        let query = SaleQuery::from_params([("discount_max", "0")]);
        assert_eq!(numbers(&repo.list(&query).await.unwrap()), vec!["S-0002"]);
    }

    #[tokio::test]
    async fn test_list_ignores_unknown_filters() {
        let (repo, _, _) = seeded().await;

        let query = SaleQuery::from_params([("colour", "red"), ("productId", "garbage")]);
        assert_eq!(repo.list(&query).await.unwrap().total_count, 3);
    }
}
