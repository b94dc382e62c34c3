//! # Sale List Query
//!
//! Paging and filters for `SaleRepository::list`, parsed from a flat
//! string map such as an HTTP query string.
//!
//! ## Recognized Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Key (case-insensitive)    Value              Matches                   │
//! │  ────────────────────────  ─────────────────  ──────────────────────    │
//! │  page                      integer ≥ 1        default 1                 │
//! │  pageSize                  1 ..= 100          default 10                │
//! │  productId                 UUID               any line has product      │
//! │  saleNumber                text               substring, any case       │
//! │  date                      YYYY-MM-DD or      same UTC calendar day     │
//! │                            RFC 3339                                     │
//! │  totalAmount_min / _max    decimal (100.50)   Σ line totals             │
//! │  quantity_min / _max       integer            Σ line quantities         │
//! │  discount_min / _max       decimal            Σ line discounts          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unknown keys and unparseable values are skipped, never rejected.

use chrono::{DateTime, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use tally_core::Money;

/// First page number.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size when none (or zero) is given.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size served; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parsed list filters. `None` means "do not filter on this".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilters {
    pub product_id: Option<Uuid>,
    pub sale_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub total_amount_min: Option<Money>,
    pub total_amount_max: Option<Money>,
    pub quantity_min: Option<i64>,
    pub quantity_max: Option<i64>,
    pub discount_min: Option<Money>,
    pub discount_max: Option<Money>,
}

impl SaleFilters {
    pub fn is_empty(&self) -> bool {
        *self == SaleFilters::default()
    }

    /// Applies one `key=value` pair. Returns false if it was ignored.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        match key.to_ascii_lowercase().as_str() {
            "productid" => set(&mut self.product_id, Uuid::parse_str(value).ok()),
            "salenumber" => set(
                &mut self.sale_number,
                Some(value.to_string()).filter(|v| !v.is_empty()),
            ),
            "date" => set(&mut self.date, parse_date(value)),
            "totalamount_min" => set(&mut self.total_amount_min, Money::parse_decimal(value)),
            "totalamount_max" => set(&mut self.total_amount_max, Money::parse_decimal(value)),
            "quantity_min" => set(&mut self.quantity_min, value.parse().ok()),
            "quantity_max" => set(&mut self.quantity_max, value.parse().ok()),
            "discount_min" => set(&mut self.discount_min, Money::parse_decimal(value)),
            "discount_max" => set(&mut self.discount_max, Money::parse_decimal(value)),
            _ => false,
        }
    }
}

fn set<T>(slot: &mut Option<T>, parsed: Option<T>) -> bool {
    match parsed {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.naive_utc().date())
    })
}

/// A page request plus filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleQuery {
    page: u32,
    page_size: u32,
    filters: SaleFilters,
}

impl Default for SaleQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            filters: SaleFilters::default(),
        }
    }
}

impl SaleQuery {
    /// Page `page` of `page_size` rows, clamped to valid bounds.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self::default().with_page(page).with_page_size(page_size)
    }

    /// Parses paging and filters from string pairs.
    ///
    /// ## Example
    /// ```rust
    /// use tally_db::repository::query::SaleQuery;
    ///
    /// let query = SaleQuery::from_params([
    ///     ("page", "2"),
    ///     ("pageSize", "500"),
    ///     ("saleNumber", "S-00"),
    ///     ("totalAmount_min", "100.50"),
    ///     ("colour", "red"),
    /// ]);
    ///
    /// assert_eq!(query.page(), 2);
    /// assert_eq!(query.page_size(), 100);
    /// assert_eq!(query.filters().sale_number.as_deref(), Some("S-00"));
    /// assert_eq!(query.filters().total_amount_min.map(|m| m.cents()), Some(10050));
    /// ```
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = SaleQuery::default();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key.to_ascii_lowercase().as_str() {
                "page" => match value.trim().parse::<u32>() {
                    Ok(page) => query = query.with_page(page),
                    Err(_) => debug!(key, value, "Ignoring unparseable page"),
                },
                "pagesize" | "page_size" => match value.trim().parse::<u32>() {
                    Ok(size) => query = query.with_page_size(size),
                    Err(_) => debug!(key, value, "Ignoring unparseable page size"),
                },
                _ => {
                    if !query.filters.apply(key, value) {
                        debug!(key, value, "Ignoring sale filter");
                    }
                }
            }
        }

        query
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        self
    }

    pub fn with_filters(mut self, filters: SaleFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn filters(&self) -> &SaleFilters {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = SaleQuery::from_params(Vec::<(String, String)>::new());
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 10);
        assert_eq!(query.offset(), 0);
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(SaleQuery::new(0, 0), SaleQuery::default());
        assert_eq!(SaleQuery::new(3, 1000).page_size(), MAX_PAGE_SIZE);
        assert_eq!(SaleQuery::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let product = Uuid::new_v4();
        let product_text = product.to_string();
        let query = SaleQuery::from_params([
            ("PRODUCTID", product_text.as_str()),
            ("SaleNumber", "abc"),
            ("PageSize", "5"),
        ]);

        assert_eq!(query.filters().product_id, Some(product));
        assert_eq!(query.filters().sale_number.as_deref(), Some("abc"));
        assert_eq!(query.page_size(), 5);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let query = SaleQuery::from_params([
            ("page", "two"),
            ("productId", "not-a-uuid"),
            ("date", "yesterday"),
            ("quantity_min", "1.5"),
            ("discount_max", "1.234"),
            ("saleNumber", "   "),
            ("unknown_min", "4"),
        ]);

        assert_eq!(query.page(), 1);
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1);

        let query = SaleQuery::from_params([("date", "2026-03-01")]);
        assert_eq!(query.filters().date, expected);

        let query = SaleQuery::from_params([("date", "2026-03-01T22:30:00-03:00")]);
        assert_eq!(
            query.filters().date,
            NaiveDate::from_ymd_opt(2026, 3, 1).and_then(|d| d.succ_opt())
        );
    }

    #[test]
    fn test_numeric_ranges() {
        let query = SaleQuery::from_params([
            ("totalAmount_min", "10"),
            ("totalAmount_max", "99.99"),
            ("quantity_min", "4"),
            ("quantity_max", "20"),
            ("discount_min", "0.5"),
        ]);

        let filters = query.filters();
        assert_eq!(filters.total_amount_min, Some(Money::from_cents(1000)));
        assert_eq!(filters.total_amount_max, Some(Money::from_cents(9999)));
        assert_eq!(filters.quantity_min, Some(4));
        assert_eq!(filters.quantity_max, Some(20));
        assert_eq!(filters.discount_min, Some(Money::from_cents(50)));
        assert_eq!(filters.discount_max, None);
    }
}
