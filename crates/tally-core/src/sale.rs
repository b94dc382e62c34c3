//! # Sale Aggregate
//!
//! The `Sale` root and its owned `SaleItem` lines.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale (aggregate root)                                                  │
//! │  ├── id, sale_number, sale_date                                         │
//! │  ├── customer_id, branch_id          (references, never owned)          │
//! │  ├── is_cancelled                                                       │
//! │  └── items: Vec<SaleItem>            (at most one line per product)     │
//! │        ├── product_id, quantity, unit_price                             │
//! │        └── discount                  (derived, never set directly)      │
//! │                                                                         │
//! │  total_amount = Σ items.total_amount                                    │
//! │  item.total_amount = quantity × unit_price − discount                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Semantics
//! Adding a product that already has a line raises that line's quantity. Two
//! `add_item` calls for product X with 5 and 15 units leave ONE line of 20
//! units priced at the 20% tier. The existing line's unit price is kept.
//!
//! ## Lifecycle
//! ```text
//!   Open ──cancel()──► Cancelled
//!    │                    │
//!    └────── delete (storage, either state) ──────►  gone
//! ```
//!
//! Mutators do not validate. Call [`Sale::validate`] before persisting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::discount::line_discount;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Branch, Customer, Product};
use crate::validation::{validate_sale, ValidationReport};

// =============================================================================
// Sale Item
// =============================================================================

/// One product line inside a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    unit_price: Money,
    discount: Money,
}

impl SaleItem {
    /// Creates a line for `product` on sale `sale_id`.
    ///
    /// Quantity and price are not checked here; the validation rule set
    /// reports non-positive values.
    pub fn new(sale_id: Uuid, product: &Product, quantity: i64, unit_price: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_id,
            product_id: product.id,
            quantity,
            unit_price,
            discount: line_discount(quantity, unit_price),
        }
    }

    /// Rebuilds a stored line. The discount is recomputed, never read back.
    pub fn restore(
        id: Uuid,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        Self {
            id,
            sale_id,
            product_id,
            quantity,
            unit_price,
            discount: line_discount(quantity, unit_price),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sale_id(&self) -> Uuid {
        self.sale_id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// quantity × unit price, before discount.
    pub fn gross_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// quantity × unit price − discount.
    pub fn total_amount(&self) -> Money {
        self.gross_amount() - self.discount
    }

    /// Sets a new quantity and recomputes the discount.
    ///
    /// ## Errors
    /// [`CoreError::InvalidQuantity`] when `new_quantity <= 0`. The line is
    /// left untouched in that case.
    pub fn update_quantity(&mut self, new_quantity: i64) -> CoreResult<()> {
        if new_quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                quantity: new_quantity,
            });
        }

        self.quantity = new_quantity;
        self.discount = line_discount(new_quantity, self.unit_price);
        Ok(())
    }
}

// =============================================================================
// New Sale Line
// =============================================================================

/// A line to be added to a sale: product, quantity and unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub product: Product,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewSaleLine {
    pub fn new(product: Product, quantity: i64, unit_price: Money) -> Self {
        Self {
            product,
            quantity,
            unit_price,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The sale aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    id: Uuid,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: Uuid,
    branch_id: Uuid,
    items: Vec<SaleItem>,
    is_cancelled: bool,
}

impl Sale {
    /// Opens a new sale with no items.
    ///
    /// A missing customer or branch leaves the matching id nil instead of
    /// failing; [`Sale::validate`] reports it.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use tally_core::sale::Sale;
    /// use tally_core::types::{Branch, Customer};
    /// use uuid::Uuid;
    ///
    /// let customer = Customer::new(Uuid::new_v4(), "Ana");
    /// let branch = Branch::new(Uuid::new_v4(), "Downtown", "1 Main St");
    /// let sale = Sale::new("S-0001", Utc::now(), Some(&customer), Some(&branch));
    ///
    /// assert!(sale.items().is_empty());
    /// assert!(!sale.is_cancelled());
    /// assert!(sale.total_amount().is_zero());
    /// ```
    pub fn new(
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer: Option<&Customer>,
        branch: Option<&Branch>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_number: sale_number.into(),
            sale_date,
            customer_id: customer.map(|c| c.id).unwrap_or_default(),
            branch_id: branch.map(|b| b.id).unwrap_or_default(),
            items: Vec::new(),
            is_cancelled: false,
        }
    }

    /// Rebuilds a stored sale.
    pub fn restore(
        id: Uuid,
        sale_number: String,
        sale_date: DateTime<Utc>,
        customer_id: Uuid,
        branch_id: Uuid,
        is_cancelled: bool,
        items: Vec<SaleItem>,
    ) -> Self {
        Self {
            id,
            sale_number,
            sale_date,
            customer_id,
            branch_id,
            items,
            is_cancelled,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn branch_id(&self) -> Uuid {
        self.branch_id
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    /// Line for `product_id`, if present.
    pub fn item_for(&self, product_id: Uuid) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Adds a line, or raises the quantity of the product's existing line.
    ///
    /// ## Errors
    /// [`CoreError::InvalidQuantity`] when a merge would leave the existing
    /// line at zero or fewer units. Nothing changes in that case.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i64,
        unit_price: Money,
    ) -> CoreResult<()> {
        let sale_id = self.id;
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(quantity);
                existing.update_quantity(merged)
            }
            None => {
                self.items
                    .push(SaleItem::new(sale_id, product, quantity, unit_price));
                Ok(())
            }
        }
    }

    /// Applies [`Sale::add_item`] to each line in order.
    ///
    /// Stops at the first failing line; lines before it stay applied.
    pub fn add_items<I>(&mut self, lines: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = NewSaleLine>,
    {
        for line in lines {
            self.add_item(&line.product, line.quantity, line.unit_price)?;
        }
        Ok(())
    }

    /// Removes the product's line. Absent product is a no-op.
    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product_id != product_id);
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Sum of every line total. Zero for an empty sale.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(SaleItem::total_amount).sum()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(SaleItem::quantity).sum()
    }

    /// Sum of every line discount.
    pub fn total_discount(&self) -> Money {
        self.items.iter().map(SaleItem::discount).sum()
    }

    /// Marks the sale cancelled. Calling it again changes nothing.
    pub fn cancel(&mut self) {
        self.is_cancelled = true;
    }

    /// Replaces header fields and the full item set.
    ///
    /// Items are cleared and re-added one by one, so duplicate products in
    /// `lines` merge exactly as they do on creation. The sale id and the
    /// cancelled flag are kept.
    pub fn apply_update<I>(
        &mut self,
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer: Option<&Customer>,
        branch: Option<&Branch>,
        lines: I,
    ) -> CoreResult<()>
    where
        I: IntoIterator<Item = NewSaleLine>,
    {
        self.sale_number = sale_number.into();
        self.sale_date = sale_date;
        self.customer_id = customer.map(|c| c.id).unwrap_or_default();
        self.branch_id = branch.map(|b| b.id).unwrap_or_default();
        self.clear_items();
        self.add_items(lines)
    }

    /// Runs the aggregate rule set against the current state.
    pub fn validate(&self) -> ValidationReport {
        validate_sale(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
