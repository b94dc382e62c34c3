//! # Domain Types
//!
//! Reference value objects and shared collection types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Reference Types                                 │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │     Branch      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title          │   │  name           │   │  name           │       │
//! │  │                 │   │                 │   │  address        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Owned elsewhere, resolved by an external identity lookup.             │
//! │  A Sale keeps only their ids.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Equality
//! All three compare and hash by `id` alone. Two `Product`s with the same id
//! and different titles are the same product.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// Reference Value Objects
// =============================================================================

/// A product sold on a sale line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Product identifier in the external catalog.
    pub id: Uuid,

    /// Display title, informational only.
    pub title: String,
}

impl Product {
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// The customer a sale was made to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
}

impl Customer {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The store branch where a sale was made.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

impl Branch {
    pub fn new(id: Uuid, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
        }
    }
}

macro_rules! identity_by_id {
    ($($ty:ty),+) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }
        )+
    };
}

identity_by_id!(Product, Customer, Branch);

// =============================================================================
// External Identity Lookup
// =============================================================================

/// Resolves product ids from an inbound request into [`Product`]s.
///
/// ## Where It Sits
/// ```text
/// CreateSaleCommand.items[].product_id
///        │
///        ▼
/// ProductLookup::resolve ← THIS TRAIT
///        │
///        ▼
/// Sale::add_item(&product, quantity, unit_price)
/// ```
///
/// The product catalog lives outside this service, so the lookup never
/// fails: an id it cannot describe still yields a `Product` with that id.
pub trait ProductLookup: Send + Sync {
    fn resolve(&self, product_id: Uuid) -> Product;
}

/// Lookup used until a catalog is wired in: keeps the id, fills a
/// placeholder title.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalIdentityProducts;

impl ProductLookup for ExternalIdentityProducts {
    fn resolve(&self, product_id: Uuid) -> Product {
        Product::new(product_id, "External product")
    }
}

// =============================================================================
// Paging
// =============================================================================

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PagedResult<T> {
    pub items: Vec<T>,

    /// 1-based page number.
    pub current_page: u32,

    pub page_size: u32,

    /// Number of rows matching the filters across all pages.
    pub total_count: u64,

    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    /// Builds a page, deriving `total_pages` from the count.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::types::PagedResult;
    ///
    /// let page = PagedResult::new(vec![1, 2, 3], 1, 3, 7);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    pub fn new(items: Vec<T>, current_page: u32, page_size: u32, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size as u64) as u32
        };

        Self {
            items,
            current_page,
            page_size,
            total_count,
            total_pages,
        }
    }

    /// Converts every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_by_id_only() {
        let id = Uuid::new_v4();
        assert_eq!(Product::new(id, "Beer"), Product::new(id, "Soda"));
        assert_ne!(Product::new(id, "Beer"), Product::new(Uuid::new_v4(), "Beer"));

        let branch_id = Uuid::new_v4();
        assert_eq!(
            Branch::new(branch_id, "Downtown", "1 Main St"),
            Branch::new(branch_id, "Uptown", "9 Hill Rd")
        );
    }

    #[test]
    fn test_hash_by_id_only() {
        let id = Uuid::new_v4();
        let mut set = HashSet::new();
        set.insert(Customer::new(id, "Ana"));
        set.insert(Customer::new(id, "Ana Maria"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_external_identity_keeps_id() {
        let id = Uuid::new_v4();
        let product = ExternalIdentityProducts.resolve(id);
        assert_eq!(product.id, id);
    }

    #[test]
    fn test_paged_result_pages() {
        let page: PagedResult<u8> = PagedResult::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 0);

        let page = PagedResult::new(vec![1u8; 10], 1, 10, 10);
        assert_eq!(page.total_pages, 1);

        let page = PagedResult::new(vec![1u8; 10], 2, 10, 21);
        assert_eq!(page.total_pages, 3);

        let mapped = page.map(|n| n as u32 * 2);
        assert_eq!(mapped.items[0], 2);
        assert_eq!(mapped.total_count, 21);
    }
}
