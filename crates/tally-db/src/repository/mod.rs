//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SaleService (sales-api)                                               │
//! │       │                                                                 │
//! │       │  db.sales().get_by_id(id)                                      │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create / update          (transactional, items replaced)          │
//! │  ├── cancel / delete          (→ bool: was the sale found?)            │
//! │  ├── get_by_id / get_by_sale_number                                    │
//! │  └── list(&SaleQuery)         (filters + paging)                       │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories take and return `tally-core` aggregates. Row structs stay
//! private to this module tree.

pub mod query;
pub mod sale;
