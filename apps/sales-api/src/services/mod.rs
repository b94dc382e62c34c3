//! Application services.
//!
//! This module contains the use-case layer the HTTP handlers call into.

pub mod sale_service;

pub use sale_service::SaleService;
