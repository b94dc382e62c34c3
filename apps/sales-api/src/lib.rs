//! # Tally Sales API
//!
//! JSON/HTTP server for creating, updating, cancelling, deleting and
//! querying sales.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sales API Layers                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  SaleService   │  │  tally-db                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • POST / PUT   │─►│ • create       │─►│ • SaleRepository           ││
//! │  │ • PATCH cancel │  │ • update       │  │ • SQLite (WAL)             ││
//! │  │ • DELETE / GET │  │ • cancel/delete│  │                            ││
//! │  └────────────────┘  │ • get / list   │  └────────────────────────────┘│
//! │                      └───────┬────────┘                                │
//! │                              │ SaleEvent                               │
//! │                      ┌───────▼────────┐                                │
//! │                      │ EventDispatcher│  TracingEventDispatcher        │
//! │                      │  (log only)    │  in production                 │
//! │                      └────────────────┘                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Environment variables:
//! - `TALLY_PORT` - HTTP port (default: 8080)
//! - `TALLY_BIND_ADDR` - Interface (default: 0.0.0.0)
//! - `TALLY_DATABASE_PATH` - SQLite file (default: ./tally.db)
//! - `TALLY_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `TALLY_LOG_FILTER` - Log directives when `RUST_LOG` is unset

pub mod config;
pub mod dto;
pub mod error;
pub mod events;
pub mod routes;
pub mod services;

use std::sync::Arc;

use tally_core::{EventDispatcher, ExternalIdentityProducts, ProductLookup};
use tally_db::Database;

// Re-exports
pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use events::TracingEventDispatcher;
pub use routes::router;
pub use services::SaleService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: SaleService,
}

impl AppState {
    /// Production wiring: events go to the log, products resolve by id only.
    pub fn new(db: Database) -> Self {
        Self::with_collaborators(
            db,
            Arc::new(TracingEventDispatcher),
            Arc::new(ExternalIdentityProducts),
        )
    }

    pub fn with_collaborators(
        db: Database,
        events: Arc<dyn EventDispatcher>,
        products: Arc<dyn ProductLookup>,
    ) -> Self {
        AppState {
            service: SaleService::new(db, events, products),
        }
    }
}
