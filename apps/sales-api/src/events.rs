//! Event dispatcher backed by `tracing`.
//!
//! Sale events are observational only: each one becomes a single log line
//! and is then dropped. Nothing is queued, retried or persisted.

use tally_core::{EventDispatcher, SaleEvent};
use tracing::{info, warn};

/// Logs every published event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventDispatcher;

impl EventDispatcher for TracingEventDispatcher {
    fn publish(&self, event: &SaleEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(
                event = event.name(),
                sale_id = %event.sale_id(),
                %payload,
                "Sale event published"
            ),
            Err(e) => warn!(
                event = event.name(),
                sale_id = %event.sale_id(),
                error = %e,
                "Sale event payload could not be serialized"
            ),
        }
    }
}
