//! # Sale Events
//!
//! Notifications raised after a write succeeds.
//!
//! ```text
//! create ──► SaleEvent::Created(sale)
//! update ──► SaleEvent::Updated(sale)
//! cancel ──► SaleEvent::Cancelled { sale_id }
//! delete ──► SaleEvent::Deleted { sale_id }
//!                  │
//!                  ▼
//!          EventDispatcher::publish   (fire and forget)
//! ```
//!
//! Publishing has no delivery guarantee, no retry and no persistence. A
//! dispatcher that drops every event is a valid dispatcher.

use serde::Serialize;
use uuid::Uuid;

use crate::sale::Sale;

/// Something that happened to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum SaleEvent {
    Created(Sale),
    Updated(Sale),
    #[serde(rename_all = "camelCase")]
    Cancelled { sale_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Deleted { sale_id: Uuid },
}

impl SaleEvent {
    /// Stable event name, e.g. `"SaleCreated"`.
    pub fn name(&self) -> &'static str {
        match self {
            SaleEvent::Created(_) => "SaleCreated",
            SaleEvent::Updated(_) => "SaleUpdated",
            SaleEvent::Cancelled { .. } => "SaleCancelled",
            SaleEvent::Deleted { .. } => "SaleDeleted",
        }
    }

    pub fn sale_id(&self) -> Uuid {
        match self {
            SaleEvent::Created(sale) | SaleEvent::Updated(sale) => sale.id(),
            SaleEvent::Cancelled { sale_id } | SaleEvent::Deleted { sale_id } => *sale_id,
        }
    }
}

/// Receives sale events. Implementations must not block the caller on
/// delivery and must not fail the write that raised the event.
pub trait EventDispatcher: Send + Sync {
    fn publish(&self, event: &SaleEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatcher;

impl EventDispatcher for NullDispatcher {
    fn publish(&self, _event: &SaleEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_names_and_ids() {
        let sale = Sale::new("S-0001", Utc::now(), None, None);
        let created = SaleEvent::Created(sale.clone());
        assert_eq!(created.name(), "SaleCreated");
        assert_eq!(created.sale_id(), sale.id());

        let id = Uuid::new_v4();
        let deleted = SaleEvent::Deleted { sale_id: id };
        assert_eq!(deleted.name(), "SaleDeleted");
        assert_eq!(deleted.sale_id(), id);
    }

    #[test]
    fn test_event_serialization() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(SaleEvent::Cancelled { sale_id: id }).unwrap();
        assert_eq!(json["type"], "cancelled");
        assert_eq!(json["data"]["saleId"], id.to_string());

        let sale = Sale::new("S-0001", Utc::now(), None, None);
        let json = serde_json::to_value(SaleEvent::Updated(sale)).unwrap();
        assert_eq!(json["data"]["saleNumber"], "S-0001");
    }

    #[test]
    fn test_null_dispatcher_accepts_events() {
        let dispatcher: &dyn EventDispatcher = &NullDispatcher;
        dispatcher.publish(&SaleEvent::Deleted {
            sale_id: Uuid::new_v4(),
        });
    }
}
