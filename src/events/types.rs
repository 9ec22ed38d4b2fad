// Inventory notifications
// Fired synchronously by the store and the inventory service

use serde::Serialize;

use crate::state::Component;

/// Notification delivered to presentation-layer subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum InventoryEvent {
    /// The stored set of components was mutated; re-read everything
    InventoryChanged,

    /// Components at or below the low-stock threshold, lowest quantity first
    LowStockAlert(Vec<Component>),

    /// An operation failed; carries a human-readable message
    Error(String),
}

impl InventoryEvent {
    /// Event name as seen by subscribers on the other side of an IPC bridge
    pub fn name(&self) -> &'static str {
        match self {
            InventoryEvent::InventoryChanged => "inventoryChanged",
            InventoryEvent::LowStockAlert(_) => "lowStockAlert",
            InventoryEvent::Error(_) => "error",
        }
    }
}
