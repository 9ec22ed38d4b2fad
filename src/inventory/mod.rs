// Inventory module
// Validation and low-stock alerting over the component store

pub mod service;

pub use service::{validate, InventoryError, InventoryResult, InventoryService, ValidationError};
