// Event module
// Observer surface for inventory changes, low-stock alerts and errors

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventCallback, SubscriptionId};
pub use types::InventoryEvent;
