// Stockroom - Electronic Component Inventory
// Module declarations

pub mod config;
pub mod events;
pub mod inventory;
pub mod state;

pub use config::InventoryConfig;
pub use events::{EventBus, InventoryEvent, SubscriptionId};
pub use inventory::{InventoryError, InventoryResult, InventoryService, ValidationError};
pub use state::{Component, Store, StoreError, StoreLocation};

/// Install the `env_logger` backend, honouring `RUST_LOG` (default `info`).
/// Later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Build an inventory service for `config` without opening the database.
///
/// `StoreLocation::AppData` uses `Store::shared`, so every service on the app
/// data file shares one connection and one event stream.
pub fn build(config: &InventoryConfig) -> InventoryService {
    InventoryService::with_config(Store::for_location(&config.location), config)
}

/// Build and initialize an inventory service from `config`.
/// Callers subscribe through `InventoryService::events`.
pub fn open(config: &InventoryConfig) -> InventoryResult<InventoryService> {
    let service = build(config);
    service.initialize()?;

    log::info!("Stockroom initialized successfully");
    Ok(service)
}
