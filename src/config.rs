// Runtime configuration
use std::path::PathBuf;

use crate::state::StoreLocation;

/// Environment variable overriding the database file
pub const ENV_DB_PATH: &str = "STOCKROOM_DB_PATH";

/// Environment variable overriding the low-stock threshold
pub const ENV_LOW_STOCK_THRESHOLD: &str = "STOCKROOM_LOW_STOCK_THRESHOLD";

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Inventory configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Where the database lives
    pub location: StoreLocation,
    /// Quantity at or below which a component is low on stock
    pub low_stock_threshold: i64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::AppData,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl InventoryConfig {
    /// Defaults overridden by `STOCKROOM_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.location = StoreLocation::File(PathBuf::from(path));
        }

        if let Some(raw) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            match raw.trim().parse::<i64>() {
                Ok(threshold) if threshold >= 0 => config.low_stock_threshold = threshold,
                _ => log::warn!(
                    "Ignoring invalid {}={:?}, using {}",
                    ENV_LOW_STOCK_THRESHOLD,
                    raw,
                    DEFAULT_LOW_STOCK_THRESHOLD
                ),
            }
        }

        config
    }

    pub fn with_location(mut self, location: StoreLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}
