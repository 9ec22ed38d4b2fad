// Inventory service
// Business validation and low-stock alerting on top of the store

use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{InventoryConfig, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::events::{EventBus, InventoryEvent};
use crate::state::{Component, Store, StoreError, UNSAVED_ID};

/// Input rejected before reaching the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required fields are empty: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Quantity cannot be negative: {0}")]
    NegativeQuantity(i64),
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Inventory database could not be initialized: {0}")]
    InitFailed(#[source] StoreError),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Check required fields and the quantity of a component before it is stored
pub fn validate(
    name: &str,
    category: &str,
    quantity: i64,
    location: &str,
) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = [("name", name), ("category", category), ("location", location)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    if quantity < 0 {
        return Err(ValidationError::NegativeQuantity(quantity));
    }
    Ok(())
}

/// The surface presentation code talks to.
///
/// Shares the store's event bus: subscribers see the store's
/// `InventoryChanged`/`Error` events and the service's `LowStockAlert` and
/// validation errors on one stream.
pub struct InventoryService {
    store: Arc<Store>,
    events: EventBus,
    low_stock_threshold: i64,
}

impl InventoryService {
    pub fn new(store: Arc<Store>) -> Self {
        let events = store.events().clone();
        Self {
            store,
            events,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_config(store: Arc<Store>, config: &InventoryConfig) -> Self {
        Self {
            low_stock_threshold: config.low_stock_threshold,
            ..Self::new(store)
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn initialize(&self) -> InventoryResult<()> {
        self.store.initialize().map_err(|e| {
            self.events.emit(InventoryEvent::Error(
                "Could not initialize the inventory database".to_string(),
            ));
            InventoryError::InitFailed(e)
        })
    }

    fn reject(&self, err: ValidationError) -> InventoryError {
        log::warn!("Rejected component: {}", err);
        self.events.emit(InventoryEvent::Error(err.to_string()));
        err.into()
    }

    // ==================== MUTATIONS ====================

    /// Validate and store a new component. Returns its id.
    pub fn add_component(
        &self,
        name: &str,
        category: &str,
        quantity: i64,
        location: &str,
        acquired_on: NaiveDate,
    ) -> InventoryResult<i64> {
        validate(name, category, quantity, location).map_err(|e| self.reject(e))?;

        let component = Component::new(UNSAVED_ID, name, category, quantity, location, acquired_on);
        let id = self.store.add(&component)?;

        if component.is_low_stock(self.low_stock_threshold) {
            self.check_low_stock();
        }
        Ok(id)
    }

    /// Validate and replace a stored component. Returns false if its id is unknown.
    pub fn update_component(&self, component: &Component) -> InventoryResult<bool> {
        validate(
            &component.name,
            &component.category,
            component.quantity,
            &component.location,
        )
        .map_err(|e| self.reject(e))?;

        let updated = self.store.update(component)?;
        if updated && component.is_low_stock(self.low_stock_threshold) {
            self.check_low_stock();
        }
        Ok(updated)
    }

    pub fn remove_component(&self, id: i64) -> InventoryResult<bool> {
        Ok(self.store.delete(id)?)
    }

    /// Apply a quantity change. Returns the new quantity, or `None` for an unknown id.
    ///
    /// `reason` is a free-text annotation; it is logged, not stored.
    pub fn adjust_quantity(&self, id: i64, delta: i64, reason: &str) -> InventoryResult<Option<i64>> {
        let adjusted = self.store.adjust_quantity(id, delta)?;

        if adjusted.is_some() {
            log::debug!("Adjusted component {} by {} ({})", id, delta, reason);
            match self.store.get_by_id(id) {
                Ok(Some(component)) if component.is_low_stock(self.low_stock_threshold) => {
                    self.check_low_stock()
                }
                Ok(_) => {}
                Err(e) => log::warn!("Could not re-read component {}: {}", id, e),
            }
        }
        Ok(adjusted)
    }

    // ==================== READS ====================

    pub fn get_all_components(&self) -> InventoryResult<Vec<Component>> {
        Ok(self.store.get_all()?)
    }

    pub fn search_components(&self, text: &str) -> InventoryResult<Vec<Component>> {
        Ok(self.store.search(text)?)
    }

    pub fn get_component_by_id(&self, id: i64) -> InventoryResult<Option<Component>> {
        Ok(self.store.get_by_id(id)?)
    }

    /// Components at or below `threshold`, lowest first.
    /// Emits `LowStockAlert` with the whole set when it is non-empty.
    pub fn get_low_stock_alert(&self, threshold: i64) -> InventoryResult<Vec<Component>> {
        let low_stock = self.store.get_low_stock(threshold)?;
        if !low_stock.is_empty() {
            self.events
                .emit(InventoryEvent::LowStockAlert(low_stock.clone()));
        }
        Ok(low_stock)
    }

    fn check_low_stock(&self) {
        if let Err(e) = self.get_low_stock_alert(self.low_stock_threshold) {
            log::warn!("Low-stock check failed: {}", e);
        }
    }
}
