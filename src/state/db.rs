// SQLite store: connection ownership, schema, and event-reporting operations
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use thiserror::Error;

use super::models::Component;
use super::queries;
use super::storage::{default_db_path, ensure_parent_dir, StorageError};
use crate::events::{EventBus, InventoryEvent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Database is not initialized")]
    NotInitialized,
    #[error("Quantity of component {id} cannot go negative ({current} + {delta})")]
    NegativeQuantity { id: i64, current: i64, delta: i64 },
    #[error("Quantity of component {id} overflows ({current} + {delta})")]
    QuantityOverflow { id: i64, current: i64, delta: i64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where the inventory database lives
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreLocation {
    /// `inventory.db` in the platform's per-application data directory
    #[default]
    AppData,
    /// An explicit database file, parent directories created on open
    File(PathBuf),
    /// Private in-memory database, gone once closed
    InMemory,
}

static SHARED: OnceLock<Arc<Store>> = OnceLock::new();

/// Sole owner of the inventory database connection.
///
/// All SQL runs while holding the connection lock, and events are emitted only
/// after it is released, so subscribers may call back into the store.
pub struct Store {
    location: StoreLocation,
    conn: Mutex<Option<Connection>>,
    events: EventBus,
}

impl Store {
    pub fn new(location: StoreLocation) -> Self {
        Self::with_events(location, EventBus::new())
    }

    pub fn with_events(location: StoreLocation, events: EventBus) -> Self {
        Self {
            location,
            conn: Mutex::new(None),
            events,
        }
    }

    /// Process-wide store backed by the app data directory.
    ///
    /// Created on first call; concurrent first calls observe the same instance.
    /// The connection is opened by `initialize`, not here. The static is never
    /// dropped, so call `close_shared` before exit to close it.
    pub fn shared() -> Arc<Store> {
        Arc::clone(SHARED.get_or_init(|| {
            log::debug!("Creating shared inventory store");
            Arc::new(Store::new(StoreLocation::AppData))
        }))
    }

    /// Store for `location`. `AppData` always resolves to the shared store so
    /// the app data file has a single connection.
    pub fn for_location(location: &StoreLocation) -> Arc<Store> {
        match location {
            StoreLocation::AppData => Store::shared(),
            other => Arc::new(Store::new(other.clone())),
        }
    }

    /// Close the shared store's connection, if it was ever created and opened
    pub fn close_shared() -> StoreResult<()> {
        match SHARED.get() {
            Some(store) => store.close(),
            None => Ok(()),
        }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the database (creating it if absent) and make sure the schema exists.
    /// Calling this on an open store does nothing.
    pub fn initialize(&self) -> StoreResult<()> {
        let result = {
            let mut guard = self.lock();
            if guard.is_some() {
                log::debug!("Inventory database already open");
                return Ok(());
            }
            open_connection(&self.location).map(|conn| {
                *guard = Some(conn);
            })
        };

        match &result {
            Ok(()) => log::info!("Inventory database opened ({:?})", self.location),
            Err(e) => self.report("Could not open inventory database", e),
        }
        result
    }

    /// Close the connection. The store can be initialized again afterwards.
    pub fn close(&self) -> StoreResult<()> {
        let conn = self.lock().take();
        match conn {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StoreError::from(e))?;
                log::info!("Inventory database closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn report(&self, context: &str, err: &StoreError) {
        let message = format!("{}: {}", context, err);
        log::error!("{}", message);
        self.events.emit(InventoryEvent::Error(message));
    }

    fn changed(&self) {
        self.events.emit(InventoryEvent::InventoryChanged);
    }

    /// Run `op` against the open connection, reporting any failure as an error event
    fn with_conn<T, F>(&self, context: &str, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let result = {
            let mut guard = self.lock();
            match guard.as_mut() {
                Some(conn) => op(conn),
                None => Err(StoreError::NotInitialized),
            }
        };

        if let Err(e) = &result {
            self.report(context, e);
        }
        result
    }

    // ==================== MUTATIONS ====================

    /// Insert a component, ignoring its id. Returns the id assigned by SQLite.
    pub fn add(&self, component: &Component) -> StoreResult<i64> {
        let id = self.with_conn("Error adding component", |conn| {
            queries::insert_component(conn, component)
        })?;
        log::debug!("Component added, id: {}", id);
        self.changed();
        Ok(id)
    }

    /// Replace the row with `component.id`. Returns false if no row matched.
    pub fn update(&self, component: &Component) -> StoreResult<bool> {
        let updated = self.with_conn("Error updating component", |conn| {
            queries::update_component(conn, component)
        })?;
        if updated {
            self.changed();
        } else {
            log::warn!("Component not found for update, id: {}", component.id);
        }
        Ok(updated)
    }

    /// Delete by id. Returns false if no row matched.
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let deleted = self.with_conn("Error deleting component", |conn| {
            queries::delete_component(conn, id)
        })?;
        if deleted {
            self.changed();
        } else {
            log::warn!("Component not found for delete, id: {}", id);
        }
        Ok(deleted)
    }

    /// Apply `delta` to the stored quantity.
    ///
    /// Returns the new quantity, or `None` if the id does not exist. A result
    /// below zero is rejected without writing anything.
    pub fn adjust_quantity(&self, id: i64, delta: i64) -> StoreResult<Option<i64>> {
        let adjusted = self.with_conn("Error adjusting quantity", |conn| {
            queries::adjust_quantity(conn, id, delta)
        })?;
        match adjusted {
            Some(quantity) => {
                log::debug!("Quantity of component {} changed by {} to {}", id, delta, quantity);
                self.changed();
            }
            None => log::warn!("Component not found for quantity change, id: {}", id),
        }
        Ok(adjusted)
    }

    // ==================== READS ====================

    pub fn get_by_id(&self, id: i64) -> StoreResult<Option<Component>> {
        self.with_conn("Error reading component", |conn| {
            queries::get_component(conn, id)
        })
    }

    /// Every component, ordered by name (byte order), then id
    pub fn get_all(&self) -> StoreResult<Vec<Component>> {
        self.with_conn("Error listing components", |conn| {
            queries::list_components(conn)
        })
    }

    /// Case-insensitive substring match over name, category and location.
    /// Empty text means no filter.
    pub fn search(&self, text: &str) -> StoreResult<Vec<Component>> {
        let components = self.with_conn("Error searching components", |conn| {
            queries::search_components(conn, text)
        })?;
        log::debug!("Search '{}': {} results", text, components.len());
        Ok(components)
    }

    /// Components with quantity at or below `threshold`, lowest first
    pub fn get_low_stock(&self, threshold: i64) -> StoreResult<Vec<Component>> {
        let components = self.with_conn("Error reading low stock", |conn| {
            queries::list_low_stock(conn, threshold)
        })?;
        if !components.is_empty() {
            log::warn!("{} components at or below {} units", components.len(), threshold);
        }
        Ok(components)
    }
}

fn open_connection(location: &StoreLocation) -> StoreResult<Connection> {
    let conn = match location {
        StoreLocation::AppData => Connection::open(default_db_path()?)?,
        StoreLocation::File(path) => {
            ensure_parent_dir(path)?;
            Connection::open(path)?
        }
        StoreLocation::InMemory => Connection::open_in_memory()?,
    };

    create_schema(&conn)?;
    Ok(conn)
}

pub(crate) fn create_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            location TEXT NOT NULL,
            acquired_on TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_components_name ON components(name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_components_quantity ON components(quantity)",
        [],
    )?;

    Ok(())
}
