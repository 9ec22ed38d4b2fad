// State management module
// Handles the component model and SQLite persistence

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{Store, StoreError, StoreLocation, StoreResult};
pub use models::{Component, UNSAVED_ID};
pub use storage::StorageError;
