//! Group Storage Implementations
//!
//! Concrete implementations of the `GroupStorage` trait.

pub mod memory_store;
pub mod sql_store;

pub use memory_store::MemoryGroupStorage;
pub use sql_store::SqlGroupStorage;

use crate::config::{StorageBackend, StoreConfig};
use crate::groups::errors::GroupResult;
use crate::groups::traits::GroupStorage;
use std::sync::Arc;

/// Open the backend selected by `config`
pub fn open(config: &StoreConfig) -> GroupResult<Arc<dyn GroupStorage>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryGroupStorage::new())),
        StorageBackend::Sqlite => Ok(Arc::new(SqlGroupStorage::from_config(config)?)),
    }
}
