//! datadrop-store — durable [`Storage`] backends.
//!
//! | Backend  | Type          | Layout                                   |
//! |----------|---------------|------------------------------------------|
//! | `memory` | `MemoryStore` | process memory (lives in `datadrop-core`) |
//! | `file`   | [`FileStore`] | one JSON document per record             |
//! | `sqlite` | [`SqliteStore`] | `records` table in one database file   |
//!
//! [`open`] picks the backend named by `[storage] backend`.

pub mod file;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use datadrop_core::config::{StorageBackend, StorageConfig};
use datadrop_core::{MemoryStore, Storage, StorageError};
use std::sync::Arc;
use tracing::info;

/// Open the configured backend.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::open(&config.dir).await?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&config.sqlite_path).await?),
    };
    info!(backend = storage.backend(), "storage ready");
    Ok(storage)
}
