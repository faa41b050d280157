//! Key/value storage adapters backing the persisted stores.
//!
//! Every backend satisfies the same contract: last write wins and a read
//! returns the most recent committed write for that key.

mod bundle;
mod encoded;
#[cfg(test)]
mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

pub use bundle::BundleStorage;
pub use encoded::EncodedStorage;
#[cfg(test)]
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;

/// Storage key of the series tracking store
pub const SERIES_STORAGE_NAME: &str = "series-storage";

/// Storage key of the license store
pub const LICENSE_STATUS_STORAGE_NAME: &str = "license-status-storage";

/// Async string key/value storage. An empty stored value reads as absent.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: StateStorage + ?Sized> StateStorage for Arc<S> {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key).await
    }
}

/// Open the backend selected in the config
pub fn open_storage(config: &Config) -> Result<Arc<dyn StateStorage>, StorageError> {
    let dir = config.storage.data_dir();
    std::fs::create_dir_all(&dir)?;

    let storage: Arc<dyn StateStorage> = match config.storage.backend {
        StorageBackend::Bundle => Arc::new(BundleStorage::new(dir.join("storage.json"))),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&dir.join("storage.db"))?),
    };

    tracing::debug!(
        backend = config.storage.backend.label(),
        dir = %dir.display(),
        "opened storage"
    );

    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backends_read_empty_value_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let backends: Vec<Arc<dyn StateStorage>> = vec![
            Arc::new(BundleStorage::new(dir.path().join("storage.json"))),
            Arc::new(SqliteStorage::open(&dir.path().join("storage.db")).unwrap()),
            Arc::new(MemoryStorage::new()),
        ];

        for storage in backends {
            storage.set_item(SERIES_STORAGE_NAME, "").await.unwrap();
            assert_eq!(storage.get_item(SERIES_STORAGE_NAME).await.unwrap(), None);

            storage.set_item(SERIES_STORAGE_NAME, "{}").await.unwrap();
            assert_eq!(
                storage.get_item(SERIES_STORAGE_NAME).await.unwrap().as_deref(),
                Some("{}")
            );
        }
    }
}
