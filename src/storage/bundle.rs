use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::storage::StateStorage;

/// All keys kept in a single JSON object file, the way extension-local
/// storage keeps one area per extension
pub struct BundleStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl BundleStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content =
            serde_json::to_string(items).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        // Replace atomically through a sibling temp file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl StateStorage for BundleStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;
        Ok(items.remove(key).filter(|value| !value.is_empty()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;
        if items.remove(key).is_some() {
            self.write_all(&items).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BundleStorage::new(dir.path().join("storage.json"));

        assert_eq!(storage.get_item("series-storage").await.unwrap(), None);

        storage.set_item("series-storage", "{\"a\":1}").await.unwrap();
        storage.set_item("other", "x").await.unwrap();
        assert_eq!(
            storage.get_item("series-storage").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        storage.remove_item("series-storage").await.unwrap();
        assert_eq!(storage.get_item("series-storage").await.unwrap(), None);
        assert_eq!(storage.get_item("other").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_last_write_wins_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        BundleStorage::new(path.clone())
            .set_item("k", "first")
            .await
            .unwrap();
        BundleStorage::new(path.clone())
            .set_item("k", "second")
            .await
            .unwrap();

        let storage = BundleStorage::new(path);
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = BundleStorage::new(path);
        assert!(matches!(
            storage.get_item("k").await,
            Err(StorageError::Corrupt(_))
        ));
    }
}
