use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::StorageError;
use crate::storage::StateStorage;

/// Base64 layer over another backend. Obfuscation only, not encryption.
pub struct EncodedStorage<S> {
    inner: S,
}

impl<S: StateStorage> EncodedStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: StateStorage> StateStorage for EncodedStorage<S> {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(encoded) = self.inner.get_item(key).await? else {
            return Ok(None);
        };

        // Undecodable values read as absent
        let decoded = STANDARD
            .decode(encoded.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());

        if decoded.is_none() {
            tracing::warn!(key, "discarding undecodable stored value");
        }

        Ok(decoded)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set_item(key, &STANDARD.encode(value)).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_round_trip_is_exact() {
        let raw = Arc::new(MemoryStorage::new());
        let storage = EncodedStorage::new(raw.clone());
        let value = r#"{"state":{"isLicenseActivated":true,"isLicenseChecked":false},"version":1}"#;

        storage.set_item("license-status-storage", value).await.unwrap();

        let stored = raw.get_item("license-status-storage").await.unwrap().unwrap();
        assert_ne!(stored, value);
        assert_eq!(
            storage.get_item("license-status-storage").await.unwrap().as_deref(),
            Some(value)
        );
    }

    #[tokio::test]
    async fn test_undecodable_reads_as_absent() {
        let raw = Arc::new(MemoryStorage::new());
        raw.set_item("k", "%%% not base64").await.unwrap();

        let storage = EncodedStorage::new(raw);
        assert_eq!(storage.get_item("k").await.unwrap(), None);
    }
}
