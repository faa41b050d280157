use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{RemoteClient, SeenitClient};
use crate::backup::{export_snapshot, import_snapshot, FilePicker, ImportOutcome};
use crate::config::Config;
use crate::error::BackupError;
use crate::storage::{open_storage, EncodedStorage, StateStorage};
use crate::store::{LicenseStore, SearchStore, SeriesStore, SeriesStoreOptions};

/// One instance of every store, wired to a shared storage backend and client
pub struct App {
    pub series: SeriesStore,
    pub search: SearchStore,
    pub license: LicenseStore,
}

impl App {
    /// Build the stores from config and rehydrate them
    pub async fn open(config: &Config) -> crate::error::Result<Self> {
        let storage = open_storage(config)?;
        let client: Arc<dyn RemoteClient> = Arc::new(SeenitClient::new(&config.api));

        Ok(Self::with_parts(storage, client, SeriesStoreOptions::from(&config.ui)).await)
    }

    pub async fn with_parts(
        storage: Arc<dyn StateStorage>,
        client: Arc<dyn RemoteClient>,
        options: SeriesStoreOptions,
    ) -> Self {
        let license_storage = Arc::new(EncodedStorage::new(storage.clone()));

        Self {
            series: SeriesStore::open(storage, client.clone(), options).await,
            search: SearchStore::new(client.clone()),
            license: LicenseStore::open(license_storage, client).await,
        }
    }

    /// Write a backup into `dir`; `None` when nothing has been persisted
    pub async fn export_backup(&self, dir: &Path) -> Result<Option<PathBuf>, BackupError> {
        if !self.license.is_activated() {
            return Err(BackupError::Locked);
        }

        match export_snapshot(&self.series).await? {
            Some(backup) => Ok(Some(backup.write_to(dir).await?)),
            None => Ok(None),
        }
    }

    pub async fn import_backup(
        &self,
        picker: &dyn FilePicker,
    ) -> Result<ImportOutcome, BackupError> {
        if !self.license.is_activated() {
            return Err(BackupError::Locked);
        }

        import_snapshot(picker, &self.series).await
    }

    /// Wait for every queued snapshot to reach storage
    pub async fn shutdown(&self) {
        self.series.flush().await;
        self.license.flush().await;
        tracing::debug!("stores flushed");
    }
}
