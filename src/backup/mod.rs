//! Export and import of the series store's persisted document.
//!
//! Export copies the committed bytes as they sit in storage. Import
//! validates a file against the persisted document shape, writes it
//! verbatim under the series key, then rehydrates the store from it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::BackupError;
use crate::store::{Persisted, SeriesStore, TrackedSeries, PERSIST_VERSION};

/// A backup ready to be written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub file_name: String,
    pub contents: String,
}

impl BackupFile {
    /// Write into `dir`, returning the full path
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, BackupError> {
        let path = dir.join(&self.file_name);

        if let Err(e) = tokio::fs::write(&path, &self.contents).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to write backup");
            return Err(BackupError::Export);
        }

        Ok(path)
    }
}

/// `yyyy-MM-dd_HH-mm-ss_seenit-backup.json` in local time
pub fn backup_file_name(at: DateTime<Local>) -> String {
    format!("{}_seenit-backup.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Package the persisted snapshot; `None` when nothing was persisted yet
pub async fn export_snapshot(store: &SeriesStore) -> Result<Option<BackupFile>, BackupError> {
    let raw = match store.persisted_snapshot().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted snapshot");
            return Err(BackupError::Export);
        }
    };

    Ok(raw.map(|contents| BackupFile {
        file_name: backup_file_name(Local::now()),
        contents,
    }))
}

/// Outcome of the file chooser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    /// The user dismissed the chooser
    Cancelled,
    /// The chooser closed without a file
    Empty,
    Chosen(PathBuf),
}

/// Asks the user for a `.json` backup file
#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick_json(&self) -> PickResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported,
    Cancelled,
}

/// Check a backup against the persisted document shape
pub fn validate_snapshot(raw: &str) -> Result<(), BackupError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| BackupError::ReadFailed)?;

    let persisted: Persisted<TrackedSeries> =
        serde_json::from_value(value).map_err(|_| BackupError::InvalidFormat)?;

    if persisted.version != PERSIST_VERSION {
        return Err(BackupError::InvalidFormat);
    }

    Ok(())
}

/// Pick a backup file and load it into the store. Nothing is written
/// unless the whole file validates.
pub async fn import_snapshot(
    picker: &dyn FilePicker,
    store: &SeriesStore,
) -> Result<ImportOutcome, BackupError> {
    let path = match picker.pick_json().await {
        PickResult::Cancelled => return Ok(ImportOutcome::Cancelled),
        PickResult::Empty => return Err(BackupError::FileNotFound),
        PickResult::Chosen(path) => path,
    };

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackupError::FileNotFound)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read backup file");
            return Err(BackupError::ReadFailed);
        }
    };

    validate_snapshot(&raw)?;
    store.restore_snapshot(&raw).await?;

    tracing::debug!(path = %path.display(), "backup imported");
    Ok(ImportOutcome::Imported)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::api::fake::{series, FakeClient};
    use crate::storage::MemoryStorage;
    use crate::store::{SeriesStoreOptions, ToggleAllWatchedMode};

    struct ScriptedPicker(PickResult);

    #[async_trait]
    impl FilePicker for ScriptedPicker {
        async fn pick_json(&self) -> PickResult {
            self.0.clone()
        }
    }

    async fn tracked_store() -> SeriesStore {
        let client = Arc::new(FakeClient::new());
        client.put_series(series(100, &[(11, Some(3)), (12, Some(2))]));
        client.put_series(series(200, &[(21, Some(4))]));

        let store = SeriesStore::open(
            Arc::new(MemoryStorage::new()),
            client,
            SeriesStoreOptions::default(),
        )
        .await;

        store.fetch_series(100, &CancellationToken::new()).await;
        store.fetch_series(200, &CancellationToken::new()).await;
        store.set_active_series_id(200);
        store.toggle_favorites(100);
        store.toggle_all_watched(100, 11, ToggleAllWatchedMode::Complete);
        store
    }

    async fn empty_store() -> SeriesStore {
        SeriesStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(FakeClient::new()),
            SeriesStoreOptions::default(),
        )
        .await
    }

    #[test]
    fn test_backup_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(backup_file_name(at), "2024-03-05_14-07-09_seenit-backup.json");
    }

    #[tokio::test]
    async fn test_export_without_snapshot_is_none() {
        let store = empty_store().await;
        assert_eq!(export_snapshot(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_is_committed_bytes() {
        let store = tracked_store().await;

        let backup = export_snapshot(&store).await.unwrap().unwrap();

        assert!(backup.file_name.ends_with("_seenit-backup.json"));
        assert_eq!(
            Some(backup.contents),
            store.persisted_snapshot().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = tracked_store().await;
        let path = export_snapshot(&source)
            .await
            .unwrap()
            .unwrap()
            .write_to(dir.path())
            .await
            .unwrap();

        let target = empty_store().await;
        let outcome = import_snapshot(&ScriptedPicker(PickResult::Chosen(path)), &target)
            .await
            .unwrap();

        assert_eq!(outcome, ImportOutcome::Imported);
        assert_eq!(target.state().data, source.state().data);
    }

    #[tokio::test]
    async fn test_import_missing_version_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(
            &path,
            r#"{"state":{"seriesData":[],"activeSeriesId":null,"trackingSeriesMap":{},"favoritesSeriesMap":{},"trackingSeriesData":{},"isRewardShownMap":{}}}"#,
        )
        .unwrap();

        let store = tracked_store().await;
        let before = store.state();
        let raw_before = store.persisted_snapshot().await.unwrap();

        let result = import_snapshot(&ScriptedPicker(PickResult::Chosen(path)), &store).await;

        assert!(matches!(result, Err(BackupError::InvalidFormat)));
        assert_eq!(store.state(), before);
        assert_eq!(store.persisted_snapshot().await.unwrap(), raw_before);
    }

    #[test]
    fn test_import_rejects_other_version_and_missing_fields() {
        assert!(matches!(
            validate_snapshot(r#"{"state":{"seriesData":[],"activeSeriesId":null,"trackingSeriesMap":{},"favoritesSeriesMap":{},"trackingSeriesData":{},"isRewardShownMap":{}},"version":2}"#),
            Err(BackupError::InvalidFormat)
        ));
        assert!(matches!(
            validate_snapshot(r#"{"state":{"seriesData":[]},"version":1}"#),
            Err(BackupError::InvalidFormat)
        ));
        assert!(matches!(
            validate_snapshot("not json"),
            Err(BackupError::ReadFailed)
        ));
    }

    #[tokio::test]
    async fn test_import_cancel_and_empty() {
        let store = empty_store().await;

        let cancelled = import_snapshot(&ScriptedPicker(PickResult::Cancelled), &store).await;
        assert_eq!(cancelled.unwrap(), ImportOutcome::Cancelled);

        let empty = import_snapshot(&ScriptedPicker(PickResult::Empty), &store).await;
        assert!(matches!(empty, Err(BackupError::FileNotFound)));

        let missing = import_snapshot(
            &ScriptedPicker(PickResult::Chosen(PathBuf::from("/nonexistent/seenit.json"))),
            &store,
        )
        .await;
        assert!(matches!(missing, Err(BackupError::FileNotFound)));
    }
}
