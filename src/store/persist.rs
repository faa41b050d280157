//! Persistence of store snapshots as `{ "state": ..., "version": n }`
//! documents through a storage adapter.
//!
//! Writes are queued to a background task in the order they were made, so
//! callers never wait on storage; `flush` waits for everything queued so far.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::StorageError;
use crate::storage::StateStorage;

/// Current version of every persisted document
pub const PERSIST_VERSION: u32 = 1;

/// On-disk envelope around a store's persisted fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub state: T,
    pub version: u32,
}

/// Field must be present but may be `null`, which reads as the default
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

enum Command {
    Write(String),
    Flush(oneshot::Sender<()>),
}

/// Queued writer for one storage key
pub struct Persister {
    key: String,
    storage: Arc<dyn StateStorage>,
    tx: mpsc::UnboundedSender<Command>,
}

impl Persister {
    /// Start the writer task; must be called within a tokio runtime
    pub fn spawn(storage: Arc<dyn StateStorage>, key: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(storage.clone(), key.to_string(), rx));

        Self {
            key: key.to_string(),
            storage,
            tx,
        }
    }

    /// Serialize and queue a snapshot
    pub fn persist<T: Serialize>(&self, state: &T) {
        let envelope = Persisted {
            state,
            version: PERSIST_VERSION,
        };

        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if self.tx.send(Command::Write(raw)).is_err() {
                    tracing::warn!(key = %self.key, "persist writer has stopped, snapshot dropped");
                }
            }
            Err(e) => tracing::warn!(key = %self.key, error = %e, "failed to serialize snapshot"),
        }
    }

    /// Wait until every snapshot queued before this call is committed
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Raw document as committed to storage
    pub async fn read_raw(&self) -> Result<Option<String>, StorageError> {
        self.flush().await;
        self.storage.get_item(&self.key).await
    }

    /// Replace the stored document verbatim
    pub async fn write_raw(&self, raw: &str) -> Result<(), StorageError> {
        self.flush().await;
        self.storage.set_item(&self.key, raw).await
    }

    /// Read back the persisted state. Unreadable documents and documents
    /// written under another version are discarded.
    pub async fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = match self.read_raw().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read persisted state");
                return None;
            }
        };

        let persisted: Persisted<T> = match serde_json::from_str(&raw) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unparseable persisted state");
                return None;
            }
        };

        if persisted.version != PERSIST_VERSION {
            tracing::warn!(
                key = %self.key,
                found = persisted.version,
                expected = PERSIST_VERSION,
                "discarding persisted state from another version"
            );
            return None;
        }

        Some(persisted.state)
    }
}

async fn write_loop(
    storage: Arc<dyn StateStorage>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Write(raw) => {
                if let Err(e) = storage.set_item(&key, &raw).await {
                    tracing::warn!(key = %key, error = %e, "failed to persist state");
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
