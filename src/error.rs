use thiserror::Error;

/// Application-wide result type
pub type Result<T> = anyhow::Result<T>;

/// Remote call errors with typed variants for matching
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Request(String),

    /// Error text supplied by the server in the response body
    #[error("{0}")]
    Server(String),

    #[error("Request failed with status code {0}")]
    Http(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller cancelled the request; never reported to the user
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Message stored in a store's error field
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Storage adapter errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Backup export/import errors
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Export failed")]
    Export,

    #[error("File is not found")]
    FileNotFound,

    #[error("Invalid backup file format - data structure mismatch")]
    InvalidFormat,

    #[error("Failed to read backup file")]
    ReadFailed,

    #[error("Failed to write backup: {0}")]
    Write(#[from] StorageError),

    #[error("Backup requires an activated license")]
    Locked,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    Invalid(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
