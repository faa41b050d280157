use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Which storage adapter backs the persisted stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Every key in one JSON document (extension storage style)
    #[default]
    Bundle,
    /// Key/value table in SQLite (local storage style)
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bundle" => Some(Self::Bundle),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageBackend::Bundle => "bundle",
            StorageBackend::Sqlite => "sqlite",
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Data directory; defaults to the platform data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved data directory (~/.local/share/seenit unless overridden)
    pub fn data_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("seenit")
        })
    }
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Series metadata and search API
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// License activation server
    #[serde(default = "default_license_url")]
    pub license_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            license_url: default_license_url(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://api.tvmaze.com".to_string()
}

fn default_license_url() -> String {
    "https://license.seenit.app".to_string()
}

/// UI timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Minimum delay before a refresh result is applied
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Minimum delay before a fetch result is applied
    #[serde(default)]
    pub fetch_delay_ms: u64,
}

impl UiConfig {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay_ms(),
            fetch_delay_ms: 0,
        }
    }
}

fn default_refresh_delay_ms() -> u64 {
    1700
}
