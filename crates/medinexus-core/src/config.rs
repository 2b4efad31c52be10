//! Storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use medinexus_storage::{KeyValueStore, MemoryStore, SqliteStore, UnavailableStore};

use crate::error::CoreError;
use crate::Result;

/// Typical per-origin browser allowance.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Overrides [`Config::data_dir`].
pub const DATA_DIR_ENV: &str = "MEDINEXUS_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local, lost on exit
    Memory,
    /// Persistent, at `database_path`
    Sqlite,
    /// No storage in this context (e.g. server-side rendering)
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which store backs the application
    pub backend: Backend,
    /// Path to the database file, used by the SQLite backend
    pub database_path: PathBuf,
    /// Approximate byte limit across all keys; `None` disables it
    pub quota_bytes: Option<usize>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            backend: Backend::Sqlite,
            database_path: data_dir.join("medinexus.db"),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.quota_bytes == Some(0) {
            return Err(CoreError::Config("quota_bytes must be positive".to_string()));
        }
        Ok(config)
    }

    /// `MEDINEXUS_DATA_DIR` when set, else `MediNexus` under the platform's
    /// local data directory.
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        platform_data_dir()
            .map(|d| d.join("MediNexus"))
            .unwrap_or_else(|| PathBuf::from(".medinexus"))
    }

    /// Build the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self.backend {
            Backend::Memory => match self.quota_bytes {
                Some(quota) => Arc::new(MemoryStore::with_quota(quota)),
                None => Arc::new(MemoryStore::new()),
            },
            Backend::Sqlite => {
                if let Some(parent) = self.database_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        CoreError::Config(format!("cannot create {}: {e}", parent.display()))
                    })?;
                }
                let store = SqliteStore::open(&self.database_path)?;
                match self.quota_bytes {
                    Some(quota) => Arc::new(store.with_quota(quota)),
                    None => Arc::new(store),
                }
            }
            Backend::Unavailable => Arc::new(UnavailableStore::default()),
        };
        Ok(store)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    let home = || std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home().map(|h| h.join("Library/Application Support"))
    } else {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|h| h.join(".local/share")))
    }
}
