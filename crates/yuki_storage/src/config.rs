//! Session storage configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use yuki_error::ConfigError;

/// Which session backend to open at startup.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; data dies with the process
    #[default]
    Memory,
    /// Single-file SQLite database; data survives restarts
    Sqlite,
}

/// The `[session]` section of `yuki.toml`.
///
/// ```toml
/// [session]
/// storage = "sqlite"
/// sqlite_path = "./yuki.sqlite3"
/// max_history = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to open
    #[serde(default)]
    pub storage: StorageBackend,

    /// Database file for the SQLite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Maximum stored messages per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./yuki.sqlite3")
}

fn default_max_history() -> usize {
    20
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            sqlite_path: default_sqlite_path(),
            max_history: default_max_history(),
        }
    }
}

impl StorageConfig {
    /// Check the configuration for values the stores cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::new("session.max_history must be > 0"));
        }
        if self.storage == StorageBackend::Sqlite && self.sqlite_path.as_os_str().is_empty() {
            return Err(ConfigError::new(
                "session.sqlite_path is required for the sqlite backend",
            ));
        }
        Ok(())
    }
}
