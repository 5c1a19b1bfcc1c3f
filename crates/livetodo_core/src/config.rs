//! Environment-driven core configuration.
//!
//! # Responsibility
//! - Resolve database location and logging settings for a process.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; missing values fall back to defaults.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "LIVETODO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "LIVETODO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "LIVETODO_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "livetodo.sqlite3";

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    File(PathBuf),
    /// Private to the opening store; lost at process exit.
    Memory,
}

/// Settings consumed by store bootstrap and logging init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage: StorageLocation,
    pub log_level: String,
    /// Absolute directory for rolling logs. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageLocation::File(default_db_path()),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from `LIVETODO_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            storage: non_blank(DB_PATH_ENV)
                .map(|path| StorageLocation::File(PathBuf::from(path)))
                .unwrap_or(defaults.storage),
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            storage: StorageLocation::Memory,
            ..Self::default()
        }
    }
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}
