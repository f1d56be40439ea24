//! Store configuration.

use std::path::PathBuf;

use crate::db::{Database, DbResult};

/// Default on-disk database file.
pub const DEFAULT_DB_PATH: &str = "symptree.db";

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file (default: `symptree.db`).
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default       |
    /// |--------------------|---------------|
    /// | `SYMPTREE_DB_PATH` | `symptree.db` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("SYMPTREE_DB_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        Self { database_path }
    }

    /// Open (or create) the configured database.
    pub fn open(&self) -> DbResult<Database> {
        Database::open(&self.database_path)
    }
}
