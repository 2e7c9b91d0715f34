//! Configuration for the SQLite backend.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Default number of read-only connections.
pub const DEFAULT_READ_CONNECTIONS: usize = 4;

/// `SQLite` journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// Write-ahead log. Readers never block the writer.
    #[default]
    Wal,
    /// Rollback journal.
    Delete,
}

impl SqliteJournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for [`SqliteStore`](crate::SqliteStore).
///
/// Only `path` is required when deserializing; everything else falls back to its
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Database file, or `:memory:` for a private in-memory database.
    pub path: PathBuf,
    /// How long a connection waits on a locked database before failing, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// Read-only connections opened next to the single writer. With zero, or for an
    /// in-memory database, reads go through the writer connection.
    #[serde(default = "default_read_connections")]
    pub read_connections: usize,
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_read_connections() -> usize {
    DEFAULT_READ_CONNECTIONS
}

impl SqliteStoreConfig {
    /// Configuration for a database file at `path`, with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            read_connections: DEFAULT_READ_CONNECTIONS,
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn with_journal_mode(mut self, journal_mode: SqliteJournalMode) -> Self {
        self.journal_mode = journal_mode;
        self
    }

    pub fn with_read_connections(mut self, read_connections: usize) -> Self {
        self.read_connections = read_connections;
        self
    }

    /// Returns `true` if this configuration selects an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(IN_MEMORY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: SqliteStoreConfig =
            serde_json::from_str(r#"{"path": "data/db.sqlite"}"#).unwrap();

        assert_eq!(config, SqliteStoreConfig::new("data/db.sqlite"));
        assert_eq!(config.journal_mode.pragma_value(), "wal");
    }

    #[test]
    fn journal_mode_is_snake_case() {
        let config: SqliteStoreConfig = serde_json::from_str(
            r#"{"path": "db.sqlite", "journal_mode": "delete", "read_connections": 0}"#,
        )
        .unwrap();

        assert_eq!(config.journal_mode, SqliteJournalMode::Delete);
        assert_eq!(config.read_connections, 0);
    }

    #[test]
    fn in_memory_is_detected() {
        assert!(SqliteStoreConfig::in_memory().is_in_memory());
        assert!(!SqliteStoreConfig::new("memory.db").is_in_memory());
    }
}
