//! Store configuration.
//!
//! Defines the YAML-serializable settings used to open a [`RecordStore`].
//! Every field has a default, so an empty document is a valid configuration
//! for an in-memory store.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/records.db
//! default_table: table1
//! busy_timeout_ms: 5000
//! journal_mode: wal
//! strict_types: true
//! ```
//!
//! [`RecordStore`]: crate::RecordStore

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flexrecord_core::validate_identifier;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Name of the table created on open when the configuration does not name one.
pub const DEFAULT_TABLE: &str = "table1";

/// SQLite journal mode applied when the connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Rollback journal (SQLite's default).
    #[default]
    Delete,
    /// Write-ahead log.
    Wal,
}

impl JournalMode {
    pub(crate) fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
        }
    }
}

/// Settings for opening a record store.
///
/// # Examples
///
/// ```
/// use flexrecord_sqlite::{JournalMode, StoreConfig};
///
/// let config: StoreConfig = serde_yaml::from_str("journal_mode: wal").unwrap();
/// assert_eq!(config.journal_mode, JournalMode::Wal);
/// assert_eq!(config.default_table, "table1");
/// assert!(config.path.is_none());
/// assert!(config.strict_types);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Table created on open if absent.
    pub default_table: String,
    /// How long SQLite waits on a locked database file before failing.
    pub busy_timeout_ms: u64,
    /// Journal mode for file-backed databases.
    pub journal_mode: JournalMode,
    /// Reject values whose type does not fit their existing column.
    pub strict_types: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_table: DEFAULT_TABLE.to_string(),
            busy_timeout_ms: 5000,
            journal_mode: JournalMode::default(),
            strict_types: true,
        }
    }
}

impl StoreConfig {
    /// Configuration for a file-backed store at `path`, with defaults otherwise.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read,
    /// [`StoreError::Yaml`] if parsing fails, or [`StoreError::Config`] if
    /// the loaded values are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: StoreConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks that the configured values are usable.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.default_table).map_err(|_| {
            StoreError::Config(format!(
                "default_table '{}' is not a valid table name",
                self.default_table
            ))
        })?;
        Ok(())
    }
}
