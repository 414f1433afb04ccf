//! Error types for record store operations.
//!
//! Provides a single flat error type covering value conversion, record
//! validation, schema management misuse, uniqueness violations, and
//! failures of the underlying SQLite connection.

use flexrecord_core::{RecordError, StorageType};
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value has no scalar storage type.
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    /// The caller supplied the reserved identifier field.
    #[error("field '{0}' is reserved and cannot be supplied")]
    ReservedFieldConflict(String),

    /// A table or field name is not a plain identifier.
    #[error("invalid identifier '{0}': must be ASCII alphanumeric or underscore and not start with a digit")]
    InvalidIdentifier(String),

    /// Two fields of one record would map to the same column.
    #[error("field '{0}' collides with another field differing only by case")]
    DuplicateField(String),

    /// `add` was called for a record that already matches a stored row.
    #[error("entry already exists in table '{table}'")]
    DuplicateEntry { table: String },

    /// `create_table` was called for a name already in the catalog.
    #[error("table '{0}' already exists")]
    TableExists(String),

    /// The named table is not in the catalog.
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// A value does not fit the type its column was created with.
    #[error("type mismatch for {table}.{column}: column is {expected}, value is {found}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: StorageType,
        found: &'static str,
    },

    /// SQLite operation failure.
    #[error("database error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// File I/O failure while reading or writing configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Another thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<RecordError> for StoreError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::UnsupportedType(t) => StoreError::UnsupportedType(t),
            RecordError::ReservedFieldConflict(f) => StoreError::ReservedFieldConflict(f),
            RecordError::InvalidIdentifier(i) => StoreError::InvalidIdentifier(i),
            RecordError::DuplicateField(f) => StoreError::DuplicateField(f),
        }
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
