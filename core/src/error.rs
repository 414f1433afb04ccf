//! Error types for value conversion and record validation.

use thiserror::Error;

/// Errors raised while building or validating records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The value has no scalar storage type (e.g. a nested array or object).
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    /// The caller supplied the field reserved for store-generated identifiers.
    #[error("field '{0}' is reserved and cannot be supplied")]
    ReservedFieldConflict(String),

    /// A field or table name cannot be used as an SQL identifier.
    #[error("invalid identifier '{0}': must be ASCII alphanumeric or underscore and not start with a digit")]
    InvalidIdentifier(String),

    /// Two field names of one record differ only by letter case.
    #[error("field '{0}' collides with another field differing only by case")]
    DuplicateField(String),
}
