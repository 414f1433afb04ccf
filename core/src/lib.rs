//! Core value and record types for schema-flexible storage.
//!
//! This crate defines the data model shared by every storage backend:
//!
//! - [`Value`] — a closed set of scalar leaf values (null, boolean, integer,
//!   real, text) built once at the API boundary.
//! - [`StorageType`] — the column type inferred from a value the first time
//!   a field is seen.
//! - [`Record`] — an ordered mapping from field name to [`Value`].
//!
//! Identifier validation ([`validate_identifier`]) keeps field and table names
//! safe to splice into SQL statements.
//!
//! # Example
//!
//! ```
//! use flexrecord_core::*;
//!
//! let record = Record::new()
//!     .with("name", "alice")
//!     .with("age", 30)
//!     .with("nickname", Value::Null);
//!
//! assert_eq!(record.get("age").unwrap().storage_type(), StorageType::Integer);
//! assert_eq!(record.without_nulls().len(), 2);
//! assert!(record.validate().is_ok());
//! ```

mod error;
mod record;
mod validate;
mod value;

pub use error::RecordError;
pub use record::{RECORD_ID, Record};
pub use validate::validate_identifier;
pub use value::{StorageType, Value};
