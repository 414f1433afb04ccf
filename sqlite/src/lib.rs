//! Schema-flexible record store on SQLite.
//!
//! Callers store [`Record`](flexrecord_core::Record)s (field name → scalar
//! value) without declaring a schema. The store infers column types from the
//! first value written to each field, adds columns on demand, and offers
//! exact-match lookup, insertion with uniqueness enforcement, and atomic
//! fetch-or-create.
//!
//! # Architecture
//!
//! The crate is organized into five modules:
//!
//! - **`condition`** — exact-match predicates and insert clauses with bound
//!   parameters
//! - **`schema`** — catalog introspection, table creation, column evolution,
//!   and the per-store schema cache
//! - **`convert`** — `Value` ↔ SQLite value and row conversion
//! - **`store`** — [`RecordStore`], the locked, transactional entry point
//! - **`config`** — [`StoreConfig`], loadable from YAML
//!
//! # Quick start
//!
//! ```
//! use flexrecord_core::Record;
//! use flexrecord_sqlite::RecordStore;
//!
//! let store = RecordStore::open_in_memory().unwrap();
//!
//! let rows = store
//!     .fetch_or_create("table1", &Record::new().with("name", "bob"))
//!     .unwrap();
//! assert_eq!(rows.len(), 1);
//! println!("bob is {}", rows[0].record_id().unwrap());
//! ```
//!
//! # Opening a file-backed store
//!
//! ```no_run
//! use flexrecord_sqlite::{JournalMode, RecordStore, StoreConfig};
//!
//! let config = StoreConfig {
//!     journal_mode: JournalMode::Wal,
//!     ..StoreConfig::at_path("records.db")
//! };
//! let store = RecordStore::open_with_config(config).unwrap();
//! println!("tables: {:?}", store.table_names().unwrap());
//! ```

mod condition;
mod config;
mod convert;
mod error;
mod schema;
mod store;

pub use condition::{InsertClause, Predicate, exact_match, insert_clause};
pub use config::{DEFAULT_TABLE, JournalMode, StoreConfig};
pub use error::{Result, StoreError};
pub use schema::{Column, TableSchema};
pub use store::RecordStore;
