//! The record store: lookup, insertion, and atomic fetch-or-create.
//!
//! [`RecordStore`] owns a single SQLite connection together with its
//! schema cache, both behind one mutex. Every operation holds the lock
//! for its full duration and runs inside one transaction, so a
//! check-then-insert sequence can never interleave with another caller's,
//! and a failed operation leaves neither schema changes nor rows behind.
//!
//! # Statement shapes
//!
//! - `SELECT * FROM <table> WHERE <predicate>` (no `WHERE` for the empty record)
//! - `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`
//!
//! # Example
//!
//! ```
//! use flexrecord_core::{Record, Value};
//! use flexrecord_sqlite::RecordStore;
//!
//! let store = RecordStore::open_in_memory().unwrap();
//!
//! store.add("table1", &Record::new().with("name", "alice").with("age", 30)).unwrap();
//!
//! let found = store.get("table1", &Record::new().with("name", "alice")).unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].get("age"), Some(&Value::Integer(30)));
//! assert!(found[0].record_id().is_some());
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use flexrecord_core::{RECORD_ID, Record, validate_identifier};
use rusqlite::{Connection, TransactionBehavior, params, params_from_iter};
use tracing::{debug, info};
use uuid::Uuid;

use crate::condition::{exact_match, insert_clause};
use crate::config::StoreConfig;
use crate::convert::row_to_record;
use crate::error::{Result, StoreError};
use crate::schema::{self, SchemaCache, TableSchema, quote_identifier};

/// Connection and schema cache, always accessed together under the lock.
struct StoreState {
    conn: Connection,
    schema: SchemaCache,
}

impl StoreState {
    /// Runs `op` inside a transaction, committing on success.
    ///
    /// On failure the transaction is rolled back and the cached schema of
    /// `table` is dropped, since any columns it recorded were rolled back too.
    fn atomically<T>(
        &mut self,
        table: &str,
        behavior: TransactionBehavior,
        op: impl FnOnce(&Connection, &mut SchemaCache) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction_with_behavior(behavior)?;
        let value = match op(&*tx, &mut self.schema) {
            Ok(value) => value,
            Err(e) => {
                drop(tx);
                self.schema.invalidate(table);
                return Err(e);
            }
        };
        if let Err(e) = tx.commit() {
            self.schema.invalidate(table);
            return Err(e.into());
        }
        Ok(value)
    }
}

/// A schema-flexible record store backed by one SQLite database.
///
/// Callers pass [`Record`]s without declaring columns up front; the store
/// adds a column the first time a field is seen, typed after that field's
/// value. The store is `Send + Sync` and is meant to be shared (e.g. in an
/// `Arc`) by every caller of one database file.
///
/// # Examples
///
/// ```
/// use flexrecord_core::Record;
/// use flexrecord_sqlite::{RecordStore, StoreError};
///
/// let store = RecordStore::open_in_memory().unwrap();
/// let bob = Record::new().with("name", "bob");
///
/// let first = store.fetch_or_create("table1", &bob).unwrap();
/// let second = store.fetch_or_create("table1", &bob).unwrap();
/// assert_eq!(first[0].record_id(), second[0].record_id());
///
/// assert!(matches!(store.add("table1", &bob), Err(StoreError::DuplicateEntry { .. })));
/// ```
pub struct RecordStore {
    state: Mutex<StoreState>,
    config: StoreConfig,
}

impl RecordStore {
    /// Opens (or creates) a file-backed store with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(StoreConfig::at_path(path.as_ref()))
    }

    /// Opens a fresh in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with_config(StoreConfig::default())
    }

    /// Opens a store as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for invalid settings and
    /// [`StoreError::Backend`] if the database cannot be opened.
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let conn = match &config.path {
            Some(path) => {
                info!(path = %path.display(), "opening record store");
                Connection::open(path)?
            }
            None => {
                info!("opening in-memory record store");
                Connection::open_in_memory()?
            }
        };
        Self::with_connection(conn, config)
    }

    /// Builds a store around an already-open connection.
    ///
    /// Applies the connection settings from `config` and creates the default
    /// table if the catalog does not have it. `config.path` is not used.
    pub fn with_connection(conn: Connection, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        let mode: String = conn.query_row(
            &format!("PRAGMA journal_mode = {}", config.journal_mode.pragma_value()),
            [],
            |row| row.get(0),
        )?;
        debug!(journal_mode = %mode, "configured connection");

        let mut cache = SchemaCache::default();
        if !schema::table_exists(&conn, &config.default_table)? {
            schema::create_table(&conn, &mut cache, &config.default_table)?;
        }

        Ok(Self {
            state: Mutex::new(StoreState {
                conn,
                schema: cache,
            }),
            config,
        })
    }

    /// Returns the settings this store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Name of the table created on open (`table1` unless configured).
    pub fn default_table(&self) -> &str {
        &self.config.default_table
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Creates a table holding only the `record_id` column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableExists`] if the name is already in the
    /// catalog, or [`StoreError::InvalidIdentifier`] for a bad name.
    pub fn create_table(&self, table: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.atomically(table, TransactionBehavior::Immediate, |conn, cache| {
            schema::create_table(conn, cache, table)
        })
    }

    /// Returns every stored row whose values equal the non-null fields of
    /// `record`.
    ///
    /// Each returned record holds the row's non-null columns, including
    /// `record_id`. A record with no non-null fields matches every row. If
    /// `record` names a field the table has never seen, the column is added
    /// and the result is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`] for a missing table,
    /// [`StoreError::ReservedFieldConflict`] if `record` carries `record_id`,
    /// and [`StoreError::TypeMismatch`] for a value that does not fit its
    /// column when strict typing is enabled.
    pub fn get(&self, table: &str, record: &Record) -> Result<Vec<Record>> {
        validate_identifier(table)?;
        record.validate()?;
        let strict = self.config.strict_types;
        let mut state = self.lock()?;
        // May add columns, so it takes the write lock up front like `add`.
        state.atomically(table, TransactionBehavior::Immediate, |conn, cache| {
            select_matching(conn, cache, table, record, strict)
        })
    }

    /// Looks up a single row by its generated identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use flexrecord_core::Record;
    /// use flexrecord_sqlite::RecordStore;
    ///
    /// let store = RecordStore::open_in_memory().unwrap();
    /// let id = store.add("table1", &Record::new().with("name", "carol")).unwrap();
    ///
    /// let row = store.get_by_id("table1", &id).unwrap().unwrap();
    /// assert_eq!(row.record_id(), Some(id.as_str()));
    /// assert!(store.get_by_id("table1", "missing").unwrap().is_none());
    /// ```
    pub fn get_by_id(&self, table: &str, record_id: &str) -> Result<Option<Record>> {
        validate_identifier(table)?;
        let mut state = self.lock()?;
        state.atomically(table, TransactionBehavior::Deferred, |conn, cache| {
            cache.table(conn, table)?;
            let sql = format!(
                "SELECT * FROM {} WHERE {} = ?1",
                quote_identifier(table),
                RECORD_ID
            );
            debug!(%sql, record_id, "selecting by id");
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params![record_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_record(row, &columns)?)),
                None => Ok(None),
            }
        })
    }

    /// Inserts `record` with a freshly generated `record_id`, returning it.
    ///
    /// Null fields are dropped first. The remaining fields act as the
    /// uniqueness key: if any stored row already matches them, nothing is
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservedFieldConflict`] if `record` carries
    /// `record_id`, [`StoreError::DuplicateEntry`] if a matching row exists,
    /// plus the errors of [`get`](Self::get). On error the table is unchanged.
    pub fn add(&self, table: &str, record: &Record) -> Result<String> {
        validate_identifier(table)?;
        record.validate()?;
        let strict = self.config.strict_types;
        let mut state = self.lock()?;
        state.atomically(table, TransactionBehavior::Immediate, |conn, cache| {
            insert_unique(conn, cache, table, &record.without_nulls(), strict)
        })
    }

    /// Returns the rows matching `record`, inserting it first if none exist.
    ///
    /// The lookup and the insert run under the store lock in one immediate
    /// transaction, so concurrent callers with the same record all observe
    /// the single row created by whichever of them ran first.
    pub fn fetch_or_create(&self, table: &str, record: &Record) -> Result<Vec<Record>> {
        validate_identifier(table)?;
        record.validate()?;
        let strict = self.config.strict_types;
        let record = record.without_nulls();
        let mut state = self.lock()?;
        state.atomically(table, TransactionBehavior::Immediate, |conn, cache| {
            let existing = select_matching(conn, cache, table, &record, strict)?;
            if !existing.is_empty() {
                return Ok(existing);
            }
            insert_unique(conn, cache, table, &record, strict)?;
            select_matching(conn, cache, table, &record, strict)
        })
    }

    /// Lists every table in the database catalog.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        schema::table_names(&state.conn)
    }

    /// Returns the current column set of `table`.
    pub fn columns(&self, table: &str) -> Result<TableSchema> {
        let mut state = self.lock()?;
        let StoreState { conn, schema: cache } = &mut *state;
        Ok(cache.table(conn, table)?.clone())
    }

    /// Drops every cached table schema so the next operation re-reads the
    /// catalog. Needed only if another connection altered the database.
    pub fn refresh_schema(&self) -> Result<()> {
        self.lock()?.schema.clear();
        Ok(())
    }

    /// Closes the underlying connection, reporting any error SQLite raises.
    pub fn close(self) -> Result<()> {
        let state = self
            .state
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        state.conn.close().map_err(|(_, e)| StoreError::Backend(e))?;
        info!("closed record store");
        Ok(())
    }
}

/// Selects every row matching the non-null fields of `record`.
fn select_matching(
    conn: &Connection,
    cache: &mut SchemaCache,
    table: &str,
    record: &Record,
    strict: bool,
) -> Result<Vec<Record>> {
    let record = record.without_nulls();
    if schema::ensure_columns(conn, cache, table, &record, strict)? {
        debug!(table, "new columns added, no existing row can match");
        return Ok(Vec::new());
    }

    let predicate = exact_match(&record);
    let sql = if predicate.is_empty() {
        format!("SELECT * FROM {}", quote_identifier(table))
    } else {
        format!(
            "SELECT * FROM {} WHERE {}",
            quote_identifier(table),
            predicate.clause
        )
    };
    debug!(%sql, predicate = %predicate.to_inline_sql(), "selecting");

    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(predicate.params.iter()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(row_to_record(row, &columns)?);
    }
    Ok(records)
}

/// Inserts `record` (already null-filtered) unless a matching row exists.
fn insert_unique(
    conn: &Connection,
    cache: &mut SchemaCache,
    table: &str,
    record: &Record,
    strict: bool,
) -> Result<String> {
    if !select_matching(conn, cache, table, record, strict)?.is_empty() {
        debug!(table, "rejected duplicate entry");
        return Err(StoreError::DuplicateEntry {
            table: table.to_string(),
        });
    }

    let record_id = Uuid::new_v4().to_string();
    let row = record.clone().with(RECORD_ID, record_id.as_str());
    schema::ensure_columns(conn, cache, table, &row, strict)?;

    let clause = insert_clause(&row);
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        clause.columns,
        clause.placeholders
    );
    debug!(%sql, record_id = %record_id, "inserting");
    conn.execute(&sql, params_from_iter(clause.params.iter()))?;
    Ok(record_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexrecord_core::Value;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_store_is_send_sync() {
        assert_send_sync::<RecordStore>();
    }

    #[test]
    fn test_open_creates_default_table() {
        let store = RecordStore::open_in_memory().unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["table1"]);
        assert_eq!(store.default_table(), "table1");
    }

    #[test]
    fn test_failed_insert_rolls_back_added_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE people(record_id TEXT, email TEXT NOT NULL)", [])
            .unwrap();
        let store = RecordStore::with_connection(conn, StoreConfig::default()).unwrap();

        // The insert violates NOT NULL after "name" has been added.
        let result = store.add("people", &Record::new().with("name", "x"));
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert!(!store.columns("people").unwrap().contains("name"));
        assert!(store.get("people", &Record::new()).unwrap().is_empty());
    }

    #[test]
    fn test_type_mismatch_leaves_table_unchanged() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add("table1", &Record::new().with("age", 30)).unwrap();

        let bad = Record::new().with("age", "old").with("extra", 1);
        assert!(matches!(
            store.add("table1", &bad),
            Err(StoreError::TypeMismatch { .. })
        ));
        assert!(!store.columns("table1").unwrap().contains("extra"));
        assert_eq!(store.get("table1", &Record::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_get_unknown_table() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get("nope", &Record::new()),
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_get_with_new_field_adds_column_and_returns_empty() {
        let store = RecordStore::open_in_memory().unwrap();
        store.add("table1", &Record::new().with("name", "alice")).unwrap();

        let found = store
            .get("table1", &Record::new().with("name", "alice").with("city", "Oslo"))
            .unwrap();
        assert!(found.is_empty());
        assert!(store.columns("table1").unwrap().contains("city"));
    }

    #[test]
    fn test_reserved_field_in_get() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get("table1", &Record::new().with(RECORD_ID, Value::Null)),
            Err(StoreError::ReservedFieldConflict(_))
        ));
    }

    #[test]
    fn test_close() {
        let store = RecordStore::open_in_memory().unwrap();
        store.close().unwrap();
    }
}
