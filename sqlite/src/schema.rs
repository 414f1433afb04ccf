//! Table schema introspection and on-demand column evolution.
//!
//! SQLite's own catalog is the source of truth for which columns a table
//! has. `SchemaCache` keeps the last-read column set per table so that
//! repeated operations do not re-run `PRAGMA table_info`; it is owned by
//! the store and only touched while the store lock is held.
//!
//! # Statement shapes
//!
//! - `CREATE TABLE <table>(record_id TEXT)`
//! - `ALTER TABLE <table> ADD COLUMN <name> <type>`
//!
//! Identifiers are validated with
//! [`validate_identifier`](flexrecord_core::validate_identifier) and then
//! double-quoted, so reserved words such as `order` are usable field names.

use std::collections::HashMap;

use flexrecord_core::{RECORD_ID, Record, StorageType, validate_identifier};
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};

/// Quotes a validated identifier for use in statement text.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A single column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name as stored in the catalog.
    pub name: String,
    /// Declared type text (e.g. `"INTEGER"`).
    pub declared_type: String,
    /// Parsed storage type, or `None` for declarations this store never issues.
    pub storage_type: Option<StorageType>,
}

/// Ordered column set of one table.
///
/// Column lookups are ASCII case-insensitive, matching SQLite.
///
/// # Examples
///
/// ```
/// use flexrecord_core::{Record, StorageType};
/// use flexrecord_sqlite::RecordStore;
///
/// let store = RecordStore::open_in_memory().unwrap();
/// store.add("table1", &Record::new().with("age", 30)).unwrap();
///
/// let schema = store.columns("table1").unwrap();
/// assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["record_id", "age"]);
/// assert_eq!(schema.column("AGE").unwrap().storage_type, Some(StorageType::Integer));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Looks up a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Per-store cache of table schemas, keyed by lowercased table name.
#[derive(Debug, Default)]
pub(crate) struct SchemaCache {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCache {
    /// Returns the schema of `table`, reading the catalog on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableNotFound`] if the catalog has no such table.
    pub(crate) fn table(&mut self, conn: &Connection, table: &str) -> Result<&TableSchema> {
        let key = table.to_ascii_lowercase();
        if !self.tables.contains_key(&key) {
            let schema = load_table_schema(conn, table)?
                .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
            self.tables.insert(key.clone(), schema);
        }
        Ok(&self.tables[&key])
    }

    /// Drops the cached schema of `table`; the next access re-reads the catalog.
    pub(crate) fn invalidate(&mut self, table: &str) {
        self.tables.remove(&table.to_ascii_lowercase());
    }

    pub(crate) fn clear(&mut self) {
        self.tables.clear();
    }

    fn push_column(&mut self, table: &str, column: Column) {
        if let Some(schema) = self.tables.get_mut(&table.to_ascii_lowercase()) {
            schema.columns.push(column);
        }
    }
}

/// Lists all table names in the catalog.
pub(crate) fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Returns `true` if `table` is in the catalog (case-insensitive).
pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1 COLLATE NOCASE",
    )?;
    let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
    Ok(count > 0)
}

/// Reads the column set of `table` from the catalog.
///
/// Returns `None` if the table does not exist.
pub(crate) fn load_table_schema(conn: &Connection, table: &str) -> Result<Option<TableSchema>> {
    if !table_exists(conn, table)? {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table], |row| {
            let name: String = row.get(0)?;
            let declared_type: String = row.get(1)?;
            Ok(Column {
                storage_type: StorageType::from_declared(&declared_type),
                name,
                declared_type,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(table, columns = columns.len(), "loaded table schema from catalog");
    Ok(Some(TableSchema {
        name: table.to_string(),
        columns,
    }))
}

/// Creates `table` with only the reserved identifier column.
///
/// # Errors
///
/// Returns [`StoreError::InvalidIdentifier`] for a bad name and
/// [`StoreError::TableExists`] if the catalog already has it.
pub(crate) fn create_table(conn: &Connection, cache: &mut SchemaCache, table: &str) -> Result<()> {
    validate_identifier(table)?;
    if table_exists(conn, table)? {
        return Err(StoreError::TableExists(table.to_string()));
    }

    let sql = format!(
        "CREATE TABLE {}({} TEXT)",
        quote_identifier(table),
        RECORD_ID
    );
    debug!(%sql, "creating table");
    conn.execute(&sql, [])?;
    cache.invalidate(table);
    info!(table, "created table");
    Ok(())
}

/// Splits the non-null fields of `record` into known and missing columns,
/// returning the missing ones with their inferred types.
fn missing_columns(
    schema: &TableSchema,
    table: &str,
    record: &Record,
    strict: bool,
) -> Result<Vec<(String, StorageType)>> {
    let mut missing: Vec<(String, StorageType)> = Vec::new();
    for (field, value) in record.iter().filter(|(_, v)| !v.is_null()) {
        match schema.column(field) {
            Some(column) => {
                let Some(expected) = column.storage_type else {
                    continue;
                };
                if strict && !expected.accepts(value) {
                    warn!(table, column = %column.name, %expected, found = value.kind(), "rejected value of mismatched type");
                    return Err(StoreError::TypeMismatch {
                        table: table.to_string(),
                        column: column.name.clone(),
                        expected,
                        found: value.kind(),
                    });
                }
            }
            None => {
                if !missing.iter().any(|(name, _)| name.eq_ignore_ascii_case(field)) {
                    missing.push((field.clone(), value.storage_type()));
                }
            }
        }
    }
    Ok(missing)
}

/// Adds a column for every non-null field of `record` that `table` lacks.
///
/// The type of each new column is inferred from the field's value. Returns
/// `true` if any column was added, in which case no existing row can match
/// `record`.
///
/// Columns are never dropped, so a cached column is always still present;
/// only a cache miss can be stale, and it triggers one catalog re-read
/// before anything is altered.
///
/// With `strict` set, fields that hit an existing typed column are checked
/// with [`StorageType::accepts`] before anything is altered.
///
/// # Errors
///
/// Returns [`StoreError::TableNotFound`] for a missing table and
/// [`StoreError::TypeMismatch`] for a rejected value.
pub(crate) fn ensure_columns(
    conn: &Connection,
    cache: &mut SchemaCache,
    table: &str,
    record: &Record,
    strict: bool,
) -> Result<bool> {
    let mut missing = missing_columns(cache.table(conn, table)?, table, record, strict)?;
    if !missing.is_empty() {
        cache.invalidate(table);
        missing = missing_columns(cache.table(conn, table)?, table, record, strict)?;
    }

    for (name, storage_type) in &missing {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_identifier(table),
            quote_identifier(name),
            storage_type.sql_name()
        );
        debug!(%sql, "altering table");
        conn.execute(&sql, [])?;
        info!(table, column = %name, %storage_type, "added column");
        cache.push_column(
            table,
            Column {
                name: name.clone(),
                declared_type: storage_type.sql_name().to_string(),
                storage_type: Some(*storage_type),
            },
        );
    }

    Ok(!missing.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexrecord_core::Value;

    fn setup() -> (Connection, SchemaCache) {
        let conn = Connection::open_in_memory().unwrap();
        let mut cache = SchemaCache::default();
        create_table(&conn, &mut cache, "table1").unwrap();
        (conn, cache)
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("order"), "\"order\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_create_table_has_only_record_id() {
        let (conn, mut cache) = setup();
        let schema = cache.table(&conn, "table1").unwrap();
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec![RECORD_ID]);
        assert_eq!(schema.columns()[0].storage_type, Some(StorageType::Text));
    }

    #[test]
    fn test_create_table_twice_fails() {
        let (conn, mut cache) = setup();
        assert!(matches!(
            create_table(&conn, &mut cache, "table1"),
            Err(StoreError::TableExists(_))
        ));
        assert!(matches!(
            create_table(&conn, &mut cache, "TABLE1"),
            Err(StoreError::TableExists(_))
        ));
    }

    #[test]
    fn test_create_table_rejects_bad_name() {
        let conn = Connection::open_in_memory().unwrap();
        let mut cache = SchemaCache::default();
        assert!(matches!(
            create_table(&conn, &mut cache, "t; DROP TABLE x"),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let mut cache = SchemaCache::default();
        assert!(matches!(
            cache.table(&conn, "nope"),
            Err(StoreError::TableNotFound(_))
        ));
        assert!(load_table_schema(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_ensure_columns_adds_inferred_types() {
        let (conn, mut cache) = setup();
        let record = Record::new()
            .with("name", "alice")
            .with("age", 30)
            .with("score", 9.5)
            .with("active", true)
            .with("ignored", Value::Null);

        assert!(ensure_columns(&conn, &mut cache, "table1", &record, true).unwrap());

        // The cache and the catalog agree.
        let cached = cache.table(&conn, "table1").unwrap().clone();
        let fresh = load_table_schema(&conn, "table1").unwrap().unwrap();
        assert_eq!(cached, fresh);

        assert_eq!(fresh.len(), 5);
        assert_eq!(fresh.column("name").unwrap().storage_type, Some(StorageType::Text));
        assert_eq!(fresh.column("age").unwrap().storage_type, Some(StorageType::Integer));
        assert_eq!(fresh.column("score").unwrap().storage_type, Some(StorageType::Real));
        assert_eq!(fresh.column("active").unwrap().storage_type, Some(StorageType::Integer));
        assert!(!fresh.contains("ignored"));
    }

    #[test]
    fn test_ensure_columns_is_noop_for_known_fields() {
        let (conn, mut cache) = setup();
        let record = Record::new().with("name", "alice");
        assert!(ensure_columns(&conn, &mut cache, "table1", &record, true).unwrap());
        assert!(!ensure_columns(&conn, &mut cache, "table1", &record, true).unwrap());
        assert!(!ensure_columns(&conn, &mut cache, "table1", &Record::new().with("NAME", "x"), true).unwrap());
    }

    #[test]
    fn test_ensure_columns_strict_mismatch_alters_nothing() {
        let (conn, mut cache) = setup();
        ensure_columns(&conn, &mut cache, "table1", &Record::new().with("age", 30), true).unwrap();

        let bad = Record::new().with("age", "thirty").with("brand_new", 1);
        let err = ensure_columns(&conn, &mut cache, "table1", &bad, true).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { expected: StorageType::Integer, found: "text", .. }));

        let schema = load_table_schema(&conn, "table1").unwrap().unwrap();
        assert!(!schema.contains("brand_new"));
    }

    #[test]
    fn test_ensure_columns_lenient_allows_mismatch() {
        let (conn, mut cache) = setup();
        ensure_columns(&conn, &mut cache, "table1", &Record::new().with("age", 30), false).unwrap();
        let added = ensure_columns(&conn, &mut cache, "table1", &Record::new().with("age", "thirty"), false).unwrap();
        assert!(!added);
    }

    #[test]
    fn test_untyped_foreign_column_accepts_anything() {
        let (conn, mut cache) = setup();
        conn.execute("ALTER TABLE table1 ADD COLUMN payload BLOB", []).unwrap();
        cache.invalidate("table1");
        let schema = cache.table(&conn, "table1").unwrap();
        assert_eq!(schema.column("payload").unwrap().storage_type, None);
        assert!(!ensure_columns(&conn, &mut cache, "table1", &Record::new().with("payload", "x"), true).unwrap());
    }

    #[test]
    fn test_stale_cache_miss_rereads_catalog() {
        let (conn, mut cache) = setup();
        cache.table(&conn, "table1").unwrap();
        conn.execute("ALTER TABLE table1 ADD COLUMN name TEXT", []).unwrap();

        let added = ensure_columns(&conn, &mut cache, "table1", &Record::new().with("name", "x"), true).unwrap();
        assert!(!added);
        assert!(cache.table(&conn, "table1").unwrap().contains("name"));
    }

    #[test]
    fn test_table_names() {
        let (conn, mut cache) = setup();
        create_table(&conn, &mut cache, "alpha").unwrap();
        assert_eq!(table_names(&conn).unwrap(), vec!["alpha", "table1"]);
    }
}
