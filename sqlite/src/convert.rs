//! Conversion between [`Value`]/[`Record`] and SQLite values and rows.
//!
//! Values are bound as parameters rather than spliced into statement text,
//! so every value crossing into SQLite goes through [`to_sql_value`] and
//! every value coming back goes through [`from_value_ref`].

use flexrecord_core::{Record, Value};
use rusqlite::Row;
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::error::{Result, StoreError};

/// Converts a [`Value`] to an owned SQLite value for binding.
///
/// Booleans bind as integers `0`/`1`, matching their `INTEGER` column.
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Converts a borrowed SQLite value read from a row.
///
/// Booleans are not distinguishable from integers once stored and come back
/// as [`Value::Integer`].
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedType`] for blobs, which this store never
/// writes but a foreign database file might contain.
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Integer(i)),
        ValueRef::Real(r) => Ok(Value::Real(r)),
        ValueRef::Text(bytes) => Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(StoreError::UnsupportedType("blob".to_string())),
    }
}

/// Converts a result row into a [`Record`], skipping null columns.
///
/// `columns` must be the statement's column names in order.
pub(crate) fn row_to_record(row: &Row<'_>, columns: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for (idx, name) in columns.iter().enumerate() {
        let value = from_value_ref(row.get_ref(idx)?)?;
        if !value.is_null() {
            record.insert(name.clone(), value);
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_to_sql_value_bool_is_integer() {
        assert_eq!(to_sql_value(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&Value::Bool(false)), SqlValue::Integer(0));
    }

    #[test]
    fn test_to_sql_value_scalars() {
        assert_eq!(to_sql_value(&Value::Null), SqlValue::Null);
        assert_eq!(to_sql_value(&Value::Integer(5)), SqlValue::Integer(5));
        assert_eq!(to_sql_value(&Value::Real(0.5)), SqlValue::Real(0.5));
        assert_eq!(
            to_sql_value(&Value::from("hi")),
            SqlValue::Text("hi".to_string())
        );
    }

    #[test]
    fn test_from_value_ref_rejects_blob() {
        assert!(matches!(
            from_value_ref(ValueRef::Blob(&[1, 2, 3])),
            Err(StoreError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_row_to_record_skips_nulls() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn
            .prepare("SELECT 'abc' AS record_id, NULL AS missing, 30 AS age, 1.5 AS score")
            .unwrap();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        let record = row_to_record(row, &columns).unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.record_id(), Some("abc"));
        assert_eq!(record.get("age"), Some(&Value::Integer(30)));
        assert_eq!(record.get("score"), Some(&Value::Real(1.5)));
        assert!(record.get("missing").is_none());
    }
}
