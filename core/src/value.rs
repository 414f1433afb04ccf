//! Scalar values and their inferred storage types.
//!
//! [`Value`] is the only shape a record field can take. Every downstream
//! component matches over its variants instead of inspecting runtime types,
//! and [`Value::storage_type`] decides the column type a field gets the first
//! time it is written.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Column type of a field, fixed when the column is first created.
///
/// Booleans share the [`Integer`](StorageType::Integer) family and are
/// stored as `0`/`1`.
///
/// # Examples
///
/// ```
/// use flexrecord_core::{StorageType, Value};
///
/// assert_eq!(Value::from(true).storage_type(), StorageType::Integer);
/// assert_eq!(Value::from(1.5).storage_type(), StorageType::Real);
/// assert_eq!(StorageType::Text.sql_name(), "TEXT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// Column created from an absent value.
    Null,
    /// Integers and booleans.
    Integer,
    /// UTF-8 text.
    Text,
    /// Floating point.
    Real,
}

impl StorageType {
    /// Returns the SQL type name used in `ALTER TABLE ... ADD COLUMN`.
    pub fn sql_name(self) -> &'static str {
        match self {
            StorageType::Null => "NULL",
            StorageType::Integer => "INTEGER",
            StorageType::Text => "TEXT",
            StorageType::Real => "REAL",
        }
    }

    /// Parses a declared column type as reported by the catalog.
    ///
    /// Returns `None` for declarations this store never issues (e.g. `BLOB`
    /// or `VARCHAR(20)` in a table created elsewhere).
    pub fn from_declared(declared: &str) -> Option<Self> {
        match declared.trim().to_ascii_uppercase().as_str() {
            "NULL" => Some(StorageType::Null),
            "INTEGER" => Some(StorageType::Integer),
            "TEXT" => Some(StorageType::Text),
            "REAL" => Some(StorageType::Real),
            _ => None,
        }
    }

    /// Returns `true` if `value` may be written to a column of this type.
    ///
    /// Nulls fit anywhere, integers widen into real columns, and a `Null`
    /// column accepts any value since it never fixed a type.
    ///
    /// # Examples
    ///
    /// ```
    /// use flexrecord_core::{StorageType, Value};
    ///
    /// assert!(StorageType::Integer.accepts(&Value::from(false)));
    /// // SQLite stores it as a real, so it reads back as `Value::Real`.
    /// assert!(StorageType::Real.accepts(&Value::from(3)));
    /// assert!(!StorageType::Integer.accepts(&Value::from("3")));
    /// ```
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (StorageType::Null, _) => true,
            (StorageType::Integer, Value::Bool(_) | Value::Integer(_)) => true,
            (StorageType::Real, Value::Real(_) | Value::Integer(_)) => true,
            (StorageType::Text, Value::Text(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A scalar field value.
///
/// Serializes to and from plain JSON scalars (`null`, `true`, `30`, `1.5`,
/// `"alice"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value; never persisted or matched.
    #[default]
    Null,
    /// Boolean, stored as `0`/`1`.
    Bool(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Infers the storage type a column created from this value would get.
    pub fn storage_type(&self) -> StorageType {
        match self {
            Value::Null => StorageType::Null,
            Value::Bool(_) | Value::Integer(_) => StorageType::Integer,
            Value::Real(_) => StorageType::Real,
            Value::Text(_) => StorageType::Text,
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }

    /// Renders the value as an escaped SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled, booleans become
    /// `0`/`1`, and reals always keep a decimal point so they are not read
    /// back as integers. Non-finite reals have no SQL literal and render as
    /// `NULL`.
    ///
    /// Statements are executed with bound parameters; this rendering exists
    /// for logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use flexrecord_core::Value;
    ///
    /// assert_eq!(Value::from("it's").sql_literal(), "'it''s'");
    /// assert_eq!(Value::from(true).sql_literal(), "1");
    /// assert_eq!(Value::from(2.0).sql_literal(), "2.0");
    /// assert_eq!(Value::Null.sql_literal(), "NULL");
    /// ```
    pub fn sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => u8::from(*b).to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) if r.is_finite() => {
                let s = r.to_string();
                if s.contains(['.', 'e', 'E']) {
                    s
                } else {
                    format!("{s}.0")
                }
            }
            Value::Real(_) => "NULL".to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = RecordError;

    /// Converts a JSON scalar, rejecting arrays, objects, and numbers that
    /// fit neither `i64` nor `f64`.
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(RecordError::UnsupportedType(format!("number {n}")))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(_) => Err(RecordError::UnsupportedType("array".into())),
            serde_json::Value::Object(_) => Err(RecordError::UnsupportedType("object".into())),
        }
    }
}
