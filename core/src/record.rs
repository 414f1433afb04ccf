//! Records: ordered mappings from field name to [`Value`].

use std::collections::btree_map;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::validate::validate_identifier;
use crate::value::Value;

/// Name of the store-generated identifier field.
///
/// Every stored row carries it; callers may never supply it.
pub const RECORD_ID: &str = "record_id";

/// A single logical row.
///
/// Fields are kept sorted by name so that column lists and predicates built
/// from a record are deterministic. A field holding [`Value::Null`] is
/// treated as absent by every store operation.
///
/// # Examples
///
/// ```
/// use flexrecord_core::{Record, Value};
///
/// let record: Record = [("name", Value::from("bob")), ("age", Value::Null)]
///     .into_iter()
///     .collect();
///
/// assert_eq!(record.len(), 2);
/// assert!(record.without_nulls().get("age").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets `field`, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Iterates field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns a copy with every null-valued field dropped.
    ///
    /// A record holding only nulls becomes the empty record, which matches
    /// every row.
    pub fn without_nulls(&self) -> Record {
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the store-generated identifier, if this record came from a store.
    pub fn record_id(&self) -> Option<&str> {
        self.get(RECORD_ID).and_then(Value::as_str)
    }

    /// Checks that the record can be submitted by a caller.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::ReservedFieldConflict`] if the record carries
    /// [`RECORD_ID`] in any letter case (even with a null value),
    /// [`RecordError::InvalidIdentifier`] for a field name that cannot be a
    /// column name, or [`RecordError::DuplicateField`] if two field names
    /// differ only by case. Column names are case-insensitive, so such
    /// fields would land in the same column.
    pub fn validate(&self) -> Result<(), RecordError> {
        if let Some(name) = self
            .field_names()
            .find(|name| name.eq_ignore_ascii_case(RECORD_ID))
        {
            return Err(RecordError::ReservedFieldConflict(name.to_string()));
        }
        let mut seen = HashSet::with_capacity(self.len());
        for name in self.field_names() {
            validate_identifier(name)?;
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(RecordError::DuplicateField(name.to_string()));
            }
        }
        Ok(())
    }

    /// Builds a record from a JSON object of scalars.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnsupportedType`] if `json` is not an object or
    /// any field holds an array or object.
    ///
    /// # Examples
    ///
    /// ```
    /// use flexrecord_core::{Record, RecordError};
    ///
    /// let record = Record::from_json(serde_json::json!({"name": "alice", "age": 30})).unwrap();
    /// assert_eq!(record.len(), 2);
    ///
    /// let nested = Record::from_json(serde_json::json!({"tags": ["a", "b"]}));
    /// assert!(matches!(nested, Err(RecordError::UnsupportedType(_))));
    /// ```
    pub fn from_json(json: serde_json::Value) -> Result<Self, RecordError> {
        let serde_json::Value::Object(map) = json else {
            return Err(RecordError::UnsupportedType(
                "record must be a JSON object".into(),
            ));
        };
        map.into_iter()
            .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_nulls_drops_only_nulls() {
        let record = Record::new()
            .with("a", 1)
            .with("b", Value::Null)
            .with("c", "x");
        let filtered = record.without_nulls();
        assert_eq!(filtered.field_names().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_all_null_record_becomes_empty() {
        let record = Record::new().with("a", Value::Null).with("b", None::<i64>);
        assert!(record.without_nulls().is_empty());
    }

    #[test]
    fn test_validate_rejects_reserved_field() {
        let record = Record::new().with(RECORD_ID, "abc");
        assert_eq!(
            record.validate(),
            Err(RecordError::ReservedFieldConflict(RECORD_ID.to_string()))
        );

        let null_id = Record::new().with(RECORD_ID, Value::Null);
        assert!(null_id.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_reserved_field_in_any_case() {
        for name in ["RECORD_ID", "Record_Id", "record_ID"] {
            assert_eq!(
                Record::new().with(name, "forged").validate(),
                Err(RecordError::ReservedFieldConflict(name.to_string()))
            );
        }
    }

    #[test]
    fn test_validate_rejects_fields_differing_only_by_case() {
        let record = Record::new().with("name", "a").with("Name", "b");
        assert!(matches!(
            record.validate(),
            Err(RecordError::DuplicateField(_))
        ));

        // Not adjacent in name order.
        let record = Record::new().with("Name", 1).with("Zed", 2).with("name", 3);
        assert_eq!(
            record.validate(),
            Err(RecordError::DuplicateField("name".into()))
        );

        let distinct = Record::new().with("name", "a").with("names", "b");
        assert!(distinct.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_field_name() {
        let record = Record::new().with("bad name", 1);
        assert_eq!(
            record.validate(),
            Err(RecordError::InvalidIdentifier("bad name".into()))
        );
    }

    #[test]
    fn test_record_id_accessor() {
        let record = Record::new().with(RECORD_ID, "1234").with("x", 1);
        assert_eq!(record.record_id(), Some("1234"));
        assert_eq!(Record::new().record_id(), None);
    }

    #[test]
    fn test_from_json_non_object() {
        assert!(matches!(
            Record::from_json(serde_json::json!([1])),
            Err(RecordError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let record = Record::new().with("name", "alice").with("age", 30);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"age":30,"name":"alice"}"#);
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
