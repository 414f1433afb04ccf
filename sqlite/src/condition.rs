//! Exact-match predicates and insert clauses built from records.
//!
//! Both builders drop null fields, quote every column name, and emit
//! positional `?N` placeholders with a parallel parameter list, so no value
//! is ever interpolated into statement text.

use flexrecord_core::{Record, Value};
use rusqlite::types::Value as SqlValue;

use crate::convert::to_sql_value;
use crate::schema::quote_identifier;

/// A conjunctive equality predicate with its bound parameters.
///
/// An empty `clause` matches every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// `"a" = ?1 AND "b" = ?2`, or empty.
    pub clause: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlValue>,
    terms: Vec<(String, Value)>,
}

impl Predicate {
    /// Returns `true` if the predicate matches every row.
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Renders the clause with literals in place of placeholders.
    ///
    /// For logging only; execution always binds [`params`](Self::params).
    pub fn to_inline_sql(&self) -> String {
        self.terms
            .iter()
            .map(|(column, value)| format!("{} = {}", quote_identifier(column), value.sql_literal()))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Column list, placeholder list, and parameters for an `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertClause {
    /// `"a","b"`
    pub columns: String,
    /// `?1,?2`
    pub placeholders: String,
    /// Parameters aligned with `columns`.
    pub params: Vec<SqlValue>,
}

/// Builds an exact-match predicate over the non-null fields of `record`.
///
/// # Examples
///
/// ```
/// use flexrecord_core::{Record, Value};
/// use flexrecord_sqlite::exact_match;
///
/// let record = Record::new().with("name", "alice").with("age", 30).with("x", Value::Null);
/// let predicate = exact_match(&record);
/// assert_eq!(predicate.clause, r#""age" = ?1 AND "name" = ?2"#);
/// assert_eq!(predicate.params.len(), 2);
/// assert_eq!(predicate.to_inline_sql(), r#""age" = 30 AND "name" = 'alice'"#);
///
/// assert!(exact_match(&Record::new().with("x", Value::Null)).is_empty());
/// ```
pub fn exact_match(record: &Record) -> Predicate {
    let terms: Vec<(String, Value)> = record
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let clause = terms
        .iter()
        .enumerate()
        .map(|(idx, (column, _))| format!("{} = ?{}", quote_identifier(column), idx + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
    let params = terms.iter().map(|(_, v)| to_sql_value(v)).collect();

    Predicate {
        clause,
        params,
        terms,
    }
}

/// Builds the column/value lists for inserting the non-null fields of `record`.
///
/// Columns and placeholders are positionally aligned and every non-null
/// field appears exactly once.
///
/// # Examples
///
/// ```
/// use flexrecord_core::Record;
/// use flexrecord_sqlite::insert_clause;
///
/// let clause = insert_clause(&Record::new().with("name", "alice").with("age", 30));
/// assert_eq!(clause.columns, r#""age","name""#);
/// assert_eq!(clause.placeholders, "?1,?2");
/// ```
pub fn insert_clause(record: &Record) -> InsertClause {
    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());

    for (column, value) in record.iter().filter(|(_, v)| !v.is_null()) {
        columns.push(quote_identifier(column));
        placeholders.push(format!("?{}", params.len() + 1));
        params.push(to_sql_value(value));
    }

    InsertClause {
        columns: columns.join(","),
        placeholders: placeholders.join(","),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_empty_record() {
        let predicate = exact_match(&Record::new());
        assert!(predicate.is_empty());
        assert!(predicate.params.is_empty());
        assert_eq!(predicate.to_inline_sql(), "");
    }

    #[test]
    fn test_exact_match_all_null_equals_empty() {
        let nulls = Record::new().with("a", Value::Null).with("b", Value::Null);
        assert_eq!(exact_match(&nulls), exact_match(&Record::new()));
    }

    #[test]
    fn test_exact_match_binds_text_instead_of_inlining() {
        let record = Record::new().with("name", "x' OR '1'='1");
        let predicate = exact_match(&record);
        assert_eq!(predicate.clause, r#""name" = ?1"#);
        assert_eq!(
            predicate.params,
            vec![SqlValue::Text("x' OR '1'='1".to_string())]
        );
        assert_eq!(predicate.to_inline_sql(), r#""name" = 'x'' OR ''1''=''1'"#);
    }

    #[test]
    fn test_exact_match_bool_binds_integer() {
        let predicate = exact_match(&Record::new().with("active", true));
        assert_eq!(predicate.params, vec![SqlValue::Integer(1)]);
    }

    #[test]
    fn test_insert_clause_alignment() {
        let record = Record::new()
            .with("record_id", "id-1")
            .with("skip", Value::Null)
            .with("score", 2.5)
            .with("name", "bob");
        let clause = insert_clause(&record);
        assert_eq!(clause.columns, r#""name","record_id","score""#);
        assert_eq!(clause.placeholders, "?1,?2,?3");
        assert_eq!(
            clause.params,
            vec![
                SqlValue::Text("bob".to_string()),
                SqlValue::Text("id-1".to_string()),
                SqlValue::Real(2.5),
            ]
        );
    }
}
