//! Identifier validation.
//!
//! Field names become column names and table names are spliced into
//! statements, so both must be plain identifiers.

use crate::error::RecordError;

/// Validates that `name` is usable as a table or column name.
///
/// Names must be non-empty, contain only ASCII letters, digits and
/// underscores, and must not start with a digit.
///
/// # Examples
///
/// ```
/// use flexrecord_core::validate_identifier;
///
/// assert!(validate_identifier("table1").is_ok());
/// assert!(validate_identifier("first_name").is_ok());
/// assert!(validate_identifier("1st").is_err());
/// assert!(validate_identifier("name; DROP TABLE table1").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), RecordError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(RecordError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("table1").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("A_B_C").is_ok());
        assert!(validate_identifier("record_id").is_ok());
    }

    #[test]
    fn test_invalid_identifier_empty() {
        assert_eq!(
            validate_identifier(""),
            Err(RecordError::InvalidIdentifier(String::new()))
        );
    }

    #[test]
    fn test_invalid_identifier_leading_digit() {
        assert!(validate_identifier("9lives").is_err());
    }

    #[test]
    fn test_invalid_identifier_special_chars() {
        assert!(validate_identifier("drop;--").is_err());
        assert!(validate_identifier("hello world").is_err());
        assert!(validate_identifier("first-name").is_err());
        assert!(validate_identifier("a\"b").is_err());
    }

    #[test]
    fn test_invalid_identifier_non_ascii() {
        assert!(validate_identifier("café").is_err());
        assert!(validate_identifier("名前").is_err());
        assert!(validate_identifier("٣x").is_err());
    }
}
