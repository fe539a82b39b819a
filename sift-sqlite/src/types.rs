//! Conversions between sift values and SQLite values.

use rusqlite::types::{Value, ValueRef};

use sift_query::SqlValue;

use crate::error::{SqliteError, SqliteResult};

/// Convert a bound parameter to a SQLite value.
pub fn to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(b) => Value::Blob(b.clone()),
    }
}

/// Convert a SQLite cell of `column`. Text must be valid UTF-8.
pub fn from_sqlite_value(column: &str, value: ValueRef<'_>) -> SqliteResult<SqlValue> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => SqlValue::Text(s.to_string()),
            Err(e) => return Err(SqliteError::decode(column, e.to_string())),
        },
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

/// Read every column of `row`.
pub fn decode_row(row: &rusqlite::Row<'_>, columns: &[String]) -> SqliteResult<Vec<SqlValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| from_sqlite_value(column, row.get_ref(i)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_sqlite_value() {
        assert_eq!(to_sqlite_value(&SqlValue::Null), Value::Null);
        assert_eq!(to_sqlite_value(&SqlValue::Integer(7)), Value::Integer(7));
        assert_eq!(to_sqlite_value(&SqlValue::Real(2.5)), Value::Real(2.5));
        assert_eq!(
            to_sqlite_value(&SqlValue::Text("x".into())),
            Value::Text("x".into())
        );
    }

    #[test]
    fn test_from_sqlite_value() {
        assert_eq!(
            from_sqlite_value("c", ValueRef::Text(b"Rhapsody")).unwrap(),
            SqlValue::Text("Rhapsody".into())
        );
        assert_eq!(
            from_sqlite_value("c", ValueRef::Real(354.0)).unwrap(),
            SqlValue::Real(354.0)
        );
        assert!(from_sqlite_value("c", ValueRef::Null).unwrap().is_null());
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let err = from_sqlite_value("title", ValueRef::Text(&[0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, SqliteError::Decode { ref column, .. } if column == "title"));
    }

    #[test]
    fn test_decode_row() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = conn
            .query_row("SELECT 'x', 1.5, NULL", [], |row| {
                Ok(decode_row(row, &columns))
            })
            .unwrap()
            .unwrap();
        assert_eq!(
            values,
            vec![SqlValue::Text("x".into()), SqlValue::Real(1.5), SqlValue::Null]
        );
    }
}
