//! Backend-neutral result rows.
//!
//! A backend decodes each result row into a [`Row`]: the column names of the
//! statement (shared between all rows of one execution) and one
//! [`SqlValue`] per column. Selectors read typed values back out with
//! [`Row::text`], [`Row::real`] and [`Row::integer`], which treat SQL NULL as
//! `None` and report a storage class that cannot be read as the requested
//! kind as a decode error.

use std::sync::Arc;

use crate::error::{QueryError, QueryResult};
use crate::value::SqlValue;

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// A row over `columns`, with `values` in column order.
    ///
    /// A column without a value reads as a decode error.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `column`.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// The raw value of `column`.
    pub fn get(&self, column: &str) -> QueryResult<&SqlValue> {
        let index = self
            .index_of(column)
            .ok_or_else(|| QueryError::decode(column, "no such column in result"))?;
        self.values
            .get(index)
            .ok_or_else(|| QueryError::decode(column, "row has no value for column"))
    }

    /// Read a text column.
    pub fn text(&self, column: &str) -> QueryResult<Option<String>> {
        match self.get(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => Ok(Some(s.clone())),
            other => Err(mismatch(column, "text", other)),
        }
    }

    /// Read a real column. Integer cells are widened.
    pub fn real(&self, column: &str) -> QueryResult<Option<f64>> {
        match self.get(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Real(v) => Ok(Some(*v)),
            SqlValue::Integer(v) => Ok(Some(*v as f64)),
            other => Err(mismatch(column, "real", other)),
        }
    }

    /// Read an integer column.
    pub fn integer(&self, column: &str) -> QueryResult<Option<i64>> {
        match self.get(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(v) => Ok(Some(*v)),
            other => Err(mismatch(column, "integer", other)),
        }
    }
}

fn mismatch(column: &str, wanted: &str, found: &SqlValue) -> QueryError {
    QueryError::decode(
        column,
        format!("expected {}, found {}", wanted, found.type_name()),
    )
}
