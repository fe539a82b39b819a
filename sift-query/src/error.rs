//! Error types for filter construction and query execution.
//!
//! Two layers:
//! - [`FilterError`] is returned while building a filter tree. It names the
//!   offending field and kinds and nothing else.
//! - [`QueryError`] is what query execution returns. It carries an
//!   [`ErrorCode`] for programmatic handling, context about which filter,
//!   table and SQL statement were involved, and the backend error as its
//!   `source`.
//!
//! # Error Codes
//!
//! Codes follow the pattern `S{category}{number}`:
//! - 1xxx: filter construction (kind mismatch, unsupported operator)
//! - 3xxx: connection errors
//! - 5xxx: execution errors (backend failures)
//! - 6xxx: data errors (row decoding)
//! - 7xxx: configuration errors
//! - 9xxx: internal errors
//!
//! ```rust
//! use sift_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::backend("no such table: tracks")
//!     .with_table("tracks")
//!     .with_filter("title LIKE 'Rhap'");
//! assert_eq!(err.code, ErrorCode::BackendExecution);
//! assert_eq!(err.code.code(), "S5001");
//! ```

use std::fmt;
use thiserror::Error;

use crate::value::FieldKind;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while building a filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The literal's kind cannot be compared with the field's kind.
    #[error("kind mismatch on field '{field}': field is {expected}, literal is {actual}")]
    KindMismatch {
        /// The field name.
        field: &'static str,
        /// The field's declared kind.
        expected: FieldKind,
        /// The kind of the rejected literal.
        actual: FieldKind,
    },

    /// A real literal was NaN, which no backend can store or compare.
    #[error("NaN literal for real field '{field}'")]
    NanLiteral {
        /// The field name.
        field: &'static str,
    },

    /// An operator name outside the eight recognized operators.
    #[error("operator '{0}' is not supported")]
    UnsupportedOperator(String),
}

impl FilterError {
    /// The error code this filter error maps to.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::KindMismatch { .. } => ErrorCode::KindMismatch,
            Self::NanLiteral { .. } => ErrorCode::NanLiteral,
            Self::UnsupportedOperator(_) => ErrorCode::UnsupportedOperator,
        }
    }
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// Literal kind does not match the field kind (S1001).
    KindMismatch = 1001,
    /// NaN used as a real literal (S1002).
    NanLiteral = 1002,
    /// Operator outside the recognized set (S1003).
    UnsupportedOperator = 1003,

    // Connection errors (3xxx)
    /// Backend connection failed or was closed (S3001).
    ConnectionFailed = 3001,

    // Execution errors (5xxx)
    /// The backend failed to execute a lowered statement (S5001).
    BackendExecution = 5001,

    // Data errors (6xxx)
    /// A row could not be decoded by the selector (S6001).
    Decode = 6001,

    // Configuration errors (7xxx)
    /// Invalid backend configuration (S7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::KindMismatch => "Literal kind does not match field kind",
            Self::NanLiteral => "NaN literal",
            Self::UnsupportedOperator => "Unsupported operator",
            Self::ConnectionFailed => "Backend connection failed",
            Self::BackendExecution => "Backend execution failed",
            Self::Decode => "Row decoding failed",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The table the selector reads from.
    pub table: Option<String>,
    /// The field or column involved.
    pub field: Option<String>,
    /// Description of the filter that triggered the error.
    pub filter: Option<String>,
    /// The SQL statement (if available).
    pub sql: Option<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.context.table = Some(table.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the filter description.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.context.filter = Some(filter.into());
        self
    }

    /// Set the SQL statement.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a backend execution error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendExecution, message)
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Backend connection failed: {}", message),
        )
    }

    /// Create a row decoding error for the given column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(
            ErrorCode::Decode,
            format!("Failed to decode column '{}': {}", column, message.into()),
        )
        .with_field(column)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Check if this error was raised while building a filter.
    pub fn is_filter_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::KindMismatch | ErrorCode::NanLiteral | ErrorCode::UnsupportedOperator
        )
    }

    /// Check if this error came from the backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::BackendExecution | ErrorCode::ConnectionFailed
        )
    }

    /// Display the full error with all context.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref table) = self.context.table {
            output.push_str(&format!("  → Table: {}\n", table));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref filter) = self.context.filter {
            output.push_str(&format!("  → Filter: {}\n", filter));
        }

        // SQL (truncated if too long)
        if let Some(ref sql) = self.context.sql {
            let sql_display = match sql.char_indices().nth(200) {
                Some((idx, _)) => format!("{}...", &sql[..idx]),
                None => sql.clone(),
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        if let Some(ref source) = self.source {
            output.push_str(&format!("\nCaused by: {}\n", source));
        }

        output
    }
}

impl From<FilterError> for QueryError {
    fn from(err: FilterError) -> Self {
        let mut query_err = QueryError::new(err.code(), err.to_string());
        match &err {
            FilterError::KindMismatch { field, .. } | FilterError::NanLiteral { field } => {
                query_err = query_err.with_field(*field);
            }
            FilterError::UnsupportedOperator(_) => {
                query_err = query_err.with_help(
                    "Recognized operators: EQ, NEQ, GT, LT, GE, LE, LIKE, NOT_LIKE",
                );
            }
        }
        query_err.with_source(err)
    }
}
