//! Error types for SQLite operations.

use thiserror::Error;

use sift_query::error::QueryError;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection thread is gone.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement could not be built.
    #[error("Query error: {0}")]
    Query(String),

    /// A cell could not be decoded.
    #[error("Decode error in column '{column}': {message}")]
    Decode {
        /// The column name.
        column: String,
        /// What went wrong.
        message: String,
    },
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a decode error.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(tokio_rusqlite::Error::Rusqlite(err))
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Config(msg) => QueryError::configuration(msg),
            SqliteError::Connection(msg) => QueryError::connection(msg),
            SqliteError::Decode { column, message } => QueryError::decode(column, message),
            err @ (SqliteError::Sqlite(_) | SqliteError::Query(_)) => {
                QueryError::backend(err.to_string()).with_source(err)
            }
        }
    }
}
