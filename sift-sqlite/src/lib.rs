//! SQLite backend for sift queries.
//!
//! This crate runs lowered sift statements on SQLite through
//! `tokio-rusqlite`, streaming rows back one at a time.
//!
//! # Features
//!
//! - Async/await support via `tokio-rusqlite`
//! - Row streaming with a bounded read-ahead buffer
//! - Table creation and inserts from sift table declarations
//! - In-memory and file-based databases
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_sqlite::{SqliteBackend, SqliteConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = SqliteBackend::open(SqliteConfig::from_url("sqlite://./music.db")?).await?;
//!     backend.create_table(&TRACKS).await?;
//!
//!     let mut titles = Query::new(Titles, YEAR.ge(1970)?).execute(&backend).await?;
//!     while let Some(title) = titles.next().await {
//!         println!("{}", title?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::{DATABASE_URL_VAR, DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use engine::{SqliteBackend, create_table_sql, insert_statement};
pub use error::{SqliteError, SqliteResult};
