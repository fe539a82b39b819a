//! # Sift
//!
//! Type-safe filters over your own record types, evaluated identically in
//! memory and in SQLite.
//!
//! Sift provides:
//! - Field descriptors with a fixed value kind (text, real, integer)
//! - A filter tree of comparisons, conjunctions and negations, checked for
//!   kind mismatches when it is built
//! - An in-memory matcher for live updates
//! - Lowering of the same filter to parameterized SQL and a streaming
//!   SQLite backend for initial loads
//!
//! A stored record is returned by [`Query::execute`] exactly when
//! [`Query::matches`] accepts it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift::prelude::*;
//!
//! pub struct Track { pub title: String, pub year: Option<i64> }
//!
//! pub static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
//! pub static YEAR: Field<Track> = Field::integer("year", |t| t.year);
//! pub static TRACKS: Table<Track> = Table::new("tracks", &[&TITLE, &YEAR]);
//!
//! struct Titles;
//!
//! impl Selector<Track> for Titles {
//!     type Output = String;
//!     fn table(&self) -> &'static Table<Track> { &TRACKS }
//!     fn project(&self, t: &Track) -> String { t.title.clone() }
//!     fn decode(&self, row: &Row) -> QueryResult<String> {
//!         Ok(row.text("title")?.unwrap_or_default())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> QueryResult<()> {
//!     let backend = SqliteBackend::memory().await?;
//!     backend.create_table(&TRACKS).await?;
//!
//!     let query = Query::new(Titles, Filter::and([YEAR.ge(1970)?, YEAR.le(1980)?]));
//!     let titles = query.execute(&backend).await?.try_collect_all().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use sift_query::*;

/// The SQLite backend.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use sift_sqlite::*;
}

#[cfg(feature = "sqlite")]
pub use sift_sqlite::{SqliteBackend, SqliteConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sift_query::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use sift_sqlite::{SqliteBackend, SqliteConfig};
}
