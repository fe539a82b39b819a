//! # sift-query
//!
//! Type-safe filters over record types, evaluated the same way in memory
//! and in a database.
//!
//! A filter is a tree of field comparisons, conjunctions and negations.
//! The tree is data; evaluation happens in visitors:
//! - [`Matcher`] decides whether one instance satisfies a filter, which is
//!   what a live view needs when an instance changes.
//! - [`SqlLowering`] turns the same tree into a parameterized `WHERE`
//!   clause, which is what a backend needs for the initial load.
//!
//! Both follow one set of rules, so an instance stored in the backend is
//! returned by a query exactly when the matcher accepts it.
//!
//! ## Fields
//!
//! Fields are declared once per record type, usually as statics:
//!
//! ```rust
//! use sift_query::{Field, Table};
//!
//! pub struct Track {
//!     pub title: String,
//!     pub length: Option<f64>,
//!     pub year: Option<i64>,
//! }
//!
//! pub static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
//! pub static LENGTH: Field<Track> = Field::real("length", |t| t.length);
//! pub static YEAR: Field<Track> = Field::integer("year", |t| t.year);
//! pub static TRACKS: Table<Track> = Table::new("tracks", &[&TITLE, &LENGTH, &YEAR]);
//! ```
//!
//! ## Filters
//!
//! ```rust
//! # use sift_query::{Field, Filter, FilterError, FieldKind};
//! # pub struct Track { pub title: String, pub length: Option<f64>, pub year: Option<i64> }
//! # pub static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
//! # pub static LENGTH: Field<Track> = Field::real("length", |t| t.length);
//! # pub static YEAR: Field<Track> = Field::integer("year", |t| t.year);
//! let filter = Filter::and([
//!     TITLE.like("Rhap").unwrap(),
//!     Filter::not(YEAR.lt(1970).unwrap()),
//! ]);
//!
//! let track = Track { title: "Bohemian Rhapsody".into(), length: Some(354.0), year: Some(1975) };
//! assert!(filter.matches(&track));
//!
//! // Literals must fit the field's kind.
//! assert_eq!(
//!     LENGTH.eq("long").unwrap_err(),
//!     FilterError::KindMismatch { field: "length", expected: FieldKind::Real, actual: FieldKind::Text },
//! );
//! ```
//!
//! ## Absent values
//!
//! A comparison against an absent value is false for every operator. See
//! [`matcher`] for the full rule.
//!
//! ## Error Handling
//!
//! ```rust
//! use sift_query::{ErrorCode, FilterError, QueryError};
//!
//! let err: QueryError = FilterError::UnsupportedOperator("BETWEEN".into()).into();
//! assert_eq!(err.code, ErrorCode::UnsupportedOperator);
//! assert!(err.is_filter_error());
//! ```

pub mod error;
pub mod field;
pub mod filter;
pub mod logging;
pub mod matcher;
pub mod operator;
pub mod query;
pub mod row;
pub mod sql;
pub mod value;
pub mod visitor;

pub use error::{ErrorCode, ErrorContext, FilterError, QueryError, QueryResult};
pub use field::{Accessor, Field, IntegerAccessor, RealAccessor, Table, TextAccessor};
pub use filter::{Binding, FieldComparison, Filter};
pub use matcher::Matcher;
pub use operator::Operator;
pub use query::{Backend, Execution, Query, RowStream, Selector, execute, get};
pub use row::Row;
pub use sql::{SqlBuilder, SqlLowering, Statement, escape_identifier};
pub use value::{FieldKind, Literal, SqlValue, format_real};
pub use visitor::{FieldCollector, FilterVisitor, ValueVisitor};

// Re-export logging utilities
pub use logging::{
    get_log_format, get_log_level, init as init_logging, init_debug, init_with_level,
    is_debug_enabled,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{FilterError, QueryError, QueryResult};
    pub use crate::field::{Field, Table};
    pub use crate::filter::Filter;
    pub use crate::operator::Operator;
    pub use crate::query::{Backend, Execution, Query, Selector};
    pub use crate::row::Row;
    pub use crate::value::{FieldKind, Literal};
}
