//! Field descriptors and table declarations.
//!
//! A [`Field`] names one typed field of a record type and knows how to read
//! it from an instance. Fields are declared once, usually as `static`
//! items, and referenced by every filter that compares against them:
//!
//! ```rust
//! use sift_query::{Field, Table};
//!
//! pub struct Track {
//!     pub title: String,
//!     pub year: Option<i64>,
//! }
//!
//! pub static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
//! pub static YEAR: Field<Track> = Field::integer("year", |t| t.year);
//! pub static TRACKS: Table<Track> = Table::new("tracks", &[&TITLE, &YEAR]);
//!
//! let track = Track { title: "Bohemian Rhapsody".into(), year: Some(1975) };
//! assert!(YEAR.like(197).unwrap().matches(&track));
//! assert_eq!(TRACKS.field("title").map(|f| f.name()), Some("title"));
//! ```

use std::fmt;

use crate::value::{FieldKind, Literal, SqlValue};

/// Reads a text field.
pub type TextAccessor<T> = for<'a> fn(&'a T) -> Option<&'a str>;
/// Reads a real field.
pub type RealAccessor<T> = fn(&T) -> Option<f64>;
/// Reads an integer field.
pub type IntegerAccessor<T> = fn(&T) -> Option<i64>;

/// The extraction function of a field, tagged with its kind.
pub enum Accessor<T> {
    /// Text extraction.
    Text(TextAccessor<T>),
    /// Real extraction.
    Real(RealAccessor<T>),
    /// Integer extraction.
    Integer(IntegerAccessor<T>),
}

impl<T> Accessor<T> {
    /// The kind this accessor produces.
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Real(_) => FieldKind::Real,
            Self::Integer(_) => FieldKind::Integer,
        }
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Accessor<T> {}

/// A typed, named field of record type `T`.
pub struct Field<T> {
    name: &'static str,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    /// Declare a text field.
    pub const fn text(name: &'static str, get: TextAccessor<T>) -> Self {
        Self {
            name,
            accessor: Accessor::Text(get),
        }
    }

    /// Declare a real field.
    pub const fn real(name: &'static str, get: RealAccessor<T>) -> Self {
        Self {
            name,
            accessor: Accessor::Real(get),
        }
    }

    /// Declare an integer field.
    pub const fn integer(name: &'static str, get: IntegerAccessor<T>) -> Self {
        Self {
            name,
            accessor: Accessor::Integer(get),
        }
    }

    /// The field name, also its default column name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The field's value kind.
    pub const fn kind(&self) -> FieldKind {
        self.accessor.kind()
    }

    /// The kind-tagged extraction function.
    pub const fn accessor(&self) -> Accessor<T> {
        self.accessor
    }

    /// Read this field from an instance.
    ///
    /// A real NaN is reported as absent: no backend can store it as a value.
    pub fn extract(&self, instance: &T) -> Option<Literal> {
        match self.accessor {
            Accessor::Text(get) => get(instance).map(|s| Literal::Text(s.to_string())),
            Accessor::Real(get) => get(instance)
                .filter(|v| !v.is_nan())
                .map(Literal::Real),
            Accessor::Integer(get) => get(instance).map(Literal::Integer),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A named, ordered set of fields for record type `T`.
///
/// The declaration order is the column order used for DDL and row encoding.
pub struct Table<T: 'static> {
    name: &'static str,
    fields: &'static [&'static Field<T>],
}

impl<T: 'static> Table<T> {
    /// Declare a table.
    pub const fn new(name: &'static str, fields: &'static [&'static Field<T>]) -> Self {
        Self { name, fields }
    }

    /// The table name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// All fields in declaration order.
    pub const fn fields(&self) -> &'static [&'static Field<T>] {
        self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static Field<T>> {
        self.fields.iter().copied().find(|f| f.name() == name)
    }

    /// Extract every field of `instance`, in declaration order.
    pub fn row(&self, instance: &T) -> Vec<SqlValue> {
        self.fields
            .iter()
            .map(|f| SqlValue::from(f.extract(instance)))
            .collect()
    }
}

impl<T: 'static> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}
