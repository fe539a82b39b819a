//! The filter tree: field comparisons, conjunctions and negations.
//!
//! A [`Filter`] holds no comparison logic. It is consumed by visitors (see
//! [`crate::visitor`]): the [`Matcher`](crate::matcher::Matcher) evaluates
//! it against one instance, [`SqlLowering`](crate::sql::SqlLowering) turns
//! it into a parameterized `WHERE` clause. Both read the same tree.
//!
//! ```rust
//! use sift_query::{Field, Filter, Operator};
//!
//! struct Track { title: String, year: Option<i64> }
//!
//! static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
//! static YEAR: Field<Track> = Field::integer("year", |t| t.year);
//!
//! let seventies = Filter::and([YEAR.ge(1970).unwrap(), YEAR.le(1980).unwrap()]);
//! let filter = Filter::and([seventies, Filter::compare(&TITLE, Operator::Like, "Rhap").unwrap()]);
//!
//! let track = Track { title: "Bohemian Rhapsody".into(), year: Some(1975) };
//! assert!(filter.matches(&track));
//! assert_eq!(
//!     filter.to_string(),
//!     "((year >= 1970 AND year <= 1980) AND title LIKE 'Rhap')"
//! );
//! ```

use std::fmt;

use crate::error::FilterError;
use crate::field::{Accessor, Field, IntegerAccessor, RealAccessor, TextAccessor};
use crate::operator::Operator;
use crate::value::{FieldKind, Literal};

/// Largest integer magnitude an `f64` represents exactly.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// A predicate over instances of `T`.
pub enum Filter<T: 'static> {
    /// Compare one field against a literal.
    Compare(FieldComparison<T>),
    /// Matches iff every child matches. Empty matches everything.
    And(Vec<Filter<T>>),
    /// Matches iff the child does not.
    Not(Box<Filter<T>>),
}

impl<T: 'static> Filter<T> {
    /// Build a field comparison.
    ///
    /// Fails with [`FilterError::KindMismatch`] when the literal's kind does
    /// not fit the field. An integer literal against a real field is widened
    /// to `f64` when that is exact; no other conversion happens.
    pub fn compare(
        field: &'static Field<T>,
        op: Operator,
        literal: impl Into<Literal>,
    ) -> Result<Self, FilterError> {
        FieldComparison::new(field, op, literal.into()).map(Self::Compare)
    }

    /// Conjunction of `filters`. Nested conjunctions are kept as they are.
    pub fn and(filters: impl IntoIterator<Item = Filter<T>>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    /// Negation of `filter`.
    pub fn not(filter: Filter<T>) -> Self {
        Self::Not(Box::new(filter))
    }

    /// The empty conjunction, matching everything.
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Combine with another filter using AND.
    ///
    /// Appends to `self` when it already is a conjunction.
    pub fn and_then(self, other: Filter<T>) -> Self {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Check if this is the empty conjunction.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::And(children) if children.is_empty())
    }

    /// Number of field comparisons in the tree.
    pub fn comparison_count(&self) -> usize {
        match self {
            Self::Compare(_) => 1,
            Self::And(children) => children.iter().map(Filter::comparison_count).sum(),
            Self::Not(child) => child.comparison_count(),
        }
    }
}

impl<T: 'static> Clone for Filter<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Compare(c) => Self::Compare(c.clone()),
            Self::And(children) => Self::And(children.clone()),
            Self::Not(child) => Self::Not(child.clone()),
        }
    }
}

impl<T: 'static> PartialEq for Filter<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Compare(a), Self::Compare(b)) => a == b,
            (Self::And(a), Self::And(b)) => a == b,
            (Self::Not(a), Self::Not(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: 'static> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(c) => f.debug_tuple("Compare").field(c).finish(),
            Self::And(children) => f.debug_tuple("And").field(children).finish(),
            Self::Not(child) => f.debug_tuple("Not").field(child).finish(),
        }
    }
}

impl<T: 'static> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare(c) => write!(f, "{}", c),
            Self::And(children) if children.is_empty() => f.write_str("TRUE"),
            Self::And(children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            Self::Not(child) => write!(f, "NOT ({})", child),
        }
    }
}

impl<T: 'static> Default for Filter<T> {
    fn default() -> Self {
        Self::all()
    }
}

/// A validated pairing of a field's extraction function with a literal of
/// the same kind.
pub enum Binding<T> {
    /// Text field and text literal.
    Text {
        /// Reads the field.
        get: TextAccessor<T>,
        /// The literal.
        literal: String,
    },
    /// Real field and real literal.
    Real {
        /// Reads the field.
        get: RealAccessor<T>,
        /// The literal, never NaN.
        literal: f64,
    },
    /// Integer field and integer literal.
    Integer {
        /// Reads the field.
        get: IntegerAccessor<T>,
        /// The literal.
        literal: i64,
    },
}

impl<T> Binding<T> {
    fn new(field: &Field<T>, literal: Literal) -> Result<Self, FilterError> {
        match (field.accessor(), literal) {
            (Accessor::Text(get), Literal::Text(literal)) => Ok(Self::Text { get, literal }),
            (Accessor::Real(_), Literal::Real(v)) if v.is_nan() => Err(FilterError::NanLiteral {
                field: field.name(),
            }),
            (Accessor::Real(get), Literal::Real(literal)) => Ok(Self::Real { get, literal }),
            (Accessor::Real(get), Literal::Integer(v)) if v.unsigned_abs() <= MAX_EXACT_INTEGER => {
                Ok(Self::Real {
                    get,
                    literal: v as f64,
                })
            }
            (Accessor::Integer(get), Literal::Integer(literal)) => {
                Ok(Self::Integer { get, literal })
            }
            (accessor, literal) => Err(FilterError::KindMismatch {
                field: field.name(),
                expected: accessor.kind(),
                actual: literal.kind(),
            }),
        }
    }

    /// The kind of this binding.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text { .. } => FieldKind::Text,
            Self::Real { .. } => FieldKind::Real,
            Self::Integer { .. } => FieldKind::Integer,
        }
    }

    /// The bound literal.
    pub fn literal(&self) -> Literal {
        match self {
            Self::Text { literal, .. } => Literal::Text(literal.clone()),
            Self::Real { literal, .. } => Literal::Real(*literal),
            Self::Integer { literal, .. } => Literal::Integer(*literal),
        }
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Text { get, literal } => Self::Text {
                get: *get,
                literal: literal.clone(),
            },
            Self::Real { get, literal } => Self::Real {
                get: *get,
                literal: *literal,
            },
            Self::Integer { get, literal } => Self::Integer {
                get: *get,
                literal: *literal,
            },
        }
    }
}

/// Leaf of the filter tree: `field <op> literal`.
pub struct FieldComparison<T: 'static> {
    field: &'static Field<T>,
    op: Operator,
    binding: Binding<T>,
}

impl<T: 'static> FieldComparison<T> {
    /// Build a comparison, checking the literal against the field kind.
    pub fn new(
        field: &'static Field<T>,
        op: Operator,
        literal: Literal,
    ) -> Result<Self, FilterError> {
        let binding = Binding::new(field, literal)?;
        Ok(Self { field, op, binding })
    }

    /// The compared field.
    pub fn field(&self) -> &'static Field<T> {
        self.field
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.op
    }

    /// The literal, after any widening applied at construction.
    pub fn literal(&self) -> Literal {
        self.binding.literal()
    }

    /// The kind-checked field/literal pair.
    pub fn binding(&self) -> &Binding<T> {
        &self.binding
    }
}

impl<T: 'static> Clone for FieldComparison<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            op: self.op,
            binding: self.binding.clone(),
        }
    }
}

impl<T: 'static> PartialEq for FieldComparison<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.field, other.field)
            && self.op == other.op
            && self.literal() == other.literal()
    }
}

impl<T: 'static> fmt::Debug for FieldComparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldComparison")
            .field("field", &self.field.name())
            .field("op", &self.op)
            .field("literal", &self.literal())
            .finish()
    }
}

impl<T: 'static> fmt::Display for FieldComparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field.name(),
            self.op.symbol(),
            self.literal()
        )
    }
}

macro_rules! comparison_shorthands {
    ($($(#[$doc:meta])* $name:ident => $op:ident),+ $(,)?) => {
        impl<T: 'static> Field<T> {
            $(
                $(#[$doc])*
                pub fn $name(&'static self, literal: impl Into<Literal>) -> Result<Filter<T>, FilterError> {
                    Filter::compare(self, Operator::$op, literal)
                }
            )+
        }
    };
}

comparison_shorthands! {
    /// `field = literal`.
    eq => Eq,
    /// `field != literal`.
    ne => Neq,
    /// `field > literal`.
    gt => Gt,
    /// `field < literal`.
    lt => Lt,
    /// `field >= literal`.
    ge => Ge,
    /// `field <= literal`.
    le => Le,
    /// The literal occurs in the field's text.
    like => Like,
    /// The literal does not occur in the field's text.
    not_like => NotLike,
}
