//! Comparison operators.
//!
//! The set is closed: every match over [`Operator`] is exhaustive, so
//! comparison code cannot meet an operator it does not know. Operators that
//! enter from outside (a saved filter, a user string) go through
//! [`Operator::from_str`], which rejects unknown names with
//! [`FilterError::UnsupportedOperator`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// Comparison operator of a field comparison.
///
/// `Eq`..`Le` compare by equality or ordering. `Like`/`NotLike` test
/// substring containment: of the text itself for text fields, of the
/// canonical decimal text for numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Literal is contained in the value.
    Like,
    /// Literal is not contained in the value.
    NotLike,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 8] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Lt,
        Self::Ge,
        Self::Le,
        Self::Like,
        Self::NotLike,
    ];

    /// Returns `true` for `Like` and `NotLike`.
    pub fn is_containment(self) -> bool {
        matches!(self, Self::Like | Self::NotLike)
    }

    /// Evaluates this operator from the two facts it may depend on.
    ///
    /// `ordering` is `value` compared to the literal and `contained` tells
    /// whether the literal's text occurs in the value's text. Both are lazy
    /// so each operator computes only what it needs.
    pub fn eval(
        self,
        ordering: impl FnOnce() -> Ordering,
        contained: impl FnOnce() -> bool,
    ) -> bool {
        match self {
            Self::Eq => ordering() == Ordering::Equal,
            Self::Neq => ordering() != Ordering::Equal,
            Self::Gt => ordering() == Ordering::Greater,
            Self::Lt => ordering() == Ordering::Less,
            Self::Ge => ordering() != Ordering::Less,
            Self::Le => ordering() != Ordering::Greater,
            Self::Like => contained(),
            Self::NotLike => !contained(),
        }
    }

    /// The operator's name, as accepted by `from_str`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Ge => "GE",
            Self::Le => "LE",
            Self::Like => "LIKE",
            Self::NotLike => "NOT_LIKE",
        }
    }

    /// The symbol used in filter descriptions and, for the ordering
    /// operators, in generated SQL.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    /// Parses an operator name or symbol, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "EQ" | "=" | "==" => Ok(Self::Eq),
            "NEQ" | "NE" | "!=" | "<>" => Ok(Self::Neq),
            "GT" | ">" => Ok(Self::Gt),
            "LT" | "<" => Ok(Self::Lt),
            "GE" | "GTE" | ">=" => Ok(Self::Ge),
            "LE" | "LTE" | "<=" => Ok(Self::Le),
            "LIKE" => Ok(Self::Like),
            "NOT_LIKE" | "NOTLIKE" => Ok(Self::NotLike),
            _ => Err(FilterError::UnsupportedOperator(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_ordering(op: Operator, ordering: Ordering) -> bool {
        op.eval(|| ordering, || panic!("containment not needed for {op}"))
    }

    #[test]
    fn test_eval_ordering_operators() {
        assert!(by_ordering(Operator::Eq, Ordering::Equal));
        assert!(!by_ordering(Operator::Eq, Ordering::Less));

        assert!(!by_ordering(Operator::Neq, Ordering::Equal));
        assert!(by_ordering(Operator::Neq, Ordering::Greater));

        assert!(by_ordering(Operator::Gt, Ordering::Greater));
        assert!(!by_ordering(Operator::Gt, Ordering::Equal));

        assert!(by_ordering(Operator::Ge, Ordering::Equal));
        assert!(!by_ordering(Operator::Ge, Ordering::Less));

        assert!(by_ordering(Operator::Lt, Ordering::Less));
        assert!(!by_ordering(Operator::Lt, Ordering::Equal));

        assert!(by_ordering(Operator::Le, Ordering::Equal));
        assert!(!by_ordering(Operator::Le, Ordering::Greater));
    }

    #[test]
    fn test_eval_is_lazy() {
        let like = Operator::Like.eval(|| panic!("ordering not needed"), || true);
        assert!(like);

        let gt = Operator::Gt.eval(|| Ordering::Greater, || panic!("containment not needed"));
        assert!(gt);

        assert!(!Operator::NotLike.eval(|| panic!("ordering not needed"), || true));
        assert!(Operator::NotLike.eval(|| panic!("ordering not needed"), || false));
    }

    #[test]
    fn test_from_str_roundtrips_names() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>(), Ok(op));
        }
    }

    #[test]
    fn test_from_str_accepts_symbols() {
        assert_eq!("=".parse::<Operator>(), Ok(Operator::Eq));
        assert_eq!("<>".parse::<Operator>(), Ok(Operator::Neq));
        assert_eq!(">=".parse::<Operator>(), Ok(Operator::Ge));
        assert_eq!("not like".parse::<Operator>(), Ok(Operator::NotLike));
        assert_eq!("lte".parse::<Operator>(), Ok(Operator::Le));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "BETWEEN".parse::<Operator>().unwrap_err();
        assert_eq!(err, FilterError::UnsupportedOperator("BETWEEN".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Operator::NotLike.to_string(), "NOT_LIKE");
        assert_eq!(Operator::Ge.symbol(), ">=");
    }
}
