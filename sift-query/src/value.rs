//! Value kinds, comparison literals and backend values.

use std::fmt;

/// The value kind of a field. Fixed when the field is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// 64-bit floating point.
    Real,
    /// 64-bit signed integer.
    Integer,
}

impl FieldKind {
    /// Lowercase name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Real => "real",
            Self::Integer => "integer",
        }
    }

    /// Column type used when declaring a table for this kind.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Real => "REAL",
            Self::Integer => "INTEGER",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed comparison constant. Literals are never absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Text literal.
    Text(String),
    /// Real literal.
    Real(f64),
    /// Integer literal.
    Integer(i64),
}

impl Literal {
    /// The kind of this literal.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Real(_) => FieldKind::Real,
            Self::Integer(_) => FieldKind::Integer,
        }
    }

    /// Canonical text form: the text itself, or the canonical decimal
    /// rendering of a number.
    pub fn canonical_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Real(v) => format_real(*v),
            Self::Integer(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Real(v) => f.write_str(&format_real(*v)),
            Self::Integer(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Self::Real(f64::from(v))
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

/// A value as a backend sees it: a bound parameter or a decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Integer cell.
    Integer(i64),
    /// Real cell.
    Real(f64),
    /// Text cell.
    Text(String),
    /// Blob cell.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the storage class, used in decode errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

impl From<Literal> for SqlValue {
    fn from(v: Literal) -> Self {
        match v {
            Literal::Text(s) => Self::Text(s),
            Literal::Real(f) => Self::Real(f),
            Literal::Integer(i) => Self::Integer(i),
        }
    }
}

impl<T: Into<Literal>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into().into(),
            None => Self::Null,
        }
    }
}

/// Significant digits in the canonical real rendering.
const REAL_PRECISION: i32 = 15;

/// Render a real the way C's `%.15g` does (and therefore SQLite's
/// `printf('%.15g', x)`).
///
/// Fifteen significant digits, trailing zeros removed, scientific notation
/// with at least two exponent digits when the decimal exponent is below -4
/// or at least 15. Both zeros render as `0`; infinities as `Inf`/`-Inf`.
///
/// ```rust
/// use sift_query::value::format_real;
///
/// assert_eq!(format_real(2.0), "2");
/// assert_eq!(format_real(1975.5), "1975.5");
/// assert_eq!(format_real(0.1 + 0.2), "0.3");
/// assert_eq!(format_real(1e20), "1e+20");
/// assert_eq!(format_real(0.00001), "1e-05");
/// ```
pub fn format_real(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let sign = if v < 0.0 { "-" } else { "" };
    // `{:e}` rounds correctly, so the exponent already reflects carries
    // such as 9.999...e2 -> 1.000...e3.
    let sci = format!("{:.*e}", (REAL_PRECISION - 1) as usize, v.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();

    if exp < -4 || exp >= REAL_PRECISION {
        let (head, tail) = digits.split_at(1);
        let tail = tail.trim_end_matches('0');
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{}{}e{}{:02}", sign, head, exp_sign, exp.abs())
        } else {
            format!("{}{}.{}e{}{:02}", sign, head, tail, exp_sign, exp.abs())
        }
    } else if exp >= 0 {
        let split = (exp + 1) as usize;
        let (int_part, frac_part) = digits.split_at(split);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            format!("{}{}", sign, int_part)
        } else {
            format!("{}{}.{}", sign, int_part, frac_part)
        }
    } else {
        let zeros = "0".repeat((-exp - 1) as usize);
        let frac = digits.trim_end_matches('0');
        format!("{}0.{}{}", sign, zeros, frac)
    }
}
