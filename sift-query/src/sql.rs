//! Lowering filters to parameterized SQL.
//!
//! The generated SQL targets SQLite and binds every literal as a `?`
//! parameter. Each comparison is guarded with `IS NOT NULL`, so a row whose
//! column is NULL fails every comparison and `NOT` behaves as a plain
//! complement, exactly as the in-memory [`Matcher`](crate::matcher::Matcher)
//! does.
//!
//! | Comparison              | SQL                                                        |
//! |-------------------------|------------------------------------------------------------|
//! | `EQ`..`LE`              | `("c" IS NOT NULL AND "c" <op> ?)`                         |
//! | text `LIKE`             | `("c" IS NOT NULL AND instr("c", ?) > 0)`                  |
//! | integer `LIKE`          | `("c" IS NOT NULL AND instr(CAST("c" AS TEXT), ?) > 0)`    |
//! | real `LIKE`             | `("c" IS NOT NULL AND instr(printf('%.15g', "c"), ?) > 0)` |
//! | `NOT_LIKE`              | as `LIKE`, with `= 0`                                      |
//! | empty conjunction       | `TRUE`                                                     |
//!
//! `instr` rather than `LIKE` keeps containment case-sensitive and free of
//! wildcard characters.

use std::fmt;

use tracing::debug;

use crate::field::{Field, IntegerAccessor, RealAccessor, TextAccessor};
use crate::filter::{FieldComparison, Filter};
use crate::operator::Operator;
use crate::value::{SqlValue, format_real};
use crate::visitor::{FilterVisitor, ValueVisitor};

/// Quote an identifier, doubling embedded quotes.
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// A SQL string with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// A statement from raw parts.
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `SELECT <columns> FROM <table> WHERE <filter>`.
    ///
    /// `column` maps each field the filter references to its column name.
    pub fn select<T: 'static>(
        table: &str,
        columns: &[&str],
        filter: &Filter<T>,
        column: &dyn Fn(&'static Field<T>) -> &'static str,
    ) -> Self {
        let mut builder = SqlBuilder::new();
        builder.push("SELECT ");
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push_identifier(name);
        }
        builder
            .push(" FROM ")
            .push_identifier(table)
            .push(" WHERE ");
        SqlLowering::new(&mut builder, column).lower(filter);
        let statement = builder.build();
        debug!(sql = %statement.sql, params = statement.params.len(), "Lowered filter");
        statement
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Split into SQL text and parameters.
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Incremental SQL writer collecting `?` parameters.
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a literal SQL fragment.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a `?` placeholder bound to `value`.
    pub fn push_param(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    /// Push a quoted identifier.
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&escape_identifier(name));
        self
    }

    /// The SQL written so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters collected so far.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Finish into a [`Statement`].
    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Writes a filter as a boolean SQL expression into a [`SqlBuilder`].
pub struct SqlLowering<'a, T: 'static> {
    builder: &'a mut SqlBuilder,
    column: &'a dyn Fn(&'static Field<T>) -> &'static str,
}

impl<'a, T: 'static> SqlLowering<'a, T> {
    /// Lower into `builder`, naming columns with `column`.
    pub fn new(
        builder: &'a mut SqlBuilder,
        column: &'a dyn Fn(&'static Field<T>) -> &'static str,
    ) -> Self {
        Self { builder, column }
    }

    /// Append `filter` to the builder.
    pub fn lower(&mut self, filter: &Filter<T>) {
        filter.accept(self);
    }

    /// Lower `filter` on its own, using field names as column names.
    pub fn where_clause(filter: &Filter<T>) -> Statement {
        let mut builder = SqlBuilder::new();
        let by_name = |field: &'static Field<T>| field.name();
        SqlLowering::new(&mut builder, &by_name).lower(filter);
        builder.build()
    }

    /// Open the null guard for `field` and return its quoted column.
    fn guard(&mut self, field: &'static Field<T>) -> String {
        let column = escape_identifier((self.column)(field));
        self.builder
            .push("(")
            .push(&column)
            .push(" IS NOT NULL AND ");
        column
    }

    fn ordering(&mut self, column: &str, op: Operator, param: SqlValue) {
        self.builder
            .push(column)
            .push(" ")
            .push(op.symbol())
            .push(" ")
            .push_param(param)
            .push(")");
    }

    fn containment(&mut self, haystack: &str, op: Operator, needle: String) {
        let test = if op == Operator::Like { " > 0)" } else { " = 0)" };
        self.builder
            .push("instr(")
            .push(haystack)
            .push(", ")
            .push_param(SqlValue::Text(needle))
            .push(")")
            .push(test);
    }
}

impl<T: 'static> FilterVisitor<T> for SqlLowering<'_, T> {
    type Output = ();

    fn visit_comparison(&mut self, comparison: &FieldComparison<T>) {
        comparison.accept_value(self);
    }

    fn visit_and(&mut self, children: &[Filter<T>]) {
        if children.is_empty() {
            self.builder.push("TRUE");
            return;
        }
        self.builder.push("(");
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.builder.push(" AND ");
            }
            child.accept(self);
        }
        self.builder.push(")");
    }

    fn visit_not(&mut self, child: &Filter<T>) {
        self.builder.push("NOT (");
        child.accept(self);
        self.builder.push(")");
    }
}

impl<T: 'static> ValueVisitor<T> for SqlLowering<'_, T> {
    type Output = ();

    fn visit_text(
        &mut self,
        field: &'static Field<T>,
        _get: TextAccessor<T>,
        op: Operator,
        literal: &str,
    ) {
        let column = self.guard(field);
        if op.is_containment() {
            self.containment(&column, op, literal.to_string());
        } else {
            self.ordering(&column, op, SqlValue::Text(literal.to_string()));
        }
    }

    fn visit_real(
        &mut self,
        field: &'static Field<T>,
        _get: RealAccessor<T>,
        op: Operator,
        literal: f64,
    ) {
        let column = self.guard(field);
        if op.is_containment() {
            let haystack = format!("printf('%.15g', {})", column);
            self.containment(&haystack, op, format_real(literal));
        } else {
            self.ordering(&column, op, SqlValue::Real(literal));
        }
    }

    fn visit_integer(
        &mut self,
        field: &'static Field<T>,
        _get: IntegerAccessor<T>,
        op: Operator,
        literal: i64,
    ) {
        let column = self.guard(field);
        if op.is_containment() {
            let haystack = format!("CAST({} AS TEXT)", column);
            self.containment(&haystack, op, literal.to_string());
        } else {
            self.ordering(&column, op, SqlValue::Integer(literal));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Track {
        title: String,
        length: f64,
        year: i64,
    }

    static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
    static LENGTH: Field<Track> = Field::real("length", |t| Some(t.length));
    static YEAR: Field<Track> = Field::integer("year", |t| Some(t.year));

    fn lower(filter: &Filter<Track>) -> (String, Vec<SqlValue>) {
        SqlLowering::where_clause(filter).into_parts()
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("year"), "\"year\"");
        assert_eq!(escape_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_lower_ordering() {
        let (sql, params) = lower(&YEAR.ge(1970).unwrap());
        assert_eq!(sql, "(\"year\" IS NOT NULL AND \"year\" >= ?)");
        assert_eq!(params, vec![SqlValue::Integer(1970)]);

        let (sql, params) = lower(&TITLE.ne("x").unwrap());
        assert_eq!(sql, "(\"title\" IS NOT NULL AND \"title\" != ?)");
        assert_eq!(params, vec![SqlValue::Text("x".into())]);
    }

    #[test]
    fn test_lower_widened_literal_binds_real() {
        let (_, params) = lower(&LENGTH.eq(2).unwrap());
        assert_eq!(params, vec![SqlValue::Real(2.0)]);
    }

    #[test]
    fn test_lower_containment() {
        let (sql, params) = lower(&TITLE.like("Rhap").unwrap());
        assert_eq!(sql, "(\"title\" IS NOT NULL AND instr(\"title\", ?) > 0)");
        assert_eq!(params, vec![SqlValue::Text("Rhap".into())]);

        let (sql, params) = lower(&YEAR.not_like(197).unwrap());
        assert_eq!(
            sql,
            "(\"year\" IS NOT NULL AND instr(CAST(\"year\" AS TEXT), ?) = 0)"
        );
        assert_eq!(params, vec![SqlValue::Text("197".into())]);

        let (sql, params) = lower(&LENGTH.like(2.5).unwrap());
        assert_eq!(
            sql,
            "(\"length\" IS NOT NULL AND instr(printf('%.15g', \"length\"), ?) > 0)"
        );
        assert_eq!(params, vec![SqlValue::Text("2.5".into())]);
    }

    #[test]
    fn test_lower_composites() {
        assert_eq!(lower(&Filter::all()).0, "TRUE");

        let (sql, params) = lower(&Filter::and([
            YEAR.eq(1975).unwrap(),
            Filter::not(TITLE.like("Live").unwrap()),
        ]));
        assert_eq!(
            sql,
            "((\"year\" IS NOT NULL AND \"year\" = ?) AND \
             NOT ((\"title\" IS NOT NULL AND instr(\"title\", ?) > 0)))"
        );
        assert_eq!(
            params,
            vec![SqlValue::Integer(1975), SqlValue::Text("Live".into())]
        );
    }

    #[test]
    fn test_select_statement() {
        let columns = |field: &'static Field<Track>| match field.name() {
            "title" => "song_title",
            other => other,
        };
        let statement = Statement::select(
            "tracks",
            &["song_title", "year"],
            &TITLE.eq("x").unwrap(),
            &columns,
        );
        assert_eq!(
            statement.sql(),
            "SELECT \"song_title\", \"year\" FROM \"tracks\" WHERE \
             (\"song_title\" IS NOT NULL AND \"song_title\" = ?)"
        );
        assert_eq!(statement.params().len(), 1);
        assert_eq!(statement.to_string(), statement.sql());
    }

    #[test]
    fn test_builder() {
        let mut builder = SqlBuilder::new();
        builder
            .push("x = ")
            .push_param(SqlValue::Integer(1))
            .push(" AND ")
            .push_identifier("y");
        assert_eq!(builder.sql(), "x = ? AND \"y\"");
        assert_eq!(builder.params(), &[SqlValue::Integer(1)]);
    }

    #[test]
    fn test_lowered_filter_is_the_matched_filter() {
        let track = Track {
            title: "Bohemian Rhapsody".into(),
            length: 354.0,
            year: 1975,
        };
        let filter = Filter::and([YEAR.like(197).unwrap(), LENGTH.gt(300).unwrap()]);
        assert!(filter.matches(&track));
        assert_eq!(
            lower(&filter).1,
            vec![SqlValue::Text("197".into()), SqlValue::Real(300.0)]
        );
    }
}
