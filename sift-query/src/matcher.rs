//! In-memory evaluation of filters.
//!
//! # Absent values
//!
//! A comparison against an absent field value is false, whatever the
//! operator: `NEQ` and `NOT_LIKE` included. Negation and conjunction are
//! plain boolean logic over that result, so `NOT (x EQ 1)` is true for an
//! instance whose `x` is absent. SQL lowering guards every comparison with
//! `IS NOT NULL` to give the backend the same two-valued outcome.
//!
//! # Containment on numbers
//!
//! `LIKE` on a numeric field tests the literal's canonical text against the
//! value's canonical text: decimal for integers, [`format_real`] for reals.

use tracing::trace;

use crate::field::{Field, IntegerAccessor, RealAccessor, TextAccessor};
use crate::filter::{FieldComparison, Filter};
use crate::operator::Operator;
use crate::value::format_real;
use crate::visitor::{FilterVisitor, ValueVisitor};

/// Evaluates a filter against one instance.
pub struct Matcher<'a, T> {
    instance: &'a T,
}

impl<'a, T: 'static> Matcher<'a, T> {
    /// A matcher bound to `instance`.
    pub fn new(instance: &'a T) -> Self {
        Self { instance }
    }

    /// Evaluate `filter` against the bound instance.
    pub fn eval(&mut self, filter: &Filter<T>) -> bool {
        filter.accept(self)
    }

    /// Check if `instance` satisfies `filter`.
    pub fn matches(filter: &Filter<T>, instance: &'a T) -> bool {
        Self::new(instance).eval(filter)
    }
}

impl<T: 'static> Filter<T> {
    /// Check if `instance` satisfies this filter.
    pub fn matches(&self, instance: &T) -> bool {
        Matcher::matches(self, instance)
    }
}

impl<T: 'static> FilterVisitor<T> for Matcher<'_, T> {
    type Output = bool;

    fn visit_comparison(&mut self, comparison: &FieldComparison<T>) -> bool {
        comparison.accept_value(self)
    }

    fn visit_and(&mut self, children: &[Filter<T>]) -> bool {
        children.iter().all(|child| child.accept(self))
    }

    fn visit_not(&mut self, child: &Filter<T>) -> bool {
        !child.accept(self)
    }
}

impl<T: 'static> ValueVisitor<T> for Matcher<'_, T> {
    type Output = bool;

    fn visit_text(
        &mut self,
        field: &'static Field<T>,
        get: TextAccessor<T>,
        op: Operator,
        literal: &str,
    ) -> bool {
        let Some(value) = get(self.instance) else {
            trace!(field = field.name(), %op, "absent value");
            return false;
        };
        op.eval(|| value.cmp(literal), || value.contains(literal))
    }

    fn visit_real(
        &mut self,
        field: &'static Field<T>,
        get: RealAccessor<T>,
        op: Operator,
        literal: f64,
    ) -> bool {
        let Some(value) = get(self.instance).filter(|v| !v.is_nan()) else {
            trace!(field = field.name(), %op, "absent value");
            return false;
        };
        op.eval(
            // Neither side is NaN here.
            || value.partial_cmp(&literal).unwrap_or(std::cmp::Ordering::Equal),
            || format_real(value).contains(&format_real(literal)),
        )
    }

    fn visit_integer(
        &mut self,
        field: &'static Field<T>,
        get: IntegerAccessor<T>,
        op: Operator,
        literal: i64,
    ) -> bool {
        let Some(value) = get(self.instance) else {
            trace!(field = field.name(), %op, "absent value");
            return false;
        };
        op.eval(
            || value.cmp(&literal),
            || value.to_string().contains(&literal.to_string()),
        )
    }
}
