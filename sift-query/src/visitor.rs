//! Double dispatch over filters.
//!
//! [`FilterVisitor`] is dispatched on the shape of the tree. At a leaf,
//! [`FieldComparison::accept_value`] dispatches a second time on the value
//! kind, handing a [`ValueVisitor`] the field's extraction function and the
//! literal with matching static types. A consumer implements both traits and
//! never downcasts.

use crate::field::{Field, IntegerAccessor, RealAccessor, TextAccessor};
use crate::filter::{Binding, FieldComparison, Filter};
use crate::operator::Operator;

/// Visits the structure of a [`Filter`].
pub trait FilterVisitor<T: 'static> {
    /// Result of visiting a node.
    type Output;

    /// Visit a field comparison.
    fn visit_comparison(&mut self, comparison: &FieldComparison<T>) -> Self::Output;

    /// Visit a conjunction.
    fn visit_and(&mut self, children: &[Filter<T>]) -> Self::Output;

    /// Visit a negation.
    fn visit_not(&mut self, child: &Filter<T>) -> Self::Output;
}

/// Visits a field comparison with its value kind resolved.
pub trait ValueVisitor<T: 'static> {
    /// Result of visiting a comparison.
    type Output;

    /// A text field compared with a text literal.
    fn visit_text(
        &mut self,
        field: &'static Field<T>,
        get: TextAccessor<T>,
        op: Operator,
        literal: &str,
    ) -> Self::Output;

    /// A real field compared with a real literal.
    fn visit_real(
        &mut self,
        field: &'static Field<T>,
        get: RealAccessor<T>,
        op: Operator,
        literal: f64,
    ) -> Self::Output;

    /// An integer field compared with an integer literal.
    fn visit_integer(
        &mut self,
        field: &'static Field<T>,
        get: IntegerAccessor<T>,
        op: Operator,
        literal: i64,
    ) -> Self::Output;
}

impl<T: 'static> Filter<T> {
    /// Dispatch this node to `visitor`.
    pub fn accept<V: FilterVisitor<T> + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Compare(c) => visitor.visit_comparison(c),
            Self::And(children) => visitor.visit_and(children),
            Self::Not(child) => visitor.visit_not(child),
        }
    }
}

impl<T: 'static> FieldComparison<T> {
    /// Dispatch this comparison to `visitor` by value kind.
    pub fn accept_value<V: ValueVisitor<T> + ?Sized>(&self, visitor: &mut V) -> V::Output {
        let (field, op) = (self.field(), self.operator());
        match self.binding() {
            Binding::Text { get, literal } => visitor.visit_text(field, *get, op, literal),
            Binding::Real { get, literal } => visitor.visit_real(field, *get, op, *literal),
            Binding::Integer { get, literal } => visitor.visit_integer(field, *get, op, *literal),
        }
    }
}

/// Collects the distinct fields a filter references, in first-seen order.
pub struct FieldCollector<T: 'static> {
    fields: Vec<&'static Field<T>>,
}

impl<T: 'static> FieldCollector<T> {
    /// Collect the fields of `filter`.
    pub fn collect(filter: &Filter<T>) -> Vec<&'static Field<T>> {
        let mut collector = Self { fields: Vec::new() };
        filter.accept(&mut collector);
        collector.fields
    }
}

impl<T: 'static> FilterVisitor<T> for FieldCollector<T> {
    type Output = ();

    fn visit_comparison(&mut self, comparison: &FieldComparison<T>) {
        let field = comparison.field();
        if !self.fields.iter().any(|f| std::ptr::eq(*f, field)) {
            self.fields.push(field);
        }
    }

    fn visit_and(&mut self, children: &[Filter<T>]) {
        for child in children {
            child.accept(self);
        }
    }

    fn visit_not(&mut self, child: &Filter<T>) {
        child.accept(self);
    }
}
