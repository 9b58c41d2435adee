//! Predicate AST and interpreter.
//!
//! Filters are modeled as a closed set of tagged predicates instead of
//! duck-typed operator objects: every operator the store supports is a
//! variant, and evaluation is a small interpreter over rows. A `Filter` is a
//! conjunction of predicates; an empty filter matches every row.

use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;
use tabulon_core::{Row, Value};

/// A raw predicate over a whole row.
///
/// This is the local-only escape hatch: components that serialize queries
/// for external systems must skip it entirely.
pub type RowPredicate = Rc<dyn Fn(&Row) -> bool>;

/// One condition of a filter.
#[derive(Clone)]
pub enum Predicate {
    /// Field equals the value.
    Eq(String, Value),
    /// Field differs from the value (also matches an absent field).
    Ne(String, Value),
    /// Field is strictly less than the value.
    Lt(String, Value),
    /// Field is less than or equal to the value.
    Lte(String, Value),
    /// Field is strictly greater than the value.
    Gt(String, Value),
    /// Field is greater than or equal to the value.
    Gte(String, Value),
    /// Field is one of the values.
    In(String, Vec<Value>),
    /// Field is none of the values (also matches an absent field).
    Nin(String, Vec<Value>),
    /// Raw predicate over the whole row. Local-only.
    Where(RowPredicate),
    /// Every sub-filter matches. An empty sub-filter matches vacuously.
    And(Vec<Filter>),
    /// At least one sub-filter matches.
    Or(Vec<Filter>),
}

impl Predicate {
    /// Evaluates the predicate against a row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq(field, value) => row.get(field) == Some(value),
            Predicate::Ne(field, value) => row.get(field) != Some(value),
            Predicate::Lt(field, value) => Self::ordered(row, field, value, Ordering::is_lt),
            Predicate::Lte(field, value) => Self::ordered(row, field, value, Ordering::is_le),
            Predicate::Gt(field, value) => Self::ordered(row, field, value, Ordering::is_gt),
            Predicate::Gte(field, value) => Self::ordered(row, field, value, Ordering::is_ge),
            Predicate::In(field, values) => {
                row.get(field).map(|v| values.contains(v)).unwrap_or(false)
            }
            Predicate::Nin(field, values) => {
                row.get(field).map(|v| !values.contains(v)).unwrap_or(true)
            }
            Predicate::Where(predicate) => predicate(row),
            Predicate::And(filters) => filters.iter().all(|f| f.matches(row)),
            Predicate::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    fn ordered(row: &Row, field: &str, value: &Value, accept: fn(Ordering) -> bool) -> bool {
        row.get(field)
            .and_then(|cell| cell.compare(value))
            .map(accept)
            .unwrap_or(false)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(field, value) => write!(f, "Eq({:?}, {:?})", field, value),
            Predicate::Ne(field, value) => write!(f, "Ne({:?}, {:?})", field, value),
            Predicate::Lt(field, value) => write!(f, "Lt({:?}, {:?})", field, value),
            Predicate::Lte(field, value) => write!(f, "Lte({:?}, {:?})", field, value),
            Predicate::Gt(field, value) => write!(f, "Gt({:?}, {:?})", field, value),
            Predicate::Gte(field, value) => write!(f, "Gte({:?}, {:?})", field, value),
            Predicate::In(field, values) => write!(f, "In({:?}, {:?})", field, values),
            Predicate::Nin(field, values) => write!(f, "Nin({:?}, {:?})", field, values),
            Predicate::Where(_) => write!(f, "Where(<predicate>)"),
            Predicate::And(filters) => write!(f, "And({:?})", filters),
            Predicate::Or(filters) => write!(f, "Or({:?})", filters),
        }
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Predicate::Eq(a, x), Predicate::Eq(b, y))
            | (Predicate::Ne(a, x), Predicate::Ne(b, y))
            | (Predicate::Lt(a, x), Predicate::Lt(b, y))
            | (Predicate::Lte(a, x), Predicate::Lte(b, y))
            | (Predicate::Gt(a, x), Predicate::Gt(b, y))
            | (Predicate::Gte(a, x), Predicate::Gte(b, y)) => a == b && x == y,
            (Predicate::In(a, x), Predicate::In(b, y))
            | (Predicate::Nin(a, x), Predicate::Nin(b, y)) => a == b && x == y,
            // Raw predicates are compared by identity
            (Predicate::Where(a), Predicate::Where(b)) => Rc::ptr_eq(a, b),
            (Predicate::And(a), Predicate::And(b)) | (Predicate::Or(a), Predicate::Or(b)) => {
                a == b
            }
            _ => false,
        }
    }
}

/// A conjunction of predicates over one table's rows.
///
/// Built incrementally: `Filter::new().eq("name", "John").gt("age", 20)`.
/// An empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Creates an empty filter (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the filter has no predicates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns the predicates of this filter.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Adds a predicate.
    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Field equals value.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Eq(field.into(), value.into()))
    }

    /// Field differs from value.
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Ne(field.into(), value.into()))
    }

    /// Field is strictly less than value.
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Lt(field.into(), value.into()))
    }

    /// Field is less than or equal to value.
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Lte(field.into(), value.into()))
    }

    /// Field is strictly greater than value.
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Gt(field.into(), value.into()))
    }

    /// Field is greater than or equal to value.
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Predicate::Gte(field.into(), value.into()))
    }

    /// Field is one of the values.
    pub fn is_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.push(Predicate::In(field.into(), values))
    }

    /// Field is none of the values.
    pub fn not_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.push(Predicate::Nin(field.into(), values))
    }

    /// Raw predicate over the whole row.
    pub fn matching(self, predicate: impl Fn(&Row) -> bool + 'static) -> Self {
        self.push(Predicate::Where(Rc::new(predicate)))
    }

    /// Every sub-filter must match.
    pub fn all(self, filters: Vec<Filter>) -> Self {
        self.push(Predicate::And(filters))
    }

    /// At least one sub-filter must match.
    pub fn any(self, filters: Vec<Filter>) -> Self {
        self.push(Predicate::Or(filters))
    }

    /// Evaluates the filter against a row.
    pub fn matches(&self, row: &Row) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}
