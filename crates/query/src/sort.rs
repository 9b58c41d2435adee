//! Multi-key sort comparator.
//!
//! Keys are evaluated in declaration order; the first key producing a
//! non-zero comparison decides. A key contributes zero whenever either
//! compared cell is absent or null, or the two cells are of types that do
//! not order against each other - fully tied rows keep their prior relative
//! order (sorting is stable).

use core::cmp::Ordering;
use tabulon_core::{Row, Value};

/// Sort direction for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// An ordered list of `(field, direction)` sort keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sort {
    keys: Vec<(String, Direction)>,
}

impl Sort {
    /// Creates an empty sort (rows keep table order).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-key ascending sort.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new().then(field, Direction::Asc)
    }

    /// Creates a single-key descending sort.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new().then(field, Direction::Desc)
    }

    /// Appends a sort key.
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    /// Returns true if no sort keys are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the sort keys in declaration order.
    pub fn keys(&self) -> &[(String, Direction)] {
        &self.keys
    }
}

/// Compares two rows under the given sort keys.
pub fn compare_rows(sort: &Sort, a: &Row, b: &Row) -> Ordering {
    for (field, direction) in &sort.keys {
        let ordering = compare_cells(a.get(field), b.get(field));
        if ordering != Ordering::Equal {
            return match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
        }
    }
    Ordering::Equal
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => (a, b),
        // Absent or null cells always tie
        _ => return Ordering::Equal,
    };
    match (a, b) {
        (Value::String(x), Value::String(y)) => collate(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.compare(b).unwrap_or(Ordering::Equal)
        }
        // Other type pairings do not order against each other
        _ => Ordering::Equal,
    }
}

/// Collation used for string keys: case-insensitive primary comparison with
/// a byte-order tiebreak, approximating locale-aware ordering.
fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
