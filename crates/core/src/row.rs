//! Row and table structures for the Tabulon table store.
//!
//! Tables are schemaless: a row is an insertion-ordered mapping from field
//! name to `Value`, addressed within its table by a `RowId`. An empty row is
//! a valid, present row - "missing" and "empty" are distinct states.

use crate::value::Value;
use core::fmt;
use indexmap::IndexMap;
use serde::Serialize;

/// Address of a row within a table. Either an integer or a string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum RowId {
    /// Integer row id
    Int(i64),
    /// String row id
    Str(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(v) => write!(f, "{}", v),
            RowId::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        RowId::Int(v)
    }
}

impl From<i32> for RowId {
    fn from(v: i32) -> Self {
        RowId::Int(i64::from(v))
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        RowId::Str(v.to_string())
    }
}

impl From<String> for RowId {
    fn from(v: String) -> Self {
        RowId::Str(v)
    }
}

/// A named table: an insertion-ordered mapping from row id to row.
pub type Table = IndexMap<RowId, Row>;

/// One record in a table.
///
/// Field order is preserved so that query materialization (and therefore
/// unsorted result order) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    fields: IndexMap<String, Value>,
}

impl Row {
    /// Creates a new empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field value, returning the previous one if present.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value if present.
    ///
    /// Remaining fields keep their relative order.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if this row has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(field, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Projects the row down to the given fields.
    ///
    /// Fields absent from the row are absent from the projection, not
    /// defaulted.
    pub fn project(&self, fields: &[String]) -> Row {
        let mut out = Row::new();
        for (field, value) in &self.fields {
            if fields.iter().any(|f| f == field) {
                out.fields.insert(field.clone(), value.clone());
            }
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

/// Builds a `Row` from `field => value` pairs.
///
/// ```
/// use tabulon_core::row;
///
/// let r = row! { "id" => 1, "name" => "Alice" };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ( $( $field:expr => $value:expr ),+ $(,)? ) => {{
        let mut row = $crate::Row::new();
        $( row.set($field, $value); )+
        row
    }};
}
