//! Change entries for table mutations.
//!
//! A `Change` records one mutation at a table, row, or cell path, carrying
//! the old and new values so subscribers can diff without re-reading state.
//! A `ChangeBatch` is the unit of delivery: all changes that settled
//! together.

use tabulon_core::{Row, RowId, Value};

/// One mutation of the table collection.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// A table was created (explicitly or by auto-vivification).
    TableCreated { table: String },
    /// A table and all of its rows were removed as one mutation.
    TableRemoved { table: String },
    /// A row was written.
    RowSet {
        table: String,
        row_id: RowId,
        old: Option<Row>,
        new: Row,
    },
    /// A row was deleted.
    RowRemoved {
        table: String,
        row_id: RowId,
        old: Row,
    },
    /// A single cell was written.
    CellSet {
        table: String,
        row_id: RowId,
        cell: String,
        old: Option<Value>,
        new: Value,
    },
    /// A single cell was deleted.
    CellRemoved {
        table: String,
        row_id: RowId,
        cell: String,
        old: Value,
    },
    /// Every table was removed at once.
    Cleared,
}

impl Change {
    /// Returns the table this change touches, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Change::TableCreated { table }
            | Change::TableRemoved { table }
            | Change::RowSet { table, .. }
            | Change::RowRemoved { table, .. }
            | Change::CellSet { table, .. }
            | Change::CellRemoved { table, .. } => Some(table),
            Change::Cleared => None,
        }
    }

    /// Returns the row id this change touches, if any.
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            Change::RowSet { row_id, .. }
            | Change::RowRemoved { row_id, .. }
            | Change::CellSet { row_id, .. }
            | Change::CellRemoved { row_id, .. } => Some(row_id),
            _ => None,
        }
    }
}

/// A group of changes delivered together once mutations settle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeBatch {
    /// The changes, in mutation order.
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// Creates a new empty batch.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch from a list of changes.
    pub fn from_changes(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    /// Returns the number of changes in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if there are no changes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterates over the changes in mutation order.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}
