//! The reactive table container.
//!
//! `TableStore` owns the table collection and is the single source of truth
//! shared by the store core, live queries, and persistence plugins. It is a
//! cheaply clonable handle over `Rc` interior state; all access is
//! single-threaded.
//!
//! Every write records a `Change`, bumps the global and per-table generation
//! counters, and (once the current batch settles) delivers the buffered
//! changes to subscribers as one `ChangeBatch`.

use crate::change::{Change, ChangeBatch};
use crate::subscription::{SubscriptionId, SubscriptionManager};
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tabulon_core::{Row, RowId, Table, Value};
use tracing::debug;

struct State {
    tables: IndexMap<String, Table>,
    table_gens: HashMap<String, u64>,
    generation: u64,
    batch_depth: u32,
    pending: Vec<Change>,
}

impl State {
    fn touch(&mut self, table: &str) {
        self.generation += 1;
        *self.table_gens.entry(table.to_string()).or_insert(0) += 1;
    }

    /// Creates the table slot if absent. Returns true if it was created.
    fn ensure_table(&mut self, table: &str) -> bool {
        if self.tables.contains_key(table) {
            return false;
        }
        self.tables.insert(table.to_string(), Table::new());
        self.touch(table);
        self.pending.push(Change::TableCreated {
            table: table.to_string(),
        });
        true
    }
}

struct Inner {
    state: RefCell<State>,
    subscriptions: RefCell<SubscriptionManager>,
}

/// The reactive table collection.
///
/// Cloning returns another handle to the same underlying state.
#[derive(Clone)]
pub struct TableStore {
    inner: Rc<Inner>,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore {
    /// Creates a new empty table store.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(State {
                    tables: IndexMap::new(),
                    table_gens: HashMap::new(),
                    generation: 0,
                    batch_depth: 0,
                    pending: Vec::new(),
                }),
                subscriptions: RefCell::new(SubscriptionManager::new()),
            }),
        }
    }

    /// Returns true if the table exists. Does not vivify.
    pub fn has_table(&self, table: &str) -> bool {
        self.inner.state.borrow().tables.contains_key(table)
    }

    /// Creates the table if absent. Returns true if it was created.
    pub fn set_table(&self, table: &str) -> bool {
        let created = self.inner.state.borrow_mut().ensure_table(table);
        if created {
            debug!(table, "table created");
            self.flush_if_settled();
        }
        created
    }

    /// Removes the table and all of its rows as one mutation.
    ///
    /// Returns true if the table existed.
    pub fn del_table(&self, table: &str) -> bool {
        let removed = {
            let mut st = self.inner.state.borrow_mut();
            if st.tables.shift_remove(table).is_none() {
                false
            } else {
                st.touch(table);
                st.pending.push(Change::TableRemoved {
                    table: table.to_string(),
                });
                true
            }
        };
        if removed {
            debug!(table, "table removed");
            self.flush_if_settled();
        }
        removed
    }

    /// Returns the names of all existing tables.
    pub fn table_names(&self) -> Vec<String> {
        self.inner.state.borrow().tables.keys().cloned().collect()
    }

    /// Returns a snapshot of the table. Does not vivify.
    pub fn get_table(&self, table: &str) -> Option<Table> {
        self.inner.state.borrow().tables.get(table).cloned()
    }

    /// Returns a snapshot of the table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.inner
            .state
            .borrow()
            .tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns a snapshot of the row, or None if absent.
    pub fn get_row(&self, table: &str, row_id: &RowId) -> Option<Row> {
        self.inner
            .state
            .borrow()
            .tables
            .get(table)
            .and_then(|t| t.get(row_id).cloned())
    }

    /// Writes a row, replacing any previous value. Vivifies the table.
    pub fn set_row(&self, table: &str, row_id: RowId, row: Row) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.ensure_table(table);
            st.touch(table);
            let old = st
                .tables
                .get_mut(table)
                .and_then(|t| t.insert(row_id.clone(), row.clone()));
            st.pending.push(Change::RowSet {
                table: table.to_string(),
                row_id,
                old,
                new: row,
            });
        }
        self.flush_if_settled();
    }

    /// Deletes a row. Returns true if it existed.
    pub fn del_row(&self, table: &str, row_id: &RowId) -> bool {
        let removed = {
            let mut st = self.inner.state.borrow_mut();
            let old = st
                .tables
                .get_mut(table)
                .and_then(|t| t.shift_remove(row_id));
            match old {
                Some(old) => {
                    st.touch(table);
                    st.pending.push(Change::RowRemoved {
                        table: table.to_string(),
                        row_id: row_id.clone(),
                        old,
                    });
                    true
                }
                None => false,
            }
        };
        if removed {
            self.flush_if_settled();
        }
        removed
    }

    /// Returns true if the row exists.
    pub fn has_row(&self, table: &str, row_id: &RowId) -> bool {
        self.inner
            .state
            .borrow()
            .tables
            .get(table)
            .is_some_and(|t| t.contains_key(row_id))
    }

    /// Returns a snapshot of the cell, or None if the row or field is absent.
    pub fn get_cell(&self, table: &str, row_id: &RowId, cell: &str) -> Option<Value> {
        self.inner
            .state
            .borrow()
            .tables
            .get(table)
            .and_then(|t| t.get(row_id))
            .and_then(|r| r.get(cell).cloned())
    }

    /// Writes one cell. Vivifies the table and, if needed, an empty row.
    pub fn set_cell(&self, table: &str, row_id: RowId, cell: &str, value: Value) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.ensure_table(table);
            st.touch(table);
            let old = match st.tables.get_mut(table) {
                Some(tbl) => tbl.entry(row_id.clone()).or_default().set(cell, value.clone()),
                None => None,
            };
            st.pending.push(Change::CellSet {
                table: table.to_string(),
                row_id,
                cell: cell.to_string(),
                old,
                new: value,
            });
        }
        self.flush_if_settled();
    }

    /// Deletes one cell. Returns true if it existed.
    pub fn del_cell(&self, table: &str, row_id: &RowId, cell: &str) -> bool {
        let removed = {
            let mut st = self.inner.state.borrow_mut();
            let old = st
                .tables
                .get_mut(table)
                .and_then(|t| t.get_mut(row_id))
                .and_then(|r| r.remove(cell));
            match old {
                Some(old) => {
                    st.touch(table);
                    st.pending.push(Change::CellRemoved {
                        table: table.to_string(),
                        row_id: row_id.clone(),
                        cell: cell.to_string(),
                        old,
                    });
                    true
                }
                None => false,
            }
        };
        if removed {
            self.flush_if_settled();
        }
        removed
    }

    /// Removes every table as one mutation. No-op on an empty store.
    pub fn clear(&self) {
        let cleared = {
            let mut st = self.inner.state.borrow_mut();
            if st.tables.is_empty() {
                false
            } else {
                let names: Vec<String> = st.tables.keys().cloned().collect();
                st.tables.clear();
                for name in &names {
                    st.touch(name);
                }
                st.pending.push(Change::Cleared);
                true
            }
        };
        if cleared {
            debug!("store cleared");
            self.flush_if_settled();
        }
    }

    /// Returns the global generation counter.
    ///
    /// Bumped by every write anywhere in the store.
    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Returns the table's generation counter (0 for an untouched table).
    ///
    /// Bumped by every write that touches the table, including its removal.
    pub fn table_generation(&self, table: &str) -> u64 {
        self.inner
            .state
            .borrow()
            .table_gens
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    /// Subscribes to settled change batches.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeBatch) + 'static,
    {
        self.inner.subscriptions.borrow_mut().subscribe(callback)
    }

    /// Unsubscribes by ID. Returns true if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscriptions.borrow_mut().unsubscribe(id)
    }

    /// Opens a batch scope. Changes buffer until the matching `end_batch`.
    pub fn begin_batch(&self) {
        self.inner.state.borrow_mut().batch_depth += 1;
    }

    /// Closes a batch scope, delivering buffered changes if this was the
    /// outermost one.
    pub fn end_batch(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.batch_depth = st.batch_depth.saturating_sub(1);
        }
        self.flush_if_settled();
    }

    /// Runs `f` inside a batch scope. Nesting is allowed; only the outermost
    /// scope delivers.
    pub fn batch<T>(&self, f: impl FnOnce() -> T) -> T {
        self.begin_batch();
        let out = f();
        self.end_batch();
        out
    }

    /// Delivers pending changes when no batch scope is open.
    ///
    /// State borrows are released before callbacks run, so subscribers may
    /// re-enter the store.
    fn flush_if_settled(&self) {
        let batch = {
            let mut st = self.inner.state.borrow_mut();
            if st.batch_depth > 0 || st.pending.is_empty() {
                return;
            }
            ChangeBatch::from_changes(std::mem::take(&mut st.pending))
        };
        let callbacks = self.inner.subscriptions.borrow().callbacks();
        for callback in callbacks {
            callback(&batch);
        }
    }
}
