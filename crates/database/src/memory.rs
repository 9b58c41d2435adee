//! In-memory storage collaborator.
//!
//! The reference `Database` implementation: namespaced maps of
//! `table -> id -> row`. Useful on its own for tests and as the model the
//! browser/remote adapters follow.

use crate::types::{AllItems, Database};
use futures::future::{self, FutureExt, LocalBoxFuture};
use hashbrown::HashMap;
use indexmap::IndexMap;
use std::cell::RefCell;
use tabulon_core::{Result, Row, RowId};

type Space = IndexMap<String, IndexMap<RowId, Row>>;

struct MemoryState {
    namespace: String,
    spaces: HashMap<String, Space>,
}

/// A namespaced in-memory key-value store.
pub struct MemoryDatabase {
    state: RefCell<MemoryState>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Creates a database on the `default` namespace.
    pub fn new() -> Self {
        Self::with_namespace("default")
    }

    /// Creates a database on the given namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let mut spaces = HashMap::new();
        spaces.insert(namespace.clone(), Space::new());
        Self {
            state: RefCell::new(MemoryState { namespace, spaces }),
        }
    }

    fn with_space<T>(&self, f: impl FnOnce(&mut Space) -> T) -> T {
        let mut state = self.state.borrow_mut();
        let namespace = state.namespace.clone();
        f(state.spaces.entry(namespace).or_default())
    }
}

impl Database for MemoryDatabase {
    fn namespace(&self) -> String {
        self.state.borrow().namespace.clone()
    }

    fn set_namespace(&self, namespace: &str) -> LocalBoxFuture<'_, Result<()>> {
        let mut state = self.state.borrow_mut();
        // Previously written contents of the target namespace are kept
        state.spaces.entry(namespace.to_string()).or_default();
        state.namespace = namespace.to_string();
        future::ready(Ok(())).boxed_local()
    }

    fn set_item(&self, table: &str, id: &RowId, value: Row) -> LocalBoxFuture<'_, Result<()>> {
        self.with_space(|space| {
            space.entry(table.to_string()).or_default().insert(id.clone(), value);
        });
        future::ready(Ok(())).boxed_local()
    }

    fn set_items(&self, table: &str, items: Vec<(RowId, Row)>) -> LocalBoxFuture<'_, Result<()>> {
        self.with_space(|space| {
            let slot = space.entry(table.to_string()).or_default();
            for (id, value) in items {
                slot.insert(id, value);
            }
        });
        future::ready(Ok(())).boxed_local()
    }

    fn del_item(&self, table: &str, id: &RowId) -> LocalBoxFuture<'_, Result<()>> {
        self.with_space(|space| {
            if let Some(slot) = space.get_mut(table) {
                slot.shift_remove(id);
            }
        });
        future::ready(Ok(())).boxed_local()
    }

    fn del_items(&self, table: &str, ids: Option<Vec<RowId>>) -> LocalBoxFuture<'_, Result<()>> {
        self.with_space(|space| match ids {
            Some(ids) => {
                if let Some(slot) = space.get_mut(table) {
                    for id in ids {
                        slot.shift_remove(&id);
                    }
                }
            }
            None => {
                space.shift_remove(table);
            }
        });
        future::ready(Ok(())).boxed_local()
    }

    fn get_item(&self, table: &str, id: &RowId) -> LocalBoxFuture<'_, Result<Option<Row>>> {
        let item = self.with_space(|space| space.get(table).and_then(|slot| slot.get(id).cloned()));
        future::ready(Ok(item)).boxed_local()
    }

    fn get_items(
        &self,
        table: &str,
        ids: Option<Vec<RowId>>,
    ) -> LocalBoxFuture<'_, Result<Vec<Row>>> {
        let items = self.with_space(|space| match space.get(table) {
            Some(slot) => match ids {
                Some(ids) => ids.iter().filter_map(|id| slot.get(id).cloned()).collect(),
                None => slot.values().cloned().collect(),
            },
            None => Vec::new(),
        });
        future::ready(Ok(items)).boxed_local()
    }

    fn get_all_items(&self) -> LocalBoxFuture<'_, Result<AllItems>> {
        let all = self.with_space(|space| {
            space
                .iter()
                .map(|(table, slot)| (table.clone(), slot.values().cloned().collect()))
                .collect()
        });
        future::ready(Ok(all)).boxed_local()
    }

    fn clear(&self) -> LocalBoxFuture<'_, Result<()>> {
        self.with_space(IndexMap::clear);
        future::ready(Ok(())).boxed_local()
    }
}
