//! Hook registry.
//!
//! Hooks are callbacks registered around named store operations: `before`
//! and `after` run for every non-silent call of a matching operation, and
//! `error` receives failures absorbed from either. Registrations are kept in
//! an id-keyed registry so disposal is O(1) and exact; dispatch order is
//! unspecified - matching callbacks are awaited concurrently.

use futures::future::LocalBoxFuture;
use hashbrown::HashMap;
use std::rc::Rc;
use tabulon_core::{Error, Result, RowId};
use tabulon_query::QueryParams;

/// Unique identifier for a hook registration.
pub type HookId = u64;

/// When a hook fires relative to its operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before the operation runs.
    Before,
    /// After the operation ran.
    After,
    /// When a before/after callback of the operation failed.
    Error,
}

/// The store operations a hook can attach to.
///
/// A registration may instead be a wildcard (no operation), matching all of
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookOp {
    GetTable,
    SetTable,
    DelTable,
    GetRow,
    SetRow,
    DelRow,
    GetCell,
    SetCell,
    DelCell,
    QueryRows,
}

/// Context handed to every hook callback.
#[derive(Clone, Debug)]
pub struct HookContext {
    /// The operation being intercepted.
    pub method: HookOp,
    /// The table the operation addresses.
    pub table: String,
    /// The row id, for row- and cell-level operations.
    pub row_id: Option<RowId>,
    /// The cell key, for cell-level operations.
    pub cell: Option<String>,
    /// The query parameters, for `QueryRows`.
    pub query: Option<QueryParams>,
    /// The absorbed failure, on the error phase only.
    pub error: Option<Rc<Error>>,
}

impl HookContext {
    /// Context for a table-level operation.
    pub fn table(method: HookOp, table: impl Into<String>) -> Self {
        Self {
            method,
            table: table.into(),
            row_id: None,
            cell: None,
            query: None,
            error: None,
        }
    }

    /// Context for a row-level operation.
    pub fn row(method: HookOp, table: impl Into<String>, row_id: RowId) -> Self {
        Self {
            row_id: Some(row_id),
            ..Self::table(method, table)
        }
    }

    /// Context for a cell-level operation.
    pub fn cell(
        method: HookOp,
        table: impl Into<String>,
        row_id: RowId,
        cell: impl Into<String>,
    ) -> Self {
        Self {
            row_id: Some(row_id),
            cell: Some(cell.into()),
            ..Self::table(method, table)
        }
    }

    /// Context for a query operation.
    pub fn query(table: impl Into<String>, params: QueryParams) -> Self {
        Self {
            query: Some(params),
            ..Self::table(HookOp::QueryRows, table)
        }
    }

    /// Returns a copy carrying the absorbed error.
    pub fn with_error(mut self, error: Rc<Error>) -> Self {
        self.error = Some(error);
        self
    }
}

/// Future returned by a hook callback.
pub type HookFuture = LocalBoxFuture<'static, Result<()>>;

/// A registered hook callback.
pub type HookCallback = Rc<dyn Fn(HookContext) -> HookFuture>;

struct HookEntry {
    phase: HookPhase,
    op: Option<HookOp>,
    callback: HookCallback,
}

/// Id-keyed registry of hook registrations.
pub struct HookRegistry {
    entries: HashMap<HookId, HookEntry>,
    next_id: HookId,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers a callback. `op == None` is a wildcard over all operations.
    ///
    /// Returns a fresh id for disposal.
    pub fn register<F>(&mut self, phase: HookPhase, op: Option<HookOp>, callback: F) -> HookId
    where
        F: Fn(HookContext) -> HookFuture + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            HookEntry {
                phase,
                op,
                callback: Rc::new(callback),
            },
        );
        id
    }

    /// Removes exactly the given registration. Returns true if it existed.
    pub fn remove(&mut self, id: HookId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Returns true if the registration is still live.
    pub fn contains(&self, id: HookId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the callbacks matching a phase and operation (wildcard
    /// registrations included), with their ids.
    pub fn matching(&self, phase: HookPhase, op: HookOp) -> Vec<(HookId, HookCallback)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.phase == phase && (e.op.is_none() || e.op == Some(op)))
            .map(|(id, e)| (*id, e.callback.clone()))
            .collect()
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of live registrations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no registrations are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
