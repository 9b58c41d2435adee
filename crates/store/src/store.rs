//! Store core.
//!
//! `Store` owns the reactive table container, the hook registry, and the set
//! of mounted plugins. Every read/write operation (except the `has_*`
//! checks) runs through the hook pipeline unless called with `silent = true`:
//! all matching `before` hooks are awaited, the operation runs, then all
//! matching `after` hooks are awaited. A failing hook is absorbed into the
//! `error` hook channel and never surfaces to the operation's caller - the
//! data operation itself always completes.

use crate::hooks::{HookCallback, HookContext, HookFuture, HookId, HookOp, HookPhase, HookRegistry};
use crate::plugin::{StorePlugin, Unmount};
use crate::query::QueryHandle;
use futures::future::join_all;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use tabulon_core::{Error, Row, RowId, Table, Value};
use tabulon_query::{LiveQuery, QueryParams, DEFAULT_LIMIT};
use tabulon_reactive::TableStore;
use tracing::{debug, warn};

/// Store construction options.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Page size applied to queries issued without an explicit limit.
    pub default_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl StoreOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default query page size.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}

struct StoreInner {
    tables: TableStore,
    hooks: RefCell<HookRegistry>,
    unmounts: RefCell<Vec<Unmount>>,
    options: StoreOptions,
}

/// The store: tables, hook pipeline, plugins.
///
/// Cloning returns another handle to the same store. All state is
/// single-threaded (`Rc` interior); operations are `async` only because
/// hook callbacks and plugin I/O may await.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates a store with default options.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Creates a store with the given options.
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                tables: TableStore::new(),
                hooks: RefCell::new(HookRegistry::new()),
                unmounts: RefCell::new(Vec::new()),
                options,
            }),
        }
    }

    /// Returns a handle to the underlying reactive table container.
    ///
    /// Useful for subscribing to settled change batches; mutations should go
    /// through the store so hooks fire.
    pub fn tables(&self) -> TableStore {
        self.inner.tables.clone()
    }

    // ---- hook registration ----------------------------------------------

    /// Registers a hook. `op == None` is a wildcard over all operations.
    ///
    /// Returns an id that `unhook` disposes; a disposed hook never fires
    /// again, even when disposal races an in-flight dispatch.
    pub fn hook<F>(&self, phase: HookPhase, op: Option<HookOp>, callback: F) -> HookId
    where
        F: Fn(HookContext) -> HookFuture + 'static,
    {
        self.inner.hooks.borrow_mut().register(phase, op, callback)
    }

    /// Removes exactly the given hook registration.
    pub fn unhook(&self, id: HookId) -> bool {
        self.inner.hooks.borrow_mut().remove(id)
    }

    // ---- hook dispatch --------------------------------------------------

    /// Awaits all matching hooks of one phase concurrently.
    ///
    /// The first failure is routed to the error hooks; nothing propagates to
    /// the operation's caller.
    pub(crate) async fn dispatch(&self, phase: HookPhase, ctx: &HookContext) {
        let matched = self.inner.hooks.borrow().matching(phase, ctx.method);
        if matched.is_empty() {
            return;
        }
        let results = join_all(self.liveness_checked(matched, ctx)).await;
        if let Some(error) = results.into_iter().find_map(|r| r.err()) {
            warn!(method = ?ctx.method, table = %ctx.table, %error, "hook failed");
            self.dispatch_error(ctx, error).await;
        }
    }

    /// Awaits all matching error hooks with the failure attached.
    ///
    /// Failures inside error hooks are dropped.
    async fn dispatch_error(&self, ctx: &HookContext, error: Error) {
        let ctx = ctx.clone().with_error(Rc::new(error));
        let matched = self.inner.hooks.borrow().matching(HookPhase::Error, ctx.method);
        if matched.is_empty() {
            return;
        }
        let _ = join_all(self.liveness_checked(matched, &ctx)).await;
    }

    /// Wraps callbacks so a registration disposed after dispatch started is
    /// skipped when its future actually runs.
    fn liveness_checked(
        &self,
        matched: Vec<(HookId, HookCallback)>,
        ctx: &HookContext,
    ) -> Vec<impl Future<Output = tabulon_core::Result<()>>> {
        matched
            .into_iter()
            .map(|(id, callback)| {
                let ctx = ctx.clone();
                let inner = Rc::clone(&self.inner);
                async move {
                    if !inner.hooks.borrow().contains(id) {
                        return Ok(());
                    }
                    callback(ctx).await
                }
            })
            .collect()
    }

    /// Runs `f` inside the before/after pipeline unless `silent`.
    async fn guarded<T>(&self, silent: bool, ctx: HookContext, f: impl FnOnce() -> T) -> T {
        if silent {
            return f();
        }
        self.dispatch(HookPhase::Before, &ctx).await;
        let out = f();
        self.dispatch(HookPhase::After, &ctx).await;
        out
    }

    // ---- table operations -----------------------------------------------

    /// Returns true if the table exists. Never vivifies, never hooks.
    pub fn has_table(&self, table: &str) -> bool {
        self.inner.tables.has_table(table)
    }

    /// Creates the table if absent.
    pub async fn set_table(&self, table: &str, silent: bool) {
        let ctx = HookContext::table(HookOp::SetTable, table);
        self.guarded(silent, ctx, || {
            self.inner.tables.set_table(table);
        })
        .await
    }

    /// Removes the table and all of its rows as one notification.
    pub async fn del_table(&self, table: &str, silent: bool) -> bool {
        let ctx = HookContext::table(HookOp::DelTable, table);
        self.guarded(silent, ctx, || self.inner.tables.del_table(table))
            .await
    }

    /// Returns a snapshot of the table, creating it first if absent.
    pub async fn get_table(&self, table: &str, silent: bool) -> Table {
        let ctx = HookContext::table(HookOp::GetTable, table);
        self.guarded(silent, ctx, || {
            self.inner.tables.set_table(table);
            self.inner.tables.get_table(table).unwrap_or_default()
        })
        .await
    }

    // ---- row operations -------------------------------------------------

    /// Returns a snapshot of the row, or None if absent.
    pub async fn get_row(
        &self,
        table: &str,
        row_id: impl Into<RowId>,
        silent: bool,
    ) -> Option<Row> {
        let row_id = row_id.into();
        let ctx = HookContext::row(HookOp::GetRow, table, row_id.clone());
        self.guarded(silent, ctx, || {
            self.inner.tables.set_table(table);
            self.inner.tables.get_row(table, &row_id)
        })
        .await
    }

    /// Writes a row, replacing any previous value.
    pub async fn set_row(&self, table: &str, row_id: impl Into<RowId>, row: Row, silent: bool) {
        let row_id = row_id.into();
        debug!(table, %row_id, "set row");
        let ctx = HookContext::row(HookOp::SetRow, table, row_id.clone());
        self.guarded(silent, ctx, || {
            self.inner.tables.set_row(table, row_id.clone(), row);
        })
        .await
    }

    /// Deletes a row. Returns true if it existed.
    pub async fn del_row(&self, table: &str, row_id: impl Into<RowId>, silent: bool) -> bool {
        let row_id = row_id.into();
        debug!(table, %row_id, "del row");
        let ctx = HookContext::row(HookOp::DelRow, table, row_id.clone());
        self.guarded(silent, ctx, || self.inner.tables.del_row(table, &row_id))
            .await
    }

    /// Returns true if the row exists. Never hooks.
    pub fn has_row(&self, table: &str, row_id: impl Into<RowId>) -> bool {
        self.inner.tables.set_table(table);
        self.inner.tables.has_row(table, &row_id.into())
    }

    // ---- cell operations ------------------------------------------------

    /// Returns a snapshot of the cell, or None if the row or field is absent.
    pub async fn get_cell(
        &self,
        table: &str,
        row_id: impl Into<RowId>,
        cell: &str,
        silent: bool,
    ) -> Option<Value> {
        let row_id = row_id.into();
        let ctx = HookContext::cell(HookOp::GetCell, table, row_id.clone(), cell);
        self.guarded(silent, ctx, || {
            self.inner.tables.set_table(table);
            self.inner.tables.get_cell(table, &row_id, cell)
        })
        .await
    }

    /// Writes one cell, vivifying an empty row if needed.
    pub async fn set_cell(
        &self,
        table: &str,
        row_id: impl Into<RowId>,
        cell: &str,
        value: impl Into<Value>,
        silent: bool,
    ) {
        let row_id = row_id.into();
        let value = value.into();
        debug!(table, %row_id, cell, "set cell");
        let ctx = HookContext::cell(HookOp::SetCell, table, row_id.clone(), cell);
        self.guarded(silent, ctx, || {
            self.inner.tables.set_cell(table, row_id.clone(), cell, value);
        })
        .await
    }

    /// Deletes one cell. Returns true if it existed.
    pub async fn del_cell(
        &self,
        table: &str,
        row_id: impl Into<RowId>,
        cell: &str,
        silent: bool,
    ) -> bool {
        let row_id = row_id.into();
        debug!(table, %row_id, cell, "del cell");
        let ctx = HookContext::cell(HookOp::DelCell, table, row_id.clone(), cell);
        self.guarded(silent, ctx, || self.inner.tables.del_cell(table, &row_id, cell))
            .await
    }

    // ---- queries --------------------------------------------------------

    /// Opens a live query over the table.
    ///
    /// Page advances and parameter changes on the returned handle re-enter
    /// the `before:QueryRows` hook channel with the updated window, unless
    /// `silent`.
    pub async fn query_rows(
        &self,
        table: &str,
        params: QueryParams,
        silent: bool,
    ) -> QueryHandle {
        let mut params = params;
        if params.limit.is_none() {
            params.limit = Some(self.inner.options.default_limit);
        }
        let ctx = HookContext::query(table, params.clone());
        self.guarded(silent, ctx, || {
            self.inner.tables.set_table(table);
            let query = LiveQuery::new(self.inner.tables.clone(), table, params);
            QueryHandle::new(self.clone(), query, silent)
        })
        .await
    }

    // ---- lifecycle ------------------------------------------------------

    /// Runs `f` so that every mutation inside is delivered to change
    /// subscribers as one combined notification.
    pub async fn batch<F, Fut>(&self, f: F) -> Fut::Output
    where
        F: FnOnce(Store) -> Fut,
        Fut: Future,
    {
        self.inner.tables.begin_batch();
        let out = f(self.clone()).await;
        self.inner.tables.end_batch();
        out
    }

    /// Empties every table as one notification. Hooks and plugins survive.
    pub fn clear(&self) {
        self.inner.tables.clear();
    }

    /// Clears all tables, removes every hook registration, and unmounts
    /// every still-mounted plugin exactly once. Safe to call repeatedly.
    pub fn cleanup(&self) {
        debug!("store cleanup");
        self.inner.tables.clear();
        let unmounts: Vec<Unmount> = self.inner.unmounts.borrow_mut().drain(..).collect();
        for unmount in unmounts {
            unmount();
        }
        self.inner.hooks.borrow_mut().clear();
    }

    /// Mounts a plugin and takes ownership of its unmount function.
    pub async fn plugin<P: StorePlugin>(&self, plugin: &P) {
        let unmount = plugin.mount(self).await;
        self.inner.unmounts.borrow_mut().push(unmount);
    }
}
