//! Live query handle.
//!
//! `QueryHandle` wraps a `LiveQuery` and threads its side-channel events -
//! page advances and parameter changes - back into the store's
//! `before:QueryRows` hook channel, re-synthesizing a query context with the
//! updated window so upstream collaborators (e.g. a remote API adapter) can
//! keep their own query state current.

use crate::hooks::{HookContext, HookPhase};
use crate::store::Store;
use tabulon_core::Row;
use tabulon_query::{LiveQuery, QueryMeta, QueryParams, QueryPatch};

/// A live query opened through `Store::query_rows`.
pub struct QueryHandle {
    store: Store,
    query: LiveQuery,
    silent: bool,
}

impl QueryHandle {
    pub(crate) fn new(store: Store, query: LiveQuery, silent: bool) -> Self {
        Self {
            store,
            query,
            silent,
        }
    }

    /// Returns the current page window of matching rows.
    pub fn rows(&self) -> Vec<Row> {
        self.query.rows()
    }

    /// Returns current pagination metadata.
    pub fn meta(&self) -> QueryMeta {
        self.query.meta()
    }

    /// Returns the current page, 1-based.
    pub fn page(&self) -> u32 {
        self.query.page()
    }

    /// Returns the query's current parameters.
    pub fn params(&self) -> QueryParams {
        self.query.params()
    }

    /// Advances one page. No-op when no more rows are available.
    ///
    /// Returns the new page number on a change.
    pub async fn next(&self) -> Option<u32> {
        let page = self.query.next_page()?;
        self.notify_page(page).await;
        Some(page)
    }

    /// Retreats one page. No-op on page 1.
    ///
    /// Returns the new page number on a change.
    pub async fn prev(&self) -> Option<u32> {
        let page = self.query.prev_page()?;
        self.notify_page(page).await;
        Some(page)
    }

    /// Merges new limit/skip/filter/sort/select into the query.
    ///
    /// Recomputes (and re-enters the `before:QueryRows` hook channel) only
    /// if at least one field actually changed. Returns whether it did.
    pub async fn set_params(&self, patch: QueryPatch) -> bool {
        let Some(merged) = self.query.set_params(&patch) else {
            return false;
        };
        if !self.silent {
            let ctx = HookContext::query(self.query.table(), merged);
            self.store.dispatch(HookPhase::Before, &ctx).await;
        }
        true
    }

    /// Re-enters the hook channel with the page's effective skip.
    async fn notify_page(&self, page: u32) {
        if self.silent {
            return;
        }
        let mut params = self.query.params();
        params.skip += (page as usize - 1) * params.effective_limit();
        let ctx = HookContext::query(self.query.table(), params);
        self.store.dispatch(HookPhase::Before, &ctx).await;
    }
}
