//! Live queries.
//!
//! A `LiveQuery` is an always-current view over one table of a `TableStore`:
//! filter, stable multi-key sort, a growing pagination window, and optional
//! field projection. Results are recomputed lazily - every read compares the
//! table's generation and the query's own parameter generation against the
//! cached computation, so consumers never observe an intermediate state and
//! unchanged data is never re-scanned.

use crate::filter::Filter;
use crate::params::{PaginationStyle, QueryParams, QueryPatch};
use crate::sort::compare_rows;
use std::cell::RefCell;
use tabulon_core::Row;
use tabulon_reactive::TableStore;

/// Pagination and result metadata of a live query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMeta {
    /// Current page, 1-based.
    pub page: u32,
    /// Effective limit for the current page (grows with the page).
    pub page_size: usize,
    /// Row count of the current page window, after slicing.
    pub total: usize,
    /// Whether another page advance would show more rows.
    pub can_show_more: bool,
    /// Row count after filtering, before pagination, minus the base skip.
    pub total_rows_available: usize,
}

/// Live pagination/filter cursor derived from the initial params.
struct QueryState {
    params: QueryParams,
    page: u32,
    /// Bumped on every params or page change.
    generation: u64,
}

struct Computed {
    table_gen: u64,
    params_gen: u64,
    rows: Vec<Row>,
    meta: QueryMeta,
}

/// An incrementally recomputed, ordered view over one table.
pub struct LiveQuery {
    source: TableStore,
    table: String,
    state: RefCell<QueryState>,
    cache: RefCell<Option<Computed>>,
}

impl LiveQuery {
    /// Creates a live query over `table` with the given parameters.
    pub fn new(source: TableStore, table: impl Into<String>, params: QueryParams) -> Self {
        Self {
            source,
            table: table.into(),
            state: RefCell::new(QueryState {
                params,
                page: 1,
                generation: 0,
            }),
            cache: RefCell::new(None),
        }
    }

    /// Returns the table this query reads from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the current parameters.
    pub fn params(&self) -> QueryParams {
        self.state.borrow().params.clone()
    }

    /// Returns the current page, 1-based.
    pub fn page(&self) -> u32 {
        self.state.borrow().page
    }

    /// Returns the current page window of matching rows.
    pub fn rows(&self) -> Vec<Row> {
        self.ensure_current();
        self.cache
            .borrow()
            .as_ref()
            .map(|c| c.rows.clone())
            .unwrap_or_default()
    }

    /// Returns current pagination metadata.
    pub fn meta(&self) -> QueryMeta {
        self.ensure_current();
        self.cache
            .borrow()
            .as_ref()
            .map(|c| c.meta.clone())
            .unwrap_or(QueryMeta {
                page: 1,
                page_size: 0,
                total: 0,
                can_show_more: false,
                total_rows_available: 0,
            })
    }

    /// Advances one page and returns the new page number.
    ///
    /// No-op (returns `None`) when no more rows are available.
    pub fn next_page(&self) -> Option<u32> {
        if !self.meta().can_show_more {
            return None;
        }
        let mut state = self.state.borrow_mut();
        state.page += 1;
        state.generation += 1;
        Some(state.page)
    }

    /// Retreats one page and returns the new page number.
    ///
    /// No-op (returns `None`) on page 1.
    pub fn prev_page(&self) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        if state.page == 1 {
            return None;
        }
        state.page -= 1;
        state.generation += 1;
        Some(state.page)
    }

    /// Merges new limit/skip/filter/sort/select into the query.
    ///
    /// Returns the merged parameters when at least one field actually
    /// changed; otherwise `None`, and no recomputation is scheduled.
    pub fn set_params(&self, patch: &QueryPatch) -> Option<QueryParams> {
        let mut state = self.state.borrow_mut();
        let merged = state.params.merged(patch);
        if merged == state.params {
            return None;
        }
        state.params = merged.clone();
        state.generation += 1;
        Some(merged)
    }

    /// Recomputes if either the table or the query parameters moved.
    fn ensure_current(&self) {
        let table_gen = self.source.table_generation(&self.table);
        let params_gen = self.state.borrow().generation;
        let fresh = matches!(
            &*self.cache.borrow(),
            Some(c) if c.table_gen == table_gen && c.params_gen == params_gen
        );
        if fresh {
            return;
        }
        let computed = self.recompute(table_gen, params_gen);
        *self.cache.borrow_mut() = Some(computed);
    }

    /// The single recomputation path: materialize, sort, filter, window,
    /// slice, project.
    fn recompute(&self, table_gen: u64, params_gen: u64) -> Computed {
        let state = self.state.borrow();
        let params = &state.params;
        let page = state.page;

        let mut list = self.source.rows(&self.table);

        if !params.sort.is_empty() {
            let sort = &params.sort;
            list.sort_by(|a, b| compare_rows(sort, a, b));
        }

        if !params.filter.is_empty() {
            let filter: &Filter = &params.filter;
            list.retain(|row| filter.matches(row));
        }

        let base_limit = params.effective_limit();
        let base_skip = params.skip;
        let effective_skip = match params.style {
            PaginationStyle::Paginated => base_skip + (page as usize - 1) * base_limit,
            PaginationStyle::Infinite => base_skip,
        };
        let effective_limit = base_limit * page as usize;

        let total_rows_available = list.len().saturating_sub(base_skip);

        let start = effective_skip.min(list.len());
        let end = (effective_skip + effective_limit).min(list.len());
        let mut window: Vec<Row> = list.drain(..).skip(start).take(end - start).collect();

        let total = window.len();

        if !params.select.is_empty() {
            window = window.iter().map(|row| row.project(&params.select)).collect();
        }

        let max_page = if base_limit == 0 {
            0
        } else {
            total_rows_available.div_ceil(base_limit)
        };
        let can_show_more = (page as usize) < max_page;

        Computed {
            table_gen,
            params_gen,
            rows: window,
            meta: QueryMeta {
                page,
                page_size: effective_limit,
                total,
                can_show_more,
                total_rows_available,
            },
        }
    }
}
