//! Query parameters.
//!
//! `QueryParams` is the immutable description a live query starts from.
//! Pagination state (the current page) lives in the live query itself, so a
//! page can advance without re-issuing a whole new query; `QueryPatch`
//! carries the partial updates applied by `set_params`.

use crate::filter::Filter;
use crate::sort::Sort;

/// Effective limit when none is given.
pub const DEFAULT_LIMIT: usize = 20;

/// How the pagination window reacts to page advances.
///
/// In both styles the effective limit is `limit * page`; they differ only in
/// where the window starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaginationStyle {
    /// Page is ignored for the window start, so the window extends from the
    /// base skip and each page re-returns earlier rows.
    #[default]
    Infinite,
    /// The window start also advances by one base limit per page.
    Paginated,
}

/// Declarative description of a view over one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
    /// Row predicate tree. Empty matches everything.
    pub filter: Filter,
    /// Sort keys. Empty keeps table order.
    pub sort: Sort,
    /// Fields to project rows down to. Empty keeps whole rows.
    pub select: Vec<String>,
    /// Page size. `None` falls back to `DEFAULT_LIMIT`.
    pub limit: Option<usize>,
    /// Rows to skip before the pagination window.
    pub skip: usize,
    /// Pagination window behavior.
    pub style: PaginationStyle,
}

impl QueryParams {
    /// Creates default params: match everything, table order, first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the sort keys.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the projected fields.
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select = fields;
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the base skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the pagination style.
    pub fn style(mut self, style: PaginationStyle) -> Self {
        self.style = style;
        self
    }

    /// Returns the page size, falling back to `DEFAULT_LIMIT`.
    #[inline]
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Returns a copy with the patch applied.
    pub fn merged(&self, patch: &QueryPatch) -> QueryParams {
        let mut params = self.clone();
        if let Some(filter) = &patch.filter {
            params.filter = filter.clone();
        }
        if let Some(sort) = &patch.sort {
            params.sort = sort.clone();
        }
        if let Some(select) = &patch.select {
            params.select = select.clone();
        }
        if let Some(limit) = patch.limit {
            params.limit = Some(limit);
        }
        if let Some(skip) = patch.skip {
            params.skip = skip;
        }
        params
    }
}

/// Partial update to a live query's parameters.
#[derive(Clone, Debug, Default)]
pub struct QueryPatch {
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    pub select: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl QueryPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Replaces the sort keys.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Replaces the projected fields.
    pub fn select(mut self, fields: Vec<String>) -> Self {
        self.select = Some(fields);
        self
    }

    /// Replaces the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the base skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}
