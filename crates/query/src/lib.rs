//! Tabulon Query - live query engine for the Tabulon table store.
//!
//! A query is a declarative description of a view over one table:
//! filter, sort, pagination window, and field selection. This crate
//! implements:
//!
//! - `Filter` / `Predicate`: a closed predicate AST with a small interpreter
//! - `Sort`: a multi-key stable comparator
//! - `QueryParams` / `QueryPatch`: the immutable query description and the
//!   partial update applied by `set_params`
//! - `LiveQuery`: an always-current result set over a `TableStore`,
//!   recomputed lazily when the table's or the query's generation moves
//!
//! # Example
//!
//! ```
//! use tabulon_core::{row, RowId};
//! use tabulon_query::{Filter, LiveQuery, QueryParams, Sort};
//! use tabulon_reactive::TableStore;
//!
//! let tables = TableStore::new();
//! tables.set_row("users", RowId::from(1), row! { "id" => 1, "age" => 30 });
//! tables.set_row("users", RowId::from(2), row! { "id" => 2, "age" => 20 });
//!
//! let query = LiveQuery::new(
//!     tables.clone(),
//!     "users",
//!     QueryParams::new().filter(Filter::new().gt("age", 25)).sort(Sort::asc("age")),
//! );
//! assert_eq!(query.rows().len(), 1);
//!
//! tables.set_row("users", RowId::from(3), row! { "id" => 3, "age" => 40 });
//! assert_eq!(query.rows().len(), 2);
//! ```

pub mod filter;
pub mod live;
pub mod params;
pub mod sort;

pub use filter::{Filter, Predicate};
pub use live::{LiveQuery, QueryMeta};
pub use params::{PaginationStyle, QueryParams, QueryPatch, DEFAULT_LIMIT};
pub use sort::{compare_rows, Direction, Sort};
