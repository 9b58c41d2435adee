//! Tabulon Store - store core with hook pipeline and plugin protocol.
//!
//! The store owns a collection of named tables and exposes CRUD-style
//! operations on tables, rows, and cells, live queries over them, and a
//! uniform interception surface:
//!
//! - `Store`: the table collection and its operations
//! - `HookRegistry` / `HookContext`: before/after/error hooks around every
//!   non-silent operation
//! - `QueryHandle`: a live query wired into the hook channel
//! - `StorePlugin`: the mount/unmount contract persistence adapters attach
//!   through
//!
//! # Example
//!
//! ```
//! use futures::executor::block_on;
//! use tabulon_core::row;
//! use tabulon_store::Store;
//!
//! block_on(async {
//!     let store = Store::new();
//!     store.set_row("users", 1, row! { "id" => 1, "name" => "Alice" }, false).await;
//!     let alice = store.get_row("users", 1, false).await;
//!     assert!(alice.is_some());
//! });
//! ```

pub mod hooks;
pub mod plugin;
pub mod query;
pub mod store;

pub use hooks::{
    HookCallback, HookContext, HookFuture, HookId, HookOp, HookPhase, HookRegistry,
};
pub use plugin::{StorePlugin, Unmount};
pub use query::QueryHandle;
pub use store::{Store, StoreOptions};
