//! Tabulon Database - persistence layer for the Tabulon store.
//!
//! Mirrors table contents into an external key-value collaborator and
//! rehydrates the store from it:
//!
//! - `Database`: the collaborator contract (memory map, browser database,
//!   remote API - anything key-value shaped and namespaceable)
//! - `MemoryDatabase`: the in-memory reference adapter
//! - `PersistencePolicy` / `StaticTables` / `DynamicPolicy`: which tables
//!   persist, and by which id field
//! - `DatabasePlugin`: the `StorePlugin` wiring revalidation, mutation
//!   forwarding, and namespace switching
//!
//! # Example
//!
//! ```
//! use futures::executor::block_on;
//! use tabulon_core::row;
//! use tabulon_database::{Database, DatabasePlugin, MemoryDatabase, StaticTables};
//! use tabulon_store::Store;
//!
//! block_on(async {
//!     let store = Store::new();
//!     let plugin = DatabasePlugin::new(MemoryDatabase::new(), StaticTables::new([("users", "id")]));
//!     store.plugin(&plugin).await;
//!
//!     store.set_row("users", 1, row! { "id" => 1, "name" => "Alice" }, false).await;
//!
//!     let db = plugin.database();
//!     let persisted = db.get_item("users", &1.into()).await.unwrap();
//!     assert!(persisted.is_some());
//! });
//! ```

pub mod memory;
pub mod plugin;
pub mod types;

pub use memory::MemoryDatabase;
pub use plugin::{
    DatabasePlugin, DynamicPolicy, PersistencePolicy, RevalidateCallback, StaticTables,
};
pub use types::{AllItems, Database};
