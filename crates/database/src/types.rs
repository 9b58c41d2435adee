//! The external storage collaborator contract.
//!
//! A `Database` is any key-value collaborator a store can be mirrored into:
//! an in-memory map, a browser database, a remote API. All methods are
//! asynchronous and may fail; failures are surfaced through the store's
//! error-hook channel by the plugin, never thrown out of a store call.

use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use tabulon_core::{Result, Row, RowId};

/// All persisted rows, grouped by table. Used for full revalidation.
pub type AllItems = IndexMap<String, Vec<Row>>;

/// An external key-value store mirroring table contents.
///
/// A collaborator may support multiple namespaces (distinct underlying
/// storage partitions); `set_namespace` switches which one subsequent calls
/// address.
pub trait Database {
    /// Returns the active namespace.
    fn namespace(&self) -> String;

    /// Switches the active namespace.
    fn set_namespace(&self, namespace: &str) -> LocalBoxFuture<'_, Result<()>>;

    /// Writes one item.
    fn set_item(&self, table: &str, id: &RowId, value: Row) -> LocalBoxFuture<'_, Result<()>>;

    /// Writes several items of one table.
    fn set_items(&self, table: &str, items: Vec<(RowId, Row)>) -> LocalBoxFuture<'_, Result<()>>;

    /// Deletes one item.
    fn del_item(&self, table: &str, id: &RowId) -> LocalBoxFuture<'_, Result<()>>;

    /// Deletes the given items, or every item of the table when `ids` is
    /// `None`.
    fn del_items(&self, table: &str, ids: Option<Vec<RowId>>) -> LocalBoxFuture<'_, Result<()>>;

    /// Reads one item.
    fn get_item(&self, table: &str, id: &RowId) -> LocalBoxFuture<'_, Result<Option<Row>>>;

    /// Reads the given items, or every item of the table when `ids` is
    /// `None`. Missing ids are skipped.
    fn get_items(&self, table: &str, ids: Option<Vec<RowId>>)
        -> LocalBoxFuture<'_, Result<Vec<Row>>>;

    /// Reads every persisted item of the active namespace, grouped by table.
    fn get_all_items(&self) -> LocalBoxFuture<'_, Result<AllItems>>;

    /// Deletes every item of the active namespace.
    fn clear(&self) -> LocalBoxFuture<'_, Result<()>>;
}
