//! Plugin contract.
//!
//! A plugin is any external collaborator that attaches to a store - most
//! commonly a persistence adapter mirroring table contents into an external
//! key-value store. The contract is a single `mount` returning an unmount
//! function; the store owns the unmount and guarantees it is invoked exactly
//! once during `cleanup`.

use crate::store::Store;
use futures::future::LocalBoxFuture;

/// Removes everything a plugin registered, restoring pre-mount behavior.
pub type Unmount = Box<dyn FnOnce()>;

/// An external collaborator attachable to a store.
///
/// `mount` may perform asynchronous work (typically an initial revalidation
/// replaying persisted contents into the store) before returning the unmount
/// function. Multiple plugins may be mounted on one store; their hook
/// registrations are independent and unmount independently.
pub trait StorePlugin {
    /// Attaches to the store and returns the matching unmount function.
    fn mount(&self, store: &Store) -> LocalBoxFuture<'static, Unmount>;
}
