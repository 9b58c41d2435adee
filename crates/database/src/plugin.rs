//! The database plugin.
//!
//! `DatabasePlugin` binds a `Database` collaborator to a store through the
//! `StorePlugin` contract:
//!
//! 1. on mount, it replays the collaborator's persisted contents into the
//!    store (one batch per revalidation) and reports the reloaded ids;
//! 2. it registers `after` hooks forwarding row and cell mutations of
//!    persisted tables back to the collaborator, and a `DelTable` hook
//!    dropping a removed table's items;
//! 3. its unmount removes exactly those hooks.
//!
//! Which tables persist is decided by a `PersistencePolicy`. Forwarding
//! failures surface through the store's error-hook channel; they never
//! escape the mutating store call.

use crate::types::Database;
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::rc::Rc;
use tabulon_core::{Result, Row, RowId, Value};
use tabulon_store::{HookId, HookOp, HookPhase, Store, StorePlugin, Unmount};
use tracing::{debug, warn};

/// Decides whether (and by which id field) a table is persisted.
pub trait PersistencePolicy {
    /// Returns the id field for the table, or `None` if it is not persisted.
    fn id_field_for(&self, table: &str) -> Option<String>;
}

/// Allow-list policy: a static set of `(table, id_field)` pairs.
pub struct StaticTables {
    tables: Vec<(String, String)>,
}

impl StaticTables {
    /// Creates the policy from `(table, id_field)` pairs.
    pub fn new<I, T, F>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, F)>,
        T: Into<String>,
        F: Into<String>,
    {
        Self {
            tables: pairs.into_iter().map(|(t, f)| (t.into(), f.into())).collect(),
        }
    }
}

impl PersistencePolicy for StaticTables {
    fn id_field_for(&self, table: &str) -> Option<String> {
        self.tables
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, f)| f.clone())
    }
}

/// Predicate policy: a function deciding per table.
pub struct DynamicPolicy<F> {
    resolve: F,
}

impl<F> DynamicPolicy<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Creates the policy from a resolver function.
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> PersistencePolicy for DynamicPolicy<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn id_field_for(&self, table: &str) -> Option<String> {
        (self.resolve)(table)
    }
}

/// Notified with the reloaded row ids of each revalidated table.
pub type RevalidateCallback = Rc<dyn Fn(&str, &[RowId])>;

struct MountState {
    store: Store,
    hook_ids: Vec<HookId>,
}

struct PluginInner<D, P> {
    db: Rc<D>,
    policy: P,
    on_revalidate: RefCell<Option<RevalidateCallback>>,
    mounted: RefCell<Option<MountState>>,
}

/// Binds a `Database` collaborator to a store.
///
/// Cloning returns another handle to the same binding.
pub struct DatabasePlugin<D, P> {
    inner: Rc<PluginInner<D, P>>,
}

impl<D, P> Clone for DatabasePlugin<D, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D, P> DatabasePlugin<D, P>
where
    D: Database + 'static,
    P: PersistencePolicy + 'static,
{
    /// Creates a plugin around a collaborator and a persistence policy.
    pub fn new(db: D, policy: P) -> Self {
        Self {
            inner: Rc::new(PluginInner {
                db: Rc::new(db),
                policy,
                on_revalidate: RefCell::new(None),
                mounted: RefCell::new(None),
            }),
        }
    }

    /// Sets the revalidation notification callback.
    pub fn on_revalidate(self, callback: impl Fn(&str, &[RowId]) + 'static) -> Self {
        *self.inner.on_revalidate.borrow_mut() = Some(Rc::new(callback));
        self
    }

    /// Returns a handle to the underlying collaborator.
    pub fn database(&self) -> Rc<D> {
        Rc::clone(&self.inner.db)
    }

    /// Switches the collaborator's namespace.
    ///
    /// While mounted, the store's tables are cleared and revalidated against
    /// the new namespace, so visible state always matches exactly one
    /// namespace. Forwarding is suspended during the reload.
    pub async fn set_namespace(&self, namespace: &str) -> Result<()> {
        self.inner.db.set_namespace(namespace).await?;
        let store = self
            .inner
            .mounted
            .borrow()
            .as_ref()
            .map(|m| m.store.clone());
        if let Some(store) = store {
            self.unmount_hooks();
            store.clear();
            self.revalidate(&store).await;
            let hook_ids = self.register_hooks(&store);
            *self.inner.mounted.borrow_mut() = Some(MountState { store, hook_ids });
        }
        Ok(())
    }

    /// Replays all persisted rows into the store as one batch.
    ///
    /// Rows without a resolvable id are skipped. A failed bulk read leaves
    /// the store as-is; it happens outside any store operation, so there is
    /// no hook context to attach it to.
    async fn revalidate(&self, store: &Store) {
        let all = match self.inner.db.get_all_items().await {
            Ok(all) => all,
            Err(error) => {
                warn!(%error, "revalidation read failed, store left as-is");
                return;
            }
        };
        let inner = Rc::clone(&self.inner);
        let loaded = store
            .batch(|store| async move {
                let mut loaded: Vec<(String, Vec<RowId>)> = Vec::new();
                for (table, rows) in all {
                    let id_field = inner
                        .policy
                        .id_field_for(&table)
                        .unwrap_or_else(|| "id".to_string());
                    let mut ids = Vec::new();
                    for row in rows {
                        let Some(id) = row_id_of(&row, &id_field) else {
                            debug!(%table, %id_field, "skipping row without resolvable id");
                            continue;
                        };
                        store.set_row(&table, id.clone(), row, false).await;
                        ids.push(id);
                    }
                    loaded.push((table, ids));
                }
                loaded
            })
            .await;
        let callback = self.inner.on_revalidate.borrow().clone();
        if let Some(callback) = callback {
            for (table, ids) in &loaded {
                callback(table, ids);
            }
        }
    }

    /// Registers the forwarding hooks. Row and cell writes re-persist the
    /// whole post-mutation row; deletions forward as deletions.
    fn register_hooks(&self, store: &Store) -> Vec<HookId> {
        let mut ids = Vec::new();

        for op in [HookOp::SetRow, HookOp::SetCell, HookOp::DelCell] {
            let inner = Rc::clone(&self.inner);
            let store_handle = store.clone();
            ids.push(store.hook(HookPhase::After, Some(op), move |ctx| {
                let inner = Rc::clone(&inner);
                let store = store_handle.clone();
                async move {
                    // Mutations without a row id (table-level) are not ours
                    let Some(row_id) = ctx.row_id.clone() else {
                        return Ok(());
                    };
                    if inner.policy.id_field_for(&ctx.table).is_none() {
                        return Ok(());
                    }
                    match store.get_row(&ctx.table, row_id.clone(), true).await {
                        Some(row) => inner.db.set_item(&ctx.table, &row_id, row).await,
                        None => Ok(()),
                    }
                }
                .boxed_local()
            }));
        }

        let inner = Rc::clone(&self.inner);
        ids.push(store.hook(HookPhase::After, Some(HookOp::DelRow), move |ctx| {
            let inner = Rc::clone(&inner);
            async move {
                let Some(row_id) = ctx.row_id.clone() else {
                    return Ok(());
                };
                if inner.policy.id_field_for(&ctx.table).is_none() {
                    return Ok(());
                }
                inner.db.del_item(&ctx.table, &row_id).await
            }
            .boxed_local()
        }));

        let inner = Rc::clone(&self.inner);
        ids.push(store.hook(HookPhase::After, Some(HookOp::DelTable), move |ctx| {
            let inner = Rc::clone(&inner);
            async move { inner.db.del_items(&ctx.table, None).await }.boxed_local()
        }));

        ids
    }

    /// Removes this plugin's hooks, restoring pre-mount behavior.
    fn unmount_hooks(&self) {
        if let Some(mounted) = self.inner.mounted.borrow_mut().take() {
            for id in mounted.hook_ids {
                mounted.store.unhook(id);
            }
        }
    }
}

impl<D, P> StorePlugin for DatabasePlugin<D, P>
where
    D: Database + 'static,
    P: PersistencePolicy + 'static,
{
    fn mount(&self, store: &Store) -> LocalBoxFuture<'static, Unmount> {
        let plugin = self.clone();
        let store = store.clone();
        async move {
            // Re-mounting replaces any previous registration
            plugin.unmount_hooks();
            plugin.revalidate(&store).await;
            let hook_ids = plugin.register_hooks(&store);
            *plugin.inner.mounted.borrow_mut() = Some(MountState {
                store: store.clone(),
                hook_ids,
            });
            let plugin = plugin.clone();
            Box::new(move || plugin.unmount_hooks()) as Unmount
        }
        .boxed_local()
    }
}

/// Extracts a row's id from its id field, if it carries a usable one.
fn row_id_of(row: &Row, id_field: &str) -> Option<RowId> {
    match row.get(id_field)? {
        Value::Int(v) => Some(RowId::Int(*v)),
        Value::String(v) => Some(RowId::Str(v.clone())),
        _ => None,
    }
}
