//! Integration tests for the persistence plugin: forwarding, revalidation,
//! namespace switching, and failure absorption.

use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::executor::block_on;
use std::cell::RefCell;
use std::rc::Rc;
use tabulon_core::{row, Error, Result, Row, RowId};
use tabulon_database::{
    AllItems, Database, DatabasePlugin, DynamicPolicy, MemoryDatabase, StaticTables,
};
use tabulon_store::{HookOp, HookPhase, Store};

fn users_plugin() -> DatabasePlugin<MemoryDatabase, StaticTables> {
    DatabasePlugin::new(MemoryDatabase::new(), StaticTables::new([("users", "id")]))
}

#[test]
fn mutations_forward_to_the_collaborator() {
    block_on(async {
        let store = Store::new();
        let plugin = users_plugin();
        store.plugin(&plugin).await;
        let db = plugin.database();

        store.set_row("users", 1, row! { "id" => 1, "name" => "John", "age" => 20 }, false).await;
        let item = db.get_item("users", &1.into()).await.unwrap().unwrap();
        assert_eq!(item.get("id"), Some(&1.into()));

        // Cell writes re-persist the whole row
        store.set_cell("users", 1, "name", "Jane", false).await;
        let item = db.get_item("users", &1.into()).await.unwrap().unwrap();
        assert_eq!(item.get("name"), Some(&"Jane".into()));

        store.del_cell("users", 1, "name", false).await;
        let item = db.get_item("users", &1.into()).await.unwrap().unwrap();
        assert_eq!(item.get("name"), None);

        store.del_row("users", 1, false).await;
        assert_eq!(db.get_item("users", &1.into()).await.unwrap(), None);
    });
}

#[test]
fn non_persisted_tables_are_ignored() {
    block_on(async {
        let store = Store::new();
        let plugin = users_plugin();
        store.plugin(&plugin).await;

        store.set_row("sessions", 1, row! { "id" => 1 }, false).await;

        let db = plugin.database();
        assert_eq!(db.get_item("sessions", &1.into()).await.unwrap(), None);
    });
}

#[test]
fn dynamic_policy_decides_per_table() {
    block_on(async {
        let store = Store::new();
        let plugin = DatabasePlugin::new(
            MemoryDatabase::new(),
            DynamicPolicy::new(|table: &str| table.ends_with("_cache").then(|| "id".to_string())),
        );
        store.plugin(&plugin).await;
        let db = plugin.database();

        store.set_row("users_cache", 1, row! { "id" => 1 }, false).await;
        store.set_row("users", 1, row! { "id" => 1 }, false).await;

        assert!(db.get_item("users_cache", &1.into()).await.unwrap().is_some());
        assert!(db.get_item("users", &1.into()).await.unwrap().is_none());
    });
}

#[test]
fn del_table_drops_all_items() {
    block_on(async {
        let store = Store::new();
        let plugin = users_plugin();
        store.plugin(&plugin).await;
        let db = plugin.database();

        store.set_row("users", 1, row! { "id" => 1 }, false).await;
        store.set_row("users", 2, row! { "id" => 2 }, false).await;
        assert_eq!(db.get_items("users", None).await.unwrap().len(), 2);

        store.del_table("users", false).await;
        assert!(db.get_items("users", None).await.unwrap().is_empty());
    });
}

#[test]
fn cleanup_stops_forwarding() {
    block_on(async {
        let store = Store::new();
        let plugin = users_plugin();
        store.plugin(&plugin).await;
        let db = plugin.database();

        store.set_row("users", 1, row! { "id" => 1, "name" => "John" }, false).await;
        store.cleanup();

        // The plugin was unmounted; nothing forwards anymore
        store.set_row("users", 1, row! { "id" => 1, "name" => "Jane" }, false).await;
        let item = db.get_item("users", &1.into()).await.unwrap().unwrap();
        assert_eq!(item.get("name"), Some(&"John".into()));
    });
}

#[test]
fn mount_revalidates_persisted_contents() {
    block_on(async {
        let db = MemoryDatabase::new();
        seed_users(&db).await;

        let reloaded = Rc::new(RefCell::new(Vec::new()));
        let reloaded_clone = reloaded.clone();
        let plugin = DatabasePlugin::new(db, StaticTables::new([("users", "id")]))
            .on_revalidate(move |table, ids| {
                reloaded_clone.borrow_mut().push((table.to_string(), ids.to_vec()));
            });

        let store = Store::new();

        let deliveries = Rc::new(RefCell::new(0u32));
        let deliveries_clone = deliveries.clone();
        store.tables().subscribe(move |_| *deliveries_clone.borrow_mut() += 1);

        store.plugin(&plugin).await;

        // Replay arrived, in one combined notification
        assert!(store.has_row("users", 1));
        assert!(store.has_row("users", 2));
        assert_eq!(*deliveries.borrow(), 1);

        assert_eq!(
            *reloaded.borrow(),
            vec![("users".to_string(), vec![RowId::from(1), RowId::from(2)])]
        );
    });
}

async fn seed_users(db: &MemoryDatabase) {
    db.set_item("users", &1.into(), row! { "id" => 1, "name" => "John" }).await.unwrap();
    db.set_item("users", &2.into(), row! { "id" => 2, "name" => "Jane" }).await.unwrap();
}

#[test]
fn revalidation_skips_rows_without_resolvable_id() {
    block_on(async {
        let db = MemoryDatabase::new();
        db.set_item("users", &1.into(), row! { "id" => 1 }).await.unwrap();
        db.set_item("users", &"x".into(), row! { "name" => "NoId" }).await.unwrap();

        let store = Store::new();
        let plugin = DatabasePlugin::new(db, StaticTables::new([("users", "id")]));
        store.plugin(&plugin).await;

        assert!(store.has_row("users", 1));
        let table = store.get_table("users", true).await;
        assert_eq!(table.len(), 1);
    });
}

#[test]
fn namespace_switch_reloads_state() {
    block_on(async {
        let db = MemoryDatabase::new();
        db.set_namespace("b").await.unwrap();
        db.set_item("users", &9.into(), row! { "id" => 9, "name" => "InB" }).await.unwrap();
        db.set_namespace("a").await.unwrap();

        let store = Store::new();
        let plugin = DatabasePlugin::new(db, StaticTables::new([("users", "id")]));
        store.plugin(&plugin).await;

        store.set_row("users", 1, row! { "id" => 1, "name" => "InA" }, false).await;
        assert!(store.has_row("users", 1));

        // Visible state flips entirely to namespace b's persisted items
        plugin.set_namespace("b").await.unwrap();
        assert!(!store.has_row("users", 1));
        assert!(store.has_row("users", 9));

        // And back: namespace a still holds what was persisted there
        plugin.set_namespace("a").await.unwrap();
        assert!(store.has_row("users", 1));
        assert!(!store.has_row("users", 9));
    });
}

/// A collaborator whose writes always fail.
struct FailingDatabase;

impl Database for FailingDatabase {
    fn namespace(&self) -> String {
        "default".to_string()
    }
    fn set_namespace(&self, _namespace: &str) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Ok(())).boxed_local()
    }
    fn set_item(&self, _table: &str, _id: &RowId, _value: Row) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Err(Error::backend("write rejected"))).boxed_local()
    }
    fn set_items(
        &self,
        _table: &str,
        _items: Vec<(RowId, Row)>,
    ) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Err(Error::backend("write rejected"))).boxed_local()
    }
    fn del_item(&self, _table: &str, _id: &RowId) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Err(Error::backend("write rejected"))).boxed_local()
    }
    fn del_items(
        &self,
        _table: &str,
        _ids: Option<Vec<RowId>>,
    ) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Err(Error::backend("write rejected"))).boxed_local()
    }
    fn get_item(&self, _table: &str, _id: &RowId) -> LocalBoxFuture<'_, Result<Option<Row>>> {
        future::ready(Ok(None)).boxed_local()
    }
    fn get_items(
        &self,
        _table: &str,
        _ids: Option<Vec<RowId>>,
    ) -> LocalBoxFuture<'_, Result<Vec<Row>>> {
        future::ready(Ok(Vec::new())).boxed_local()
    }
    fn get_all_items(&self) -> LocalBoxFuture<'_, Result<AllItems>> {
        future::ready(Ok(AllItems::new())).boxed_local()
    }
    fn clear(&self) -> LocalBoxFuture<'_, Result<()>> {
        future::ready(Ok(())).boxed_local()
    }
}

#[test]
fn forwarding_failure_surfaces_through_error_hooks() {
    block_on(async {
        let store = Store::new();
        let plugin = DatabasePlugin::new(FailingDatabase, StaticTables::new([("users", "id")]));
        store.plugin(&plugin).await;

        let errors = Rc::new(RefCell::new(Vec::new()));
        let errors_clone = errors.clone();
        store.hook(HookPhase::Error, Some(HookOp::SetRow), move |ctx| {
            let errors = errors_clone.clone();
            Box::pin(async move {
                errors
                    .borrow_mut()
                    .push(ctx.error.as_ref().map(|e| e.to_string()));
                Ok(())
            })
        });

        // The mutating call itself never sees the failure
        store.set_row("users", 1, row! { "id" => 1 }, false).await;

        assert!(store.has_row("users", 1));
        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].as_deref().unwrap().contains("write rejected"));
    });
}

#[test]
fn remount_does_not_double_forward() {
    block_on(async {
        let writes = Rc::new(RefCell::new(0u32));

        struct CountingDatabase {
            writes: Rc<RefCell<u32>>,
        }
        impl Database for CountingDatabase {
            fn namespace(&self) -> String {
                "default".to_string()
            }
            fn set_namespace(&self, _n: &str) -> LocalBoxFuture<'_, Result<()>> {
                future::ready(Ok(())).boxed_local()
            }
            fn set_item(&self, _t: &str, _i: &RowId, _v: Row) -> LocalBoxFuture<'_, Result<()>> {
                *self.writes.borrow_mut() += 1;
                future::ready(Ok(())).boxed_local()
            }
            fn set_items(
                &self,
                _t: &str,
                _items: Vec<(RowId, Row)>,
            ) -> LocalBoxFuture<'_, Result<()>> {
                future::ready(Ok(())).boxed_local()
            }
            fn del_item(&self, _t: &str, _i: &RowId) -> LocalBoxFuture<'_, Result<()>> {
                future::ready(Ok(())).boxed_local()
            }
            fn del_items(
                &self,
                _t: &str,
                _ids: Option<Vec<RowId>>,
            ) -> LocalBoxFuture<'_, Result<()>> {
                future::ready(Ok(())).boxed_local()
            }
            fn get_item(&self, _t: &str, _i: &RowId) -> LocalBoxFuture<'_, Result<Option<Row>>> {
                future::ready(Ok(None)).boxed_local()
            }
            fn get_items(
                &self,
                _t: &str,
                _ids: Option<Vec<RowId>>,
            ) -> LocalBoxFuture<'_, Result<Vec<Row>>> {
                future::ready(Ok(Vec::new())).boxed_local()
            }
            fn get_all_items(&self) -> LocalBoxFuture<'_, Result<AllItems>> {
                future::ready(Ok(AllItems::new())).boxed_local()
            }
            fn clear(&self) -> LocalBoxFuture<'_, Result<()>> {
                future::ready(Ok(())).boxed_local()
            }
        }

        let store = Store::new();
        let plugin = DatabasePlugin::new(
            CountingDatabase { writes: writes.clone() },
            StaticTables::new([("users", "id")]),
        );

        // Mounting twice keeps at most one active forwarding registration
        store.plugin(&plugin).await;
        store.plugin(&plugin).await;

        store.set_row("users", 1, row! { "id" => 1 }, false).await;
        assert_eq!(*writes.borrow(), 1);
    });
}
