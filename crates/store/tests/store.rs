//! Integration tests for the store: hook pipeline, silent calls, live
//! queries wired through the hook channel.

use futures::executor::block_on;
use std::cell::RefCell;
use std::rc::Rc;
use tabulon_core::{row, Error, Value};
use tabulon_query::{Filter, QueryParams, QueryPatch, Sort};
use tabulon_store::{HookContext, HookOp, HookPhase, Store};

fn counting_hook(counter: &Rc<RefCell<u32>>) -> impl Fn(HookContext) -> tabulon_store::HookFuture {
    let counter = counter.clone();
    move |_ctx| {
        let counter = counter.clone();
        Box::pin(async move {
            *counter.borrow_mut() += 1;
            Ok(())
        })
    }
}

#[test]
fn hooks_fire_for_every_operation() {
    block_on(async {
        let store = Store::new();
        let ops = [
            HookOp::GetTable,
            HookOp::SetTable,
            HookOp::DelTable,
            HookOp::GetRow,
            HookOp::SetRow,
            HookOp::DelRow,
            HookOp::GetCell,
            HookOp::SetCell,
            HookOp::DelCell,
            HookOp::QueryRows,
        ];

        let fired = Rc::new(RefCell::new(Vec::new()));
        for phase in [HookPhase::Before, HookPhase::After] {
            for op in ops {
                let fired = fired.clone();
                store.hook(phase, Some(op), move |ctx| {
                    assert_eq!(ctx.method, op);
                    assert_eq!(ctx.table, "users");
                    let fired = fired.clone();
                    Box::pin(async move {
                        fired.borrow_mut().push((phase, op));
                        Ok(())
                    })
                });
            }
        }

        let wildcard = Rc::new(RefCell::new(0u32));
        store.hook(HookPhase::Before, None, counting_hook(&wildcard));

        store.set_table("users", false).await;
        store.set_row("users", 1, row! { "id" => 1, "name" => "John" }, false).await;
        store.get_table("users", false).await;
        store.get_row("users", 1, false).await;
        store.get_cell("users", 1, "name", false).await;
        store.set_cell("users", 1, "name", "Jane", false).await;
        store.del_cell("users", 1, "name", false).await;
        store
            .query_rows("users", QueryParams::new().filter(Filter::new().eq("id", 1)), false)
            .await;
        store.del_row("users", 1, false).await;
        store.del_table("users", false).await;

        for phase in [HookPhase::Before, HookPhase::After] {
            for op in ops {
                assert!(
                    fired.borrow().contains(&(phase, op)),
                    "missing {:?} {:?}",
                    phase,
                    op
                );
            }
        }
        // The wildcard saw all ten operations
        assert_eq!(*wildcard.borrow(), 10);
    });
}

#[test]
fn disposed_hook_never_fires_again() {
    block_on(async {
        let store = Store::new();
        let count = Rc::new(RefCell::new(0u32));
        let id = store.hook(HookPhase::Before, Some(HookOp::GetCell), counting_hook(&count));

        store.get_cell("users", 1, "name", false).await;
        assert!(store.unhook(id));
        store.get_cell("users", 1, "name", false).await;

        assert_eq!(*count.borrow(), 1);
    });
}

#[test]
fn failing_before_hook_routes_to_error_hooks_and_mutation_completes() {
    block_on(async {
        let store = Store::new();
        store.hook(HookPhase::Before, Some(HookOp::SetRow), |_ctx| {
            Box::pin(async { Err(Error::hook("instrumentation down")) })
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        store.hook(HookPhase::Error, None, move |ctx| {
            let seen = seen_clone.clone();
            Box::pin(async move {
                let error = ctx.error.as_ref().map(|e| e.to_string());
                seen.borrow_mut().push((ctx.method, error));
                Ok(())
            })
        });

        // The failure is absorbed; the write still happens
        store.set_row("users", 6, row! { "id" => 6 }, false).await;

        assert!(store.has_row("users", 6));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].0, HookOp::SetRow);
        assert!(seen.borrow()[0].1.as_deref().unwrap().contains("instrumentation down"));
    });
}

#[test]
fn failing_after_hook_is_absorbed_too() {
    block_on(async {
        let store = Store::new();
        store.hook(HookPhase::After, Some(HookOp::DelRow), |_ctx| {
            Box::pin(async { Err(Error::hook("after failed")) })
        });
        let errors = Rc::new(RefCell::new(0u32));
        store.hook(HookPhase::Error, Some(HookOp::DelRow), counting_hook(&errors));

        store.set_row("users", 1, row! { "id" => 1 }, false).await;
        store.del_row("users", 1, false).await;

        assert!(!store.has_row("users", 1));
        assert_eq!(*errors.borrow(), 1);
    });
}

#[test]
fn silent_calls_invoke_zero_hooks() {
    block_on(async {
        let store = Store::new();
        let count = Rc::new(RefCell::new(0u32));
        store.hook(HookPhase::Before, None, counting_hook(&count));
        store.hook(HookPhase::After, None, counting_hook(&count));

        store.set_row("users", 1, row! { "id" => 1 }, true).await;
        store.get_row("users", 1, true).await;
        store.get_cell("users", 1, "id", true).await;
        store.set_cell("users", 1, "id", 2, true).await;
        store.del_cell("users", 1, "id", true).await;
        store.del_row("users", 1, true).await;
        store.query_rows("users", QueryParams::new(), true).await;

        assert_eq!(*count.borrow(), 0);
    });
}

#[test]
fn query_rows_matches_and_paginates() {
    block_on(async {
        let store = Store::new();
        for (id, name, age) in [
            (1, "John", 20),
            (2, "Jane", 20),
            (3, "Michael", 30),
            (4, "Janette", 30),
        ] {
            store
                .set_row("users", id, row! { "id" => id, "name" => name, "age" => age }, false)
                .await;
        }

        let by_name = store
            .query_rows("users", QueryParams::new().filter(Filter::new().eq("name", "John")), false)
            .await;
        assert_eq!(by_name.rows().len(), 1);

        let adults = store
            .query_rows("users", QueryParams::new().filter(Filter::new().gt("age", 20)), false)
            .await;
        assert_eq!(adults.rows().len(), 2);

        let paginated = store
            .query_rows(
                "users",
                QueryParams::new()
                    .filter(Filter::new().gte("age", 20))
                    .sort(Sort::asc("age"))
                    .limit(2),
                false,
            )
            .await;

        assert_eq!(paginated.rows().len(), 2);
        let meta = paginated.meta();
        assert_eq!(meta.total, 2);
        assert!(meta.can_show_more);
        assert_eq!(meta.total_rows_available, 4);

        paginated.next().await;
        assert_eq!(paginated.rows().len(), 4);
        paginated.prev().await;
        assert_eq!(paginated.rows().len(), 2);

        assert!(
            paginated
                .set_params(QueryPatch::new().filter(Filter::new().gte("age", 21)))
                .await
        );
        assert_eq!(paginated.rows().len(), 2);
        assert!(!paginated.meta().can_show_more);
        assert_eq!(paginated.meta().total_rows_available, 2);
    });
}

#[test]
fn page_advance_reenters_hook_channel_with_updated_skip() {
    block_on(async {
        let store = Store::new();
        for id in 1..=4 {
            store.set_row("users", id, row! { "id" => id }, false).await;
        }

        let skips = Rc::new(RefCell::new(Vec::new()));
        let skips_clone = skips.clone();
        store.hook(HookPhase::Before, Some(HookOp::QueryRows), move |ctx| {
            let skips = skips_clone.clone();
            Box::pin(async move {
                if let Some(query) = &ctx.query {
                    skips.borrow_mut().push(query.skip);
                }
                Ok(())
            })
        });

        let query = store
            .query_rows("users", QueryParams::new().limit(2), false)
            .await;
        assert_eq!(query.next().await, Some(2));
        // No more rows: the no-op advance does not re-enter the channel
        assert_eq!(query.next().await, None);
        assert_eq!(query.prev().await, Some(1));

        // Open (skip 0), page 2 (skip 2), back to page 1 (skip 0)
        assert_eq!(*skips.borrow(), vec![0, 2, 0]);
    });
}

#[test]
fn set_params_reenters_hook_channel_only_on_change() {
    block_on(async {
        let store = Store::new();
        store.set_row("users", 1, row! { "id" => 1 }, false).await;

        let calls = Rc::new(RefCell::new(0u32));
        let calls_clone = calls.clone();
        store.hook(HookPhase::Before, Some(HookOp::QueryRows), move |_ctx| {
            let calls = calls_clone.clone();
            Box::pin(async move {
                *calls.borrow_mut() += 1;
                Ok(())
            })
        });

        let query = store.query_rows("users", QueryParams::new().limit(2), false).await;
        assert_eq!(*calls.borrow(), 1); // the open itself

        assert!(query.set_params(QueryPatch::new().limit(5)).await);
        assert_eq!(*calls.borrow(), 2);

        // Unchanged params: no recompute, no hook
        assert!(!query.set_params(QueryPatch::new().limit(5)).await);
        assert_eq!(*calls.borrow(), 2);
    });
}

#[test]
fn silent_query_never_reenters_hook_channel() {
    block_on(async {
        let store = Store::new();
        for id in 1..=4 {
            store.set_row("users", id, row! { "id" => id }, false).await;
        }

        let calls = Rc::new(RefCell::new(0u32));
        let calls_clone = calls.clone();
        store.hook(HookPhase::Before, Some(HookOp::QueryRows), move |_ctx| {
            let calls = calls_clone.clone();
            Box::pin(async move {
                *calls.borrow_mut() += 1;
                Ok(())
            })
        });

        let query = store.query_rows("users", QueryParams::new().limit(2), true).await;
        query.next().await;
        query.set_params(QueryPatch::new().limit(3)).await;

        assert_eq!(*calls.borrow(), 0);
    });
}

#[test]
fn hook_context_carries_coordinates() {
    block_on(async {
        let store = Store::new();
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = seen.clone();
        store.hook(HookPhase::Before, Some(HookOp::SetCell), move |ctx| {
            let seen = seen_clone.clone();
            Box::pin(async move {
                *seen.borrow_mut() = Some((ctx.table.clone(), ctx.row_id.clone(), ctx.cell.clone()));
                Ok(())
            })
        });

        store.set_cell("users", 7, "name", Value::from("Ada"), false).await;

        let seen = seen.borrow();
        let (table, row_id, cell) = seen.as_ref().unwrap();
        assert_eq!(table.as_str(), "users");
        assert_eq!(row_id.as_ref().map(ToString::to_string).as_deref(), Some("7"));
        assert_eq!(cell.as_deref(), Some("name"));
    });
}
