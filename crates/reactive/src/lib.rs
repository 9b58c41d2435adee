//! Tabulon Reactive - reactive table container for the Tabulon store.
//!
//! This crate holds the mutable table state and implements the change
//! tracking every other layer builds on:
//!
//! - `TableStore`: the table collection, mutable at table/row/cell paths
//! - `Change` / `ChangeBatch`: what changed, delivered after mutations settle
//! - `SubscriptionManager`: change subscribers
//!
//! Staleness is tracked with explicit generation counters rather than a
//! hidden subscription graph: every write bumps a global counter and the
//! touched table's counter, and derived computations (live queries) compare
//! generations to decide whether their cached result is still current.
//!
//! Mutations performed between `begin_batch`/`end_batch` are buffered and
//! delivered to subscribers as one combined `ChangeBatch`; no subscriber can
//! observe a half-applied batch.

pub mod change;
pub mod subscription;
pub mod tables;

pub use change::{Change, ChangeBatch};
pub use subscription::{ChangeCallback, SubscriptionId, SubscriptionManager};
pub use tables::TableStore;
