//! Subscription management for change notifications.
//!
//! This module provides subscription ids and a manager for tracking active
//! change subscribers of a `TableStore`.

use crate::change::ChangeBatch;
use hashbrown::HashMap;
use std::rc::Rc;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type ChangeCallback = Rc<dyn Fn(&ChangeBatch)>;

/// Manages change subscriptions for a table store.
pub struct SubscriptionManager {
    /// Active subscriptions
    subscriptions: HashMap<SubscriptionId, ChangeCallback>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    /// Creates a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to changes with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeBatch) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, Rc::new(callback));
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Returns a snapshot of the current callbacks.
    ///
    /// Delivery happens on the snapshot so a callback may subscribe or
    /// unsubscribe re-entrantly while a batch is being delivered.
    pub fn callbacks(&self) -> Vec<ChangeCallback> {
        self.subscriptions.values().cloned().collect()
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if there are no subscriptions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Clears all subscriptions.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
