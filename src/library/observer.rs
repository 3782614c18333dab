//! Publish/subscribe hub with one channel per kind of library change.
//!
//! Dispatch is synchronous and in registration order. Each dispatch works on a
//! snapshot of the subscriber list taken with the lock released, so a callback
//! may subscribe, unsubscribe, or trigger a further notification cycle; the
//! nested cycle completes before the outer one resumes.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::PresetId;

type CollectionFn = dyn Fn(&str) + Send + Sync;
type GroupSetFn = dyn Fn() + Send + Sync;
type SelectionFn = dyn Fn(Option<PresetId>) + Send + Sync;

/// Handle returned by every subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Channel<F: ?Sized> {
    subscribers: RwLock<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> Channel<F> {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn subscribe(&self, id: SubscriptionId, callback: Arc<F>) {
        self.subscribers.write().push((id, callback));
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    fn snapshot(&self) -> Vec<Arc<F>> {
        self.subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    fn len(&self) -> usize {
        self.subscribers.read().len()
    }
}

pub struct ObserverHub {
    next_id: AtomicU64,
    collection_changed: Channel<CollectionFn>,
    group_set_changed: Channel<GroupSetFn>,
    selection_changed: Channel<SelectionFn>,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            collection_changed: Channel::new(),
            group_set_changed: Channel::new(),
            selection_changed: Channel::new(),
        }
    }

    fn allocate(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Called with the group name whose membership or order changed.
    pub fn on_collection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.allocate();
        self.collection_changed.subscribe(id, Arc::new(callback));
        id
    }

    /// Called when groups are created, renamed, deleted or shown/hidden.
    pub fn on_group_set_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.allocate();
        self.group_set_changed.subscribe(id, Arc::new(callback));
        id
    }

    pub fn on_selection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Option<PresetId>) + Send + Sync + 'static,
    {
        let id = self.allocate();
        self.selection_changed.subscribe(id, Arc::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.collection_changed.unsubscribe(id)
            || self.group_set_changed.unsubscribe(id)
            || self.selection_changed.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.collection_changed.len() + self.group_set_changed.len() + self.selection_changed.len()
    }

    pub fn notify_collection_changed(&self, group: &str) {
        tracing::debug!("Collection changed: {}", group);
        for callback in self.collection_changed.snapshot() {
            callback(group);
        }
    }

    pub fn notify_group_set_changed(&self) {
        tracing::debug!("Group set changed");
        for callback in self.group_set_changed.snapshot() {
            callback();
        }
    }

    pub fn notify_selection_changed(&self, preset: Option<PresetId>) {
        tracing::debug!("Selection changed: {:?}", preset);
        for callback in self.selection_changed.snapshot() {
            callback(preset);
        }
    }
}

impl Default for ObserverHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObserverHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHub")
            .field("collection_changed", &self.collection_changed.len())
            .field("group_set_changed", &self.group_set_changed.len())
            .field("selection_changed", &self.selection_changed.len())
            .finish()
    }
}
