//! Synchronous in-process publish/subscribe.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::event::WorkspaceEvent;

/// Callback invoked for every published event.
pub type Subscriber = Arc<dyn Fn(&WorkspaceEvent) + Send + Sync>;

/// Identifier of one registration on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    /// Kept in registration order.
    subscribers: Mutex<Vec<(SubscriberId, Subscriber)>>,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(SubscriberId, Subscriber)>> {
        // A panicking subscriber never runs under this lock, so the list is
        // still consistent after poisoning.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }
}

/// Process-wide channel for workspace change notifications.
///
/// `publish` calls every registered subscriber once, in registration order,
/// before returning. There is no queue and no replay: a subscriber registered
/// after a publish never sees it. Cloning the bus yields another handle to
/// the same registry.
#[derive(Clone, Default)]
pub struct BroadcastBus {
    inner: Arc<BusInner>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and returns its handle.
    ///
    /// Dropping the handle does not unsubscribe; call
    /// [`Subscription::unsubscribe`] to end delivery.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WorkspaceEvent) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers().push((id, Arc::new(callback)));
        tracing::debug!("[BroadcastBus] Subscriber {:?} registered", id);

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Removes a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            tracing::debug!("[BroadcastBus] Subscriber {:?} removed", id);
        }
        removed
    }

    /// Delivers `event` to every current subscriber and returns how many were
    /// called.
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe or
    /// unsubscribe; those changes apply from the next publish. A panicking
    /// subscriber is logged and skipped; the rest still receive the event.
    pub fn publish(&self, event: &WorkspaceEvent) -> usize {
        let snapshot: Vec<Subscriber> = self
            .inner
            .subscribers()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        tracing::debug!(
            "[BroadcastBus] Publishing {} to {} subscriber(s)",
            event.kind(),
            snapshot.len()
        );
        for subscriber in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| subscriber(event))).is_err() {
                tracing::error!(
                    "[BroadcastBus] Subscriber panicked while handling {}",
                    event.kind()
                );
            }
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

impl std::fmt::Debug for BroadcastBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Registration handle returned by [`BroadcastBus::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Ends delivery to this subscriber. Returns false if the bus is gone or
    /// the subscriber was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.remove(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for BusInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusInner").finish_non_exhaustive()
    }
}
