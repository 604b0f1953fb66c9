//! In-memory, app-wide session state with change notification.
//!
//! Two ways to observe transitions:
//! - [`SessionBroadcaster::subscribe`] registers a callback and returns a
//!   [`Subscription`] that unregisters it on drop.
//! - [`SessionBroadcaster::watch`] hands out a `tokio::sync::watch`
//!   receiver for async consumers.
//!
//! Every broadcast notifies, including one that repeats the current state.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tracing::debug;

use super::state::SessionState;

type Callback = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

struct Inner {
    sender: watch::Sender<SessionState>,
    registry: Mutex<Registry>,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: u64) {
        self.registry().callbacks.retain(|(entry, _)| *entry != id);
    }
}

/// Holds the current [`SessionState`] and notifies observers of transitions.
///
/// Clones share the same state and subscriber list.
#[derive(Clone)]
pub struct SessionBroadcaster {
    inner: Arc<Inner>,
}

impl SessionBroadcaster {
    /// Start in [`SessionState::Uninitialized`].
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                sender,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Current state.
    pub fn current(&self) -> SessionState {
        self.inner.sender.borrow().clone()
    }

    /// Apply `state`, then notify every subscriber.
    ///
    /// The state is visible through [`current`](Self::current) before any
    /// callback runs. Callbacks run on the caller's task, outside the
    /// registry lock, so they may subscribe or unsubscribe.
    pub fn broadcast(&self, state: SessionState) {
        debug!(state = %state, "Broadcasting session state");
        self.inner.sender.send_replace(state.clone());

        let callbacks: Vec<Callback> = self
            .inner
            .registry()
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(&state);
        }
    }

    /// Register `callback` for every future broadcast.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let mut registry = self.inner.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Receiver that observes every broadcast.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.registry().callbacks.len()
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a registered callback. Unsubscribes on drop.
#[must_use = "dropping the Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Stop receiving broadcasts.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove(self.id);
        }
    }
}
