//! Typed synchronous event channels.
//!
//! Consumers subscribe with a callback and hold on to the returned
//! [`Subscription`]; dropping the handle detaches the listener. Emission is
//! synchronous on the emitting thread, in subscription order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ListenerTable<T> = RwLock<Vec<(u64, Listener<T>)>>;

/// A typed publish/subscribe channel.
pub struct Emitter<T> {
    listeners: Arc<ListenerTable<T>>,
    next_id: AtomicU64,
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener. It stays attached until the returned handle is
    /// dropped or disposed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription
    where
        T: 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap()
            .push((id, Arc::new(listener)));

        let table: Weak<ListenerTable<T>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table
                    .write()
                    .unwrap()
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Deliver `event` to every attached listener, synchronously.
    ///
    /// Listeners are snapshotted before delivery so a listener may
    /// subscribe or unsubscribe reentrantly without deadlocking; such
    /// mutations take effect from the next emission.
    pub fn emit(&self, event: &T) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .read()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of currently attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap().len()
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// RAII handle for a registered listener.
///
/// The listener stays attached for as long as this handle is alive;
/// dropping it (or calling [`Subscription::dispose`]) detaches it.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Build a handle around a detach action.
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now instead of at drop time.
    pub fn dispose(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
