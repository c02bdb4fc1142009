//! Explicit state holder with synchronous change notification.
//!
//! Replaces the app-wide context providers: each store owns an `Observable`,
//! consumers get the store by handle and subscribe to it. Listeners run on the
//! mutating thread, in registration order, after the write lock is released,
//! so a listener may read the observable it was notified by.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Process-unique, so one `unsubscribe` call can address any store.
pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Observable<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Clone of the current value
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value and notify
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut guard = self.value.write();
            *guard = value;
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Mutate in place and notify
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut guard = self.value.write();
            let result = f(&mut guard);
            (result, guard.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Mutate in place; notify only if `f` succeeds.
    /// `f` must not leave partial changes behind when it returns an error.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let (result, snapshot) = {
            let mut guard = self.value.write();
            let result = f(&mut guard)?;
            (result, guard.clone())
        };
        self.notify(&snapshot);
        Ok(result)
    }

    /// Replace the value without notifying. Pair with `notify_current` once
    /// any lock the caller holds to order writes has been released.
    pub fn replace(&self, value: T) {
        *self.value.write() = value;
    }

    /// Notify listeners with the value as it is now
    pub fn notify_current(&self) {
        let snapshot = self.get();
        self.notify(&snapshot);
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed here
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn notify(&self, value: &T) {
        // Snapshot so listeners can subscribe/unsubscribe without deadlocking
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
