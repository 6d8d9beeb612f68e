// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance listener list.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;

use crate::subscription::Subscription;

/// Inline capacity for listener storage.
///
/// A bound property or command rarely has more than a handful of observers.
const INLINE_CAPACITY: usize = 4;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E: ?Sized> {
    next_id: u64,
    entries: SmallVec<[(u64, Callback<E>); INLINE_CAPACITY]>,
}

/// An explicit list of callbacks receiving `&E` events.
///
/// `E` may be unsized, so `Listeners<str>` delivers property names without
/// allocating and `Listeners<()>` delivers payload-free signals.
///
/// Each emit takes a snapshot of the registered callbacks under a mutex and
/// invokes them after releasing it. Callbacks may therefore subscribe,
/// unsubscribe, or re-enter the owning object. A callback may also run
/// concurrently with another emit from a different thread.
///
/// # Example
///
/// ```rust
/// use understory_notify::Listeners;
///
/// let signal = Listeners::<()>::new();
/// let subscription = signal.subscribe(|_| {});
/// assert_eq!(signal.len(), 1);
/// assert_eq!(signal.emit(&()), 1);
///
/// subscription.unsubscribe();
/// assert!(signal.is_empty());
/// ```
pub struct Listeners<E: ?Sized> {
    registry: Arc<Mutex<Registry<E>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // No callback runs under this lock, so a poisoned guard still holds a
    // consistent list.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E: ?Sized + 'static> Listeners<E> {
    /// Creates an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: SmallVec::new(),
            })),
        }
    }

    /// Registers `listener` and returns the guard that keeps it registered.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(listener)));
            id
        };

        let weak = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                lock(&registry).entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Invokes every registered listener with `event`.
    ///
    /// Returns the number of listeners invoked. A panicking listener
    /// propagates to the caller and skips the listeners after it.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: SmallVec<[Callback<E>; INLINE_CAPACITY]> = lock(&self.registry)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in &snapshot {
            callback(event);
        }
        snapshot.len()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: ?Sized + 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
