// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RAII subscription guard.

use std::fmt;

/// Keeps a listener registered until dropped.
///
/// Returned by [`Listeners::subscribe`](crate::Listeners::subscribe) and by the
/// `subscribe` methods of types that emit through a [`Listeners`](crate::Listeners)
/// list. Dropping the guard removes the listener. If the list has already been
/// dropped, dropping the guard does nothing.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the listener now.
    ///
    /// Equivalent to dropping the guard, spelled out for readability.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Leaves the listener registered for as long as its list lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    /// Returns `true` if dropping this guard will remove a listener.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.cancel.is_some())
            .finish()
    }
}
