// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Notify: listener lists for change notification.
//!
//! This crate provides the notification plumbing shared by the bindable
//! property store and the command dispatcher:
//!
//! - [`Listeners`]: an explicit, per-instance list of callbacks. Emitting an
//!   event snapshots the list under a lock and invokes every callback after
//!   the lock is released, so callbacks may freely re-enter the owner.
//! - [`Subscription`]: RAII guard returned by [`Listeners::subscribe`].
//!   Dropping it removes the callback; [`Subscription::detach`] keeps the
//!   callback registered for the lifetime of the list.
//!
//! Lists are owned by the object that emits through them. There is no
//! process-wide registry, so dropping the owner drops every callback.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use understory_notify::Listeners;
//!
//! let listeners = Listeners::<str>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let seen_clone = Arc::clone(&seen);
//! let subscription = listeners.subscribe(move |name: &str| {
//!     assert_eq!(name, "Title");
//!     seen_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! listeners.emit("Title");
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! // Dropping the subscription unsubscribes.
//! drop(subscription);
//! listeners.emit("Title");
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```
//!
//! ## Invariants
//!
//! 1. Callbacks are invoked in registration order.
//! 2. No internal lock is held while a callback runs.
//! 3. A callback removed before an emit starts is not invoked by it.

mod listeners;
mod subscription;

pub use listeners::Listeners;
pub use subscription::Subscription;
