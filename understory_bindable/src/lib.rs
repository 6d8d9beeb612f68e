// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Bindable: thread-safe bindable property storage.
//!
//! This crate provides the state half of a view-model layer: a per-object
//! store of named, typed values that tells subscribers which property changed.
//!
//! ## Core Concepts
//!
//! ### Property Storage
//!
//! [`PropertyBag`] holds every value of one view-model, keyed by name and
//! stored type-erased. A [`Property<T>`] key is a typed handle on a name: it
//! carries no storage and is usually declared as a `const`.
//!
//! ### Change Detection
//!
//! A set compares the new value with the stored one using `PartialEq`. Only
//! real changes are stored and notified. A property that was never set
//! compares as its type's default, so writing the default to it is not a
//! change.
//!
//! ### Dependent Properties
//!
//! Computed properties are notified alongside their inputs, either listed per
//! call with [`PropertyBag::set_and_notify`] or declared once per type in a
//! [`DependencyMap`] and applied by [`PropertyBag::set`].
//!
//! ### Batching
//!
//! Between [`PropertyBag::begin_batch`] and the matching outermost
//! [`PropertyBag::end_batch`], changes are recorded instead of notified. When
//! the scope ends each changed name is notified exactly once, or the whole set
//! is discarded. [`PropertyBag::batch`] returns an RAII [`BatchScope`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, LazyLock, Mutex};
//! use understory_bindable::{
//!     DependencyMap, Property, PropertyBag, ViewModel, ViewModelExt,
//! };
//!
//! const FIRST_NAME: Property<String> = Property::new("FirstName");
//! const LAST_NAME: Property<String> = Property::new("LastName");
//!
//! static PERSON_DEPENDENCIES: LazyLock<Arc<DependencyMap>> = LazyLock::new(|| {
//!     Arc::new(
//!         DependencyMap::builder()
//!             .depends_on("FullName", ["FirstName", "LastName"])
//!             .build(),
//!     )
//! });
//!
//! struct Person {
//!     bag: PropertyBag,
//! }
//!
//! impl Person {
//!     fn new() -> Self {
//!         Self {
//!             bag: PropertyBag::with_dependencies(Arc::clone(&PERSON_DEPENDENCIES)),
//!         }
//!     }
//!
//!     fn full_name(&self) -> String {
//!         format!("{} {}", self.get_property(FIRST_NAME), self.get_property(LAST_NAME))
//!     }
//! }
//!
//! impl ViewModel for Person {
//!     fn property_bag(&self) -> &PropertyBag {
//!         &self.bag
//!     }
//! }
//!
//! let person = Person::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//! let _subscription = person.subscribe_property_changed(move |name| {
//!     log.lock().unwrap().push(name.to_owned());
//! });
//!
//! assert!(person.set_property(FIRST_NAME, "Petr".to_owned()));
//! assert!(!person.set_property(FIRST_NAME, "Petr".to_owned()));
//! assert_eq!(*seen.lock().unwrap(), ["FirstName", "FullName"]);
//!
//! person.set_property(LAST_NAME, "Novak".to_owned());
//! assert_eq!(person.full_name(), "Petr Novak");
//! ```
//!
//! ## Invariants
//!
//! 1. A set whose value equals the stored value neither stores nor notifies.
//! 2. For a single change, the property itself is notified before its
//!    dependents.
//! 3. Inside a batch scope no notification is delivered; each distinct changed
//!    name is notified once when the outermost scope ends with flush.
//! 4. No bag lock is held while a listener runs.
//!
//! ## Threading
//!
//! [`PropertyBag`] is `Send + Sync`. Listeners run on whichever thread
//! committed the change and must marshal to a UI thread themselves if needed.

mod bag;
mod changes;
mod dependencies;
mod error;
mod id;
mod value;
mod view_model;

pub use bag::{BatchScope, PropertyBag};
pub use dependencies::{DependencyMap, DependencyMapBuilder};
pub use error::PropertyError;
pub use id::Property;
pub use value::{ErasedValue, PropertyValue};
pub use view_model::{Snapshot, SnapshotSummary, ViewModel, ViewModelExt};

pub use understory_notify::Subscription;
