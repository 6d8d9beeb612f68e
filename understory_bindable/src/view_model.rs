// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View-model traits and initial snapshot.
//!
//! This module provides the [`ViewModel`] trait for objects backed by a
//! [`PropertyBag`], [`ViewModelExt`] for convenient property access, and the
//! [`Snapshot`] used to seed a bag from a view-model's current state.

use core::fmt;

use understory_notify::Subscription;

use crate::bag::PropertyBag;
use crate::id::Property;
use crate::value::PropertyValue;

/// An object whose bindable properties live in a [`PropertyBag`].
///
/// # Example
///
/// ```rust
/// use understory_bindable::{Property, PropertyBag, Snapshot, ViewModel, ViewModelExt};
///
/// const NAME: Property<String> = Property::new("Name");
/// const SIZE: Property<u64> = Property::new("Size");
///
/// struct FileViewModel {
///     bag: PropertyBag,
///     path: String,
/// }
///
/// impl ViewModel for FileViewModel {
///     fn property_bag(&self) -> &PropertyBag {
///         &self.bag
///     }
///
///     fn snapshot(&self, snapshot: &mut Snapshot<'_>) {
///         snapshot
///             .value(NAME, self.path.clone())
///             .read(SIZE, || std::fs::metadata(&self.path).map(|m| m.len()));
///     }
/// }
///
/// let vm = FileViewModel {
///     bag: PropertyBag::new(),
///     path: "/definitely/not/here".to_owned(),
/// };
/// let summary = vm.bootstrap();
/// assert_eq!(summary.seeded, 1);
/// assert_eq!(summary.skipped, 1);
/// assert_eq!(vm.get_property(NAME), "/definitely/not/here");
/// assert_eq!(vm.get_property(SIZE), 0);
/// ```
pub trait ViewModel {
    /// Returns the bag holding this view-model's properties.
    fn property_bag(&self) -> &PropertyBag;

    /// Reports the currently readable properties of this view-model.
    ///
    /// Called once by [`ViewModelExt::bootstrap`]. The default reports nothing.
    fn snapshot(&self, snapshot: &mut Snapshot<'_>) {
        let _ = snapshot;
    }
}

/// Extension methods for [`ViewModel`].
pub trait ViewModelExt: ViewModel {
    /// Reads a property, falling back to its default.
    fn get_property<T: PropertyValue + Default>(&self, property: Property<T>) -> T {
        self.property_bag().get(property)
    }

    /// Writes a property, notifying it and its declared dependents on change.
    fn set_property<T: PropertyValue + Default>(&self, property: Property<T>, value: T) -> bool {
        self.property_bag().set(property, value)
    }

    /// Writes a property, notifying it and `also_notify` on change.
    fn set_property_and_notify<T: PropertyValue + Default>(
        &self,
        property: Property<T>,
        value: T,
        also_notify: &[&str],
    ) -> bool {
        self.property_bag()
            .set_and_notify(property, value, also_notify)
    }

    /// Registers a change listener on the view-model's bag.
    fn subscribe_property_changed<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.property_bag().subscribe(listener)
    }

    /// Seeds the bag from [`ViewModel::snapshot`] without notifying.
    fn bootstrap(&self) -> SnapshotSummary {
        let mut snapshot = Snapshot::new(self.property_bag());
        self.snapshot(&mut snapshot);
        let summary = snapshot.summary();
        tracing::debug!(
            seeded = summary.seeded,
            skipped = summary.skipped,
            "view-model bootstrapped"
        );
        summary
    }
}

impl<V: ViewModel + ?Sized> ViewModelExt for V {}

/// Collects the current values of a view-model into its bag.
///
/// Values are stored silently. Reads that fail are skipped.
pub struct Snapshot<'a> {
    bag: &'a PropertyBag,
    summary: SnapshotSummary,
}

/// Outcome of a [`ViewModelExt::bootstrap`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Properties whose value was stored.
    pub seeded: usize,
    /// Properties whose read failed.
    pub skipped: usize,
}

impl<'a> Snapshot<'a> {
    /// Creates a snapshot writing into `bag`.
    #[must_use]
    pub fn new(bag: &'a PropertyBag) -> Self {
        Self {
            bag,
            summary: SnapshotSummary::default(),
        }
    }

    /// Seeds `property` with a value that is known to be readable.
    pub fn value<T: PropertyValue + Default>(&mut self, property: Property<T>, value: T) -> &mut Self {
        self.bag.set_silently(property, value);
        self.summary.seeded += 1;
        self
    }

    /// Seeds `property` from a fallible read, skipping it if `read` fails.
    pub fn read<T, E, F>(&mut self, property: Property<T>, read: F) -> &mut Self
    where
        T: PropertyValue + Default,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        match read() {
            Ok(value) => {
                self.value(property, value);
            }
            Err(err) => {
                tracing::debug!(property = property.name(), %err, "snapshot read failed, skipping");
                self.summary.skipped += 1;
            }
        }
        self
    }

    /// Returns the counts collected so far.
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        self.summary
    }
}

impl fmt::Debug for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}
