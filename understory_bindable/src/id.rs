// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed property keys.
//!
//! This module provides [`Property<T>`], a compile-time typed handle for a
//! named slot in a [`PropertyBag`](crate::PropertyBag).

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A type-safe property key with a phantom value type.
///
/// A `Property<T>` pairs a property name with the value type stored under it.
/// The bag itself is keyed by name only; the phantom type lets call sites
/// read and write without casts, and the bag checks the stored type at
/// runtime only when a read could disagree with an earlier write.
///
/// Keys are usually declared as constants next to the view-model that owns
/// them:
///
/// ```rust
/// use understory_bindable::Property;
///
/// const TITLE: Property<String> = Property::new("Title");
/// const COUNT: Property<u32> = Property::new("Count");
///
/// assert_eq!(TITLE.name(), "Title");
/// assert_eq!(COUNT.name(), "Count");
/// ```
///
/// # Memory Layout
///
/// `Property<T>` is the size of a `&'static str` since `PhantomData` has zero
/// size.
pub struct Property<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
    /// Creates a typed key for `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty. In a `const` item this is a compile error.
    #[must_use]
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        assert!(!name.is_empty(), "property name must not be empty");
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

// Manual trait implementations to avoid requiring T: Clone, etc.

impl<T> Copy for Property<T> {}

impl<T> Clone for Property<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Property<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Property<T> {}

impl<T> Hash for Property<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
