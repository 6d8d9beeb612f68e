// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased property value storage.
//!
//! This module provides [`ErasedValue`] for storing property values of any
//! [`PropertyValue`] type in a single heterogeneous map, together with the
//! equality check the bag uses for change detection.

use core::any::{Any, TypeId};
use core::fmt;

/// Values that can live in a [`PropertyBag`](crate::PropertyBag).
///
/// Blanket-implemented for every `Clone + PartialEq + Send + Sync + 'static`
/// type. Equality decides whether a set is a change.
pub trait PropertyValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> PropertyValue for T {}

/// A type-erased property value.
///
/// # Example
///
/// ```rust
/// use understory_bindable::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
///
/// assert!(value.value_eq(&ErasedValue::new(42_i32)));
/// assert!(!value.value_eq(&ErasedValue::new(42_i64)));
/// ```
pub struct ErasedValue {
    inner: Box<dyn ErasedValueTrait>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedValue {
    /// Creates a new erased value from a concrete value.
    #[must_use]
    pub fn new<T: PropertyValue>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            inner: Box::new(value),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name of the contained value, for diagnostics.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    ///
    /// Returns `None` if the contained value is not of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Compares two erased values.
    ///
    /// Values of different types are never equal.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.inner.eq_any(other.inner.as_any())
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Trait object for type-erased values that can be cloned and compared.
trait ErasedValueTrait: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait>;
    fn eq_any(&self, other: &dyn Any) -> bool;
}

impl<T: PropertyValue> ErasedValueTrait for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait> {
        Box::new(self.clone())
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erased_value_i32() {
        let value = ErasedValue::new(42_i32);
        assert!(value.is::<i32>());
        assert!(!value.is::<f64>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert_eq!(value.downcast_ref::<f64>(), None);
    }

    #[test]
    fn erased_value_string() {
        let value = ErasedValue::new(String::from("hello"));
        assert_eq!(
            value.downcast_ref::<String>().map(|s| s.as_str()),
            Some("hello")
        );
        assert!(value.type_name().ends_with("String"));
    }

    #[test]
    fn erased_value_clone_is_independent() {
        let value = ErasedValue::new(vec![1_u8, 2, 3]);
        let cloned = value.clone();
        assert!(cloned.value_eq(&value));
        assert_eq!(value.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn value_eq_same_type() {
        let a = ErasedValue::new(String::from("Petr"));
        let b = ErasedValue::new(String::from("Petr"));
        let c = ErasedValue::new(String::from("Jan"));
        assert!(a.value_eq(&b));
        assert!(!a.value_eq(&c));
    }

    #[test]
    fn value_eq_across_types_is_false() {
        let a = ErasedValue::new(1_u32);
        let b = ErasedValue::new(1_u64);
        assert!(!a.value_eq(&b));
    }

    #[test]
    fn value_eq_follows_partial_eq_for_nan() {
        let a = ErasedValue::new(f64::NAN);
        assert!(!a.value_eq(&a.clone()));
    }

    #[test]
    fn erased_value_debug() {
        let value = ErasedValue::new(42_i32);
        let debug = format!("{value:?}");
        assert!(debug.contains("ErasedValue"));
        assert!(debug.contains("i32"));
    }
}
