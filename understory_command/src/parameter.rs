// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command argument types.

use std::sync::Arc;

/// A type usable as a command argument.
///
/// [`absent`](Self::absent) tells the type-erased [`Invoke`](crate::Invoke)
/// protocol what a missing argument means. Most types do not admit absence,
/// so invoking them without an argument is not executable. `()` and
/// `Option<T>` do.
///
/// User types opt in with an empty `impl`:
///
/// ```rust
/// use understory_command::Parameter;
///
/// #[derive(Clone)]
/// struct Row(usize);
///
/// impl Parameter for Row {}
///
/// assert!(Row::absent().is_none());
/// assert_eq!(<Option<u32>>::absent(), Some(None));
/// ```
pub trait Parameter: Clone + Send + Sync + 'static {
    /// The value standing in for a missing argument, if the type admits one.
    fn absent() -> Option<Self> {
        None
    }
}

impl Parameter for () {
    fn absent() -> Option<Self> {
        Some(())
    }
}

impl<T: Clone + Send + Sync + 'static> Parameter for Option<T> {
    fn absent() -> Option<Self> {
        Some(None)
    }
}

macro_rules! impl_parameter {
    ($($ty:ty),* $(,)?) => {
        $(impl Parameter for $ty {})*
    };
}

impl_parameter!(
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
    Arc<str>,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_and_option_admit_absence() {
        assert_eq!(<()>::absent(), Some(()));
        assert_eq!(<Option<String>>::absent(), Some(None));
    }

    #[test]
    fn plain_values_do_not() {
        assert_eq!(u32::absent(), None);
        assert_eq!(String::absent(), None);
        assert_eq!(<Arc<str>>::absent(), None);
    }
}
