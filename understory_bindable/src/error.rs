// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property store error types.

/// Error returned by the name-based and checked operations of a
/// [`PropertyBag`](crate::PropertyBag).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The property name was empty.
    #[error("property name must not be empty")]
    EmptyName,

    /// A typed read asked for a different type than the one stored.
    #[error("property `{name}` holds a `{stored}`, not a `{requested}`")]
    TypeMismatch {
        /// The property that was read.
        name: String,
        /// Type name of the stored value.
        stored: &'static str,
        /// Type name the caller asked for.
        requested: &'static str,
    },
}

/// Rejects empty names.
pub(crate) fn check_name(name: &str) -> Result<(), PropertyError> {
    if name.is_empty() {
        Err(PropertyError::EmptyName)
    } else {
        Ok(())
    }
}
