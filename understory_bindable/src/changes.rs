// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending change set: names changed inside a batch scope.

use std::sync::Arc;

use hashbrown::HashSet;

/// Deduplicated set of property names awaiting notification.
///
/// Names are drained in the order they were first marked. The contract only
/// promises distinctness; the order keeps flushes reproducible.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    order: Vec<Arc<str>>,
    seen: HashSet<Arc<str>>,
}

impl ChangeSet {
    /// Marks `name` as changed.
    ///
    /// Returns `true` if the name was newly inserted, `false` if it was already pending.
    pub(crate) fn mark(&mut self, name: &Arc<str>) -> bool {
        if self.seen.insert(Arc::clone(name)) {
            self.order.push(Arc::clone(name));
            true
        } else {
            false
        }
    }

    /// Returns the number of pending names.
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Removes and returns every pending name.
    pub(crate) fn take(&mut self) -> Vec<Arc<str>> {
        self.seen.clear();
        core::mem::take(&mut self.order)
    }
}
