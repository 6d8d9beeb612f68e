// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command error types.

use futures::task::SpawnError;

/// Error produced by a failing asynchronous action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of an asynchronous execution that did not succeed.
///
/// Delivered through [`Completion`](crate::Completion) and
/// [`Pending`](crate::Pending). A rejected execution is not an error; see
/// [`Execution::Rejected`](crate::Execution::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The action returned an error.
    #[error("command action failed: {0}")]
    ActionFailed(#[source] ActionError),

    /// The spawner refused the action's task.
    #[error("command action could not be spawned")]
    Spawn(#[from] SpawnError),

    /// The executor dropped the action's task before it settled.
    #[error("command action was dropped before it settled")]
    Cancelled,
}

impl CommandError {
    /// Returns `true` for [`CommandError::ActionFailed`].
    #[must_use]
    pub fn is_action_failure(&self) -> bool {
        matches!(self, Self::ActionFailed(_))
    }
}
