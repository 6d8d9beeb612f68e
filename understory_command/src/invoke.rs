// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased "can I run? then run" protocol for presentation layers.

use core::any::Any;

use understory_notify::Subscription;

use crate::command::{Command, Execution};
use crate::parameter::Parameter;

/// Object-safe view of a command, for binding layers that do not know its
/// argument type.
///
/// The argument arrives as `Option<&dyn Any>`. A missing argument resolves
/// through [`Parameter::absent`]; an argument of another type than the
/// command's is never executable.
///
/// ```rust
/// use std::any::Any;
/// use understory_command::{Command, Invoke};
///
/// let open_row: Command<usize> = Command::new(|_row| {});
/// let commands: Vec<Box<dyn Invoke>> = vec![Box::new(open_row)];
///
/// let row: &dyn Any = &3_usize;
/// assert!(commands[0].can_invoke(Some(row)));
/// assert!(!commands[0].can_invoke(None));
/// assert!(!commands[0].can_invoke(Some(&"3")));
/// ```
pub trait Invoke: Send + Sync {
    /// Returns `true` if [`invoke`](Self::invoke) with `argument` would be
    /// accepted right now.
    fn can_invoke(&self, argument: Option<&dyn Any>) -> bool;

    /// Executes the command with `argument` if it is executable.
    fn invoke(&self, argument: Option<&dyn Any>) -> Execution;

    /// Registers a listener for "executability may have changed" signals.
    fn subscribe_can_invoke_changed(
        &self,
        listener: Box<dyn Fn() + Send + Sync>,
    ) -> Subscription;
}

impl<A: Parameter> Invoke for Command<A> {
    fn can_invoke(&self, argument: Option<&dyn Any>) -> bool {
        resolve::<A>(argument).is_some_and(|argument| self.can_execute(&argument))
    }

    fn invoke(&self, argument: Option<&dyn Any>) -> Execution {
        match resolve::<A>(argument) {
            Some(argument) => self.execute(argument),
            None => {
                tracing::debug!(
                    expected = core::any::type_name::<A>(),
                    "command argument missing or of another type"
                );
                Execution::Rejected
            }
        }
    }

    fn subscribe_can_invoke_changed(
        &self,
        listener: Box<dyn Fn() + Send + Sync>,
    ) -> Subscription {
        self.subscribe(listener)
    }
}

fn resolve<A: Parameter>(argument: Option<&dyn Any>) -> Option<A> {
    match argument {
        Some(argument) => argument.downcast_ref::<A>().cloned(),
        None => A::absent(),
    }
}
