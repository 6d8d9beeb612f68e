// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The command type, its builder and execution outcomes.

use core::fmt;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use futures::task::{Spawn, SpawnExt};
use understory_notify::Subscription;

use crate::completion::{Completion, Flight, InFlightGuard, Pending};
use crate::error::{ActionError, CommandError};
use crate::parameter::Parameter;

type Predicate<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;
type SyncAction<A> = Box<dyn Fn(A) + Send + Sync>;
type AsyncAction<A> = Box<dyn Fn(A) -> BoxFuture<'static, Result<(), ActionError>> + Send + Sync>;

enum Action<A> {
    Sync(SyncAction<A>),
    Async {
        spawner: Arc<dyn Spawn + Send + Sync>,
        run: AsyncAction<A>,
    },
}

struct Inner<A> {
    predicate: Option<Predicate<A>>,
    action: Action<A>,
    flight: Arc<Flight>,
}

/// What [`Command::execute`] did with a request.
#[derive(Debug)]
pub enum Execution {
    /// The command was not executable. Nothing ran and nothing was notified.
    Rejected,
    /// A synchronous action ran to completion.
    Completed,
    /// An asynchronous action was admitted and spawned.
    Started(Completion),
}

impl Execution {
    /// Returns `true` unless the request was rejected.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Returns the completion handle of a started asynchronous execution.
    #[must_use]
    pub fn into_completion(self) -> Option<Completion> {
        match self {
            Self::Started(completion) => Some(completion),
            Self::Rejected | Self::Completed => None,
        }
    }
}

/// A view-model command: a unit of work behind an executability check.
///
/// Asynchronous commands are single-flight: while an action is outstanding,
/// [`can_execute`](Self::can_execute) is `false` and further executions are
/// rejected. Admission is a single atomic compare-and-set, so two racing
/// callers can never both start the action. Executability listeners are
/// notified when an execution starts and again when it settles.
///
/// Cloning a command yields another handle to the same command.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use understory_command::{Command, Execution};
///
/// let saves = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&saves);
/// let save: Command = Command::builder()
///     .can_execute(|_| true)
///     .action(move |()| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
///
/// assert!(save.can_execute(&()));
/// assert!(matches!(save.execute(()), Execution::Completed));
/// assert_eq!(saves.load(Ordering::SeqCst), 1);
/// ```
pub struct Command<A: Parameter = ()> {
    inner: Arc<Inner<A>>,
}

impl<A: Parameter> Command<A> {
    /// Returns a builder for a command taking `A`.
    #[must_use]
    pub fn builder() -> CommandBuilder<A> {
        CommandBuilder::new()
    }

    /// Creates an always-executable synchronous command.
    #[must_use]
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        CommandBuilder::new().action(action)
    }

    fn from_parts(predicate: Option<Predicate<A>>, action: Action<A>) -> Self {
        Self {
            inner: Arc::new(Inner {
                predicate,
                action,
                flight: Arc::new(Flight::default()),
            }),
        }
    }

    /// Returns `true` if `argument` would currently be accepted.
    ///
    /// `false` while an asynchronous execution is in flight or when the
    /// predicate rejects the argument.
    #[must_use]
    pub fn can_execute(&self, argument: &A) -> bool {
        !self.inner.flight.is_in_flight()
            && self
                .inner
                .predicate
                .as_ref()
                .is_none_or(|predicate| predicate(argument))
    }

    /// Runs the command if it is executable.
    ///
    /// A synchronous action runs inline. An asynchronous action is spawned on
    /// the command's spawner and the call returns at once; the returned
    /// [`Completion`] reports how it settled.
    pub fn execute(&self, argument: A) -> Execution {
        let spawner = match &self.inner.action {
            Action::Sync(run) => {
                if !self.can_execute(&argument) {
                    tracing::trace!("command rejected");
                    return Execution::Rejected;
                }
                run(argument);
                return Execution::Completed;
            }
            Action::Async { spawner, .. } => spawner,
        };

        let Some(pending) = self.begin(argument) else {
            return Execution::Rejected;
        };
        let (sender, receiver) = oneshot::channel();
        let task = async move {
            let result = pending.await;
            // The caller may have dropped its completion; the outcome is then unobserved.
            let _ = sender.send(result);
        };
        match spawner.spawn(task) {
            Ok(()) => Execution::Started(Completion::from_receiver(receiver)),
            Err(err) => {
                tracing::warn!(%err, "command action could not be spawned");
                Execution::Started(Completion::failed(CommandError::Spawn(err)))
            }
        }
    }

    /// Admits an execution without spawning it.
    ///
    /// Returns `None` if the command is not executable. Otherwise the action
    /// has been invoked and the returned [`Pending`] drives it to completion
    /// on whatever executor polls it. For a synchronous command the action has
    /// already run and the `Pending` is resolved.
    pub fn begin(&self, argument: A) -> Option<Pending> {
        if !self.can_execute(&argument) {
            tracing::trace!("command rejected");
            return None;
        }
        match &self.inner.action {
            Action::Sync(run) => {
                run(argument);
                Some(Pending::ready())
            }
            Action::Async { run, .. } => {
                let flight = &self.inner.flight;
                if !flight.try_claim() {
                    tracing::trace!("command rejected, another execution won the race");
                    return None;
                }
                // Released on unwind if `run` panics.
                let guard = InFlightGuard::new(Arc::clone(flight));
                flight.notify();
                tracing::trace!("command started");
                let future = run(argument);
                Some(Pending::guarded(future, guard))
            }
        }
    }

    /// Returns `true` while an asynchronous execution is outstanding.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.inner.flight.is_in_flight()
    }

    /// Returns `true` for commands built with
    /// [`CommandBuilder::async_action`].
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self.inner.action, Action::Async { .. })
    }

    /// Registers a listener for "executability may have changed" signals.
    ///
    /// Listeners should re-query [`can_execute`](Self::can_execute); the
    /// signal carries no value.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner
            .flight
            .listeners()
            .subscribe(move |_: &()| listener())
    }

    /// Signals that the predicate's answer may have changed.
    pub fn raise_can_execute_changed(&self) {
        self.inner.flight.notify();
    }
}

impl<A: Parameter> Clone for Command<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Parameter> fmt::Debug for Command<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("is_async", &self.is_async())
            .field("has_predicate", &self.inner.predicate.is_some())
            .field("executing", &self.is_executing())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Command`].
///
/// Optional settings come first; [`action`](Self::action) or
/// [`async_action`](Self::async_action) finishes the command.
#[must_use = "a CommandBuilder does nothing until an action is supplied"]
pub struct CommandBuilder<A: Parameter = ()> {
    predicate: Option<Predicate<A>>,
}

impl<A: Parameter> CommandBuilder<A> {
    /// Creates a builder for an always-executable command.
    pub fn new() -> Self {
        Self { predicate: None }
    }

    /// Sets the executability predicate.
    pub fn can_execute<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Finishes a synchronous command.
    pub fn action<F>(self, action: F) -> Command<A>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Command::from_parts(self.predicate, Action::Sync(Box::new(action)))
    }

    /// Finishes an asynchronous, single-flight command.
    ///
    /// Each admitted execution calls `action` and spawns the returned future
    /// on `spawner`.
    pub fn async_action<S, F, Fut, E>(self, spawner: S, action: F) -> Command<A>
    where
        S: Spawn + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<ActionError> + 'static,
    {
        let run: AsyncAction<A> = Box::new(move |argument| {
            let future: BoxFuture<'static, Result<(), ActionError>> =
                action(argument).map_err(Into::into).boxed();
            future
        });
        Command::from_parts(
            self.predicate,
            Action::Async {
                spawner: Arc::new(spawner),
                run,
            },
        )
    }
}

impl<A: Parameter> Default for CommandBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Parameter> fmt::Debug for CommandBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuilder")
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}
