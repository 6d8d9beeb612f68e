// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-flight bookkeeping and completion handles for asynchronous actions.

use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use understory_notify::Listeners;

use crate::error::{ActionError, CommandError};

/// Single-flight flag and executability listeners of one command.
#[derive(Debug, Default)]
pub(crate) struct Flight {
    in_flight: AtomicBool,
    listeners: Listeners<()>,
}

impl Flight {
    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the flag. Only one caller wins until the flag is released.
    pub(crate) fn try_claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn listeners(&self) -> &Listeners<()> {
        &self.listeners
    }

    pub(crate) fn notify(&self) {
        self.listeners.emit(&());
    }
}

/// Releases the in-flight flag and notifies when dropped.
///
/// Held by the action's future, so release happens on success, failure,
/// panic unwinding and cancellation alike.
pub(crate) struct InFlightGuard {
    flight: Arc<Flight>,
}

impl InFlightGuard {
    pub(crate) fn new(flight: Arc<Flight>) -> Self {
        Self { flight }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flight.in_flight.store(false, Ordering::Release);
        tracing::trace!("command settled");
        self.flight.notify();
    }
}

/// An admitted execution that the caller drives itself.
///
/// Returned by [`Command::begin`](crate::Command::begin). Resolves once the
/// action settles; the command becomes executable again just before that.
/// Dropping a `Pending` cancels the action and releases the command.
#[must_use = "futures do nothing unless polled"]
pub struct Pending {
    future: BoxFuture<'static, Result<(), ActionError>>,
    guard: Option<InFlightGuard>,
}

impl Pending {
    pub(crate) fn guarded(
        future: BoxFuture<'static, Result<(), ActionError>>,
        guard: InFlightGuard,
    ) -> Self {
        Self {
            future,
            guard: Some(guard),
        }
    }

    pub(crate) fn ready() -> Self {
        Self {
            future: future::ready(Ok(())).boxed(),
            guard: None,
        }
    }
}

impl Future for Pending {
    type Output = Result<(), CommandError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = match this.future.as_mut().poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };
        this.guard.take();
        Poll::Ready(result.map_err(|err| {
            tracing::debug!(%err, "command action failed");
            CommandError::ActionFailed(err)
        }))
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("in_flight", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

/// Observes the outcome of a spawned asynchronous execution.
///
/// Returned inside [`Execution::Started`](crate::Execution::Started).
/// Awaiting it is optional: dropping a `Completion` does not cancel the
/// action.
#[must_use = "dropping a Completion discards the action's outcome"]
pub struct Completion {
    inner: BoxFuture<'static, Result<(), CommandError>>,
}

impl Completion {
    pub(crate) fn from_receiver(receiver: oneshot::Receiver<Result<(), CommandError>>) -> Self {
        Self {
            inner: receiver
                .map(|received| received.unwrap_or(Err(CommandError::Cancelled)))
                .boxed(),
        }
    }

    pub(crate) fn failed(error: CommandError) -> Self {
        Self {
            inner: future::ready(Err(error)).boxed(),
        }
    }
}

impl Future for Completion {
    type Output = Result<(), CommandError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}
