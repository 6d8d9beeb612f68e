// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Command: single-flight view-model commands.
//!
//! A [`Command`] wraps a unit of work behind an executability check and an
//! execute entry point, and tells listeners when its executability may have
//! changed. It is the action half of a view-model layer; the state half lives
//! in `understory_bindable`.
//!
//! ## Command Shapes
//!
//! - **Argument**: `Command<()>` (the default) takes no argument,
//!   `Command<A>` takes one [`Parameter`].
//! - **Action**: a synchronous action runs inline on the caller's thread. An
//!   asynchronous action returns a future that is spawned on any
//!   [`futures::task::Spawn`] implementation and observed through a
//!   [`Completion`].
//!
//! ## Single Flight
//!
//! An asynchronous command admits one execution at a time. Admission is an
//! atomic compare-and-set on the command's in-flight flag; a caller that
//! loses the race gets [`Execution::Rejected`], which is a silent no-op and
//! not an error. The flag is released by a guard owned by the action's
//! future, so it is cleared and listeners are notified whether the action
//! succeeds, fails, panics or is dropped.
//!
//! ## Quick Start
//!
//! ```rust
//! use futures::channel::oneshot;
//! use futures::executor::{ThreadPool, block_on};
//! use std::sync::{Arc, Mutex};
//! use understory_command::{ActionError, Command, Execution};
//!
//! let pool = ThreadPool::new().unwrap();
//! let (release, gate) = oneshot::channel::<()>();
//! let gate = Arc::new(Mutex::new(Some(gate)));
//!
//! let refresh: Command = Command::builder().async_action(pool, move |()| {
//!     let gate = gate.lock().unwrap().take();
//!     async move {
//!         if let Some(gate) = gate {
//!             gate.await?;
//!         }
//!         Ok::<(), ActionError>(())
//!     }
//! });
//!
//! let Execution::Started(completion) = refresh.execute(()) else {
//!     panic!("the first execution is admitted");
//! };
//! // Single flight: a second request while the first is outstanding is a no-op.
//! assert!(!refresh.can_execute(&()));
//! assert!(matches!(refresh.execute(()), Execution::Rejected));
//!
//! release.send(()).unwrap();
//! block_on(completion).unwrap();
//! assert!(refresh.can_execute(&()));
//! ```
//!
//! ## Binding Layers
//!
//! [`Invoke`] is the object-safe form of a command. It takes the argument as
//! `Option<&dyn Any>` so that a presentation layer can hold commands of
//! different argument types side by side.

mod command;
mod completion;
mod error;
mod invoke;
mod parameter;

pub use command::{Command, CommandBuilder, Execution};
pub use completion::{Completion, Pending};
pub use error::{ActionError, CommandError};
pub use invoke::Invoke;
pub use parameter::Parameter;

pub use understory_notify::Subscription;
