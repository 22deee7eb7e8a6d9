//! delayq: in-process deferred task execution.
//!
//! A lightweight job layer that lets code register named functions ahead of
//! time, enqueue calls to them with serializable arguments, and execute them
//! asynchronously with retries, recovering the registered function by name
//! at execution time.
//!
//! # Features
//!
//! - **Function registry**: process-wide key → callable mapping, populated
//!   at init, with sticky registration errors instead of panics
//! - **Typed argument marshaling**: an explicit tagged argument
//!   representation validated against a per-function signature, no runtime
//!   reflection
//! - **Fire-and-forget dispatch**: `call` returns before the callable runs;
//!   only task-construction errors are observable on the enqueue side
//! - **Retries**: fixed-delay retry of callable failures, bounded by a
//!   per-task retry count
//! - **Fan-out**: a worker that runs a callback across a datastore
//!   collection in bounded windows
//!
//! # Quick Start
//!
//! ```ignore
//! use delayq::prelude::*;
//! use std::time::Duration;
//!
//! // At process init:
//! let send_welcome = delayq::func(
//!     "send-welcome-email",
//!     Signature::new([ParamType::Context, ParamType::Str]),
//!     |_ctx, args| {
//!         Box::pin(async move {
//!             let user_id = args[0].as_str()?;
//!             mailer::send_welcome(user_id).await?;
//!             Ok(())
//!         })
//!     },
//! );
//!
//! // At request time: returns immediately, runs in the background.
//! send_welcome.call(&TaskContext::background(), args!["user-42"])?;
//!
//! // Or with an execution name and an initial delay:
//! send_welcome.once(
//!     &TaskContext::background(),
//!     "welcome-user-42",
//!     Duration::from_secs(60),
//!     args!["user-42"],
//! )?;
//! ```
//!
//! # Module Organization
//!
//! - [`core`]: foundation types (hides the serialization format)
//! - [`registry`]: function descriptors and the process registry
//! - [`task`]: the transportable task envelope
//! - [`executor`]: background dispatch, retries, the bridge runner
//! - [`tasks`]: named task registry
//! - [`parallel`]: datastore fan-out worker
//!
//! # Dispatch semantics
//!
//! Dispatched tasks run on a fresh top-level context: the enqueuing caller's
//! cancellation is deliberately not propagated, so a task survives the
//! request that enqueued it. There is no ordering across calls, no per-key
//! mutual exclusion, and no concurrency bound; callers needing any of those
//! must build them on top.

pub mod core;
pub mod executor;
pub mod parallel;
pub mod registry;
pub mod task;
pub mod tasks;

pub use crate::core::{
    deserialize_value, serialize_value, ArgKind, ArgValue, ArgsError, Error as CoreError,
    Invocation, ParamType, Result as CoreResult, Signature,
};

pub use crate::executor::{
    later, now, run_payload, BoxError, DispatchError, TaskContext, TaskFuture,
};

pub use crate::registry::{
    func, func_by_key, global, Function, Handler, Registry, RegistryError, TaskError,
    UnknownKeyError,
};

pub use crate::task::{Task, TaskOptions, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, PATH};

pub use crate::parallel::{Datastore, Entity, EntityFn, ParallelError, ParallelFn};

// Re-export dependencies used in the public API so users don't hit version
// mismatches.
pub use serde_json;
pub use tokio;

/// Prelude module for convenient glob imports.
///
/// # Example
///
/// ```ignore
/// use delayq::prelude::*;
/// ```
pub mod prelude {
    pub use crate::args;
    pub use crate::core::{ArgKind, ArgValue, ArgsError, Invocation, ParamType, Signature};
    pub use crate::executor::{
        later, now, run_payload, BoxError, DispatchError, TaskContext, TaskFuture,
    };
    pub use crate::parallel::{Datastore, Entity, ParallelError, ParallelFn};
    pub use crate::registry::{
        func, func_by_key, Function, Registry, RegistryError, TaskError, UnknownKeyError,
    };
    pub use crate::task::{Task, TaskOptions, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, PATH};

    pub use std::sync::Arc;
}
