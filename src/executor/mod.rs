//! The dispatcher: runs tasks asynchronously with retries.
//!
//! Every dispatched task gets its own tokio task and a fresh top-level
//! [`TaskContext`]; the enqueuing caller's cancellation never reaches it.
//! Runtime failures are logged through `tracing` and never propagated back;
//! the only observable errors on the enqueue side are task-construction
//! errors.

mod context;
mod error;

pub use context::TaskContext;
pub use error::{BoxError, DispatchError, Result};

use crate::core::{ArgValue, Invocation};
use crate::registry::{Funcs, Function, Registry};
use crate::task::{Task, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY};
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::time::Duration;
use tracing::{error, warn};

/// Future type returned by task handlers.
pub type TaskFuture = Pin<Box<dyn Future<Output = std::result::Result<(), BoxError>> + Send>>;

/// Hands a built task to the background execution path and returns
/// immediately. Must be called from within a tokio runtime.
pub(crate) fn spawn_task(registry: Weak<Funcs>, task: Task) {
    tokio::spawn(execute_task(registry, task));
}

/// The per-task state machine: delayed wait, decode, resolve, then the
/// attempt loop. Decode and resolve failures are terminal; only callable
/// errors are retried, with a fixed delay between attempts.
async fn execute_task(registry: Weak<Funcs>, task: Task) {
    let retry_count = if task.options.retry_count > 0 {
        task.options.retry_count
    } else {
        DEFAULT_RETRY_COUNT
    };
    let retry_delay = if task.options.retry_delay > Duration::ZERO {
        task.options.retry_delay
    } else {
        DEFAULT_RETRY_DELAY
    };

    let name = (!task.options.name.is_empty()).then(|| task.options.name.clone());
    let ctx = TaskContext::for_task(name, task.id);

    if task.options.delay > Duration::ZERO {
        tokio::time::sleep(task.options.delay).await;
    }

    let inv = match Invocation::decode(&task.payload) {
        Ok(inv) => inv,
        Err(err) => {
            error!("delay: failed decoding task payload: {err}");
            return;
        }
    };

    let func = {
        let Some(funcs) = registry.upgrade() else {
            error!(
                "delay: registry gone before task ran: {key}",
                key = inv.key()
            );
            return;
        };
        match funcs.lookup(inv.key()) {
            Ok(func) => func,
            Err(err) => {
                error!("delay: {err}");
                return;
            }
        }
    };

    let key = inv.key().to_string();
    let args = inv.into_args();

    let mut last_err: Option<BoxError> = None;
    for attempt in 0..=retry_count {
        if attempt > 0 {
            warn!("delay: retrying task {key} (attempt {attempt}/{retry_count})");
            tokio::time::sleep(retry_delay).await;
        }

        match invoke(&func, ctx.clone(), &args).await {
            Ok(()) => return,
            Err(err) => {
                error!(
                    "delay: func {key} failed (attempt {attempt}): {err}",
                    attempt = attempt + 1
                );
                last_err = Some(err);
            }
        }
    }

    if let Some(err) = last_err {
        error!("delay: func {key} exhausted all retries: {err}");
    }
}

/// Builds the concrete call, with zero values substituted for "no value"
/// markers per the declared signature, and runs the handler.
async fn invoke(
    func: &Function,
    ctx: TaskContext,
    args: &[ArgValue],
) -> std::result::Result<(), BoxError> {
    let call_args = func.signature().materialize(args);
    (func.handler())(ctx, call_args).await
}

/// Decodes and runs a previously built task payload exactly once.
///
/// This is the in-process core of the legacy HTTP bridge: a front end that
/// receives a payload POSTed to [`crate::task::PATH`] calls this and maps
/// [`DispatchError::Decode`] / [`DispatchError::UnknownKey`] to "drop the
/// task" and [`DispatchError::Failed`] to a retryable failure (HTTP 500).
pub async fn run_payload(registry: &Registry, ctx: TaskContext, payload: &[u8]) -> Result<()> {
    let inv = Invocation::decode(payload).map_err(DispatchError::Decode)?;
    let func = registry.lookup(inv.key())?;
    invoke(&func, ctx, inv.args())
        .await
        .map_err(DispatchError::Failed)
}

/// Executes `f` in the background after `delay`.
///
/// A simpler API for one-off delayed work that needs no registration. The
/// closure receives a fresh top-level context; its error is logged, never
/// returned. Must be called from within a tokio runtime.
pub fn later<F, Fut>(_ctx: &TaskContext, delay: Duration, f: F)
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
{
    tokio::spawn(async move {
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        if let Err(err) = f(TaskContext::background()).await {
            error!("delay: later func failed: {err}");
        }
    });
}

/// Executes `f` immediately in the background.
pub fn now<F, Fut>(ctx: &TaskContext, f: F)
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
{
    later(ctx, Duration::ZERO, f)
}
