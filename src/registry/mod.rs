//! The function registry: process-wide mapping from string keys to
//! registered callables.
//!
//! Functions are declared at process initialization and live for the process
//! lifetime; there is no unregister operation. Registration failures are
//! sticky rather than fatal (see [`RegistryError`]), and looking up an
//! unknown key reports a distinguishable error instead of panicking.

mod error;

pub use error::{RegistryError, TaskError, UnknownKeyError};

use crate::core::{ArgValue, Invocation, ParamType, Signature};
use crate::executor::{self, TaskContext, TaskFuture};
use crate::task::{Task, TaskOptions, PATH};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// The callable stored for a registered function.
///
/// Handlers receive a fresh execution context plus the materialized argument
/// list and report failure through the returned future.
pub type Handler = Arc<dyn Fn(TaskContext, Vec<ArgValue>) -> TaskFuture + Send + Sync>;

/// The shared lookup table behind a [`Registry`] handle.
///
/// Guarded by a reader-writer lock: registrations are expected only during
/// process startup, but a late registration racing a lookup stays safe.
pub(crate) struct Funcs {
    map: RwLock<HashMap<String, Function>>,
}

impl Funcs {
    pub(crate) fn lookup(&self, key: &str) -> Result<Function, UnknownKeyError> {
        let map = self.map.read().expect("registry lock poisoned");
        map.get(key).cloned().ok_or_else(|| {
            let mut known: Vec<String> = map.keys().cloned().collect();
            known.sort();
            UnknownKeyError {
                key: key.to_string(),
                known,
            }
        })
    }
}

struct Inner {
    key: String,
    signature: Signature,
    handler: Handler,
    /// Sticky registration error. Checked on every use; also stamped with a
    /// duplicate marker if the key is later registered again, so stale
    /// handles fail on next use instead of silently running old code.
    err: RwLock<Option<RegistryError>>,
    /// The lookup table this function was registered in. The executor
    /// resolves the key through it at dispatch time.
    registry: Weak<Funcs>,
}

/// A registered delayed function.
///
/// `Function` is a cheap handle: the callable, signature and sticky error
/// are shared, while the dispatch configuration (queue, execution name,
/// delay, retry overrides) lives on the handle so [`Function::queue`],
/// [`Function::with_retry`] and [`Function::once`] return modified copies
/// without mutating the original.
#[derive(Clone)]
pub struct Function {
    inner: Arc<Inner>,
    queue: String,
    name: String,
    delay: Duration,
    retry_count: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("key", &self.inner.key)
            .field("queue", &self.queue)
            .field("name", &self.name)
            .field("delay", &self.delay)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl Function {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// The queue this handle dispatches to; empty means the default queue.
    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    /// The sticky registration error, if any.
    pub fn registration_err(&self) -> Option<RegistryError> {
        self.inner
            .err
            .read()
            .expect("function error lock poisoned")
            .clone()
    }

    pub(crate) fn handler(&self) -> Handler {
        Arc::clone(&self.inner.handler)
    }

    /// Returns a copy of this function with the specified queue.
    pub fn queue(&self, queue: &str) -> Function {
        let mut f = self.clone();
        f.queue = queue.to_string();
        f
    }

    /// Returns a copy of this function with an explicit retry policy.
    ///
    /// A zero `retry_count` or `retry_delay` falls back to the process
    /// defaults at execution time, so retries cannot be disabled this way.
    pub fn with_retry(&self, retry_count: u32, retry_delay: Duration) -> Function {
        let mut f = self.clone();
        f.retry_count = retry_count;
        f.retry_delay = retry_delay;
        f
    }

    /// Creates a task that will invoke this function with `args`.
    ///
    /// Validates and normalizes the arguments, encodes the invocation, and
    /// stamps the handle's dispatch configuration onto the task options.
    /// Builds only; nothing is scheduled.
    ///
    /// # Errors
    /// Fails immediately if the descriptor carries a sticky registration
    /// error, or on arity/type mismatch or encoding failure.
    pub fn task(&self, args: Vec<ArgValue>) -> Result<Task, TaskError> {
        if let Some(err) = self.registration_err() {
            return Err(TaskError::InvalidFunction(err));
        }

        let mut args = args;
        self.inner.signature.validate_args(&mut args)?;

        let payload = Invocation::new(&self.inner.key, args)
            .encode()
            .map_err(TaskError::Encode)?;

        Ok(Task {
            id: Uuid::new_v4(),
            path: PATH.to_string(),
            payload,
            options: TaskOptions {
                queue: self.queue.clone(),
                name: self.name.clone(),
                delay: self.delay,
                retry_count: self.retry_count,
                retry_delay: self.retry_delay,
            },
        })
    }

    /// Invokes this function asynchronously: builds the task and hands it to
    /// the background execution path, returning before the callable runs.
    ///
    /// Only task-construction errors are returned; runtime failures of the
    /// callable are retried and logged, never surfaced here. The caller's
    /// context is accepted for interface compatibility but its cancellation
    /// is not propagated: a dispatched task runs to completion or retry
    /// exhaustion regardless of the request that enqueued it.
    ///
    /// Each call spawns its own background task with no coordination across
    /// calls and no concurrency bound: an unbounded burst of calls produces
    /// an unbounded number of in-flight executions. Must be called from
    /// within a tokio runtime.
    pub fn call(&self, _ctx: &TaskContext, args: Vec<ArgValue>) -> Result<(), TaskError> {
        let task = match self.task(args) {
            Ok(task) => task,
            Err(err) => {
                warn!("delay: {err}");
                return Err(err);
            }
        };
        executor::spawn_task(self.inner.registry.clone(), task);
        Ok(())
    }

    /// Dispatches with a specific execution name and initial delay.
    ///
    /// The name rides along in the execution context for log correlation and
    /// for external front ends that deduplicate by name; the in-process
    /// executor keeps no ledger of executed names and will happily run two
    /// tasks with the same one.
    pub fn once(
        &self,
        ctx: &TaskContext,
        name: &str,
        delay: Duration,
        args: Vec<ArgValue>,
    ) -> Result<(), TaskError> {
        let mut f = self.clone();
        f.name = name.to_string();
        f.delay = delay;
        f.call(ctx, args)
    }
}

/// Process-wide mapping from string keys to registered functions.
///
/// `Registry` is a cheap handle over the shared table; registration is
/// expected to complete during process initialization, before concurrent
/// dispatch begins.
#[derive(Clone)]
pub struct Registry {
    funcs: Arc<Funcs>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            funcs: Arc::new(Funcs {
                map: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Declares a new function under `key`.
    ///
    /// The signature's first parameter must be [`ParamType::Context`];
    /// otherwise the returned descriptor carries a sticky error that
    /// surfaces on first use rather than panicking here.
    ///
    /// Re-registering an existing key replaces the lookup-table entry and
    /// stamps the displaced descriptor with a duplicate error.
    pub fn func<F>(&self, key: &str, signature: Signature, handler: F) -> Function
    where
        F: Fn(TaskContext, Vec<ArgValue>) -> TaskFuture + Send + Sync + 'static,
    {
        let err = match signature.params().first() {
            Some(ParamType::Context) => None,
            _ => Some(RegistryError::FirstArgNotContext),
        };

        let f = Function {
            inner: Arc::new(Inner {
                key: key.to_string(),
                signature,
                handler: Arc::new(handler),
                err: RwLock::new(err),
                registry: Arc::downgrade(&self.funcs),
            }),
            queue: String::new(),
            name: String::new(),
            delay: Duration::ZERO,
            retry_count: 0,
            retry_delay: Duration::ZERO,
        };

        let mut map = self.funcs.map.write().expect("registry lock poisoned");
        if let Some(old) = map.get(key) {
            *old.inner.err.write().expect("function error lock poisoned") =
                Some(RegistryError::DuplicateKey(key.to_string()));
        }
        map.insert(key.to_string(), f.clone());

        f
    }

    /// Retrieves a previously registered function.
    ///
    /// # Errors
    /// Returns [`UnknownKeyError`] listing the registered keys; treat it as
    /// a programming bug.
    pub fn lookup(&self, key: &str) -> Result<Function, UnknownKeyError> {
        self.funcs.lookup(key)
    }

    /// The sorted list of registered keys.
    pub fn names(&self) -> Vec<String> {
        let map = self.funcs.map.read().expect("registry lock poisoned");
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }

    #[cfg(test)]
    pub(crate) fn handle(&self) -> Weak<Funcs> {
        Arc::downgrade(&self.funcs)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref FUNCS: Registry = Registry::new();
}

/// The process-wide default registry.
pub fn global() -> &'static Registry {
    &FUNCS
}

/// Registers `handler` under `key` in the process-wide registry.
///
/// Call at program initialization: the instance that enqueues a task may not
/// be the one that executes its payload, so only functions registered before
/// any dispatch are guaranteed to resolve everywhere.
pub fn func<F>(key: &str, signature: Signature, handler: F) -> Function
where
    F: Fn(TaskContext, Vec<ArgValue>) -> TaskFuture + Send + Sync + 'static,
{
    FUNCS.func(key, signature, handler)
}

/// Retrieves a function from the process-wide registry by its key.
pub fn func_by_key(key: &str) -> Result<Function, UnknownKeyError> {
    FUNCS.lookup(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParamType;

    fn noop_handler(_ctx: TaskContext, _args: Vec<ArgValue>) -> TaskFuture {
        Box::pin(async { Ok(()) })
    }

    fn ctx_sig() -> Signature {
        Signature::new([ParamType::Context, ParamType::Str])
    }

    #[test]
    fn test_register_and_lookup() {
        let reg = Registry::new();
        let f = reg.func("send-email", ctx_sig(), noop_handler);
        assert!(f.registration_err().is_none());
        assert_eq!(f.key(), "send-email");

        let found = reg.lookup("send-email").unwrap();
        assert_eq!(found.key(), "send-email");
    }

    #[test]
    fn test_lookup_unknown_key() {
        let reg = Registry::new();
        reg.func("a", ctx_sig(), noop_handler);
        reg.func("b", ctx_sig(), noop_handler);

        let err = reg.lookup("missing").unwrap_err();
        assert_eq!(err.key, "missing");
        assert_eq!(err.known, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_context_first_enforced() {
        let reg = Registry::new();
        let f = reg.func("bad", Signature::new([ParamType::Str]), noop_handler);
        assert_eq!(
            f.registration_err(),
            Some(RegistryError::FirstArgNotContext)
        );

        // The error surfaces on use, without panicking.
        let err = f.task(vec![ArgValue::from("x")]).unwrap_err();
        assert!(matches!(
            err,
            TaskError::InvalidFunction(RegistryError::FirstArgNotContext)
        ));

        let err = f
            .call(&TaskContext::background(), vec![ArgValue::from("x")])
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidFunction(_)));
    }

    #[test]
    fn test_empty_signature_enforced() {
        let reg = Registry::new();
        let f = reg.func("empty", Signature::new(Vec::<ParamType>::new()), noop_handler);
        assert_eq!(
            f.registration_err(),
            Some(RegistryError::FirstArgNotContext)
        );
    }

    #[test]
    fn test_duplicate_key_marks_old_descriptor() {
        let reg = Registry::new();
        let old = reg.func("dup", ctx_sig(), noop_handler);
        assert!(old.registration_err().is_none());

        let new = reg.func("dup", ctx_sig(), noop_handler);
        assert!(new.registration_err().is_none());
        assert_eq!(
            old.registration_err(),
            Some(RegistryError::DuplicateKey("dup".to_string()))
        );

        // Fresh lookups resolve the replacement, not the displaced one.
        let found = reg.lookup("dup").unwrap();
        assert!(found.registration_err().is_none());

        // The displaced handle now fails on use.
        assert!(matches!(
            old.task(vec![ArgValue::from("x")]),
            Err(TaskError::InvalidFunction(RegistryError::DuplicateKey(_)))
        ));
    }

    #[test]
    fn test_queue_returns_modified_copy() {
        let reg = Registry::new();
        let f = reg.func("queued", ctx_sig(), noop_handler);
        let f2 = f.queue("custom-queue");

        assert_eq!(f2.queue_name(), "custom-queue");
        assert_eq!(f.queue_name(), "");
    }

    #[test]
    fn test_task_builder_stamps_options() {
        let reg = Registry::new();
        let f = reg
            .func("stamped", ctx_sig(), noop_handler)
            .queue("reports")
            .with_retry(2, Duration::from_millis(10));

        let task = f.task(vec![ArgValue::from("order-1")]).unwrap();
        assert_eq!(task.path, PATH);
        assert_eq!(task.options.queue, "reports");
        assert_eq!(task.options.name, "");
        assert_eq!(task.options.delay, Duration::ZERO);
        assert_eq!(task.options.retry_count, 2);
        assert_eq!(task.options.retry_delay, Duration::from_millis(10));

        let inv = Invocation::decode(&task.payload).unwrap();
        assert_eq!(inv.key(), "stamped");
        assert_eq!(inv.args(), &[ArgValue::from("order-1")]);
    }

    #[test]
    fn test_task_arity_errors() {
        let reg = Registry::new();
        let f = reg.func("arity", ctx_sig(), noop_handler);

        assert!(matches!(f.task(vec![]), Err(TaskError::Args(_))));
        assert!(matches!(
            f.task(vec![ArgValue::from("a"), ArgValue::from("b")]),
            Err(TaskError::Args(_))
        ));
    }

    #[test]
    fn test_global_registry() {
        let f = func("registry-test-global", ctx_sig(), noop_handler);
        assert!(f.registration_err().is_none());

        let found = func_by_key("registry-test-global").unwrap();
        assert_eq!(found.key(), "registry-test-global");

        assert!(func_by_key("registry-test-never-registered").is_err());
    }
}
