//! Named task registry.
//!
//! Tasks are registered under a human-meaningful name and dispatched by that
//! name. A name may carry several tasks; [`run`] dispatches them all. Each
//! entry wraps a delayed function registered in the process-wide registry,
//! with duplicate names getting numbered keys so every registration keeps a
//! distinct key.

use crate::core::{ArgValue, Signature};
use crate::executor::{TaskContext, TaskFuture};
use crate::registry::{self, Function, TaskError};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// A named task wrapping a registered delayed function.
#[derive(Clone)]
pub struct NamedTask {
    pub name: String,
    /// 1-based position among the tasks registered under this name.
    pub number: usize,
    pub function: Function,
}

/// Errors from dispatching tasks by name.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// No task was registered under this name; a programming bug, since
    /// names are fixed at process init.
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// Building one of the underlying tasks failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Vec<NamedTask>>> = RwLock::new(HashMap::new());
}

/// Declares a named task backed by a delayed function in the process-wide
/// registry.
///
/// The first registration under `name` uses `name` as the function key;
/// later ones get numbered keys (`name-2`, `name-3`, ...). Call at program
/// initialization, like [`registry::func`].
pub fn func<F>(name: &str, signature: Signature, handler: F) -> Function
where
    F: Fn(TaskContext, Vec<ArgValue>) -> TaskFuture + Send + Sync + 'static,
{
    let mut reg = REGISTRY.write().expect("task registry lock poisoned");
    let entry = reg.entry(name.to_string()).or_default();
    let number = entry.len() + 1;

    let key = if number > 1 {
        format!("{name}-{number}")
    } else {
        name.to_string()
    };

    let function = registry::func(&key, signature, handler);
    entry.push(NamedTask {
        name: name.to_string(),
        number,
        function: function.clone(),
    });

    function
}

/// Dispatches every task registered under `name`.
///
/// Fire-and-forget: each task goes through [`Function::call`] with a clone
/// of `args`, so only build-time errors are returned.
pub fn run(ctx: &TaskContext, name: &str, args: Vec<ArgValue>) -> Result<(), RunError> {
    let tasks = {
        let reg = REGISTRY.read().expect("task registry lock poisoned");
        reg.get(name)
            .cloned()
            .ok_or_else(|| RunError::UnknownTask(name.to_string()))?
    };

    for task in &tasks {
        task.function.call(ctx, args.clone())?;
    }

    Ok(())
}

/// Removes the tasks registered under `name`.
///
/// The underlying delayed functions stay in the function registry, which
/// has no unregister operation.
pub fn unregister(name: &str) {
    REGISTRY
        .write()
        .expect("task registry lock poisoned")
        .remove(name);
}

/// The sorted list of registered task names.
pub fn names() -> Vec<String> {
    let reg = REGISTRY.read().expect("task registry lock poisoned");
    let mut names: Vec<String> = reg.keys().cloned().collect();
    names.sort();
    names
}

/// The tasks registered under `name`, if any.
pub fn get(name: &str) -> Option<Vec<NamedTask>> {
    REGISTRY
        .read()
        .expect("task registry lock poisoned")
        .get(name)
        .cloned()
}
