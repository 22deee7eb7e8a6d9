use uuid::Uuid;

/// Execution context handed to a delayed function.
///
/// The executor creates a fresh top-level context for every task: the
/// caller's context is deliberately not inherited, so a dispatched task
/// survives the request that enqueued it. Only the execution name and the
/// task id ride along.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    task_name: Option<String>,
    task_id: Option<Uuid>,
}

impl TaskContext {
    /// A fresh top-level context with no task metadata.
    pub fn background() -> Self {
        Self::default()
    }

    pub(crate) fn for_task(task_name: Option<String>, task_id: Uuid) -> Self {
        Self {
            task_name,
            task_id: Some(task_id),
        }
    }

    /// The execution name stamped via `once`, if any.
    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    /// The id of the task being executed, if running inside the executor.
    pub fn task_id(&self) -> Option<Uuid> {
        self.task_id
    }
}
