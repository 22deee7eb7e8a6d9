//! The transportable task envelope.

use std::time::Duration;
use uuid::Uuid;

/// The HTTP path for invocations.
///
/// Kept for compatibility with a managed task-queue front end that POSTs
/// previously built payloads for remote execution; the in-process executor
/// never consults it.
pub const PATH: &str = "/_/queue/delay";

/// Default number of retries for failed tasks.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default delay between retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Execution options stamped onto a task by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskOptions {
    /// Target queue; empty means the default queue.
    pub queue: String,
    /// Execution name; empty means auto-generated.
    pub name: String,
    /// Wait before the first attempt.
    pub delay: Duration,
    /// Retries after a failed attempt. Zero means [`DEFAULT_RETRY_COUNT`]
    /// applies at execution time.
    pub retry_count: u32,
    /// Fixed wait between attempts. Zero means [`DEFAULT_RETRY_DELAY`]
    /// applies at execution time.
    pub retry_delay: Duration,
}

/// A deferred task: the key and encoded arguments of one invocation, plus
/// its execution options.
///
/// Built once by [`crate::Function::task`], consumed exactly once by the
/// executor, never persisted. Users should not modify the `path` or
/// `payload` fields.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub path: String,
    pub payload: Vec<u8>,
    pub options: TaskOptions,
}
