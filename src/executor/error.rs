use crate::core;
use crate::registry::UnknownKeyError;
use thiserror::Error;

/// A boxed error that can be sent across threads.
///
/// This is the standard error type of the async Rust ecosystem; any error
/// implementing `std::error::Error` converts into it automatically.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime dispatch errors.
///
/// On the background path these are logged and never reach the enqueuing
/// caller. [`crate::executor::run_payload`] returns them so a bridging
/// front end can map each class: `Decode` and `UnknownKey` are structurally
/// unrecoverable (drop the task, never retry), `Failed` means the callable
/// itself failed and the task should be retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The payload is malformed; retrying cannot help.
    #[error("failed decoding task payload")]
    Decode(#[source] core::Error),

    /// The invocation names a key no function was registered under.
    #[error(transparent)]
    UnknownKey(#[from] UnknownKeyError),

    /// The callable returned an error.
    #[error("delayed function failed")]
    Failed(#[source] BoxError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
