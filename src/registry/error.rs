use crate::core::ArgsError;
use thiserror::Error;

/// Sticky registration errors.
///
/// Registration never panics: a malformed registration stores its error on
/// the descriptor, and every later use of that descriptor surfaces it. This
/// keeps registration safe to run during process init, before other
/// init-time dependencies are ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The declared signature does not begin with a context parameter.
    #[error("first argument must be a task context")]
    FirstArgNotContext,

    /// The key was registered again later; this descriptor is the displaced
    /// one and must not be used.
    #[error("multiple functions registered for {0}")]
    DuplicateKey(String),
}

/// Lookup failure: the key was never registered.
///
/// Callers are expected to treat this as a programming bug, not a
/// recoverable runtime condition, since keys are fixed at process init.
#[derive(Debug, Clone, Error)]
#[error("no func with key {key:?} found (registered: {known:?})")]
pub struct UnknownKeyError {
    pub key: String,
    pub known: Vec<String>,
}

/// Build-time task errors, returned synchronously from `task`/`call`/`once`.
///
/// These are the only errors the enqueuing caller can observe; everything
/// that goes wrong after dispatch is logged, never propagated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskError {
    /// The descriptor carries a sticky registration error.
    #[error("func is invalid")]
    InvalidFunction(#[source] RegistryError),

    /// Arity or type validation failed.
    #[error(transparent)]
    Args(#[from] ArgsError),

    /// The invocation could not be encoded.
    #[error("encoding failed")]
    Encode(#[source] crate::core::Error),
}
