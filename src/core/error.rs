use thiserror::Error;

/// Foundation error type for the argument codec.
///
/// Uses `thiserror` with `#[source]` annotations so error chains stay
/// intact for debugging.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Serialization failed when encoding a value to bytes.
    #[error("serialization failed")]
    Serialization(#[source] serde_json::Error),

    /// Deserialization failed when decoding bytes to a value.
    #[error("deserialization failed")]
    Deserialization(#[source] serde_json::Error),

    /// An argument value was accessed as a kind it does not hold.
    #[error("value kind mismatch: expected {expected}, got {got}")]
    KindMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// An integer argument does not fit the requested width.
    #[error("integer value {value} out of range for {target}")]
    IntOutOfRange { value: i128, target: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
