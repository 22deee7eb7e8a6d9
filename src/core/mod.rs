//! Foundation types: argument values, signatures, the invocation envelope,
//! and the codec that hides the wire format.

mod error;
mod invocation;
mod serialization;
mod signature;
mod value;

pub use error::{Error, Result};
pub use invocation::Invocation;
pub use serialization::{deserialize_value, serialize_value};
pub use signature::{ArgsError, ParamType, Signature};
pub use value::{ArgKind, ArgValue};
