use super::error::Result;
use super::serialization::{deserialize_value, serialize_value};
use super::value::ArgValue;
use serde::{Deserialize, Serialize};

/// The decoded unit of work: which registered function to run, with which
/// arguments.
///
/// An invocation is built by the task builder, carried inside a task payload,
/// and decoded again by the executor. It never outlives the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    key: String,
    args: Vec<ArgValue>,
}

impl Invocation {
    pub fn new(key: impl Into<String>, args: Vec<ArgValue>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    pub fn into_args(self) -> Vec<ArgValue> {
        self.args
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serialize_value(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        deserialize_value(bytes)
    }
}
