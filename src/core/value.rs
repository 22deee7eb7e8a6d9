use super::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single task argument in transportable form.
///
/// Arguments cross the task boundary as an explicit tagged value rather than
/// a dynamically typed one, so the dispatcher never needs runtime type
/// introspection to rebuild a call. `Null` is the explicit "no value" marker:
/// an absent value for a nilable parameter is encoded as `Null`, never as a
/// typed zero, because a generic encoder would otherwise lose the fact that
/// the argument was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    /// Explicit "no value" marker for nilable parameter kinds.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Any structured value: structs, maps, sequences.
    Json(Value),
}

/// Names the variant an [`ArgValue`] holds, for validation and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Bytes,
    Json,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::Null => "null",
            ArgKind::Bool => "bool",
            ArgKind::Int => "int",
            ArgKind::UInt => "uint",
            ArgKind::Float => "float",
            ArgKind::Str => "string",
            ArgKind::Bytes => "bytes",
            ArgKind::Json => "json",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ArgValue {
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Null => ArgKind::Null,
            ArgValue::Bool(_) => ArgKind::Bool,
            ArgValue::Int(_) => ArgKind::Int,
            ArgValue::UInt(_) => ArgKind::UInt,
            ArgValue::Float(_) => ArgKind::Float,
            ArgValue::Str(_) => ArgKind::Str,
            ArgValue::Bytes(_) => ArgKind::Bytes,
            ArgValue::Json(_) => ArgKind::Json,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    /// Encodes any serializable value as a structured argument.
    ///
    /// A value that serializes to JSON null (e.g. `None`) is normalized to
    /// the explicit `Null` marker at construction time.
    pub fn json<T: Serialize>(value: &T) -> Result<ArgValue> {
        match serde_json::to_value(value).map_err(Error::Serialization)? {
            Value::Null => Ok(ArgValue::Null),
            v => Ok(ArgValue::Json(v)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            ArgValue::Bool(v) => Ok(*v),
            other => Err(Error::KindMismatch {
                expected: "bool",
                got: other.kind().as_str(),
            }),
        }
    }

    /// Returns the integer value. A `UInt` is accepted when it fits in i64,
    /// mirroring assignability between the two integer kinds.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            ArgValue::Int(v) => Ok(*v),
            ArgValue::UInt(v) => i64::try_from(*v).map_err(|_| Error::IntOutOfRange {
                value: *v as i128,
                target: "int",
            }),
            other => Err(Error::KindMismatch {
                expected: "int",
                got: other.kind().as_str(),
            }),
        }
    }

    /// Returns the unsigned integer value. An `Int` is accepted when it is
    /// non-negative.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            ArgValue::UInt(v) => Ok(*v),
            ArgValue::Int(v) => u64::try_from(*v).map_err(|_| Error::IntOutOfRange {
                value: *v as i128,
                target: "uint",
            }),
            other => Err(Error::KindMismatch {
                expected: "uint",
                got: other.kind().as_str(),
            }),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            ArgValue::Float(v) => Ok(*v),
            other => Err(Error::KindMismatch {
                expected: "float",
                got: other.kind().as_str(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            ArgValue::Str(v) => Ok(v),
            other => Err(Error::KindMismatch {
                expected: "string",
                got: other.kind().as_str(),
            }),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            ArgValue::Bytes(v) => Ok(v),
            other => Err(Error::KindMismatch {
                expected: "bytes",
                got: other.kind().as_str(),
            }),
        }
    }

    /// Converts the argument to a structured value.
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Null => Value::Null,
            ArgValue::Bool(v) => Value::Bool(*v),
            ArgValue::Int(v) => Value::from(*v),
            ArgValue::UInt(v) => Value::from(*v),
            ArgValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ArgValue::Str(v) => Value::String(v.clone()),
            ArgValue::Bytes(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
            ArgValue::Json(v) => v.clone(),
        }
    }

    /// Decodes the argument into a concrete type.
    ///
    /// # Errors
    /// Returns `Error::Deserialization` if the value does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(Error::Deserialization)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::UInt(v as u64)
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        ArgValue::UInt(v)
    }
}

impl From<usize> for ArgValue {
    fn from(v: usize) -> Self {
        ArgValue::UInt(v as u64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(v: Vec<u8>) -> Self {
        ArgValue::Bytes(v)
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => ArgValue::Null,
            v => ArgValue::Json(v),
        }
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => ArgValue::Null,
        }
    }
}

/// Builds a `Vec<ArgValue>` from heterogeneous values.
///
/// # Example
///
/// ```
/// use delayq::args;
///
/// let args = args!["user-42", 7u64, true];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => { Vec::<$crate::ArgValue>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::ArgValue::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_kind_names() {
        assert_eq!(ArgValue::Null.kind().as_str(), "null");
        assert_eq!(ArgValue::Int(1).kind().as_str(), "int");
        assert_eq!(ArgValue::Str("x".into()).kind().as_str(), "string");
        assert_eq!(ArgValue::Json(Value::Bool(true)).kind().as_str(), "json");
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(ArgValue::from(5i32), ArgValue::Int(5));
        assert_eq!(ArgValue::from(5u32), ArgValue::UInt(5));
        assert_eq!(ArgValue::from(5usize), ArgValue::UInt(5));
        assert_eq!(ArgValue::from("hi"), ArgValue::Str("hi".to_string()));
        assert_eq!(ArgValue::from(Some(3i64)), ArgValue::Int(3));
        assert_eq!(ArgValue::from(None::<i64>), ArgValue::Null);
        assert_eq!(ArgValue::from(Value::Null), ArgValue::Null);
    }

    #[test]
    fn test_json_normalizes_null() {
        let absent = ArgValue::json(&None::<String>).unwrap();
        assert_eq!(absent, ArgValue::Null);

        let present = ArgValue::json(&vec![1, 2, 3]).unwrap();
        assert!(matches!(present, ArgValue::Json(Value::Array(_))));
    }

    #[test]
    fn test_accessor_kind_mismatch() {
        let v = ArgValue::Str("hello".into());
        assert!(matches!(v.as_i64(), Err(Error::KindMismatch { .. })));
        assert!(matches!(v.as_bool(), Err(Error::KindMismatch { .. })));
        assert_eq!(v.as_str().unwrap(), "hello");
    }

    #[test]
    fn test_integer_cross_width() {
        assert_eq!(ArgValue::UInt(5).as_i64().unwrap(), 5);
        assert_eq!(ArgValue::Int(5).as_u64().unwrap(), 5);
        assert!(matches!(
            ArgValue::Int(-1).as_u64(),
            Err(Error::IntOutOfRange { .. })
        ));
        assert!(matches!(
            ArgValue::UInt(u64::MAX).as_i64(),
            Err(Error::IntOutOfRange { .. })
        ));
    }

    #[test]
    fn test_decode_struct() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Payment {
            amount: i64,
            currency: String,
        }

        let payment = Payment {
            amount: 1299,
            currency: "usd".to_string(),
        };
        let arg = ArgValue::json(&payment).unwrap();
        let decoded: Payment = arg.decode().unwrap();
        assert_eq!(decoded, payment);
    }

    #[test]
    fn test_args_macro() {
        let args = args!["user-42", 7u64, true];
        assert_eq!(
            args,
            vec![
                ArgValue::Str("user-42".to_string()),
                ArgValue::UInt(7),
                ArgValue::Bool(true),
            ]
        );
        assert!(args![].is_empty());
    }
}
