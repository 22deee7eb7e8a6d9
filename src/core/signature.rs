use super::value::{ArgKind, ArgValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Declared type of a single parameter in a registered function's signature.
///
/// The first parameter of every registrable signature must be `Context`;
/// the remaining entries describe the arguments a call site must supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// The execution context slot. Valid only in the first position and
    /// carries no argument value.
    Context,
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Bytes,
    /// Any structured value: structs, maps, sequences.
    Json,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Context => "context",
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::UInt => "uint",
            ParamType::Float => "float",
            ParamType::Str => "string",
            ParamType::Bytes => "bytes",
            ParamType::Json => "json",
        }
    }

    /// Whether an explicit "no value" argument is acceptable for this
    /// parameter. Only structured values and byte slices are nilable;
    /// scalars and strings are not.
    pub fn is_nilable(&self) -> bool {
        matches!(self, ParamType::Bytes | ParamType::Json)
    }

    /// The zero value substituted at invocation time for an argument whose
    /// entry is the "no value" marker.
    pub fn zero_value(&self) -> ArgValue {
        match self {
            ParamType::Context => ArgValue::Null,
            ParamType::Bool => ArgValue::Bool(false),
            ParamType::Int => ArgValue::Int(0),
            ParamType::UInt => ArgValue::UInt(0),
            ParamType::Float => ArgValue::Float(0.0),
            ParamType::Str => ArgValue::Str(String::new()),
            ParamType::Bytes => ArgValue::Bytes(Vec::new()),
            ParamType::Json => ArgValue::Json(Value::Null),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument validation errors, surfaced synchronously at task-build time.
///
/// Positions are counted over the full parameter list, so the context slot
/// is position 0 and the first supplied argument is position 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArgsError {
    #[error("too few arguments to func: {got} < {min}")]
    TooFew { got: usize, min: usize },

    #[error("too many arguments to func: {got} > {max}")]
    TooMany { got: usize, max: usize },

    #[error("argument {index} has wrong type: {got} is not assignable to {expected}")]
    WrongType {
        index: usize,
        expected: ParamType,
        got: ArgKind,
    },

    #[error("argument {index} has wrong type: {expected} is not nilable")]
    NotNilable { index: usize, expected: ParamType },
}

/// The compiled "shape" of a registered function: an ordered list of
/// parameter type descriptors, checked once at registration and used to
/// validate every call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    params: Vec<ParamType>,
    variadic: bool,
}

impl Signature {
    /// A fixed-arity signature. The first entry must be [`ParamType::Context`].
    pub fn new(params: impl Into<Vec<ParamType>>) -> Self {
        Self {
            params: params.into(),
            variadic: false,
        }
    }

    /// A signature whose final entry is the element type of a trailing
    /// variadic parameter.
    pub fn variadic(params: impl Into<Vec<ParamType>>) -> Self {
        Self {
            params: params.into(),
            variadic: true,
        }
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Minimum number of parameters a call must bind, context included.
    pub fn min_args(&self) -> usize {
        self.params.len() - usize::from(self.variadic)
    }

    fn variadic_elem(&self) -> ParamType {
        self.params.last().copied().unwrap_or(ParamType::Json)
    }

    fn declared_at(&self, position: usize) -> ParamType {
        if position < self.min_args() {
            self.params[position]
        } else {
            self.variadic_elem()
        }
    }

    /// Validates the supplied arguments against this signature.
    ///
    /// Arity must match exactly unless the signature is variadic, in which
    /// case any count at or above the fixed parameter count is accepted.
    /// A "no value" marker is accepted only for nilable parameter kinds,
    /// and a structured value that is itself null is normalized to the
    /// marker in place before any further checks.
    pub fn validate_args(&self, args: &mut [ArgValue]) -> Result<(), ArgsError> {
        let n_args = args.len() + 1; // the context slot counts
        let min_args = self.min_args();

        if n_args < min_args {
            return Err(ArgsError::TooFew {
                got: n_args,
                min: min_args,
            });
        }
        if !self.variadic && n_args > min_args {
            return Err(ArgsError::TooMany {
                got: n_args,
                max: min_args,
            });
        }

        for i in 1..n_args {
            let declared = self.declared_at(i);
            let arg = &mut args[i - 1];

            if matches!(arg, ArgValue::Json(Value::Null)) {
                *arg = ArgValue::Null;
            }

            match arg {
                ArgValue::Null => {
                    if !declared.is_nilable() {
                        return Err(ArgsError::NotNilable {
                            index: i,
                            expected: declared,
                        });
                    }
                }
                concrete => {
                    if !assignable(concrete, declared) {
                        return Err(ArgsError::WrongType {
                            index: i,
                            expected: declared,
                            got: concrete.kind(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Builds the concrete argument list for an invocation, substituting the
    /// declared parameter type's zero value for every "no value" marker.
    /// Positions past the fixed parameter count use the variadic element
    /// type, so every nil-producing call site for the same slot invokes with
    /// the same zero value.
    pub fn materialize(&self, args: &[ArgValue]) -> Vec<ArgValue> {
        args.iter()
            .enumerate()
            .map(|(idx, arg)| {
                if arg.is_null() {
                    self.declared_at(idx + 1).zero_value()
                } else {
                    arg.clone()
                }
            })
            .collect()
    }
}

/// Whether a concrete argument value may bind to a declared parameter type.
///
/// Same-kind values always bind. The two integer kinds cross-bind when the
/// value is representable in the target. Every concrete value binds to a
/// `Json` slot, which is the structured analog of an any-typed parameter.
fn assignable(value: &ArgValue, declared: ParamType) -> bool {
    match declared {
        ParamType::Json => !value.is_null(),
        ParamType::Bool => matches!(value, ArgValue::Bool(_)),
        ParamType::Int => match value {
            ArgValue::Int(_) => true,
            ArgValue::UInt(v) => i64::try_from(*v).is_ok(),
            _ => false,
        },
        ParamType::UInt => match value {
            ArgValue::UInt(_) => true,
            ArgValue::Int(v) => *v >= 0,
            _ => false,
        },
        ParamType::Float => matches!(value, ArgValue::Float(_)),
        ParamType::Str => matches!(value, ArgValue::Str(_)),
        ParamType::Bytes => matches!(value, ArgValue::Bytes(_)),
        ParamType::Context => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(params: impl Into<Vec<ParamType>>) -> Signature {
        Signature::new(params)
    }

    #[test]
    fn test_exact_arity() {
        let s = sig([ParamType::Context, ParamType::Str]);

        let mut ok = vec![ArgValue::from("hello")];
        assert!(s.validate_args(&mut ok).is_ok());

        let mut too_few: Vec<ArgValue> = vec![];
        assert_eq!(
            s.validate_args(&mut too_few),
            Err(ArgsError::TooFew { got: 1, min: 2 })
        );

        let mut too_many = vec![ArgValue::from("a"), ArgValue::from("b")];
        assert_eq!(
            s.validate_args(&mut too_many),
            Err(ArgsError::TooMany { got: 3, max: 2 })
        );
    }

    #[test]
    fn test_variadic_arity() {
        let s = Signature::variadic([ParamType::Context, ParamType::Str, ParamType::Str]);

        let mut none: Vec<ArgValue> = vec![ArgValue::from("fixed")];
        assert!(s.validate_args(&mut none).is_ok());

        let mut many = vec![
            ArgValue::from("fixed"),
            ArgValue::from("a"),
            ArgValue::from("b"),
            ArgValue::from("c"),
        ];
        assert!(s.validate_args(&mut many).is_ok());

        let mut too_few: Vec<ArgValue> = vec![];
        assert_eq!(
            s.validate_args(&mut too_few),
            Err(ArgsError::TooFew { got: 1, min: 2 })
        );

        let mut wrong_elem = vec![ArgValue::from("fixed"), ArgValue::Int(5)];
        assert_eq!(
            s.validate_args(&mut wrong_elem),
            Err(ArgsError::WrongType {
                index: 2,
                expected: ParamType::Str,
                got: ArgKind::Int,
            })
        );
    }

    #[test]
    fn test_type_mismatch() {
        let s = sig([ParamType::Context, ParamType::Bool]);
        let mut args = vec![ArgValue::from("not a bool")];
        assert_eq!(
            s.validate_args(&mut args),
            Err(ArgsError::WrongType {
                index: 1,
                expected: ParamType::Bool,
                got: ArgKind::Str,
            })
        );
    }

    #[test]
    fn test_integer_assignability() {
        let s = sig([ParamType::Context, ParamType::UInt]);

        let mut ok = vec![ArgValue::Int(5)];
        assert!(s.validate_args(&mut ok).is_ok());

        let mut negative = vec![ArgValue::Int(-1)];
        assert!(matches!(
            s.validate_args(&mut negative),
            Err(ArgsError::WrongType { .. })
        ));
    }

    #[test]
    fn test_anything_binds_to_json() {
        let s = sig([ParamType::Context, ParamType::Json]);
        for value in [
            ArgValue::Bool(true),
            ArgValue::Int(-3),
            ArgValue::from("s"),
            ArgValue::Bytes(vec![1]),
            ArgValue::Json(Value::from(vec![1, 2])),
        ] {
            let mut args = vec![value];
            assert!(s.validate_args(&mut args).is_ok());
        }
    }

    #[test]
    fn test_nil_handling() {
        let nilable = sig([ParamType::Context, ParamType::Json]);
        let mut args = vec![ArgValue::Null];
        assert!(nilable.validate_args(&mut args).is_ok());

        let scalar = sig([ParamType::Context, ParamType::Str]);
        let mut args = vec![ArgValue::Null];
        assert_eq!(
            scalar.validate_args(&mut args),
            Err(ArgsError::NotNilable {
                index: 1,
                expected: ParamType::Str,
            })
        );
    }

    #[test]
    fn test_typed_nil_normalized_in_place() {
        let s = sig([ParamType::Context, ParamType::Json]);
        let mut args = vec![ArgValue::Json(Value::Null)];
        assert!(s.validate_args(&mut args).is_ok());
        assert_eq!(args[0], ArgValue::Null);
    }

    #[test]
    fn test_materialize_zero_values() {
        let s = sig([ParamType::Context, ParamType::Int, ParamType::Json]);
        let out = s.materialize(&[ArgValue::Null, ArgValue::Null]);
        assert_eq!(out, vec![ArgValue::Int(0), ArgValue::Json(Value::Null)]);

        let out = s.materialize(&[ArgValue::Int(7), ArgValue::from("kept")]);
        assert_eq!(out, vec![ArgValue::Int(7), ArgValue::from("kept")]);
    }

    #[test]
    fn test_materialize_variadic_slots() {
        let s = Signature::variadic([ParamType::Context, ParamType::Bytes]);
        let out = s.materialize(&[ArgValue::Null, ArgValue::Null]);
        assert_eq!(
            out,
            vec![ArgValue::Bytes(Vec::new()), ArgValue::Bytes(Vec::new())]
        );
    }
}
