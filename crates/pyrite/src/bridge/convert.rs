//! Typed conversions between script values and host types.
//!
//! [`FromScript`]/[`IntoScript`] implement the bridge's conversion table:
//! script integers convert into any fixed-width host integer (or promote to
//! float), floats into floats, strings into strings, booleans into booleans,
//! lists into `Vec<T>`, dicts with string keys into maps, and `Value` itself
//! stands in for "any". Conversion failures produce the standardized
//! `type error: expected X, got Y` message on the recoverable error channel.
//!
//! The module also carries the host-facing JSON mapping (`Value` ⇄
//! `serde_json::Value`) used for hand-off and snapshots of results.

use std::collections::HashMap;
use std::sync::Arc;

use crate::exception::OpError;
use crate::value::{Dict, Value};

/// Conversion from a host type into a script value.
pub trait IntoScript {
    fn into_script(self) -> Value;
}

/// Conversion from a script value into a host type.
pub trait FromScript: Sized {
    /// Type name used in the standardized conversion error message.
    const EXPECTED: &'static str;

    fn from_script(value: Value) -> Result<Self, OpError>;
}

impl IntoScript for Value {
    fn into_script(self) -> Value {
        self
    }
}

impl FromScript for Value {
    const EXPECTED: &'static str = "any";

    fn from_script(value: Value) -> Result<Self, OpError> {
        Ok(value)
    }
}

impl IntoScript for () {
    fn into_script(self) -> Value {
        Value::None
    }
}

impl IntoScript for bool {
    fn into_script(self) -> Value {
        Value::Bool(self)
    }
}

impl FromScript for bool {
    const EXPECTED: &'static str = "bool";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

macro_rules! impl_int_conversions {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }

            impl FromScript for $ty {
                const EXPECTED: &'static str = "int";

                fn from_script(value: Value) -> Result<Self, OpError> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(n)
                            .map_err(|_| OpError::type_error(Self::EXPECTED, "out-of-range int")),
                        other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
                    }
                }
            }
        )*
    };
}

impl_int_conversions!(i8, i16, i32, u8, u16, u32);

impl IntoScript for i64 {
    fn into_script(self) -> Value {
        Value::Int(self)
    }
}

impl FromScript for i64 {
    const EXPECTED: &'static str = "int";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Int(n) => Ok(n),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

impl IntoScript for usize {
    fn into_script(self) -> Value {
        Value::Int(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

impl FromScript for usize {
    const EXPECTED: &'static str = "int";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Int(n) => Self::try_from(n).map_err(|_| OpError::type_error(Self::EXPECTED, "negative int")),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

impl IntoScript for f64 {
    fn into_script(self) -> Value {
        Value::Float(self)
    }
}

impl FromScript for f64 {
    const EXPECTED: &'static str = "float";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Float(f) => Ok(f),
            // Script ints promote to host floats.
            Value::Int(n) => Ok(n as f64),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

impl IntoScript for f32 {
    fn into_script(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromScript for f32 {
    const EXPECTED: &'static str = "float";

    fn from_script(value: Value) -> Result<Self, OpError> {
        f64::from_script(value).map(|f| f as Self)
    }
}

impl IntoScript for String {
    fn into_script(self) -> Value {
        Value::str(self)
    }
}

impl IntoScript for &str {
    fn into_script(self) -> Value {
        Value::str(self)
    }
}

impl IntoScript for Arc<str> {
    fn into_script(self) -> Value {
        Value::Str(self)
    }
}

impl FromScript for String {
    const EXPECTED: &'static str = "str";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

impl FromScript for Arc<str> {
    const EXPECTED: &'static str = "str";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

impl<T: IntoScript> IntoScript for Option<T> {
    fn into_script(self) -> Value {
        match self {
            Some(v) => v.into_script(),
            None => Value::None,
        }
    }
}

impl<T: FromScript> FromScript for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::None => Ok(None),
            other => T::from_script(other).map(Some),
        }
    }
}

impl<T: IntoScript> IntoScript for Vec<T> {
    fn into_script(self) -> Value {
        Value::list(self.into_iter().map(IntoScript::into_script).collect())
    }
}

impl<T: FromScript> FromScript for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_script(value: Value) -> Result<Self, OpError> {
        let items: Vec<Value> = match value {
            Value::List(items) => crate::value::read_lock(&items).clone(),
            Value::Tuple(items) => items.to_vec(),
            other => return Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        };
        items.into_iter().map(T::from_script).collect()
    }
}

impl<T: IntoScript> IntoScript for HashMap<String, T> {
    fn into_script(self) -> Value {
        let mut dict = Dict::new();
        for (key, value) in self {
            // String keys are always hashable.
            let _ = dict.insert(Value::str(key), value.into_script());
        }
        Value::dict(dict)
    }
}

impl<T: FromScript> FromScript for HashMap<String, T> {
    const EXPECTED: &'static str = "dict";

    fn from_script(value: Value) -> Result<Self, OpError> {
        match value {
            Value::Dict(dict) => {
                let dict = crate::value::read_lock(&dict);
                let mut map = Self::with_capacity(dict.len());
                for (key, entry) in dict.iter() {
                    let Value::Str(key) = key else {
                        return Err(OpError::type_error("dict with str keys", key.type_name()));
                    };
                    map.insert(key.to_string(), T::from_script(entry.clone())?);
                }
                Ok(map)
            }
            other => Err(OpError::type_error(Self::EXPECTED, other.type_name())),
        }
    }
}

/// Converts a value into its natural JSON form. Tuples and sets serialize
/// as arrays; callables and other opaque kinds are rejected.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, OpError> {
    Ok(match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| OpError::new("cannot serialize non-finite float to JSON"))?,
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => serde_json::Value::Array(
            crate::value::read_lock(items)
                .iter()
                .map(value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect::<Result<_, _>>()?),
        Value::Set(set) => serde_json::Value::Array(
            crate::value::read_lock(set)
                .iter()
                .map(value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Dict(dict) => {
            let dict = crate::value::read_lock(dict);
            let mut map = serde_json::Map::with_capacity(dict.len());
            for (key, entry) in dict.iter() {
                map.insert(key.py_str(), value_to_json(entry)?);
            }
            serde_json::Value::Object(map)
        }
        other => {
            return Err(OpError::new(format!(
                "cannot serialize {} to JSON",
                other.type_name()
            )));
        }
    })
}

/// Converts JSON into the natural script value.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map_or_else(|| Value::Float(n.as_f64().unwrap_or(f64::NAN)), Value::Int),
        serde_json::Value::String(s) => Value::str(s.as_str()),
        serde_json::Value::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut dict = Dict::new();
            for (key, value) in map {
                let _ = dict.insert(Value::str(key.as_str()), json_to_value(value));
            }
            Value::dict(dict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_narrowing_checks_range() {
        assert_eq!(i32::from_script(Value::Int(7)).unwrap(), 7);
        let err = u8::from_script(Value::Int(300)).unwrap_err();
        assert!(err.message.contains("type error"));
    }

    #[test]
    fn int_promotes_to_float() {
        assert_eq!(f64::from_script(Value::Int(2)).unwrap(), 2.0);
    }

    #[test]
    fn string_argument_where_int_expected() {
        let err = i64::from_script(Value::str("5")).unwrap_err();
        assert_eq!(err.message, "type error: expected int, got str");
    }

    #[test]
    fn vec_round_trip() {
        let value = vec![1i64, 2, 3].into_script();
        assert_eq!(Vec::<i64>::from_script(value).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn json_round_trip() {
        let mut dict = Dict::new();
        dict.insert(Value::str("a"), Value::Int(1)).unwrap();
        dict.insert(Value::str("b"), Value::list(vec![Value::Bool(true), Value::None]))
            .unwrap();
        let value = Value::dict(dict);
        let json = value_to_json(&value).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1, "b": [true, null]}));
        let back = json_to_value(&json);
        assert!(back.py_eq(&value));
    }
}
