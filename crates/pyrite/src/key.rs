//! Canonical dict/set keys.
//!
//! Values the language considers hash-equal must share one key: `1`, `1.0`
//! and `True` all index the same slot, strings key by their bytes, `None`
//! keys uniquely, and tuples key structurally over their elements. Mutable
//! containers are unhashable and raise `TypeError` when used as keys.

use std::sync::Arc;

use crate::exception::{RunError, RunResult};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Key {
    None,
    Int(i64),
    /// Non-integral floats key by their bit pattern (with `-0.0` folded into
    /// `0.0` via the integral path, and NaN collapsing to one slot).
    FloatBits(u64),
    Str(Arc<str>),
    Tuple(Box<[Key]>),
    /// Exception types are hashable singletons.
    ExcType(crate::exception::ExcType),
}

/// Computes the canonical key for a value, or a `TypeError` for unhashable
/// kinds.
pub(crate) fn canonical_key(value: &Value) -> RunResult<Key> {
    match value {
        Value::None => Ok(Key::None),
        Value::Bool(b) => Ok(Key::Int(i64::from(*b))),
        Value::Int(n) => Ok(Key::Int(*n)),
        Value::Float(f) => {
            // An integral float shares its key with the equal int.
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Ok(Key::Int(*f as i64))
            } else if f.is_nan() {
                Ok(Key::FloatBits(f64::NAN.to_bits()))
            } else {
                Ok(Key::FloatBits(f.to_bits()))
            }
        }
        Value::Str(s) => Ok(Key::Str(Arc::clone(s))),
        Value::Tuple(items) => {
            let keys = items.iter().map(canonical_key).collect::<RunResult<Vec<_>>>()?;
            Ok(Key::Tuple(keys.into_boxed_slice()))
        }
        Value::ExcClass(exc_type) => Ok(Key::ExcType(*exc_type)),
        other => Err(RunError::type_error(format!(
            "unhashable type: '{}'",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kinds_share_a_key() {
        let one = canonical_key(&Value::Int(1)).unwrap();
        assert_eq!(canonical_key(&Value::Bool(true)).unwrap(), one);
        assert_eq!(canonical_key(&Value::Float(1.0)).unwrap(), one);
        assert_ne!(canonical_key(&Value::Float(1.5)).unwrap(), one);
    }

    #[test]
    fn negative_zero_folds_into_zero() {
        assert_eq!(
            canonical_key(&Value::Float(-0.0)).unwrap(),
            canonical_key(&Value::Int(0)).unwrap()
        );
    }

    #[test]
    fn tuples_key_structurally() {
        let a = Value::tuple(vec![Value::Int(1), Value::str("x")]);
        let b = Value::tuple(vec![Value::Bool(true), Value::str("x")]);
        assert_eq!(canonical_key(&a).unwrap(), canonical_key(&b).unwrap());
    }

    #[test]
    fn containers_are_unhashable() {
        assert!(canonical_key(&Value::list(vec![])).is_err());
        assert!(canonical_key(&Value::dict(crate::value::Dict::new())).is_err());
    }
}
