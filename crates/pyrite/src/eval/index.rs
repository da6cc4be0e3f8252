//! Index and slice evaluation.
//!
//! Negative indices count from the end; out-of-range indexing raises
//! `IndexError`, missing dict keys raise `KeyError` keyed canonically.
//! Slices apply the usual normalization: `None` bounds fill in per step
//! direction, bounds clamp to the sequence, and a negative step walks
//! backwards.

use std::sync::Arc;

use crate::exception::{RunError, RunResult};
use crate::key::canonical_key;
use crate::value::{read_lock, write_lock, SliceValue, Value};

pub(crate) fn get_index(obj: &Value, index: &Value) -> RunResult<Value> {
    if let Value::Slice(slice) = index {
        return get_slice(obj, slice.start, slice.stop, slice.step);
    }
    match obj {
        Value::List(items) => {
            let items = read_lock(items);
            let i = resolve_index(index.as_int()?, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Value::Tuple(items) => {
            let i = resolve_index(index.as_int()?, items.len(), "tuple")?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(index.as_int()?, chars.len(), "string")?;
            Ok(Value::str(chars[i].to_string()))
        }
        Value::Dict(dict) => {
            let key = canonical_key(index)?;
            read_lock(dict)
                .get(&key)
                .cloned()
                .ok_or_else(|| RunError::key_error(index.py_repr()))
        }
        other => Err(RunError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub(crate) fn set_index(obj: &Value, index: &Value, value: Value) -> RunResult<()> {
    match obj {
        Value::List(items) => {
            let mut items = write_lock(items);
            let len = items.len();
            let i = resolve_index(index.as_int()?, len, "list")?;
            items[i] = value;
            Ok(())
        }
        Value::Dict(dict) => {
            write_lock(dict).insert(index.clone(), value)?;
            Ok(())
        }
        other => Err(RunError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Maps a possibly negative index into `0..len`.
fn resolve_index(index: i64, len: usize, kind: &str) -> RunResult<usize> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { index + len_i } else { index };
    if resolved < 0 || resolved >= len_i {
        return Err(RunError::index_error(format!("{kind} index out of range")));
    }
    Ok(usize::try_from(resolved).unwrap_or(0))
}

pub(crate) fn get_slice(obj: &Value, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> RunResult<Value> {
    match obj {
        Value::List(items) => {
            let items = read_lock(items);
            let indices = slice_indices(items.len(), start, stop, step)?;
            Ok(Value::list(indices.map(|i| items[i].clone()).collect()))
        }
        Value::Tuple(items) => {
            let indices = slice_indices(items.len(), start, stop, step)?;
            Ok(Value::tuple(indices.map(|i| items[i].clone()).collect()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let indices = slice_indices(chars.len(), start, stop, step)?;
            Ok(Value::str(indices.map(|i| chars[i]).collect::<String>()))
        }
        other => Err(RunError::type_error(format!(
            "'{}' object is not sliceable",
            other.type_name()
        ))),
    }
}

/// Builds a slice value for storage or later application.
pub(crate) fn make_slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Value {
    Value::Slice(Arc::new(SliceValue { start, stop, step }))
}

/// Normalizes slice bounds into an index iterator, per the usual rules:
/// omitted bounds default by step direction, out-of-range bounds clamp,
/// negative bounds count from the end, zero step is an error.
fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> RunResult<Box<dyn Iterator<Item = usize>>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RunError::value_error("slice step cannot be zero"));
    }
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);

    let clamp = |bound: i64, lo: i64, hi: i64| -> i64 {
        let resolved = if bound < 0 { bound + len_i } else { bound };
        resolved.clamp(lo, hi)
    };

    if step > 0 {
        let start = start.map_or(0, |b| clamp(b, 0, len_i));
        let stop = stop.map_or(len_i, |b| clamp(b, 0, len_i));
        let indices = (start..stop)
            .step_by(usize::try_from(step).unwrap_or(1))
            .map(|i| usize::try_from(i).unwrap_or(0));
        Ok(Box::new(indices))
    } else {
        let start = start.map_or(len_i - 1, |b| clamp(b, -1, len_i - 1));
        let stop = stop.map_or(-1, |b| clamp(b, -1, len_i - 1));
        let step_abs = usize::try_from(-step).unwrap_or(1);
        let mut indices = Vec::new();
        let mut i = start;
        while i > stop {
            indices.push(usize::try_from(i).unwrap_or(0));
            i -= i64::try_from(step_abs).unwrap_or(1);
        }
        Ok(Box::new(indices.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::list((0..5).map(Value::Int).collect())
    }

    #[test]
    fn negative_index_counts_from_end() {
        let list = sample();
        assert!(matches!(get_index(&list, &Value::Int(-1)).unwrap(), Value::Int(4)));
        assert!(get_index(&list, &Value::Int(5)).is_err());
        assert!(get_index(&list, &Value::Int(-6)).is_err());
    }

    #[test]
    fn string_index_yields_one_char() {
        let result = get_index(&Value::str("héllo"), &Value::Int(1)).unwrap();
        assert_eq!(result.py_str(), "é");
    }

    #[test]
    fn slice_defaults_and_clamping() {
        let list = sample();
        assert_eq!(get_slice(&list, Some(1), Some(3), None).unwrap().py_repr(), "[1, 2]");
        assert_eq!(get_slice(&list, None, Some(100), None).unwrap().py_repr(), "[0, 1, 2, 3, 4]");
        assert_eq!(get_slice(&list, Some(-2), None, None).unwrap().py_repr(), "[3, 4]");
    }

    #[test]
    fn negative_step_reverses() {
        let list = sample();
        assert_eq!(get_slice(&list, None, None, Some(-1)).unwrap().py_repr(), "[4, 3, 2, 1, 0]");
        assert_eq!(get_slice(&list, Some(3), Some(0), Some(-2)).unwrap().py_repr(), "[3, 1]");
    }

    #[test]
    fn zero_step_rejected() {
        assert!(get_slice(&sample(), None, None, Some(0)).is_err());
    }

    #[test]
    fn missing_dict_key_is_key_error() {
        let dict = Value::dict(crate::value::Dict::new());
        let err = get_index(&dict, &Value::str("missing")).unwrap_err();
        assert!(matches!(err, RunError::Exc(exc) if exc.exc_type == crate::exception::ExcType::KeyError));
    }
}
