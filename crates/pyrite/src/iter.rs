//! Iterator support for `for` loops, `iter()` and `next()`.
//!
//! Iterators are single-pass. Sequence kinds snapshot their elements at
//! creation time; dict iteration snapshots the keys and skips any key that
//! has been deleted by the time it comes up, so mutating a dict while
//! looping over it cannot invalidate the iterator.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::exception::{RunError, RunResult};
use crate::key::Key;
use crate::value::{read_lock, Dict, Value};

#[derive(Debug)]
pub struct ScriptIter {
    state: Mutex<IterState>,
}

#[derive(Debug)]
enum IterState {
    Seq {
        items: Vec<Value>,
        index: usize,
    },
    /// Characters of a string at code-point granularity; the byte offset
    /// makes each step O(1).
    Chars {
        s: Arc<str>,
        byte_pos: usize,
    },
    Range {
        next: i64,
        stop: i64,
        step: i64,
    },
    DictKeys {
        dict: Arc<RwLock<Dict>>,
        keys: Vec<(Key, Value)>,
        index: usize,
    },
}

impl ScriptIter {
    pub(crate) fn seq(items: Vec<Value>) -> Self {
        Self {
            state: Mutex::new(IterState::Seq { items, index: 0 }),
        }
    }

    pub(crate) fn range(start: i64, stop: i64, step: i64) -> Self {
        Self {
            state: Mutex::new(IterState::Range {
                next: start,
                stop,
                step,
            }),
        }
    }

    fn chars(s: Arc<str>) -> Self {
        Self {
            state: Mutex::new(IterState::Chars { s, byte_pos: 0 }),
        }
    }

    fn dict_keys(dict: Arc<RwLock<Dict>>) -> Self {
        let keys = read_lock(&dict).key_snapshot();
        Self {
            state: Mutex::new(IterState::DictKeys { dict, keys, index: 0 }),
        }
    }

    /// Obtains an iterator value for `value`, per the iteration protocol:
    /// sequences and sets snapshot, strings iterate characters, dicts
    /// iterate keys, iterators pass through unchanged.
    pub(crate) fn for_value(value: &Value) -> RunResult<Value> {
        match value {
            Value::Iterator(_) => Ok(value.clone()),
            Value::List(items) => Ok(Value::iterator(Self::seq(read_lock(items).clone()))),
            Value::Tuple(items) => Ok(Value::iterator(Self::seq(items.to_vec()))),
            Value::Set(set) => Ok(Value::iterator(Self::seq(read_lock(set).iter().cloned().collect()))),
            Value::Str(s) => Ok(Value::iterator(Self::chars(Arc::clone(s)))),
            Value::Dict(dict) => Ok(Value::iterator(Self::dict_keys(Arc::clone(dict)))),
            Value::DictView(view) => Ok(Value::iterator(Self::seq(view.snapshot()))),
            other => Err(RunError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Advances, returning `None` when exhausted.
    pub(crate) fn advance(&self) -> Option<Value> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *state {
            IterState::Seq { items, index } => {
                let value = items.get(*index).cloned();
                if value.is_some() {
                    *index += 1;
                }
                value
            }
            IterState::Chars { s, byte_pos } => {
                let c = s[*byte_pos..].chars().next()?;
                *byte_pos += c.len_utf8();
                Some(Value::str(c.to_string()))
            }
            IterState::Range { next, stop, step } => {
                let exhausted = if *step >= 0 { *next >= *stop } else { *next <= *stop };
                if exhausted {
                    return None;
                }
                let value = *next;
                *next += *step;
                Some(Value::Int(value))
            }
            IterState::DictKeys { dict, keys, index } => {
                // Skip keys deleted since the snapshot was taken.
                while let Some((canonical, original)) = keys.get(*index) {
                    *index += 1;
                    if read_lock(dict).contains(canonical) {
                        return Some(original.clone());
                    }
                }
                None
            }
        }
    }

    /// Collects the remaining items, as used by `list()`/`tuple()`/`sorted()`.
    pub(crate) fn collect(&self) -> Vec<Value> {
        let mut items = Vec::new();
        while let Some(value) = self.advance() {
            items.push(value);
        }
        items
    }
}

/// Materializes any iterable into a Vec, going through the iteration
/// protocol once.
pub(crate) fn collect_iterable(value: &Value) -> RunResult<Vec<Value>> {
    let iter_value = ScriptIter::for_value(value)?;
    let Value::Iterator(iter) = iter_value else {
        unreachable!("for_value always returns an iterator");
    };
    Ok(iter.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_counts_up_and_down() {
        let up = ScriptIter::range(0, 3, 1);
        assert_eq!(up.collect().len(), 3);
        let down = ScriptIter::range(3, 0, -1);
        let items: Vec<i64> = down
            .collect()
            .into_iter()
            .map(|v| v.as_int().unwrap())
            .collect();
        assert_eq!(items, vec![3, 2, 1]);
    }

    #[test]
    fn string_iterates_code_points() {
        let iter = ScriptIter::for_value(&Value::str("hé")).unwrap();
        let Value::Iterator(iter) = iter else { unreachable!() };
        let chars: Vec<String> = iter.collect().into_iter().map(|v| v.py_str()).collect();
        assert_eq!(chars, vec!["h", "é"]);
    }

    #[test]
    fn dict_iteration_skips_deleted_keys() {
        let mut dict = Dict::new();
        dict.insert(Value::str("a"), Value::Int(1)).unwrap();
        dict.insert(Value::str("b"), Value::Int(2)).unwrap();
        dict.insert(Value::str("c"), Value::Int(3)).unwrap();
        let shared = Arc::new(RwLock::new(dict));
        let iter = ScriptIter::dict_keys(Arc::clone(&shared));

        assert_eq!(iter.advance().unwrap().py_str(), "a");
        crate::value::write_lock(&shared).remove(&crate::key::canonical_key(&Value::str("b")).unwrap());
        assert_eq!(iter.advance().unwrap().py_str(), "c");
        assert!(iter.advance().is_none());
    }

    #[test]
    fn iterators_are_single_pass() {
        let value = Value::iterator(ScriptIter::seq(vec![Value::Int(1)]));
        let passthrough = ScriptIter::for_value(&value).unwrap();
        assert!(value.is_identical(&passthrough));
    }
}
