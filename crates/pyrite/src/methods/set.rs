//! Set methods.

use std::sync::{Arc, RwLock};

use crate::bridge::CallArgs;
use crate::exception::{RunError, RunResult};
use crate::iter::collect_iterable;
use crate::key::canonical_key;
use crate::value::{read_lock, write_lock, Set, Value};

pub(crate) const KNOWN: &[&str] = &[
    "add",
    "remove",
    "discard",
    "pop",
    "clear",
    "union",
    "intersection",
    "difference",
    "symmetric_difference",
    "issubset",
    "issuperset",
    "copy",
];

pub(crate) fn call(set: &Arc<RwLock<Set>>, name: &str, args: CallArgs) -> RunResult<Value> {
    match name {
        "add" => {
            let value = args.expect_one("add")?;
            write_lock(set).insert(value)?;
            Ok(Value::None)
        }
        "remove" => {
            let value = args.expect_one("remove")?;
            let key = canonical_key(&value)?;
            write_lock(set)
                .remove(&key)
                .map(|_| Value::None)
                .ok_or_else(|| RunError::key_error(value.py_repr()))
        }
        "discard" => {
            let value = args.expect_one("discard")?;
            let key = canonical_key(&value)?;
            write_lock(set).remove(&key);
            Ok(Value::None)
        }
        "pop" => {
            args.expect_zero("pop")?;
            write_lock(set)
                .pop_first()
                .ok_or_else(|| RunError::key_error("pop from an empty set"))
        }
        "clear" => {
            args.expect_zero("clear")?;
            write_lock(set).clear();
            Ok(Value::None)
        }
        "union" => {
            let other = other_elements(args, "union")?;
            let mut out = clone_set(set)?;
            for item in other {
                out.insert(item)?;
            }
            Ok(Value::set(out))
        }
        "intersection" => {
            let other = other_elements(args, "intersection")?;
            let mut other_keys = Set::new();
            for item in other {
                other_keys.insert(item)?;
            }
            let mut out = Set::new();
            for item in read_lock(set).iter() {
                if other_keys.contains(&canonical_key(item)?) {
                    out.insert(item.clone())?;
                }
            }
            Ok(Value::set(out))
        }
        "difference" => {
            let other = other_elements(args, "difference")?;
            let mut other_keys = Set::new();
            for item in other {
                other_keys.insert(item)?;
            }
            let mut out = Set::new();
            for item in read_lock(set).iter() {
                if !other_keys.contains(&canonical_key(item)?) {
                    out.insert(item.clone())?;
                }
            }
            Ok(Value::set(out))
        }
        "symmetric_difference" => {
            let other = other_elements(args, "symmetric_difference")?;
            let mut other_set = Set::new();
            for item in other {
                other_set.insert(item)?;
            }
            let mut out = Set::new();
            {
                let guard = read_lock(set);
                for item in guard.iter() {
                    if !other_set.contains(&canonical_key(item)?) {
                        out.insert(item.clone())?;
                    }
                }
                for item in other_set.iter() {
                    if !guard.contains(&canonical_key(item)?) {
                        out.insert(item.clone())?;
                    }
                }
            }
            Ok(Value::set(out))
        }
        "issubset" => {
            let other = other_elements(args, "issubset")?;
            let mut other_keys = Set::new();
            for item in other {
                other_keys.insert(item)?;
            }
            let result = read_lock(set).keys().all(|key| other_keys.contains(key));
            Ok(Value::Bool(result))
        }
        "issuperset" => {
            let other = other_elements(args, "issuperset")?;
            let guard = read_lock(set);
            for item in other {
                if !guard.contains(&canonical_key(&item)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "copy" => {
            args.expect_zero("copy")?;
            Ok(Value::set(clone_set(set)?))
        }
        _ => Err(RunError::attribute_error(format!(
            "'set' object has no attribute '{name}'"
        ))),
    }
}

/// The argument of the binary-style set methods may be any iterable.
fn other_elements(args: CallArgs, name: &str) -> RunResult<Vec<Value>> {
    let other = args.expect_one(name)?;
    collect_iterable(&other)
}

fn clone_set(set: &Arc<RwLock<Set>>) -> RunResult<Set> {
    let mut out = Set::new();
    for item in read_lock(set).iter() {
        out.insert(item.clone())?;
    }
    Ok(out)
}
