//! Dict methods.

use std::sync::{Arc, RwLock};

use crate::bridge::CallArgs;
use crate::exception::{RunError, RunResult};
use crate::key::canonical_key;
use crate::value::{read_lock, write_lock, Dict, DictView, Value, ViewKind};

pub(crate) const KNOWN: &[&str] = &[
    "get", "keys", "values", "items", "pop", "setdefault", "update", "clear", "copy",
];

pub(crate) fn call(dict: &Arc<RwLock<Dict>>, name: &str, args: CallArgs) -> RunResult<Value> {
    match name {
        "get" => {
            let (key, default) = args.expect_one_or_two("get")?;
            let key = canonical_key(&key)?;
            Ok(read_lock(dict).get(&key).cloned().unwrap_or(default.unwrap_or(Value::None)))
        }
        "keys" => {
            args.expect_zero("keys")?;
            Ok(view(dict, ViewKind::Keys))
        }
        "values" => {
            args.expect_zero("values")?;
            Ok(view(dict, ViewKind::Values))
        }
        "items" => {
            args.expect_zero("items")?;
            Ok(view(dict, ViewKind::Items))
        }
        "pop" => {
            let (key, default) = args.expect_one_or_two("pop")?;
            let canonical = canonical_key(&key)?;
            match write_lock(dict).remove(&canonical) {
                Some(value) => Ok(value),
                None => default.ok_or_else(|| RunError::key_error(key.py_repr())),
            }
        }
        "setdefault" => {
            let (key, default) = args.expect_one_or_two("setdefault")?;
            let canonical = canonical_key(&key)?;
            let mut guard = write_lock(dict);
            if let Some(value) = guard.get(&canonical) {
                return Ok(value.clone());
            }
            let default = default.unwrap_or(Value::None);
            guard.insert(key, default.clone())?;
            Ok(default)
        }
        "update" => {
            let other = args.expect_one("update")?;
            let Value::Dict(other) = &other else {
                return Err(RunError::type_error(format!(
                    "update() argument must be a dict, not {}",
                    other.type_name()
                )));
            };
            if Arc::ptr_eq(dict, other) {
                return Ok(Value::None);
            }
            let entries: Vec<(Value, Value)> = read_lock(other)
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let mut guard = write_lock(dict);
            for (key, value) in entries {
                guard.insert(key, value)?;
            }
            Ok(Value::None)
        }
        "clear" => {
            args.expect_zero("clear")?;
            write_lock(dict).clear();
            Ok(Value::None)
        }
        "copy" => {
            args.expect_zero("copy")?;
            let mut copy = Dict::new();
            for (key, value) in read_lock(dict).iter() {
                copy.insert(key.clone(), value.clone())?;
            }
            Ok(Value::dict(copy))
        }
        _ => Err(RunError::attribute_error(format!(
            "'dict' object has no attribute '{name}'"
        ))),
    }
}

fn view(dict: &Arc<RwLock<Dict>>, kind: ViewKind) -> Value {
    Value::DictView(Arc::new(DictView {
        dict: Arc::clone(dict),
        kind,
    }))
}
