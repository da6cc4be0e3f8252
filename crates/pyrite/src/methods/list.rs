//! List methods.

use std::sync::{Arc, RwLock};

use crate::bridge::CallArgs;
use crate::env::Env;
use crate::eval::Evaluator;
use crate::exception::{RunError, RunResult};
use crate::iter::collect_iterable;
use crate::value::{read_lock, write_lock, Value};

pub(crate) const KNOWN: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "clear", "index", "count", "sort", "reverse", "copy",
];

pub(crate) fn call(
    evaluator: &Evaluator<'_>,
    env: &Arc<Env>,
    items: &Arc<RwLock<Vec<Value>>>,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    match name {
        "append" => {
            let value = args.expect_one("append")?;
            write_lock(items).push(value);
            Ok(Value::None)
        }
        "extend" => {
            let iterable = args.expect_one("extend")?;
            let new_items = collect_iterable(&iterable)?;
            write_lock(items).extend(new_items);
            Ok(Value::None)
        }
        "insert" => {
            let (index, value) = args.expect_two("insert")?;
            let index = index.as_int()?;
            let mut guard = write_lock(items);
            let len = i64::try_from(guard.len()).unwrap_or(i64::MAX);
            // Out-of-range insert positions clamp rather than raise.
            let position = if index < 0 { (index + len).max(0) } else { index.min(len) };
            guard.insert(usize::try_from(position).unwrap_or(0), value);
            Ok(Value::None)
        }
        "pop" => {
            let index = args
                .expect_at_most("pop", 1)?
                .into_iter()
                .next()
                .map(|v| v.as_int())
                .transpose()?;
            let mut guard = write_lock(items);
            if guard.is_empty() {
                return Err(RunError::index_error("pop from empty list"));
            }
            let len = i64::try_from(guard.len()).unwrap_or(i64::MAX);
            let index = index.unwrap_or(len - 1);
            let resolved = if index < 0 { index + len } else { index };
            if resolved < 0 || resolved >= len {
                return Err(RunError::index_error("pop index out of range"));
            }
            Ok(guard.remove(usize::try_from(resolved).unwrap_or(0)))
        }
        "remove" => {
            let value = args.expect_one("remove")?;
            let mut guard = write_lock(items);
            let Some(position) = guard.iter().position(|item| item.py_eq(&value)) else {
                return Err(RunError::value_error("list.remove(x): x not in list"));
            };
            guard.remove(position);
            Ok(Value::None)
        }
        "clear" => {
            args.expect_zero("clear")?;
            write_lock(items).clear();
            Ok(Value::None)
        }
        "index" => {
            let value = args.expect_one("index")?;
            let guard = read_lock(items);
            guard
                .iter()
                .position(|item| item.py_eq(&value))
                .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .ok_or_else(|| RunError::value_error(format!("{} is not in list", value.py_repr())))
        }
        "count" => {
            let value = args.expect_one("count")?;
            let count = read_lock(items).iter().filter(|item| item.py_eq(&value)).count();
            Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
        }
        "sort" => sort(evaluator, env, items, args),
        "reverse" => {
            args.expect_zero("reverse")?;
            write_lock(items).reverse();
            Ok(Value::None)
        }
        "copy" => {
            args.expect_zero("copy")?;
            Ok(Value::list(read_lock(items).clone()))
        }
        _ => Err(RunError::attribute_error(format!(
            "'list' object has no attribute '{name}'"
        ))),
    }
}

/// In-place stable sort with optional `key=` and `reverse=` kwargs.
fn sort(evaluator: &Evaluator<'_>, env: &Arc<Env>, items: &Arc<RwLock<Vec<Value>>>, args: CallArgs) -> RunResult<Value> {
    let mut key_fn = None;
    let mut reverse = false;
    for (name, value) in args.kwargs() {
        match name.as_ref() {
            "key" => {
                if !matches!(value, Value::None) {
                    key_fn = Some(value.clone());
                }
            }
            "reverse" => reverse = value.truthy(),
            other => {
                return Err(RunError::type_error(format!(
                    "sort() got an unexpected keyword argument '{other}'"
                )));
            }
        }
    }
    if !args.args().is_empty() {
        return Err(RunError::type_error("sort() takes no positional arguments"));
    }

    // Sort outside the lock so key functions can touch the list safely.
    let values = read_lock(items).clone();
    let sorted = crate::builtins::sort_values(evaluator, env, values, key_fn.as_ref(), reverse)?;
    *write_lock(items) = sorted;
    Ok(Value::None)
}
