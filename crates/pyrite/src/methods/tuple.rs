//! Tuple methods.

use crate::bridge::CallArgs;
use crate::exception::{RunError, RunResult};
use crate::value::Value;

pub(crate) const KNOWN: &[&str] = &["count", "index"];

pub(crate) fn call(items: &[Value], name: &str, args: CallArgs) -> RunResult<Value> {
    match name {
        "count" => {
            let value = args.expect_one("count")?;
            let count = items.iter().filter(|item| item.py_eq(&value)).count();
            Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
        }
        "index" => {
            let value = args.expect_one("index")?;
            items
                .iter()
                .position(|item| item.py_eq(&value))
                .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .ok_or_else(|| RunError::value_error("tuple.index(x): x not in tuple"))
        }
        _ => Err(RunError::attribute_error(format!(
            "'tuple' object has no attribute '{name}'"
        ))),
    }
}
