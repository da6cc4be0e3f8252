//! Methods of the built-in types.
//!
//! Attribute access on a str/list/dict/set/tuple yields a bound
//! [`TypeMethod`](crate::value::TypeMethod) when the name is known here;
//! calling it dispatches by receiver kind and method name. Each submodule
//! owns one receiver type.

mod dict;
mod list;
mod set;
mod str_;
mod tuple;

use std::sync::Arc;

use crate::bridge::CallArgs;
use crate::env::Env;
use crate::eval::Evaluator;
use crate::exception::{RunError, RunResult};
use crate::value::Value;

pub(crate) fn has_method(value: &Value, name: &str) -> bool {
    match value {
        Value::Str(_) => str_::KNOWN.contains(&name),
        Value::List(_) => list::KNOWN.contains(&name),
        Value::Dict(_) => dict::KNOWN.contains(&name),
        Value::Set(_) => set::KNOWN.contains(&name),
        Value::Tuple(_) => tuple::KNOWN.contains(&name),
        _ => false,
    }
}

pub(crate) fn call_method(
    evaluator: &Evaluator<'_>,
    env: &Arc<Env>,
    receiver: &Value,
    name: &str,
    args: CallArgs,
) -> RunResult<Value> {
    match receiver {
        Value::Str(s) => str_::call(s, name, args),
        Value::List(items) => list::call(evaluator, env, items, name, args),
        Value::Dict(dict) => dict::call(dict, name, args),
        Value::Set(set) => set::call(set, name, args),
        Value::Tuple(items) => tuple::call(items, name, args),
        other => Err(RunError::attribute_error(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            name
        ))),
    }
}
