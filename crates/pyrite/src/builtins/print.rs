//! Implementation of the print() and input() builtin functions.

use std::borrow::Cow;
use std::sync::PoisonError;

use crate::bridge::{CallArgs, NativeContext};
use crate::exception::{OpError, RunError, RunResult};
use crate::value::Value;

/// Implementation of the print() builtin function.
///
/// Supported keyword arguments:
/// - `sep`: separator between values (default: " ")
/// - `end`: string appended after the last value (default: "\n")
pub(crate) fn print_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (positional, kwargs) = args.into_parts();

    let mut sep: Option<String> = None;
    let mut end: Option<String> = None;
    for (key, value) in kwargs {
        match key.as_ref() {
            "sep" => sep = extract_string_kwarg(&value, "sep")?,
            "end" => end = extract_string_kwarg(&value, "end")?,
            "flush" => {} // Accepted but ignored; writers flush themselves.
            other => {
                return Err(RunError::type_error(format!(
                    "print() got an unexpected keyword argument '{other}'"
                )));
            }
        }
    }

    let Some(writer) = ctx.env().stdout() else {
        return Err(OpError::new("no stdout writer is configured").into());
    };
    let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);

    let mut first = true;
    for value in positional {
        if first {
            first = false;
        } else {
            match &sep {
                Some(sep) => writer.write_str(Cow::Borrowed(sep.as_str()))?,
                None => writer.push_char(' ')?,
            }
        }
        writer.write_str(Cow::Owned(value.py_str()))?;
    }
    match &end {
        Some(end) => writer.write_str(Cow::Borrowed(end.as_str()))?,
        None => writer.push_char('\n')?,
    }

    Ok(Value::None)
}

/// A print kwarg may be None (use the default) or a string.
fn extract_string_kwarg(value: &Value, name: &str) -> RunResult<Option<String>> {
    match value {
        Value::None => Ok(None),
        Value::Str(s) => Ok(Some(s.to_string())),
        other => Err(RunError::type_error(format!(
            "{name} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

/// Implementation of the input() builtin: optional prompt, then one line
/// from the captured reader.
pub(crate) fn input_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let prompt = args.expect_at_most("input", 1)?.into_iter().next();
    if let Some(prompt) = prompt {
        if let Some(writer) = ctx.env().stdout() {
            let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
            writer.write_str(Cow::Owned(prompt.py_str()))?;
        }
    }
    let Some(reader) = ctx.env().stdin() else {
        return Err(OpError::new("no stdin reader is configured").into());
    };
    let line = reader.lock().unwrap_or_else(PoisonError::into_inner).read_line()?;
    Ok(Value::str(line))
}
