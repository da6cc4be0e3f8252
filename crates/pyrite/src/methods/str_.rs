//! String methods.

use std::sync::Arc;

use crate::bridge::CallArgs;
use crate::exception::{RunError, RunResult};
use crate::iter::collect_iterable;
use crate::value::Value;

pub(crate) const KNOWN: &[&str] = &[
    "upper",
    "lower",
    "strip",
    "lstrip",
    "rstrip",
    "split",
    "rsplit",
    "join",
    "replace",
    "find",
    "rfind",
    "index",
    "startswith",
    "endswith",
    "count",
    "isdigit",
    "isalpha",
    "isspace",
    "title",
    "capitalize",
    "zfill",
];

pub(crate) fn call(s: &Arc<str>, name: &str, args: CallArgs) -> RunResult<Value> {
    match name {
        "upper" => {
            args.expect_zero("upper")?;
            Ok(Value::str(s.to_uppercase()))
        }
        "lower" => {
            args.expect_zero("lower")?;
            Ok(Value::str(s.to_lowercase()))
        }
        "strip" | "lstrip" | "rstrip" => strip(s, name, args),
        "split" => split(s, args),
        "rsplit" => rsplit(s, args),
        "join" => join(s, args),
        "replace" => {
            let (from, to) = args.expect_two("replace")?;
            let from = from.as_str()?;
            let to = to.as_str()?;
            Ok(Value::str(s.replace(from.as_ref(), to)))
        }
        "find" | "rfind" | "index" => find(s, name, args),
        "startswith" => {
            let needle = args.expect_one("startswith")?;
            Ok(Value::Bool(s.starts_with(needle.as_str()?.as_ref())))
        }
        "endswith" => {
            let needle = args.expect_one("endswith")?;
            Ok(Value::Bool(s.ends_with(needle.as_str()?.as_ref())))
        }
        "count" => {
            let needle = args.expect_one("count")?;
            let needle = needle.as_str()?;
            if needle.is_empty() {
                return Ok(Value::Int(i64::try_from(s.chars().count() + 1).unwrap_or(i64::MAX)));
            }
            Ok(Value::Int(i64::try_from(s.matches(needle.as_ref()).count()).unwrap_or(i64::MAX)))
        }
        "isdigit" => {
            args.expect_zero("isdigit")?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
        }
        "isalpha" => {
            args.expect_zero("isalpha")?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
        }
        "isspace" => {
            args.expect_zero("isspace")?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_whitespace)))
        }
        "title" => {
            args.expect_zero("title")?;
            Ok(Value::str(title_case(s)))
        }
        "capitalize" => {
            args.expect_zero("capitalize")?;
            let mut chars = s.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            };
            Ok(Value::str(capitalized))
        }
        "zfill" => {
            let width = args.expect_one("zfill")?.as_int()?;
            Ok(Value::str(zfill(s, width)))
        }
        _ => Err(RunError::attribute_error(format!(
            "'str' object has no attribute '{name}'"
        ))),
    }
}

fn strip(s: &str, name: &str, args: CallArgs) -> RunResult<Value> {
    let chars_arg = match args.expect_at_most(name, 1)?.into_iter().next() {
        Some(value) => Some(value.as_str()?.to_string()),
        None => None,
    };
    let stripped = match (&chars_arg, name) {
        (None, "strip") => s.trim(),
        (None, "lstrip") => s.trim_start(),
        (None, "rstrip") => s.trim_end(),
        (Some(set), "strip") => s.trim_matches(|c| set.contains(c)),
        (Some(set), "lstrip") => s.trim_start_matches(|c| set.contains(c)),
        (Some(set), _) => s.trim_end_matches(|c| set.contains(c)),
        _ => s,
    };
    Ok(Value::str(stripped))
}

fn split(s: &str, args: CallArgs) -> RunResult<Value> {
    let mut args = args.expect_at_most("split", 2)?.into_iter();
    let sep = args.next();
    let max_split = args.next().map(|v| v.as_int()).transpose()?;
    let parts: Vec<&str> = match sep {
        // Whitespace splitting drops empty fields; maxsplit is not applied
        // in this mode.
        None | Some(Value::None) => s.split_whitespace().collect(),
        Some(sep) => {
            let sep = sep.as_str()?.to_string();
            if sep.is_empty() {
                return Err(RunError::value_error("empty separator"));
            }
            match max_split {
                Some(n) if n >= 0 => s.splitn(usize::try_from(n).unwrap_or(0) + 1, sep.as_str()).collect(),
                _ => s.split(sep.as_str()).collect(),
            }
        }
    };
    Ok(Value::list(parts.into_iter().map(Value::str).collect()))
}

fn rsplit(s: &str, args: CallArgs) -> RunResult<Value> {
    let mut args = args.expect_at_most("rsplit", 2)?.into_iter();
    let sep = args.next();
    let max_split = args.next().map(|v| v.as_int()).transpose()?;
    let parts: Vec<&str> = match sep {
        None | Some(Value::None) => s.split_whitespace().collect(),
        Some(sep) => {
            let sep = sep.as_str()?.to_string();
            if sep.is_empty() {
                return Err(RunError::value_error("empty separator"));
            }
            match max_split {
                Some(n) if n >= 0 => {
                    let mut parts: Vec<&str> =
                        s.rsplitn(usize::try_from(n).unwrap_or(0) + 1, sep.as_str()).collect();
                    parts.reverse();
                    parts
                }
                _ => s.split(sep.as_str()).collect(),
            }
        }
    };
    Ok(Value::list(parts.into_iter().map(Value::str).collect()))
}

fn join(s: &str, args: CallArgs) -> RunResult<Value> {
    let iterable = args.expect_one("join")?;
    let items = collect_iterable(&iterable)?;
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(s);
        }
        let Value::Str(part) = item else {
            return Err(RunError::type_error(format!(
                "sequence item {i}: expected str instance, {} found",
                item.type_name()
            )));
        };
        out.push_str(part);
    }
    Ok(Value::str(out))
}

fn find(s: &str, name: &str, args: CallArgs) -> RunResult<Value> {
    let needle = args.expect_one(name)?;
    let needle = needle.as_str()?;
    let byte_pos = if name == "rfind" {
        s.rfind(needle.as_ref())
    } else {
        s.find(needle.as_ref())
    };
    match byte_pos {
        // Positions are reported in characters, not bytes.
        Some(pos) => Ok(Value::Int(i64::try_from(s[..pos].chars().count()).unwrap_or(i64::MAX))),
        None if name == "index" => Err(RunError::value_error("substring not found")),
        None => Ok(Value::Int(-1)),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn zfill(s: &str, width: i64) -> String {
    let width = usize::try_from(width).unwrap_or(0);
    let len = s.chars().count();
    if len >= width {
        return s.to_owned();
    }
    let pad = "0".repeat(width - len);
    match s.strip_prefix(['-', '+']) {
        Some(rest) => format!("{}{}{}", &s[..1], pad, rest),
        None => format!("{pad}{s}"),
    }
}
