//! `match`/`case` pattern evaluation.
//!
//! The parser stores patterns as ordinary expressions; classification
//! happens here. Literals match by equality; an identifier binds the
//! subject (wildcard role) unless it resolves in scope to a class or a
//! builtin type constructor, in which case it is a type pattern; sequence
//! patterns match element-wise at equal length; mapping patterns match key
//! presence with per-key sub-patterns. Guards run in the pattern's bindings.

use std::sync::Arc;

use crate::ast::{Expr, ExprKind, MatchCase};
use crate::env::Env;
use crate::eval::{EvalResult, Evaluator};
use crate::key::canonical_key;
use crate::value::{read_lock, Value};

pub(crate) fn exec_match(
    evaluator: &Evaluator<'_>,
    subject: &Value,
    cases: &[MatchCase],
    env: &Arc<Env>,
) -> EvalResult<()> {
    for case in cases {
        if !match_pattern(evaluator, &case.pattern, subject, env)? {
            continue;
        }
        if let Some(capture) = &case.capture {
            env.set(capture, subject.clone())?;
        }
        if let Some(guard) = &case.guard {
            if !evaluator.eval_expr(guard, env)?.truthy() {
                continue;
            }
        }
        evaluator.exec_block(&case.body, env)?;
        return Ok(());
    }
    // Falling through every case is a no-op, not an error.
    Ok(())
}

fn match_pattern(evaluator: &Evaluator<'_>, pattern: &Expr, subject: &Value, env: &Arc<Env>) -> EvalResult<bool> {
    match &pattern.kind {
        ExprKind::Ident(name) => match_ident(name, subject, env),
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            let elements: Vec<Value> = match subject {
                Value::Tuple(values) => values.to_vec(),
                Value::List(values) => read_lock(values).clone(),
                _ => return Ok(false),
            };
            if elements.len() != items.len() {
                return Ok(false);
            }
            for (item, element) in items.iter().zip(elements) {
                if !match_pattern(evaluator, item, &element, env)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ExprKind::Dict(entries) => {
            let Value::Dict(dict) = subject else {
                return Ok(false);
            };
            for (key_expr, value_pattern) in entries {
                let key = evaluator.eval_expr(key_expr, env)?;
                let key = canonical_key(&key)?;
                let Some(value) = read_lock(dict).get(&key).cloned() else {
                    return Ok(false);
                };
                if !match_pattern(evaluator, value_pattern, &value, env)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        // Everything else is a value pattern: evaluate and compare, which
        // covers literals, negative literals, and dotted constants.
        _ => {
            let value = evaluator.eval_expr(pattern, env)?;
            Ok(subject.py_eq(&value))
        }
    }
}

/// Identifier pattern: a type pattern when the name resolves to a class or
/// builtin type constructor, a binding wildcard otherwise. A local binding
/// shadowing a class turns the pattern back into a wildcard; `_` always
/// matches without binding.
fn match_ident(name: &Arc<str>, subject: &Value, env: &Arc<Env>) -> EvalResult<bool> {
    if name.as_ref() == "_" {
        return Ok(true);
    }
    match env.get(name) {
        Some(Value::Class(class)) => match subject {
            Value::Instance(instance) => Ok(instance.class.is_subclass_of(&class)),
            _ => Ok(false),
        },
        Some(Value::ExcClass(exc_type)) => match subject {
            Value::Exception(exc) => Ok(exc.exc_type.is_subclass_of(exc_type)),
            _ => Ok(false),
        },
        Some(Value::Builtin(function)) if is_type_constructor(function.name()) => {
            Ok(type_matches(function.name(), subject))
        }
        _ => {
            env.set(name, subject.clone())?;
            Ok(true)
        }
    }
}

fn is_type_constructor(name: &str) -> bool {
    matches!(name, "int" | "float" | "str" | "bool" | "list" | "dict" | "set" | "tuple")
}

fn type_matches(type_name: &str, subject: &Value) -> bool {
    match type_name {
        // bool is a subtype of int for isinstance purposes.
        "int" => matches!(subject, Value::Int(_) | Value::Bool(_)),
        "float" => matches!(subject, Value::Float(_)),
        "str" => matches!(subject, Value::Str(_)),
        "bool" => matches!(subject, Value::Bool(_)),
        "list" => matches!(subject, Value::List(_)),
        "dict" => matches!(subject, Value::Dict(_)),
        "set" => matches!(subject, Value::Set(_)),
        "tuple" => matches!(subject, Value::Tuple(_)),
        _ => false,
    }
}
