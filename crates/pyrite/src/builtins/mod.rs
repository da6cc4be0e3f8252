//! Builtin functions installed into every root environment.
//!
//! Each builtin is a raw native function over [`CallArgs`], so it controls
//! its own arity and keyword handling. Builtins that call back into script
//! code (`sorted` with `key=`, `map`, `filter`) re-enter the evaluator
//! through the native context.

mod print;

use std::cell::Cell;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::ast::BinOp;
use crate::bridge::{CallArgs, NativeContext, NativeFunction};
use crate::env::Env;
use crate::eval::{binop, index, Evaluator};
use crate::exception::{ExcType, Exception, RunError, RunResult};
use crate::iter::{collect_iterable, ScriptIter};
use crate::value::{read_lock, Dict, PropertyValue, Set, SuperValue, Value};

/// Installs the builtin functions and exception types into an environment.
pub(crate) fn install(env: &Arc<Env>) {
    let bind = |name: &str, f: fn(&NativeContext<'_>, CallArgs) -> RunResult<Value>| {
        env.insert(Arc::from(name), Value::Builtin(Arc::new(NativeFunction::from_raw(name, f))));
    };

    bind("print", print::print_impl);
    bind("input", print::input_impl);
    bind("len", len_impl);
    bind("range", range_impl);
    bind("abs", abs_impl);
    bind("min", min_impl);
    bind("max", max_impl);
    bind("sum", sum_impl);
    bind("round", round_impl);
    bind("sorted", sorted_impl);
    bind("reversed", reversed_impl);
    bind("enumerate", enumerate_impl);
    bind("zip", zip_impl);
    bind("map", map_impl);
    bind("filter", filter_impl);
    bind("any", any_impl);
    bind("all", all_impl);
    bind("str", str_impl);
    bind("repr", repr_impl);
    bind("int", int_impl);
    bind("float", float_impl);
    bind("bool", bool_impl);
    bind("list", list_impl);
    bind("tuple", tuple_impl);
    bind("dict", dict_impl);
    bind("set", set_impl);
    bind("type", type_impl);
    bind("isinstance", isinstance_impl);
    bind("ord", ord_impl);
    bind("chr", chr_impl);
    bind("iter", iter_impl);
    bind("next", next_impl);
    bind("slice", slice_impl);
    bind("exit", exit_impl);
    bind("deepcopy", deepcopy_impl);
    bind("property", property_impl);
    bind("staticmethod", staticmethod_impl);
    bind("super", super_impl);

    for exc_type in [
        ExcType::Exception,
        ExcType::SystemExit,
        ExcType::KeyboardInterrupt,
        ExcType::ValueError,
        ExcType::TypeError,
        ExcType::NameError,
        ExcType::AttributeError,
        ExcType::KeyError,
        ExcType::IndexError,
        ExcType::ZeroDivisionError,
        ExcType::StopIteration,
        ExcType::AssertionError,
        ExcType::ImportError,
        ExcType::RuntimeError,
        ExcType::RecursionError,
    ] {
        let name: &'static str = exc_type.into();
        env.insert(Arc::from(name), Value::ExcClass(exc_type));
    }
}

fn len_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_one("len")?;
    value
        .py_len()
        .map(|n| Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        .ok_or_else(|| RunError::type_error(format!("object of type '{}' has no len()", value.type_name())))
}

fn range_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let bounds = args.expect_at_most("range", 3)?;
    if bounds.is_empty() {
        return Err(RunError::type_error("range expected at least 1 argument, got 0"));
    }
    let ints: Vec<i64> = bounds.iter().map(Value::as_int).collect::<RunResult<_>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => unreachable!("arity checked"),
    };
    if step == 0 {
        return Err(RunError::value_error("range() arg 3 must not be zero"));
    }
    Ok(Value::iterator(ScriptIter::range(start, stop, step)))
}

fn abs_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    match args.expect_one("abs")? {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RunError::value_error("integer overflow")),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        other => Err(RunError::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Shared core of `min` and `max`.
fn extreme(
    ctx: &NativeContext<'_>,
    args: CallArgs,
    name: &str,
    keep: Ordering,
) -> RunResult<Value> {
    let mut key_fn = None;
    for (kw, value) in args.kwargs() {
        if kw.as_ref() == "key" {
            key_fn = Some(value.clone());
        } else {
            return Err(RunError::type_error(format!(
                "{name}() got an unexpected keyword argument '{kw}'"
            )));
        }
    }
    let pos = args.args().to_vec();
    let candidates = match pos.len() {
        0 => return Err(RunError::type_error(format!("{name} expected at least 1 argument, got 0"))),
        1 => collect_iterable(&pos[0])?,
        _ => pos,
    };
    if candidates.is_empty() {
        return Err(RunError::value_error(format!("{name}() arg is an empty sequence")));
    }
    let mut best: Option<(Value, Value)> = None;
    for candidate in candidates {
        let key = match &key_fn {
            Some(f) => ctx.call(f, vec![candidate.clone()])?,
            None => candidate.clone(),
        };
        match &best {
            None => best = Some((key, candidate)),
            Some((best_key, _)) => {
                let Some(ord) = key.py_cmp(best_key) else {
                    return Err(RunError::type_error(format!(
                        "'{name}' arguments are not comparable"
                    )));
                };
                if ord == keep {
                    best = Some((key, candidate));
                }
            }
        }
    }
    Ok(best.map(|(_, v)| v).unwrap_or(Value::None))
}

fn min_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    extreme(ctx, args, "min", Ordering::Less)
}

fn max_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    extreme(ctx, args, "max", Ordering::Greater)
}

fn sum_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (iterable, start) = args.expect_one_or_two("sum")?;
    let mut total = start.unwrap_or(Value::Int(0));
    for item in collect_iterable(&iterable)? {
        total = binop::binary(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

fn round_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (value, ndigits) = args.expect_one_or_two("round")?;
    let f = value.as_float()?;
    match ndigits {
        None | Some(Value::None) => {
            let rounded = f.round_ties_even();
            Ok(Value::Int(rounded as i64))
        }
        Some(n) => {
            let digits = n.as_int()?;
            let factor = 10f64.powi(i32::try_from(digits).unwrap_or(0));
            Ok(Value::Float((f * factor).round_ties_even() / factor))
        }
    }
}

/// Stable sort used by both `sorted()` and `list.sort()`.
pub(crate) fn sort_values(
    evaluator: &Evaluator<'_>,
    env: &Arc<Env>,
    values: Vec<Value>,
    key_fn: Option<&Value>,
    reverse: bool,
) -> RunResult<Vec<Value>> {
    let mut keyed: Vec<(Value, Value)> = Vec::with_capacity(values.len());
    for value in values {
        let key = match key_fn {
            Some(f) => evaluator.call_value(f, CallArgs::positional(vec![value.clone()]), env, 0)?,
            None => value.clone(),
        };
        keyed.push((key, value));
    }
    let failed = Cell::new(false);
    keyed.sort_by(|(a, _), (b, _)| {
        a.py_cmp(b).unwrap_or_else(|| {
            failed.set(true);
            Ordering::Equal
        })
    });
    if failed.get() {
        return Err(RunError::type_error("sort arguments are not comparable"));
    }
    if reverse {
        keyed.reverse();
    }
    Ok(keyed.into_iter().map(|(_, v)| v).collect())
}

fn sorted_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
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
                    "sorted() got an unexpected keyword argument '{other}'"
                )));
            }
        }
    }
    let pos = args.args();
    if pos.len() != 1 {
        return Err(RunError::type_error(format!(
            "sorted expected 1 argument, got {}",
            pos.len()
        )));
    }
    let values = collect_iterable(&pos[0])?;
    let sorted = sort_values(ctx.evaluator(), ctx.env(), values, key_fn.as_ref(), reverse)?;
    Ok(Value::list(sorted))
}

fn reversed_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let iterable = args.expect_one("reversed")?;
    let mut items = collect_iterable(&iterable)?;
    items.reverse();
    Ok(Value::iterator(ScriptIter::seq(items)))
}

fn enumerate_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (iterable, start) = args.expect_one_or_two("enumerate")?;
    let start = start.map_or(Ok(0), |v| v.as_int())?;
    let items = collect_iterable(&iterable)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| Value::tuple(vec![Value::Int(start + i64::try_from(i).unwrap_or(0)), item]))
        .collect();
    Ok(Value::iterator(ScriptIter::seq(items)))
}

fn zip_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    args.reject_kwargs("zip")?;
    let (pos, _) = args.into_parts();
    let mut columns = Vec::with_capacity(pos.len());
    for iterable in &pos {
        columns.push(collect_iterable(iterable)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut items = Vec::with_capacity(rows);
    for row in 0..rows {
        items.push(Value::tuple(columns.iter().map(|col| col[row].clone()).collect()));
    }
    Ok(Value::iterator(ScriptIter::seq(items)))
}

fn map_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (f, iterable) = args.expect_two("map")?;
    let mut items = Vec::new();
    for item in collect_iterable(&iterable)? {
        items.push(ctx.call(&f, vec![item])?);
    }
    Ok(Value::iterator(ScriptIter::seq(items)))
}

fn filter_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (f, iterable) = args.expect_two("filter")?;
    let mut items = Vec::new();
    for item in collect_iterable(&iterable)? {
        let keep = match &f {
            Value::None => item.truthy(),
            f => ctx.call(f, vec![item.clone()])?.truthy(),
        };
        if keep {
            items.push(item);
        }
    }
    Ok(Value::iterator(ScriptIter::seq(items)))
}

fn any_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let iterable = args.expect_one("any")?;
    Ok(Value::Bool(collect_iterable(&iterable)?.iter().any(Value::truthy)))
}

fn all_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let iterable = args.expect_one("all")?;
    Ok(Value::Bool(collect_iterable(&iterable)?.iter().all(Value::truthy)))
}

fn str_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("str", 1)?.into_iter().next();
    Ok(Value::str(value.map(|v| v.py_str()).unwrap_or_default()))
}

fn repr_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_one("repr")?;
    Ok(Value::str(value.py_repr()))
}

fn int_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (value, base) = match args.expect_at_most("int", 2)?.as_slice() {
        [] => return Ok(Value::Int(0)),
        [value] => (value.clone(), None),
        [value, base] => (value.clone(), Some(base.as_int()?)),
        _ => unreachable!("arity checked"),
    };
    match base {
        None => Ok(Value::Int(value.coerce_int()?)),
        Some(base) => {
            let Value::Str(s) = &value else {
                return Err(RunError::type_error("int() can't convert non-string with explicit base"));
            };
            let radix = u32::try_from(base)
                .ok()
                .filter(|b| (2..=36).contains(b))
                .ok_or_else(|| RunError::value_error("int() base must be >= 2 and <= 36"))?;
            i64::from_str_radix(s.trim(), radix)
                .map(Value::Int)
                .map_err(|_| RunError::value_error(format!("invalid literal for int() with base {base}: '{s}'")))
        }
    }
}

fn float_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("float", 1)?.into_iter().next();
    match value {
        None => Ok(Value::Float(0.0)),
        Some(value) => Ok(Value::Float(value.coerce_float()?)),
    }
}

fn bool_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("bool", 1)?.into_iter().next();
    Ok(Value::Bool(value.is_some_and(|v| v.truthy())))
}

fn list_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("list", 1)?.into_iter().next();
    match value {
        None => Ok(Value::list(Vec::new())),
        Some(value) => Ok(Value::list(collect_iterable(&value)?)),
    }
}

fn tuple_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("tuple", 1)?.into_iter().next();
    match value {
        None => Ok(Value::tuple(Vec::new())),
        Some(value) => Ok(Value::tuple(collect_iterable(&value)?)),
    }
}

fn dict_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("dict", 1)?.into_iter().next();
    match value {
        None => Ok(Value::dict(Dict::new())),
        Some(Value::Dict(other)) => {
            let mut dict = Dict::new();
            for (key, entry) in read_lock(&other).iter() {
                dict.insert(key.clone(), entry.clone())?;
            }
            Ok(Value::dict(dict))
        }
        // An iterable of key/value pairs also works.
        Some(other) => {
            let mut dict = Dict::new();
            for pair in collect_iterable(&other)? {
                let items = collect_iterable(&pair)?;
                let [key, value] = items.as_slice() else {
                    return Err(RunError::value_error("dictionary update sequence element is not a pair"));
                };
                dict.insert(key.clone(), value.clone())?;
            }
            Ok(Value::dict(dict))
        }
    }
}

fn set_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_at_most("set", 1)?.into_iter().next();
    let mut set = Set::new();
    if let Some(value) = value {
        for item in collect_iterable(&value)? {
            set.insert(item)?;
        }
    }
    Ok(Value::set(set))
}

/// `type(x)`: the class for instances; for built-in kinds the registered
/// constructor, so `type(1) is int` holds.
fn type_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_one("type")?;
    match &value {
        Value::Instance(instance) => Ok(Value::Class(Arc::clone(&instance.class))),
        Value::Exception(exc) => Ok(Value::ExcClass(exc.exc_type)),
        other => {
            let name = other.type_name();
            match ctx.env().get(name) {
                Some(constructor) => Ok(constructor),
                None => Ok(Value::str(format!("<class '{name}'>"))),
            }
        }
    }
}

fn isinstance_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (value, classinfo) = args.expect_two("isinstance")?;
    Ok(Value::Bool(isinstance_check(&value, &classinfo)?))
}

fn isinstance_check(value: &Value, classinfo: &Value) -> RunResult<bool> {
    match classinfo {
        Value::Tuple(options) => {
            for option in options.iter() {
                if isinstance_check(value, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Class(class) => match value {
            Value::Instance(instance) => Ok(instance.class.is_subclass_of(class)),
            _ => Ok(false),
        },
        Value::ExcClass(exc_type) => match value {
            Value::Exception(exc) => Ok(exc.exc_type.is_subclass_of(*exc_type)),
            _ => Ok(false),
        },
        Value::Builtin(function) => Ok(match function.name() {
            "int" => matches!(value, Value::Int(_) | Value::Bool(_)),
            "float" => matches!(value, Value::Float(_)),
            "str" => matches!(value, Value::Str(_)),
            "bool" => matches!(value, Value::Bool(_)),
            "list" => matches!(value, Value::List(_)),
            "dict" => matches!(value, Value::Dict(_)),
            "set" => matches!(value, Value::Set(_)),
            "tuple" => matches!(value, Value::Tuple(_)),
            _ => false,
        }),
        other => Err(RunError::type_error(format!(
            "isinstance() arg 2 must be a type, not {}",
            other.type_name()
        ))),
    }
}

fn ord_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_one("ord")?;
    let s = value.as_str()?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
        _ => Err(RunError::type_error(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))),
    }
}

fn chr_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let code = args.expect_one("chr")?.as_int()?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::str(c.to_string()))
        .ok_or_else(|| RunError::value_error("chr() arg not in range"))
}

fn iter_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let value = args.expect_one("iter")?;
    ScriptIter::for_value(&value)
}

fn next_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (iterator, default) = args.expect_one_or_two("next")?;
    let Value::Iterator(iter) = &iterator else {
        return Err(RunError::type_error(format!(
            "'{}' object is not an iterator",
            iterator.type_name()
        )));
    };
    match iter.advance() {
        Some(value) => Ok(value),
        None => default.ok_or_else(RunError::stop_iteration),
    }
}

fn slice_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let bounds = args.expect_at_most("slice", 3)?;
    if bounds.is_empty() {
        return Err(RunError::type_error("slice expected at least 1 argument, got 0"));
    }
    let as_bound = |v: &Value| -> RunResult<Option<i64>> {
        match v {
            Value::None => Ok(None),
            other => Ok(Some(other.as_int()?)),
        }
    };
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (None, as_bound(stop)?, None),
        [start, stop] => (as_bound(start)?, as_bound(stop)?, None),
        [start, stop, step] => (as_bound(start)?, as_bound(stop)?, as_bound(step)?),
        _ => unreachable!("arity checked"),
    };
    Ok(index::make_slice(start, stop, step))
}

fn exit_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let code = args.expect_at_most("exit", 1)?.into_iter().next();
    let code = match code {
        None | Some(Value::None) => 0,
        Some(Value::Int(n)) => i32::try_from(n).unwrap_or(1),
        Some(other) => {
            return Err(RunError::type_error(format!(
                "exit() argument must be an int, not {}",
                other.type_name()
            )));
        }
    };
    Err(RunError::Exc(Exception::system_exit(code)))
}

/// Explicit deep copy for hand-off between contexts. Does not track cycles.
fn deepcopy_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    Ok(args.expect_one("deepcopy")?.deep_copy())
}

fn property_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let (getter, setter) = args.expect_one_or_two("property")?;
    Ok(Value::Property(Arc::new(PropertyValue {
        getter,
        setter: setter.filter(|v| !matches!(v, Value::None)),
    })))
}

fn staticmethod_impl(_ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    let f = args.expect_one("staticmethod")?;
    Ok(Value::StaticMethod(Arc::new(f)))
}

/// Zero-argument `super()`: recovers the defining class and receiver from
/// the hidden bindings of the current method frame.
fn super_impl(ctx: &NativeContext<'_>, args: CallArgs) -> RunResult<Value> {
    args.expect_zero("super")?;
    let class = ctx.env().get("__class__");
    let receiver = ctx.env().get("__self__");
    match (class, receiver) {
        (Some(Value::Class(class)), Some(Value::Instance(instance))) => {
            Ok(Value::Super(Arc::new(SuperValue { class, instance })))
        }
        _ => Err(RunError::Exc(Exception::with_message(
            ExcType::RuntimeError,
            "super(): no arguments and no enclosing method",
        ))),
    }
}

