//! Binary and prefix operator evaluation.
//!
//! Numeric rules: int op int stays int except `/`, which always produces a
//! float; mixed int/float promotes to float; `//` and `%` follow floor
//! semantics with the sign rules of the dividend language; `**` with a
//! negative exponent promotes to float. Sequence operators concatenate and
//! repeat; set operators implement union/intersection/difference; ordering
//! on incompatible kinds raises `TypeError`.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::ast::{BinOp, PrefixOp};
use crate::exception::{ExcType, Exception, RunError, RunResult};
use crate::key::canonical_key;
use crate::value::{read_lock, write_lock, Set, Value};

pub(crate) fn prefix(op: PrefixOp, value: &Value) -> RunResult<Value> {
    match op {
        PrefixOp::Not => Ok(Value::Bool(!value.truthy())),
        PrefixOp::Neg => match value {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RunError::value_error("integer overflow")),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Bool(b) => Ok(Value::Int(-i64::from(*b))),
            other => Err(bad_unary("-", other)),
        },
        PrefixOp::Pos => match value {
            Value::Int(_) | Value::Float(_) => Ok(value.clone()),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            other => Err(bad_unary("+", other)),
        },
        PrefixOp::Invert => match value {
            Value::Int(n) => Ok(Value::Int(!n)),
            Value::Bool(b) => Ok(Value::Int(!i64::from(*b))),
            other => Err(bad_unary("~", other)),
        },
    }
}

fn bad_unary(op: &str, value: &Value) -> RunError {
    RunError::type_error(format!("bad operand type for unary {op}: '{}'", value.type_name()))
}

/// Augmented-assignment variant: lists mutate in place for `+=` and `*=`.
pub(crate) fn aug_binary(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    if let Value::List(items) = left {
        match (op, right) {
            (BinOp::Add, Value::List(other)) => {
                if Arc::ptr_eq(items, other) {
                    let copy = read_lock(other).clone();
                    write_lock(items).extend(copy);
                } else {
                    let other = read_lock(other).clone();
                    write_lock(items).extend(other);
                }
                return Ok(left.clone());
            }
            (BinOp::Add, Value::Tuple(other)) => {
                write_lock(items).extend(other.iter().cloned());
                return Ok(left.clone());
            }
            (BinOp::Mul, Value::Int(count)) => {
                let mut guard = write_lock(items);
                repeat_in_place(&mut guard, *count);
                return Ok(left.clone());
            }
            _ => {}
        }
    }
    binary(op, left, right)
}

fn repeat_in_place(items: &mut Vec<Value>, count: i64) {
    if count <= 0 {
        items.clear();
        return;
    }
    let original = items.clone();
    for _ in 1..count {
        items.extend(original.iter().cloned());
    }
}

pub(crate) fn binary(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(left.py_eq(right))),
        BinOp::NotEq => return Ok(Value::Bool(!left.py_eq(right))),
        BinOp::Is => return Ok(Value::Bool(left.is_identical(right))),
        BinOp::IsNot => return Ok(Value::Bool(!left.is_identical(right))),
        BinOp::In => return Ok(Value::Bool(contains(right, left)?)),
        BinOp::NotIn => return Ok(Value::Bool(!contains(right, left)?)),
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => return ordering(op, left, right),
        _ => {}
    }

    // Bools participate in arithmetic as 0/1.
    let left = widen_bool(left);
    let right = widen_bool(right);
    let left = &left;
    let right = &right;

    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mul => mul(left, right),
        BinOp::Div => div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::Pow => power(left, right),
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => bitwise(op, left, right),
        BinOp::Shl | BinOp::Shr => shift(op, left, right),
        _ => unreachable!("comparison operators handled above"),
    }
}

fn widen_bool(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::Int(i64::from(*b)),
        other => other.clone(),
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> RunError {
    RunError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn overflow() -> RunError {
    RunError::value_error("integer overflow")
}

fn add(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(overflow),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::Str(a), Value::Str(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::str(s))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = read_lock(a).clone();
            if Arc::ptr_eq(a, b) {
                let copy = items.clone();
                items.extend(copy);
            } else {
                items.extend(read_lock(b).iter().cloned());
            }
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.to_vec();
            items.extend(b.iter().cloned());
            Ok(Value::tuple(items))
        }
        _ => Err(unsupported(BinOp::Add, left, right)),
    }
}

fn sub(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or_else(overflow),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 - b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - *b as f64)),
        (Value::Set(a), Value::Set(b)) => set_op(a, b, SetOp::Difference),
        _ => Err(unsupported(BinOp::Sub, left, right)),
    }
}

fn mul(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or_else(overflow),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => Ok(Value::str(repeat_str(s, *n))),
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let items = read_lock(items);
            Ok(Value::list(repeat_seq(&items, *n)))
        }
        (Value::Tuple(items), Value::Int(n)) | (Value::Int(n), Value::Tuple(items)) => {
            Ok(Value::tuple(repeat_seq(items, *n)))
        }
        _ => Err(unsupported(BinOp::Mul, left, right)),
    }
}

fn repeat_str(s: &str, n: i64) -> String {
    if n <= 0 {
        return String::new();
    }
    s.repeat(usize::try_from(n).unwrap_or(0))
}

fn repeat_seq(items: &[Value], n: i64) -> Vec<Value> {
    if n <= 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(items.len() * usize::try_from(n).unwrap_or(1));
    for _ in 0..n {
        out.extend(items.iter().cloned());
    }
    out
}

fn div(left: &Value, right: &Value) -> RunResult<Value> {
    let a = numeric(left, BinOp::Div, right)?;
    let b = numeric(right, BinOp::Div, left)?;
    if b == 0.0 {
        return Err(zero_division("division by zero"));
    }
    Ok(Value::Float(a / b))
}

fn zero_division(message: &str) -> RunError {
    RunError::Exc(Exception::with_message(ExcType::ZeroDivisionError, message))
}

fn numeric(value: &Value, op: BinOp, other: &Value) -> RunResult<f64> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        _ => Err(unsupported(op, value, other)),
    }
}

fn floor_div(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            Ok(Value::Int(python_floor_div(*a, *b)))
        }
        _ => {
            let a = numeric(left, BinOp::FloorDiv, right)?;
            let b = numeric(right, BinOp::FloorDiv, left)?;
            if b == 0.0 {
                return Err(zero_division("float floor division by zero"));
            }
            Ok(Value::Float((a / b).floor()))
        }
    }
}

/// Floor division with Python's sign rules: rounds toward negative infinity.
fn python_floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) { q - 1 } else { q }
}

fn modulo(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(zero_division("integer division or modulo by zero"));
            }
            Ok(Value::Int(python_mod(*a, *b)))
        }
        _ => {
            let a = numeric(left, BinOp::Mod, right)?;
            let b = numeric(right, BinOp::Mod, left)?;
            if b == 0.0 {
                return Err(zero_division("float modulo"));
            }
            Ok(Value::Float(a - b * (a / b).floor()))
        }
    }
}

/// Modulo matching the sign of the divisor, as the language requires.
fn python_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
}

fn power(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            // Negative exponents promote to float.
            if *b < 0 {
                return Ok(Value::Float((*a as f64).powf(*b as f64)));
            }
            let exp = u32::try_from(*b).map_err(|_| overflow())?;
            a.checked_pow(exp).map(Value::Int).ok_or_else(overflow)
        }
        _ => {
            let a = numeric(left, BinOp::Pow, right)?;
            let b = numeric(right, BinOp::Pow, left)?;
            Ok(Value::Float(a.powf(b)))
        }
    }
}

enum SetOp {
    Union,
    Intersection,
    SymmetricDifference,
    Difference,
}

fn set_op(a: &Arc<std::sync::RwLock<Set>>, b: &Arc<std::sync::RwLock<Set>>, op: SetOp) -> RunResult<Value> {
    let mut out = Set::new();
    if Arc::ptr_eq(a, b) {
        match op {
            SetOp::Union | SetOp::Intersection => {
                for item in read_lock(a).iter() {
                    out.insert(item.clone())?;
                }
            }
            SetOp::SymmetricDifference | SetOp::Difference => {}
        }
        return Ok(Value::set(out));
    }
    let a = read_lock(a);
    let b = read_lock(b);
    match op {
        SetOp::Union => {
            for item in a.iter().chain(b.iter()) {
                out.insert(item.clone())?;
            }
        }
        SetOp::Intersection => {
            for (key, item) in a.keys().zip(a.iter()) {
                if b.contains(key) {
                    out.insert(item.clone())?;
                }
            }
        }
        SetOp::SymmetricDifference => {
            for (key, item) in a.keys().zip(a.iter()) {
                if !b.contains(key) {
                    out.insert(item.clone())?;
                }
            }
            for (key, item) in b.keys().zip(b.iter()) {
                if !a.contains(key) {
                    out.insert(item.clone())?;
                }
            }
        }
        SetOp::Difference => {
            for (key, item) in a.keys().zip(a.iter()) {
                if !b.contains(key) {
                    out.insert(item.clone())?;
                }
            }
        }
    }
    Ok(Value::set(out))
}

fn bitwise(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    if let (Value::Set(a), Value::Set(b)) = (left, right) {
        let set_kind = match op {
            BinOp::BitAnd => SetOp::Intersection,
            BinOp::BitOr => SetOp::Union,
            _ => SetOp::SymmetricDifference,
        };
        return set_op(a, b, set_kind);
    }
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            BinOp::BitAnd => a & b,
            BinOp::BitOr => a | b,
            _ => a ^ b,
        })),
        _ => Err(unsupported(op, left, right)),
    }
}

fn shift(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if *b < 0 {
                return Err(RunError::value_error("negative shift count"));
            }
            let shift = u32::try_from(*b).map_err(|_| overflow())?;
            match op {
                BinOp::Shl => a.checked_shl(shift).ok_or_else(overflow).map(Value::Int),
                _ => a.checked_shr(shift).map_or(Ok(Value::Int(if *a < 0 { -1 } else { 0 })), |v| Ok(Value::Int(v))),
            }
        }
        _ => Err(unsupported(op, left, right)),
    }
}

fn ordering(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    // Sets order by inclusion, not lexicographically.
    if let (Value::Set(a), Value::Set(b)) = (left, right) {
        let a = read_lock(a);
        let b = read_lock(b);
        let subset = a.keys().all(|k| b.contains(k));
        let superset = b.keys().all(|k| a.contains(k));
        let result = match op {
            BinOp::Lt => subset && a.len() < b.len(),
            BinOp::Le => subset,
            BinOp::Gt => superset && a.len() > b.len(),
            _ => superset,
        };
        return Ok(Value::Bool(result));
    }
    let Some(ord) = left.py_cmp(right) else {
        return Err(RunError::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )));
    };
    let result = match op {
        BinOp::Lt => ord == Ordering::Less,
        BinOp::Le => ord != Ordering::Greater,
        BinOp::Gt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

/// Membership: substring for strings, element equality for sequences,
/// canonical-key lookup for dicts and sets.
pub(crate) fn contains(container: &Value, item: &Value) -> RunResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_ref())),
            other => Err(RunError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(read_lock(items).iter().any(|v| v.py_eq(item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Dict(dict) => {
            let key = canonical_key(item)?;
            Ok(read_lock(dict).contains(&key))
        }
        Value::Set(set) => {
            let key = canonical_key(item)?;
            Ok(read_lock(set).contains(&key))
        }
        Value::DictView(view) => Ok(view.snapshot().iter().any(|v| v.py_eq(item))),
        other => Err(RunError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_division_always_floats() {
        let result = binary(BinOp::Div, &Value::Int(6), &Value::Int(2)).unwrap();
        assert!(matches!(result, Value::Float(f) if f == 3.0));
    }

    #[test]
    fn floor_div_rounds_toward_negative_infinity() {
        assert_eq!(python_floor_div(7, 2), 3);
        assert_eq!(python_floor_div(-7, 2), -4);
        assert_eq!(python_floor_div(7, -2), -4);
    }

    #[test]
    fn modulo_takes_divisor_sign() {
        assert_eq!(python_mod(7, 3), 1);
        assert_eq!(python_mod(-7, 3), 2);
        assert_eq!(python_mod(7, -3), -2);
    }

    #[test]
    fn power_negative_exponent_promotes() {
        let result = binary(BinOp::Pow, &Value::Int(2), &Value::Int(-1)).unwrap();
        assert!(matches!(result, Value::Float(f) if f == 0.5));
    }

    #[test]
    fn zero_division_is_catchable() {
        let err = binary(BinOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert!(matches!(err, RunError::Exc(exc) if exc.exc_type == ExcType::ZeroDivisionError));
    }

    #[test]
    fn string_and_list_repeat() {
        let result = binary(BinOp::Mul, &Value::str("ab"), &Value::Int(3)).unwrap();
        assert_eq!(result.py_str(), "ababab");
        let result = binary(BinOp::Mul, &Value::Int(2), &Value::list(vec![Value::Int(1)])).unwrap();
        assert_eq!(result.py_repr(), "[1, 1]");
    }

    #[test]
    fn and_or_are_not_here_but_in_is() {
        assert!(matches!(
            binary(BinOp::In, &Value::str("ell"), &Value::str("hello")).unwrap(),
            Value::Bool(true)
        ));
    }

    #[test]
    fn incompatible_ordering_raises_type_error() {
        let err = binary(BinOp::Lt, &Value::Int(1), &Value::str("x")).unwrap_err();
        assert!(matches!(err, RunError::Exc(exc) if exc.exc_type == ExcType::TypeError));
    }

    #[test]
    fn short_circuit_values_happen_in_evaluator_but_boolean_coercion_here() {
        let result = binary(BinOp::Add, &Value::Bool(true), &Value::Int(1)).unwrap();
        assert!(matches!(result, Value::Int(2)));
    }

    #[test]
    fn augmented_list_add_mutates_in_place() {
        let list = Value::list(vec![Value::Int(1)]);
        let other = Value::list(vec![Value::Int(2)]);
        let result = aug_binary(BinOp::Add, &list, &other).unwrap();
        assert!(result.is_identical(&list));
        assert_eq!(list.py_repr(), "[1, 2]");
    }

    #[test]
    fn in_on_membership_kinds() {
        let mut dict = crate::value::Dict::new();
        dict.insert(Value::Int(1), Value::str("x")).unwrap();
        let dict = Value::dict(dict);
        assert!(contains(&dict, &Value::Bool(true)).unwrap());
        assert!(!contains(&dict, &Value::Int(2)).unwrap());
    }
}
