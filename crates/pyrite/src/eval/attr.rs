//! Attribute access and method binding.
//!
//! Instances search their fields first, then walk the class MRO; functions
//! found on the class bind the receiver, properties run their getter,
//! static methods unwrap. `super` lookups start at the base of the bound
//! class. Dicts and libraries resolve attributes as named entries, and the
//! built-in types expose their method surface as bound type-methods.

use std::sync::Arc;

use crate::bridge::CallArgs;
use crate::env::Env;
use crate::eval::Evaluator;
use crate::exception::{RunError, RunResult};
use crate::key::canonical_key;
use crate::methods;
use crate::value::{read_lock, write_lock, BoundMethod, Class, Instance, TypeMethod, Value};

pub(crate) fn get_attr(evaluator: &Evaluator<'_>, obj: &Value, name: &str, env: &Arc<Env>) -> RunResult<Value> {
    match obj {
        Value::Instance(instance) => {
            if let Some(value) = read_lock(&instance.fields).get(name) {
                return Ok(value.clone());
            }
            let Some((found, defining_class)) = instance.class.lookup(name) else {
                return Err(RunError::attribute_error(format!(
                    "'{}' object has no attribute '{}'",
                    instance.class.name, name
                )));
            };
            bind_class_attr(evaluator, found, defining_class, Arc::clone(instance), env)
        }
        Value::Super(sup) => {
            let Some(base) = &sup.class.base else {
                return Err(RunError::attribute_error(format!(
                    "'super' object has no attribute '{name}'"
                )));
            };
            let Some((found, defining_class)) = base.lookup(name) else {
                return Err(RunError::attribute_error(format!(
                    "'super' object has no attribute '{name}'"
                )));
            };
            bind_class_attr(evaluator, found, defining_class, Arc::clone(&sup.instance), env)
        }
        Value::Class(class) => {
            let Some((found, _)) = class.lookup(name) else {
                return Err(RunError::attribute_error(format!(
                    "type object '{}' has no attribute '{}'",
                    class.name, name
                )));
            };
            match found {
                Value::StaticMethod(inner) => Ok((*inner).clone()),
                other => Ok(other),
            }
        }
        Value::Dict(dict) => {
            // Named entries shadow dict methods.
            let key = canonical_key(&Value::str(name))?;
            if let Some(value) = read_lock(dict).get(&key) {
                return Ok(value.clone());
            }
            type_method(obj, name)
        }
        Value::Library(library) => library.attr(name).ok_or_else(|| {
            RunError::attribute_error(format!("module '{}' has no attribute '{}'", library.name(), name))
        }),
        Value::Exception(exc) => match name {
            "args" => Ok(Value::tuple(
                exc.message.iter().map(|m| Value::str(m.as_str())).collect(),
            )),
            _ => Err(RunError::attribute_error(format!(
                "'{}' object has no attribute '{}'",
                exc.exc_type, name
            ))),
        },
        _ => type_method(obj, name),
    }
}

/// Binds a value found on a class against a receiving instance.
fn bind_class_attr(
    evaluator: &Evaluator<'_>,
    found: Value,
    defining_class: Arc<Class>,
    receiver: Arc<Instance>,
    env: &Arc<Env>,
) -> RunResult<Value> {
    match found {
        Value::Function(_) | Value::Lambda(_) | Value::Builtin(_) => Ok(Value::BoundMethod(Arc::new(BoundMethod {
            func: found,
            receiver: Value::Instance(receiver),
            defining_class: Some(defining_class),
        }))),
        Value::Property(property) => evaluator.call_value(
            &property.getter,
            CallArgs::positional(vec![Value::Instance(receiver)]),
            env,
            0,
        ),
        Value::StaticMethod(inner) => Ok((*inner).clone()),
        other => Ok(other),
    }
}

/// Built-in type method lookup for str/list/dict/set/tuple and dict views.
fn type_method(obj: &Value, name: &str) -> RunResult<Value> {
    if methods::has_method(obj, name) {
        return Ok(Value::TypeMethod(Arc::new(TypeMethod {
            receiver: obj.clone(),
            name: Arc::from(name),
        })));
    }
    Err(RunError::attribute_error(format!(
        "'{}' object has no attribute '{}'",
        obj.type_name(),
        name
    )))
}

pub(crate) fn set_attr(
    evaluator: &Evaluator<'_>,
    obj: &Value,
    name: &str,
    value: Value,
    env: &Arc<Env>,
) -> RunResult<()> {
    match obj {
        Value::Instance(instance) => {
            // A property with a setter intercepts plain field assignment.
            if let Some((Value::Property(property), _)) = instance.class.lookup(name) {
                let Some(setter) = &property.setter else {
                    return Err(RunError::attribute_error(format!(
                        "property '{name}' has no setter"
                    )));
                };
                evaluator.call_value(
                    setter,
                    CallArgs::positional(vec![Value::Instance(Arc::clone(instance)), value]),
                    env,
                    0,
                )?;
                return Ok(());
            }
            write_lock(&instance.fields).insert(Arc::from(name), value);
            Ok(())
        }
        Value::Class(class) => {
            write_lock(&class.attrs).insert(Arc::from(name), value);
            Ok(())
        }
        Value::Dict(dict) => {
            write_lock(dict).insert(Value::str(name), value)?;
            Ok(())
        }
        other => Err(RunError::attribute_error(format!(
            "'{}' object does not support attribute assignment",
            other.type_name()
        ))),
    }
}
