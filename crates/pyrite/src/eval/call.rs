//! Call dispatch and argument binding.
//!
//! One entry point, [`Evaluator::call_value`], dispatches every callable
//! kind: script functions and lambdas open a fresh environment enclosed in
//! their captured one; classes construct an instance and run `__init__`;
//! bound methods prepend their receiver; native functions marshal through
//! the bridge; exception types construct exception values.

use std::sync::Arc;

use crate::ast::{CallArg, Expr, Param};
use crate::bridge::CallArgs;
use crate::env::Env;
use crate::eval::{EvalResult, Evaluator};
use crate::exception::{ExcType, Exception, RunError, RunResult, Unwind};
use crate::iter::collect_iterable;
use crate::methods;
use crate::value::{construct_exception, read_lock, Class, Dict, Function, Instance, LambdaValue, Value};

impl Evaluator<'_> {
    /// Evaluates a call expression: callee, then arguments left to right
    /// (splicing `*` and `**` unpackings), then dispatch.
    pub(crate) fn eval_call_expr(&self, callee: &Expr, args: &[CallArg], env: &Arc<Env>, line: u32) -> EvalResult {
        let callee = self.eval_expr(callee, env)?;
        let mut call_args = CallArgs::new();
        for arg in args {
            match arg {
                CallArg::Pos(expr) => call_args.push(self.eval_expr(expr, env)?),
                CallArg::Star(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    for item in collect_iterable(&value)? {
                        call_args.push(item);
                    }
                }
                CallArg::Kw(name, expr) => call_args.push_kwarg(Arc::clone(name), self.eval_expr(expr, env)?),
                CallArg::KwStar(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    let Value::Dict(dict) = &value else {
                        return Err(RunError::type_error(format!(
                            "argument after ** must be a dict, not {}",
                            value.type_name()
                        ))
                        .into());
                    };
                    for (key, entry) in read_lock(dict).iter() {
                        let Value::Str(key) = key else {
                            return Err(RunError::type_error("keywords must be strings").into());
                        };
                        call_args.push_kwarg(Arc::clone(key), entry.clone());
                    }
                }
            }
        }
        Ok(self.call_value(&callee, call_args, env, line)?)
    }

    /// Calls any callable value with already-evaluated arguments.
    pub(crate) fn call_value(&self, callee: &Value, args: CallArgs, env: &Arc<Env>, line: u32) -> RunResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args, None),
            Value::Lambda(lambda) => self.call_lambda(lambda, args),
            Value::Builtin(function) => function.invoke(self, env, args),
            Value::TypeMethod(method) => methods::call_method(self, env, &method.receiver, &method.name, args),
            Value::BoundMethod(method) => {
                let mut bound_args = CallArgs::new();
                bound_args.push(method.receiver.clone());
                let (pos, kwargs) = args.into_parts();
                for value in pos {
                    bound_args.push(value);
                }
                for (name, value) in kwargs {
                    bound_args.push_kwarg(name, value);
                }
                match &method.func {
                    Value::Function(function) => self.call_function(
                        function,
                        bound_args,
                        Some((method.receiver.clone(), method.defining_class.clone())),
                    ),
                    Value::Lambda(lambda) => self.call_lambda(lambda, bound_args),
                    Value::Builtin(function) => function.invoke(self, env, bound_args),
                    other => Err(RunError::type_error(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Value::Class(class) => self.construct_instance(class, args, env, line),
            Value::ExcClass(exc_type) => {
                args.reject_kwargs(exc_type.into())?;
                let (pos, _) = args.into_parts();
                construct_exception(*exc_type, &pos)
            }
            Value::StaticMethod(inner) => self.call_value(inner, args, env, line),
            Value::Instance(instance) => {
                let Some((found, defining_class)) = instance.class.lookup("__call__") else {
                    return Err(RunError::type_error(format!(
                        "'{}' object is not callable",
                        instance.class.name
                    )));
                };
                let receiver = Value::Instance(Arc::clone(instance));
                let mut bound_args = CallArgs::new();
                bound_args.push(receiver.clone());
                let (pos, kwargs) = args.into_parts();
                for value in pos {
                    bound_args.push(value);
                }
                for (name, value) in kwargs {
                    bound_args.push_kwarg(name, value);
                }
                match found {
                    Value::Function(function) => {
                        self.call_function(&function, bound_args, Some((receiver, Some(defining_class))))
                    }
                    other => self.call_value(&other, bound_args, env, line),
                }
            }
            Value::Library(library) => {
                let Some(constructor) = library.constructor() else {
                    return Err(RunError::type_error(format!(
                        "'{}' module object is not callable",
                        library.name()
                    )));
                };
                let ctx = crate::bridge::NativeContext {
                    evaluator: self,
                    env,
                    library: Some(Arc::clone(library)),
                };
                let instance = constructor(&ctx, args)?;
                Ok(Value::Library(library.instantiate(instance)))
            }
            other => Err(RunError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// Calls a script function: fresh environment enclosed in the captured
    /// one, parameters bound, body executed, `return` unwrapped.
    fn call_function(
        &self,
        function: &Function,
        args: CallArgs,
        method_bind: Option<(Value, Option<Arc<Class>>)>,
    ) -> RunResult<Value> {
        let def = &function.def;
        self.enter_frame().map_err(unwind_to_error)?;
        self.machine().tracer.on_call(&def.name, self.depth());

        let call_env = Env::enclosed(&function.env);
        if let Some((receiver, defining_class)) = method_bind {
            // Hidden bindings that let zero-argument `super()` recover the
            // defining class and the receiver.
            call_env.insert(Arc::from("__self__"), receiver);
            if let Some(class) = defining_class {
                call_env.insert(Arc::from("__class__"), Value::Class(class));
            }
        }

        let bind_result = bind_params(
            &def.name,
            &def.params,
            &function.defaults,
            def.var_args.as_ref(),
            def.var_kwargs.as_ref(),
            args,
            &call_env,
        );
        let result = match bind_result {
            Ok(()) => self.exec_block(&def.body, &call_env),
            Err(e) => Err(e.into()),
        };

        self.exit_frame();
        self.machine().tracer.on_return(&def.name, self.depth());
        finish_call(result, &def.name)
    }

    fn call_lambda(&self, lambda: &LambdaValue, args: CallArgs) -> RunResult<Value> {
        let def = &lambda.def;
        self.enter_frame().map_err(unwind_to_error)?;
        self.machine().tracer.on_call("<lambda>", self.depth());

        let call_env = Env::enclosed(&lambda.env);
        let bind_result = bind_params(
            "<lambda>",
            &def.params,
            &lambda.defaults,
            def.var_args.as_ref(),
            def.var_kwargs.as_ref(),
            args,
            &call_env,
        );
        let result = match bind_result {
            Ok(()) => self.eval_expr(&def.body, &call_env),
            Err(e) => Err(e.into()),
        };

        self.exit_frame();
        self.machine().tracer.on_return("<lambda>", self.depth());
        match result {
            Ok(value) => Ok(value),
            Err(Unwind::Raise(error)) => Err(error),
            Err(_) => Err(RunError::Exc(Exception::with_message(
                ExcType::RuntimeError,
                "invalid control flow in lambda",
            ))),
        }
    }

    /// Class call: a new instance, then `__init__` if the MRO defines one.
    fn construct_instance(&self, class: &Arc<Class>, args: CallArgs, env: &Arc<Env>, line: u32) -> RunResult<Value> {
        let instance = Arc::new(Instance {
            class: Arc::clone(class),
            fields: std::sync::RwLock::new(ahash::AHashMap::new()),
        });
        let receiver = Value::Instance(Arc::clone(&instance));
        if let Some((init, defining_class)) = class.lookup("__init__") {
            let mut init_args = CallArgs::new();
            init_args.push(receiver.clone());
            let (pos, kwargs) = args.into_parts();
            for value in pos {
                init_args.push(value);
            }
            for (name, value) in kwargs {
                init_args.push_kwarg(name, value);
            }
            match init {
                Value::Function(function) => {
                    self.call_function(&function, init_args, Some((receiver.clone(), Some(defining_class))))?;
                }
                other => {
                    self.call_value(&other, init_args, env, line)?;
                }
            }
        } else if !args.is_empty() {
            return Err(RunError::type_error(format!("{}() takes no arguments", class.name)));
        }
        Ok(receiver)
    }
}

fn unwind_to_error(unwind: Unwind) -> RunError {
    match unwind {
        Unwind::Raise(error) => error,
        _ => RunError::Exc(Exception::with_message(ExcType::RuntimeError, "invalid control flow")),
    }
}

/// Maps a function body's completion to its call result and tags escaping
/// exceptions with the function name.
fn finish_call(result: EvalResult, name: &str) -> RunResult<Value> {
    match result {
        Ok(_) => Ok(Value::None),
        Err(Unwind::Return(value)) => Ok(value),
        Err(Unwind::Raise(RunError::Exc(mut exc))) => {
            if exc.function.is_none() {
                exc.function = Some(name.to_owned());
            }
            Err(RunError::Exc(exc))
        }
        Err(Unwind::Raise(error)) => Err(error),
        Err(Unwind::Break) => Err(RunError::Exc(Exception::with_message(
            ExcType::RuntimeError,
            "'break' outside loop",
        ))),
        Err(Unwind::Continue) => Err(RunError::Exc(Exception::with_message(
            ExcType::RuntimeError,
            "'continue' not properly in loop",
        ))),
    }
}

/// Binds call arguments to declared parameters.
///
/// Positional arguments fill parameters left to right; extras go to
/// `*variadic` or raise. Keyword arguments route to declared names, with
/// duplicates and unknowns rejected unless `**kwargs` catches the
/// remainder. Declared defaults fill whatever is left.
pub(crate) fn bind_params(
    func_name: &str,
    params: &[Param],
    defaults: &[Value],
    var_args: Option<&Arc<str>>,
    var_kwargs: Option<&Arc<str>>,
    args: CallArgs,
    env: &Arc<Env>,
) -> RunResult<()> {
    let (pos, kwargs) = args.into_parts();
    let mut slots: Vec<Option<Value>> = Vec::with_capacity(params.len());
    slots.resize_with(params.len(), || None);

    let mut pos_iter = pos.into_iter();
    for slot in &mut slots {
        match pos_iter.next() {
            Some(value) => *slot = Some(value),
            None => break,
        }
    }
    let extra_pos: Vec<Value> = pos_iter.collect();
    if !extra_pos.is_empty() && var_args.is_none() {
        return Err(RunError::type_error(format!(
            "{func_name}() takes {} positional arguments but {} were given",
            params.len(),
            params.len() + extra_pos.len()
        )));
    }

    let mut kw_rest = Dict::new();
    for (name, value) in kwargs {
        match params.iter().position(|p| p.name == name) {
            Some(idx) => {
                if slots[idx].is_some() {
                    return Err(RunError::type_error(format!(
                        "{func_name}() got multiple values for argument '{name}'"
                    )));
                }
                slots[idx] = Some(value);
            }
            None => {
                if var_kwargs.is_some() {
                    kw_rest.insert(Value::Str(name), value)?;
                } else {
                    return Err(RunError::type_error(format!(
                        "{func_name}() got an unexpected keyword argument '{name}'"
                    )));
                }
            }
        }
    }

    // Defaults align with the tail of the parameter list.
    let default_start = params.len() - defaults.len();
    for (idx, (param, slot)) in params.iter().zip(slots).enumerate() {
        match slot {
            Some(value) => env.insert(Arc::clone(&param.name), value),
            None => {
                if idx >= default_start {
                    env.insert(Arc::clone(&param.name), defaults[idx - default_start].clone());
                } else {
                    return Err(RunError::type_error(format!(
                        "{func_name}() missing required argument: '{}'",
                        param.name
                    )));
                }
            }
        }
    }

    if let Some(name) = var_args {
        env.insert(Arc::clone(name), Value::tuple(extra_pos));
    }
    if let Some(name) = var_kwargs {
        env.insert(Arc::clone(name), Value::dict(kw_rest));
    }
    Ok(())
}
