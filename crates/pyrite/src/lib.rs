#![doc = include_str!("../../../README.md")]

mod ast;
mod bridge;
mod builtins;
mod env;
mod eval;
mod exception;
mod fstring;
mod interp;
mod io;
mod iter;
mod key;
mod lexer;
mod methods;
mod parser;
mod resource;
mod token;
mod tracer;
mod value;

pub use crate::{
    bridge::{
        convert::{json_to_value, value_to_json, FromScript, IntoScript},
        library::{Library, LibraryBuilder},
        native_fn, CallArgs, CancelToken, IntoNativeFn, IntoScriptResult, Kwargs, NativeContext, NativeFunction,
        Variadic,
    },
    exception::{EvalError, ExcType, Exception, OpError, ParseError, RunError, RunResult},
    interp::Interpreter,
    io::{CollectStringOutput, NoOutput, QueueInput, ScriptInput, ScriptOutput, StdInput, StdOutput},
    resource::{ResourceLimits, DEFAULT_MAX_RECURSION_DEPTH},
    tracer::{EvalTracer, NoopTracer, StderrTracer},
    value::Value,
};
