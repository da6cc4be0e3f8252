//! Shared helpers for integration tests: an interpreter wired to a
//! readable output buffer.
#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use pyrite::{EvalError, Interpreter, OpError, ScriptOutput, Value};

/// Output writer backed by a shared buffer the test keeps a handle to.
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<String>>);

impl ScriptOutput for SharedBuffer {
    fn write_str(&mut self, output: Cow<'_, str>) -> Result<(), OpError> {
        self.0.lock().expect("buffer lock").push_str(&output);
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), OpError> {
        self.0.lock().expect("buffer lock").push(c);
        Ok(())
    }
}

/// Builds an interpreter with captured stdout.
pub fn capturing_interp() -> (Interpreter, SharedBuffer) {
    let interp = Interpreter::new();
    let buffer = SharedBuffer::default();
    interp.set_stdout(buffer.clone());
    (interp, buffer)
}

/// Runs a script, returning the result and whatever it printed.
pub fn eval_capture(source: &str) -> (Result<Value, EvalError>, String) {
    let (interp, buffer) = capturing_interp();
    let result = interp.eval(source);
    let output = buffer.0.lock().expect("buffer lock").clone();
    (result, output)
}

/// Runs a script that must succeed, returning its stdout.
#[track_caller]
pub fn stdout_of(source: &str) -> String {
    let (result, output) = eval_capture(source);
    if let Err(err) = result {
        panic!("script failed: {err}\noutput so far: {output}");
    }
    output
}

/// Runs a script that must succeed, returning its final expression value.
#[track_caller]
pub fn value_of(source: &str) -> Value {
    let (result, output) = eval_capture(source);
    match result {
        Ok(value) => value,
        Err(err) => panic!("script failed: {err}\noutput so far: {output}"),
    }
}

/// Runs a script that must fail, returning the error.
#[track_caller]
pub fn error_of(source: &str) -> EvalError {
    let (result, _) = eval_capture(source);
    match result {
        Ok(value) => panic!("script unexpectedly succeeded with {}", value.py_repr()),
        Err(err) => err,
    }
}
