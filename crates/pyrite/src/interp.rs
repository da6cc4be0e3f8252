//! Public interface for embedding the interpreter.
//!
//! An [`Interpreter`] owns one global environment with the builtins
//! installed. `eval` parses and runs a complete script in that environment,
//! so state persists across calls. Hosts attach importable libraries, typed
//! native functions and classes, redirect the captured streams, and resolve
//! imports on demand.

use std::sync::{Arc, Mutex, RwLock};

use ahash::AHashMap;

use crate::bridge::library::Library;
use crate::bridge::{CancelToken, IntoNativeFn, NativeFunction};
use crate::builtins;
use crate::env::{Env, ImportResolver};
use crate::eval::{Evaluator, Machine};
use crate::exception::{EvalError, ExcType, Exception, RunError, Unwind};
use crate::io::{ScriptInput, ScriptOutput, StdInput, StdOutput};
use crate::parser::parse;
use crate::resource::ResourceLimits;
use crate::tracer::{EvalTracer, NoopTracer};
use crate::value::{read_lock, write_lock, Value};

/// An embeddable interpreter instance.
///
/// # Example
/// ```
/// use pyrite::Interpreter;
///
/// let interp = Interpreter::new();
/// let result = interp.eval("1 + 2").unwrap();
/// assert_eq!(result.py_repr(), "3");
/// ```
pub struct Interpreter {
    env: Arc<Env>,
    machine: Machine,
    libraries: Arc<RwLock<AHashMap<String, Arc<Library>>>>,
    user_import: Arc<RwLock<Option<Arc<ImportResolver>>>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with the builtins installed and the process
    /// streams attached.
    #[must_use]
    pub fn new() -> Self {
        let env = Env::new_root();
        builtins::install(&env);
        env.set_stdout(Arc::new(Mutex::new(StdOutput)));
        env.set_stdin(Arc::new(Mutex::new(StdInput)));

        let libraries: Arc<RwLock<AHashMap<String, Arc<Library>>>> = Arc::new(RwLock::new(AHashMap::new()));
        let user_import: Arc<RwLock<Option<Arc<ImportResolver>>>> = Arc::new(RwLock::new(None));

        let resolver = {
            let libraries = Arc::clone(&libraries);
            let user_import = Arc::clone(&user_import);
            move |name: &str| -> Option<Arc<Library>> {
                if let Some(library) = read_lock(&libraries).get(name) {
                    return Some(Arc::clone(library));
                }
                let callback = read_lock(&user_import).clone()?;
                let library = callback(name)?;
                // Cache host-resolved libraries so repeated imports are
                // stable and identity-equal.
                write_lock(&libraries).insert(name.to_owned(), Arc::clone(&library));
                Some(library)
            }
        };
        env.set_import_resolver(Arc::new(resolver));
        let enumerator = {
            let libraries = Arc::clone(&libraries);
            move || -> Vec<String> {
                let mut names: Vec<String> = read_lock(&libraries).keys().cloned().collect();
                names.sort();
                names
            }
        };
        env.set_library_enumerator(Arc::new(enumerator));

        Self {
            env,
            machine: Machine {
                limits: ResourceLimits::default(),
                tracer: Arc::new(NoopTracer),
                cancel: CancelToken::new(),
            },
            libraries,
            user_import,
        }
    }

    /// Replaces the execution limits.
    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.machine.limits = limits;
    }

    /// Installs an execution tracer.
    pub fn set_tracer(&mut self, tracer: impl EvalTracer + 'static) {
        self.machine.tracer = Arc::new(tracer);
    }

    /// The cancellation token natives observe through their context handle.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.machine.cancel.clone()
    }

    /// Parses and runs a complete script in the interpreter's environment.
    ///
    /// Returns the value of the script's last expression statement (`None`
    /// when the script ends with any other statement). Uncaught exceptions,
    /// recoverable errors, and syntax errors surface as [`EvalError`];
    /// `SystemExit` carries its exit code.
    pub fn eval(&self, source: &str) -> Result<Value, EvalError> {
        let stmts = parse(source).map_err(EvalError::Parse)?;
        let evaluator = Evaluator::new(&self.machine);
        match evaluator.exec_block(&stmts, &self.env) {
            Ok(value) => Ok(value),
            Err(Unwind::Raise(RunError::Error(e))) => Err(EvalError::Error(e)),
            Err(Unwind::Raise(RunError::Exc(e))) => Err(EvalError::Exception(e)),
            Err(Unwind::Return(_)) => Err(EvalError::Exception(Exception::with_message(
                ExcType::RuntimeError,
                "'return' outside function",
            ))),
            Err(Unwind::Break | Unwind::Continue) => Err(EvalError::Exception(Exception::with_message(
                ExcType::RuntimeError,
                "'break' or 'continue' outside loop",
            ))),
        }
    }

    /// Attaches an importable library by its name.
    pub fn register_library(&self, library: Arc<Library>) {
        write_lock(&self.libraries).insert(library.name().to_owned(), library);
    }

    /// Binds a typed native function as a global.
    pub fn register_func<M>(&self, name: &str, f: impl IntoNativeFn<M>) {
        self.env
            .insert(Arc::from(name), Value::Builtin(Arc::new(NativeFunction::new(name, f))));
    }

    /// Binds a pre-built native function (e.g. one carrying a docstring).
    pub fn register_native(&self, function: NativeFunction) {
        let name: Arc<str> = Arc::from(function.name());
        self.env.insert(name, Value::Builtin(Arc::new(function)));
    }

    /// Binds a native class as a global. The class is a library with a
    /// constructor: calling it yields an instantiated library whose methods
    /// receive the constructed instance data through their context handle.
    pub fn register_class(&self, class: Arc<Library>) {
        self.env
            .insert(Arc::from(class.name()), Value::Library(class));
    }

    /// Binds an arbitrary global value.
    pub fn register_value(&self, name: &str, value: impl crate::bridge::convert::IntoScript) {
        self.env.insert(Arc::from(name), value.into_script());
    }

    /// Redirects `print` output.
    pub fn set_stdout(&self, writer: impl ScriptOutput + 'static) {
        self.env.set_stdout(Arc::new(Mutex::new(writer)));
    }

    /// Redirects `input()`.
    pub fn set_stdin(&self, reader: impl ScriptInput + 'static) {
        self.env.set_stdin(Arc::new(Mutex::new(reader)));
    }

    /// Lets the host resolve module names on demand; consulted after the
    /// registered libraries, and successful resolutions are cached.
    pub fn set_import_callback(&self, f: impl Fn(&str) -> Option<Arc<Library>> + Send + Sync + 'static) {
        *write_lock(&self.user_import) = Some(Arc::new(f));
    }

    /// Reads a global binding from the interpreter environment.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringOutput;

    #[test]
    fn eval_returns_last_expression() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval("1 + 2").unwrap().py_repr(), "3");
    }

    #[test]
    fn state_persists_across_eval_calls() {
        let interp = Interpreter::new();
        interp.eval("x = 40").unwrap();
        assert_eq!(interp.eval("x + 2").unwrap().py_repr(), "42");
    }

    #[test]
    fn system_exit_surfaces_with_code() {
        let interp = Interpreter::new();
        interp.set_stdout(CollectStringOutput::new());
        let err = interp.eval("exit(3)").unwrap_err();
        assert_eq!(err.system_exit_code(), Some(3));
    }

    #[test]
    fn parse_errors_collected() {
        let interp = Interpreter::new();
        let Err(EvalError::Parse(errors)) = interp.eval("x = = 1\ny = ) 2\n") else {
            panic!("expected parse errors");
        };
        assert!(errors.len() >= 2);
    }
}
