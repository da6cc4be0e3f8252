//! Native interop bridge.
//!
//! Host functions become first-class script callables here. A host closure
//! of any supported shape (optional [`NativeContext`] first parameter,
//! optional [`Kwargs`] container, typed positional parameters, optional
//! trailing [`Variadic`]) is wrapped into a [`NativeFunction`] whose
//! marshalling is monomorphised at compile time, the static-dispatch
//! equivalent of a reflection-driven signature cache.

pub mod convert;
pub mod library;
mod wrap;

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use smallvec::SmallVec;

use crate::env::Env;
use crate::eval::Evaluator;
use crate::exception::{ExcType, Exception, OpError, RunError, RunResult};
use crate::value::Value;

pub use wrap::{IntoNativeFn, IntoScriptResult, Kwargs, Variadic};

use library::Library;

/// Cooperative cancellation flag shared between host and natives.
///
/// The evaluator itself never blocks; natives doing IO are expected to poll
/// [`NativeContext::check_cancelled`] and return promptly once set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Arguments at a native call site: positional values plus keyword pairs.
///
/// Small positional counts stay inline; most calls pass at most four
/// arguments.
#[derive(Debug, Default)]
pub struct CallArgs {
    pos: SmallVec<[Value; 4]>,
    kwargs: Vec<(Arc<str>, Value)>,
}

impl CallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            pos: SmallVec::from_vec(args),
            kwargs: Vec::new(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.pos.push(value);
    }

    pub fn push_kwarg(&mut self, name: Arc<str>, value: Value) {
        self.kwargs.push((name, value));
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.pos
    }

    #[must_use]
    pub fn kwargs(&self) -> &[(Arc<str>, Value)] {
        &self.kwargs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty() && self.kwargs.is_empty()
    }

    pub(crate) fn into_parts(self) -> (SmallVec<[Value; 4]>, Vec<(Arc<str>, Value)>) {
        (self.pos, self.kwargs)
    }

    /// Rejects keyword arguments for callables that take none.
    pub(crate) fn reject_kwargs(&self, name: &str) -> RunResult<()> {
        if let Some((key, _)) = self.kwargs.first() {
            return Err(RunError::type_error(format!(
                "{name}() got an unexpected keyword argument '{key}'"
            )));
        }
        Ok(())
    }

    /// Exactly zero positional arguments.
    pub(crate) fn expect_zero(self, name: &str) -> RunResult<()> {
        self.reject_kwargs(name)?;
        if self.pos.is_empty() {
            Ok(())
        } else {
            Err(RunError::type_error(format!(
                "{name}() takes no arguments ({} given)",
                self.pos.len()
            )))
        }
    }

    /// Exactly one positional argument.
    pub(crate) fn expect_one(self, name: &str) -> RunResult<Value> {
        self.reject_kwargs(name)?;
        let mut pos = self.pos;
        if pos.len() == 1 {
            Ok(pos.remove(0))
        } else {
            Err(RunError::type_error(format!(
                "{name}() takes exactly one argument ({} given)",
                pos.len()
            )))
        }
    }

    /// Exactly two positional arguments.
    pub(crate) fn expect_two(self, name: &str) -> RunResult<(Value, Value)> {
        self.reject_kwargs(name)?;
        let mut pos = self.pos;
        if pos.len() == 2 {
            let b = pos.remove(1);
            let a = pos.remove(0);
            Ok((a, b))
        } else {
            Err(RunError::type_error(format!(
                "{name}() takes exactly 2 arguments ({} given)",
                pos.len()
            )))
        }
    }

    /// One required and one optional positional argument.
    pub(crate) fn expect_one_or_two(self, name: &str) -> RunResult<(Value, Option<Value>)> {
        self.reject_kwargs(name)?;
        let mut pos = self.pos;
        match pos.len() {
            1 => Ok((pos.remove(0), None)),
            2 => {
                let b = pos.remove(1);
                let a = pos.remove(0);
                Ok((a, Some(b)))
            }
            n => Err(RunError::type_error(format!(
                "{name}() takes 1 or 2 arguments ({n} given)"
            ))),
        }
    }

    /// Up to `max` positional arguments, returned in order.
    pub(crate) fn expect_at_most(self, name: &str, max: usize) -> RunResult<Vec<Value>> {
        self.reject_kwargs(name)?;
        if self.pos.len() > max {
            return Err(RunError::type_error(format!(
                "{name}() takes at most {max} arguments ({} given)",
                self.pos.len()
            )));
        }
        Ok(self.pos.into_vec())
    }
}

/// Context handle passed to native functions.
///
/// Carries cancellation, the captured environment of the call site (for IO),
/// per-library instance data, and a way to call back into script callables.
pub struct NativeContext<'a> {
    pub(crate) evaluator: &'a Evaluator<'a>,
    pub(crate) env: &'a Arc<Env>,
    pub(crate) library: Option<Arc<Library>>,
}

impl NativeContext<'_> {
    /// True once the host has requested cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.evaluator.cancel_token().is_cancelled()
    }

    /// Raises `KeyboardInterrupt` if the host has requested cancellation.
    pub fn check_cancelled(&self) -> RunResult<()> {
        if self.is_cancelled() {
            Err(RunError::Exc(Exception::with_message(
                ExcType::KeyboardInterrupt,
                "execution cancelled",
            )))
        } else {
            Ok(())
        }
    }

    /// The raw instance data attached to this function's library, if any.
    #[must_use]
    pub fn instance_data(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.library.as_ref().and_then(|lib| lib.instance_data())
    }

    /// Downcast helper for [`Self::instance_data`].
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance_data().and_then(|data| data.downcast::<T>().ok())
    }

    /// Calls back into any script callable (function, lambda, class, bound
    /// method), e.g. for `sorted(key=...)`-style natives.
    pub fn call(&self, callable: &Value, args: Vec<Value>) -> RunResult<Value> {
        self.evaluator
            .call_value(callable, CallArgs::positional(args), self.env, 0)
    }

    pub(crate) fn env(&self) -> &Arc<Env> {
        self.env
    }

    pub(crate) fn evaluator(&self) -> &Evaluator<'_> {
        self.evaluator
    }
}

/// Implementation closure of a native function.
pub type RawNativeFn = dyn Fn(&NativeContext<'_>, CallArgs) -> RunResult<Value> + Send + Sync;

/// Constructor closure of a native class: produces the instance data the
/// methods later receive through the context handle.
pub type NativeCtor = dyn Fn(&NativeContext<'_>, CallArgs) -> Result<Arc<dyn Any + Send + Sync>, OpError> + Send + Sync;

/// A host function wrapped as a first-class script callable.
pub struct NativeFunction {
    name: String,
    doc: Option<String>,
    /// The library the function is attached to, if any; instance data flows
    /// from it into the context handle at call time.
    owner: RwLock<Weak<Library>>,
    f: Arc<RawNativeFn>,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

impl NativeFunction {
    /// Wraps a typed host closure; the parameter shape is checked and
    /// marshalled per the bridge conversion table.
    pub fn new<M>(name: impl Into<String>, f: impl IntoNativeFn<M>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            owner: RwLock::new(Weak::new()),
            f: f.into_raw(),
        }
    }

    /// Wraps an already-raw closure, for natives that want the full
    /// [`CallArgs`] surface (e.g. `print`).
    pub fn from_raw(name: impl Into<String>, f: impl Fn(&NativeContext<'_>, CallArgs) -> RunResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            doc: None,
            owner: RwLock::new(Weak::new()),
            f: Arc::new(f),
        }
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub(crate) fn bind_owner(&self, library: &Arc<Library>) {
        *crate::value::write_lock(&self.owner) = Arc::downgrade(library);
    }

    /// Clone sharing the implementation but with a fresh owner slot, used
    /// when instantiating a library with instance data.
    pub(crate) fn shell_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            doc: self.doc.clone(),
            owner: RwLock::new(Weak::new()),
            f: Arc::clone(&self.f),
        }
    }

    pub(crate) fn invoke(&self, evaluator: &Evaluator<'_>, env: &Arc<Env>, args: CallArgs) -> RunResult<Value> {
        let ctx = NativeContext {
            evaluator,
            env,
            library: crate::value::read_lock(&self.owner).upgrade(),
        };
        (self.f)(&ctx, args)
    }
}

/// Convenience constructor mirroring the builder-style registration the
/// embedder API uses: `native_fn("clamp", |x: i64| x.max(0))`.
pub fn native_fn<M>(name: &str, f: impl IntoNativeFn<M>) -> NativeFunction {
    NativeFunction::new(name, f)
}
