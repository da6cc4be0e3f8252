//! Closure-to-native-function wrapping.
//!
//! [`IntoNativeFn`] is implemented for host closures of every accepted
//! parameter shape, in order: an optional leading `&NativeContext`, an
//! optional [`Kwargs`] container, typed positional parameters, and an
//! optional trailing [`Variadic`]. Each shape/arity pair is generated by
//! macro and monomorphised, so argument marshalling compiles to direct
//! conversions with no per-call signature analysis.
//!
//! Return values map back through [`IntoScriptResult`]: plain values convert
//! via `IntoScript`, `Result<T, E>` surfaces `Err` as a recoverable `Error`
//! value carrying the error's message.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use smallvec::SmallVec;

use super::{CallArgs, NativeContext, RawNativeFn};
use crate::bridge::convert::{FromScript, IntoScript};
use crate::exception::{OpError, RunResult};
use crate::value::Value;

/// Declared keyword-argument container: receives every keyword argument the
/// caller passed.
#[derive(Debug, Default)]
pub struct Kwargs(pub HashMap<String, Value>);

impl Kwargs {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

/// Declared trailing variadic parameter: collects the remaining positional
/// arguments, each converted to `T`.
#[derive(Debug)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> IntoIterator for Variadic<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> std::ops::Deref for Variadic<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Return-value mapping for native functions.
pub trait IntoScriptResult {
    fn into_script_result(self) -> RunResult<Value>;
}

macro_rules! impl_into_script_result {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoScriptResult for $ty {
                fn into_script_result(self) -> RunResult<Value> {
                    Ok(self.into_script())
                }
            }
        )*
    };
}

impl_into_script_result!((), bool, i8, i16, i32, i64, u8, u16, u32, usize, f32, f64, String, Value);

impl IntoScriptResult for &'static str {
    fn into_script_result(self) -> RunResult<Value> {
        Ok(self.into_script())
    }
}

impl<T: IntoScript> IntoScriptResult for Option<T> {
    fn into_script_result(self) -> RunResult<Value> {
        Ok(self.into_script())
    }
}

impl<T: IntoScript> IntoScriptResult for Vec<T> {
    fn into_script_result(self) -> RunResult<Value> {
        Ok(self.into_script())
    }
}

impl<T: IntoScript> IntoScriptResult for HashMap<String, T> {
    fn into_script_result(self) -> RunResult<Value> {
        Ok(self.into_script())
    }
}

/// The two-value host convention: a non-null error yields an `Error` value
/// with the error's message.
impl<T: IntoScript, E: Display> IntoScriptResult for Result<T, E> {
    fn into_script_result(self) -> RunResult<Value> {
        match self {
            Ok(value) => Ok(value.into_script()),
            Err(e) => Err(OpError::new(e.to_string()).into()),
        }
    }
}

/// A host closure convertible into a native function implementation. The
/// marker type `M` encodes the accepted shape so the impls stay coherent.
pub trait IntoNativeFn<M>: Send + Sync + 'static {
    fn into_raw(self) -> Arc<RawNativeFn>;
}

/// Marker: shape includes a leading `&NativeContext`.
pub struct MarkerCtx;
/// Marker: shape includes a `Kwargs` container.
pub struct MarkerKwargs;
/// Marker: shape ends with a `Variadic` parameter.
pub struct MarkerVariadic;

fn reject_keywords(kwargs: &[(Arc<str>, Value)]) -> Result<(), OpError> {
    if let Some((key, _)) = kwargs.first() {
        return Err(OpError::new(format!(
            "argument error: unexpected keyword argument '{key}'"
        )));
    }
    Ok(())
}

fn expect_exact(pos: SmallVec<[Value; 4]>, want: usize) -> Result<SmallVec<[Value; 4]>, OpError> {
    if pos.len() == want {
        Ok(pos)
    } else {
        Err(OpError::argument_error(pos.len(), want))
    }
}

fn expect_at_least(pos: SmallVec<[Value; 4]>, want: usize) -> Result<SmallVec<[Value; 4]>, OpError> {
    if pos.len() >= want {
        Ok(pos)
    } else {
        Err(OpError::argument_error(pos.len(), want))
    }
}

fn kwargs_container(kwargs: Vec<(Arc<str>, Value)>) -> Kwargs {
    Kwargs(kwargs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn collect_variadic<T: FromScript>(tail: impl Iterator<Item = Value>) -> Result<Variadic<T>, OpError> {
    Ok(Variadic(tail.map(T::from_script).collect::<Result<Vec<_>, _>>()?))
}

macro_rules! impl_native_shapes {
    ($(($A:ident, $a:ident)),*) => {
        // f(a, b, ...)
        impl<Fun, R, $($A,)*> IntoNativeFn<(R, ($($A,)*))> for Fun
        where
            Fun: Fn($($A),*) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |_ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    reject_keywords(&kwargs)?;
                    let pos = expect_exact(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    self($($a),*).into_script_result()
                })
            }
        }

        // f(ctx, a, b, ...)
        impl<Fun, R, $($A,)*> IntoNativeFn<(MarkerCtx, R, ($($A,)*))> for Fun
        where
            Fun: for<'c> Fn(&NativeContext<'c>, $($A),*) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    reject_keywords(&kwargs)?;
                    let pos = expect_exact(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    self(ctx, $($a),*).into_script_result()
                })
            }
        }

        // f(kwargs, a, b, ...)
        impl<Fun, R, $($A,)*> IntoNativeFn<(MarkerKwargs, R, ($($A,)*))> for Fun
        where
            Fun: Fn(Kwargs, $($A),*) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |_ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    let pos = expect_exact(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    self(kwargs_container(kwargs), $($a),*).into_script_result()
                })
            }
        }

        // f(ctx, kwargs, a, b, ...)
        impl<Fun, R, $($A,)*> IntoNativeFn<(MarkerCtx, MarkerKwargs, R, ($($A,)*))> for Fun
        where
            Fun: for<'c> Fn(&NativeContext<'c>, Kwargs, $($A),*) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    let pos = expect_exact(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    self(ctx, kwargs_container(kwargs), $($a),*).into_script_result()
                })
            }
        }

        // f(a, b, ..., variadic)
        impl<Fun, R, T, $($A,)*> IntoNativeFn<(MarkerVariadic, R, T, ($($A,)*))> for Fun
        where
            Fun: Fn($($A,)* Variadic<T>) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            T: FromScript + 'static,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |_ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    reject_keywords(&kwargs)?;
                    let pos = expect_at_least(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    let rest = collect_variadic::<T>(values)?;
                    self($($a,)* rest).into_script_result()
                })
            }
        }

        // f(ctx, a, b, ..., variadic)
        impl<Fun, R, T, $($A,)*> IntoNativeFn<(MarkerCtx, MarkerVariadic, R, T, ($($A,)*))> for Fun
        where
            Fun: for<'c> Fn(&NativeContext<'c>, $($A,)* Variadic<T>) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            T: FromScript + 'static,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    reject_keywords(&kwargs)?;
                    let pos = expect_at_least(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    let rest = collect_variadic::<T>(values)?;
                    self(ctx, $($a,)* rest).into_script_result()
                })
            }
        }

        // f(kwargs, a, b, ..., variadic)
        impl<Fun, R, T, $($A,)*> IntoNativeFn<(MarkerKwargs, MarkerVariadic, R, T, ($($A,)*))> for Fun
        where
            Fun: Fn(Kwargs, $($A,)* Variadic<T>) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            T: FromScript + 'static,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |_ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    let pos = expect_at_least(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    let rest = collect_variadic::<T>(values)?;
                    self(kwargs_container(kwargs), $($a,)* rest).into_script_result()
                })
            }
        }

        // f(ctx, kwargs, a, b, ..., variadic)
        impl<Fun, R, T, $($A,)*> IntoNativeFn<(MarkerCtx, MarkerKwargs, MarkerVariadic, R, T, ($($A,)*))> for Fun
        where
            Fun: for<'c> Fn(&NativeContext<'c>, Kwargs, $($A,)* Variadic<T>) -> R + Send + Sync + 'static,
            R: IntoScriptResult,
            T: FromScript + 'static,
            $($A: FromScript + 'static,)*
        {
            fn into_raw(self) -> Arc<RawNativeFn> {
                Arc::new(move |ctx: &NativeContext<'_>, args: CallArgs| {
                    let (pos, kwargs) = args.into_parts();
                    let pos = expect_at_least(pos, 0 $(+ { let _ = stringify!($A); 1 })*)?;
                    #[allow(unused_mut, unused_variables)]
                    let mut values = pos.into_iter();
                    $(let $a = $A::from_script(values.next().expect("arity checked"))?;)*
                    let rest = collect_variadic::<T>(values)?;
                    self(ctx, kwargs_container(kwargs), $($a,)* rest).into_script_result()
                })
            }
        }
    };
}

impl_native_shapes!();
impl_native_shapes!((A1, a1));
impl_native_shapes!((A1, a1), (A2, a2));
impl_native_shapes!((A1, a1), (A2, a2), (A3, a3));
impl_native_shapes!((A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_native_shapes!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_native_shapes!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6));
