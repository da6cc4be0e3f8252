//! Error channels of the interpreter.
//!
//! There are two runtime channels, both carried on the `Err` side of
//! [`RunResult`]:
//!
//! - [`OpError`]: recoverable operation failures raised by builtins and the
//!   native bridge (bad conversion, wrong argument count). Script code cannot
//!   catch these by type name; they surface out of `eval`.
//! - [`Exception`]: user-catchable exceptions with an [`ExcType`] tag,
//!   matched by `except` clauses via the subtype rules in
//!   [`ExcType::is_subclass_of`].
//!
//! Control flow inside the evaluator (`return`/`break`/`continue`) rides the
//! same error plumbing as [`Unwind`] sentinels so that every recursive call
//! propagates non-normal completion with `?`.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Exception types catchable by script code.
///
/// Uses strum derives so the string form matches the variant name exactly
/// (`ValueError` -> "ValueError"), both for display and for `except NAME`
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    /// Primary exception class; matches any catchable exception.
    Exception,
    /// Raised by `exit()` / `sys-exit` style termination; carries a code.
    SystemExit,
    /// Raised by natives when the host cancels execution.
    KeyboardInterrupt,
    ValueError,
    TypeError,
    NameError,
    AttributeError,
    KeyError,
    IndexError,
    ZeroDivisionError,
    StopIteration,
    AssertionError,
    ImportError,
    RuntimeError,
    /// Subclass of RuntimeError raised when the recursion limit is exceeded.
    RecursionError,
}

impl ExcType {
    /// Returns true if `self` would be caught by `except handler_type:`.
    ///
    /// `Exception` catches everything except `SystemExit` and
    /// `KeyboardInterrupt`, which unwind to the host unless named explicitly;
    /// `RuntimeError` additionally catches `RecursionError`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::Exception => !matches!(self, Self::SystemExit | Self::KeyboardInterrupt),
            Self::RuntimeError => matches!(self, Self::RecursionError),
            _ => false,
        }
    }
}

/// A raised exception value.
///
/// Carries the type tag, an optional message, the source line where it was
/// raised (filled in by the evaluator as it unwinds), the name of the
/// function that raised (when known), and for `SystemExit` the exit code.
#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
    pub exc_type: ExcType,
    pub message: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    pub exit_code: Option<i32>,
}

impl Exception {
    #[must_use]
    pub fn new(exc_type: ExcType) -> Self {
        Self {
            exc_type,
            message: None,
            line: None,
            function: None,
            exit_code: None,
        }
    }

    #[must_use]
    pub fn with_message(exc_type: ExcType, message: impl Into<String>) -> Self {
        Self {
            exc_type,
            message: Some(message.into()),
            line: None,
            function: None,
            exit_code: None,
        }
    }

    /// Builds a `SystemExit` carrying the given exit code.
    #[must_use]
    pub fn system_exit(code: i32) -> Self {
        Self {
            exc_type: ExcType::SystemExit,
            message: None,
            line: None,
            function: None,
            exit_code: Some(code),
        }
    }

    /// The exit code to surface to the host; `SystemExit` without an explicit
    /// code exits 0.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(0)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exc_type)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(line) = self.line {
            write!(f, " (line {line}")?;
            if let Some(function) = &self.function {
                write!(f, ", in {function}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// A recoverable operation failure.
///
/// Propagates exactly like an exception but with a distinct tag: script code
/// cannot `except` it, so it always surfaces out of `eval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpError {
    pub message: String,
}

impl OpError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Standardized conversion-failure message used by the native bridge.
    #[must_use]
    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(format!("type error: expected {expected}, got {got}"))
    }

    /// Standardized argument-count message used by the native bridge.
    #[must_use]
    pub fn argument_error(got: usize, want: usize) -> Self {
        Self::new(format!("argument error: got {got}, want {want}"))
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

/// Union of the two runtime error channels.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    Error(OpError),
    Exc(Exception),
}

impl RunError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::TypeError, message))
    }

    pub(crate) fn value_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::ValueError, message))
    }

    pub(crate) fn name_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::NameError, message))
    }

    pub(crate) fn attribute_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::AttributeError, message))
    }

    pub(crate) fn key_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::KeyError, message))
    }

    pub(crate) fn index_error(message: impl Into<String>) -> Self {
        Self::Exc(Exception::with_message(ExcType::IndexError, message))
    }

    pub(crate) fn stop_iteration() -> Self {
        Self::Exc(Exception::new(ExcType::StopIteration))
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => e.fmt(f),
            Self::Exc(e) => e.fmt(f),
        }
    }
}

impl From<OpError> for RunError {
    fn from(e: OpError) -> Self {
        Self::Error(e)
    }
}

impl From<Exception> for RunError {
    fn from(e: Exception) -> Self {
        Self::Exc(e)
    }
}

/// Non-normal completion of a statement or expression.
///
/// `Return`/`Break`/`Continue` are unwrapped by the construct that defines
/// them; `Raise` propagates until a `try` handles it or it reaches the host.
#[derive(Debug)]
pub(crate) enum Unwind {
    Return(crate::value::Value),
    Break,
    Continue,
    Raise(RunError),
}

impl Unwind {
    /// Fills in the source line on a raised exception that doesn't carry one
    /// yet, so the innermost statement wins.
    pub(crate) fn with_line(self, line: u32) -> Self {
        match self {
            Self::Raise(RunError::Exc(mut exc)) => {
                if exc.line.is_none() {
                    exc.line = Some(line);
                }
                Self::Raise(RunError::Exc(exc))
            }
            other => other,
        }
    }
}

impl From<RunError> for Unwind {
    fn from(e: RunError) -> Self {
        Self::Raise(e)
    }
}

impl From<OpError> for Unwind {
    fn from(e: OpError) -> Self {
        Self::Raise(RunError::Error(e))
    }
}

impl From<Exception> for Unwind {
    fn from(e: Exception) -> Self {
        Self::Raise(RunError::Exc(e))
    }
}

/// A syntax error with the line it occurred on.
///
/// The parser accumulates these and reports them all, so a script with
/// several mistakes gets several messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error: {} (line {})", self.message, self.line)
    }
}

/// Error surface of [`Interpreter::eval`](crate::Interpreter::eval).
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// One or more syntax errors; nothing was executed.
    Parse(Vec<ParseError>),
    /// A recoverable operation failure surfaced uncaught.
    Error(OpError),
    /// An uncaught exception, including `SystemExit` with its exit code.
    Exception(Exception),
}

impl EvalError {
    /// The exit code carried by an uncaught `SystemExit`, if that is what
    /// this error is.
    #[must_use]
    pub fn system_exit_code(&self) -> Option<i32> {
        match self {
            Self::Exception(exc) if exc.exc_type == ExcType::SystemExit => Some(exc.exit_code()),
            _ => None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    err.fmt(f)?;
                }
                Ok(())
            }
            Self::Error(e) => e.fmt(f),
            Self::Exception(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EvalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclass_rules() {
        assert!(ExcType::ValueError.is_subclass_of(ExcType::Exception));
        assert!(ExcType::RecursionError.is_subclass_of(ExcType::RuntimeError));
        assert!(ExcType::RecursionError.is_subclass_of(ExcType::Exception));
        assert!(!ExcType::SystemExit.is_subclass_of(ExcType::Exception));
        assert!(!ExcType::ValueError.is_subclass_of(ExcType::TypeError));
    }

    #[test]
    fn exc_type_round_trips_through_strings() {
        assert_eq!("ValueError".parse::<ExcType>().unwrap(), ExcType::ValueError);
        assert_eq!(ExcType::ZeroDivisionError.to_string(), "ZeroDivisionError");
    }

    #[test]
    fn system_exit_code_defaults_to_zero() {
        assert_eq!(Exception::new(ExcType::SystemExit).exit_code(), 0);
        assert_eq!(Exception::system_exit(3).exit_code(), 3);
    }
}
