//! Execution tracing hooks.
//!
//! Trait-based with a zero-cost no-op default: the hooks are inlined empty
//! methods, so an interpreter running with [`NoopTracer`] pays nothing.
//! [`StderrTracer`] gives a human-readable execution log for debugging
//! embedded scripts.

use crate::exception::RunError;

/// Hook points at key evaluator events.
///
/// Implementations must be `Send + Sync`: the host may run several
/// environments on different threads against one shared tracer.
pub trait EvalTracer: Send + Sync {
    /// A statement is about to execute.
    fn on_statement(&self, line: u32) {
        let _ = line;
    }

    /// A script function call pushed a frame.
    fn on_call(&self, name: &str, depth: usize) {
        let _ = (name, depth);
    }

    /// A script function call popped its frame.
    fn on_return(&self, name: &str, depth: usize) {
        let _ = (name, depth);
    }

    /// An error or exception started unwinding.
    fn on_raise(&self, error: &RunError) {
        let _ = error;
    }
}

/// Production default: does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Logs every hook to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_statement(&self, line: u32) {
        eprintln!("trace: line {line}");
    }

    fn on_call(&self, name: &str, depth: usize) {
        eprintln!("trace: {:indent$}call {name}", "", indent = depth * 2);
    }

    fn on_return(&self, name: &str, depth: usize) {
        eprintln!("trace: {:indent$}return from {name}", "", indent = depth * 2);
    }

    fn on_raise(&self, error: &RunError) {
        eprintln!("trace: raise {error}");
    }
}
