//! Execution limits.
//!
//! The evaluator checks the recursion limit at function-call entry, before
//! allocating the call environment, so runaway recursion fails fast with a
//! catchable `RecursionError` instead of exhausting the host stack.

use crate::exception::{ExcType, Exception, RunError, RunResult};

/// Default script recursion depth. Each script frame costs several host
/// stack frames in a tree-walking evaluator, so this sits well below
/// CPython's default.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 500;

/// Limits applied to one interpreter.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_recursion_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl ResourceLimits {
    pub(crate) fn check_recursion_depth(&self, depth: usize) -> RunResult<()> {
        if depth >= self.max_recursion_depth {
            return Err(RunError::Exc(Exception::with_message(
                ExcType::RecursionError,
                "maximum recursion depth exceeded",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_check_trips_at_limit() {
        let limits = ResourceLimits {
            max_recursion_depth: 3,
        };
        assert!(limits.check_recursion_depth(2).is_ok());
        assert!(limits.check_recursion_depth(3).is_err());
    }
}
