//! Captured stdout/stdin plumbing.
//!
//! The host redirects script IO by installing implementations of these
//! traits on the interpreter. `print()` writes each formatted argument via
//! [`ScriptOutput::write_str`] and emits separators and the terminator via
//! [`ScriptOutput::push_char`], so writers never have to re-split output.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write as _};

use crate::exception::OpError;

/// Destination for `print()` output.
pub trait ScriptOutput: Send {
    /// Writes one formatted argument, without separators or terminator.
    fn write_str(&mut self, output: Cow<'_, str>) -> Result<(), OpError>;

    /// Writes a single separator or terminator character.
    fn push_char(&mut self, c: char) -> Result<(), OpError>;
}

/// Default output: the process stdout.
#[derive(Debug, Default)]
pub struct StdOutput;

impl ScriptOutput for StdOutput {
    fn write_str(&mut self, output: Cow<'_, str>) -> Result<(), OpError> {
        io::stdout()
            .write_all(output.as_bytes())
            .map_err(|e| OpError::new(format!("stdout write failed: {e}")))
    }

    fn push_char(&mut self, c: char) -> Result<(), OpError> {
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf);
        io::stdout()
            .write_all(encoded.as_bytes())
            .and_then(|()| if c == '\n' { io::stdout().flush() } else { Ok(()) })
            .map_err(|e| OpError::new(format!("stdout write failed: {e}")))
    }
}

/// Output writer that collects everything into a string.
///
/// Useful for testing and for hosts that capture script output
/// programmatically.
#[derive(Debug, Default)]
pub struct CollectStringOutput(String);

impl CollectStringOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl ScriptOutput for CollectStringOutput {
    fn write_str(&mut self, output: Cow<'_, str>) -> Result<(), OpError> {
        self.0.push_str(&output);
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<(), OpError> {
        self.0.push(c);
        Ok(())
    }
}

/// Output writer that discards everything.
#[derive(Debug, Default)]
pub struct NoOutput;

impl ScriptOutput for NoOutput {
    fn write_str(&mut self, _output: Cow<'_, str>) -> Result<(), OpError> {
        Ok(())
    }

    fn push_char(&mut self, _c: char) -> Result<(), OpError> {
        Ok(())
    }
}

/// Source for `input()`.
pub trait ScriptInput: Send {
    /// Reads one line, without the trailing newline.
    fn read_line(&mut self) -> Result<String, OpError>;
}

/// Default input: the process stdin.
#[derive(Debug, Default)]
pub struct StdInput;

impl ScriptInput for StdInput {
    fn read_line(&mut self) -> Result<String, OpError> {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| OpError::new(format!("stdin read failed: {e}")))?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}

/// Input that pops pre-queued lines; reading past the queue is an error.
#[derive(Debug, Default)]
pub struct QueueInput(VecDeque<String>);

impl QueueInput {
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(lines.into_iter().map(Into::into).collect())
    }
}

impl ScriptInput for QueueInput {
    fn read_line(&mut self) -> Result<String, OpError> {
        self.0
            .pop_front()
            .ok_or_else(|| OpError::new("input queue exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_output_accumulates() {
        let mut out = CollectStringOutput::new();
        out.write_str("a".into()).unwrap();
        out.push_char(' ').unwrap();
        out.write_str("b".into()).unwrap();
        out.push_char('\n').unwrap();
        assert_eq!(out.output(), "a b\n");
    }

    #[test]
    fn queue_input_pops_then_errors() {
        let mut input = QueueInput::new(["one", "two"]);
        assert_eq!(input.read_line().unwrap(), "one");
        assert_eq!(input.read_line().unwrap(), "two");
        assert!(input.read_line().is_err());
    }
}
