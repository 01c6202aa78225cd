//! Interpreter Errors
//!
//! Two error kinds are visible during execution: syntax errors surfaced
//! by argument resolution (bad subscripts, empty concatenation sides,
//! malformed redirection targets), and runtime failures from the fd and
//! process layer. Neither unwinds past the interpreter: each statement
//! is evaluated independently, failures are reported and folded into
//! `$status`.

use thiserror::Error;

/// An error raised while executing a single command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Malformed construct discovered at resolution time.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// open/dup2/spawn and similar operational failures.
    #[error("{0}")]
    Runtime(String),
}

impl ExecError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        Self::Runtime(err.to_string())
    }
}

impl From<nix::Error> for ExecError {
    fn from(err: nix::Error) -> Self {
        Self::Runtime(err.to_string())
    }
}
