//! Parser Types
//!
//! Shared error type used by the lexer-facing and parser-facing entry
//! points. One error kind covers every malformed construct; callers that
//! need to keep going (the interactive loop, config loading) report it
//! and move on.

use std::fmt;
use thiserror::Error;

/// Error produced for any malformed construct in the source.
#[derive(Debug, Clone, Error)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}:{}: {}", self.line, self.column, self.message)
    }
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    /// Build an error pointing at a byte offset, computing the 1-based
    /// line and column from the source.
    pub fn at_offset(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for b in source.as_bytes().iter().take(offset) {
            if *b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self::new(message, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_column() {
        let src = "ab\ncd\nef";
        let err = SyntaxError::at_offset("boom", src, 4);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 2);
        assert_eq!(err.to_string(), "syntax error at 2:2: boom");
    }
}
