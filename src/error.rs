//! Error Handling for the Tinycat BASIC Interpreter
//!
//! This module defines the error system used throughout the scanner, parser,
//! and runtime engine. It mirrors the error categories called out by the
//! language specification rather than the phase that happened to raise them:
//! the same `Var not found` mistake can surface while parsing a direct-mode
//! line or while running a stored program, and callers care about the
//! category, not which internal function detected it.
//!
//! ## Error Categories
//!
//! - **`Syntax`** — missing token, unknown statement, malformed construct.
//! - **`Name`** — unknown variable or function.
//! - **`Value`** — line number not in the program, bad `INPUT` field, zero `FOR` step.
//! - **`Runtime`** — stack underflow, bad argument count.
//! - **`Index`** — unclosed string literal.
//! - **`Io`** — `LOAD`/`SAVE` file errors.
//!
//! ## Reporting
//!
//! Errors carry only their message; the cursor column (and, inside `RUN`, the
//! failing line number) are attached at the point an error is caught, via
//! [`Reported`]. This keeps the parser and evaluator from having to thread
//! position information through every `Result`, while still letting the
//! engine boundary produce the "message in line N column C" reports the
//! specification requires.

use std::error::Error;
use std::fmt;

/// Comprehensive error type for all Tinycat BASIC operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicError {
    /// Missing token, unknown statement, or other malformed construct.
    Syntax(String),
    /// Reference to an undefined variable or function.
    Name(String),
    /// A value is well-formed syntactically but invalid semantically
    /// (unknown line number, unparseable `INPUT` field, zero `FOR` step).
    Value(String),
    /// Stack underflow, bad argument count, and other execution failures.
    Runtime(String),
    /// Index/bounds violation — currently only an unclosed string literal.
    Index(String),
    /// `LOAD`/`SAVE` file I/O failure.
    Io(String),
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BasicError::Syntax(msg) => write!(f, "Syntax error: {}", msg),
            BasicError::Name(msg) => write!(f, "{}", msg),
            BasicError::Value(msg) => write!(f, "{}", msg),
            BasicError::Runtime(msg) => write!(f, "{}", msg),
            BasicError::Index(msg) => write!(f, "{}", msg),
            BasicError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl Error for BasicError {}

impl From<std::io::Error> for BasicError {
    fn from(err: std::io::Error) -> Self {
        BasicError::Io(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BasicError>;

/// An error paired with the cursor position (and, when raised during `RUN`
/// or `CONTINUE`, the line number) at which it was caught.
///
/// The two display sites in the reference implementation — the top-level
/// `RUN`/`CONTINUE` loop and the REPL's direct-mode catch — differ only in
/// whether a line number is known, so both funnel through this one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Reported {
    pub error: BasicError,
    pub column: usize,
    pub line: Option<i64>,
}

impl Reported {
    pub fn new(error: BasicError, column: usize) -> Self {
        Self {
            error,
            column,
            line: None,
        }
    }

    pub fn with_line(error: BasicError, column: usize, line: i64) -> Self {
        Self {
            error,
            column,
            line: Some(line),
        }
    }
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} in line {} column {}", self.error, line, self.column),
            None => write!(f, "{} in column {}", self.error, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_without_line_omits_it() {
        let r = Reported::new(BasicError::Name("Var not found: foo".to_string()), 6);
        assert_eq!(r.to_string(), "Var not found: foo in column 6");
    }

    #[test]
    fn reported_with_line_includes_it() {
        let r = Reported::with_line(BasicError::Runtime("Stack underflow".to_string()), 3, 120);
        assert_eq!(r.to_string(), "Stack underflow in line 120 column 3");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.bas");
        let err: BasicError = io_err.into();
        assert!(matches!(err, BasicError::Io(_)));
    }
}
