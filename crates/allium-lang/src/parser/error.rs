//! Parse error type.

use crate::error::Diagnostic;
use crate::lexer::Token;
use crate::loc::Loc;
use std::fmt;

/// Parse error with source location and context.
///
/// At most one of these is produced per run: the first syntactic error
/// aborts parsing and no semantic checks follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Source location where the error occurred
    pub loc: Loc,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token (found X, expected Y)
    UnexpectedToken,
    /// Unexpected end of input
    UnexpectedEof,
    /// Invalid syntax
    InvalidSyntax,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: &Token, found: Option<&Token>, loc: Loc) -> Self {
        let message = match found {
            Some(token) => format!("expected '{}', found '{}'", expected, token),
            None => format!("expected '{}', found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            loc,
            message,
        }
    }

    /// Create an "expected <thing>" error for a named grammar element.
    pub fn expected(what: &str, found: Option<&Token>, loc: Loc) -> Self {
        let message = match found {
            Some(token) => format!("expected {}, found '{}'", what, token),
            None => format!("expected {}, found end of input", what),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            loc,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, loc: Loc) -> Self {
        let message = match found {
            Some(token) => format!("unexpected '{}' {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            loc,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, loc: Loc) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            loc,
            message: message.into(),
        }
    }

    /// Convert into the pipeline's diagnostic form.
    pub fn into_diagnostic(self, file: &str) -> Diagnostic {
        Diagnostic::new(file, self.loc, format!("syntax error: {}", self.message))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.loc)
    }
}

impl std::error::Error for ParseError {}
