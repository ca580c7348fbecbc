//! Diagnostics reported by the checker.
//!
//! A diagnostic targets one source location and is independent of every
//! other diagnostic: nothing is suppressed or cascaded, except that a parse
//! failure halts the pipeline with exactly one diagnostic.
//!
//! The wire format, one diagnostic per line:
//!
//! ```text
//! <file>:<line>:<col>: <message>[ (did you mean '<suggestion>'?)]
//! ```

use crate::loc::Loc;
use std::fmt;

/// A single reportable issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File name as handed to the checker; never opened or interpreted
    pub file: String,
    /// 1-based position in the source
    pub loc: Loc,
    /// Human-readable message
    pub message: String,
    /// A single candidate name, when a close match exists
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic without a suggestion.
    pub fn new(file: impl Into<String>, loc: Loc, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            loc,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a "did you mean" candidate.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file, self.loc.line, self.loc.col, self.message
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Format diagnostics one per line, in emission order.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
