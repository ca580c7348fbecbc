//! Source location tracking for error reporting.
//!
//! # Design
//!
//! - `Loc` — a 1-based (line, column) position in the checked file
//! - `LineMap` — newline index over the source text, converting the lexer's
//!   byte offsets into `Loc`s
//!
//! Columns count characters rather than bytes, so positions in lines with
//! multi-byte text still advance one column per character.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the source file.
///
/// Both `line` and `col` are 1-based. Lines advance only on newline
/// characters; columns reset at each newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub col: u32,
}

impl Loc {
    /// Create a new location.
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// The location of the first character of a file.
    pub fn start() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Line index over a source text.
///
/// Holds the byte offsets of each line start so that a byte offset from the
/// lexer can be converted to a [`Loc`] with a binary search.
pub struct LineMap<'src> {
    source: &'src str,
    /// Byte offsets of each line start.
    ///
    /// `line_starts[0]` is always 0; the final entry is an EOF sentinel.
    line_starts: Vec<usize>,
}

impl<'src> LineMap<'src> {
    /// Index the given source text.
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        for (idx, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        if line_starts.last() != Some(&source.len()) {
            line_starts.push(source.len());
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Convert a byte offset into a 1-based (line, column) location.
    ///
    /// # Panics
    /// Panics if `offset` is beyond the end of the source.
    pub fn loc(&self, offset: usize) -> Loc {
        assert!(
            offset <= self.source.len(),
            "offset {} is beyond EOF (len = {})",
            offset,
            self.source.len()
        );

        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };

        let line_start = self.line_starts[line_idx];
        let col = self.source[line_start..offset].chars().count() + 1;

        Loc::new((line_idx + 1) as u32, col as u32)
    }

    /// The location just past the last character of the source.
    pub fn eof_loc(&self) -> Loc {
        self.loc(self.source.len())
    }
}
