//! # Allium semantic checker
//!
//! Static analysis pipeline for the Allium specification language: a
//! declarative DSL describing software behaviour in terms of entities,
//! relationships, and rules.
//!
//! ## Architecture
//!
//! ```text
//! source text
//!     ↓
//! lexer      - logos tokenization with source locations
//!     ↓
//! parser     - hand-written recursive descent → AlliumFile
//!     ↓
//! symbols    - declared types, members, defaults, and rules
//!     ↓
//! check      - reference pass, then enum pass
//!     ↓
//! Vec<Diagnostic>
//! ```
//!
//! A syntactic error halts the pipeline with exactly one diagnostic. Once
//! parsing succeeds, both semantic passes run to completion and their
//! diagnostics are concatenated (references before enums), each carrying a
//! 1-based source location and, where a close candidate exists, a
//! "did you mean" suggestion.
//!
//! ## Usage
//!
//! ```
//! let diagnostics = allium_lang::check(
//!     "users.allium",
//!     "entity User { status: active | suspended }",
//! );
//! assert!(diagnostics.is_empty());
//! ```

pub mod ast;
pub mod check;
pub mod distance;
pub mod error;
pub mod lexer;
pub mod loc;
pub mod parser;
pub mod symbols;

pub use error::{format_diagnostics, Diagnostic};
pub use loc::Loc;
pub use parser::ParseError;

/// Check a single source file.
///
/// `filename` is used only to populate the `file` field of each diagnostic;
/// it is not opened or interpreted. `source` is the full file contents.
///
/// # Returns
///
/// All diagnostics found, in emission order: a lone parse diagnostic when
/// the file does not parse, otherwise reference diagnostics followed by
/// enum diagnostics. An empty list means the specification is clean.
pub fn check(filename: &str, source: &str) -> Vec<Diagnostic> {
    let map = loc::LineMap::new(source);
    let tokens = lexer::lex(source, &map);

    let file = match parser::parse_file(&tokens, map.eof_loc()) {
        Ok(file) => file,
        Err(err) => return vec![err.into_diagnostic(filename)],
    };

    let table = symbols::build_symbol_table(&file);
    check::run_checks(&file, &table, filename)
}
