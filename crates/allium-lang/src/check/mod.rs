//! Semantic passes over the parsed file.
//!
//! The two checkers run independently and their diagnostic lists are
//! concatenated in a stable order: references first, then enums. Neither
//! pass can fail; each collects everything it finds in a single walk.

mod enums;
mod refs;

pub use enums::check_enums;
pub use refs::check_references;

use crate::ast::AlliumFile;
use crate::error::Diagnostic;
use crate::symbols::SymbolTable;

/// Run both semantic passes and concatenate their diagnostics.
pub fn run_checks(file: &AlliumFile, table: &SymbolTable, filename: &str) -> Vec<Diagnostic> {
    let mut diagnostics = check_references(file, table, filename);
    diagnostics.extend(check_enums(file, table, filename));
    diagnostics
}
