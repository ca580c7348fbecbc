//! Hand-written recursive descent parser for Allium source files.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead
//! - `error`: ParseError
//! - `expr`: expression parser (precedence climbing)
//! - `types`: type expression parser
//! - `decl`: declaration parsers (keyword-dispatched)
//!
//! The parser halts on the first syntactic error; the resulting
//! [`ParseError`] is the complete output of the pipeline for that run.

mod decl;
mod error;
mod expr;
mod stream;
mod types;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

use crate::ast::AlliumFile;
use crate::lexer::Token;
use crate::loc::Loc;

/// Parse a token stream into a file.
///
/// # Parameters
/// - `tokens`: the lexed token sequence with locations.
/// - `eof_loc`: the location just past the end of the source, used for
///   end-of-input diagnostics.
///
/// # Errors
/// Returns the first [`ParseError`] encountered; no recovery is attempted.
pub fn parse_file(tokens: &[(Token, Loc)], eof_loc: Loc) -> Result<AlliumFile, ParseError> {
    let mut stream = TokenStream::new(tokens, eof_loc);
    decl::parse_file(&mut stream)
}
