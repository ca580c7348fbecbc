//! Lexical analysis for Allium source files.
//!
//! This module provides tokenization of Allium source code using logos.
//!
//! # Design
//!
//! - `Token` — all Allium token types (keywords, operators, literals,
//!   identifiers)
//! - Whitespace and `--` comments are stripped during lexing (not tokens)
//! - Unknown characters are dropped; lexing never fails
//! - Token strings defined once in `TOKEN_STRINGS` table (single source of
//!   truth for Display)
//!
//! # Examples
//!
//! ```
//! # use allium_lang::lexer::*;
//! # use allium_lang::loc::LineMap;
//! let source = "entity User { status: active | suspended }";
//! let tokens = lex(source, &LineMap::new(source));
//! ```

use crate::loc::{LineMap, Loc};
use logos::Logos;

/// Allium token.
///
/// Represents all lexical elements of the Allium language including
/// keywords, operators, literals, and identifiers.
///
/// Token strings for keywords, operators, and punctuation are defined once
/// in the `TOKEN_STRINGS` table and indexed by discriminant for Display.
///
/// # Layout
///
/// Uses `#[repr(u16)]` to guarantee discriminant values are stable and
/// can be safely used to index into `TOKEN_STRINGS`.
#[derive(Logos, Debug, Clone, PartialEq)]
#[repr(u16)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"--[^\n]*")] // Skip -- comments
pub enum Token {
    // === Keywords ===

    // Declarations
    /// Keyword `entity`
    #[token("entity")]
    Entity,
    /// Keyword `external`
    #[token("external")]
    External,
    /// Keyword `value`
    #[token("value")]
    Value,
    /// Keyword `rule`
    #[token("rule")]
    Rule,
    /// Keyword `default`
    #[token("default")]
    Default,
    /// Keyword `deferred`
    #[token("deferred")]
    Deferred,
    /// Keyword `open`
    #[token("open")]
    Open,
    /// Keyword `question`
    #[token("question")]
    Question,

    // Rule bodies
    /// Keyword `when`
    #[token("when")]
    When,
    /// Keyword `let`
    #[token("let")]
    Let,
    /// Keyword `requires`
    #[token("requires")]
    Requires,
    /// Keyword `ensures`
    #[token("ensures")]
    Ensures,

    // Members & triggers
    /// Keyword `for`
    #[token("for")]
    For,
    /// Keyword `this`
    #[token("this")]
    This,
    /// Keyword `with`
    #[token("with")]
    With,
    /// Keyword `becomes`
    #[token("becomes")]
    Becomes,
    /// Keyword `created`
    #[token("created")]
    Created,
    /// Keyword `config`
    #[token("config")]
    Config,
    /// Keyword `now`
    #[token("now")]
    Now,

    // Expression keywords
    /// Keyword `and` (logical and)
    #[token("and")]
    And,
    /// Keyword `or` (logical or)
    #[token("or")]
    Or,
    /// Keyword `not` (logical not)
    #[token("not")]
    Not,
    /// Keyword `in` (membership)
    #[token("in")]
    In,
    /// Boolean literal `true`
    #[token("true")]
    True,
    /// Boolean literal `false`
    #[token("false")]
    False,
    /// Null literal `null`
    #[token("null")]
    Null,

    // === Operators ===
    /// Operator `=>`
    #[token("=>")]
    FatArrow,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>=`
    #[token(">=")]
    GtEq,
    /// Operator `=`
    #[token("=")]
    Eq,
    /// Operator `!`
    #[token("!")]
    Bang,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,

    // === Punctuation ===
    /// Punctuation `:`
    #[token(":")]
    Colon,
    /// Punctuation `,`
    #[token(",")]
    Comma,
    /// Punctuation `|`
    #[token("|")]
    Pipe,
    /// Punctuation `?`
    #[token("?")]
    QuestionMark,
    /// Punctuation `.`
    #[token(".")]
    Dot,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Number literal (e.g., 42, 3.14)
    ///
    /// The raw lexeme is kept as written; the lexer does not validate the
    /// form beyond "a digit followed by digits and dots".
    #[regex(r"[0-9][0-9.]*", |lex| lex.slice().to_string())]
    Number(String),

    /// String literal, single or double quoted (e.g., "hello", 'world')
    ///
    /// A backslash escapes the next character verbatim; only the escaped
    /// character is retained.
    #[regex(r#""([^"\\]|\\.)*""#, unescape_string)]
    #[regex(r"'([^'\\]|\\.)*'", unescape_string)]
    Str(String),

    /// Identifier (e.g., user, User, other_user, _tmp)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Strip the surrounding quotes and resolve backslash escapes.
fn unescape_string(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Token string lookup table.
///
/// Maps discriminant indices to their string representation.
/// This is the single source of truth for token display strings,
/// indexed by the enum discriminant order.
///
/// NOTE: The `#[token("...")]` attributes above must match these strings.
/// This duplication is unavoidable due to logos requiring literal strings,
/// but this table at least consolidates Display logic to avoid a large match.
const TOKEN_STRINGS: &[&str] = &[
    "entity",
    "external",
    "value",
    "rule",
    "default",
    "deferred",
    "open",
    "question", // declarations
    "when",
    "let",
    "requires",
    "ensures", // rule bodies
    "for",
    "this",
    "with",
    "becomes",
    "created",
    "config",
    "now", // members & triggers
    "and",
    "or",
    "not",
    "in",
    "true",
    "false",
    "null", // expressions
    "=>",
    "!=",
    "<=",
    ">=",
    "=",
    "!",
    "<",
    ">",
    "+",
    "-",
    "*",
    "/", // operators
    ":",
    ",",
    "|",
    "?",
    ".",
    "{",
    "}",
    "(",
    ")",
    "[",
    "]", // punctuation
];

impl Token {
    /// Get the index into TOKEN_STRINGS for simple tokens.
    ///
    /// # Returns
    ///
    /// Index for simple tokens (keywords, operators, punctuation); only
    /// meaningful for variants without data.
    ///
    /// # Safety
    ///
    /// Safe due to `#[repr(u16)]` on Token enum ensuring stable discriminants.
    fn token_string_index(&self) -> usize {
        // Safe: Token has #[repr(u16)] so discriminant values are stable
        let discriminant = unsafe { *(self as *const Token as *const u16) };
        discriminant as usize
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Literals with data (not in TOKEN_STRINGS table)
            Token::Number(text) => write!(f, "{}", text),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Ident(name) => write!(f, "{}", name),

            // Simple tokens (keywords, operators, punctuation)
            // Index into TOKEN_STRINGS using discriminant
            _ => {
                let idx = self.token_string_index();
                let s = TOKEN_STRINGS
                    .get(idx)
                    .expect("BUG: token discriminant out of bounds for TOKEN_STRINGS");
                write!(f, "{}", s)
            }
        }
    }
}

/// Tokenize a source text.
///
/// Produces the token sequence with the 1-based location of each token.
/// Lexing is total: unknown characters are silently skipped and the end of
/// input is represented by stream exhaustion.
pub fn lex(source: &str, map: &LineMap) -> Vec<(Token, Loc)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, map.loc(lexer.span().start)));
        }
        // Err: an unrecognized character, dropped
    }
    tokens
}
