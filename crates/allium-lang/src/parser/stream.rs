//! Token stream wrapper for the hand-written parser.

use super::ParseError;
use crate::lexer::Token;
use crate::loc::Loc;

/// Token stream with lookahead and location tracking.
///
/// Provides methods for consuming tokens, lookahead, and location tracking
/// for the hand-written recursive descent parser.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Loc)],
    pos: usize,
    eof_loc: Loc,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream from tokens with their locations.
    pub fn new(tokens: &'src [(Token, Loc)], eof_loc: Loc) -> Self {
        Self {
            tokens,
            pos: 0,
            eof_loc,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance past it.
    ///
    /// Returns the consumed token's location, or an error if the token
    /// doesn't match.
    pub fn expect(&mut self, expected: Token) -> Result<Loc, ParseError> {
        if self.check(&expected) {
            let loc = self.current_loc();
            self.advance();
            Ok(loc)
        } else {
            Err(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_loc(),
            ))
        }
    }

    /// Expect an identifier and advance past it.
    ///
    /// Returns the name and its location.
    pub fn expect_ident(&mut self, what: &str) -> Result<(String, Loc), ParseError> {
        let loc = self.current_loc();
        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Ok((name, loc))
        } else {
            Err(ParseError::expected(what, self.peek(), loc))
        }
    }

    /// Expect a string literal and advance past it.
    pub fn expect_string(&mut self, what: &str) -> Result<(String, Loc), ParseError> {
        let loc = self.current_loc();
        if let Some(Token::Str(text)) = self.peek() {
            let text = text.clone();
            self.pos += 1;
            Ok((text, loc))
        } else {
            Err(ParseError::expected(what, self.peek(), loc))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Location of the current token, or of end-of-input when exhausted.
    pub fn current_loc(&self) -> Loc {
        match self.tokens.get(self.pos) {
            Some((_, loc)) => *loc,
            None => self.eof_loc,
        }
    }
}
