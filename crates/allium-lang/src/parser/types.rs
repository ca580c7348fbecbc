//! Type expression parser.

use super::{ParseError, TokenStream};
use crate::ast::{TypeExpr, PRIMITIVE_TYPES};
use crate::lexer::Token;

/// Parse a type expression.
///
/// A bare identifier is a primitive when it is one of [`PRIMITIVE_TYPES`],
/// otherwise an entity reference. `Set` or `List` followed by `<` begins a
/// parameterised collection. A pipe-separated identifier list is an enum.
/// A trailing `?` wraps the preceding type in optional.
pub(super) fn parse_type_expr(stream: &mut TokenStream) -> Result<TypeExpr, ParseError> {
    let (name, _) = stream.expect_ident("type name")?;

    let mut ty = if (name == "Set" || name == "List") && stream.check(&Token::Lt) {
        stream.advance();
        let inner = parse_type_expr(stream)?;
        stream.expect(Token::Gt)?;
        if name == "Set" {
            TypeExpr::Set(Box::new(inner))
        } else {
            TypeExpr::List(Box::new(inner))
        }
    } else if stream.check(&Token::Pipe) {
        let mut members = vec![name];
        while stream.check(&Token::Pipe) {
            stream.advance();
            members.push(stream.expect_ident("enum member")?.0);
        }
        TypeExpr::Enum(members)
    } else if PRIMITIVE_TYPES.contains(&name.as_str()) {
        TypeExpr::Primitive(name)
    } else {
        TypeExpr::EntityRef(name)
    };

    while stream.check(&Token::QuestionMark) {
        stream.advance();
        ty = TypeExpr::Optional(Box::new(ty));
    }

    Ok(ty)
}

/// Two-token look-ahead: does the member body after `name :` read as a type?
///
/// A bare identifier followed by `}`, end of input, or another identifier is
/// a type, as is one followed by `?` or `|`, or by `<` when the identifier
/// is `Set` or `List`. Anything else parses as a derived expression instead.
pub(super) fn looks_like_type(stream: &TokenStream) -> bool {
    let Some(Token::Ident(name)) = stream.peek() else {
        return false;
    };
    match stream.peek_nth(1) {
        None | Some(Token::RBrace) | Some(Token::Ident(_)) => true,
        Some(Token::QuestionMark) | Some(Token::Pipe) => true,
        Some(Token::Lt) => name == "Set" || name == "List",
        _ => false,
    }
}
