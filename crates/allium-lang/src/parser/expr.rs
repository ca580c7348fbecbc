//! Expression parser - precedence climbing for binary and unary operators.

use super::{ParseError, TokenStream};
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::lexer::Token;

/// Get binary operator metadata (precedence and operator enum).
///
/// Higher precedence = tighter binding. All binary operators are
/// left-associative. This is the single source of truth for binary
/// operator parsing.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::Or => Some((10, BinaryOp::Or)),
        Token::And => Some((20, BinaryOp::And)),
        Token::Eq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::Le)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::Ge)),
        Token::In => Some((30, BinaryOp::In)),
        Token::With => Some((30, BinaryOp::With)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        _ => None,
    }
}

/// Parse an expression.
pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_binary(stream, 0)
}

/// Precedence climbing over binary operators.
fn parse_binary(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_unary(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }

        stream.advance();
        let right = parse_binary(stream, prec + 1)?;

        let loc = left.loc;
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            loc,
        );
    }

    Ok(left)
}

/// Parse unary operators (`not`, negation).
fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let loc = stream.current_loc();
    let op = match stream.peek() {
        Some(Token::Not) => Some(UnaryOp::Not),
        Some(Token::Minus) => Some(UnaryOp::Neg),
        _ => None,
    };

    match op {
        Some(op) => {
            stream.advance();
            let operand = parse_unary(stream)?;
            Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                loc,
            ))
        }
        None => parse_postfix(stream),
    }
}

/// Parse postfix forms: field access, calls, join lookups.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let (field, _) = stream.expect_ident("field name after '.'")?;
                let loc = expr.loc;
                let access = Expr::new(
                    ExprKind::FieldAccess {
                        object: Box::new(expr),
                        field,
                    },
                    loc,
                );
                // `.field(` makes the access the callee of a call
                expr = if matches!(stream.peek(), Some(Token::LParen)) {
                    let args = parse_call_args(stream)?;
                    Expr::new(
                        ExprKind::Call {
                            callee: Box::new(access),
                            args,
                        },
                        loc,
                    )
                } else {
                    access
                };
            }
            Some(Token::LParen) => {
                let args = parse_call_args(stream)?;
                let loc = expr.loc;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    loc,
                );
            }
            Some(Token::LBrace) => {
                // Join lookup: `{ field : value, shorthand }`.
                // Lookahead `{ ident` then `:` / `,` / `}` distinguishes it
                // from a following block.
                let is_join = matches!(stream.peek_nth(1), Some(Token::Ident(_)))
                    && matches!(
                        stream.peek_nth(2),
                        Some(Token::Colon) | Some(Token::Comma) | Some(Token::RBrace)
                    );
                if !is_join {
                    break;
                }

                let Some(entity) = expr.as_ident().map(str::to_string) else {
                    return Err(ParseError::invalid_syntax(
                        "join lookup requires a bare entity name",
                        stream.current_loc(),
                    ));
                };
                let loc = expr.loc;
                let keys = parse_join_keys(stream)?;
                expr = Expr::new(ExprKind::JoinLookup { entity, keys }, loc);
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse atomic expressions (literals, identifiers, special forms).
fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let loc = stream.current_loc();

    match stream.peek() {
        Some(Token::LParen) => {
            stream.advance();
            let expr = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(expr)
        }
        Some(Token::Number(text)) => {
            let text = text.clone();
            stream.advance();
            Ok(Expr::new(ExprKind::Number(text), loc))
        }
        Some(Token::Str(text)) => {
            let text = text.clone();
            stream.advance();
            Ok(Expr::new(ExprKind::Str(text), loc))
        }
        Some(Token::True) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(true), loc))
        }
        Some(Token::False) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Bool(false), loc))
        }
        Some(Token::Null) => {
            stream.advance();
            Ok(Expr::new(ExprKind::Null, loc))
        }
        Some(Token::Now) => {
            stream.advance();
            Ok(Expr::ident("now", loc))
        }
        Some(Token::Config) => {
            // `config / name` reads as the single identifier `config/name`
            stream.advance();
            stream.expect(Token::Slash)?;
            let (name, _) = stream.expect_ident("identifier after 'config /'")?;
            Ok(Expr::ident(format!("config/{}", name), loc))
        }
        Some(Token::LBracket) => {
            // `[a, b]` is a call to the synthetic `__array` identifier
            stream.advance();
            let mut args = Vec::new();
            while !stream.check(&Token::RBracket) {
                args.push(parse_expr(stream)?);
                if !stream.check(&Token::RBracket) {
                    stream.expect(Token::Comma)?;
                }
            }
            stream.expect(Token::RBracket)?;
            Ok(Expr::new(
                ExprKind::Call {
                    callee: Box::new(Expr::ident("__array", loc)),
                    args,
                },
                loc,
            ))
        }
        Some(Token::Ident(_)) => {
            if matches!(stream.peek_nth(1), Some(Token::FatArrow)) {
                let (param, _) = stream.expect_ident("lambda parameter")?;
                stream.advance(); // =>
                let body = parse_expr(stream)?;
                return Ok(Expr::new(
                    ExprKind::Lambda {
                        param,
                        body: Box::new(body),
                    },
                    loc,
                ));
            }

            let (name, _) = stream.expect_ident("identifier")?;

            // `Entity.created(field: value, ...)`
            if matches!(stream.peek(), Some(Token::Dot))
                && matches!(stream.peek_nth(1), Some(Token::Created))
                && matches!(stream.peek_nth(2), Some(Token::LParen))
            {
                stream.advance(); // .
                stream.advance(); // created
                let fields = parse_init_fields(stream)?;
                return Ok(Expr::new(
                    ExprKind::EntityCreated {
                        entity: name,
                        fields,
                    },
                    loc,
                ));
            }

            Ok(Expr::ident(name, loc))
        }
        other => Err(ParseError::unexpected_token(other, "in expression", loc)),
    }
}

/// Parse call arguments: `( expr, ... )`.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !stream.check(&Token::RParen) {
        args.push(parse_expr(stream)?);
        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(args)
}

/// Parse entity-creation initialisers: `( field : value, ... )`.
fn parse_init_fields(stream: &mut TokenStream) -> Result<Vec<(String, Expr)>, ParseError> {
    stream.expect(Token::LParen)?;

    let mut fields = Vec::new();
    while !stream.check(&Token::RParen) {
        let (name, _) = stream.expect_ident("initialiser field name")?;
        stream.expect(Token::Colon)?;
        let value = parse_expr(stream)?;
        fields.push((name, value));
        if !stream.check(&Token::RParen) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RParen)?;
    Ok(fields)
}

/// Parse join-lookup keys: `{ field : value, shorthand }`.
///
/// A bare field name is shorthand for `field: field`.
fn parse_join_keys(stream: &mut TokenStream) -> Result<Vec<(String, Expr)>, ParseError> {
    stream.expect(Token::LBrace)?;

    let mut keys = Vec::new();
    while !stream.check(&Token::RBrace) {
        let (name, name_loc) = stream.expect_ident("join lookup field")?;
        let value = if stream.check(&Token::Colon) {
            stream.advance();
            parse_expr(stream)?
        } else {
            Expr::ident(name.clone(), name_loc)
        };
        keys.push((name, value));
        if !stream.check(&Token::RBrace) {
            stream.expect(Token::Comma)?;
        }
    }

    stream.expect(Token::RBrace)?;
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::loc::LineMap;

    fn parse(source: &str) -> Expr {
        let map = LineMap::new(source);
        let tokens = lex(source, &map);
        let mut stream = TokenStream::new(&tokens, map.eof_loc());
        let expr = parse_expr(&mut stream).expect("expression should parse");
        assert!(stream.at_end(), "expression parse left trailing tokens");
        expr
    }

    fn binary_op(expr: &Expr) -> BinaryOp {
        match &expr.kind {
            ExprKind::Binary { op, .. } => *op,
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_or_and() {
        // a or b and c => a or (b and c)
        let expr = parse("a or b and c");
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Or);
        assert_eq!(binary_op(right), BinaryOp::And);
    }

    #[test]
    fn test_precedence_comparison_additive() {
        // a + b = c => (a + b) = c
        let expr = parse("a + b = c");
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Eq);
        assert_eq!(binary_op(left), BinaryOp::Add);
    }

    #[test]
    fn test_precedence_multiplicative() {
        // a + b * c => a + (b * c)
        let expr = parse("a + b * c");
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert_eq!(binary_op(right), BinaryOp::Mul);
    }

    #[test]
    fn test_left_associative_chain() {
        // a = b = c => (a = b) = c
        let expr = parse("a = b = c");
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Eq);
        assert_eq!(binary_op(left), BinaryOp::Eq);
        assert!(matches!(&right.kind, ExprKind::Ident(n) if n == "c"));
    }

    #[test]
    fn test_in_and_with_are_comparisons() {
        assert_eq!(binary_op(&parse("x in xs")), BinaryOp::In);
        assert_eq!(binary_op(&parse("orders with active")), BinaryOp::With);
    }

    #[test]
    fn test_unary() {
        let expr = parse("not -x");
        let ExprKind::Unary { op, operand } = &expr.kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnaryOp::Not);
        assert!(matches!(
            &operand.kind,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                ..
            }
        ));
    }

    #[test]
    fn test_field_access_chain() {
        let expr = parse("user.profile.name");
        let ExprKind::FieldAccess { object, field } = &expr.kind else {
            panic!("expected field access");
        };
        assert_eq!(field, "name");
        assert!(matches!(&object.kind, ExprKind::FieldAccess { .. }));
    }

    #[test]
    fn test_method_style_call() {
        // the access becomes the callee
        let expr = parse("orders.count(x)");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(&callee.kind, ExprKind::FieldAccess { .. }));
    }

    #[test]
    fn test_plain_call() {
        let expr = parse("verify(user, true)");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert!(callee.is_ident("verify"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_lambda() {
        let expr = parse("x => x.active");
        let ExprKind::Lambda { param, body } = &expr.kind else {
            panic!("expected lambda");
        };
        assert_eq!(param, "x");
        assert!(matches!(&body.kind, ExprKind::FieldAccess { .. }));
    }

    #[test]
    fn test_array_literal_is_synthetic_call() {
        let expr = parse("[active, suspended]");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected call");
        };
        assert!(callee.is_ident("__array"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_config_reference() {
        let expr = parse("config / retention");
        assert!(expr.is_ident("config/retention"));
    }

    #[test]
    fn test_now_is_identifier() {
        assert!(parse("now").is_ident("now"));
    }

    #[test]
    fn test_join_lookup() {
        let expr = parse("User{email: e, status}");
        let ExprKind::JoinLookup { entity, keys } = &expr.kind else {
            panic!("expected join lookup");
        };
        assert_eq!(entity, "User");
        assert_eq!(keys.len(), 2);
        // shorthand expands to field: field
        assert_eq!(keys[1].0, "status");
        assert!(keys[1].1.is_ident("status"));
    }

    #[test]
    fn test_entity_created() {
        let expr = parse("User.created(email: e, status: active)");
        let ExprKind::EntityCreated { entity, fields } = &expr.kind else {
            panic!("expected entity-created");
        };
        assert_eq!(entity, "User");
        assert_eq!(fields.len(), 2);
        assert!(fields[1].1.is_ident("active"));
    }

    #[test]
    fn test_comparison_with_now() {
        let expr = parse("deadline < now + grace");
        assert_eq!(binary_op(&expr), BinaryOp::Lt);
    }

    #[test]
    fn test_parenthesised() {
        // (a or b) and c
        let expr = parse("(a or b) and c");
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert_eq!(binary_op(left), BinaryOp::Or);
    }

    #[test]
    fn test_error_on_missing_operand() {
        let source = "a +";
        let map = LineMap::new(source);
        let tokens = lex(source, &map);
        let mut stream = TokenStream::new(&tokens, map.eof_loc());
        let err = parse_expr(&mut stream).unwrap_err();
        assert_eq!(err.kind, super::super::ParseErrorKind::UnexpectedEof);
    }
}
