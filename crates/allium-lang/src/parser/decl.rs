//! Declaration parsers (keyword-dispatched).
//!
//! Top-level dispatch selects a production from the leading keyword:
//! `external`, `value`, `entity`, `default`, `rule`, `deferred`, `open`.
//! Inside an entity body, each member starts with `name :` and a two-token
//! look-ahead decides between field, relationship, projection, and derived.

use super::{expr, types, ParseError, TokenStream};
use crate::ast::{
    contains_identifier, AlliumFile, DefaultDecl, DeferredSpec, Derived, ExprKind, Field,
    LetBinding, OpenQuestion, Projection, Relationship, Rule, Trigger, TriggerParam, TypeDecl,
};
use crate::lexer::Token;

/// Parse a whole source file.
pub(super) fn parse_file(stream: &mut TokenStream) -> Result<AlliumFile, ParseError> {
    let mut file = AlliumFile::default();

    while !stream.at_end() {
        match stream.peek() {
            Some(Token::External) => file.externals.push(parse_external(stream)?),
            Some(Token::Value) => file.values.push(parse_value(stream)?),
            Some(Token::Entity) => file.entities.push(parse_entity(stream)?),
            Some(Token::Default) => file.defaults.push(parse_default(stream)?),
            Some(Token::Rule) => file.rules.push(parse_rule(stream)?),
            Some(Token::Deferred) => file.deferred.push(parse_deferred(stream)?),
            Some(Token::Open) => file.open_questions.push(parse_open_question(stream)?),
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "at top-level declaration",
                    stream.current_loc(),
                ))
            }
        }
    }

    Ok(file)
}

/// Parse `external entity Name { fields }`.
fn parse_external(stream: &mut TokenStream) -> Result<TypeDecl, ParseError> {
    stream.expect(Token::External)?;
    stream.expect(Token::Entity)?;
    let (name, loc) = stream.expect_ident("external entity name")?;

    let mut decl = TypeDecl::new(name, loc);
    stream.expect(Token::LBrace)?;
    decl.fields = parse_fields(stream)?;
    stream.expect(Token::RBrace)?;
    Ok(decl)
}

/// Parse `value Name { fields }`.
fn parse_value(stream: &mut TokenStream) -> Result<TypeDecl, ParseError> {
    stream.expect(Token::Value)?;
    let (name, loc) = stream.expect_ident("value type name")?;

    let mut decl = TypeDecl::new(name, loc);
    stream.expect(Token::LBrace)?;
    decl.fields = parse_fields(stream)?;
    stream.expect(Token::RBrace)?;
    Ok(decl)
}

/// Parse `name : type` pairs until the closing brace.
fn parse_fields(stream: &mut TokenStream) -> Result<Vec<Field>, ParseError> {
    let mut fields = Vec::new();
    while !stream.check(&Token::RBrace) {
        let (name, _) = stream.expect_ident("field name")?;
        stream.expect(Token::Colon)?;
        let loc = stream.current_loc();
        let ty = types::parse_type_expr(stream)?;
        fields.push(Field { name, ty, loc });
    }
    Ok(fields)
}

/// Parse `entity Name { members }`.
///
/// Each member starts with `name :`. The interpretation is decided by the
/// two tokens after the colon:
///
/// - `ident for`  — relationship
/// - `ident with` — projection
/// - reads as a type — field
/// - anything else — derived expression
fn parse_entity(stream: &mut TokenStream) -> Result<TypeDecl, ParseError> {
    stream.expect(Token::Entity)?;
    let (name, loc) = stream.expect_ident("entity name")?;

    let mut decl = TypeDecl::new(name, loc);
    stream.expect(Token::LBrace)?;

    while !stream.check(&Token::RBrace) {
        let (member, _) = stream.expect_ident("member name")?;
        stream.expect(Token::Colon)?;

        match (stream.peek(), stream.peek_nth(1)) {
            (Some(Token::Ident(_)), Some(Token::For)) => {
                let (target, target_loc) = stream.expect_ident("relationship target")?;
                stream.expect(Token::For)?;
                stream.expect(Token::This)?;
                let (condition, _) = stream.expect_ident("relationship condition")?;
                decl.relationships.push(Relationship {
                    name: member,
                    target,
                    condition,
                    loc: target_loc,
                });
            }
            (Some(Token::Ident(_)), Some(Token::With)) => {
                let (source, source_loc) = stream.expect_ident("projection source")?;
                stream.expect(Token::With)?;
                let filter = expr::parse_expr(stream)?;
                decl.projections.push(Projection {
                    name: member,
                    source,
                    filter,
                    loc: source_loc,
                });
            }
            _ if types::looks_like_type(stream) => {
                let field_loc = stream.current_loc();
                let ty = types::parse_type_expr(stream)?;
                decl.fields.push(Field {
                    name: member,
                    ty,
                    loc: field_loc,
                });
            }
            _ => {
                let value = expr::parse_expr(stream)?;
                decl.deriveds.push(Derived {
                    name: member,
                    loc: value.loc,
                    expr: value,
                });
            }
        }
    }

    stream.expect(Token::RBrace)?;
    Ok(decl)
}

/// Parse `default name: expr`.
fn parse_default(stream: &mut TokenStream) -> Result<DefaultDecl, ParseError> {
    stream.expect(Token::Default)?;
    let (name, loc) = stream.expect_ident("default name")?;
    stream.expect(Token::Colon)?;
    let value = expr::parse_expr(stream)?;
    Ok(DefaultDecl { name, value, loc })
}

/// Parse `deferred Name: "text"`.
fn parse_deferred(stream: &mut TokenStream) -> Result<DeferredSpec, ParseError> {
    stream.expect(Token::Deferred)?;
    let (name, loc) = stream.expect_ident("deferred specification name")?;
    stream.expect(Token::Colon)?;
    let (text, _) = stream.expect_string("deferred specification text")?;
    Ok(DeferredSpec { name, text, loc })
}

/// Parse `open question: "text"`.
fn parse_open_question(stream: &mut TokenStream) -> Result<OpenQuestion, ParseError> {
    let loc = stream.expect(Token::Open)?;
    stream.expect(Token::Question)?;
    stream.expect(Token::Colon)?;
    let (text, _) = stream.expect_string("open question text")?;
    Ok(OpenQuestion { text, loc })
}

/// Parse `rule Name { when: ... let ... requires: ... ensures: ... }`.
fn parse_rule(stream: &mut TokenStream) -> Result<Rule, ParseError> {
    let loc = stream.expect(Token::Rule)?;
    let (name, _) = stream.expect_ident("rule name")?;
    stream.expect(Token::LBrace)?;

    let mut trigger = None;
    let mut lets = Vec::new();
    let mut requires = Vec::new();
    let mut ensures = Vec::new();

    loop {
        match stream.peek() {
            Some(Token::RBrace) => {
                stream.advance();
                break;
            }
            Some(Token::When) => {
                stream.advance();
                stream.expect(Token::Colon)?;
                trigger = Some(parse_trigger(stream)?);
            }
            Some(Token::Let) => {
                stream.advance();
                let (binding, binding_loc) = stream.expect_ident("let binding name")?;
                stream.expect(Token::Eq)?;
                let value = expr::parse_expr(stream)?;
                lets.push(LetBinding {
                    name: binding,
                    value,
                    loc: binding_loc,
                });
            }
            Some(Token::Requires) => {
                stream.advance();
                stream.expect(Token::Colon)?;
                requires.push(expr::parse_expr(stream)?);
            }
            Some(Token::Ensures) => {
                stream.advance();
                stream.expect(Token::Colon)?;
                ensures.push(expr::parse_expr(stream)?);
            }
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "in rule body",
                    stream.current_loc(),
                ))
            }
        }
    }

    let Some(trigger) = trigger else {
        return Err(ParseError::invalid_syntax(
            format!("rule '{}' has no 'when' trigger", name),
            loc,
        ));
    };

    Ok(Rule {
        name,
        trigger,
        lets,
        requires,
        ensures,
        loc,
    })
}

/// Parse a trigger.
///
/// - `b: Entity.created` — created
/// - `b: Entity.field becomes expr` — state change
/// - `name(params)` — stimulus
/// - otherwise an expression: an ordering comparison mentioning `now` is
///   temporal, anything else is derived
fn parse_trigger(stream: &mut TokenStream) -> Result<Trigger, ParseError> {
    match (stream.peek(), stream.peek_nth(1)) {
        (Some(Token::Ident(_)), Some(Token::Colon)) => {
            let (binding, _) = stream.expect_ident("trigger binding")?;
            stream.expect(Token::Colon)?;
            let (entity, entity_loc) = stream.expect_ident("trigger entity")?;
            stream.expect(Token::Dot)?;

            if stream.check(&Token::Created) {
                stream.advance();
                Ok(Trigger::Created {
                    binding,
                    entity,
                    loc: entity_loc,
                })
            } else {
                let (field, _) = stream.expect_ident("trigger field")?;
                stream.expect(Token::Becomes)?;
                let value = expr::parse_expr(stream)?;
                Ok(Trigger::StateChange {
                    binding,
                    entity,
                    field,
                    value: Box::new(value),
                    loc: entity_loc,
                })
            }
        }
        (Some(Token::Ident(_)), Some(Token::LParen)) => {
            let (name, loc) = stream.expect_ident("stimulus name")?;
            stream.expect(Token::LParen)?;

            let mut params = Vec::new();
            while !stream.check(&Token::RParen) {
                let (param, param_loc) = stream.expect_ident("stimulus parameter")?;
                let optional = if stream.check(&Token::QuestionMark) {
                    stream.advance();
                    true
                } else {
                    false
                };
                params.push(TriggerParam {
                    name: param,
                    optional,
                    loc: param_loc,
                });
                if !stream.check(&Token::RParen) {
                    stream.expect(Token::Comma)?;
                }
            }

            stream.expect(Token::RParen)?;
            Ok(Trigger::Stimulus { name, params, loc })
        }
        _ => {
            let expr = expr::parse_expr(stream)?;
            let temporal = matches!(&expr.kind, ExprKind::Binary { op, .. } if op.is_ordering())
                && contains_identifier(&expr, "now");
            if temporal {
                Ok(Trigger::Temporal { expr })
            } else {
                Ok(Trigger::Derived { expr })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeExpr;
    use crate::lexer::lex;
    use crate::loc::LineMap;

    fn parse(source: &str) -> AlliumFile {
        let map = LineMap::new(source);
        let tokens = lex(source, &map);
        let mut stream = TokenStream::new(&tokens, map.eof_loc());
        parse_file(&mut stream).expect("file should parse")
    }

    fn parse_err(source: &str) -> ParseError {
        let map = LineMap::new(source);
        let tokens = lex(source, &map);
        let mut stream = TokenStream::new(&tokens, map.eof_loc());
        parse_file(&mut stream).expect_err("file should not parse")
    }

    #[test]
    fn test_member_disambiguation() {
        let file = parse(
            "entity Order {\n\
             \x20   total: Decimal\n\
             \x20   customer: Customer for this order_owner\n\
             \x20   recent: items with status = active\n\
             \x20   item_count: items.count\n\
             }",
        );

        let order = &file.entities[0];
        assert_eq!(order.fields.len(), 1);
        assert_eq!(order.fields[0].name, "total");
        assert_eq!(order.relationships.len(), 1);
        assert_eq!(order.relationships[0].target, "Customer");
        assert_eq!(order.relationships[0].condition, "order_owner");
        assert_eq!(order.projections.len(), 1);
        assert_eq!(order.projections[0].source, "items");
        assert_eq!(order.deriveds.len(), 1);
        assert_eq!(order.deriveds[0].name, "item_count");
    }

    #[test]
    fn test_enum_field_members_in_order() {
        let file = parse("entity User { status: active | suspended | deleted }");
        let TypeExpr::Enum(members) = &file.entities[0].fields[0].ty else {
            panic!("expected enum type");
        };
        assert_eq!(members, &["active", "suspended", "deleted"]);
    }

    #[test]
    fn test_external_and_value_declarations() {
        let file = parse(
            "external entity PaymentGateway { api_key: String }\n\
             value Money { amount: Decimal  currency: String }",
        );
        assert_eq!(file.externals.len(), 1);
        assert_eq!(file.externals[0].name, "PaymentGateway");
        assert_eq!(file.values.len(), 1);
        assert_eq!(file.values[0].fields.len(), 2);
    }

    #[test]
    fn test_default_deferred_open_question() {
        let file = parse(
            "default retention: 90\n\
             deferred Payments: \"settlement flows\"\n\
             open question: \"how are refunds handled?\"",
        );
        assert_eq!(file.defaults[0].name, "retention");
        assert_eq!(file.deferred[0].name, "Payments");
        assert_eq!(file.open_questions[0].text, "how are refunds handled?");
    }

    #[test]
    fn test_rule_with_stimulus_trigger() {
        let file = parse(
            "rule SuspendUser {\n\
             \x20   when: AdminSuspends(user, reason?)\n\
             \x20   let target = user\n\
             \x20   requires: user.active\n\
             \x20   ensures: user.status = suspended\n\
             }",
        );

        let rule = &file.rules[0];
        let Trigger::Stimulus { name, params, .. } = &rule.trigger else {
            panic!("expected stimulus trigger");
        };
        assert_eq!(name, "AdminSuspends");
        assert_eq!(params.len(), 2);
        assert!(!params[0].optional);
        assert!(params[1].optional);
        assert_eq!(rule.lets.len(), 1);
        assert_eq!(rule.requires.len(), 1);
        assert_eq!(rule.ensures.len(), 1);
    }

    #[test]
    fn test_created_trigger() {
        let file = parse("rule Welcome { when: u: User.created  ensures: u.greeted }");
        let Trigger::Created { binding, entity, .. } = &file.rules[0].trigger else {
            panic!("expected created trigger");
        };
        assert_eq!(binding, "u");
        assert_eq!(entity, "User");
    }

    #[test]
    fn test_state_change_trigger() {
        let file = parse("rule Notify { when: u: User.status becomes suspended }");
        let Trigger::StateChange {
            binding,
            entity,
            field,
            value,
            ..
        } = &file.rules[0].trigger
        else {
            panic!("expected state-change trigger");
        };
        assert_eq!(binding, "u");
        assert_eq!(entity, "User");
        assert_eq!(field, "status");
        assert!(value.is_ident("suspended"));
    }

    #[test]
    fn test_temporal_vs_derived_trigger() {
        let file = parse("rule Expire { when: deadline < now }");
        assert!(matches!(&file.rules[0].trigger, Trigger::Temporal { .. }));

        let file = parse("rule Expire { when: deadline < cutoff }");
        assert!(matches!(&file.rules[0].trigger, Trigger::Derived { .. }));

        // `now` alone is not an ordering comparison
        let file = parse("rule Expire { when: expired = now }");
        assert!(matches!(&file.rules[0].trigger, Trigger::Derived { .. }));
    }

    #[test]
    fn test_rule_without_trigger_is_error() {
        let err = parse_err("rule Orphan { requires: x }");
        assert!(err.message.contains("no 'when' trigger"));
    }

    #[test]
    fn test_first_error_aborts() {
        let err = parse_err("entity { }");
        assert_eq!(err.loc.line, 1);
        assert!(err.message.contains("found '{'"));
    }

    #[test]
    fn test_field_loc_points_at_type() {
        let file = parse("entity Post { author: Usr }");
        let field = &file.entities[0].fields[0];
        assert_eq!((field.loc.line, field.loc.col), (1, 23));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "entity User { email: Email }\nrule R { when: X(u)  ensures: u.ok }";
        assert_eq!(parse(source), parse(source));
    }
}
