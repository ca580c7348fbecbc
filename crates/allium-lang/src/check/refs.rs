//! Reference resolution pass.
//!
//! Walks the tree and verifies that every name in use resolves to a
//! declared type, a bound variable, or a builtin.
//!
//! # What this pass does
//!
//! 1. **Resolves field types** — entity references must name declared types
//! 2. **Resolves relationship targets and projection sources**
//! 3. **Scope checking** — trigger parameters, let bindings, lambda
//!    parameters, and entity members bind names for the expressions that
//!    can see them
//! 4. **Suggestions** — undefined names carry a close candidate when one
//!    exists
//!
//! # What this pass does NOT do
//!
//! - **No type inference** — the field name of `object.field` is not
//!   checked; only the object expression is
//! - **No enum validation** — that's the enum pass
//!
//! # Scoping rules
//!
//! A single mutable set of bound variables tracks the scope being examined.
//! It is cleared at the start of each rule and at the start of each entity's
//! projection/derived phase. Lambda parameters are removed on exit only when
//! they were not already bound outside the lambda.
//!
//! # Enum context
//!
//! Certain right-hand positions (`=`, `!=`, `in`, `__array` arguments,
//! entity-creation field values) are likely enum-member references rather
//! than variable uses. Under that flag, a lowercase identifier is accepted
//! silently instead of being reported as undefined.

use crate::ast::{AlliumFile, BinaryOp, Expr, ExprKind, Rule, Trigger, TypeDecl, TypeExpr};
use crate::distance;
use crate::error::Diagnostic;
use crate::loc::Loc;
use crate::symbols::SymbolTable;
use indexmap::IndexSet;

/// Names treated as predefined.
const BUILTINS: &[&str] = &[
    "now", "true", "false", "null", "verify", "send", "notify", "__array",
];

/// Identifiers with this prefix are configuration references, also builtin.
const CONFIG_PREFIX: &str = "config/";

/// Check every name reference in the file.
pub fn check_references(file: &AlliumFile, table: &SymbolTable, filename: &str) -> Vec<Diagnostic> {
    let mut checker = ReferenceChecker {
        table,
        file: filename,
        bound: IndexSet::new(),
        diagnostics: Vec::new(),
    };
    checker.check_file(file);
    checker.diagnostics
}

struct ReferenceChecker<'a> {
    table: &'a SymbolTable,
    file: &'a str,
    /// Bound variables for the scope currently being examined
    bound: IndexSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ReferenceChecker<'_> {
    fn check_file(&mut self, file: &AlliumFile) {
        for decl in &file.externals {
            self.check_value_fields(decl);
        }
        for decl in &file.values {
            self.check_value_fields(decl);
        }
        for decl in &file.entities {
            self.check_entity(decl);
        }
        for rule in &file.rules {
            self.check_rule(rule);
        }
    }

    /// Fields of a value type or external entity.
    fn check_value_fields(&mut self, decl: &TypeDecl) {
        for field in &decl.fields {
            self.resolve_type(&field.ty, field.loc, "type");
        }
    }

    /// Resolve a field's type expression.
    ///
    /// Primitives and enums are always valid; wrappers delegate to their
    /// inner type using the containing field's location.
    fn resolve_type(&mut self, ty: &TypeExpr, loc: Loc, label: &str) {
        match ty {
            TypeExpr::Primitive(_) | TypeExpr::Enum(_) => {}
            TypeExpr::EntityRef(name) => {
                if !self.table.has_type(name) {
                    let suggestion = self.suggest_type(name);
                    self.emit(loc, format!("undefined {} '{}'", label, name), suggestion);
                }
            }
            TypeExpr::Optional(inner) | TypeExpr::Set(inner) | TypeExpr::List(inner) => {
                self.resolve_type(inner, loc, label);
            }
        }
    }

    fn check_entity(&mut self, decl: &TypeDecl) {
        for field in &decl.fields {
            self.resolve_type(&field.ty, field.loc, "entity");
        }

        for rel in &decl.relationships {
            if !self.table.has_type(&rel.target) {
                let suggestion = self.suggest_type(&rel.target);
                self.emit(
                    rel.loc,
                    format!("undefined entity '{}'", rel.target),
                    suggestion,
                );
            }
        }

        for proj in &decl.projections {
            if !decl.relationships.iter().any(|r| r.name == proj.source) {
                let suggestion = distance::closest_match(
                    &proj.source,
                    decl.relationships.iter().map(|r| r.name.as_str()),
                );
                self.emit(
                    proj.loc,
                    format!("undefined relationship '{}'", proj.source),
                    suggestion,
                );
            }
        }

        // projection filters and derived expressions see all of the
        // entity's members
        self.bound.clear();
        for field in &decl.fields {
            self.bound.insert(field.name.clone());
        }
        for rel in &decl.relationships {
            self.bound.insert(rel.name.clone());
        }
        for proj in &decl.projections {
            self.bound.insert(proj.name.clone());
        }
        for derived in &decl.deriveds {
            self.bound.insert(derived.name.clone());
        }

        for proj in &decl.projections {
            self.check_expr(&proj.filter, false);
        }
        for derived in &decl.deriveds {
            self.check_expr(&derived.expr, false);
        }

        self.bound.clear();
    }

    fn check_rule(&mut self, rule: &Rule) {
        self.bound.clear();

        match &rule.trigger {
            Trigger::Stimulus { params, .. } => {
                for param in params {
                    self.bound.insert(param.name.clone());
                }
            }
            Trigger::StateChange {
                binding,
                entity,
                field,
                value,
                loc,
            } => {
                if !self.table.has_type(entity) {
                    let suggestion = self.suggest_type(entity);
                    self.emit(*loc, format!("undefined entity '{}'", entity), suggestion);
                } else if let Some(info) = self.table.type_info(entity) {
                    let members = info.all_members();
                    if !members.contains_key(field) {
                        let suggestion =
                            distance::closest_match(field, members.keys().map(String::as_str));
                        self.emit(
                            *loc,
                            format!("undefined field '{}' on entity '{}'", field, entity),
                            suggestion,
                        );
                    }
                }
                self.bound.insert(binding.clone());
                self.check_expr(value, true);
            }
            Trigger::Created {
                binding,
                entity,
                loc,
            } => {
                if !self.table.has_type(entity) {
                    let suggestion = self.suggest_type(entity);
                    self.emit(*loc, format!("undefined entity '{}'", entity), suggestion);
                }
                self.bound.insert(binding.clone());
            }
            Trigger::Temporal { expr } | Trigger::Derived { expr } => {
                self.check_expr(expr, false);
            }
            Trigger::Chained { params, .. } => {
                for param in params {
                    self.bound.insert(param.clone());
                }
            }
        }

        // bindings are visible to subsequent lets, requires, and ensures
        for binding in &rule.lets {
            self.check_expr(&binding.value, false);
            self.bound.insert(binding.name.clone());
        }
        for expr in &rule.requires {
            self.check_expr(expr, false);
        }
        for expr in &rule.ensures {
            self.check_expr(expr, false);
        }
    }

    /// Check one expression under the given enum-context flag.
    fn check_expr(&mut self, expr: &Expr, enum_ctx: bool) {
        match &expr.kind {
            ExprKind::Ident(name) => {
                if self.is_defined(name) {
                    return;
                }
                if enum_ctx && is_enum_like(name) {
                    return;
                }
                let suggestion = distance::closest_match(
                    name,
                    self.bound
                        .iter()
                        .map(String::as_str)
                        .chain(self.table.type_names()),
                );
                self.emit(
                    expr.loc,
                    format!("undefined identifier '{}'", name),
                    suggestion,
                );
            }

            // literals are always valid
            ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::EnumValue(_) => {}

            // the field name itself is not checked: that would require
            // type inference
            ExprKind::FieldAccess { object, .. } => self.check_expr(object, enum_ctx),

            ExprKind::Call { callee, args } => {
                self.check_expr(callee, enum_ctx);
                // literal arrays in rules are overwhelmingly enum-value lists
                let arg_ctx = enum_ctx || callee.is_ident("__array");
                for arg in args {
                    self.check_expr(arg, arg_ctx);
                }
            }

            ExprKind::Binary { op, left, right } => {
                self.check_expr(left, enum_ctx);
                let right_ctx =
                    enum_ctx || matches!(op, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::In);
                self.check_expr(right, right_ctx);
            }

            ExprKind::Unary { operand, .. } => self.check_expr(operand, enum_ctx),

            ExprKind::Lambda { param, body } => {
                let shadowed = self.bound.contains(param);
                self.bound.insert(param.clone());
                self.check_expr(body, enum_ctx);
                if !shadowed {
                    self.bound.shift_remove(param);
                }
            }

            ExprKind::JoinLookup { entity, keys } => {
                if !self.table.has_type(entity) {
                    let suggestion = self.suggest_type(entity);
                    self.emit(
                        expr.loc,
                        format!("undefined entity '{}'", entity),
                        suggestion,
                    );
                }
                for (_, value) in keys {
                    self.check_expr(value, enum_ctx);
                }
            }

            ExprKind::EntityCreated { entity, fields } => {
                if !self.table.has_type(entity) {
                    let suggestion = self.suggest_type(entity);
                    self.emit(
                        expr.loc,
                        format!("undefined entity '{}'", entity),
                        suggestion,
                    );
                }
                // entity-creation field values are frequently enum literals
                for (_, value) in fields {
                    self.check_expr(value, true);
                }
            }
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.bound.contains(name)
            || self.table.has_type(name)
            || BUILTINS.contains(&name)
            || name.starts_with(CONFIG_PREFIX)
    }

    fn suggest_type(&self, name: &str) -> Option<String> {
        distance::closest_match(name, self.table.type_names())
    }

    fn emit(&mut self, loc: Loc, message: String, suggestion: Option<String>) {
        self.diagnostics.push(Diagnostic {
            file: self.file.to_string(),
            loc,
            message,
            suggestion,
        });
    }
}

/// Lowercase-underscore identifiers are presumed enum members under the
/// enum-context flag.
fn is_enum_like(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('a'..='z')) && chars.all(|c| matches!(c, 'a'..='z' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::loc::LineMap;
    use crate::parser;
    use crate::symbols::build_symbol_table;

    fn check(source: &str) -> Vec<Diagnostic> {
        let map = LineMap::new(source);
        let tokens = lex(source, &map);
        let file = parser::parse_file(&tokens, map.eof_loc()).expect("source should parse");
        let table = build_symbol_table(&file);
        check_references(&file, &table, "test.allium")
    }

    #[test]
    fn test_valid_spec_is_clean() {
        let diags = check(
            "entity User { email: Email  status: active | suspended }\n\
             entity Post { author: User }\n\
             rule SuspendUser {\n\
             \x20   when: AdminSuspends(user)\n\
             \x20   ensures: user.status = suspended\n\
             }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_undefined_entity_field_type_with_suggestion() {
        let diags = check(
            "entity User { email: Email }\n\
             entity Post { author: Usr }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined entity 'Usr'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("User"));
        assert_eq!((diags[0].loc.line, diags[0].loc.col), (2, 23));
    }

    #[test]
    fn test_undefined_value_field_type_without_suggestion() {
        let diags = check("value Card { profile: Proflie }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined type 'Proflie'");
        assert_eq!(diags[0].suggestion, None);
    }

    #[test]
    fn test_wrapped_types_delegate_to_inner() {
        let diags = check("entity User { friends: Set<Usr>  tags: List<String>? }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined entity 'Usr'");
        // reported at the containing field's location
        assert_eq!((diags[0].loc.line, diags[0].loc.col), (1, 24));
    }

    #[test]
    fn test_undefined_relationship_target_and_source() {
        let diags = check(
            "entity User { email: Email }\n\
             entity Order {\n\
             \x20   customer: Usr for this owner\n\
             \x20   recent: customers with true\n\
             }",
        );
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "undefined entity 'Usr'");
        assert_eq!(diags[1].message, "undefined relationship 'customers'");
        assert_eq!(diags[1].suggestion.as_deref(), Some("customer"));
    }

    #[test]
    fn test_entity_members_bound_in_derived() {
        let diags = check(
            "entity Order {\n\
             \x20   total: Decimal\n\
             \x20   doubled: total * 2\n\
             \x20   broken: missing + 1\n\
             }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'missing'");
    }

    #[test]
    fn test_entity_scope_cleared_between_entities() {
        let diags = check(
            "entity A { x: Integer }\n\
             entity B { y: x + 1 }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'x'");
    }

    #[test]
    fn test_undefined_identifier_suggests_bound_variable() {
        let diags = check(
            "entity User { status: active | suspended }\n\
             rule R {\n\
             \x20   when: X(user)\n\
             \x20   requires: usr.exists\n\
             \x20   ensures: user.status = suspended\n\
             }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'usr'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("user"));
    }

    #[test]
    fn test_let_bindings_visible_in_order() {
        let diags = check(
            "rule R {\n\
             \x20   when: X(u)\n\
             \x20   let a = u\n\
             \x20   let b = a\n\
             \x20   requires: b\n\
             }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);

        let diags = check(
            "rule R {\n\
             \x20   when: X(u)\n\
             \x20   let a = b\n\
             \x20   let b = u\n\
             }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'b'");
    }

    #[test]
    fn test_state_change_trigger_checks() {
        let diags = check(
            "entity User { status: active | suspended }\n\
             rule R { when: u: User.status becomes suspended  ensures: u.status }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);

        let diags = check("rule R { when: u: Usre.status becomes x }");
        assert_eq!(diags[0].message, "undefined entity 'Usre'");

        let diags = check(
            "entity User { status: active | suspended }\n\
             rule R { when: u: User.staus becomes suspended }",
        );
        assert_eq!(
            diags[0].message,
            "undefined field 'staus' on entity 'User'"
        );
        assert_eq!(diags[0].suggestion.as_deref(), Some("status"));
    }

    #[test]
    fn test_enum_context_accepts_lowercase_rhs() {
        // `pending_review` is neither bound nor declared, but sits on the
        // right of `=` so it reads as an enum member
        let diags = check("rule R { when: X(u)  requires: u.state = pending_review }");
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);

        // outside enum context the same identifier is undefined
        let diags = check("rule R { when: X(u)  requires: pending_review }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'pending_review'");
    }

    #[test]
    fn test_enum_context_rejects_uppercase_rhs() {
        let diags = check("rule R { when: X(u)  requires: u.state = PendingReview }");
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "undefined identifier 'PendingReview'"
        );
    }

    #[test]
    fn test_array_arguments_get_enum_context() {
        let diags = check("rule R { when: X(u)  requires: u.state in [active, suspended] }");
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_entity_created_values_get_enum_context() {
        let diags = check(
            "entity User { status: active | suspended }\n\
             rule R { when: X(e)  ensures: User.created(email: e, status: active) }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_lambda_parameter_scoping() {
        // parameter visible in the body, gone afterwards
        let diags = check("rule R { when: X(xs)  requires: xs.all(p => p.active) and p }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'p'");
    }

    #[test]
    fn test_lambda_does_not_unbind_outer_name() {
        // `u` is a trigger parameter; the lambda shadows and must not
        // remove it
        let diags = check("rule R { when: X(u)  requires: xs(u => u.active) and u }");
        assert_eq!(diags.len(), 1);
        // only the callee `xs` is undefined
        assert_eq!(diags[0].message, "undefined identifier 'xs'");
    }

    #[test]
    fn test_builtins_and_config_references() {
        let diags = check(
            "rule R {\n\
             \x20   when: X(u)\n\
             \x20   requires: verify(u) and notify(u) and send(u)\n\
             \x20   ensures: u.expires = now + config / retention\n\
             }",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_join_lookup_entity_checked() {
        let diags = check(
            "entity User { email: Email }\n\
             rule R { when: X(e)  requires: Usr{email: e} }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined entity 'Usr'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("User"));
    }

    #[test]
    fn test_type_lookup_is_case_sensitive() {
        let diags = check(
            "entity User { email: Email }\n\
             rule R { when: X(p)  requires: user }",
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "undefined identifier 'user'");
        assert_eq!(diags[0].suggestion.as_deref(), Some("User"));
    }
}
