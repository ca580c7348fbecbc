//! Enum value validation pass.
//!
//! Runs independently of the reference checker and does not use the
//! bound-variable set. Three patterns are checked:
//!
//! 1. **State-change triggers** — `u: Entity.field becomes value`. A value
//!    identifier outside the field's declared members always flags, with a
//!    suggestion when one exists.
//! 2. **Comparisons** — `object.field = ident` (or `!=`, either orientation)
//!    inside requires/ensures expressions and entity derived expressions.
//!    An identifier outside the members flags, except that a lowercase
//!    identifier with no close member is assumed to be a variable and
//!    ignored.
//! 3. **Entity creation** — `Entity.created(field: ident)`. Flags only when
//!    a close member exists; without a plausible typo candidate the
//!    identifier is assumed to be a variable reference.
//!
//! Only the trivial case of a bare identifier object is resolved to a
//! declared type; deeper expressions are skipped silently.

use crate::ast::{AlliumFile, BinaryOp, Expr, ExprKind, Trigger};
use crate::distance;
use crate::error::Diagnostic;
use crate::loc::Loc;
use crate::symbols::{SymbolTable, TypeInfo};

/// Check enum-typed field uses across the file.
pub fn check_enums(file: &AlliumFile, table: &SymbolTable, filename: &str) -> Vec<Diagnostic> {
    let mut checker = EnumChecker {
        table,
        file: filename,
        diagnostics: Vec::new(),
    };
    checker.check_file(file);
    checker.diagnostics
}

struct EnumChecker<'a> {
    table: &'a SymbolTable,
    file: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> EnumChecker<'a> {
    fn check_file(&mut self, file: &AlliumFile) {
        for rule in &file.rules {
            if let Trigger::StateChange {
                entity,
                field,
                value,
                ..
            } = &rule.trigger
            {
                self.check_assignment(entity, field, value);
            }
            for expr in &rule.requires {
                self.walk(expr);
            }
            for expr in &rule.ensures {
                self.walk(expr);
            }
        }

        for decl in &file.entities {
            for derived in &decl.deriveds {
                self.walk(&derived.expr);
            }
        }
    }

    /// Direct assignment from a state-change trigger: always flags.
    fn check_assignment(&mut self, entity: &str, field: &str, value: &Expr) {
        let ExprKind::Ident(name) = &value.kind else {
            return;
        };
        let Some(members) = self
            .table
            .type_info(entity)
            .and_then(|info| info.enum_members(field))
        else {
            return;
        };
        if members.iter().any(|m| m == name) {
            return;
        }
        let suggestion = distance::closest_match(name, members.iter().map(String::as_str));
        self.emit(value.loc, field, name, members, suggestion);
    }

    /// Recurse collecting enum-comparison and entity-creation patterns.
    fn walk(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Eq | BinaryOp::Ne,
                left,
                right,
            } => {
                self.check_comparison(left, right);
                self.check_comparison(right, left);
                self.walk(left);
                self.walk(right);
            }
            ExprKind::Binary { left, right, .. } => {
                self.walk(left);
                self.walk(right);
            }
            ExprKind::Unary { operand, .. } => self.walk(operand),
            ExprKind::FieldAccess { object, .. } => self.walk(object),
            ExprKind::Call { callee, args } => {
                self.walk(callee);
                for arg in args {
                    self.walk(arg);
                }
            }
            ExprKind::Lambda { body, .. } => self.walk(body),
            ExprKind::JoinLookup { keys, .. } => {
                for (_, value) in keys {
                    self.walk(value);
                }
            }
            ExprKind::EntityCreated { entity, fields } => {
                self.check_creation(entity, fields);
                for (_, value) in fields {
                    self.walk(value);
                }
            }
            ExprKind::Ident(_)
            | ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::EnumValue(_) => {}
        }
    }

    /// `object.field = ident` with a bare-identifier object.
    fn check_comparison(&mut self, access: &Expr, other: &Expr) {
        let ExprKind::FieldAccess { object, field } = &access.kind else {
            return;
        };
        let ExprKind::Ident(obj) = &object.kind else {
            return;
        };
        let ExprKind::Ident(name) = &other.kind else {
            return;
        };
        let Some(info) = self.resolve_object(obj) else {
            return;
        };
        let Some(members) = info.enum_members(field) else {
            return;
        };
        if members.iter().any(|m| m == name) {
            return;
        }

        let suggestion = distance::closest_match(name, members.iter().map(String::as_str));
        if starts_lowercase(name) && suggestion.is_none() {
            // assumed to be a variable
            return;
        }
        self.emit(other.loc, field, name, members, suggestion);
    }

    /// Entity-creation initialisers: flags only with a plausible typo
    /// candidate.
    fn check_creation(&mut self, entity: &str, fields: &[(String, Expr)]) {
        let Some(info) = self.table.type_info(entity) else {
            return;
        };
        for (field, value) in fields {
            let ExprKind::Ident(name) = &value.kind else {
                continue;
            };
            let Some(members) = info.enum_members(field) else {
                continue;
            };
            if members.iter().any(|m| m == name) {
                continue;
            }
            if let Some(suggestion) =
                distance::closest_match(name, members.iter().map(String::as_str))
            {
                self.emit(value.loc, field, name, members, Some(suggestion));
            }
        }
    }

    /// Resolve a bare identifier to a declared type: exact match first,
    /// then the first case-insensitive match in declaration order.
    fn resolve_object(&self, name: &str) -> Option<&'a TypeInfo> {
        if let Some(info) = self.table.type_info(name) {
            return Some(info);
        }
        self.table
            .types
            .values()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    }

    fn emit(
        &mut self,
        loc: Loc,
        field: &str,
        value: &str,
        members: &[String],
        suggestion: Option<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            file: self.file.to_string(),
            loc,
            message: format!(
                "invalid enum value '{}' for field '{}' (expected: {})",
                value,
                field,
                members.join(" | ")
            ),
            suggestion,
        });
    }
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}
