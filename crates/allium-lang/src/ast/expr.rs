//! Expression AST produced by the parser.
//!
//! Expressions are simple syntactic structures: no type information, just
//! structure plus source locations. The checkers walk them with exhaustive
//! matches so that every new kind must be handled at every walker site.

use crate::loc::Loc;
use serde::{Deserialize, Serialize};

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Expression kind (what kind of expression this is)
    pub kind: ExprKind,
    /// Source location for error messages
    pub loc: Loc,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, loc: Loc) -> Self {
        Self { kind, loc }
    }

    /// Create an identifier expression.
    pub fn ident(name: impl Into<String>, loc: Loc) -> Self {
        Self::new(ExprKind::Ident(name.into()), loc)
    }

    /// True when this expression is the given bare identifier.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, ExprKind::Ident(n) if n == name)
    }

    /// The identifier name, when this expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A bare identifier: a variable, type, or builtin reference
    Ident(String),
    /// Number literal, kept as written
    Number(String),
    /// String literal (quotes stripped, escapes resolved)
    Str(String),
    /// Boolean literal
    Bool(bool),
    /// Null literal
    Null,
    /// Resolved enum member literal.
    ///
    /// Reserved for rule composition tooling; the parser does not produce it.
    EnumValue(String),
    /// Field access: `object.field`
    FieldAccess { object: Box<Expr>, field: String },
    /// Call: `callee(args)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Binary operator application
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operator application
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Lambda: `param => body`
    Lambda { param: String, body: Box<Expr> },
    /// Join lookup on an entity: `Entity{ field: value, shorthand }`
    JoinLookup {
        entity: String,
        keys: Vec<(String, Expr)>,
    },
    /// Entity creation: `Entity.created(field: value, ...)`
    EntityCreated {
        entity: String,
        fields: Vec<(String, Expr)>,
    },
}

/// Binary operators, lowest to highest precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    With,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// True for the ordering comparisons `<`, `<=`, `>`, `>=`.
    pub fn is_ordering(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// True when `name` occurs as a bare identifier anywhere in the expression.
pub fn contains_identifier(expr: &Expr, name: &str) -> bool {
    match &expr.kind {
        ExprKind::Ident(n) => n == name,
        ExprKind::Number(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::EnumValue(_) => false,
        ExprKind::FieldAccess { object, .. } => contains_identifier(object, name),
        ExprKind::Call { callee, args } => {
            contains_identifier(callee, name) || args.iter().any(|a| contains_identifier(a, name))
        }
        ExprKind::Binary { left, right, .. } => {
            contains_identifier(left, name) || contains_identifier(right, name)
        }
        ExprKind::Unary { operand, .. } => contains_identifier(operand, name),
        ExprKind::Lambda { body, .. } => contains_identifier(body, name),
        ExprKind::JoinLookup { keys, .. } => {
            keys.iter().any(|(_, value)| contains_identifier(value, name))
        }
        ExprKind::EntityCreated { fields, .. } => fields
            .iter()
            .any(|(_, value)| contains_identifier(value, name)),
    }
}
