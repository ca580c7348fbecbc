//! Abstract syntax tree for Allium source files.
//!
//! The parser produces an [`AlliumFile`] carrying the file's declarations in
//! source order. The tree is immutable once produced: the symbol-table
//! builder and the checkers consume it read-only.
//!
//! Every node carries a [`Loc`] referencing the source of the checked file;
//! there is no cross-file resolution.

mod expr;

pub use expr::{contains_identifier, BinaryOp, Expr, ExprKind, UnaryOp};

use crate::loc::Loc;
use serde::{Deserialize, Serialize};

/// Type names recognized as primitives; any other bare identifier in type
/// position is an entity reference.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "String",
    "Integer",
    "Decimal",
    "Boolean",
    "Timestamp",
    "Duration",
    "Email",
    "URL",
];

/// A parsed source file.
///
/// Seven ordered collections, one per top-level declaration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlliumFile {
    /// `external entity Name { fields }`
    pub externals: Vec<TypeDecl>,
    /// `value Name { fields }`
    pub values: Vec<TypeDecl>,
    /// `entity Name { members }`
    pub entities: Vec<TypeDecl>,
    /// `default name: expr`
    pub defaults: Vec<DefaultDecl>,
    /// `rule Name { ... }`
    pub rules: Vec<Rule>,
    /// `deferred Name: "text"`
    pub deferred: Vec<DeferredSpec>,
    /// `open question: "text"`
    pub open_questions: Vec<OpenQuestion>,
}

/// An entity-like declaration: external entity, value type, or entity.
///
/// External entities and value types carry fields only; their other member
/// lists stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub relationships: Vec<Relationship>,
    pub projections: Vec<Projection>,
    pub deriveds: Vec<Derived>,
    pub loc: Loc,
}

impl TypeDecl {
    /// A declaration with the given name and no members yet.
    pub fn new(name: impl Into<String>, loc: Loc) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relationships: Vec::new(),
            projections: Vec::new(),
            deriveds: Vec::new(),
            loc,
        }
    }
}

/// A field member: `name : type`.
///
/// `loc` is the location where the type expression begins, so type
/// diagnostics (including those for wrapped inner types) point at the
/// offending type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub loc: Loc,
}

/// A type expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// One of [`PRIMITIVE_TYPES`]
    Primitive(String),
    /// A reference to a declared type
    EntityRef(String),
    /// Pipe-separated member names, in declaration order
    Enum(Vec<String>),
    /// `T?`
    Optional(Box<TypeExpr>),
    /// `Set<T>`
    Set(Box<TypeExpr>),
    /// `List<T>`
    List(Box<TypeExpr>),
}

/// A relationship member: `name : Target for this condition`.
///
/// `loc` points at the target entity name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub target: String,
    /// Opaque condition identifier; not resolved by the checker
    pub condition: String,
    pub loc: Loc,
}

/// A projection member: `name : source with filter`.
///
/// `loc` points at the source relationship name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
    pub source: String,
    pub filter: Expr,
    pub loc: Loc,
}

/// A derived member: `name : expr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    pub name: String,
    pub expr: Expr,
    pub loc: Loc,
}

/// A default declaration: `default name: expr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultDecl {
    pub name: String,
    pub value: Expr,
    pub loc: Loc,
}

/// A rule declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub trigger: Trigger,
    pub lets: Vec<LetBinding>,
    pub requires: Vec<Expr>,
    pub ensures: Vec<Expr>,
    pub loc: Loc,
}

/// A `let name = expr` binding inside a rule body.
///
/// Bindings are visible to subsequent lets and to the rule's requires and
/// ensures expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: String,
    pub value: Expr,
    pub loc: Loc,
}

/// The condition under which a rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    /// `name(param, opt?)` — an external stimulus
    Stimulus {
        name: String,
        params: Vec<TriggerParam>,
        loc: Loc,
    },
    /// `b: Entity.field becomes expr`
    ///
    /// `loc` points at the entity name.
    StateChange {
        binding: String,
        entity: String,
        field: String,
        value: Box<Expr>,
        loc: Loc,
    },
    /// `b: Entity.created`
    ///
    /// `loc` points at the entity name.
    Created {
        binding: String,
        entity: String,
        loc: Loc,
    },
    /// An ordering comparison mentioning `now`
    Temporal { expr: Expr },
    /// Any other trigger expression
    Derived { expr: Expr },
    /// Produced by rule composition rather than by the parser; reserved.
    Chained {
        name: String,
        params: Vec<String>,
        loc: Loc,
    },
}

/// A stimulus parameter: `name` or `name?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerParam {
    pub name: String,
    pub optional: bool,
    pub loc: Loc,
}

/// A deferred specification: `deferred Name: "text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredSpec {
    pub name: String,
    pub text: String,
    pub loc: Loc,
}

/// An open question: `open question: "text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub text: String,
    pub loc: Loc,
}
