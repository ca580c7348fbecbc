//! Symbol table built from a parsed file.
//!
//! A single linear pass over the file's declaration collections summarises
//! declared types and their members for the checkers. The pass is total:
//! duplicate top-level names silently overwrite (last one wins).

use crate::ast::{AlliumFile, DefaultDecl, Rule, TypeDecl, TypeExpr};
use indexmap::{IndexMap, IndexSet};

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Entity,
    Value,
    External,
}

/// Which member category a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Relationship,
    Projection,
    Derived,
}

/// A declared field's type, with its enum members when the declared type is
/// directly an enum.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub ty: TypeExpr,
    /// Allowed member names in declaration order; duplicates kept as given.
    pub enum_members: Option<Vec<String>>,
}

/// Summary of one declared type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub name: String,
    pub fields: IndexMap<String, FieldInfo>,
    /// Relationship name → target entity name (entities only)
    pub relationships: IndexMap<String, String>,
    /// Projection name → source relationship name (entities only)
    pub projections: IndexMap<String, String>,
    /// Derived member names (entities only)
    pub deriveds: IndexSet<String>,
}

impl TypeInfo {
    fn from_decl(kind: TypeKind, decl: &TypeDecl) -> Self {
        let mut info = Self {
            kind,
            name: decl.name.clone(),
            fields: IndexMap::new(),
            relationships: IndexMap::new(),
            projections: IndexMap::new(),
            deriveds: IndexSet::new(),
        };

        for field in &decl.fields {
            let enum_members = match &field.ty {
                TypeExpr::Enum(members) => Some(members.clone()),
                _ => None,
            };
            info.fields.insert(
                field.name.clone(),
                FieldInfo {
                    ty: field.ty.clone(),
                    enum_members,
                },
            );
        }
        for rel in &decl.relationships {
            info.relationships
                .insert(rel.name.clone(), rel.target.clone());
        }
        for proj in &decl.projections {
            info.projections
                .insert(proj.name.clone(), proj.source.clone());
        }
        for derived in &decl.deriveds {
            info.deriveds.insert(derived.name.clone());
        }

        info
    }

    /// All member names with their category tag.
    ///
    /// Insertion order is field, relationship, projection, derived; a name
    /// colliding across categories keeps the tag inserted last.
    pub fn all_members(&self) -> IndexMap<String, MemberKind> {
        let mut members = IndexMap::new();
        for name in self.fields.keys() {
            members.insert(name.clone(), MemberKind::Field);
        }
        for name in self.relationships.keys() {
            members.insert(name.clone(), MemberKind::Relationship);
        }
        for name in self.projections.keys() {
            members.insert(name.clone(), MemberKind::Projection);
        }
        for name in &self.deriveds {
            members.insert(name.clone(), MemberKind::Derived);
        }
        members
    }

    /// The declared enum members of a field, when it has any.
    pub fn enum_members(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field)?.enum_members.as_deref()
    }
}

/// Index of all declarations in a file.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Declared type name → summary
    pub types: IndexMap<String, TypeInfo>,
    /// Default name → declaration; indexed but not cross-checked
    pub defaults: IndexMap<String, DefaultDecl>,
    /// Rule name → declaration; indexed but not cross-checked
    pub rules: IndexMap<String, Rule>,
}

impl SymbolTable {
    /// Check if a name is a declared type.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Look up a declared type.
    pub fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    /// All declared type names, in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Build the symbol table from a parsed file.
pub fn build_symbol_table(file: &AlliumFile) -> SymbolTable {
    let mut table = SymbolTable::default();

    for decl in &file.externals {
        table
            .types
            .insert(decl.name.clone(), TypeInfo::from_decl(TypeKind::External, decl));
    }
    for decl in &file.values {
        table
            .types
            .insert(decl.name.clone(), TypeInfo::from_decl(TypeKind::Value, decl));
    }
    for decl in &file.entities {
        table
            .types
            .insert(decl.name.clone(), TypeInfo::from_decl(TypeKind::Entity, decl));
    }

    for default in &file.defaults {
        table.defaults.insert(default.name.clone(), default.clone());
    }
    for rule in &file.rules {
        table.rules.insert(rule.name.clone(), rule.clone());
    }

    table
}
