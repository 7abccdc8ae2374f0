//! Definition records stored in the scope graph.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::imports::{Import, ImportSupplier};
use super::name::QualifiedTypeName;
use super::{DefId, FileId, Modifier, Span};

/// Broad classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    Class,
    Interface,
    Other,
}

impl TypeCategory {
    /// Construct keyword used when nothing more specific is known.
    pub fn generic_name(&self) -> &'static str {
        match self {
            TypeCategory::Class => "class",
            TypeCategory::Interface => "interface",
            TypeCategory::Other => "type",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generic_name())
    }
}

/// Attributes shared by every declaration occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    /// Owning source file; synthetic definitions have none.
    pub file: Option<FileId>,
    pub span: Option<Span>,
    pub modifiers: BTreeSet<Modifier>,
}

impl Definition {
    /// A synthetic definition with no source location.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            span: None,
            modifiers: BTreeSet::new(),
        }
    }

    /// A definition found at `span` within `file`.
    pub fn located(name: impl Into<String>, file: FileId, span: Span) -> Self {
        Self {
            name: name.into(),
            file: Some(file),
            span: Some(span),
            modifiers: BTreeSet::new(),
        }
    }

    pub fn has(&self, modifier: &Modifier) -> bool {
        self.modifiers.contains(modifier)
    }

    pub fn has_any(&self, modifiers: &[Modifier]) -> bool {
        modifiers.iter().any(|m| self.modifiers.contains(m))
    }
}

/// A type declaration: class, interface, record, enum, or anonymous class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub category: TypeCategory,
    /// Keyword used to display the type, e.g. `class` or `record`.
    pub construct: String,
    pub super_types: Vec<QualifiedTypeName>,
    pub meta_type: Option<QualifiedTypeName>,
}

impl TypeDefinition {
    pub fn new(category: TypeCategory, construct: impl Into<String>) -> Self {
        Self {
            category,
            construct: construct.into(),
            super_types: Vec::new(),
            meta_type: None,
        }
    }

    /// Record a super type, ignoring repeats of the same reference.
    pub fn add_super_type(&mut self, name: QualifiedTypeName) {
        if !self.super_types.contains(&name) {
            self.super_types.push(name);
        }
    }
}

/// A method, function, or constructor declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodDefinition {
    pub return_type: Option<QualifiedTypeName>,
    pub constructor: bool,
    pub parameters: Vec<ParameterDefinition>,
    pub exceptions: Vec<QualifiedTypeName>,
}

/// A formal parameter. Parameters are not scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub def: Definition,
    pub ty: Option<QualifiedTypeName>,
    pub default_value: Option<String>,
    /// Receiver supplied by the language (`self`, `cls`).
    pub implicit: bool,
}

impl ParameterDefinition {
    pub fn new(def: Definition) -> Self {
        Self {
            def,
            ty: None,
            default_value: None,
            implicit: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}

impl fmt::Display for ParameterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{} {}", ty.display(), self.def.name),
            None => write!(f, "{}", self.def.name),
        }
    }
}

/// What kind of scope a [`ScopedDefinition`] is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// Root of one language's project.
    Project { language: String },
    /// A package or module (`construct` is "package" or "module").
    Package { construct: String },
    /// A compilation unit. Transparent to dotted-name matching.
    File,
    Type(TypeDefinition),
    Method(MethodDefinition),
}

/// Which definitions a resolution request accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionClass {
    Any,
    Package,
    Type,
    Method,
}

impl DefinitionClass {
    pub fn accepts(&self, kind: &ScopeKind) -> bool {
        match self {
            DefinitionClass::Any => true,
            DefinitionClass::Package => matches!(kind, ScopeKind::Package { .. }),
            DefinitionClass::Type => matches!(kind, ScopeKind::Type(_)),
            DefinitionClass::Method => matches!(kind, ScopeKind::Method(_)),
        }
    }
}

/// A definition that may contain further definitions.
#[derive(Debug, Clone)]
pub struct ScopedDefinition {
    pub def: Definition,
    pub kind: ScopeKind,
    /// Type parameter text, e.g. `<T extends Comparable<T>>`.
    pub type_params: Option<String>,
    pub(super) containing: Option<DefId>,
    pub(super) nested: Vec<DefId>,
    pub(super) suppliers: Vec<ImportSupplier>,
    pub(super) imports: OnceCell<Vec<Import>>,
}

impl ScopedDefinition {
    pub fn new(def: Definition, kind: ScopeKind) -> Self {
        Self {
            def,
            kind,
            type_params: None,
            containing: None,
            nested: Vec::new(),
            suppliers: Vec::new(),
            imports: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn containing(&self) -> Option<DefId> {
        self.containing
    }

    pub fn nested(&self) -> &[DefId] {
        &self.nested
    }

    pub fn import_suppliers(&self) -> &[ImportSupplier] {
        &self.suppliers
    }

    /// Whether unresolved lookups may continue into the containing scope.
    pub fn is_ascendable(&self) -> bool {
        matches!(
            self.kind,
            ScopeKind::File | ScopeKind::Type(_) | ScopeKind::Method(_)
        )
    }

    /// Whether dotted names may continue through this scope into its children.
    pub fn is_descendable(&self) -> bool {
        matches!(self.kind, ScopeKind::Package { .. } | ScopeKind::Type(_))
    }

    /// Whether name matching passes straight through to the children.
    pub fn is_transparent(&self) -> bool {
        matches!(self.kind, ScopeKind::File)
    }

    pub fn as_type(&self) -> Option<&TypeDefinition> {
        match &self.kind {
            ScopeKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_type_mut(&mut self) -> Option<&mut TypeDefinition> {
        match &mut self.kind {
            ScopeKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDefinition> {
        match &self.kind {
            ScopeKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_method_mut(&mut self) -> Option<&mut MethodDefinition> {
        match &mut self.kind {
            ScopeKind::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Keyword describing this scope for display.
    pub fn construct(&self) -> &str {
        match &self.kind {
            ScopeKind::Project { .. } => "project",
            ScopeKind::Package { construct } => construct,
            ScopeKind::File => "file",
            ScopeKind::Type(t) => &t.construct,
            ScopeKind::Method(m) if m.constructor => "constructor",
            ScopeKind::Method(_) => "method",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_flags_by_kind() {
        let package = ScopedDefinition::new(
            Definition::new("p"),
            ScopeKind::Package {
                construct: "package".into(),
            },
        );
        assert!(package.is_descendable());
        assert!(!package.is_ascendable());

        let method = ScopedDefinition::new(
            Definition::new("m"),
            ScopeKind::Method(MethodDefinition::default()),
        );
        assert!(method.is_ascendable());
        assert!(!method.is_descendable());

        let file = ScopedDefinition::new(Definition::new("A.java"), ScopeKind::File);
        assert!(file.is_transparent());
        assert!(file.is_ascendable());
    }

    #[test]
    fn test_definition_class_filter() {
        let kind = ScopeKind::Type(TypeDefinition::new(TypeCategory::Class, "class"));
        assert!(DefinitionClass::Type.accepts(&kind));
        assert!(DefinitionClass::Any.accepts(&kind));
        assert!(!DefinitionClass::Method.accepts(&kind));
    }

    #[test]
    fn test_modifier_queries() {
        let mut def = Definition::new("x");
        assert!(!def.has_any(&[Modifier::Private, Modifier::Static]));
        def.modifiers.insert(Modifier::Static);
        assert!(def.has(&Modifier::Static));
        assert!(def.has_any(&[Modifier::Private, Modifier::Static]));
    }
}
