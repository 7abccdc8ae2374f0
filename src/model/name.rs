//! Unresolved dotted names captured at their use site.

use std::hash::{Hash, Hasher};

use super::definition::{DefinitionClass, TypeCategory};
use super::{DefId, ScopeGraph};

/// Split a type expression into dotted name components.
///
/// Everything from the first `[`, `(` or `<` onwards (type arguments, array
/// dimensions, call arguments) is dropped. Empty components are discarded.
pub fn name_list(text: &str) -> Vec<String> {
    let end = text.find(['[', '(', '<']).unwrap_or(text.len());
    text[..end]
        .split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// A dotted name bound to the scope in which it occurred.
///
/// Equality and hashing consider only the scope and the name components, not
/// what the name eventually resolves to.
#[derive(Debug, Clone)]
pub struct QualifiedName {
    scope: DefId,
    names: Vec<String>,
    display: String,
    within_scope: bool,
}

impl QualifiedName {
    pub fn new(scope: DefId, names: Vec<String>, display: impl Into<String>) -> Self {
        Self {
            scope,
            names,
            display: display.into(),
            within_scope: false,
        }
    }

    /// Build a name from source text, splitting it with [`name_list`].
    pub fn parse(scope: DefId, text: &str) -> Self {
        let display = text.trim();
        Self::new(scope, name_list(display), display)
    }

    /// Start resolution at the scope itself rather than at its container.
    pub fn within_scope(mut self, within: bool) -> Self {
        self.within_scope = within;
        self
    }

    pub fn scope(&self) -> DefId {
        self.scope
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// Lazily resolve this name to matching definitions.
    ///
    /// Yields nothing when the name cannot be resolved.
    pub fn resolve<'a>(
        &'a self,
        graph: &'a ScopeGraph,
        class: DefinitionClass,
    ) -> Box<dyn Iterator<Item = DefId> + 'a> {
        let start = if self.within_scope {
            Some(self.scope)
        } else {
            graph.get(self.scope).and_then(|d| d.containing())
        };
        match start {
            Some(scope) => graph.resolve(scope, class, &self.names),
            None => Box::new(std::iter::empty()),
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.names == other.names
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scope.hash(state);
        self.names.hash(state);
    }
}

/// A qualified name that refers to a type, plus hints used when the type
/// turns out to be external to the project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTypeName {
    name: QualifiedName,
    category_hint: TypeCategory,
    construct_hint: Option<String>,
}

impl QualifiedTypeName {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            category_hint: TypeCategory::Other,
            construct_hint: None,
        }
    }

    /// Shorthand for `QualifiedTypeName::new(QualifiedName::parse(..))`.
    pub fn parse(scope: DefId, text: &str) -> Self {
        Self::new(QualifiedName::parse(scope, text))
    }

    pub fn category_hint(mut self, category: TypeCategory) -> Self {
        self.category_hint = category;
        self
    }

    pub fn construct_hint(mut self, construct: impl Into<String>) -> Self {
        self.construct_hint = Some(construct.into());
        self
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn display(&self) -> &str {
        self.name.display()
    }

    pub fn category(&self) -> TypeCategory {
        self.category_hint
    }

    /// The construct hint, defaulting to the category's generic name.
    pub fn construct(&self) -> &str {
        self.construct_hint
            .as_deref()
            .unwrap_or_else(|| self.category_hint.generic_name())
    }

    /// Lazily resolve to type definitions.
    pub fn resolve<'a>(&'a self, graph: &'a ScopeGraph) -> Box<dyn Iterator<Item = DefId> + 'a> {
        self.name.resolve(graph, DefinitionClass::Type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_list_strips_arguments() {
        assert_eq!(name_list("java.util.List<String>"), vec!["java", "util", "List"]);
        assert_eq!(name_list("Optional[int]"), vec!["Optional"]);
        assert_eq!(name_list(" a . b "), vec!["a", "b"]);
        assert_eq!(name_list("int[]"), vec!["int"]);
        assert!(name_list("").is_empty());
    }

    #[test]
    fn test_equality_ignores_display() {
        let a = QualifiedName::new(DefId::new(3), vec!["A".into()], "A");
        let b = QualifiedName::new(DefId::new(3), vec!["A".into()], "A<T>");
        let c = QualifiedName::new(DefId::new(4), vec!["A".into()], "A");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_type_name_hints() {
        let name = QualifiedTypeName::parse(DefId::new(1), "Runnable");
        assert_eq!(name.construct(), "type");
        let name = name.category_hint(TypeCategory::Interface);
        assert_eq!(name.construct(), "interface");
        let name = name.construct_hint("record");
        assert_eq!(name.construct(), "record");
    }
}
