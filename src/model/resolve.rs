//! Lazy name resolution over a completed scope graph.
//!
//! Resolution at a scope yields, in order: matches among the scope's own
//! children, matches reached through its imports, and (if the scope is
//! ascendable) everything the containing scope resolves. Results are
//! concatenated, and several distinct candidates may come back; callers take
//! the first. A definition reached twice (through its file scope and again
//! through the enclosing package) is reported once.

use std::collections::HashSet;
use std::iter;

use super::definition::DefinitionClass;
use super::imports::{Import, ImportSupplier};
use super::{DefId, ScopeGraph};

type Candidates<'a> = Box<dyn Iterator<Item = DefId> + 'a>;

impl ScopeGraph {
    /// Resolve `names` starting at `scope`.
    pub fn resolve<'a>(
        &'a self,
        scope: DefId,
        class: DefinitionClass,
        names: &'a [String],
    ) -> Candidates<'a> {
        let mut seen = HashSet::new();
        Box::new(
            self.resolve_from(scope, class, names)
                .filter(move |id| seen.insert(*id)),
        )
    }

    fn resolve_from<'a>(
        &'a self,
        scope: DefId,
        class: DefinitionClass,
        names: &'a [String],
    ) -> Candidates<'a> {
        if names.is_empty() {
            return Box::new(iter::empty());
        }
        let local = self.resolve_locally(scope, class, names);
        let imported = self.resolve_from_imports(scope, class, names);
        let outer = self
            .ascend(scope)
            .into_iter()
            .flat_map(move |parent| self.resolve_from(parent, class, names));
        Box::new(local.chain(imported).chain(outer))
    }

    /// Resolve `names` among the children of `scope` only.
    pub fn resolve_locally<'a>(
        &'a self,
        scope: DefId,
        class: DefinitionClass,
        names: &'a [String],
    ) -> Candidates<'a> {
        Box::new(
            self[scope]
                .nested()
                .iter()
                .flat_map(move |&child| self.resolve_here(child, class, names)),
        )
    }

    /// Match `names` against `id` itself, then continue into its children.
    fn resolve_here<'a>(
        &'a self,
        id: DefId,
        class: DefinitionClass,
        names: &'a [String],
    ) -> Candidates<'a> {
        let def = &self[id];
        if def.is_transparent() {
            return self.resolve_locally(id, class, names);
        }
        match names.split_first() {
            Some((head, rest)) if head == def.name() => {
                if rest.is_empty() {
                    if class.accepts(&def.kind) {
                        Box::new(iter::once(id))
                    } else {
                        Box::new(iter::empty())
                    }
                } else if def.is_descendable() {
                    self.resolve_locally(id, class, rest)
                } else {
                    Box::new(iter::empty())
                }
            }
            _ => Box::new(iter::empty()),
        }
    }

    fn resolve_from_imports<'a>(
        &'a self,
        scope: DefId,
        class: DefinitionClass,
        names: &'a [String],
    ) -> Candidates<'a> {
        Box::new(
            self.imports(scope)
                .iter()
                .filter(move |import| names.starts_with(&import.local_name))
                .flat_map(move |import| {
                    let rest = &names[import.local_name.len()..];
                    if rest.is_empty() {
                        let accepted = class.accepts(&self[import.source].kind);
                        Box::new(accepted.then_some(import.source).into_iter()) as Candidates<'a>
                    } else {
                        self.resolve_locally(import.source, class, rest)
                    }
                }),
        )
    }

    fn ascend(&self, scope: DefId) -> Option<DefId> {
        let def = &self[scope];
        if def.is_ascendable() {
            def.containing()
        } else {
            None
        }
    }

    /// The imports visible in `scope`, evaluated on first access.
    pub fn imports(&self, scope: DefId) -> &[Import] {
        let def = &self[scope];
        def.imports.get_or_init(|| {
            def.suppliers
                .iter()
                .flat_map(|supplier| self.evaluate(supplier))
                .filter(|import| !import.local_name.is_empty())
                .collect()
        })
    }

    fn evaluate(&self, supplier: &ImportSupplier) -> Vec<Import> {
        match supplier {
            ImportSupplier::Single { path, local_name } => self
                .lookup(path)
                .into_iter()
                .map(|source| Import {
                    local_name: local_name.clone(),
                    source,
                })
                .collect(),
            ImportSupplier::Wildcard { path, rule } => self
                .lookup(path)
                .into_iter()
                .flat_map(|target| self.members(target))
                .filter(|&member| rule.exports(&self[member].def))
                .map(|member| Import {
                    local_name: vec![self[member].name().to_string()],
                    source: member,
                })
                .collect(),
            ImportSupplier::RootPackages => self[self.root()]
                .nested()
                .iter()
                .copied()
                .filter(|&id| DefinitionClass::Package.accepts(&self[id].kind))
                .map(|id| Import {
                    local_name: vec![self[id].name().to_string()],
                    source: id,
                })
                .collect(),
        }
    }

    /// Resolve an absolute dotted path from the project root.
    pub fn lookup(&self, path: &[String]) -> Vec<DefId> {
        self.resolve_locally(self.root(), DefinitionClass::Any, path)
            .collect()
    }

    /// Direct members of `scope`, looking through transparent file scopes.
    pub fn members(&self, scope: DefId) -> Vec<DefId> {
        let mut members = Vec::new();
        for &child in self[scope].nested() {
            if self[child].is_transparent() {
                members.extend(self.members(child));
            } else {
                members.push(child);
            }
        }
        members
    }
}

#[cfg(test)]
mod tests {
    use crate::model::*;

    fn names(text: &str) -> Vec<String> {
        text.split('.').map(str::to_string).collect()
    }

    fn add_type(graph: &mut ScopeGraph, parent: DefId, name: &str, public: bool) -> DefId {
        let mut def = Definition::new(name);
        if public {
            def.modifiers.insert(Modifier::Public);
        }
        let id = graph.alloc(ScopedDefinition::new(
            def,
            ScopeKind::Type(TypeDefinition::new(TypeCategory::Class, "class")),
        ));
        graph.add_nested(parent, id).unwrap();
        id
    }

    fn add_file(graph: &mut ScopeGraph, parent: DefId, name: &str) -> DefId {
        let id = graph.alloc(ScopedDefinition::new(Definition::new(name), ScopeKind::File));
        graph.add_nested(parent, id).unwrap();
        id
    }

    fn add_method(graph: &mut ScopeGraph, parent: DefId, name: &str) -> DefId {
        let id = graph.alloc(ScopedDefinition::new(
            Definition::new(name),
            ScopeKind::Method(MethodDefinition::default()),
        ));
        graph.add_nested(parent, id).unwrap();
        id
    }

    #[test]
    fn test_resolves_sibling_then_ascends() {
        let mut graph = ScopeGraph::new("proj", "java");
        let root = graph.root();
        let file = add_file(&mut graph, root, "A.java");
        let a = add_type(&mut graph, file, "A", false);
        let b = add_type(&mut graph, file, "B", false);

        let super_name = QualifiedTypeName::parse(b, "A");
        assert_eq!(super_name.resolve(&graph).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_dotted_names_descend_through_types_not_methods() {
        let mut graph = ScopeGraph::new("proj", "java");
        let root = graph.root();
        let file = add_file(&mut graph, root, "Outer.java");
        let outer = add_type(&mut graph, file, "Outer", false);
        let inner = add_type(&mut graph, outer, "Inner", false);
        let m = add_method(&mut graph, outer, "m");
        let local = add_type(&mut graph, m, "Local", false);
        let user = add_type(&mut graph, file, "User", false);

        let found: Vec<_> = graph
            .resolve(user, DefinitionClass::Type, &names("Outer.Inner"))
            .collect();
        assert_eq!(found, vec![inner]);

        let hidden: Vec<_> = graph
            .resolve(user, DefinitionClass::Type, &names("Outer.m.Local"))
            .collect();
        assert!(hidden.is_empty());

        // From inside the method, the local class is visible by simple name.
        let from_method = QualifiedName::new(m, names("Local"), "Local").within_scope(true);
        assert_eq!(
            from_method
                .resolve(&graph, DefinitionClass::Type)
                .collect::<Vec<_>>(),
            vec![local]
        );
    }

    #[test]
    fn test_class_filter_rejects_wrong_kind() {
        let mut graph = ScopeGraph::new("proj", "java");
        let root = graph.root();
        let file = add_file(&mut graph, root, "A.java");
        let a = add_type(&mut graph, file, "A", false);
        add_method(&mut graph, a, "run");

        let n = names("A.run");
        assert_eq!(graph.resolve(file, DefinitionClass::Type, &n).count(), 0);
        assert_eq!(graph.resolve(file, DefinitionClass::Method, &n).count(), 1);
    }

    #[test]
    fn test_wildcard_import_exports_public_only() {
        let mut graph = ScopeGraph::new("proj", "java");
        let root = graph.root();
        let p = graph.get_or_add_package(root, "p", "package");
        let q = graph.get_or_add_package(root, "q", "package");
        let p_file = add_file(&mut graph, p, "p/A.java");
        let a = add_type(&mut graph, p_file, "A", true);
        add_type(&mut graph, p_file, "Hidden", false);
        let q_file = add_file(&mut graph, q, "q/B.java");
        let b = add_type(&mut graph, q_file, "B", false);
        graph.add_import(
            q_file,
            ImportSupplier::Wildcard {
                path: names("p"),
                rule: ExportRule::Public,
            },
        );

        assert_eq!(
            QualifiedTypeName::parse(b, "A")
                .resolve(&graph)
                .collect::<Vec<_>>(),
            vec![a]
        );
        assert_eq!(QualifiedTypeName::parse(b, "Hidden").resolve(&graph).count(), 0);
    }

    #[test]
    fn test_single_import_and_remainder() {
        let mut graph = ScopeGraph::new("proj", "python");
        let root = graph.root();
        let pkg = graph.get_or_add_package(root, "pkg", "package");
        let shapes = graph.get_or_add_package(pkg, "shapes", "module");
        let shape = add_type(&mut graph, shapes, "Shape", false);
        let main = graph.get_or_add_package(root, "main", "module");
        let user = add_type(&mut graph, main, "Circle", false);
        graph.add_import(
            main,
            ImportSupplier::single(names("pkg.shapes"), Some("s".into())).unwrap(),
        );

        assert_eq!(
            QualifiedTypeName::parse(user, "s.Shape")
                .resolve(&graph)
                .collect::<Vec<_>>(),
            vec![shape]
        );
        assert_eq!(graph.imports(main).len(), 1);
    }

    #[test]
    fn test_module_roots_do_not_leak() {
        let mut graph = ScopeGraph::new("proj", "python");
        let root = graph.root();
        let one = graph.get_or_add_package(root, "one", "module");
        add_type(&mut graph, one, "Base", false);
        let two = graph.get_or_add_package(root, "two", "module");
        let derived = add_type(&mut graph, two, "Derived", false);

        assert_eq!(QualifiedTypeName::parse(derived, "Base").resolve(&graph).count(), 0);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut graph = ScopeGraph::new("proj", "java");
        let root = graph.root();
        let p = graph.get_or_add_package(root, "p", "package");
        let file = add_file(&mut graph, p, "p/A.java");
        add_type(&mut graph, file, "A", true);
        let b = add_type(&mut graph, file, "B", false);
        graph.add_import(file, ImportSupplier::RootPackages);

        let name = QualifiedTypeName::parse(b, "p.A");
        let first: Vec<_> = name.resolve(&graph).collect();
        let second: Vec<_> = name.resolve(&graph).collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
