//! Construction of a [`TypeGraph`] from scanned type definitions.

use std::collections::HashMap;

use tracing::debug;

use super::node::{MethodNode, MethodNodeId, ParameterNode, Signature, TypeNode, TypeNodeId};
use super::TypeGraph;
use crate::error::{ModelError, ModelResult};
use crate::model::{DefId, DefinitionClass, Modifier, QualifiedTypeName, ScopeGraph, TypeCategory};

/// Methods visible from a supertype, keyed by signature.
type Inherited = HashMap<Signature, MethodNodeId>;

/// Collects type definitions and links them into a [`TypeGraph`].
pub struct TreeBuilder<'g> {
    graph: &'g ScopeGraph,
    types: Vec<TypeNode>,
    methods: Vec<MethodNode>,
    projects: HashMap<DefId, TypeNodeId>,
    externals: HashMap<String, TypeNodeId>,
}

impl<'g> TreeBuilder<'g> {
    pub fn new(graph: &'g ScopeGraph) -> Self {
        Self {
            graph,
            types: Vec::new(),
            methods: Vec::new(),
            projects: HashMap::new(),
            externals: HashMap::new(),
        }
    }

    /// Add a type definition. Each definition may be added only once.
    pub fn add_definition(&mut self, id: DefId) -> ModelResult<TypeNodeId> {
        if self.projects.contains_key(&id) {
            return Err(ModelError::DuplicateType {
                name: self.graph.qualified_display(id),
            });
        }
        Ok(self.project_node(id))
    }

    /// Add every type definition in the graph.
    pub fn add_all(&mut self) -> ModelResult<()> {
        for id in self.graph.walk(DefinitionClass::Type) {
            self.add_definition(id)?;
        }
        Ok(())
    }

    /// Link supertypes, attach methods and compute overrides.
    pub fn build(mut self) -> TypeGraph {
        // Supertypes are linked only for the types added explicitly. Nodes
        // created while resolving still receive their methods below.
        let graph = self.graph;
        let added = self.types.len();
        for index in 0..added {
            let node = TypeNodeId(index);
            let Some(def) = self.types[index].definition else {
                continue;
            };
            let Some(ty) = graph[def].as_type() else {
                continue;
            };
            for name in &ty.super_types {
                let parent = self.type_node(name);
                self.link(parent, node);
            }
        }

        for index in 0..self.types.len() {
            self.attach_methods(TypeNodeId(index));
        }

        let roots: Vec<TypeNodeId> = (0..self.types.len())
            .map(TypeNodeId)
            .filter(|&id| {
                let node = &self.types[id.0];
                node.parents.is_empty() && !node.children.is_empty()
            })
            .collect();
        for root in roots {
            self.find_overrides(root, &Inherited::new(), &mut Vec::new());
        }

        debug!(
            types = self.types.len(),
            external = self.externals.len(),
            methods = self.methods.len(),
            "built inheritance graph"
        );
        TypeGraph {
            types: self.types,
            methods: self.methods,
        }
    }

    fn project_node(&mut self, id: DefId) -> TypeNodeId {
        if let Some(&node) = self.projects.get(&id) {
            return node;
        }
        let graph = self.graph;
        let scoped = &graph[id];
        let (category, construct) = scoped
            .as_type()
            .map(|t| (t.category, t.construct.clone()))
            .unwrap_or((TypeCategory::Other, scoped.construct().to_string()));
        let node = self.push(TypeNode::new(
            scoped.name(),
            category,
            construct,
            Some(id),
            scoped.def.file,
        ));
        self.projects.insert(id, node);
        node
    }

    /// The node a type reference stands for: the first definition it
    /// resolves to, or else an external stub shared by every reference with
    /// the same display text.
    fn type_node(&mut self, name: &QualifiedTypeName) -> TypeNodeId {
        if let Some(def) = name.resolve(self.graph).next() {
            return self.project_node(def);
        }
        if let Some(&node) = self.externals.get(name.display()) {
            return node;
        }
        let node = self.push(TypeNode::new(
            name.display(),
            name.category(),
            name.construct(),
            None,
            None,
        ));
        self.externals.insert(name.display().to_string(), node);
        node
    }

    fn push(&mut self, node: TypeNode) -> TypeNodeId {
        self.types.push(node);
        TypeNodeId(self.types.len() - 1)
    }

    fn link(&mut self, parent: TypeNodeId, child: TypeNodeId) {
        if parent == child || self.types[child.0].parents.contains(&parent) {
            return;
        }
        self.types[child.0].parents.push(parent);
        self.types[parent.0].children.push(child);
    }

    fn attach_methods(&mut self, owner: TypeNodeId) {
        let Some(def) = self.types[owner.0].definition else {
            return;
        };
        let graph = self.graph;
        for &member in graph[def].nested() {
            let Some(method) = graph[member].as_method() else {
                continue;
            };
            if method.constructor {
                continue;
            }
            let parameters = method
                .parameters
                .iter()
                .filter(|p| !p.implicit)
                .map(|p| ParameterNode {
                    name: p.name().to_string(),
                    type_node: p.ty.as_ref().map(|ty| self.type_node(ty)),
                })
                .collect();
            self.methods.push(MethodNode::new(
                graph[member].name(),
                member,
                owner,
                parameters,
            ));
            let id = MethodNodeId(self.methods.len() - 1);
            self.types[owner.0].methods.push(id);
        }
    }

    /// Walk down from `ty`, matching each method against those inherited
    /// along the current path.
    ///
    /// Every child gets its own copy of the inherited map, so a type reached
    /// through several parents only sees what one path passed down.
    fn find_overrides(&mut self, ty: TypeNodeId, inherited: &Inherited, path: &mut Vec<TypeNodeId>) {
        if path.contains(&ty) {
            return;
        }
        path.push(ty);

        let graph = self.graph;
        let mut passed = inherited.clone();
        for method in self.types[ty.0].methods.clone() {
            let def = &graph[self.methods[method.0].definition].def;
            if def.has_any(&[Modifier::Private, Modifier::Static]) {
                continue;
            }
            let signature = self.methods[method.0].signature.clone();
            if let Some(&overridden) = inherited.get(&signature) {
                self.methods[method.0].overrides = Some(overridden);
                self.methods[overridden.0].overridden_by.insert(method);
            }
            if !def.has(&Modifier::Final) {
                passed.insert(signature, method);
            }
        }

        for child in self.types[ty.0].children.clone() {
            self.find_overrides(child, &passed, path);
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DeclarationScanner, JavaScanner, PythonScanner};

    fn java(files: &[(&str, &str)]) -> ScopeGraph {
        let mut graph = ScopeGraph::new("test", "java");
        for (path, code) in files {
            JavaScanner::new()
                .scan(&mut graph, path, code)
                .expect("scan succeeds");
        }
        graph
    }

    fn build(graph: &ScopeGraph) -> TypeGraph {
        let mut builder = TreeBuilder::new(graph);
        builder.add_all().expect("no duplicates");
        builder.build()
    }

    fn method(tree: &TypeGraph, ty: &str, name: &str) -> MethodNodeId {
        let owner = tree.find(ty).expect("type exists");
        tree.find_method(owner, name).expect("method exists")
    }

    fn overridden_by(tree: &TypeGraph, id: MethodNodeId) -> Vec<&str> {
        tree[id]
            .overridden_by()
            .iter()
            .map(|&m| tree[tree[m].owner()].name())
            .collect()
    }

    #[test]
    fn test_single_inheritance_override() {
        let graph = java(&[(
            "Shapes.java",
            "class A { void m() {} }\nclass B extends A { void m() {} }",
        )]);
        let tree = build(&graph);
        let a = tree.find("A").expect("A");
        let b = tree.find("B").expect("B");
        assert_eq!(tree[b].parents(), &[a]);
        assert_eq!(tree[a].children(), &[b]);
        assert_eq!(tree.roots(), vec![a]);

        let am = method(&tree, "A", "m");
        let bm = method(&tree, "B", "m");
        assert_eq!(tree[bm].overrides(), Some(am));
        assert_eq!(overridden_by(&tree, am), vec!["B"]);
    }

    #[test]
    fn test_intermediate_override() {
        let graph = java(&[(
            "Shapes.java",
            "class A { void m() {} }\n\
             class B extends A { void m() {} }\n\
             class C extends B { void m() {} }\n\
             class D extends A { }",
        )]);
        let tree = build(&graph);
        let am = method(&tree, "A", "m");
        let bm = method(&tree, "B", "m");
        let cm = method(&tree, "C", "m");
        assert_eq!(tree[cm].overrides(), Some(bm));
        assert_eq!(tree[bm].overrides(), Some(am));
        assert_eq!(overridden_by(&tree, am), vec!["B"]);
    }

    #[test]
    fn test_private_and_static_methods_do_not_override() {
        let graph = java(&[(
            "Shapes.java",
            "class A { private void p() {} static void s() {} void m() {} }\n\
             class B extends A { private void p() {} static void s() {} void m() {} }",
        )]);
        let tree = build(&graph);
        for name in ["p", "s"] {
            assert_eq!(tree[method(&tree, "B", name)].overrides(), None, "{name}");
            assert!(tree[method(&tree, "A", name)].overridden_by().is_empty());
        }
        assert!(tree[method(&tree, "B", "m")].overrides().is_some());
    }

    #[test]
    fn test_final_methods_are_not_passed_down() {
        let graph = java(&[(
            "Shapes.java",
            "class A { final void m() {} }\nclass B extends A { void m() {} }",
        )]);
        let tree = build(&graph);
        assert_eq!(tree[method(&tree, "B", "m")].overrides(), None);
    }

    #[test]
    fn test_overloads_do_not_override() {
        let graph = java(&[(
            "Shapes.java",
            "class A { void m(int x) {} }\n\
             class B extends A { void m(String x) {} void m(int y) {} }",
        )]);
        let tree = build(&graph);
        let b = tree.find("B").expect("B");
        let overrides: Vec<bool> = tree[b]
            .methods()
            .iter()
            .map(|&m| tree[m].overrides().is_some())
            .collect();
        assert_eq!(overrides, vec![false, true]);
    }

    #[test]
    fn test_unresolved_supertype_becomes_external_stub() {
        let graph = java(&[(
            "Shapes.java",
            "class A extends Base implements Runnable { public void run() {} }\n\
             class B extends Base { }",
        )]);
        let tree = build(&graph);
        let a = tree.find("A").expect("A");
        let base = tree.find("Base").expect("stub");
        assert!(tree[base].is_external());
        assert_eq!(tree[base].file(), None);
        assert_eq!(tree[base].category(), TypeCategory::Class);
        assert!(tree[base].methods().is_empty());
        assert_eq!(tree[base].children().len(), 2);

        let runnable = tree.find("Runnable").expect("stub");
        assert_eq!(tree[runnable].category(), TypeCategory::Interface);
        assert_eq!(tree[a].parents(), &[base, runnable]);
        assert_eq!(tree.roots(), vec![base, runnable]);
    }

    #[test]
    fn test_two_parents_are_matched_separately() {
        let graph = java(&[(
            "Shapes.java",
            "class A { void m() {} }\n\
             interface I { void m(); }\n\
             class B extends A implements I { public void m() {} }",
        )]);
        let tree = build(&graph);
        let am = method(&tree, "A", "m");
        let im = method(&tree, "I", "m");
        let bm = method(&tree, "B", "m");
        assert_eq!(overridden_by(&tree, am), vec!["B"]);
        assert_eq!(overridden_by(&tree, im), vec!["B"]);
        // One link only; the root walked last wins.
        assert_eq!(tree[bm].overrides(), Some(im));
    }

    #[test]
    fn test_shared_interface_reached_by_several_paths() {
        let graph = java(&[(
            "Shapes.java",
            "interface I { void m(); }\n\
             class A implements I { public void m() {} }\n\
             class B implements I { }\n\
             class C extends B implements I { public void m() {} }",
        )]);
        let tree = build(&graph);
        let im = method(&tree, "I", "m");
        let am = method(&tree, "A", "m");
        let cm = method(&tree, "C", "m");
        assert_eq!(tree[am].overrides(), Some(im));
        assert_eq!(tree[cm].overrides(), Some(im));
        assert_eq!(overridden_by(&tree, im), vec!["A", "C"]);
    }

    #[test]
    fn test_parameter_types_shape_signatures() {
        let graph = java(&[(
            "Shapes.java",
            "class P { }\n\
             class A { void m(P p) {} void n(Q q) {} }\n\
             class B extends A { void m(P other) {} void n(Q other) {} }",
        )]);
        let tree = build(&graph);
        let p = tree.find("P").expect("P");
        let q = tree.find("Q").expect("stub");
        let am = method(&tree, "A", "m");
        assert_eq!(tree[am].parameters()[0].type_node, Some(p));
        assert_eq!(tree[method(&tree, "A", "n")].parameters()[0].type_node, Some(q));
        assert_eq!(tree[method(&tree, "B", "m")].overrides(), Some(am));
        assert!(tree[method(&tree, "B", "n")].overrides().is_some());
        assert_eq!(tree.standalone(), vec![p]);
    }

    #[test]
    fn test_constructors_and_implicit_parameters_are_skipped() {
        let mut graph = ScopeGraph::new("test", "python");
        PythonScanner::new()
            .scan(
                &mut graph,
                "shapes.py",
                "class A:\n    def __init__(self): pass\n    def m(self, x): pass\n\
                 class B(A):\n    def m(self, y): pass\n",
            )
            .expect("scan succeeds");
        let tree = build(&graph);
        let a = tree.find("A").expect("A");
        assert_eq!(tree[a].methods().len(), 1);
        let am = method(&tree, "A", "m");
        assert_eq!(tree[am].parameters().len(), 1);
        assert_eq!(tree[method(&tree, "B", "m")].overrides(), Some(am));
    }

    #[test]
    fn test_cyclic_inheritance_terminates() {
        let graph = java(&[(
            "Loop.java",
            "class Root { void m() {} }\n\
             class A extends B { void m() {} }\n\
             class B extends A { void m() {} }\n\
             class C extends C { }",
        )]);
        let tree = build(&graph);
        let a = tree.find("A").expect("A");
        let b = tree.find("B").expect("B");
        assert_eq!(tree[a].parents(), &[b]);
        assert_eq!(tree[b].parents(), &[a]);
        let c = tree.find("C").expect("C");
        assert!(tree[c].parents().is_empty());
    }

    #[test]
    fn test_duplicate_definition_is_rejected() {
        let graph = java(&[("A.java", "class A { }")]);
        let id = graph.walk(DefinitionClass::Type)[0];
        let mut builder = TreeBuilder::new(&graph);
        builder.add_definition(id).expect("first add");
        assert!(matches!(
            builder.add_definition(id),
            Err(ModelError::DuplicateType { .. })
        ));
    }
}
