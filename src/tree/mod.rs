//! Inheritance graph built from the type definitions of a scope graph.

mod builder;
mod node;

pub use builder::TreeBuilder;
pub use node::{MethodNode, MethodNodeId, ParameterNode, Signature, TypeNode, TypeNodeId};

use std::ops::Index;

/// Every type node of one project, linked by inheritance, with their methods
/// and computed overrides.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    types: Vec<TypeNode>,
    methods: Vec<MethodNode>,
}

impl TypeGraph {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeNodeId, &TypeNode)> + '_ {
        self.types.iter().enumerate().map(|(i, t)| (TypeNodeId(i), t))
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodNodeId, &MethodNode)> + '_ {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodNodeId(i), m))
    }

    /// Types at the top of an inheritance hierarchy: no parents, some children.
    pub fn roots(&self) -> Vec<TypeNodeId> {
        self.types()
            .filter(|(_, t)| t.parents.is_empty() && !t.children.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Project types that take part in no inheritance at all.
    pub fn standalone(&self) -> Vec<TypeNodeId> {
        self.types()
            .filter(|(_, t)| !t.is_external() && t.parents.is_empty() && t.children.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// The first type node with the given simple name.
    pub fn find(&self, name: &str) -> Option<TypeNodeId> {
        self.types()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    /// The method named `name` declared directly by `owner`.
    pub fn find_method(&self, owner: TypeNodeId, name: &str) -> Option<MethodNodeId> {
        self[owner]
            .methods
            .iter()
            .copied()
            .find(|&m| self[m].name == name)
    }

    /// Whether `ancestor` can be reached from `id` by following parent edges.
    pub fn inherits_from(&self, id: TypeNodeId, ancestor: TypeNodeId) -> bool {
        let mut pending = self[id].parents.clone();
        let mut seen = Vec::new();
        while let Some(next) = pending.pop() {
            if next == ancestor {
                return true;
            }
            if !seen.contains(&next) {
                seen.push(next);
                pending.extend(self[next].parents.iter().copied());
            }
        }
        false
    }
}

impl Index<TypeNodeId> for TypeGraph {
    type Output = TypeNode;

    fn index(&self, id: TypeNodeId) -> &TypeNode {
        &self.types[id.0]
    }
}

impl Index<MethodNodeId> for TypeGraph {
    type Output = MethodNode;

    fn index(&self, id: MethodNodeId) -> &MethodNode {
        &self.methods[id.0]
    }
}
