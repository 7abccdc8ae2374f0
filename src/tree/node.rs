//! Nodes of the inheritance graph.

use std::collections::BTreeSet;

use crate::model::{DefId, FileId, TypeCategory};

/// Handle to a [`TypeNode`] within a [`TypeGraph`](super::TypeGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeNodeId(pub(super) usize);

impl TypeNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a [`MethodNode`] within a [`TypeGraph`](super::TypeGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodNodeId(pub(super) usize);

impl MethodNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A type in the inheritance graph.
///
/// Project nodes wrap a type definition from the scope graph. External nodes
/// stand in for supertypes or parameter types that could not be resolved, and
/// know only the name and hints given where they were referenced.
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub(super) name: String,
    pub(super) category: TypeCategory,
    pub(super) construct: String,
    pub(super) definition: Option<DefId>,
    pub(super) file: Option<FileId>,
    pub(super) parents: Vec<TypeNodeId>,
    pub(super) children: Vec<TypeNodeId>,
    pub(super) methods: Vec<MethodNodeId>,
}

impl TypeNode {
    pub(super) fn new(
        name: impl Into<String>,
        category: TypeCategory,
        construct: impl Into<String>,
        definition: Option<DefId>,
        file: Option<FileId>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            construct: construct.into(),
            definition,
            file,
            parents: Vec::new(),
            children: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn construct(&self) -> &str {
        &self.construct
    }

    /// The backing type definition; `None` for external stubs.
    pub fn definition(&self) -> Option<DefId> {
        self.definition
    }

    pub fn file(&self) -> Option<FileId> {
        self.file
    }

    pub fn is_external(&self) -> bool {
        self.definition.is_none()
    }

    /// Direct supertypes.
    pub fn parents(&self) -> &[TypeNodeId] {
        &self.parents
    }

    /// Direct subtypes.
    pub fn children(&self) -> &[TypeNodeId] {
        &self.children
    }

    pub fn methods(&self) -> &[MethodNodeId] {
        &self.methods
    }
}

/// A non-implicit parameter of a method node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterNode {
    pub name: String,
    /// `None` when the parameter has no declared type.
    pub type_node: Option<TypeNodeId>,
}

/// What makes two methods interchangeable for overriding: the name plus the
/// type identity of each parameter. Unknown parameter types compare equal to
/// one another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub parameter_types: Vec<Option<TypeNodeId>>,
}

/// A method declared by a project type.
#[derive(Debug, Clone)]
pub struct MethodNode {
    pub(super) name: String,
    pub(super) definition: DefId,
    pub(super) owner: TypeNodeId,
    pub(super) parameters: Vec<ParameterNode>,
    pub(super) signature: Signature,
    pub(super) overrides: Option<MethodNodeId>,
    pub(super) overridden_by: BTreeSet<MethodNodeId>,
}

impl MethodNode {
    pub(super) fn new(
        name: impl Into<String>,
        definition: DefId,
        owner: TypeNodeId,
        parameters: Vec<ParameterNode>,
    ) -> Self {
        let name = name.into();
        let signature = Signature {
            name: name.clone(),
            parameter_types: parameters.iter().map(|p| p.type_node).collect(),
        };
        Self {
            name,
            definition,
            owner,
            parameters,
            signature,
            overrides: None,
            overridden_by: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> DefId {
        self.definition
    }

    /// The type declaring this method.
    pub fn owner(&self) -> TypeNodeId {
        self.owner
    }

    pub fn parameters(&self) -> &[ParameterNode] {
        &self.parameters
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The supertype method this one overrides, if any.
    pub fn overrides(&self) -> Option<MethodNodeId> {
        self.overrides
    }

    pub fn overridden_by(&self) -> &BTreeSet<MethodNodeId> {
        &self.overridden_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: Option<usize>) -> ParameterNode {
        ParameterNode {
            name: name.to_string(),
            type_node: ty.map(TypeNodeId),
        }
    }

    #[test]
    fn test_signature_ignores_parameter_names() {
        let a = MethodNode::new("draw", DefId::new(1), TypeNodeId(0), vec![param("x", Some(3))]);
        let b = MethodNode::new("draw", DefId::new(2), TypeNodeId(1), vec![param("y", Some(3))]);
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_distinguishes_types_and_arity() {
        let base = MethodNode::new("draw", DefId::new(1), TypeNodeId(0), vec![param("x", Some(3))]);
        let other_type =
            MethodNode::new("draw", DefId::new(2), TypeNodeId(1), vec![param("x", Some(4))]);
        let unknown = MethodNode::new("draw", DefId::new(3), TypeNodeId(1), vec![param("x", None)]);
        let nullary = MethodNode::new("draw", DefId::new(4), TypeNodeId(1), vec![]);
        assert_ne!(base.signature(), other_type.signature());
        assert_ne!(base.signature(), unknown.signature());
        assert_ne!(base.signature(), nullary.signature());

        let also_unknown =
            MethodNode::new("draw", DefId::new(5), TypeNodeId(2), vec![param("z", None)]);
        assert_eq!(unknown.signature(), also_unknown.signature());
    }
}
