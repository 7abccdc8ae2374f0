//! Arena storage and structural operations for the scope graph.

use std::ops::Index;

use crate::error::{ModelError, ModelResult};

use super::definition::{DefinitionClass, ScopeKind, ScopedDefinition};
use super::imports::ImportSupplier;
use super::{DefId, Definition, FileId, Modifier, SourceFile, Span};

/// All definitions of one language's project, rooted at a project scope.
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    defs: Vec<ScopedDefinition>,
    files: Vec<SourceFile>,
}

impl ScopeGraph {
    /// Create a graph whose root is a project scope named `name`.
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        let root = ScopedDefinition::new(
            Definition::new(name),
            ScopeKind::Project {
                language: language.into(),
            },
        );
        Self {
            defs: vec![root],
            files: Vec::new(),
        }
    }

    pub fn root(&self) -> DefId {
        DefId(0)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }

    pub fn get(&self, id: DefId) -> Option<&ScopedDefinition> {
        self.defs.get(id.0)
    }

    pub fn get_mut(&mut self, id: DefId) -> Option<&mut ScopedDefinition> {
        self.defs.get_mut(id.0)
    }

    /// Register a source file.
    pub fn add_file(&mut self, file: SourceFile) -> FileId {
        self.files.push(file);
        FileId(self.files.len() - 1)
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Store a definition that is not yet attached to any scope.
    pub fn alloc(&mut self, def: ScopedDefinition) -> DefId {
        self.defs.push(def);
        DefId(self.defs.len() - 1)
    }

    /// Attach `child` beneath `parent`.
    ///
    /// Fails if `child` already has a container, or if both have locations in
    /// the same file and `child`'s span escapes `parent`'s.
    pub fn add_nested(&mut self, parent: DefId, child: DefId) -> ModelResult<()> {
        if parent == child {
            return Err(ModelError::SelfNesting {
                name: self[child].name().to_string(),
            });
        }
        let p = &self[parent];
        let c = &self[child];
        if let Some(existing) = c.containing {
            return Err(ModelError::AlreadyNested {
                child: c.name().to_string(),
                parent: self[existing].name().to_string(),
            });
        }
        if let (Some(ps), Some(cs)) = (p.def.span, c.def.span) {
            if p.def.file.is_some() && p.def.file == c.def.file && !ps.contains(&cs) {
                return Err(ModelError::SpanEscapesContainer {
                    child: c.name().to_string(),
                    child_start: cs.start,
                    child_end: cs.end,
                    parent: p.name().to_string(),
                    parent_start: ps.start,
                    parent_end: ps.end,
                });
            }
        }

        self.defs[child.0].containing = Some(parent);
        self.defs[parent.0].nested.push(child);
        Ok(())
    }

    /// Find the package or module `name` directly beneath `parent`, creating
    /// it if absent.
    pub fn get_or_add_package(&mut self, parent: DefId, name: &str, construct: &str) -> DefId {
        let existing = self[parent]
            .nested
            .iter()
            .copied()
            .find(|&id| self[id].name() == name && matches!(self[id].kind, ScopeKind::Package { .. }));
        if let Some(id) = existing {
            return id;
        }

        let id = self.alloc(ScopedDefinition::new(
            Definition::new(name),
            ScopeKind::Package {
                construct: construct.to_string(),
            },
        ));
        // Packages carry no span until a file locates them, so this cannot fail.
        self.defs[id.0].containing = Some(parent);
        self.defs[parent.0].nested.push(id);
        id
    }

    /// Walk (creating as needed) a dotted package path beneath `parent`.
    pub fn package_path(&mut self, parent: DefId, names: &[String], construct: &str) -> DefId {
        names
            .iter()
            .fold(parent, |scope, name| self.get_or_add_package(scope, name, construct))
    }

    /// Give a location to a definition that was created without one.
    pub fn set_location(&mut self, id: DefId, file: FileId, span: Span) {
        let def = &mut self.defs[id.0].def;
        if def.span.is_none() {
            def.file = Some(file);
            def.span = Some(span);
        }
    }

    pub fn add_modifier(&mut self, id: DefId, modifier: Modifier) {
        self.defs[id.0].def.modifiers.insert(modifier);
    }

    pub fn add_import(&mut self, id: DefId, supplier: ImportSupplier) {
        let scope = &mut self.defs[id.0];
        if !scope.suppliers.contains(&supplier) {
            scope.suppliers.push(supplier);
        }
    }

    /// Every definition reachable from the root accepted by `class`, in
    /// depth-first pre-order.
    pub fn walk(&self, class: DefinitionClass) -> Vec<DefId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let def = &self[id];
            if id != self.root() && class.accepts(&def.kind) {
                found.push(id);
            }
            stack.extend(def.nested.iter().rev());
        }
        found
    }

    /// Containing scopes of `id`, innermost first.
    pub fn ancestors(&self, id: DefId) -> impl Iterator<Item = DefId> + '_ {
        std::iter::successors(self[id].containing, move |&p| self[p].containing)
    }

    /// Dotted display name, e.g. `p.Outer.Inner.method`.
    ///
    /// File scopes and the project root are omitted.
    pub fn qualified_display(&self, id: DefId) -> String {
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&a| {
                !matches!(self[a].kind, ScopeKind::Project { .. } | ScopeKind::File)
            })
            .map(|a| self[a].name())
            .collect();
        names.reverse();
        names.join(".")
    }
}

impl Index<DefId> for ScopeGraph {
    type Output = ScopedDefinition;

    fn index(&self, id: DefId) -> &ScopedDefinition {
        &self.defs[id.0]
    }
}
