//! Import records and the suppliers that produce them.

use super::{DefId, Definition, Modifier};

/// A local name bound to a definition from elsewhere in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub local_name: Vec<String>,
    pub source: DefId,
}

/// Which members of a scope a wildcard import brings in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRule {
    /// Only members declared `public`.
    Public,
    /// Every member whose name does not start with an underscore.
    NotUnderscored,
}

impl ExportRule {
    pub fn exports(&self, def: &Definition) -> bool {
        match self {
            ExportRule::Public => def.has(&Modifier::Public),
            ExportRule::NotUnderscored => !def.name.starts_with('_'),
        }
    }
}

/// A deferred import, evaluated against the complete scope graph the first
/// time a scope's imports are read.
///
/// Paths are absolute from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSupplier {
    /// `import a.b.C` binds `local_name` to whatever `a.b.C` is.
    Single {
        path: Vec<String>,
        local_name: Vec<String>,
    },
    /// `import a.b.*` binds every exported member of `a.b` under its own name.
    Wildcard { path: Vec<String>, rule: ExportRule },
    /// Every top-level package of the project, so fully qualified names resolve.
    RootPackages,
}

impl ImportSupplier {
    /// Import `path` under its last component, or under `alias`.
    pub fn single(path: Vec<String>, alias: Option<String>) -> Option<Self> {
        let local = match alias {
            Some(alias) => alias,
            None => path.last()?.clone(),
        };
        Some(ImportSupplier::Single {
            path,
            local_name: vec![local],
        })
    }

    /// Import `path` under its full dotted name.
    pub fn qualified(path: Vec<String>) -> Option<Self> {
        if path.is_empty() {
            return None;
        }
        Some(ImportSupplier::Single {
            local_name: path.clone(),
            path,
        })
    }
}
