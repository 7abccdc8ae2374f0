//! The definition model: an arena-backed scope graph of declarations.
//!
//! Every scanned declaration becomes a [`ScopedDefinition`] owned by a
//! [`ScopeGraph`] and addressed by a [`DefId`]. Containment is recorded as
//! index pairs, so parent links and cross references never form ownership
//! cycles.
//!
//! Name resolution is lazy. A [`QualifiedName`] remembers the scope it was
//! written in and is only resolved (local children, then imports, then the
//! enclosing scope) once scanning has finished.

mod definition;
mod graph;
mod imports;
mod modifier;
mod name;
mod resolve;

pub use definition::{
    Definition, DefinitionClass, MethodDefinition, ParameterDefinition, ScopeKind,
    ScopedDefinition, TypeCategory, TypeDefinition,
};
pub use graph::ScopeGraph;
pub use imports::{ExportRule, Import, ImportSupplier};
pub use modifier::Modifier;
pub use name::{name_list, QualifiedName, QualifiedTypeName};

use serde::Serialize;
use std::fmt;

/// Handle of a definition within a [`ScopeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId(usize);

impl DefId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a source file within a [`ScopeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Half-open byte range `[start, end)` within a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A scanned source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root, with `/` separators.
    pub path: String,
    /// Declared package, for languages that have one.
    pub package: Option<String>,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            path: path.into(),
            package: None,
            line_starts,
        }
    }

    /// File name without directories.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// One-based line containing byte offset `pos`.
    pub fn line_of(&self, pos: usize) -> usize {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_containment() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(&Span::new(0, 10)));
        assert!(outer.contains(&Span::new(3, 4)));
        assert!(!outer.contains(&Span::new(5, 11)));
        assert_eq!(Span::new(4, 2).len(), 0);
    }

    #[test]
    fn test_source_file_lines() {
        let file = SourceFile::new("pkg/mod.py", "a\nbb\n\nc");
        assert_eq!(file.name(), "mod.py");
        assert_eq!(file.line_of(0), 1);
        assert_eq!(file.line_of(2), 2);
        assert_eq!(file.line_of(3), 2);
        assert_eq!(file.line_of(5), 3);
        assert_eq!(file.line_of(6), 4);
    }
}
