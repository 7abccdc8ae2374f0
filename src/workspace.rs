//! A scanned source tree, with one project per language.
//!
//! Each language gets its own [`ScopeGraph`]; names never resolve across
//! languages.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ModelResult;
use crate::model::{DefinitionClass, ScopeGraph};
use crate::scan::{self, DeclarationScanner};
use crate::tree::{TreeBuilder, TypeGraph};

/// The definitions found for one language.
pub struct Project {
    scanner: &'static dyn DeclarationScanner,
    graph: ScopeGraph,
    files: usize,
}

impl Project {
    fn new(name: &str, scanner: &'static dyn DeclarationScanner) -> Self {
        Self {
            scanner,
            graph: ScopeGraph::new(name, scanner.language_id()),
            files: 0,
        }
    }

    pub fn language_id(&self) -> &'static str {
        self.scanner.language_id()
    }

    pub fn display_name(&self) -> &'static str {
        self.scanner.display_name()
    }

    pub fn scanner(&self) -> &'static dyn DeclarationScanner {
        self.scanner
    }

    pub fn graph(&self) -> &ScopeGraph {
        &self.graph
    }

    /// Number of files scanned into this project.
    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn type_count(&self) -> usize {
        self.graph.walk(DefinitionClass::Type).len()
    }

    /// Link every type of the project into an inheritance graph.
    pub fn build(&self) -> ModelResult<TypeGraph> {
        let mut builder = TreeBuilder::new(&self.graph);
        builder.add_all()?;
        let tree = builder.build();
        info!(
            language = self.language_id(),
            files = self.files,
            types = tree.len(),
            roots = tree.roots().len(),
            "built project"
        );
        Ok(tree)
    }
}

/// Every project found in a source tree.
pub struct Workspace {
    name: String,
    languages: Vec<String>,
    projects: Vec<Project>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            languages: Vec::new(),
            projects: Vec::new(),
        }
    }

    /// Only accept files of these language ids. Empty means all languages.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// The scanner that would handle `path`, if any.
    pub fn scanner_for(&self, path: &Path) -> Option<&'static dyn DeclarationScanner> {
        let ext = path.extension()?.to_str()?;
        let scanner = scan::get_scanner(ext)?;
        if self.languages.is_empty() || self.languages.iter().any(|l| l == scanner.language_id()) {
            Some(scanner)
        } else {
            None
        }
    }

    /// Scan one file. `path` is relative to the workspace root, with `/`
    /// separators. Returns `false` when no scanner handles the file.
    pub fn add_file(&mut self, path: &str, content: &str) -> ModelResult<bool> {
        let Some(scanner) = self.scanner_for(Path::new(path)) else {
            debug!(path, "no scanner for file");
            return Ok(false);
        };
        let index = match self
            .projects
            .iter()
            .position(|p| p.language_id() == scanner.language_id())
        {
            Some(index) => index,
            None => {
                self.projects.push(Project::new(&self.name, scanner));
                self.projects.len() - 1
            }
        };
        let project = &mut self.projects[index];
        scanner.scan(&mut project.graph, path, content)?;
        project.files += 1;
        Ok(true)
    }

    /// Scan raw file contents, replacing invalid UTF-8.
    pub fn add_bytes(&mut self, path: &str, bytes: &[u8]) -> ModelResult<bool> {
        let content = String::from_utf8_lossy(bytes);
        if let std::borrow::Cow::Owned(_) = content {
            warn!(path, "file is not valid UTF-8; decoded lossily");
        }
        self.add_file(path, &content)
    }

    /// Projects in the order their languages were first seen.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, language_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.language_id() == language_id)
    }

    /// Total number of type definitions across every project.
    pub fn type_count(&self) -> usize {
        self.projects.iter().map(Project::type_count).sum()
    }
}
