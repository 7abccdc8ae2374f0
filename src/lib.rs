//! Polytree - inheritance trees for Java and Python source code.
//!
//! Polytree scans a source tree without parsing it properly: permissive
//! regular expressions pick out packages, types, methods and imports, and
//! anything they do not recognise is skipped. The result is a scope graph
//! per language, in which super type names are resolved lazily, and from
//! which an inheritance graph with method overrides is built.
//!
//! # Architecture
//!
//! - `scan`: masked text and the per-language declaration scanners
//! - `model`: the scope graph and name resolution
//! - `tree`: the inheritance graph and override computation
//! - `workspace`: one project per language
//! - `report`, `search`: tree view, JSON output and search commands
//!
//! # Adding a New Language
//!
//! Implement `DeclarationScanner` in `src/scan/` and register it in
//! `scan/mod.rs`.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod report;
pub mod scan;
pub mod search;
pub mod tree;
pub mod workspace;

pub use config::{Config, SearchTool};
pub use error::{ModelError, ModelResult};
pub use model::ScopeGraph;
pub use scan::{get_scanner, get_scanner_by_id, register_scanners, DeclarationScanner};
pub use tree::{TreeBuilder, TypeGraph};
pub use workspace::{Project, Workspace};
