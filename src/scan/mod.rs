//! Regex-driven declaration scanners.
//!
//! Each supported language provides a [`DeclarationScanner`] that reads one
//! source file and records its packages, types, methods and imports in a
//! [`ScopeGraph`]. Scanners are permissive: whatever they do not recognise is
//! skipped, and a file that yields nothing never fails.

mod java;
pub mod masked;
pub mod patterns;
mod python;

pub use java::JavaScanner;
pub use masked::{MaskedMatch, MaskedText, MASK_CHAR};
pub use python::PythonScanner;

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ModelResult;
use crate::model::{FileId, ScopeGraph};

/// A method whose call sites should be searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTarget<'a> {
    pub name: &'a str,
    pub return_type: Option<&'a str>,
}

/// Language-specific declaration scanner.
pub trait DeclarationScanner: Send + Sync {
    /// Short identifier, e.g. "java".
    fn language_id(&self) -> &'static str;

    /// Human-readable language name.
    fn display_name(&self) -> &'static str;

    /// File extensions handled, without the dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Scan `content` (found at the project-relative `path`) into `graph`.
    fn scan(&self, graph: &mut ScopeGraph, path: &str, content: &str) -> ModelResult<FileId>;

    /// A PCRE pattern matching call sites of any of `methods`.
    fn call_pattern(&self, methods: &[CallTarget<'_>]) -> String;

    /// `ack` option restricting the search to this language.
    fn ack_option(&self) -> &'static str;

    /// `grep` option restricting the search to this language.
    fn grep_option(&self) -> &'static str;

    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

/// Static storage for the Java scanner.
static JAVA_SCANNER: OnceCell<JavaScanner> = OnceCell::new();

/// Static storage for the Python scanner.
static PYTHON_SCANNER: OnceCell<PythonScanner> = OnceCell::new();

/// Whether scanners have been registered.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register all available scanners. Idempotent.
pub fn register_scanners() {
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return;
    }

    JAVA_SCANNER.get_or_init(JavaScanner::new);
    PYTHON_SCANNER.get_or_init(PythonScanner::new);
}

/// Get the scanner for a file extension.
pub fn get_scanner(ext: &str) -> Option<&'static dyn DeclarationScanner> {
    register_scanners();

    match ext {
        "java" => JAVA_SCANNER.get().map(|s| s as &'static dyn DeclarationScanner),
        "py" => PYTHON_SCANNER.get().map(|s| s as &'static dyn DeclarationScanner),
        _ => None,
    }
}

/// Get a scanner by language ID.
pub fn get_scanner_by_id(lang_id: &str) -> Option<&'static dyn DeclarationScanner> {
    register_scanners();

    match lang_id {
        "java" => JAVA_SCANNER.get().map(|s| s as &'static dyn DeclarationScanner),
        "python" => PYTHON_SCANNER.get().map(|s| s as &'static dyn DeclarationScanner),
        _ => None,
    }
}

/// All registered language IDs.
pub fn registered_languages() -> Vec<String> {
    vec!["java".to_string(), "python".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scanner_by_extension() {
        assert_eq!(get_scanner("java").map(|s| s.language_id()), Some("java"));
        assert_eq!(get_scanner("py").map(|s| s.language_id()), Some("python"));
        assert!(get_scanner("rs").is_none());
    }

    #[test]
    fn test_every_registered_language_resolves() {
        for id in registered_languages() {
            let scanner = get_scanner_by_id(&id).expect("registered scanner");
            assert_eq!(scanner.language_id(), id);
            for ext in scanner.file_extensions() {
                assert!(scanner.handles_extension(ext));
            }
        }
    }
}
