//! Optional YAML configuration.
//!
//! Every field may be omitted. Command-line flags take precedence over the
//! values read here.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scan;

/// Config file names looked for in the scanned directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["polytree.yaml", ".polytree.yaml"];

/// Command-line search tool to recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTool {
    #[default]
    Ack,
    Grep,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Glob patterns, relative to the scanned directory, of paths to skip.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Language ids to scan. Empty means every supported language.
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub ascii: Option<bool>,
    #[serde(default)]
    pub search_tool: Option<SearchTool>,
    #[serde(default)]
    pub show_standalone: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a config file directly inside `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    fn validate(&self) -> anyhow::Result<()> {
        let known = scan::registered_languages();
        for language in &self.languages {
            if !known.contains(language) {
                anyhow::bail!(
                    "unknown language {:?} (supported: {})",
                    language,
                    known.join(", ")
                );
            }
        }
        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern)
                .with_context(|| format!("invalid excluded path pattern {:?}", pattern))?;
        }
        Ok(())
    }

    /// Whether `path` (relative to the scanned directory) matches any
    /// excluded pattern. `**` matches across directories.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        self.excluded_paths
            .iter()
            .filter_map(|pattern| globset::Glob::new(pattern).ok())
            .any(|glob| glob.compile_matcher().is_match(path))
    }

    pub fn use_ascii(&self) -> bool {
        self.ascii.unwrap_or(false)
    }

    pub fn search_tool(&self) -> SearchTool {
        self.search_tool.unwrap_or_default()
    }

    /// Whether types without inheritance are listed (defaults to true).
    pub fn show_standalone(&self) -> bool {
        self.show_standalone.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_str("").unwrap();
        assert!(!config.use_ascii());
        assert_eq!(config.search_tool(), SearchTool::Ack);
        assert!(config.show_standalone());
        assert!(!config.is_path_excluded(Path::new("src/A.java")));
    }

    #[test]
    fn test_parse_all_fields() {
        let config = Config::parse_str(
            "excluded_paths:\n  - \"**/generated/**\"\n\
             languages: [java]\n\
             ascii: true\n\
             search_tool: grep\n\
             show_standalone: false\n",
        )
        .unwrap();
        assert_eq!(config.languages, vec!["java"]);
        assert!(config.use_ascii());
        assert_eq!(config.search_tool(), SearchTool::Grep);
        assert!(!config.show_standalone());
        assert!(config.is_path_excluded(Path::new("src/generated/Model.java")));
        assert!(!config.is_path_excluded(Path::new("src/main/Model.java")));
    }

    #[test]
    fn test_rejects_unknown_language() {
        let err = Config::parse_str("languages: [cobol]\n").unwrap_err();
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn test_rejects_unknown_search_tool() {
        assert!(Config::parse_str("search_tool: ripgrep\n").is_err());
    }

    #[test]
    fn test_rejects_bad_glob() {
        assert!(Config::parse_str("excluded_paths: [\"a/[b\"]\n").is_err());
    }
}
