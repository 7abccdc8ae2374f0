//! Command-line interface for polytree.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{Config, SearchTool};
use crate::report::{self, TreeOptions};
use crate::search;
use crate::workspace::Workspace;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_NO_TYPES: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Show the inheritance trees of a Java or Python source tree, and how to
/// find the polymorphic method calls within it.
#[derive(Parser, Debug)]
#[command(name = "polytree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Draw trees with ASCII characters only
    #[arg(short, long)]
    pub ascii: bool,

    /// Suggest grep commands instead of ack
    #[arg(short, long)]
    pub grep: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Path to config YAML file (default: auto-discover in the scanned directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not suggest search commands
    #[arg(long)]
    pub no_search: bool,

    /// Log each recognised declaration
    #[arg(short, long)]
    pub verbose: bool,
}

/// `path` relative to `root`, with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect the source files beneath `root` that `workspace` can scan.
fn collect_files(root: &Path, config: &Config, workspace: &Workspace) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories, but not the root itself
            !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();
        // Resource forks left behind by macOS
        if name.starts_with("._") {
            continue;
        }
        if config.is_path_excluded(Path::new(&relative_path(root, path))) {
            debug!(path = %path.display(), "excluded by config");
            continue;
        }
        if workspace.scanner_for(path).is_some() {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn load_config(cli: &Cli, root: &Path) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => Config::parse_file(path),
        None => match Config::discover(root) {
            Some(path) => {
                debug!(path = %path.display(), "using discovered config");
                Config::parse_file(path)
            }
            None => Ok(Config::default()),
        },
    }
}

/// Run polytree, printing to standard output.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

/// Run polytree, writing results to `out`.
pub fn run_with_output<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<i32> {
    // Validate format
    if cli.format != "pretty" && cli.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            cli.format
        );
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let root = match cli.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", cli.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: {} is not a directory", cli.path.display());
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(cli, &root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let mut workspace = Workspace::new(name).with_languages(config.languages.clone());

    let files = collect_files(&root, &config, &workspace)?;
    for file in &files {
        let bytes =
            std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
        workspace.add_bytes(&relative_path(&root, file), &bytes)?;
    }

    let mut built = Vec::new();
    for project in workspace.projects() {
        built.push((project, project.build()?));
    }

    let path_str = cli.path.to_string_lossy().to_string();
    if cli.format == "json" {
        let projects: Vec<_> = built.iter().map(|(p, t)| (*p, t)).collect();
        let report = report::build_json(&path_str, &projects);
        report::write_json(out, &report)?;
    } else {
        let options = TreeOptions {
            ascii: cli.ascii || config.use_ascii(),
            show_standalone: config.show_standalone(),
        };
        let tool = if cli.grep {
            SearchTool::Grep
        } else {
            config.search_tool()
        };
        for (project, tree) in &built {
            report::write_pretty(out, project, tree, &options)?;
            if !cli.no_search {
                search::write_commands(out, project, tree, tool, &path_str)?;
            }
        }
    }

    if workspace.type_count() == 0 {
        if cli.format != "json" {
            eprintln!("No types found in {}", cli.path.display());
        }
        return Ok(EXIT_NO_TYPES);
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/tmp/project");
        assert_eq!(
            relative_path(root, &root.join("pkg").join("mod.py")),
            "pkg/mod.py"
        );
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["polytree", "src", "-a", "-g", "-f", "json", "--no-search", "-v"]);
        assert_eq!(cli.path, PathBuf::from("src"));
        assert!(cli.ascii && cli.grep && cli.no_search && cli.verbose);
        assert_eq!(cli.format, "json");
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["polytree"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.format, "pretty");
    }
}
