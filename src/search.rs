//! Suggested `ack`/`grep` commands for finding polymorphic call sites.

use colored::*;
use std::io::{self, Write};

use crate::config::SearchTool;
use crate::model::ScopeGraph;
use crate::scan::{CallTarget, DeclarationScanner};
use crate::tree::{MethodNodeId, TypeGraph, TypeNodeId};
use crate::workspace::Project;

/// Quote `text` for a POSIX shell.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// A complete search command for calls to any of `methods`.
pub fn command(
    tool: SearchTool,
    scanner: &dyn DeclarationScanner,
    methods: &[CallTarget<'_>],
    path: &str,
) -> String {
    let pattern = shell_quote(&scanner.call_pattern(methods));
    match tool {
        SearchTool::Ack => format!(
            "ack -C10 {} {} {}",
            scanner.ack_option(),
            pattern,
            shell_quote(path)
        ),
        SearchTool::Grep => format!(
            "grep -nPR -C10 --color=auto {} {} {}",
            scanner.grep_option(),
            pattern,
            shell_quote(path)
        ),
    }
}

fn call_targets<'a>(
    graph: &'a ScopeGraph,
    tree: &'a TypeGraph,
    methods: impl IntoIterator<Item = MethodNodeId>,
) -> Vec<CallTarget<'a>> {
    methods
        .into_iter()
        .map(|id| {
            let method = &tree[id];
            CallTarget {
                name: method.name(),
                return_type: graph[method.definition()]
                    .as_method()
                    .and_then(|m| m.return_type.as_ref())
                    .map(|t| t.display()),
            }
        })
        .collect()
}

/// Write one search command per supertype of `project`, then a combined one.
pub fn write_commands<W: Write>(
    w: &mut W,
    project: &Project,
    tree: &TypeGraph,
    tool: SearchTool,
    path: &str,
) -> io::Result<()> {
    let graph = project.graph();
    let scanner = project.scanner();

    writeln!(w)?;
    writeln!(
        w,
        "{}",
        format!(
            "Commands for finding polymorphic {} method calls",
            project.display_name()
        )
        .bright_magenta()
        .bold()
    )?;
    writeln!(
        w,
        "(Copy and paste one of the following commands to find method call sites for a particular superclass/interface, or for all superclasses/interfaces at once.)"
    )?;
    writeln!(w)?;

    let mut super_types: Vec<TypeNodeId> = tree
        .types()
        .filter(|(_, t)| !t.is_external() && !t.children().is_empty())
        .map(|(id, _)| id)
        .collect();
    if super_types.is_empty() {
        writeln!(
            w,
            "  [No superclasses or interfaces defined; no polymorphism is possible!]"
        )?;
        return Ok(());
    }
    super_types.sort_by(|&a, &b| tree[a].name().cmp(tree[b].name()).then(a.cmp(&b)));

    for &ty in &super_types {
        let node = &tree[ty];
        let type_params = node
            .definition()
            .and_then(|def| graph[def].type_params.as_deref())
            .unwrap_or("");
        writeln!(
            w,
            "{} {}{}:",
            node.construct(),
            node.name().bold(),
            type_params.dimmed()
        )?;
        if node.methods().is_empty() {
            writeln!(
                w,
                "  [No methods overridden in subclasses; no polymorphism is possible!]"
            )?;
        } else {
            writeln!(w)?;
            let targets = call_targets(graph, tree, node.methods().iter().copied());
            writeln!(w, "  {}", command(tool, scanner, &targets, path))?;
        }
        writeln!(w)?;
        writeln!(w)?;
    }

    if super_types.len() > 1 {
        writeln!(w, "{}", "All together:".bold())?;
        writeln!(w)?;
        let targets = call_targets(
            graph,
            tree,
            super_types
                .iter()
                .flat_map(|&ty| tree[ty].methods().iter().copied()),
        );
        writeln!(w, "  {}", command(tool, scanner, &targets, path))?;
        writeln!(w)?;
    }
    Ok(())
}
