//! Output formatting for scan results.
//!
//! Supports two output formats:
//! - Pretty: a coloured inheritance tree per language
//! - JSON: every language's types and methods, for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::model::{Modifier, ScopeGraph, TypeCategory};
use crate::tree::{MethodNodeId, TypeGraph, TypeNodeId};
use crate::workspace::Project;

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub languages: Vec<JsonLanguage>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonLanguage {
    pub language: String,
    pub files: usize,
    pub types: Vec<JsonType>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    pub construct: String,
    pub category: TypeCategory,
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_params: Option<String>,
    pub modifiers: Vec<String>,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub methods: Vec<JsonMethod>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonMethod {
    pub name: String,
    pub modifiers: Vec<String>,
    pub return_type: Option<String>,
    pub parameters: Vec<JsonParameter>,
    /// `Type.method` of the overridden method.
    pub overrides: Option<String>,
    pub overridden_by: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
}

/// Collect every project's types and methods into one report.
pub fn build_json(path: &str, projects: &[(&Project, &TypeGraph)]) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        languages: projects
            .iter()
            .map(|(project, tree)| JsonLanguage {
                language: project.language_id().to_string(),
                files: project.file_count(),
                types: tree
                    .types()
                    .map(|(id, _)| type_to_json(project.graph(), tree, id))
                    .collect(),
            })
            .collect(),
    }
}

/// Write a report in JSON format.
pub fn write_json<W: Write>(w: &mut W, report: &JsonReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(w, "{}", json)?;
    Ok(())
}

fn type_to_json(graph: &ScopeGraph, tree: &TypeGraph, id: TypeNodeId) -> JsonType {
    let node = &tree[id];
    let names = |ids: &[TypeNodeId]| ids.iter().map(|&t| tree[t].name().to_string()).collect();
    let definition = node.definition().map(|def| &graph[def]);
    JsonType {
        name: node.name().to_string(),
        qualified_name: node.definition().map(|def| graph.qualified_display(def)),
        construct: node.construct().to_string(),
        category: node.category(),
        external: node.is_external(),
        file: node
            .file()
            .and_then(|f| graph.file(f))
            .map(|f| f.path.clone()),
        type_params: definition.and_then(|d| d.type_params.clone()),
        modifiers: definition
            .map(|d| d.def.modifiers.iter().map(Modifier::to_string).collect())
            .unwrap_or_default(),
        parents: names(node.parents()),
        children: names(node.children()),
        methods: node
            .methods()
            .iter()
            .map(|&m| method_to_json(graph, tree, m))
            .collect(),
    }
}

fn method_to_json(graph: &ScopeGraph, tree: &TypeGraph, id: MethodNodeId) -> JsonMethod {
    let method = &tree[id];
    let scoped = &graph[method.definition()];
    let qualified = |m: MethodNodeId| format!("{}.{}", tree[tree[m].owner()].name(), tree[m].name());
    JsonMethod {
        name: method.name().to_string(),
        modifiers: scoped.def.modifiers.iter().map(Modifier::to_string).collect(),
        return_type: scoped
            .as_method()
            .and_then(|m| m.return_type.as_ref())
            .map(|t| t.display().to_string()),
        parameters: method
            .parameters()
            .iter()
            .map(|p| JsonParameter {
                name: p.name.clone(),
                param_type: p.type_node.map(|t| tree[t].name().to_string()),
            })
            .collect(),
        overrides: method.overrides().map(qualified),
        overridden_by: method.overridden_by().iter().map(|&m| qualified(m)).collect(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Display options for the tree view.
#[derive(Debug, Clone, Copy)]
pub struct TreeOptions {
    pub ascii: bool,
    pub show_standalone: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            ascii: false,
            show_standalone: true,
        }
    }
}

struct Charset {
    vertical: char,
    intersect: char,
    corner: char,
    horizontal: char,
    dotted: char,
}

const UNICODE_CHARS: Charset = Charset {
    vertical: '│',
    intersect: '├',
    corner: '└',
    horizontal: '─',
    dotted: '┊',
};

const ASCII_CHARS: Charset = Charset {
    vertical: '|',
    intersect: '+',
    corner: '\\',
    horizontal: '-',
    dotted: '|',
};

const INDENT: &str = "    ";

/// Write one project's inheritance trees in pretty (human-readable) format.
pub fn write_pretty<W: Write>(
    w: &mut W,
    project: &Project,
    tree: &TypeGraph,
    options: &TreeOptions,
) -> io::Result<()> {
    let mut view = TreeView {
        out: w,
        graph: project.graph(),
        tree,
        chars: if options.ascii {
            &ASCII_CHARS
        } else {
            &UNICODE_CHARS
        },
    };

    writeln!(view.out)?;
    writeln!(
        view.out,
        "{} {}",
        project.display_name().cyan().bold(),
        format!(
            "({} file{}, {} type{})",
            project.file_count(),
            plural(project.file_count()),
            tree.len(),
            plural(tree.len())
        )
        .dimmed()
    )?;
    writeln!(view.out)?;

    let roots = sorted_by_name(tree, tree.roots());
    if roots.is_empty() {
        writeln!(view.out, "{}", "No inheritance found".bright_magenta().bold())?;
    } else {
        writeln!(view.out, "{}", "Inheritance tree(s)".bright_magenta().bold())?;
        writeln!(
            view.out,
            "(Note: subclasses will appear multiple times if using multiple inheritance.)"
        )?;
        for root in roots {
            view.node(INDENT, INDENT, INDENT, root, None, &mut Vec::new())?;
            writeln!(view.out)?;
        }
    }

    let standalone = sorted_by_name(tree, tree.standalone());
    if options.show_standalone && !standalone.is_empty() {
        writeln!(
            view.out,
            "{}",
            "Types without inheritance (no super/subclasses)"
                .bright_magenta()
                .bold()
        )?;
        for ty in standalone {
            view.node(INDENT, INDENT, INDENT, ty, None, &mut Vec::new())?;
            writeln!(view.out)?;
        }
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn sorted_by_name(tree: &TypeGraph, mut ids: Vec<TypeNodeId>) -> Vec<TypeNodeId> {
    ids.sort_by(|&a, &b| tree[a].name().cmp(tree[b].name()).then(a.cmp(&b)));
    ids
}

/// A modifier as shown in the tree, with any arguments elided.
fn modifier_label(modifier: &Modifier) -> String {
    let text = modifier.as_str();
    let text = match (text.find('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            format!("{}(){}", &text[..open], &text[close + 1..])
        }
        _ => text.to_string(),
    };
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn colored_construct(construct: &str, category: TypeCategory) -> ColoredString {
    match category {
        TypeCategory::Class => construct.green(),
        TypeCategory::Interface => construct.red(),
        TypeCategory::Other => construct.blue(),
    }
}

/// One method line, before padding into columns.
struct MethodRow {
    modifiers: Vec<Modifier>,
    type_params: String,
    return_type: String,
    name: String,
    params: Vec<String>,
    overridden_in: Vec<String>,
}

impl MethodRow {
    fn modifier_width(&self) -> usize {
        self.modifiers
            .iter()
            .map(|m| modifier_label(m).chars().count() + 1)
            .sum()
    }

    fn signature_width(&self) -> usize {
        self.name.chars().count() + 2 + self.params.join(", ").chars().count() + 1
    }
}

fn column_width(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.chars().count() + 1
    }
}

struct TreeView<'a, W: Write> {
    out: &'a mut W,
    graph: &'a ScopeGraph,
    tree: &'a TypeGraph,
    chars: &'static Charset,
}

impl<W: Write> TreeView<'_, W> {
    fn blank(&mut self, prefix: &str) -> io::Result<()> {
        writeln!(self.out, "{}", prefix.trim_end())
    }

    fn branch(&self, end: char) -> String {
        format!("{}{}{} ", end, self.chars.horizontal, self.chars.horizontal)
    }

    fn node(
        &mut self,
        above: &str,
        connecting: &str,
        below: &str,
        ty: TypeNodeId,
        parent: Option<TypeNodeId>,
        path: &mut Vec<TypeNodeId>,
    ) -> io::Result<()> {
        let tree = self.tree;
        let node = &tree[ty];
        self.blank(above)?;

        if path.contains(&ty) {
            writeln!(
                self.out,
                "{}{} {} {}",
                connecting,
                node.construct().dimmed(),
                node.name().dimmed(),
                "[cycle]".dimmed()
            )?;
            return Ok(());
        }
        path.push(ty);

        let others: Vec<TypeNodeId> = node
            .parents()
            .iter()
            .copied()
            .filter(|&p| Some(p) != parent)
            .collect();
        if !others.is_empty() {
            self.blank(above)?;
            for other in sorted_by_name(tree, others) {
                writeln!(
                    self.out,
                    "{}{} {}",
                    above,
                    tree[other].construct().dimmed(),
                    tree[other].name().dimmed()
                )?;
            }
            writeln!(self.out, "{}{}", above, self.chars.dotted.to_string().dimmed())?;
        }

        write!(self.out, "{}", connecting)?;
        if let Some(def) = node.definition() {
            for modifier in &self.graph[def].def.modifiers {
                if *modifier == Modifier::Public {
                    continue;
                }
                let label = modifier_label(modifier);
                let label = if *modifier == Modifier::Abstract {
                    label.magenta()
                } else {
                    label.yellow()
                };
                write!(self.out, "{} ", label)?;
            }
        }
        write!(
            self.out,
            "{} {}",
            colored_construct(node.construct(), node.category()),
            node.name().bold()
        )?;
        if let Some(params) = node
            .definition()
            .and_then(|def| self.graph[def].type_params.as_deref())
        {
            write!(self.out, "{}", params.dimmed())?;
        }
        if node.is_external() {
            write!(self.out, "{}", " [external]".dimmed())?;
        }
        writeln!(self.out)?;

        let children = node.children();
        let vertical = format!("{}   ", self.chars.vertical);
        let method_prefix = if children.is_empty() {
            format!("{below}{INDENT}")
        } else {
            format!("{below}{vertical}")
        };
        self.methods(&method_prefix, ty)?;

        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let end = if last {
                self.chars.corner
            } else {
                self.chars.intersect
            };
            let next_below = if last {
                format!("{below}{INDENT}")
            } else {
                format!("{below}{vertical}")
            };
            self.node(
                &format!("{below}{vertical}"),
                &format!("{below}{}", self.branch(end)),
                &next_below,
                child,
                Some(ty),
                path,
            )?;
        }
        path.pop();
        Ok(())
    }

    fn methods(&mut self, prefix: &str, ty: TypeNodeId) -> io::Result<()> {
        let tree = self.tree;
        let node = &tree[ty];
        if node.methods().is_empty() {
            let note = if node.is_external() {
                "[methods unknown]"
            } else {
                "[no methods]"
            };
            return writeln!(self.out, "{}{}", prefix, note.dimmed());
        }

        let mut methods = node.methods().to_vec();
        methods.sort_by(|&a, &b| tree[a].name().cmp(tree[b].name()).then(a.cmp(&b)));

        let mut private = 0;
        let mut rows = Vec::new();
        for id in methods {
            let method = &tree[id];
            let scoped = &self.graph[method.definition()];
            let mut modifiers = scoped.def.modifiers.clone();
            if modifiers.contains(&Modifier::Private) {
                private += 1;
                continue;
            }
            if method.overrides().is_some() {
                modifiers.insert(Modifier::Override);
            }
            modifiers.remove(&Modifier::Public);

            let mut overridden_in: Vec<String> = method
                .overridden_by()
                .iter()
                .map(|&m| tree[tree[m].owner()].name().to_string())
                .collect();
            overridden_in.sort();

            rows.push(MethodRow {
                modifiers: modifiers.into_iter().collect(),
                type_params: scoped.type_params.clone().unwrap_or_default(),
                return_type: scoped
                    .as_method()
                    .and_then(|m| m.return_type.as_ref())
                    .map(|t| t.display().to_string())
                    .unwrap_or_default(),
                name: method.name().to_string(),
                params: method
                    .parameters()
                    .iter()
                    .map(|p| match p.type_node {
                        Some(t) => tree[t].name().to_string(),
                        None => p.name.clone(),
                    })
                    .collect(),
                overridden_in,
            });
        }

        let modifier_width = rows.iter().map(MethodRow::modifier_width).max().unwrap_or(0);
        let type_param_width = rows.iter().map(|r| column_width(&r.type_params)).max().unwrap_or(0);
        let return_width = rows.iter().map(|r| column_width(&r.return_type)).max().unwrap_or(0);
        let signature_width = rows.iter().map(MethodRow::signature_width).max().unwrap_or(0);

        if !rows.is_empty() {
            self.blank(prefix)?;
        }
        for row in &rows {
            let mut line = String::from(prefix);
            for modifier in &row.modifiers {
                let label = modifier_label(modifier);
                let label = if matches!(modifier, Modifier::Override | Modifier::Abstract) {
                    label.magenta()
                } else {
                    label.yellow()
                };
                line.push_str(&format!("{} ", label));
            }
            line.push_str(&" ".repeat(modifier_width - row.modifier_width()));
            line.push_str(&format!("{}", row.type_params.dimmed()));
            line.push_str(&" ".repeat(type_param_width - row.type_params.chars().count()));
            line.push_str(&format!("{}", row.return_type.dimmed()));
            line.push_str(&" ".repeat(return_width - row.return_type.chars().count()));

            let params: Vec<String> = row.params.iter().map(|p| p.dimmed().to_string()).collect();
            line.push_str(&format!("{}({})", row.name, params.join(", ")));
            if !row.overridden_in.is_empty() {
                let signature = row.signature_width() - 1;
                line.push_str(&" ".repeat(signature_width - signature));
                let names: Vec<String> = row
                    .overridden_in
                    .iter()
                    .map(|n| n.cyan().to_string())
                    .collect();
                line.push_str(&format!(
                    "{}{}{}",
                    "[overridden in ".dimmed(),
                    names.join(&", ".dimmed().to_string()),
                    "]".dimmed()
                ));
            }
            writeln!(self.out, "{}", line.trim_end())?;
        }

        if private > 0 {
            writeln!(
                self.out,
                "{}{}",
                prefix,
                format!("[{} private method{}]", private, plural(private)).dimmed()
            )?;
        }
        Ok(())
    }
}
