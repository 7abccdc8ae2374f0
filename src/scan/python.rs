//! Declaration scanner for Python sources.
//!
//! Headers are found top to bottom. Each header's body extent is worked out
//! from indentation, and a stack of open scopes decides what the header is
//! nested in. Only the header itself is masked, so the headers of nested
//! declarations are still found on later passes.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::masked::{MaskedMatch, MaskedText, MASK_CHAR};
use super::patterns::{bracket_expr, compile, decode_type, NAME};
use super::{CallTarget, DeclarationScanner};
use crate::error::ModelResult;
use crate::model::{
    name_list, DefId, Definition, ExportRule, FileId, ImportSupplier, MethodDefinition, Modifier,
    ParameterDefinition, QualifiedName, QualifiedTypeName, ScopeGraph, ScopeKind,
    ScopedDefinition, SourceFile, Span, TypeCategory, TypeDefinition,
};

/// Base classes that only mark a class abstract.
const ABSTRACT_BASES: &[&[&str]] = &[&["ABC"], &["ABCMeta"], &["abc", "ABC"], &["abc", "ABCMeta"]];

lazy_static! {
    static ref Q_NAME: String = format!(r"{NAME}(?:[ \t]*\.[ \t]*{NAME})*");

    /// Comments and string literals. Triple-quoted strings may span lines.
    static ref LITERAL_PATTERN: Regex = compile(concat!(
        r"#[^\n]*",
        r"|'''(?s:\\.|.)*?'''",
        r#"|"""(?s:\\.|.)*?""""#,
        r"|'(?:[^'\\\n]|\\.)*'",
        r#"|"(?:[^"\\\n]|\\.)*""#,
    ));

    static ref LINE_CONTINUATION: Regex = compile(r"\\\n");

    static ref DECLARATION_PATTERN: Regex = compile(&format!(
        r"(?m)(?P<decorators>(?:^[ \t]*@[^\n]*\n)*)^(?P<indent>[ \t]*)(?:async[ \t]+)?(?P<kind>def|class)[ \t]+(?P<name>{NAME})[ \t]*(?:\((?P<params>(?:[^()]|{})*)\)[ \t]*)?(?:->[ \t]*(?P<returnType>[^:]+?)[ \t]*)?:[ \t]*",
        bracket_expr('(', ')')
    ));

    /// Applied repeatedly, to hide anything nested that could contain commas.
    static ref PARAM_CENSOR_PATTERN: Regex =
        compile(r"\{[^{]*\}|\([^(]*\)|\[[^\[]*\]|\blambda\b[^:]*:");

    static ref PARAMETER_PATTERN: Regex = compile(&format!(
        r"(?P<name>{NAME})(?:[ \t]*:[ \t]*(?P<type>[^=,]+))?(?:[ \t]*=[ \t]*(?P<defaultValue>[^,]+))?"
    ));

    static ref SUPERTYPE_PATTERN: Regex =
        compile(r"\s*(?P<meta>\bmetaclass\s*=\s*)?(?P<main>[^,]+)");

    static ref IMPORT_PATTERN: Regex = compile(&format!(
        r"(?m)^[ \t]*(?:from[ \t]+(?P<relative>\.*)[ \t]*(?P<from>{q})?[ \t]+)?import[ \t]+(?:(?P<star>\*)|\((?P<plist>[^)]*)\)|(?P<list>[^\n]+))",
        q = *Q_NAME
    ));

    static ref IMPORT_ELEMENT_PATTERN: Regex = compile(&format!(
        r"(?P<source>{q})(?:[ \t]+as[ \t]+(?P<alias>{NAME}))?",
        q = *Q_NAME
    ));
}

/// Scanner for `.py` files.
pub struct PythonScanner;

impl PythonScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationScanner for PythonScanner {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn display_name(&self) -> &'static str {
        "Python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn scan(&self, graph: &mut ScopeGraph, path: &str, content: &str) -> ModelResult<FileId> {
        let mut text = MaskedText::new(content);
        text.mask_all(&LITERAL_PATTERN);
        text.mask_all_with(&LINE_CONTINUATION, ' ');

        let file = graph.add_file(SourceFile::new(path, content));
        let location = ModuleLocation::from_path(path);
        let module = location.scope(graph);
        graph.set_location(module, file, Span::new(0, content.len()));

        let mut scanned = ModuleScan {
            graph,
            file,
            path,
            open: vec![(module, Span::new(0, content.len()))],
            recorded: Vec::new(),
        };
        while let Some((header, header_end)) = text
            .find(&DECLARATION_PATTERN)
            .map(|m| (Header::from_match(&m), m.end()))
        {
            let body_end = body_end(text.visible(), header_end, &header.indent);
            let start = header.start;
            scanned.insert(header, Span::new(start, body_end))?;
            text.mask(start, header_end);
        }

        let ModuleScan {
            graph, recorded, ..
        } = scanned;
        for statement in import_statements(&text, &location) {
            let scope = innermost(&recorded, statement.position).unwrap_or(module);
            graph.add_import(scope, statement.supplier);
        }
        Ok(file)
    }

    fn call_pattern(&self, methods: &[CallTarget<'_>]) -> String {
        let mut names: Vec<&str> = Vec::new();
        for method in methods {
            if !names.contains(&method.name) {
                names.push(method.name);
            }
        }
        format!(r"\b(?<!def )({})\s*\(", names.join("|"))
    }

    fn ack_option(&self) -> &'static str {
        "--python"
    }

    fn grep_option(&self) -> &'static str {
        "--include='*.py'"
    }
}

/// Where a source file sits in the package hierarchy.
struct ModuleLocation {
    /// Directory components, i.e. the containing package path.
    package: Vec<String>,
    /// File stem, or `None` for a package's `__init__.py`.
    module: Option<String>,
}

impl ModuleLocation {
    fn from_path(path: &str) -> Self {
        let mut components: Vec<String> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .map(str::to_string)
            .collect();
        let file_name = components.pop().unwrap_or_default();
        let stem = file_name
            .strip_suffix(".py")
            .unwrap_or(&file_name)
            .to_string();
        Self {
            package: components,
            module: (stem != "__init__").then_some(stem),
        }
    }

    /// The package or module scope this file populates, created as needed.
    fn scope(&self, graph: &mut ScopeGraph) -> DefId {
        let root = graph.root();
        let package = graph.package_path(root, &self.package, "package");
        match &self.module {
            Some(module) => graph.get_or_add_package(package, module, "module"),
            None => package,
        }
    }

    /// Absolute path of a `from` clause with `dots` leading dots.
    fn absolute(&self, dots: usize, names: Vec<String>) -> Option<Vec<String>> {
        if dots == 0 {
            return Some(names);
        }
        let keep = self.package.len().checked_sub(dots - 1)?;
        let mut path = self.package[..keep].to_vec();
        path.extend(names);
        Some(path)
    }
}

/// End of a declaration's body, given the end of its header.
///
/// A body that starts on the header line ends with that line. Otherwise it
/// extends over each following line indented deeper than the header. Blank
/// lines, and lines left blank by masking, neither extend nor end it.
fn body_end(visible: &str, header_end: usize, indent: &str) -> usize {
    let line_end = |from: usize| visible[from..].find('\n').map_or(visible.len(), |i| from + i);
    let is_blank = |line: &str| line.chars().all(|c| c == MASK_CHAR || c.is_whitespace());

    let first_end = line_end(header_end);
    if !is_blank(&visible[header_end..first_end]) {
        return first_end;
    }

    let mut end = first_end;
    let mut pos = first_end;
    while pos < visible.len() {
        let start = pos + 1;
        let next = line_end(start);
        let line = &visible[start..next];
        if !is_blank(line) {
            let deeper = line
                .strip_prefix(indent)
                .is_some_and(|rest| rest.starts_with([' ', '\t']));
            if !deeper {
                break;
            }
            end = next;
        }
        pos = next;
    }
    end
}

fn decorator_modifier(line: &str) -> Modifier {
    let line = line.trim();
    let name: String = line
        .trim_start_matches('@')
        .split('(')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    match name.as_str() {
        "abstractmethod" | "abc.abstractmethod" => Modifier::Abstract,
        "classmethod" => Modifier::ClassMethod,
        "staticmethod" => Modifier::Static,
        "final" | "typing.final" => Modifier::Final,
        "override" | "typing.override" => Modifier::Override,
        _ => Modifier::Custom(line.to_string()),
    }
}

/// A base class or metaclass entry from a class header.
struct BaseDecl {
    display: String,
    names: Vec<String>,
    meta: bool,
}

struct ParameterDecl {
    name: String,
    ty: Option<String>,
    default_value: Option<String>,
    span: Span,
}

enum HeaderKind {
    Class { bases: Vec<BaseDecl> },
    Function {
        params: Vec<ParameterDecl>,
        return_type: Option<String>,
    },
}

/// One `def` or `class` header, copied out of the text.
struct Header {
    name: String,
    start: usize,
    indent: String,
    decorators: Vec<String>,
    kind: HeaderKind,
}

impl Header {
    fn from_match(m: &MaskedMatch<'_>) -> Self {
        let decorators = m
            .original_group("decorators")
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let kind = if m.original_group("kind") == Some("class") {
            HeaderKind::Class {
                bases: bases(m),
            }
        } else {
            HeaderKind::Function {
                params: parameters(m),
                return_type: m.original_group("returnType").map(decode_type),
            }
        };

        Self {
            name: m.original_group("name").unwrap_or_default().to_string(),
            start: m.start(),
            indent: m.masked_group("indent").unwrap_or_default().to_string(),
            decorators,
            kind,
        }
    }
}

fn censored_params(m: &MaskedMatch<'_>) -> Option<MaskedText> {
    let mut text = m.masked_group_text("params")?;
    text.mask_repeatedly(&PARAM_CENSOR_PATTERN);
    Some(text)
}

fn bases(m: &MaskedMatch<'_>) -> Vec<BaseDecl> {
    let Some(text) = censored_params(m) else {
        return Vec::new();
    };
    text.find_all(&SUPERTYPE_PATTERN)
        .iter()
        .filter_map(|entry| {
            let meta = entry.has_group("meta");
            let visible = entry.masked_group("main").unwrap_or_default();
            if !meta && (visible.contains('=') || visible.trim_start().starts_with('*')) {
                return None;
            }
            let display = entry.original_group("main")?.trim().to_string();
            let names = name_list(&display);
            if names.is_empty() {
                return None;
            }
            Some(BaseDecl {
                display,
                names,
                meta,
            })
        })
        .collect()
}

fn parameters(m: &MaskedMatch<'_>) -> Vec<ParameterDecl> {
    let (Some(text), Some(range)) = (censored_params(m), m.group_range("params")) else {
        return Vec::new();
    };
    text.find_all(&PARAMETER_PATTERN)
        .iter()
        .filter_map(|p| {
            Some(ParameterDecl {
                name: p.original_group("name")?.to_string(),
                ty: p.original_group("type").map(decode_type),
                default_value: p.original_group("defaultValue").map(|v| v.trim().to_string()),
                span: Span::new(range.start + p.start(), range.start + p.end()),
            })
        })
        .collect()
}

/// Per-file scanning state.
struct ModuleScan<'g, 'p> {
    graph: &'g mut ScopeGraph,
    file: FileId,
    path: &'p str,
    /// Scopes whose bodies may still contain the next header, outermost first.
    open: Vec<(DefId, Span)>,
    recorded: Vec<(DefId, Span)>,
}

impl ModuleScan<'_, '_> {
    fn insert(&mut self, header: Header, span: Span) -> ModelResult<DefId> {
        while self.open.len() > 1 {
            let (_, top) = self.open[self.open.len() - 1];
            if top.end <= span.start || !top.contains(&span) {
                self.open.pop();
            } else {
                break;
            }
        }
        let (parent, _) = self.open[self.open.len() - 1];
        let in_class = self.graph[parent].as_type().is_some();

        let Header {
            name,
            decorators,
            kind,
            ..
        } = header;
        let mut def = Definition::located(name.as_str(), self.file, span);
        def.modifiers.extend(decorators.iter().map(|d| decorator_modifier(d)));
        let is_static = def.has(&Modifier::Static);

        let id = match kind {
            HeaderKind::Class { bases } => {
                let id = self.graph.alloc(ScopedDefinition::new(
                    def,
                    ScopeKind::Type(TypeDefinition::new(TypeCategory::Class, "class")),
                ));
                let mut abstract_base = false;
                if let Some(ty) = self.graph.get_mut(id).and_then(ScopedDefinition::as_type_mut) {
                    for base in bases {
                        let is_abc = ABSTRACT_BASES.iter().any(|abc| base.names == *abc);
                        abstract_base |= is_abc;
                        let reference =
                            QualifiedTypeName::new(QualifiedName::new(id, base.names, base.display))
                                .category_hint(TypeCategory::Class)
                                .construct_hint("class");
                        if base.meta {
                            ty.meta_type = Some(reference);
                        } else if !is_abc {
                            ty.add_super_type(reference);
                        }
                    }
                }
                if abstract_base {
                    self.graph.add_modifier(id, Modifier::Abstract);
                }
                id
            }
            HeaderKind::Function {
                params,
                return_type,
            } => {
                let id = self.graph.alloc(ScopedDefinition::new(
                    def,
                    ScopeKind::Method(MethodDefinition::default()),
                ));
                let file = self.file;
                let type_name = |text: &str| {
                    QualifiedTypeName::parse(id, text)
                        .category_hint(TypeCategory::Class)
                        .construct_hint("class")
                };
                let method = MethodDefinition {
                    return_type: return_type.as_deref().map(type_name),
                    constructor: in_class && name == "__init__",
                    parameters: params
                        .into_iter()
                        .enumerate()
                        .map(|(i, p)| {
                            let mut param =
                                ParameterDefinition::new(Definition::located(p.name, file, p.span));
                            param.ty = p.ty.as_deref().map(type_name);
                            param.default_value = p.default_value;
                            param.implicit = i == 0 && in_class && !is_static;
                            param
                        })
                        .collect(),
                    exceptions: Vec::new(),
                };
                if let Some(slot) = self.graph.get_mut(id).and_then(ScopedDefinition::as_method_mut) {
                    *slot = method;
                }
                id
            }
        };

        self.graph.add_nested(parent, id)?;
        debug!(
            path = self.path,
            name = self.graph[id].name(),
            construct = self.graph[id].construct(),
            %span,
            "recorded declaration"
        );
        self.open.push((id, span));
        self.recorded.push((id, span));
        Ok(id)
    }
}

/// The most deeply nested recorded scope containing `position`.
fn innermost(recorded: &[(DefId, Span)], position: usize) -> Option<DefId> {
    recorded
        .iter()
        .filter(|(_, span)| span.start <= position && position < span.end)
        .min_by_key(|(_, span)| span.len())
        .map(|&(id, _)| id)
}

struct ImportStatement {
    position: usize,
    supplier: ImportSupplier,
}

fn import_statements(text: &MaskedText, location: &ModuleLocation) -> Vec<ImportStatement> {
    let mut statements = Vec::new();
    for m in text.find_all(&IMPORT_PATTERN) {
        let position = m.start();
        let is_from = m.has_group("relative");
        let dots = m.original_group("relative").map_or(0, str::len);
        let from = m.original_group("from").map(name_list).unwrap_or_default();

        let base = if is_from {
            match location.absolute(dots, from) {
                Some(base) if !base.is_empty() => Some(base),
                _ => continue,
            }
        } else {
            None
        };

        if m.has_group("star") {
            if let Some(path) = base {
                statements.push(ImportStatement {
                    position,
                    supplier: ImportSupplier::Wildcard {
                        path,
                        rule: ExportRule::NotUnderscored,
                    },
                });
            }
            continue;
        }

        let group = if m.has_group("plist") { "plist" } else { "list" };
        let Some(list) = m.masked_group_text(group) else {
            continue;
        };
        for element in list.find_all(&IMPORT_ELEMENT_PATTERN) {
            let Some(source) = element.original_group("source") else {
                continue;
            };
            let names = name_list(source);
            let alias = element.original_group("alias").map(str::to_string);
            let supplier = match &base {
                Some(base) => {
                    let mut path = base.clone();
                    path.extend(names);
                    ImportSupplier::single(path, alias)
                }
                None if alias.is_some() => ImportSupplier::single(names, alias),
                None => ImportSupplier::qualified(names),
            };
            if let Some(supplier) = supplier {
                statements.push(ImportStatement { position, supplier });
            }
        }
    }
    statements
}
