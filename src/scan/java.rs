//! Declaration scanner for Java sources.
//!
//! Declarations are found innermost first. The declaration pattern only
//! accepts a body containing no unmasked braces, so once a declaration has
//! been recorded and masked, the declaration enclosing it becomes matchable.
//! Bodiless method headers inside a matched type are taken before the type
//! itself. When nothing matches, one layer of plain `{ ... }` blocks (statement
//! bodies, initialisers) is masked and the search repeats.
//!
//! Members found before their enclosing type are re-parented when that type
//! is finally matched, and their access modifiers are widened to what the
//! enclosing construct implies.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::masked::{MaskedMatch, MaskedText};
use super::patterns::{bracket_expr, compile, first_word, FLAT_BLOCK, NAME};
use super::{CallTarget, DeclarationScanner};
use crate::error::ModelResult;
use crate::model::{
    name_list, DefId, Definition, ExportRule, FileId, ImportSupplier, MethodDefinition, Modifier,
    ParameterDefinition, QualifiedTypeName, ScopeGraph, ScopeKind, ScopedDefinition, SourceFile,
    Span, TypeCategory, TypeDefinition,
};

const STD_MODIFIER: &str = r"\b(?:abstract|default|final|native|non-sealed|open|private|protected|public|static|sealed|strictfp|synchronized|transient|volatile)\b";

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "if", "goto", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while",
];

/// Reserved words that may still begin a type.
const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

/// Whether `word` can never start a type. `yield` is contextual, but a
/// statement `yield foo(x);` must not read as a method declaration.
fn is_reserved_non_type(word: &str) -> bool {
    (is_reserved(word) && !PRIMITIVE_TYPES.contains(&word)) || word == "yield"
}

/// Pattern fragments for Java syntax, composed once.
struct Syntax {
    annotation: String,
    type_use: String,
    annotated_type_use: String,
    type_list: String,
    modifiers: String,
    paren: String,
    type_args: String,
    fq_name: String,
}

impl Syntax {
    fn new() -> Self {
        let fq_name = format!(r"{NAME}(?:\s*\.\s*{NAME})*");
        let paren = bracket_expr('(', ')');
        let type_args = bracket_expr('<', '>');
        let annotation = format!(r"@\s*{fq_name}(?:\s*{paren})?\s*");
        let type_use = format!(r"{fq_name}(?:\s*{type_args})?(?:\s*(?:{annotation})*\[\s*\])*");
        let annotated_type_use = format!("(?:{annotation})*{type_use}");
        let type_list = format!(r"{annotated_type_use}(?:\s*,\s*{annotated_type_use})*");
        let modifiers = format!(r"(?P<modifiers>(?:{annotation}|{STD_MODIFIER}\s*)*)");
        Self {
            annotation,
            type_use,
            annotated_type_use,
            type_list,
            modifiers,
            paren,
            type_args,
            fq_name,
        }
    }

    fn declaration(&self) -> String {
        let Syntax {
            modifiers,
            type_args,
            paren,
            type_list,
            type_use,
            annotated_type_use,
            ..
        } = self;
        let args = format!(r"(?:[^()]|{paren})*");

        let named_type = format!(
            r"(?P<type>\b(?P<construct>class|interface|record|enum)\s+(?P<typeName>{NAME})\s*(?P<typeParams>{type_args})?\s*(?P<recordHeader>{paren}\s*)?(?:\bextends\s+(?P<extends>{type_list})\s*)?(?:\bimplements\s+(?P<implements>{type_list})\s*)?(?:\bpermits\s+(?P<permits>{type_list})\s*)?{FLAT_BLOCK})"
        );
        let anonymous = format!(
            r"(?P<anon>\bnew\s+(?P<superType>{annotated_type_use})(?P<anonTypeArgs>{type_args})?\s*\({args}\)\s*{FLAT_BLOCK})"
        );
        let method = format!(
            r"(?P<method>(?P<methodTypeParams>{type_args})?\s*(?P<returnType>{type_use})\s+(?P<methodName>{NAME})\s*\((?P<params>{args})\)\s*(?:\bthrows\s+(?P<throws>{type_list})\s*)?(?:;|{FLAT_BLOCK}))"
        );
        let constructor = format!(
            r"(?P<ctor>(?P<ctorTypeParams>{type_args})?\s*(?P<ctorName>{NAME})\s*\((?P<ctorParams>{args})\)\s*(?:\bthrows\s+(?P<ctorThrows>{type_list})\s*)?{FLAT_BLOCK})"
        );
        format!("{modifiers}(?:{named_type}|{anonymous}|{method}|{constructor})")
    }

    fn parameter(&self) -> String {
        let Syntax {
            modifiers,
            type_use,
            annotation,
            ..
        } = self;
        format!(r"{modifiers}(?P<type>{type_use})\s*(?P<vararg>(?:{annotation})*\.\.\.\s*)?(?P<name>{NAME})")
    }
}

lazy_static! {
    static ref SYNTAX: Syntax = Syntax::new();

    /// Comments, text blocks, and string and char literals.
    static ref LITERAL_PATTERN: Regex = compile(concat!(
        r"//[^\n]*",
        r"|/\*[^*]*\*+(?:[^/*][^*]*\*+)*/",
        r#"|"""(?s:.)*?""""#,
        r#"|"(?:[^"\\\n]|\\.)*""#,
        r"|'(?:[^'\\\n]|\\.)*'",
    ));

    static ref SCOPE_PATTERN: Regex = compile(FLAT_BLOCK);

    static ref PACKAGE_PATTERN: Regex =
        compile(&format!(r"\bpackage\s+(?P<name>{})\s*;", SYNTAX.fq_name));

    static ref IMPORT_PATTERN: Regex = compile(&format!(
        r"\bimport\s+(?P<static>static\s+)?(?P<name>{})(?P<wildcard>\s*\.\s*\*)?\s*;",
        SYNTAX.fq_name
    ));

    static ref ANNOTATION_PATTERN: Regex = compile(&SYNTAX.annotation);

    static ref MODIFIER_PATTERN: Regex =
        compile(&format!("{}|{}", SYNTAX.annotation, STD_MODIFIER));

    static ref TYPE_PATTERN: Regex = compile(&SYNTAX.type_use);

    static ref PARAMETER_PATTERN: Regex = compile(&SYNTAX.parameter());

    static ref DECLARATION_PATTERN: Regex = compile(&SYNTAX.declaration());
}

/// Scanner for `.java` files.
pub struct JavaScanner;

impl JavaScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationScanner for JavaScanner {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn display_name(&self) -> &'static str {
        "Java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn scan(&self, graph: &mut ScopeGraph, path: &str, content: &str) -> ModelResult<FileId> {
        let mut text = MaskedText::new(content);
        text.mask_all(&LITERAL_PATTERN);

        let package = text.find(&PACKAGE_PATTERN).map(|m| {
            let names = m.original_group("name").map(name_list).unwrap_or_default();
            (names, m.range())
        });

        let mut source = SourceFile::new(path, content);
        source.package = package
            .as_ref()
            .filter(|(names, _)| !names.is_empty())
            .map(|(names, _)| names.join("."));
        let file = graph.add_file(source);

        let root = graph.root();
        let parent = match &package {
            Some((names, _)) if !names.is_empty() => graph.package_path(root, names, "package"),
            _ => root,
        };
        let scope = graph.alloc(ScopedDefinition::new(
            Definition::located(path, file, Span::new(0, content.len())),
            ScopeKind::File,
        ));
        graph.add_nested(parent, scope)?;
        if let Some((_, range)) = &package {
            text.mask(range.start, range.end);
        }

        graph.add_import(scope, ImportSupplier::RootPackages);
        for supplier in imports(&text) {
            graph.add_import(scope, supplier);
        }
        text.mask_all(&IMPORT_PATTERN);

        let mut unit = CompilationUnit {
            graph,
            file,
            path,
            anonymous: 0,
            top_level: Vec::new(),
        };
        loop {
            let found = next_declaration(&text).map(|m| (Declaration::from_match(&m), m.range()));
            match found {
                Some((declaration, range)) => {
                    unit.insert(declaration)?;
                    text.mask(range.start, range.end);
                }
                None if text.mask_all(&SCOPE_PATTERN) => {
                    debug!(path, "masked a layer of plain blocks");
                }
                None => break,
            }
        }

        for (_, id) in std::mem::take(&mut unit.top_level) {
            unit.graph.add_nested(scope, id)?;
        }
        Ok(file)
    }

    fn call_pattern(&self, methods: &[CallTarget<'_>]) -> String {
        let mut alternatives: Vec<String> = Vec::new();
        for method in methods {
            let return_type = method
                .return_type
                .unwrap_or("")
                .replace('[', r"\[")
                .replace(']', r"\]");
            let alternative = format!("(?<!{return_type} ){}", method.name);
            if !alternatives.contains(&alternative) {
                alternatives.push(alternative);
            }
        }
        format!(r"\b({})\s*\(", alternatives.join("|"))
    }

    fn ack_option(&self) -> &'static str {
        "--java"
    }

    fn grep_option(&self) -> &'static str {
        "--include='*.java'"
    }
}

fn imports(text: &MaskedText) -> Vec<ImportSupplier> {
    text.find_all(&IMPORT_PATTERN)
        .iter()
        .filter_map(|m| {
            let path = name_list(m.original_group("name")?);
            if m.has_group("wildcard") {
                Some(ImportSupplier::Wildcard {
                    path,
                    rule: ExportRule::Public,
                })
            } else {
                ImportSupplier::single(path, None)
            }
        })
        .collect()
}

/// The first declaration match whose names pass the reserved-word checks.
fn next_declaration(text: &MaskedText) -> Option<MaskedMatch<'_>> {
    let mut pos = 0;
    while let Some(m) = text.find_at(&DECLARATION_PATTERN, pos) {
        if is_acceptable(&m) {
            if m.has_group("type") || m.has_group("anon") {
                if let Some(member) = bodiless_member(text, &m) {
                    return Some(member);
                }
            }
            return Some(m);
        }
        pos = text.next_char(m.start());
    }
    None
}

/// A `;`-terminated method header left inside the flat body of a type match.
///
/// Such headers carry no braces, so they never stop the enclosing type from
/// matching. They have to be recorded before the type masks them away.
fn bodiless_member<'t>(text: &'t MaskedText, ty: &MaskedMatch<'t>) -> Option<MaskedMatch<'t>> {
    let mut pos = ty.start() + ty.masked().rfind('{')? + 1;
    while let Some(inner) = text.find_at(&DECLARATION_PATTERN, pos) {
        if inner.start() >= ty.end() {
            break;
        }
        if inner.end() <= ty.end() && is_acceptable(&inner) {
            return Some(inner);
        }
        pos = text.next_char(inner.start());
    }
    None
}

fn is_acceptable(m: &MaskedMatch<'_>) -> bool {
    if let Some(name) = m.original_group("typeName") {
        return !is_reserved(name);
    }
    if let Some(name) = m.original_group("methodName") {
        let return_type = m.original_group("returnType").unwrap_or("");
        return !is_reserved(name) && !is_reserved_non_type(first_word(return_type));
    }
    if let Some(name) = m.original_group("ctorName") {
        return !is_reserved(name);
    }
    true
}

fn java_modifier(text: &str) -> Modifier {
    let text = text.trim();
    match text.strip_prefix('@') {
        Some(annotation) => {
            let name: String = annotation.chars().filter(|c| !c.is_whitespace()).collect();
            if name == "Override" || name == "java.lang.Override" {
                Modifier::Override
            } else {
                Modifier::Custom(text.to_string())
            }
        }
        None => Modifier::named(text),
    }
}

/// Original text of each modifier in a masked `modifiers` group.
fn modifier_texts(m: &MaskedMatch<'_>, group: &str) -> Vec<String> {
    m.masked_group_text(group)
        .map(|text| {
            text.find_all_original(&MODIFIER_PATTERN)
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Type names listed in a group, with annotations dropped.
fn type_names(m: &MaskedMatch<'_>, group: &str) -> Vec<String> {
    match m.masked_group_text(group) {
        Some(mut text) => {
            text.mask_all(&ANNOTATION_PATTERN);
            text.find_all_original(&TYPE_PATTERN)
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect()
        }
        None => Vec::new(),
    }
}

fn parameters(m: &MaskedMatch<'_>, group: &str) -> Vec<ParameterDecl> {
    let (Some(text), Some(range)) = (m.masked_group_text(group), m.group_range(group)) else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut pos = 0;
    while let Some(p) = text.find_at(&PARAMETER_PATTERN, pos) {
        let ty = p.original_group("type").unwrap_or("").trim();
        let name = p.original_group("name").unwrap_or("");
        if is_reserved_non_type(first_word(ty)) || is_reserved(name) {
            pos = text.next_char(p.start());
            continue;
        }
        let ty = if p.has_group("vararg") {
            format!("{ty}...")
        } else {
            ty.to_string()
        };
        params.push(ParameterDecl {
            name: name.to_string(),
            ty,
            modifiers: modifier_texts(&p, "modifiers"),
            span: Span::new(range.start + p.start(), range.start + p.end()),
        });
        pos = p.end();
    }
    params
}

struct ParameterDecl {
    name: String,
    ty: String,
    modifiers: Vec<String>,
    span: Span,
}

enum DeclarationKind {
    Named {
        construct: String,
        extends: Vec<String>,
        implements: Vec<String>,
    },
    Anonymous {
        super_type: Option<String>,
    },
    Method {
        return_type: Option<String>,
        params: Vec<ParameterDecl>,
        throws: Vec<String>,
    },
}

/// Everything needed from one declaration match, copied out of the text so
/// the text can be masked afterwards.
struct Declaration {
    name: String,
    span: Span,
    type_params: Option<String>,
    modifiers: Vec<String>,
    kind: DeclarationKind,
}

impl Declaration {
    fn from_match(m: &MaskedMatch<'_>) -> Self {
        let whole = m.original();
        let leading = whole.len() - whole.trim_start().len();
        let span = Span::new(m.start() + leading, m.end());
        let owned = |group: &str| m.original_group(group).map(|s| s.trim().to_string());

        let (name, type_params, kind) = if m.has_group("type") {
            let kind = DeclarationKind::Named {
                construct: owned("construct").unwrap_or_else(|| "class".to_string()),
                extends: type_names(m, "extends"),
                implements: type_names(m, "implements"),
            };
            (owned("typeName"), owned("typeParams"), kind)
        } else if m.has_group("anon") {
            let kind = DeclarationKind::Anonymous {
                super_type: type_names(m, "superType").into_iter().next(),
            };
            (None, None, kind)
        } else if m.has_group("method") {
            let kind = DeclarationKind::Method {
                return_type: owned("returnType"),
                params: parameters(m, "params"),
                throws: type_names(m, "throws"),
            };
            (owned("methodName"), owned("methodTypeParams"), kind)
        } else {
            let kind = DeclarationKind::Method {
                return_type: None,
                params: parameters(m, "ctorParams"),
                throws: type_names(m, "ctorThrows"),
            };
            (owned("ctorName"), owned("ctorTypeParams"), kind)
        };

        Self {
            name: name.unwrap_or_default(),
            span,
            type_params,
            modifiers: modifier_texts(m, "modifiers"),
            kind,
        }
    }
}

/// Per-file scanning state.
struct CompilationUnit<'g, 'p> {
    graph: &'g mut ScopeGraph,
    file: FileId,
    path: &'p str,
    anonymous: usize,
    /// Definitions not yet known to be nested in anything, by start offset.
    top_level: Vec<(usize, DefId)>,
}

impl CompilationUnit<'_, '_> {
    fn insert(&mut self, declaration: Declaration) -> ModelResult<DefId> {
        let Declaration {
            name,
            span,
            type_params,
            modifiers,
            kind,
        } = declaration;

        let (name, scope_kind, named_construct) = match &kind {
            DeclarationKind::Named { construct, .. } => {
                let category = if construct == "interface" {
                    TypeCategory::Interface
                } else {
                    TypeCategory::Class
                };
                let ty = TypeDefinition::new(category, construct.as_str());
                (name, ScopeKind::Type(ty), Some(construct.clone()))
            }
            DeclarationKind::Anonymous { .. } => {
                self.anonymous += 1;
                let line = self
                    .graph
                    .file(self.file)
                    .map(|f| f.line_of(span.start))
                    .unwrap_or_default();
                let name = format!("[anonymous class #{} at {}:{}]", self.anonymous, self.path, line);
                let ty = TypeDefinition::new(TypeCategory::Class, "class");
                (name, ScopeKind::Type(ty), None)
            }
            DeclarationKind::Method { .. } => {
                (name, ScopeKind::Method(MethodDefinition::default()), None)
            }
        };

        let mut def = Definition::located(name, self.file, span);
        def.modifiers.extend(modifiers.iter().map(|m| java_modifier(m)));
        let mut scoped = ScopedDefinition::new(def, scope_kind);
        scoped.type_params = type_params;
        let id = self.graph.alloc(scoped);

        match kind {
            DeclarationKind::Named {
                construct,
                extends,
                implements,
            } => {
                let extends_hint = if construct == "interface" {
                    TypeCategory::Interface
                } else {
                    TypeCategory::Class
                };
                if let Some(ty) = self.graph.get_mut(id).and_then(ScopedDefinition::as_type_mut) {
                    for name in extends {
                        ty.add_super_type(QualifiedTypeName::parse(id, &name).category_hint(extends_hint));
                    }
                    for name in implements {
                        ty.add_super_type(
                            QualifiedTypeName::parse(id, &name).category_hint(TypeCategory::Interface),
                        );
                    }
                }
            }
            DeclarationKind::Anonymous { super_type } => {
                if let (Some(name), Some(ty)) = (
                    super_type,
                    self.graph.get_mut(id).and_then(ScopedDefinition::as_type_mut),
                ) {
                    ty.add_super_type(QualifiedTypeName::parse(id, &name));
                }
            }
            DeclarationKind::Method {
                return_type,
                params,
                throws,
            } => {
                let file = self.file;
                let method = MethodDefinition {
                    return_type: return_type.map(|t| QualifiedTypeName::parse(id, &t)),
                    constructor: false,
                    parameters: params
                        .into_iter()
                        .map(|p| {
                            let mut def = Definition::located(p.name, file, p.span);
                            def.modifiers.extend(p.modifiers.iter().map(|m| java_modifier(m)));
                            let mut param = ParameterDefinition::new(def);
                            param.ty = Some(QualifiedTypeName::parse(id, &p.ty));
                            param
                        })
                        .collect(),
                    exceptions: throws
                        .iter()
                        .map(|t| QualifiedTypeName::parse(id, t))
                        .collect(),
                };
                if let Some(slot) = self.graph.get_mut(id).and_then(ScopedDefinition::as_method_mut) {
                    *slot = method;
                }
            }
        }

        debug!(
            path = self.path,
            name = self.graph[id].name(),
            construct = self.graph[id].construct(),
            %span,
            "recorded declaration"
        );

        self.adopt_members(id, span, named_construct.as_deref())?;
        Ok(id)
    }

    /// Re-parent every earlier top-level definition that lies inside `span`.
    fn adopt_members(&mut self, id: DefId, span: Span, construct: Option<&str>) -> ModelResult<()> {
        let graph = &*self.graph;
        let members: Vec<DefId> = self
            .top_level
            .iter()
            .filter(|(start, member)| {
                *start > span.start && graph[*member].def.span.is_some_and(|s| span.contains(&s))
            })
            .map(|&(_, member)| member)
            .collect();

        let type_name = self.graph[id].name().to_string();
        for &member in &members {
            self.widen(member, construct, &type_name);
            self.graph.add_nested(id, member)?;
        }
        self.top_level.retain(|(_, m)| !members.contains(m));

        let at = self.top_level.partition_point(|&(start, _)| start < span.start);
        self.top_level.insert(at, (span.start, id));
        Ok(())
    }

    /// Apply what the enclosing construct implies about a member.
    fn widen(&mut self, member: DefId, construct: Option<&str>, type_name: &str) {
        let Some(construct) = construct else {
            return;
        };
        let Some(scoped) = self.graph.get_mut(member) else {
            return;
        };
        let is_method = scoped.as_method().is_some();
        let modifiers = &mut scoped.def.modifiers;

        if construct == "interface" {
            // Private interface members keep their own access and always have a body.
            if !modifiers.contains(&Modifier::Private) {
                modifiers.insert(Modifier::Public);
                if is_method
                    && !modifiers.contains(&Modifier::Static)
                    && !modifiers.contains(&Modifier::Default)
                {
                    modifiers.insert(Modifier::Abstract);
                }
            }
        } else if !modifiers.iter().any(Modifier::is_access) {
            modifiers.insert(Modifier::PackagePrivate);
        }

        let named_like_type = scoped.def.name == type_name;
        if let Some(method) = scoped.as_method_mut() {
            if method.return_type.is_none() && named_like_type {
                method.constructor = true;
            }
        }
    }
}
