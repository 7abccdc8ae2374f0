//! Inheritance trees built from the fixture projects in `testdata/`.

use std::path::{Path, PathBuf};

use polytree::model::{DefinitionClass, Modifier, TypeCategory};
use polytree::tree::TypeGraph;
use polytree::Workspace;
use walkdir::WalkDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Scan every source file beneath `root`, skipping the `skip` directory.
fn load(root: &Path, skip: Option<&str>) -> Workspace {
    let mut workspace = Workspace::new("fixture");
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.expect("should walk testdata");
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("entry beneath root")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if skip.is_some_and(|dir| relative.starts_with(dir)) {
            continue;
        }
        let content = std::fs::read_to_string(entry.path()).expect("should read fixture");
        workspace
            .add_file(&relative, &content)
            .expect("fixture should scan");
    }
    workspace
}

fn parent_names(tree: &TypeGraph, name: &str) -> Vec<String> {
    let id = tree.find(name).unwrap_or_else(|| panic!("no type {name}"));
    tree[id]
        .parents()
        .iter()
        .map(|&p| tree[p].name().to_string())
        .collect()
}

#[test]
fn test_java_fixture_types() {
    let workspace = load(&testdata_path().join("java"), Some("generated/"));
    let project = workspace.project("java").expect("java project");
    assert_eq!(project.file_count(), 5);
    assert!(workspace.project("python").is_none());

    let tree = project.build().unwrap();
    let graph = project.graph();

    let shape = tree.find("Shape").unwrap();
    let def = &graph[tree[shape].definition().unwrap()];
    assert!(def.def.has(&Modifier::Abstract));
    assert!(def.def.has(&Modifier::Public));
    assert_eq!(tree[shape].category(), TypeCategory::Class);

    let shapes = tree.find("Shapes").unwrap();
    assert!(graph[tree[shapes].definition().unwrap()].def.has(&Modifier::Final));
    assert!(tree.standalone().contains(&shapes));
    assert!(tree.find("Generated").is_none());
}

#[test]
fn test_java_cross_package_inheritance() {
    let workspace = load(&testdata_path().join("java"), Some("generated/"));
    let tree = workspace.project("java").unwrap().build().unwrap();

    assert_eq!(parent_names(&tree, "Circle"), vec!["Shape"]);
    // Resolved through `import p.*`.
    assert_eq!(parent_names(&tree, "Square"), vec!["Shape"]);

    let shape = tree.find("Shape").unwrap();
    let comparable = tree[shape].parents()[0];
    assert!(tree[comparable].name().starts_with("Comparable"));
    assert!(tree[comparable].is_external());
    assert!(tree[comparable].file().is_none());
    assert!(tree.roots().contains(&comparable));

    let square = tree.find("Square").unwrap();
    assert!(tree.inherits_from(square, comparable));
    assert!(!tree.inherits_from(comparable, square));
}

#[test]
fn test_java_wildcard_import_skips_package_private_types() {
    let workspace = load(&testdata_path().join("java"), Some("generated/"));
    let tree = workspace.project("java").unwrap().build().unwrap();

    let tile = tree.find("Tile").unwrap();
    let helper = tree[tile].parents()[0];
    assert_eq!(tree[helper].name(), "Helper");
    assert!(tree[helper].is_external());

    // The real p.Helper stays a project type with no subclasses.
    let project_helper = tree
        .types()
        .find(|(_, t)| t.name() == "Helper" && !t.is_external())
        .map(|(id, _)| id)
        .unwrap();
    assert!(tree[project_helper].children().is_empty());
}

#[test]
fn test_java_fixture_overrides() {
    let workspace = load(&testdata_path().join("java"), Some("generated/"));
    let tree = workspace.project("java").unwrap().build().unwrap();

    let shape = tree.find("Shape").unwrap();
    let circle = tree.find("Circle").unwrap();
    let square = tree.find("Square").unwrap();

    let area = tree.find_method(shape, "area").unwrap();
    let circle_area = tree.find_method(circle, "area").unwrap();
    let square_area = tree.find_method(square, "area").unwrap();
    assert_eq!(tree[circle_area].overrides(), Some(area));
    assert_eq!(tree[square_area].overrides(), Some(area));
    assert_eq!(tree[area].overridden_by().len(), 2);
    assert!(tree[area].overridden_by().contains(&circle_area));
    assert!(tree[area].overridden_by().contains(&square_area));

    let describe = tree.find_method(shape, "describe").unwrap();
    let square_describe = tree.find_method(square, "describe").unwrap();
    assert_eq!(tree[square_describe].overrides(), Some(describe));

    // Private methods never take part, and constructors are not methods.
    let log = tree.find_method(shape, "log").unwrap();
    assert!(tree[log].overridden_by().is_empty());
    assert!(tree.find_method(circle, "Circle").is_none());

    // Nothing is known about the external interface's methods.
    let compare_to = tree.find_method(shape, "compareTo").unwrap();
    assert_eq!(tree[compare_to].overrides(), None);
}

#[test]
fn test_python_fixture_modules_and_imports() {
    let workspace = load(&testdata_path().join("python"), None);
    let project = workspace.project("python").expect("python project");
    assert_eq!(project.file_count(), 4);

    let tree = project.build().unwrap();
    let graph = project.graph();

    let shape = tree.find("Shape").unwrap();
    let def = tree[shape].definition().unwrap();
    assert_eq!(graph.qualified_display(def), "shapes.base.Shape");
    // ABC marks the class abstract instead of becoming a parent.
    assert!(graph[def].def.has(&Modifier::Abstract));
    assert!(tree[shape].parents().is_empty());
    assert!(tree.find("ABC").is_none());

    // `from .base import Shape`
    assert_eq!(parent_names(&tree, "Circle"), vec!["Shape"]);
    // `from shapes.circle import Circle`
    assert_eq!(parent_names(&tree, "Ring"), vec!["Circle"]);
    // `import shapes.base as base`
    assert_eq!(parent_names(&tree, "Square"), vec!["Shape"]);
    assert!(tree.types().all(|(_, t)| !t.is_external()));
}

#[test]
fn test_python_fixture_overrides() {
    let workspace = load(&testdata_path().join("python"), None);
    let tree = workspace.project("python").unwrap().build().unwrap();

    let shape = tree.find("Shape").unwrap();
    let circle = tree.find("Circle").unwrap();
    let ring = tree.find("Ring").unwrap();
    let square = tree.find("Square").unwrap();

    let area = tree.find_method(shape, "area").unwrap();
    let circle_area = tree.find_method(circle, "area").unwrap();
    let ring_area = tree.find_method(ring, "area").unwrap();
    let square_area = tree.find_method(square, "area").unwrap();

    assert_eq!(tree[circle_area].overrides(), Some(area));
    assert_eq!(tree[ring_area].overrides(), Some(circle_area));
    assert_eq!(tree[square_area].overrides(), Some(area));
    assert!(tree[area].overridden_by().contains(&circle_area));
    assert!(!tree[area].overridden_by().contains(&ring_area));

    let describe = tree.find_method(shape, "describe").unwrap();
    let square_describe = tree.find_method(square, "describe").unwrap();
    assert_eq!(tree[square_describe].overrides(), Some(describe));

    assert!(tree.find_method(circle, "__init__").is_none());
    assert!(tree.inherits_from(ring, shape));
}

#[test]
fn test_languages_are_built_separately() {
    let mut workspace = load(&testdata_path().join("python"), None);
    workspace
        .add_file("Shape.java", "public class Shape { void area() {} }")
        .unwrap();

    let python = workspace.project("python").unwrap().build().unwrap();
    let java = workspace.project("java").unwrap().build().unwrap();
    assert_eq!(java.len(), 1);
    assert!(python.len() > 1);
    assert_eq!(workspace.projects()[0].language_id(), "python");
}

#[test]
fn test_scanned_definitions_lie_within_their_containers() {
    for language in ["java", "python"] {
        let workspace = load(&testdata_path().join(language), None);
        let graph = workspace.project(language).unwrap().graph();

        let mut checked = 0;
        for id in graph.walk(DefinitionClass::Any) {
            let Some(parent) = graph[id].containing() else {
                continue;
            };
            let (child, outer) = (&graph[id].def, &graph[parent].def);
            let (Some(span), Some(outer_span)) = (child.span, outer.span) else {
                continue;
            };
            if child.file.is_none() || child.file != outer.file {
                continue;
            }
            assert!(
                outer_span.contains(&span),
                "{language}: {} {span:?} outside {} {outer_span:?}",
                child.name,
                outer.name
            );
            checked += 1;
        }
        assert!(checked > 0, "{language}: no nested definitions checked");
    }
}
