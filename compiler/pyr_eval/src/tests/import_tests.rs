//! `import` and `from ... import` through a module importer.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use pyr_ir::build as ir;
use pyr_ir::{ImportFrom, Name, Stmt};
use pyr_object::{Object, Payload};

use super::Harness;
use crate::{EvaluatorBuilder, GlobalContext, ImportKind, ModuleImporter, ModuleTable};

fn int(value: i64) -> Object {
    Object::new(Payload::Int(value), None)
}

fn module(attributes: Vec<(&str, Object)>) -> Object {
    Object::with_attributes(Payload::Plain, attributes)
}

fn with_modules() -> Harness {
    let sub = module(vec![("depth", int(2))]);
    let table = ModuleTable::new()
        .with_module(
            "tools",
            module(vec![("answer", int(42)), ("_hidden", int(0))]),
        )
        .with_module("pkg", module(vec![("depth", int(1))]))
        .with_module("pkg.sub", sub);
    let global = GlobalContext::builder().importer(table).build();
    Harness::with(EvaluatorBuilder::new().global(global))
}

#[test]
fn test_import_binds_module() {
    let harness = with_modules();
    harness.run_ok(vec![ir::import(vec![
        ir::alias("tools", None),
        ir::alias("tools", Some("t")),
    ])]);
    let tools = harness.global("tools");
    let alias = harness.global("t");
    assert!(tools.is_some_and(|tools| alias.is_some_and(|alias| tools.is(&alias))));
}

#[test]
fn test_dotted_import_binds_top_level_package() {
    let harness = with_modules();
    harness.run_ok(vec![ir::import(vec![ir::alias("pkg.sub", None)])]);
    let depth = harness
        .global("pkg")
        .and_then(|pkg| pkg.get_attribute("depth"))
        .and_then(|depth| depth.as_int());
    assert_eq!(depth, Some(1));
    assert!(harness.global("sub").is_none());
}

#[test]
fn test_modules_are_cached_and_pinned() {
    let harness = with_modules();
    harness.run_ok(vec![
        ir::import(vec![ir::alias("tools", None)]),
        ir::import(vec![ir::alias("tools", Some("again"))]),
    ]);
    assert_eq!(harness.ctx.global().cached_modules(), 1);
    assert!(harness.global("tools").is_some_and(|tools| tools.is_pinned()));
}

#[test]
fn test_missing_module_is_module_not_found() {
    let harness = with_modules();
    let error = harness.raised(vec![ir::import(vec![ir::alias("nowhere", None)])]);
    assert_eq!(error.type_name(), "ModuleNotFoundError");
    assert_eq!(error.message(), "No module named 'nowhere'");

    // A ModuleNotFoundError is an ImportError.
    harness.run_ok(vec![ir::try_stmt(
        vec![ir::import(vec![ir::alias("nowhere", None)])],
        vec![ir::handler(Some(ir::name("ImportError")), None, vec![])],
        vec![],
        vec![],
    )]);
}

#[test]
fn test_from_import_binds_names() {
    let harness = with_modules();
    harness.run_ok(vec![
        ir::import_from("tools", vec![ir::alias("answer", None)]),
        ir::import_from("tools", vec![ir::alias("answer", Some("a"))]),
    ]);
    assert_eq!(harness.global_int("answer"), Some(42));
    assert_eq!(harness.global_int("a"), Some(42));
}

#[test]
fn test_from_import_falls_back_to_submodule() {
    let harness = with_modules();
    harness.run_ok(vec![ir::import_from("pkg", vec![ir::alias("sub", None)])]);
    let depth = harness
        .global("sub")
        .and_then(|sub| sub.get_attribute("depth"))
        .and_then(|depth| depth.as_int());
    assert_eq!(depth, Some(2));
}

#[test]
fn test_from_import_missing_name_is_import_error() {
    let harness = with_modules();
    let error = harness.raised(vec![ir::import_from(
        "tools",
        vec![ir::alias("missing", None)],
    )]);
    assert_eq!(error.type_name(), "ImportError");
    assert_eq!(error.message(), "cannot import name 'missing' from 'tools'");
}

#[test]
fn test_star_import_copies_public_names() {
    let harness = with_modules();
    harness.run_ok(vec![ir::import_from("tools", vec![ir::alias("*", None)])]);
    assert_eq!(harness.global_int("answer"), Some(42));
    assert!(harness.global("_hidden").is_none());
}

/// Records every request and resolves nothing.
#[derive(Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<(ImportKind, String)>>>,
}

impl ModuleImporter for Recorder {
    fn import(&self, kind: ImportKind, qualified_name: &str) -> Option<Object> {
        self.requests.lock().push((kind, qualified_name.to_owned()));
        None
    }
}

#[test]
fn test_importer_sees_kind_and_qualified_name() {
    let recorder = Recorder::default();
    let requests = Arc::clone(&recorder.requests);
    let global = GlobalContext::builder().importer(recorder).build();
    let harness = Harness::with(EvaluatorBuilder::new().global(global));

    let relative = Stmt::ImportFrom(Arc::new(ImportFrom {
        module: Name::new("sibling"),
        names: vec![ir::alias("thing", None)],
        level: 2,
    }));
    let absolute = harness.raised(vec![ir::import(vec![ir::alias("json", None)])]);
    let from = harness.raised(vec![relative]);
    assert_eq!(absolute.type_name(), "ModuleNotFoundError");
    assert_eq!(from.message(), "No module named '..sibling'");

    assert_eq!(
        *requests.lock(),
        vec![
            (ImportKind::Import, "json".to_owned()),
            (ImportKind::ImportFrom, "..sibling".to_owned()),
        ]
    );
}
