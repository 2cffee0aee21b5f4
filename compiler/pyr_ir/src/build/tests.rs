use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_assign_builds_single_target() {
    let stmt = assign(name("x"), int(1));
    let Stmt::Assign(node) = stmt else {
        panic!("expected Assign");
    };
    assert_eq!(node.targets, vec![name("x")]);
    assert_eq!(node.value, int(1));
}

#[test]
fn test_function_def_has_positional_params() {
    let def = function("add", &["a", "b"], vec![return_stmt(None)]);
    let params: Vec<&str> = def.args.args.iter().map(|arg| arg.name.as_str()).collect();
    assert_eq!(params, vec!["a", "b"]);
    assert!(def.args.defaults.is_empty());
    assert!(def.decorator_list.is_empty());
}

#[test]
fn test_alias_bound_name_prefers_asname() {
    assert_eq!(alias("os", None).bound_name().as_str(), "os");
    assert_eq!(alias("os", Some("system")).bound_name().as_str(), "system");
}

#[test]
fn test_kind_name_covers_placeholders() {
    assert_eq!(Stmt::Global(vec![]).kind_name(), "Global");
    assert_eq!(Stmt::Pass.kind_name(), "Pass");
    assert_eq!(expr_stmt(none()).kind_name(), "Expr");
}

#[test]
fn test_compare_has_one_operator() {
    let Expr::Compare(node) = compare(int(1), CmpOp::Lt, int(2)) else {
        panic!("expected Compare");
    };
    assert_eq!(node.ops, vec![CmpOp::Lt]);
    assert_eq!(node.comparators.len(), 1);
}
