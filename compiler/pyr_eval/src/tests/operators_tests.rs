//! Operators, comparisons, boolean chains and truth tests.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use pyr_ir::build as ir;
use pyr_ir::{BinaryOp, BoolOp, CmpOp, CompareExpr, Expr, UnaryOp};
use pyr_object::{NativeHost, NativeResult, Object};

use super::{call, print, Harness};
use crate::{EvalError, Fault};

fn int_of(harness: &Harness, expr: Expr) -> Option<i64> {
    harness.eval_ok(expr).as_int()
}

fn raised_kind(harness: &Harness, expr: Expr) -> Option<String> {
    harness
        .eval(expr)
        .err()
        .and_then(|error| error.exception().map(|exception| exception.type_name()))
}

fn chain(left: Expr, ops: Vec<CmpOp>, comparators: Vec<Expr>) -> Expr {
    Expr::Compare(Arc::new(CompareExpr {
        left,
        ops,
        comparators,
    }))
}

#[test]
fn test_integer_arithmetic() {
    let harness = Harness::new();
    let cases = [
        (7, BinaryOp::FloorDiv, 2, 3),
        (-7, BinaryOp::FloorDiv, 2, -4),
        (-7, BinaryOp::Mod, 2, 1),
        (7, BinaryOp::Mod, -2, -1),
        (2, BinaryOp::Pow, 10, 1024),
        (1, BinaryOp::LShift, 4, 16),
        (-16, BinaryOp::RShift, 2, -4),
        (6, BinaryOp::BitAnd, 3, 2),
        (6, BinaryOp::BitOr, 3, 7),
        (6, BinaryOp::BitXor, 3, 5),
    ];
    for (left, op, right, expected) in cases {
        let value = int_of(&harness, ir::binop(ir::int(left), op, ir::int(right)));
        assert_eq!(value, Some(expected), "{left} {} {right}", op.as_symbol());
    }
}

#[test]
fn test_true_division_and_float_results() {
    let harness = Harness::new();
    let half = harness.eval_ok(ir::binop(ir::int(7), BinaryOp::Div, ir::int(2)));
    assert_eq!(half.as_float(), Some(3.5));
    let inverse = harness.eval_ok(ir::binop(ir::int(2), BinaryOp::Pow, ir::int(-1)));
    assert_eq!(inverse.as_float(), Some(0.5));
    let mixed = harness.eval_ok(ir::binop(ir::int(1), BinaryOp::Add, ir::float(0.5)));
    assert_eq!(mixed.as_float(), Some(1.5));
}

#[test]
fn test_arithmetic_errors() {
    let harness = Harness::new();
    assert_eq!(
        raised_kind(&harness, ir::binop(ir::int(1), BinaryOp::Div, ir::int(0))),
        Some("ZeroDivisionError".to_owned())
    );
    assert_eq!(
        raised_kind(&harness, ir::binop(ir::int(1), BinaryOp::Mod, ir::int(0))),
        Some("ZeroDivisionError".to_owned())
    );
    assert_eq!(
        raised_kind(
            &harness,
            ir::binop(ir::int(i64::MAX), BinaryOp::Add, ir::int(1))
        ),
        Some("OverflowError".to_owned())
    );
    assert_eq!(
        raised_kind(&harness, ir::binop(ir::int(1), BinaryOp::LShift, ir::int(-1))),
        Some("TypeError".to_owned())
    );
}

#[test]
fn test_string_and_tuple_operators() {
    let harness = Harness::new();
    let joined = harness.eval_ok(ir::binop(ir::string("ab"), BinaryOp::Add, ir::string("cd")));
    assert_eq!(joined.as_str(), Some("abcd"));
    let repeated = harness.eval_ok(ir::binop(ir::string("ab"), BinaryOp::Mult, ir::int(2)));
    assert_eq!(repeated.as_str(), Some("abab"));
    let tuple = harness.eval_ok(ir::binop(
        ir::tuple(vec![ir::int(1)]),
        BinaryOp::Add,
        ir::tuple(vec![ir::int(2)]),
    ));
    assert_eq!(tuple.display_string(), "(1, 2)");
}

#[test]
fn test_unsupported_operands() {
    let harness = Harness::new();
    let outcome = harness.eval(ir::binop(ir::none(), BinaryOp::Add, ir::int(1)));
    let message = outcome
        .err()
        .and_then(|error| error.exception().map(|exception| exception.message()));
    assert_eq!(
        message,
        Some("unsupported operand type(s) for +: 'NoneType' and 'int'".to_owned())
    );
}

#[test]
fn test_unary_operators() {
    let harness = Harness::new();
    assert_eq!(int_of(&harness, ir::unary(UnaryOp::USub, ir::int(5))), Some(-5));
    assert_eq!(int_of(&harness, ir::unary(UnaryOp::Invert, ir::int(5))), Some(-6));
    let negated = harness.eval_ok(ir::unary(UnaryOp::Not, ir::int(0)));
    assert_eq!(negated.as_bool(), Some(true));
    let negated = harness.eval_ok(ir::unary(UnaryOp::Not, ir::string("x")));
    assert_eq!(negated.as_bool(), Some(false));
    assert_eq!(
        raised_kind(&harness, ir::unary(UnaryOp::USub, ir::string("x"))),
        Some("TypeError".to_owned())
    );
}

#[test]
fn test_comparisons() {
    let harness = Harness::new();
    let truth = |expr: Expr| harness.eval_ok(expr).as_bool();
    assert_eq!(truth(ir::compare(ir::int(1), CmpOp::Eq, ir::float(1.0))), Some(true));
    assert_eq!(truth(ir::compare(ir::string("a"), CmpOp::Lt, ir::string("b"))), Some(true));
    assert_eq!(truth(ir::compare(ir::none(), CmpOp::Eq, ir::none())), Some(true));
    assert_eq!(truth(ir::compare(ir::int(1), CmpOp::NotEq, ir::string("1"))), Some(true));
    assert_eq!(
        truth(ir::compare(ir::name("int"), CmpOp::Is, ir::name("int"))),
        Some(true)
    );
    assert_eq!(
        raised_kind(&harness, ir::compare(ir::int(1), CmpOp::Lt, ir::string("a"))),
        Some("TypeError".to_owned())
    );
}

#[test]
fn test_comparison_chains_short_circuit() {
    let harness = Harness::new();
    let ascending = chain(ir::int(1), vec![CmpOp::Lt, CmpOp::Lt], vec![ir::int(2), ir::int(3)]);
    assert_eq!(harness.eval_ok(ascending).as_bool(), Some(true));

    let broken = chain(ir::int(1), vec![CmpOp::Lt, CmpOp::Lt], vec![ir::int(3), ir::int(2)]);
    assert_eq!(harness.eval_ok(broken).as_bool(), Some(false));

    // The failing link stops evaluation before the division.
    let guarded = chain(
        ir::int(3),
        vec![CmpOp::Lt, CmpOp::Lt],
        vec![
            ir::int(2),
            ir::binop(ir::int(1), BinaryOp::Div, ir::int(0)),
        ],
    );
    assert_eq!(harness.eval_ok(guarded).as_bool(), Some(false));
}

#[test]
fn test_comparison_missing_operators_is_a_fault() {
    let harness = Harness::new();
    let lopsided = chain(ir::int(1), vec![CmpOp::Lt], vec![ir::int(2), ir::int(3)]);
    let outcome = harness.eval(lopsided);
    assert!(
        matches!(
            outcome,
            Err(EvalError::Fault(Fault::MalformedNode {
                context: "comparison"
            }))
        ),
        "{outcome:?}"
    );

    let bare = chain(ir::int(1), vec![], vec![ir::int(2)]);
    assert!(matches!(
        harness.eval(bare),
        Err(EvalError::Fault(Fault::MalformedNode { .. }))
    ));
}

#[test]
fn test_boolean_operators_return_operands() {
    let harness = Harness::new();
    let either = harness.eval_ok(ir::boolop(BoolOp::Or, vec![ir::int(0), ir::int(5)]));
    assert_eq!(either.as_int(), Some(5));
    let both = harness.eval_ok(ir::boolop(
        BoolOp::And,
        vec![ir::int(0), ir::binop(ir::int(1), BinaryOp::Div, ir::int(0))],
    ));
    assert_eq!(both.as_int(), Some(0));
    let last = harness.eval_ok(ir::boolop(
        BoolOp::And,
        vec![ir::int(1), ir::string(""), ir::int(3)],
    ));
    assert_eq!(last.as_str(), Some(""));
}

fn always_false(host: &dyn NativeHost, _args: &[Object]) -> NativeResult {
    Ok(host.builtins().bool(false))
}

fn zero_length(host: &dyn NativeHost, _args: &[Object]) -> NativeResult {
    Ok(host.builtins().int(0))
}

fn add_marker(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let other = args[1].display_string();
    Ok(host.builtins().str(&format!("added {other}")))
}

#[test]
fn test_truth_asks_bool_then_len() {
    let harness = Harness::new();
    let falsy = harness.define_class("Falsy", &[]);
    falsy.set_attribute("__bool__", harness.builtins().native("__bool__", always_false));
    let empty = harness.define_class("Empty", &[]);
    empty.set_attribute("__len__", harness.builtins().native("__len__", zero_length));
    harness.define_class("Plain", &[]);

    let test = |class: &str| {
        ir::if_stmt(
            call(class, vec![]),
            vec![print(vec![ir::string("yes")])],
            vec![print(vec![ir::string("no")])],
        )
    };
    harness.run_ok(vec![test("Falsy"), test("Empty"), test("Plain")]);
    assert_eq!(harness.output(), "no\nno\nyes\n");
}

#[test]
fn test_binary_operator_dispatches_to_dunder() {
    let harness = Harness::new();
    let class = harness.define_class("Adder", &[]);
    class.set_attribute("__add__", harness.builtins().native("__add__", add_marker));
    let result = harness.eval_ok(ir::binop(call("Adder", vec![]), BinaryOp::Add, ir::int(3)));
    assert_eq!(result.as_str(), Some("added 3"));
}

#[test]
fn test_identity_equality_fallback() {
    let harness = Harness::new();
    harness.define_class("Thing", &[]);
    harness.run_ok(vec![
        ir::assign(ir::name("a"), call("Thing", vec![])),
        ir::assign(ir::name("b"), call("Thing", vec![])),
        print(vec![ir::compare(ir::name("a"), CmpOp::Eq, ir::name("a"))]),
        print(vec![ir::compare(ir::name("a"), CmpOp::Eq, ir::name("b"))]),
        print(vec![ir::compare(ir::name("a"), CmpOp::IsNot, ir::name("b"))]),
    ]);
    assert_eq!(harness.output(), "True\nFalse\nTrue\n");
}

mod proptest_arithmetic {
    use proptest::prelude::*;

    use super::super::Harness;
    use pyr_ir::build as ir;
    use pyr_ir::BinaryOp;

    proptest! {
        #[test]
        fn addition_matches_checked_arithmetic(left in any::<i64>(), right in any::<i64>()) {
            let harness = Harness::new();
            let outcome = harness.eval(ir::binop(ir::int(left), BinaryOp::Add, ir::int(right)));
            match left.checked_add(right) {
                Some(sum) => {
                    prop_assert_eq!(outcome.ok().and_then(|value| value.as_int()), Some(sum));
                }
                None => {
                    let kind = outcome
                        .err()
                        .and_then(|error| error.exception().map(|exception| exception.type_name()));
                    prop_assert_eq!(kind, Some("OverflowError".to_owned()));
                }
            }
        }

        #[test]
        fn floor_division_and_modulo_agree(
            left in -10_000_i64..10_000,
            right in prop_oneof![-50_i64..-1, 1_i64..50],
        ) {
            let harness = Harness::new();
            let quotient = harness
                .eval(ir::binop(ir::int(left), BinaryOp::FloorDiv, ir::int(right)))
                .ok()
                .and_then(|value| value.as_int());
            let remainder = harness
                .eval(ir::binop(ir::int(left), BinaryOp::Mod, ir::int(right)))
                .ok()
                .and_then(|value| value.as_int());
            let (Some(quotient), Some(remainder)) = (quotient, remainder) else {
                return Err(TestCaseError::fail("integer division failed"));
            };
            prop_assert_eq!(quotient * right + remainder, left);
            prop_assert!(remainder == 0 || (remainder < 0) == (right < 0));
        }
    }
}
