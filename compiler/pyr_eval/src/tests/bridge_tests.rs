//! The exception bridge seen from inside the crate.

use pretty_assertions::assert_eq;
use pyr_ir::build as ir;
use pyr_ir::Stmt;
use pyr_object::{ExceptionKind, Object};

use super::Harness;
use crate::errors::{Jump, Unwind};
use crate::evaluator::Completion;
use crate::step::Step;
use crate::{EvalError, Evaluator, EvaluatorBuilder, Fault};

#[test]
fn test_do_try_reports_no_exception_for_clean_block() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let outcome = evaluator.do_try(&[Stmt::Pass], None);
    assert!(matches!(outcome, Ok(Completion::Normal)));
}

#[test]
fn test_do_try_chains_context_onto_raised_exception() {
    let harness = Harness::new();
    let handling = harness
        .builtins()
        .new_exception(ExceptionKind::TypeError, "being handled");
    let mut evaluator = Evaluator::new(&harness.ctx);
    let body = vec![ir::raise(Some(ir::name("NameError")), None)];
    let Ok(Completion::Raised(raised)) = evaluator.do_try(&body, Some(handling)) else {
        panic!("guarded block should report the exception");
    };
    assert_eq!(raised.type_name(), "NameError");
    assert_eq!(
        raised.context().map(|context| context.message()),
        Some("being handled".to_owned())
    );
}

#[test]
fn test_bare_reraise_returns_the_context_itself() {
    let harness = Harness::new();
    let handling = harness
        .builtins()
        .new_exception(ExceptionKind::TypeError, "original");
    let payload = handling.payload().clone();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let Ok(Completion::Raised(raised)) = evaluator.try_steps(vec![Step::ReRaise], Some(handling)) else {
        panic!("re-raise should report the exception");
    };
    assert!(raised.payload().is(&payload));
    assert!(raised.context().is_none());
}

#[test]
fn test_bare_reraise_without_context_is_runtime_error() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let Ok(Completion::Raised(raised)) = evaluator.try_steps(vec![Step::ReRaise], None) else {
        panic!("re-raise should report an exception");
    };
    assert_eq!(raised.type_name(), "RuntimeError");
}

#[test]
fn test_invariant_faults_pass_through_unchanged() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let outcome = evaluator.try_steps(vec![Step::Discard], None);
    assert!(matches!(
        outcome,
        Err(Fault::StackUnderflow { context: "discard" })
    ));
}

#[test]
fn test_host_faults_become_runtime_errors() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let failing = Step::Deferred(Box::new(|_: &mut Evaluator<'_>| {
        Err(Unwind::Fault(Fault::Host("socket closed".to_owned())))
    }));
    let Ok(Completion::Raised(raised)) = evaluator.try_steps(vec![failing], None) else {
        panic!("host fault should become an exception");
    };
    assert_eq!(raised.type_name(), "RuntimeError");
    assert_eq!(raised.message(), "socket closed");
}

#[test]
fn test_aborted_block_restores_return_slot() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let steps = vec![
        Step::Eval(ir::int(5)),
        Step::SetResult,
        Step::Eval(ir::name("missing")),
    ];
    let outcome = evaluator.try_steps(steps, None);
    assert!(matches!(outcome, Ok(Completion::Raised(_))));
    assert!(harness.ctx.return_value().is_none());
}

#[test]
fn test_nesting_limit_is_a_host_fault() {
    let harness = Harness::with(EvaluatorBuilder::new().max_nesting(0));
    let mut evaluator = Evaluator::new(&harness.ctx);
    let outcome = evaluator.run_nested(vec![Step::Eval(ir::int(1))]);
    assert!(matches!(outcome, Err(Unwind::Fault(Fault::Host(_)))));
}

#[test]
fn test_return_leaving_guarded_block_is_reported_as_jump() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let body = vec![
        ir::return_stmt(Some(ir::int(4))),
        ir::expr_stmt(ir::name("unreachable")),
    ];
    let outcome = evaluator.do_try(&body, None);
    assert!(matches!(outcome, Ok(Completion::Jumped(Jump::Return))));
    assert_eq!(harness.ctx.return_value().and_then(|value| value.as_int()), Some(4));
}

#[test]
fn test_loop_control_inside_guarded_loop_stays_inside() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let body = vec![ir::for_loop(
        ir::name("i"),
        ir::tuple(vec![ir::int(1), ir::int(2)]),
        vec![Stmt::Break],
        vec![],
    )];
    let outcome = evaluator.do_try(&body, None);
    assert!(matches!(outcome, Ok(Completion::Normal)));
}

#[test]
fn test_break_leaving_guarded_block_is_reported_as_jump() {
    let harness = Harness::new();
    let mut evaluator = Evaluator::new(&harness.ctx);
    let outcome = evaluator.do_try(&[Stmt::Break], None);
    assert!(matches!(outcome, Ok(Completion::Jumped(Jump::Break))));
}

#[test]
fn test_jump_escaping_an_expression_is_an_invariant_fault() {
    let harness = Harness::new();
    let evaluator = Evaluator::new(&harness.ctx);
    let outcome = evaluator.settle::<()>(Err(Unwind::Jump(Jump::Continue)), None);
    assert!(matches!(outcome, Err(Fault::StrayJump(Jump::Continue))));
}

// Teardown of leftover values

/// Leave two namespaces that reference each other on the Value Stack. Each
/// holds one of `markers` and the pinned `int` type.
fn push_cycle(evaluator: &mut Evaluator<'_>, markers: &[Object; 2]) {
    let first = Object::namespace();
    let second = Object::namespace();
    first.set_attribute("peer", second.clone());
    second.set_attribute("peer", first.clone());
    first.set_attribute("marker", markers[0].clone());
    second.set_attribute("marker", markers[1].clone());
    first.set_attribute("kind", evaluator.builtins().int_type().clone());
    evaluator.push_value(first);
    evaluator.push_value(second);
}

fn assert_cycle_released(harness: &Harness, markers: &[Object; 2], int_attributes: usize) {
    // Both tables were cleared, so each marker is held only by the test.
    assert_eq!(markers[0].handle_count(), 1);
    assert_eq!(markers[1].handle_count(), 1);
    assert_eq!(harness.builtins().int_type().dir_size(), int_attributes);
    assert!(harness.builtins().module().has_attribute("print"));
}

#[test]
fn test_aborted_run_disowns_leftover_values() {
    let harness = Harness::new();
    let markers = [Object::namespace(), Object::namespace()];
    let int_attributes = harness.builtins().int_type().dir_size();
    let mut evaluator = Evaluator::new(&harness.ctx);
    evaluator.enter_scope(None);
    assert!(evaluator.enter().is_ok());
    let held = markers.clone();
    let deferred = evaluator.defer(move |evaluator: &mut Evaluator<'_>| {
        push_cycle(evaluator, &held);
        Err(EvalError::Fault(Fault::Host("aborted".to_owned())))
    });
    assert!(deferred.is_ok());

    let outcome = evaluator.evaluate();
    assert!(matches!(outcome, Err(EvalError::Fault(Fault::Host(_)))));
    assert!(evaluator.is_idle());
    assert_cycle_released(&harness, &markers, int_attributes);
}

#[test]
fn test_dropped_evaluator_disowns_pending_values() {
    let harness = Harness::new();
    let markers = [Object::namespace(), Object::namespace()];
    let int_attributes = harness.builtins().int_type().dir_size();
    let mut evaluator = Evaluator::new(&harness.ctx);
    evaluator.enter_scope(None);
    assert!(evaluator.enter().is_ok());
    let held = markers.clone();
    let deferred = evaluator.defer(move |evaluator: &mut Evaluator<'_>| {
        push_cycle(evaluator, &held);
        Ok(())
    });
    assert!(deferred.is_ok());

    assert!(evaluator.visit().is_ok());
    assert!(!evaluator.is_idle());
    drop(evaluator);
    assert_cycle_released(&harness, &markers, int_attributes);
}
