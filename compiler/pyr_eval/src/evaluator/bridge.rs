//! Nested runs and the exception bridge.
//!
//! A nested run starts a fresh [`Evaluator`] that shares the current
//! namespace and the thread context but owns its own stacks. Its outcome is
//! settled into a [`Completion`], so `try`, `finally` and `with` compose by
//! plain sequencing instead of host-level unwinding.

use pyr_ir::{Expr, Stmt};
use pyr_object::{BaseException, Object};

use super::Evaluator;
use crate::errors::{runtime_error, underflow, EvalResult, Fault, Jump, Unwind};
use crate::scopes::{Scope, Scopes};
use crate::stack::with_headroom;
use crate::step::Step;

/// How a guarded block ended.
#[derive(Debug)]
pub(crate) enum Completion {
    Normal,
    Raised(BaseException),
    /// The block ran `return`, `break` or `continue` past its own end.
    Jumped(Jump),
}

impl Evaluator<'_> {
    /// Re-apply a guarded block's ending in this evaluator.
    pub(crate) fn resume(&mut self, completion: Completion) -> EvalResult {
        match completion {
            Completion::Normal => Ok(()),
            Completion::Raised(exception) => Err(exception.into()),
            Completion::Jumped(jump) => self.jump(jump),
        }
    }

    /// Run `steps` to completion in a nested evaluator and return the value
    /// left on top of its Value Stack.
    pub(crate) fn run_nested(&mut self, steps: Vec<Step>) -> EvalResult<Option<Object>> {
        let limit = self.ctx.limits().max_nesting;
        if self.nesting >= limit {
            return Err(Fault::Host(format!("maximum evaluator nesting exceeded ({limit})")).into());
        }
        let scope = match self.scopes.current_mut() {
            Some(scope) => scope.share(),
            None => Scope::owned(self.ctx.body().clone()),
        };
        self.ctx.record_nested_run();

        let mut child = Evaluator {
            ctx: self.ctx,
            values: Vec::new(),
            scopes: Scopes::default(),
            nesting: self.nesting + 1,
            base_depth: self.call_depth(),
        };
        child.scopes.enter_scope(scope);
        child.scopes.enter()?;
        child.push_seq(steps)?;
        with_headroom(|| child.run())?;
        Ok(child.values.pop())
    }

    /// Call `callee` in a nested run and return its result.
    pub(crate) fn call_guarded(&mut self, callee: Object, args: Vec<Object>) -> EvalResult<Object> {
        let argc = args.len();
        let mut steps = Vec::with_capacity(argc + 2);
        steps.push(Step::Push(callee));
        steps.extend(args.into_iter().map(Step::Push));
        steps.push(Step::Call(argc));
        self.run_nested(steps)?
            .ok_or_else(|| underflow("guarded call"))
    }

    /// Evaluate `expr` in a nested run.
    pub(crate) fn eval_guarded(&mut self, expr: &Expr) -> EvalResult<Object> {
        self.run_nested(vec![Step::Eval(expr.clone())])?
            .ok_or_else(|| underflow("guarded expression"))
    }

    /// Resolve a nested outcome against the exception being handled.
    ///
    /// Raised exceptions get `context` chained; a bare re-raise becomes
    /// `context` itself; host faults become a `RuntimeError`. Invariant
    /// faults are returned untouched.
    pub(crate) fn settle<T>(
        &self,
        outcome: EvalResult<T>,
        context: Option<&BaseException>,
    ) -> Result<Result<T, BaseException>, Fault> {
        let exception = match outcome {
            Ok(value) => return Ok(Ok(value)),
            Err(Unwind::Raise(exception)) => exception,
            Err(Unwind::ReRaise) => {
                return Ok(Err(context.cloned().unwrap_or_else(|| {
                    runtime_error(self.builtins(), "No active exception to reraise")
                })));
            }
            Err(Unwind::Jump(jump)) => return Err(Fault::StrayJump(jump)),
            Err(Unwind::Fault(fault)) if fault.is_invariant() => return Err(fault),
            Err(Unwind::Fault(fault)) => {
                tracing::debug!(%fault, "host fault wrapped as RuntimeError");
                runtime_error(self.builtins(), &fault.to_string())
            }
        };
        Ok(Err(chain(exception, context)))
    }

    /// Run a statement list as a guarded block.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = body.len()))]
    pub(crate) fn do_try(
        &mut self,
        body: &[Stmt],
        context: Option<BaseException>,
    ) -> Result<Completion, Fault> {
        self.try_steps(body.iter().cloned().map(Step::Stmt).collect(), context)
    }

    /// Run `steps` as a guarded block.
    ///
    /// An aborted block leaves the return slot as it found it: calls cut
    /// short by the exception never collected their results. A block that
    /// jumped keeps the slot, which holds the value of a `return`.
    pub(crate) fn try_steps(
        &mut self,
        steps: Vec<Step>,
        context: Option<BaseException>,
    ) -> Result<Completion, Fault> {
        let before = self.ctx.return_value();
        let outcome = match self.run_nested(steps) {
            Err(Unwind::Jump(jump)) => return Ok(Completion::Jumped(jump)),
            outcome => outcome,
        };
        match self.settle(outcome, context.as_ref())? {
            Ok(_) => Ok(Completion::Normal),
            Err(exception) => {
                self.ctx.replace_return(before);
                Ok(Completion::Raised(exception))
            }
        }
    }
}

/// Record `context` as the exception being handled when `exception` was
/// raised, unless it already has one or re-raises the same value.
fn chain(exception: BaseException, context: Option<&BaseException>) -> BaseException {
    match context {
        Some(context)
            if exception.context().is_none() && !exception.payload().is(context.payload()) =>
        {
            tracing::debug!(
                raised = %exception,
                context = %context,
                "exception chained"
            );
            exception.with_context(context.clone())
        }
        _ => exception,
    }
}
