//! The evaluator: dispatch loop, entry points and stack primitives.
//!
//! # Module layout
//!
//! - `statements` - statement handlers and their loop/try/with continuations
//! - `get`, `set` - expression and assignment-target sub-evaluators
//! - `operators` - binary, unary, comparison and truth-test Steps
//! - `call` - the call protocol and function creation
//! - `attribute` - attribute resolution through the MRO
//! - `bridge` - nested runs and the `do_try` exception bridge
//!
//! # Dispatch
//!
//! One call to [`Evaluator::visit`] does exactly one of: nothing (idle),
//! pop an exhausted Scope, pop an exhausted Frame, or pop and run one Step.
//! An interrupt request is observed after the Step is popped and before it
//! runs, never in the middle of a Step.

mod attribute;
mod bridge;
mod call;
mod get;
mod operators;
mod set;
mod statements;

pub(crate) use bridge::Completion;

use pyr_ir::{Expression, Interactive, Module, Stmt};
use pyr_object::{disown, BaseException, Builtins, NativeHost, Object};
use smallvec::SmallVec;

use crate::context::ThreadContext;
use crate::errors::{runtime_error, underflow, EvalError, EvalResult, Fault, Jump, Unwind};
use crate::scopes::{Next, Scope, Scopes};
use crate::step::Step;

/// Call arguments. Most calls pass few enough to stay inline.
pub(crate) type Args = SmallVec<[Object; 4]>;

/// Runs statement trees against a [`ThreadContext`].
///
/// Owns its Value Stack and Scope Stack exclusively. Nested evaluators
/// started by guarded blocks share only the thread context and the current
/// namespace.
pub struct Evaluator<'ctx> {
    ctx: &'ctx ThreadContext,
    values: Vec<Object>,
    scopes: Scopes,
    /// Number of nested evaluators between this one and the driver's.
    nesting: usize,
    /// Call depth of the evaluator that started this one.
    base_depth: usize,
}

impl<'ctx> Evaluator<'ctx> {
    pub fn new(ctx: &'ctx ThreadContext) -> Self {
        Evaluator {
            ctx,
            values: Vec::new(),
            scopes: Scopes::default(),
            nesting: 0,
            base_depth: 0,
        }
    }

    pub fn context(&self) -> &'ctx ThreadContext {
        self.ctx
    }

    #[inline]
    pub(crate) fn builtins(&self) -> &'ctx Builtins {
        self.ctx.builtins()
    }

    /// Whether the Scope Stack is empty.
    pub fn is_idle(&self) -> bool {
        self.scopes.is_empty()
    }

    /// User-level call depth, counting the Scopes of enclosing evaluators.
    pub(crate) fn call_depth(&self) -> usize {
        self.base_depth + self.scopes.len()
    }

    // Driver entry points

    /// Run a program in the thread's program namespace.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_module(&mut self, module: &Module) -> Result<(), EvalError> {
        self.ctx.replace_return(None);
        let body = self.ctx.body().clone();
        let doc = match &module.docstring {
            Some(doc) => self.builtins().str(doc),
            None => self.builtins().none(),
        };
        body.set_attribute("__doc__", doc);
        self.start(body, &module.body)
    }

    /// Run one unit of interactive input.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_interactive(&mut self, interactive: &Interactive) -> Result<(), EvalError> {
        self.ctx.replace_return(None);
        let body = self.ctx.body().clone();
        self.start(body, &interactive.body)
    }

    /// Evaluate one expression; its value is also left in the return slot.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_expression(&mut self, expression: &Expression) -> Result<Object, EvalError> {
        self.ctx.replace_return(None);
        self.scopes
            .enter_scope(Scope::owned(self.ctx.body().clone()));
        self.scopes.enter()?;
        self.push_seq([Step::Eval(expression.body.clone()), Step::SetResult])?;
        self.evaluate()?;
        Ok(self
            .ctx
            .return_value()
            .unwrap_or_else(|| self.builtins().none()))
    }

    fn start(&mut self, namespace: Object, body: &[Stmt]) -> Result<(), EvalError> {
        self.scopes.enter_scope(Scope::owned(namespace));
        self.scopes.enter()?;
        self.push_body(body)?;
        self.evaluate()
    }

    /// Run the dispatch loop until the Scope Stack is empty.
    ///
    /// On an unhandled exception or fault the remaining Scopes are dropped
    /// and leftover values are disowned.
    pub fn evaluate(&mut self) -> Result<(), EvalError> {
        self.run().map_err(|unwind| self.surface(unwind))
    }

    /// One step of the dispatch loop. A no-op when idle.
    pub fn visit(&mut self) -> Result<(), EvalError> {
        self.visit_step().map_err(|unwind| self.surface(unwind))
    }

    // Host-facing operations

    /// Resolve `object.name` through the attribute protocol.
    pub fn get_attribute(&mut self, object: &Object, name: &str) -> Result<Object, EvalError> {
        self.lookup_attribute(object, name)
            .map_err(|unwind| self.surface(unwind))
    }

    /// Call `callee` with positional arguments and run it to completion.
    pub fn call(&mut self, callee: Object, args: Vec<Object>) -> Result<Object, EvalError> {
        self.call_guarded(callee, args)
            .map_err(|unwind| self.surface(unwind))
    }

    /// Enter a Scope owned by `owner`, or by a namespace created on first use.
    pub fn enter_scope(&mut self, owner: Option<Object>) {
        let scope = match owner {
            Some(owner) => Scope::owned(owner),
            None => Scope::unowned(),
        };
        self.scopes.enter_scope(scope);
    }

    pub fn exit_scope(&mut self) {
        self.scopes.exit_scope();
    }

    /// Push an empty Frame onto the current Scope.
    pub fn enter(&mut self) -> Result<(), EvalError> {
        Ok(self.scopes.enter()?)
    }

    /// Pop the current Frame if there is one.
    pub fn exit(&mut self) {
        self.scopes.exit();
    }

    /// Push an opaque action onto the current Frame.
    pub fn defer(
        &mut self,
        action: impl FnOnce(&mut Evaluator<'_>) -> Result<(), EvalError> + 'static,
    ) -> Result<(), EvalError> {
        self.push(Step::Deferred(Box::new(move |evaluator: &mut Evaluator<'_>| {
            action(evaluator).map_err(Unwind::from)
        })))?;
        Ok(())
    }

    /// Namespace of the current Scope.
    pub fn current_namespace(&mut self) -> Result<Object, EvalError> {
        Ok(self.self_object()?)
    }

    // Dispatch

    pub(crate) fn run(&mut self) -> EvalResult {
        while !self.scopes.is_empty() {
            self.visit_step()?;
        }
        Ok(())
    }

    fn visit_step(&mut self) -> EvalResult {
        match self.scopes.next() {
            Next::Idle | Next::ScopeDone | Next::FrameDone => Ok(()),
            Next::Step(step) => {
                if let Some(interrupt) = self.ctx.process_interrupts() {
                    return Err(interrupt.into());
                }
                self.dispatch(step)
            }
        }
    }

    fn dispatch(&mut self, step: Step) -> EvalResult {
        self.ctx.record(step.kind());
        tracing::trace!(?step, depth = self.call_depth(), "dispatch");
        match step {
            Step::Stmt(stmt) => self.visit_stmt(stmt),
            Step::Eval(expr) => self.eval_expr(expr),
            Step::Push(value) => {
                self.push_value(value);
                Ok(())
            }
            Step::Dup => {
                let top = self.peek_value("dup")?;
                self.push_value(top);
                Ok(())
            }
            Step::Discard => {
                self.pop_value("discard")?;
                Ok(())
            }
            Step::Store(target) => self.store(target),
            Step::Delete(target) => self.delete(target),
            Step::GetAttr(name) => {
                let object = self.pop_value("attribute read")?;
                let value = self.lookup_attribute(&object, name.as_str())?;
                self.push_value(value);
                Ok(())
            }
            Step::SetAttr(name) => self.set_attr(&name),
            Step::DelAttr(name) => self.del_attr(&name),
            Step::BuildTuple(count) => {
                let items = self.pop_values(count, "tuple")?;
                let tuple = self.builtins().tuple(items.into_vec());
                self.push_value(tuple);
                Ok(())
            }
            Step::Binary(op) => self.binary(op),
            Step::Unary(op) => self.unary(op),
            Step::ShortCircuit { node, index } => self.short_circuit(node, index),
            Step::BoolDecide { node, index } => self.bool_decide(node, index),
            Step::Compare { node, index } => self.compare(node, index),
            Step::CompareOp(op) => self.compare_op(op),
            Step::ChainDecide { node, index } => self.chain_decide(node, index),
            Step::Call(argc) => self.call_step(argc),
            Step::ToBool => self.to_bool(),
            Step::Branch(node) => self.branch(&node),
            Step::ForStart(node) => self.for_start(node),
            Step::ForNext { node, iterator } => self.for_next(node, iterator),
            Step::WhileTest(node) => self.while_test(node),
            Step::WhileBranch(node) => self.while_branch(node),
            Step::TryRun(node) => self.try_run(&node),
            Step::WithEnter { node, index } => self.with_enter(node, index),
            Step::Jump(jump) => self.jump(jump),
            Step::Return => {
                let value = self.pop_value("return")?;
                self.ctx.replace_return(Some(value));
                self.jump(Jump::Return)
            }
            Step::Raise { with_cause } => self.raise(with_cause),
            Step::ReRaise => Err(Unwind::ReRaise),
            Step::AssertCheck(node) => self.assert_check(&node),
            Step::AssertFail => self.assert_fail(),
            Step::MakeFunction(def) => self.make_function(def),
            Step::CollectReturn { saved } => {
                let result = self
                    .ctx
                    .replace_return(saved)
                    .unwrap_or_else(|| self.builtins().none());
                self.push_value(result);
                Ok(())
            }
            Step::SetResult => {
                let value = self.pop_value("result")?;
                self.ctx.replace_return(Some(value));
                Ok(())
            }
            Step::Deferred(action) => action(self),
        }
    }

    /// Convert an unwind leaving the evaluator into a driver error and drop
    /// whatever was still pending.
    fn surface(&mut self, unwind: Unwind) -> EvalError {
        self.reset();
        match unwind {
            Unwind::Raise(exception) => EvalError::Exception(exception),
            Unwind::ReRaise => EvalError::Exception(no_active_exception(self.builtins())),
            Unwind::Jump(jump) => EvalError::Fault(Fault::StrayJump(jump)),
            Unwind::Fault(fault) => EvalError::Fault(fault),
        }
    }

    fn reset(&mut self) {
        self.scopes.clear();
        let released = disown(self.values.drain(..));
        if released > 0 {
            tracing::debug!(released, "disowned leftover values");
        }
    }

    // Value Stack

    #[inline]
    pub(crate) fn push_value(&mut self, value: Object) {
        self.values.push(value);
    }

    pub(crate) fn pop_value(&mut self, context: &'static str) -> EvalResult<Object> {
        self.values.pop().ok_or_else(|| underflow(context))
    }

    fn peek_value(&self, context: &'static str) -> EvalResult<Object> {
        self.values.last().cloned().ok_or_else(|| underflow(context))
    }

    /// Pop `count` values, returned in push order.
    pub(crate) fn pop_values(&mut self, count: usize, context: &'static str) -> EvalResult<Args> {
        let start = self
            .values
            .len()
            .checked_sub(count)
            .ok_or_else(|| underflow(context))?;
        Ok(self.values.drain(start..).collect())
    }

    /// Pop a value already coerced by `ToBool`.
    pub(crate) fn pop_flag(&mut self, context: &'static str) -> EvalResult<bool> {
        let value = self.pop_value(context)?;
        Ok(value.native_truth().unwrap_or(true))
    }

    // Frame and Scope primitives

    /// Leave the current function (`return`), loop (`break`) or loop body
    /// (`continue`).
    ///
    /// A nested evaluator cannot unwind its parent's Frames, so a jump that
    /// would leave the block it was started for ends the run instead; the
    /// parent resumes it once its own cleanup has run.
    pub(crate) fn jump(&mut self, jump: Jump) -> EvalResult {
        if self.leaves_guarded_block(jump) {
            tracing::debug!(%jump, nesting = self.nesting, "jump leaves guarded block");
            return Err(Unwind::Jump(jump));
        }
        match jump {
            Jump::Return => self.scopes.exit_scope(),
            Jump::Break => {
                self.scopes.exit();
                self.scopes.exit();
            }
            Jump::Continue => self.scopes.exit(),
        }
        Ok(())
    }

    /// A nested evaluator's base Scope belongs to its parent's function, and
    /// its base Frame sits inside the parent's loop: only Frames above the
    /// base one are loops started by the guarded block itself.
    fn leaves_guarded_block(&self, jump: Jump) -> bool {
        if self.nesting == 0 || self.scopes.len() > 1 {
            return false;
        }
        match jump {
            Jump::Return => true,
            Jump::Break | Jump::Continue => self.scopes.frame_count() <= 1,
        }
    }

    pub(crate) fn push(&mut self, step: Step) -> Result<(), Fault> {
        self.scopes.push(step)
    }

    /// Push Steps so that they run in iteration order.
    pub(crate) fn push_seq<I>(&mut self, steps: I) -> Result<(), Fault>
    where
        I: IntoIterator<Item = Step>,
        I::IntoIter: DoubleEndedIterator,
    {
        for step in steps.into_iter().rev() {
            self.scopes.push(step)?;
        }
        Ok(())
    }

    /// Push a statement list so that it runs in source order.
    pub(crate) fn push_body(&mut self, body: &[Stmt]) -> Result<(), Fault> {
        self.push_seq(body.iter().cloned().map(Step::Stmt))
    }

    /// The current Scope's namespace, created if the Scope has none yet.
    pub(crate) fn self_object(&mut self) -> Result<Object, Fault> {
        self.scopes
            .current_mut()
            .map(Scope::self_object)
            .ok_or(Fault::NoActiveScope)
    }
}

#[cold]
fn no_active_exception(builtins: &Builtins) -> BaseException {
    runtime_error(builtins, "No active exception to reraise")
}

impl NativeHost for Evaluator<'_> {
    fn builtins(&self) -> &Builtins {
        self.ctx.builtins()
    }

    fn write_line(&self, text: &str) {
        self.ctx.print_handler().println(text);
    }
}

impl Drop for Evaluator<'_> {
    fn drop(&mut self) {
        if !self.values.is_empty() {
            disown(self.values.drain(..));
        }
    }
}
