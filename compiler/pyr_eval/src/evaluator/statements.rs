//! Statement handlers.
//!
//! A handler only pushes Steps; nothing in the statement runs until the
//! dispatch loop pops them. Loops re-push their own continuation instead of
//! recursing:
//!
//! - `for`: `ForStart` enters the loop Frame and pushes `ForNext`. Each
//!   iteration re-pushes `ForNext` there, then enters a body Frame.
//! - `while`: `WhileTest` lives in the loop Frame. `WhileBranch` re-pushes
//!   it and enters a body Frame.
//!
//! `break` exits the body and loop Frames; `continue` exits only the body.
//!
//! `try` and `with` run their blocks through the exception bridge and then
//! sequence the outcomes. A `return`, `break` or `continue` that ends a
//! guarded block comes back as [`Completion::Jumped`] and is resumed here
//! after `finally` or `__exit__` has run.

use std::sync::Arc;

use pyr_ir::{Assert, ExceptHandler, For, If, Import, ImportFrom, Name, Stmt, Try, While, With};
use pyr_object::{BaseException, ExceptionKind, Object};

use super::{Completion, Evaluator};
use crate::context::ImportKind;
use crate::errors::{
    assertion_error, import_error, malformed, module_not_found_error, type_error, EvalResult,
    Fault, Jump, Unwind,
};
use crate::step::Step;

impl Evaluator<'_> {
    pub(super) fn visit_stmt(&mut self, stmt: Stmt) -> EvalResult {
        let kind = stmt.kind_name();
        match stmt {
            Stmt::FunctionDef(def) => {
                let steps: Vec<Step> = def
                    .decorator_list
                    .iter()
                    .chain(&def.args.defaults)
                    .cloned()
                    .map(Step::Eval)
                    .chain([Step::MakeFunction(Arc::clone(&def))])
                    .collect();
                self.push_seq(steps)?;
            }
            Stmt::Return(Some(value)) => self.push_seq([Step::Eval(value), Step::Return])?,
            Stmt::Return(None) => {
                self.ctx.replace_return(Some(self.builtins().none()));
                self.jump(Jump::Return)?;
            }
            Stmt::Delete(node) => self.push_seq(node.targets.iter().cloned().map(Step::Delete))?,
            Stmt::Assign(node) => {
                let mut steps = vec![Step::Eval(node.value.clone())];
                match node.targets.split_last() {
                    Some((last, rest)) => {
                        for target in rest {
                            steps.push(Step::Dup);
                            steps.push(Step::Store(target.clone()));
                        }
                        steps.push(Step::Store(last.clone()));
                    }
                    None => steps.push(Step::Discard),
                }
                self.push_seq(steps)?;
            }
            Stmt::For(node) => {
                let iterable = node.iter.clone();
                self.push_seq([
                    Step::Eval(iterable),
                    Step::GetAttr(Name::from("__iter__")),
                    Step::Call(0),
                    Step::ForStart(node),
                ])?;
            }
            Stmt::While(node) => {
                self.scopes.enter()?;
                self.push(Step::WhileTest(node))?;
            }
            Stmt::If(node) => {
                let test = node.test.clone();
                self.push_seq([Step::Eval(test), Step::ToBool, Step::Branch(node)])?;
            }
            Stmt::With(node) => {
                let first = node.items.first().map(|item| item.context_expr.clone());
                match first {
                    Some(manager) => {
                        self.push_seq([Step::Eval(manager), Step::WithEnter { node, index: 0 }])?;
                    }
                    None => self.push_body(&node.body)?,
                }
            }
            Stmt::Raise(node) => match (&node.exc, &node.cause) {
                (None, _) => self.push(Step::ReRaise)?,
                (Some(exc), None) => {
                    self.push_seq([Step::Eval(exc.clone()), Step::Raise { with_cause: false }])?;
                }
                (Some(exc), Some(cause)) => self.push_seq([
                    Step::Eval(cause.clone()),
                    Step::Eval(exc.clone()),
                    Step::Raise { with_cause: true },
                ])?,
            },
            Stmt::Try(node) => self.push(Step::TryRun(node))?,
            Stmt::Assert(node) => {
                if self.ctx.limits().debug {
                    let test = node.test.clone();
                    self.push_seq([Step::Eval(test), Step::ToBool, Step::AssertCheck(node)])?;
                }
            }
            Stmt::Import(node) => self.import(&node)?,
            Stmt::ImportFrom(node) => self.import_from(&node)?,
            Stmt::Expr(value) => self.push_seq([Step::Eval(value), Step::Discard])?,
            Stmt::Pass => {}
            Stmt::Break => self.jump(Jump::Break)?,
            Stmt::Continue => self.jump(Jump::Continue)?,
            Stmt::AsyncFunctionDef(_)
            | Stmt::ClassDef(_)
            | Stmt::AugAssign(_)
            | Stmt::AnnAssign(_)
            | Stmt::AsyncFor(_)
            | Stmt::AsyncWith(_)
            | Stmt::Global(_)
            | Stmt::Nonlocal(_) => {
                tracing::warn!(kind, "unsupported statement skipped");
            }
        }
        Ok(())
    }

    pub(super) fn branch(&mut self, node: &If) -> EvalResult {
        let body = if self.pop_flag("if")? {
            &node.body
        } else {
            &node.orelse
        };
        self.push_body(body)?;
        Ok(())
    }

    // Loops

    pub(super) fn for_start(&mut self, node: Arc<For>) -> EvalResult {
        let iterator = self.pop_value("for")?;
        self.scopes.enter()?;
        self.push(Step::ForNext { node, iterator })?;
        Ok(())
    }

    /// Fetch the next item. `StopIteration` ends the loop normally.
    pub(super) fn for_next(&mut self, node: Arc<For>, iterator: Object) -> EvalResult {
        let next = self.lookup_attribute(&iterator, "__next__")?;
        let stop = self
            .builtins()
            .exception_class(ExceptionKind::StopIteration);
        match self.call_guarded(next, Vec::new()) {
            Ok(item) => {
                self.push(Step::ForNext {
                    node: Arc::clone(&node),
                    iterator,
                })?;
                self.scopes.enter()?;
                let steps: Vec<Step> = [Step::Push(item), Step::Store(node.target.clone())]
                    .into_iter()
                    .chain(node.body.iter().cloned().map(Step::Stmt))
                    .collect();
                self.push_seq(steps)?;
            }
            Err(Unwind::Raise(exception)) if exception.matches(stop) => {
                tracing::debug!("iterator exhausted");
                self.scopes.exit();
                self.push_body(&node.orelse)?;
            }
            Err(unwind) => return Err(unwind),
        }
        Ok(())
    }

    pub(super) fn while_test(&mut self, node: Arc<While>) -> EvalResult {
        let test = node.test.clone();
        self.push_seq([Step::Eval(test), Step::ToBool, Step::WhileBranch(node)])?;
        Ok(())
    }

    pub(super) fn while_branch(&mut self, node: Arc<While>) -> EvalResult {
        if self.pop_flag("while")? {
            self.push(Step::WhileTest(Arc::clone(&node)))?;
            self.scopes.enter()?;
            self.push_body(&node.body)?;
        } else {
            self.scopes.exit();
            self.push_body(&node.orelse)?;
        }
        Ok(())
    }

    // try / except / else / finally

    pub(super) fn try_run(&mut self, node: &Try) -> EvalResult {
        let outcome = match self.do_try(&node.body, None)? {
            Completion::Raised(exception) => self.handle(node, exception)?,
            Completion::Normal if !node.orelse.is_empty() => self.do_try(&node.orelse, None)?,
            other => other,
        };

        let earlier = match outcome {
            Completion::Normal => {
                self.push_body(&node.finalbody)?;
                return Ok(());
            }
            // `finally` runs in place, then the jump carries on.
            Completion::Jumped(jump) => {
                let steps: Vec<Step> = node
                    .finalbody
                    .iter()
                    .cloned()
                    .map(Step::Stmt)
                    .chain([Step::Jump(jump)])
                    .collect();
                self.push_seq(steps)?;
                return Ok(());
            }
            Completion::Raised(earlier) => earlier,
        };
        if node.finalbody.is_empty() {
            return Err(earlier.into());
        }
        match self.do_try(&node.finalbody, None)? {
            Completion::Raised(later) => {
                tracing::debug!(%later, %earlier, "finally superseded pending exception");
                Err(BaseException::superseding(later, earlier).into())
            }
            // A jump out of the finally block discards the exception.
            Completion::Jumped(jump) => {
                tracing::debug!(%jump, exception = %earlier, "finally discarded pending exception");
                self.jump(jump)
            }
            Completion::Normal => Err(earlier.into()),
        }
    }

    /// Run the first handler matching `caught` and report how the handling
    /// ended. An unmatched exception is reported as still raised.
    fn handle(&mut self, node: &Try, caught: BaseException) -> EvalResult<Completion> {
        for handler in &node.handlers {
            if let Some(type_expr) = &handler.type_ {
                let outcome = self.eval_guarded(type_expr);
                let class = match self.settle(outcome, Some(&caught))? {
                    Ok(class) => class,
                    Err(raised) => return Ok(Completion::Raised(raised)),
                };
                match self.handler_matches(&caught, &class) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(error) => return Ok(Completion::Raised(error.with_context(caught))),
                }
            }
            tracing::debug!(exception = %caught, "exception handled");
            return Ok(self.run_handler(handler, caught)?);
        }
        Ok(Completion::Raised(caught))
    }

    /// Whether `caught` is an instance of `class`, or of any class in a tuple.
    fn handler_matches(&self, caught: &BaseException, class: &Object) -> Result<bool, BaseException> {
        let base = self
            .builtins()
            .exception_class(ExceptionKind::BaseException);
        let classes = match class.as_tuple() {
            Some(items) => items.to_vec(),
            None => vec![class.clone()],
        };
        if classes
            .iter()
            .any(|candidate| !(candidate.is_type() && candidate.is_subclass(base)))
        {
            return Err(type_error(
                self.builtins(),
                "catching classes that do not inherit from BaseException is not allowed",
            ));
        }
        Ok(classes.iter().any(|candidate| caught.matches(candidate)))
    }

    /// Bind `as name` for the handler body only.
    fn run_handler(
        &mut self,
        handler: &ExceptHandler,
        caught: BaseException,
    ) -> Result<Completion, Fault> {
        let bound = match &handler.name {
            Some(name) => {
                let namespace = self.self_object()?;
                namespace.set_attribute(name.clone(), caught.payload().clone());
                Some((namespace, name))
            }
            None => None,
        };
        let outcome = self.do_try(&handler.body, Some(caught));
        if let Some((namespace, name)) = bound {
            namespace.delete_attribute(name.as_str());
        }
        outcome
    }

    // with

    /// Stack: the context manager for `items[index]`.
    ///
    /// The rest of the statement (inner managers, then the body) runs as a
    /// guarded block. `__exit__` always runs; an exception it raises
    /// supersedes the block's.
    pub(super) fn with_enter(&mut self, node: Arc<With>, index: usize) -> EvalResult {
        let manager = self.pop_value("with")?;
        let builtins = self.builtins();
        let (Some(enter), Some(exit)) = (
            builtins.lookup(&manager, "__enter__"),
            builtins.lookup(&manager, "__exit__"),
        ) else {
            return Err(type_error(
                builtins,
                &format!(
                    "'{}' object does not support the context manager protocol",
                    manager.type_name()
                ),
            )
            .into());
        };
        let entered = self.call_guarded(enter, Vec::new())?;
        let item = node.items.get(index).ok_or_else(|| malformed("with"))?;

        let mut block = Vec::new();
        if let Some(target) = &item.optional_vars {
            block.push(Step::Push(entered));
            block.push(Step::Store(target.clone()));
        }
        match node.items.get(index + 1) {
            Some(inner) => {
                block.push(Step::Eval(inner.context_expr.clone()));
                block.push(Step::WithEnter {
                    node: Arc::clone(&node),
                    index: index + 1,
                });
            }
            None => block.extend(node.body.iter().cloned().map(Step::Stmt)),
        }
        let completion = self.try_steps(block, None)?;
        let raised = match &completion {
            Completion::Raised(exception) => Some(exception.clone()),
            Completion::Normal | Completion::Jumped(_) => None,
        };

        let none = builtins.none();
        let details = match &raised {
            Some(exception) => [
                exception.class().unwrap_or_else(|| none.clone()),
                exception.payload().clone(),
                none.clone(),
            ],
            None => [none.clone(), none.clone(), none],
        };
        let mut exit_call = vec![Step::Push(exit)];
        exit_call.extend(details.into_iter().map(Step::Push));
        exit_call.extend([Step::Call(3), Step::Discard]);
        match self.try_steps(exit_call, raised)? {
            Completion::Raised(superseding) => Err(superseding.into()),
            Completion::Normal | Completion::Jumped(_) => self.resume(completion),
        }
    }

    // raise / assert

    /// Stack: the cause (when `with_cause`), then the raised value.
    pub(super) fn raise(&mut self, with_cause: bool) -> EvalResult {
        let value = self.pop_value("raise")?;
        let cause = if with_cause {
            Some(self.pop_value("raise cause")?)
        } else {
            None
        };
        let builtins = self.builtins();
        let base = builtins.exception_class(ExceptionKind::BaseException);

        if value.is_type() && value.is_subclass(base) {
            // Instantiate the class, then raise the instance.
            let mut steps: Vec<Step> = cause.map(Step::Push).into_iter().collect();
            steps.extend([Step::Push(value), Step::Call(0), Step::Raise { with_cause }]);
            self.push_seq(steps)?;
            return Ok(());
        }
        if !value.is_instance(base) {
            return Err(type_error(builtins, "exceptions must derive from BaseException").into());
        }

        let mut exception = BaseException::new(value);
        if let Some(cause) = cause {
            if cause.is_type() && cause.is_subclass(base) {
                let instance = builtins.instantiate_exception(&cause, Vec::new());
                exception = exception.with_cause(BaseException::new(instance));
            } else if cause.is_instance(base) {
                exception = exception.with_cause(BaseException::new(cause));
            } else if !cause.is_none() {
                return Err(type_error(
                    builtins,
                    "exception causes must derive from BaseException",
                )
                .into());
            }
        }
        Err(exception.into())
    }

    pub(super) fn assert_check(&mut self, node: &Assert) -> EvalResult {
        if self.pop_flag("assert")? {
            return Ok(());
        }
        match &node.msg {
            Some(message) => {
                self.push_seq([Step::Eval(message.clone()), Step::AssertFail])?;
                Ok(())
            }
            None => Err(assertion_error(self.builtins()).into()),
        }
    }

    pub(super) fn assert_fail(&mut self) -> EvalResult {
        let message = self.pop_value("assert message")?;
        let builtins = self.builtins();
        let class = builtins.exception_class(ExceptionKind::AssertionError);
        let payload = builtins.instantiate_exception(class, vec![message]);
        Err(BaseException::new(payload).into())
    }

    // import

    fn import(&mut self, node: &Import) -> EvalResult {
        let namespace = self.self_object()?;
        for alias in &node.names {
            let qualified = alias.name.as_str();
            let module = self.import_module(ImportKind::Import, qualified)?;
            match &alias.asname {
                Some(asname) => namespace.set_attribute(asname.clone(), module),
                None => {
                    // `import a.b` binds the top-level package `a`.
                    let top = qualified.split('.').next().unwrap_or(qualified);
                    let package = if top == qualified {
                        module
                    } else {
                        self.import_module(ImportKind::Import, top)?
                    };
                    namespace.set_attribute(top, package);
                }
            }
        }
        Ok(())
    }

    fn import_from(&mut self, node: &ImportFrom) -> EvalResult {
        let level = usize::try_from(node.level).unwrap_or(0);
        let qualified = format!("{}{}", ".".repeat(level), node.module);
        let module = self.import_module(ImportKind::ImportFrom, &qualified)?;
        let namespace = self.self_object()?;
        for alias in &node.names {
            if alias.name.as_str() == "*" {
                for name in module.dir() {
                    if name.as_str().starts_with('_') {
                        continue;
                    }
                    if let Some(value) = module.get_attribute(name.as_str()) {
                        namespace.set_attribute(name, value);
                    }
                }
                continue;
            }
            let value = match module.get_attribute(alias.name.as_str()) {
                Some(value) => value,
                None => self
                    .ctx
                    .global()
                    .import_module(ImportKind::ImportFrom, &format!("{qualified}.{}", alias.name))
                    .ok_or_else(|| import_error(self.builtins(), alias.name.as_str(), &qualified))?,
            };
            namespace.set_attribute(alias.bound_name().clone(), value);
        }
        Ok(())
    }

    fn import_module(&self, kind: ImportKind, name: &str) -> EvalResult<Object> {
        self.ctx
            .global()
            .import_module(kind, name)
            .ok_or_else(|| module_not_found_error(self.builtins(), name).into())
    }
}
