//! Engine suites: programs built with `pyr_ir::build`, run through the
//! driver entry points against a capturing print handler.

mod bridge_tests;
mod import_tests;
mod operators_tests;

use pyr_ir::build as ir;
use pyr_ir::{Expr, Stmt};
use pyr_object::{BaseException, Builtins, NativeFn, Object};

use crate::{
    buffer_handler, init_tracing, EvalError, Evaluator, EvaluatorBuilder, SharedPrintHandler,
    ThreadContext,
};

pub(crate) struct Harness {
    pub(crate) ctx: ThreadContext,
    output: SharedPrintHandler,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with(EvaluatorBuilder::new())
    }

    pub(crate) fn with(builder: EvaluatorBuilder) -> Self {
        init_tracing();
        let output = buffer_handler();
        let ctx = builder.print_handler(output.clone()).build();
        Harness { ctx, output }
    }

    pub(crate) fn builtins(&self) -> &Builtins {
        self.ctx.builtins()
    }

    pub(crate) fn run(&self, body: Vec<Stmt>) -> Result<(), EvalError> {
        Evaluator::new(&self.ctx).evaluate_module(&ir::module(body))
    }

    pub(crate) fn run_ok(&self, body: Vec<Stmt>) {
        if let Err(error) = self.run(body) {
            panic!("program failed: {error}");
        }
    }

    /// Run a program that must end with an unhandled exception.
    pub(crate) fn raised(&self, body: Vec<Stmt>) -> BaseException {
        match self.run(body) {
            Err(EvalError::Exception(exception)) => exception,
            Err(EvalError::Fault(fault)) => panic!("expected an exception, got fault {fault}"),
            Ok(()) => panic!("expected an exception, program completed"),
        }
    }

    pub(crate) fn eval(&self, expr: Expr) -> Result<Object, EvalError> {
        Evaluator::new(&self.ctx).evaluate_expression(&ir::expression(expr))
    }

    pub(crate) fn eval_ok(&self, expr: Expr) -> Object {
        match self.eval(expr) {
            Ok(value) => value,
            Err(error) => panic!("expression failed: {error}"),
        }
    }

    pub(crate) fn output(&self) -> String {
        self.output.get_output()
    }

    pub(crate) fn global(&self, name: &str) -> Option<Object> {
        self.ctx.body().get_attribute(name)
    }

    pub(crate) fn global_int(&self, name: &str) -> Option<i64> {
        self.global(name).and_then(|value| value.as_int())
    }

    /// Bind a host function in the program namespace.
    pub(crate) fn define_native(&self, name: &'static str, func: NativeFn) {
        let native = self.builtins().native(name, func);
        self.ctx.body().set_attribute(name, native);
    }

    /// Bind a new class in the program namespace.
    pub(crate) fn define_class(&self, name: &str, bases: &[Object]) -> Object {
        let class = self.builtins().new_type(name, bases);
        self.ctx.body().set_attribute(name, class.clone());
        class
    }
}

/// `print(args...)` as a statement.
pub(crate) fn print(args: Vec<Expr>) -> Stmt {
    ir::expr_stmt(ir::call(ir::name("print"), args))
}

/// `name(args...)` as an expression.
pub(crate) fn call(name: &str, args: Vec<Expr>) -> Expr {
    ir::call(ir::name(name), args)
}
