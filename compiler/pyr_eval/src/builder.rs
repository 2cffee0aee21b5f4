//! `EvaluatorBuilder` for configuring a thread's runtime context.

use std::sync::Arc;

use pyr_object::Object;

use crate::context::{GlobalContext, Limits, ThreadContext};
use crate::print_handler::{stdout_handler, SharedPrintHandler};

/// Builder for the [`ThreadContext`] evaluators run against.
///
/// ```text
/// let ctx = EvaluatorBuilder::new().print_handler(buffer_handler()).build();
/// let mut evaluator = Evaluator::new(&ctx);
/// evaluator.evaluate_module(&program)?;
/// ```
pub struct EvaluatorBuilder {
    global: Option<Arc<GlobalContext>>,
    body: Option<Object>,
    debug: bool,
    max_scope_depth: Option<usize>,
    max_nesting: usize,
    counters: bool,
    print_handler: Option<SharedPrintHandler>,
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluatorBuilder {
    pub fn new() -> Self {
        EvaluatorBuilder {
            global: None,
            body: None,
            debug: true,
            max_scope_depth: Some(10_000),
            max_nesting: 512,
            counters: false,
            print_handler: None,
        }
    }

    /// Share an existing global context instead of building one.
    #[must_use]
    pub fn global(mut self, global: Arc<GlobalContext>) -> Self {
        self.global = Some(global);
        self
    }

    /// The program namespace. Defaults to a fresh `__main__` namespace.
    #[must_use]
    pub fn body(mut self, body: Object) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether `assert` statements run.
    ///
    /// Also sets `__debug__` when the builder creates the global context.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Call depth at which `RecursionError` is raised; `None` for no limit.
    #[must_use]
    pub fn max_scope_depth(mut self, depth: Option<usize>) -> Self {
        self.max_scope_depth = depth;
        self
    }

    /// Depth of nested guarded runs before a host fault is reported.
    #[must_use]
    pub fn max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Enable per-Step-kind counters.
    #[must_use]
    pub fn counters(mut self, enabled: bool) -> Self {
        self.counters = enabled;
        self
    }

    /// Where `print` writes. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    pub fn build(self) -> ThreadContext {
        let debug = self.debug;
        let global = self
            .global
            .unwrap_or_else(|| GlobalContext::builder().debug(debug).build());
        let body = self.body.unwrap_or_else(|| {
            let body = Object::namespace();
            body.set_attribute("__name__", global.builtins().str("__main__"));
            body
        });
        ThreadContext::new(
            global,
            body,
            self.print_handler.unwrap_or_else(stdout_handler),
            Limits {
                debug,
                max_scope_depth: self.max_scope_depth,
                max_nesting: self.max_nesting,
            },
            self.counters,
        )
    }
}
