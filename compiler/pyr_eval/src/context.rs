//! Runtime context shared by evaluators.
//!
//! [`GlobalContext`] is process-wide and read from several host threads;
//! [`ThreadContext`] belongs to one host thread and is shared by reference
//! between an evaluator and the nested evaluators it starts.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pyr_object::{BaseException, Builtins, Object, Shared};
use rustc_hash::FxHashMap;

use crate::counters::StepCounters;
use crate::errors::keyboard_interrupt;
use crate::print_handler::SharedPrintHandler;
use crate::step::StepKind;

/// Which statement asked for a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportKind {
    Import,
    ImportFrom,
}

/// Resolves qualified module names to module objects.
pub trait ModuleImporter: Send + Sync {
    fn import(&self, kind: ImportKind, qualified_name: &str) -> Option<Object>;
}

/// An importer over a fixed table of pre-built modules.
#[derive(Default)]
pub struct ModuleTable {
    modules: FxHashMap<String, Object>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` under `name`. The module is pinned: it is shared by
    /// every evaluator that imports it.
    #[must_use]
    pub fn with_module(mut self, name: &str, module: Object) -> Self {
        module.pin();
        self.modules.insert(name.to_owned(), module);
        self
    }
}

impl ModuleImporter for ModuleTable {
    fn import(&self, _kind: ImportKind, qualified_name: &str) -> Option<Object> {
        self.modules.get(qualified_name).cloned()
    }
}

/// Process-wide state: builtins, module loading, interrupt requests.
pub struct GlobalContext {
    builtins: Builtins,
    importer: Box<dyn ModuleImporter>,
    modules: Shared<FxHashMap<String, Object>>,
    interrupt: AtomicBool,
}

impl GlobalContext {
    pub fn builder() -> GlobalContextBuilder {
        GlobalContextBuilder::default()
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Resolve a module through the cache, then the importer.
    pub fn import_module(&self, kind: ImportKind, qualified_name: &str) -> Option<Object> {
        if let Some(module) = self
            .modules
            .with_read(|modules| modules.get(qualified_name).cloned())
        {
            return Some(module);
        }
        let module = self.importer.import(kind, qualified_name)?;
        module.pin();
        tracing::debug!(module = qualified_name, "module imported");
        Some(self.modules.with_write(|modules| {
            modules
                .entry(qualified_name.to_owned())
                .or_insert(module)
                .clone()
        }))
    }

    pub fn cached_modules(&self) -> usize {
        self.modules.read().len()
    }

    /// Ask running evaluators to stop. Observed at the next dispatch step.
    pub fn request_interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }
}

pub struct GlobalContextBuilder {
    debug: bool,
    importer: Option<Box<dyn ModuleImporter>>,
}

impl Default for GlobalContextBuilder {
    fn default() -> Self {
        GlobalContextBuilder {
            debug: true,
            importer: None,
        }
    }
}

impl GlobalContextBuilder {
    /// Value of the builtin `__debug__` constant.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn importer(mut self, importer: impl ModuleImporter + 'static) -> Self {
        self.importer = Some(Box::new(importer));
        self
    }

    pub fn build(self) -> Arc<GlobalContext> {
        Arc::new(GlobalContext {
            builtins: Builtins::new(self.debug),
            importer: self
                .importer
                .unwrap_or_else(|| Box::new(ModuleTable::new())),
            modules: Shared::default(),
            interrupt: AtomicBool::new(false),
        })
    }
}

/// Limits applied to every evaluator of a thread.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub(crate) debug: bool,
    pub(crate) max_scope_depth: Option<usize>,
    pub(crate) max_nesting: usize,
}

/// Per-thread state shared by an evaluator and its nested evaluators.
pub struct ThreadContext {
    global: Arc<GlobalContext>,
    body: Object,
    return_slot: RefCell<Option<Object>>,
    print_handler: SharedPrintHandler,
    limits: Limits,
    counters: Option<RefCell<StepCounters>>,
}

impl ThreadContext {
    pub(crate) fn new(
        global: Arc<GlobalContext>,
        body: Object,
        print_handler: SharedPrintHandler,
        limits: Limits,
        counters: bool,
    ) -> Self {
        body.pin();
        ThreadContext {
            global,
            body,
            return_slot: RefCell::new(None),
            print_handler,
            limits,
            counters: counters.then(|| RefCell::new(StepCounters::default())),
        }
    }

    pub fn global(&self) -> &Arc<GlobalContext> {
        &self.global
    }

    pub fn builtins(&self) -> &Builtins {
        self.global.builtins()
    }

    /// The program namespace.
    pub fn body(&self) -> &Object {
        &self.body
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    /// The value left by the last `return` or top-level expression.
    pub fn return_value(&self) -> Option<Object> {
        self.return_slot.borrow().clone()
    }

    pub(crate) fn replace_return(&self, value: Option<Object>) -> Option<Object> {
        self.return_slot.replace(value)
    }

    pub(crate) fn limits(&self) -> Limits {
        self.limits
    }

    /// `Some(KeyboardInterrupt)` if an interrupt was requested since the
    /// last check. The request is consumed.
    pub fn process_interrupts(&self) -> Option<BaseException> {
        if self.global.take_interrupt() {
            tracing::debug!("interrupt observed");
            Some(keyboard_interrupt(self.builtins()))
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn record(&self, kind: StepKind) {
        if let Some(counters) = &self.counters {
            counters.borrow_mut().record(kind);
        }
    }

    pub(crate) fn record_nested_run(&self) {
        if let Some(counters) = &self.counters {
            counters.borrow_mut().record_nested_run();
        }
    }

    /// Snapshot of the counters, if enabled.
    pub fn counters(&self) -> Option<StepCounters> {
        self.counters.as_ref().map(|counters| counters.borrow().clone())
    }
}
