//! Pyr Eval - the continuation-stack execution engine for Pyrite.
//!
//! # Architecture
//!
//! Instead of recursing on the host stack, the [`Evaluator`] keeps an
//! explicit stack of pending actions:
//!
//! - **Step**: one pending action, consumed once
//! - **Frame**: a LIFO stack of Steps for one block
//! - **Scope**: one language-level namespace plus its Frames
//! - **Scope Stack**: one Scope per call or entry point; empty when done
//! - **Value Stack**: operands passed between Steps
//!
//! Statement handlers only push Steps. The dispatch loop pops and runs them
//! one at a time, so user-level loops and call chains of any depth run in
//! constant host stack.
//!
//! Guarded blocks (`try`, `with`, iterator steps) run in a nested evaluator
//! that shares the current namespace but owns its own stacks. Its outcome is
//! a plain "exception or not" value the caller sequences explicitly.
//!
//! # Runtime context
//!
//! - [`GlobalContext`]: builtins, module importer, module cache, interrupt
//!   flag; shared between host threads
//! - [`ThreadContext`]: program namespace, return slot, print handler and
//!   limits; built by [`EvaluatorBuilder`]

mod builder;
mod context;
mod counters;
mod errors;
mod evaluator;
mod print_handler;
mod scopes;
mod stack;
mod step;
mod tracing_setup;

pub use builder::EvaluatorBuilder;
pub use context::{
    GlobalContext, GlobalContextBuilder, ImportKind, ModuleImporter, ModuleTable, ThreadContext,
};
pub use counters::StepCounters;
pub use errors::{EvalError, Fault, Jump};
pub use evaluator::Evaluator;
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use step::StepKind;
pub use tracing_setup::init_tracing;

#[cfg(test)]
mod tests;
