//! Error kinds raised and propagated by the engine.
//!
//! Three layers:
//! - [`BaseException`]: a language-level exception, catchable by `try`
//! - [`Fault`]: a host-side failure. Invariant faults are engine defects and
//!   pass every guard untouched; host faults are wrapped into an exception at
//!   the nearest guard
//! - [`Unwind`]: what a Step returns to the dispatch loop. It adds the bare
//!   re-raise sentinel and the [`Jump`]s that leave a guarded block, neither
//!   of which leaves this crate

use std::fmt;

use pyr_object::{BaseException, Builtins, ExceptionKind};

/// A failure that is not a language exception.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("value stack underflow in {context}")]
    StackUnderflow { context: &'static str },

    #[error("no active scope")]
    NoActiveScope,

    #[error("no active frame")]
    NoActiveFrame,

    /// A node whose parallel child lists disagree in length.
    #[error("malformed {context} node")]
    MalformedNode { context: &'static str },

    /// A `return`, `break` or `continue` that left every evaluator.
    #[error("'{0}' outside of any enclosing block")]
    StrayJump(Jump),

    /// Reported by a native function or by the engine's own limits.
    #[error("{0}")]
    Host(String),
}

impl Fault {
    /// Engine defects: never reinterpreted as a language exception.
    pub fn is_invariant(&self) -> bool {
        !matches!(self, Fault::Host(_))
    }
}

/// Outcome of a driver entry point that did not complete normally.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// An exception propagated out of the program.
    #[error("unhandled exception: {0}")]
    Exception(BaseException),

    #[error("internal fault: {0}")]
    Fault(#[from] Fault),
}

impl EvalError {
    /// The exception, if this is an unhandled exception.
    pub fn exception(&self) -> Option<&BaseException> {
        match self {
            EvalError::Exception(exception) => Some(exception),
            EvalError::Fault(_) => None,
        }
    }
}

/// A control transfer out of the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jump {
    Return,
    Break,
    Continue,
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Jump::Return => "return",
            Jump::Break => "break",
            Jump::Continue => "continue",
        })
    }
}

/// Non-local exit from a Step.
#[derive(Debug)]
pub(crate) enum Unwind {
    Raise(BaseException),
    /// Bare `raise`: re-raise whatever is being handled.
    ReRaise,
    /// A jump that leaves the block a nested evaluator was started for.
    Jump(Jump),
    Fault(Fault),
}

impl From<BaseException> for Unwind {
    fn from(exception: BaseException) -> Self {
        Unwind::Raise(exception)
    }
}

impl From<Fault> for Unwind {
    fn from(fault: Fault) -> Self {
        Unwind::Fault(fault)
    }
}

pub(crate) type EvalResult<T = ()> = Result<T, Unwind>;

// Exception factories

#[cold]
pub(crate) fn attribute_error(builtins: &Builtins, type_name: &str, name: &str) -> BaseException {
    builtins.new_exception(
        ExceptionKind::AttributeError,
        &format!("'{type_name}' object has no attribute '{name}'"),
    )
}

#[cold]
pub(crate) fn name_error(builtins: &Builtins, name: &str) -> BaseException {
    builtins.new_exception(
        ExceptionKind::NameError,
        &format!("name '{name}' is not defined"),
    )
}

#[cold]
pub(crate) fn type_error(builtins: &Builtins, message: &str) -> BaseException {
    builtins.new_exception(ExceptionKind::TypeError, message)
}

#[cold]
pub(crate) fn runtime_error(builtins: &Builtins, message: &str) -> BaseException {
    builtins.new_exception(ExceptionKind::RuntimeError, message)
}

#[cold]
pub(crate) fn assertion_error(builtins: &Builtins) -> BaseException {
    builtins.new_exception(ExceptionKind::AssertionError, "")
}

#[cold]
pub(crate) fn recursion_error(builtins: &Builtins, limit: usize) -> BaseException {
    builtins.new_exception(
        ExceptionKind::RecursionError,
        &format!("maximum recursion depth exceeded ({limit})"),
    )
}

#[cold]
pub(crate) fn module_not_found_error(builtins: &Builtins, module: &str) -> BaseException {
    builtins.new_exception(
        ExceptionKind::ModuleNotFoundError,
        &format!("No module named '{module}'"),
    )
}

#[cold]
pub(crate) fn import_error(builtins: &Builtins, name: &str, module: &str) -> BaseException {
    builtins.new_exception(
        ExceptionKind::ImportError,
        &format!("cannot import name '{name}' from '{module}'"),
    )
}

#[cold]
pub(crate) fn keyboard_interrupt(builtins: &Builtins) -> BaseException {
    builtins.new_exception(ExceptionKind::KeyboardInterrupt, "")
}

#[cold]
pub(crate) fn overflow_error(builtins: &Builtins, op: &str) -> BaseException {
    builtins.new_exception(
        ExceptionKind::OverflowError,
        &format!("integer overflow in {op}"),
    )
}

#[cold]
pub(crate) fn zero_division_error(builtins: &Builtins, what: &str) -> BaseException {
    builtins.new_exception(ExceptionKind::ZeroDivisionError, what)
}

#[cold]
pub(crate) fn unsupported_operands(
    builtins: &Builtins,
    symbol: &str,
    left: &str,
    right: &str,
) -> BaseException {
    type_error(
        builtins,
        &format!("unsupported operand type(s) for {symbol}: '{left}' and '{right}'"),
    )
}

#[cold]
pub(crate) fn underflow(context: &'static str) -> Unwind {
    Unwind::Fault(Fault::StackUnderflow { context })
}

#[cold]
pub(crate) fn malformed(context: &'static str) -> Unwind {
    Unwind::Fault(Fault::MalformedNode { context })
}

impl From<EvalError> for Unwind {
    fn from(error: EvalError) -> Self {
        match error {
            EvalError::Exception(exception) => Unwind::Raise(exception),
            EvalError::Fault(fault) => Unwind::Fault(fault),
        }
    }
}
