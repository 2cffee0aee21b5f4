//! Host stack headroom for nested evaluator runs.
//!
//! Loops and calls never recurse on the host stack. A guarded block does: a
//! `try` inside a `with` inside an iterator step is three nested evaluators,
//! each running its own dispatch loop one host frame deeper. Every nested
//! run goes through [`with_headroom`], which moves it to a fresh stack
//! segment when the current one runs low.

/// Space a nested run needs before it starts: one dispatch loop plus the
/// Step it is running.
#[cfg(not(target_arch = "wasm32"))]
const NESTED_RUN_HEADROOM: usize = 128 * 1024;

/// Size of each extra segment. Holds several nested runs, so guards nested
/// only a few deep never switch segments twice.
#[cfg(not(target_arch = "wasm32"))]
const NESTED_RUN_SEGMENT: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn with_headroom<R>(run: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(NESTED_RUN_HEADROOM, NESTED_RUN_SEGMENT, run)
}

/// The wasm host owns the stack; nesting is bounded by `max_nesting` alone.
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn with_headroom<R>(run: impl FnOnce() -> R) -> R {
    run()
}
