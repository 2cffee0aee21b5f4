//! Pyr Object - the object representation consumed by the Pyrite engine.
//!
//! # Architecture
//!
//! - [`Object`]: a reference-counted handle with an identity, an immutable
//!   [`Payload`] and an attribute table behind a reader/writer lock
//! - [`BaseException`]: the catchable exception value (payload plus chained
//!   cause and context)
//! - [`Builtins`]: the registry of built-in types, constants and natives
//! - [`disown`]: breadth-first teardown of attribute graphs, since objects may
//!   form reference cycles and nothing traces them
//! - [`Shared`]: a multiple-reader/single-writer guard for state that several
//!   independent evaluators read from separate host threads
//!
//! Objects are `Send + Sync`: the builtins registry is built once and shared by
//! every evaluator of a process.

mod builtins;
mod disown;
mod exception;
mod object;
mod payload;
mod shared;

pub use builtins::{Builtins, ExceptionKind};
pub use disown::disown;
pub use exception::BaseException;
pub use object::{Object, ObjectId};
pub use payload::{
    BoundMethod, FunctionCode, NativeError, NativeFn, NativeFunction, NativeHost, NativeResult,
    Payload, TupleIterator,
};
pub use shared::Shared;
