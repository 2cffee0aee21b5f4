//! Variant-typed object contents.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pyr_ir::FunctionDef;

use crate::{BaseException, Builtins, Object};

/// The fixed, variant-typed part of an object.
///
/// Payloads never change after construction; everything mutable lives in the
/// attribute table.
pub enum Payload {
    /// A namespace or instance with no native value.
    Plain,
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Tuple(Vec<Object>),
    Native(NativeFunction),
    Function(FunctionCode),
    Method(BoundMethod),
    TupleIterator(TupleIterator),
}

impl Payload {
    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Plain => "plain",
            Payload::None => "none",
            Payload::Bool(_) => "bool",
            Payload::Int(_) => "int",
            Payload::Float(_) => "float",
            Payload::Str(_) => "str",
            Payload::Tuple(_) => "tuple",
            Payload::Native(_) => "native",
            Payload::Function(_) => "function",
            Payload::Method(_) => "method",
            Payload::TupleIterator(_) => "tuple_iterator",
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Plain => f.write_str("Plain"),
            Payload::None => f.write_str("None"),
            Payload::Bool(value) => write!(f, "Bool({value})"),
            Payload::Int(value) => write!(f, "Int({value})"),
            Payload::Float(value) => write!(f, "Float({value})"),
            Payload::Str(value) => write!(f, "Str({value:?})"),
            Payload::Tuple(items) => write!(f, "Tuple(len={})", items.len()),
            Payload::Native(native) => write!(f, "Native({})", native.name),
            Payload::Function(code) => write!(f, "Function({})", code.def.name),
            Payload::Method(method) => write!(f, "Method({:?})", method.function.id()),
            Payload::TupleIterator(iter) => write!(f, "TupleIterator(at={})", iter.position()),
        }
    }
}

/// Failure reported by a native function.
#[derive(Clone, Debug)]
pub enum NativeError {
    /// A language-level exception to raise.
    Raise(BaseException),
    /// A host-level failure; wrapped into an exception at the nearest guard.
    Host(String),
}

impl From<BaseException> for NativeError {
    fn from(exception: BaseException) -> Self {
        NativeError::Raise(exception)
    }
}

pub type NativeResult = Result<Object, NativeError>;

/// Services a native function may use from whoever calls it.
pub trait NativeHost {
    fn builtins(&self) -> &Builtins;

    /// Write one line of program output.
    fn write_line(&self, text: &str);
}

pub type NativeFn = fn(&dyn NativeHost, &[Object]) -> NativeResult;

/// A function implemented by the host.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

/// A user function: its definition node plus the namespaces it closes over,
/// innermost first.
#[derive(Clone)]
pub struct FunctionCode {
    pub def: Arc<FunctionDef>,
    pub closure: Vec<Object>,
}

/// A function bound to the receiver it was looked up on.
#[derive(Clone)]
pub struct BoundMethod {
    pub function: Object,
    pub receiver: Object,
}

/// Cursor over a tuple's items, advanced by `__next__`.
pub struct TupleIterator {
    items: Vec<Object>,
    position: AtomicUsize,
}

impl TupleIterator {
    pub fn new(items: Vec<Object>) -> Self {
        TupleIterator {
            items,
            position: AtomicUsize::new(0),
        }
    }

    /// Return the next item, or `None` once exhausted.
    pub fn advance(&self) -> Option<Object> {
        let index = self.position.fetch_add(1, Ordering::Relaxed);
        let item = self.items.get(index).cloned();
        if item.is_none() {
            self.position.store(self.items.len(), Ordering::Relaxed);
        }
        item
    }

    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    pub(crate) fn items(&self) -> &[Object] {
        &self.items
    }
}
