//! Reference-counted objects with attribute tables.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use pyr_ir::Name;
use rustc_hash::FxHashMap;

use crate::payload::{BoundMethod, FunctionCode, NativeFunction, TupleIterator};
use crate::Payload;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an object, unique for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn fresh() -> Self {
        ObjectId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

struct ObjectData {
    id: ObjectId,
    payload: Payload,
    attributes: RwLock<FxHashMap<Name, Object>>,
    pinned: AtomicBool,
}

/// Handle to a runtime object.
///
/// Cloning shares the object. Attribute access takes the table's lock for the
/// duration of a single operation only, so callers never hold a guard while
/// running user code.
#[derive(Clone)]
pub struct Object(Arc<ObjectData>);

impl Object {
    /// Create an object with the given payload and `__class__`.
    pub fn new(payload: Payload, class: Option<&Object>) -> Self {
        let object = Object(Arc::new(ObjectData {
            id: ObjectId::fresh(),
            payload,
            attributes: RwLock::new(FxHashMap::default()),
            pinned: AtomicBool::new(false),
        }));
        if let Some(class) = class {
            object.set_attribute("__class__", class.clone());
        }
        object
    }

    /// An empty namespace object with no class.
    pub fn namespace() -> Self {
        Object::new(Payload::Plain, None)
    }

    /// Create an object and populate its attributes.
    pub fn with_attributes<'a>(
        payload: Payload,
        attributes: impl IntoIterator<Item = (&'a str, Object)>,
    ) -> Self {
        let object = Object::new(payload, None);
        {
            let mut table = object.0.attributes.write();
            for (name, value) in attributes {
                table.insert(Name::new(name), value);
            }
        }
        object
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.0.payload
    }

    /// Identity comparison.
    #[inline]
    pub fn is(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn get_attribute(&self, name: &str) -> Option<Object> {
        self.0.attributes.read().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.read().contains_key(name)
    }

    pub fn set_attribute(&self, name: impl Into<Name>, value: Object) {
        self.0.attributes.write().insert(name.into(), value);
    }

    /// Remove an attribute, returning its old value.
    pub fn delete_attribute(&self, name: &str) -> Option<Object> {
        self.0.attributes.write().remove(name)
    }

    /// Attribute names in sorted order.
    pub fn dir(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self.0.attributes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn dir_size(&self) -> usize {
        self.0.attributes.read().len()
    }

    /// The object's `__class__`, if it has one.
    pub fn class(&self) -> Option<Object> {
        self.get_attribute("__class__")
    }

    /// Whether this object is a type (it carries a method-resolution order).
    pub fn is_type(&self) -> bool {
        self.has_attribute("__mro__")
    }

    /// The method-resolution order of this object's type.
    ///
    /// Empty when the object has no class or the class has no `__mro__`.
    pub fn type_mro(&self) -> Vec<Object> {
        self.class().map(|class| class.own_mro()).unwrap_or_default()
    }

    /// The `__mro__` of this object when it is itself a type.
    pub fn own_mro(&self) -> Vec<Object> {
        match self.get_attribute("__mro__") {
            Some(mro) => mro.as_tuple().map(<[Object]>::to_vec).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Whether `self` is `base` or has it in its `__mro__`.
    pub fn is_subclass(&self, base: &Object) -> bool {
        self.is(base) || self.own_mro().iter().any(|entry| entry.is(base))
    }

    /// Whether this object's class is `class` or derives from it.
    pub fn is_instance(&self, class: &Object) -> bool {
        self.class().is_some_and(|own| own.is_subclass(class))
    }

    /// Exclude this object from teardown passes.
    ///
    /// Builtins and program namespaces are pinned: they outlive any single
    /// evaluator.
    pub fn pin(&self) {
        self.0.pinned.store(true, Ordering::Relaxed);
    }

    pub fn is_pinned(&self) -> bool {
        self.0.pinned.load(Ordering::Relaxed)
    }

    /// Number of live handles to this object.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    // Variant-typed access

    pub fn as_int(&self) -> Option<i64> {
        match self.payload() {
            Payload::Int(value) => Some(*value),
            Payload::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.payload() {
            Payload::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload() {
            Payload::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.payload() {
            Payload::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Object]> {
        match self.payload() {
            Payload::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeFunction> {
        match self.payload() {
            Payload::Native(native) => Some(native),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionCode> {
        match self.payload() {
            Payload::Function(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&BoundMethod> {
        match self.payload() {
            Payload::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_tuple_iterator(&self) -> Option<&TupleIterator> {
        match self.payload() {
            Payload::TupleIterator(iter) => Some(iter),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.payload(), Payload::None)
    }

    /// Truthiness for values that have a native answer.
    ///
    /// `None` means the object's type decides (through `__bool__`).
    pub fn native_truth(&self) -> Option<bool> {
        match self.payload() {
            Payload::None => Some(false),
            Payload::Bool(value) => Some(*value),
            Payload::Int(value) => Some(*value != 0),
            Payload::Float(value) => Some(*value != 0.0),
            Payload::Str(value) => Some(!value.is_empty()),
            Payload::Tuple(items) => Some(!items.is_empty()),
            Payload::Plain
            | Payload::Native(_)
            | Payload::Function(_)
            | Payload::Method(_)
            | Payload::TupleIterator(_) => None,
        }
    }

    /// Whether the object is callable by the engine's call protocol.
    pub fn is_callable(&self) -> bool {
        matches!(
            self.payload(),
            Payload::Native(_) | Payload::Function(_) | Payload::Method(_)
        ) || self.is_type()
    }

    /// `__name__` of the object if it is a string.
    pub fn name(&self) -> Option<String> {
        self.get_attribute("__name__")
            .and_then(|name| name.as_str().map(str::to_owned))
    }

    /// Name of this object's class, or `"object"`.
    pub fn type_name(&self) -> String {
        self.class()
            .and_then(|class| class.name())
            .unwrap_or_else(|| "object".to_owned())
    }

    /// Human-readable rendering, as `str()` would produce it.
    pub fn display_string(&self) -> String {
        match self.payload() {
            Payload::None => "None".to_owned(),
            Payload::Bool(true) => "True".to_owned(),
            Payload::Bool(false) => "False".to_owned(),
            Payload::Int(value) => value.to_string(),
            Payload::Float(value) => format_float(*value),
            Payload::Str(value) => value.to_string(),
            Payload::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(Object::repr_string).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
            Payload::Native(native) => format!("<built-in function {}>", native.name),
            Payload::Function(code) => format!("<function {}>", code.def.name),
            Payload::Method(method) => {
                let name = method.function.name().unwrap_or_default();
                format!("<bound method {name}>")
            }
            Payload::TupleIterator(_) => "<tuple_iterator object>".to_owned(),
            Payload::Plain => self.plain_display(),
        }
    }

    /// Rendering as `repr()` would produce it (strings are quoted).
    pub fn repr_string(&self) -> String {
        match self.payload() {
            Payload::Str(value) => format!("'{value}'"),
            _ => self.display_string(),
        }
    }

    fn plain_display(&self) -> String {
        if self.is_type() {
            return format!("<class '{}'>", self.name().unwrap_or_default());
        }
        // Exception instances render their arguments.
        if let Some(args) = self.get_attribute("args") {
            if let Some(items) = args.as_tuple() {
                return match items {
                    [] => String::new(),
                    [single] => single.display_string(),
                    _ => args.display_string(),
                };
            }
        }
        format!("<{} object>", self.type_name())
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl fmt::Debug for Object {
    // Attributes are left out: they can point back at this object.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id().raw())
            .field("payload", self.payload())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Object {
    /// Identity, not value: two `int` objects holding 1 are different objects.
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl Eq for Object {}

#[cfg(test)]
mod tests;
