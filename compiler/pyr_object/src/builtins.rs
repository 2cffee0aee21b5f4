//! The builtins registry.
//!
//! Built once per process and shared by every evaluator. Every object
//! reachable from the registry at construction is pinned, so teardown passes
//! never strip it.

mod natives;

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::payload::{BoundMethod, NativeFn, NativeFunction, TupleIterator};
use crate::{BaseException, Object, Payload};

/// The builtin exception classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    BaseException,
    Exception,
    StopIteration,
    RuntimeError,
    RecursionError,
    AttributeError,
    NameError,
    TypeError,
    AssertionError,
    ImportError,
    ModuleNotFoundError,
    ArithmeticError,
    OverflowError,
    ZeroDivisionError,
    KeyboardInterrupt,
}

impl ExceptionKind {
    /// Every kind, parents before children.
    pub const ALL: [ExceptionKind; 15] = [
        ExceptionKind::BaseException,
        ExceptionKind::Exception,
        ExceptionKind::StopIteration,
        ExceptionKind::RuntimeError,
        ExceptionKind::RecursionError,
        ExceptionKind::AttributeError,
        ExceptionKind::NameError,
        ExceptionKind::TypeError,
        ExceptionKind::AssertionError,
        ExceptionKind::ImportError,
        ExceptionKind::ModuleNotFoundError,
        ExceptionKind::ArithmeticError,
        ExceptionKind::OverflowError,
        ExceptionKind::ZeroDivisionError,
        ExceptionKind::KeyboardInterrupt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::BaseException => "BaseException",
            ExceptionKind::Exception => "Exception",
            ExceptionKind::StopIteration => "StopIteration",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::RecursionError => "RecursionError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::AssertionError => "AssertionError",
            ExceptionKind::ImportError => "ImportError",
            ExceptionKind::ModuleNotFoundError => "ModuleNotFoundError",
            ExceptionKind::ArithmeticError => "ArithmeticError",
            ExceptionKind::OverflowError => "OverflowError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::KeyboardInterrupt => "KeyboardInterrupt",
        }
    }

    fn parent(self) -> Option<ExceptionKind> {
        match self {
            ExceptionKind::BaseException => None,
            ExceptionKind::Exception | ExceptionKind::KeyboardInterrupt => {
                Some(ExceptionKind::BaseException)
            }
            ExceptionKind::StopIteration
            | ExceptionKind::RuntimeError
            | ExceptionKind::AttributeError
            | ExceptionKind::NameError
            | ExceptionKind::TypeError
            | ExceptionKind::AssertionError
            | ExceptionKind::ImportError
            | ExceptionKind::ArithmeticError => Some(ExceptionKind::Exception),
            ExceptionKind::RecursionError => Some(ExceptionKind::RuntimeError),
            ExceptionKind::ModuleNotFoundError => Some(ExceptionKind::ImportError),
            ExceptionKind::OverflowError | ExceptionKind::ZeroDivisionError => {
                Some(ExceptionKind::ArithmeticError)
            }
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Registry of builtin types, constants and functions.
pub struct Builtins {
    module: Object,
    object: Object,
    type_: Object,
    function: Object,
    method: Object,
    builtin_function: Object,
    none_type: Object,
    none: Object,
    bool_type: Object,
    true_: Object,
    false_: Object,
    int: Object,
    float: Object,
    str_: Object,
    tuple: Object,
    tuple_iterator: Object,
    exceptions: Vec<Object>,
    default_getattribute: Object,
}

impl Builtins {
    /// Build the registry. `debug` becomes the value of `__debug__`.
    pub fn new(debug: bool) -> Self {
        // `type`, `str` and `tuple` exist before anything can be named.
        let type_ = Object::namespace();
        type_.set_attribute("__class__", type_.clone());
        let str_ = Object::new(Payload::Plain, Some(&type_));
        let tuple = Object::new(Payload::Plain, Some(&type_));
        let object = Object::new(Payload::Plain, Some(&type_));

        let boot = Bootstrap {
            type_: &type_,
            str_: &str_,
            tuple: &tuple,
        };
        boot.finish_type(&object, "object", &[]);
        boot.finish_type(&type_, "type", &[&object]);
        boot.finish_type(&str_, "str", &[&object]);
        boot.finish_type(&tuple, "tuple", &[&object]);

        let new_type = |name: &str, base: &Object| {
            let ty = Object::new(Payload::Plain, Some(&type_));
            boot.finish_type(&ty, name, &[base]);
            ty
        };
        let function = new_type("function", &object);
        let method = new_type("method", &object);
        let builtin_function = new_type("builtin_function_or_method", &object);
        let none_type = new_type("NoneType", &object);
        let int = new_type("int", &object);
        let bool_type = new_type("bool", &int);
        let float = new_type("float", &object);
        let tuple_iterator = new_type("tuple_iterator", &object);

        let mut exceptions: Vec<Object> = Vec::with_capacity(ExceptionKind::ALL.len());
        for kind in ExceptionKind::ALL {
            let base = kind
                .parent()
                .and_then(|parent| exceptions.get(parent.index()))
                .unwrap_or(&object)
                .clone();
            exceptions.push(new_type(kind.name(), &base));
        }

        let default_getattribute = Object::new(
            Payload::Native(NativeFunction {
                name: "__getattribute__",
                func: natives::object_getattribute,
            }),
            Some(&builtin_function),
        );
        default_getattribute.set_attribute("__name__", boot.str("__getattribute__"));

        let builtins = Builtins {
            module: Object::namespace(),
            none: Object::new(Payload::None, Some(&none_type)),
            true_: Object::new(Payload::Bool(true), Some(&bool_type)),
            false_: Object::new(Payload::Bool(false), Some(&bool_type)),
            object,
            type_,
            function,
            method,
            builtin_function,
            none_type,
            bool_type,
            int,
            float,
            str_,
            tuple,
            tuple_iterator,
            exceptions,
            default_getattribute,
        };

        let object = &builtins.object;
        object.set_attribute(
            "__getattribute__",
            builtins.default_getattribute.clone(),
        );
        object.set_attribute("__init__", builtins.native("__init__", natives::object_init));
        builtins
            .exception_class(ExceptionKind::BaseException)
            .set_attribute("__init__", builtins.native("__init__", natives::exception_init));
        let slots: [(&Object, &'static str, NativeFn); 9] = [
            (&builtins.type_, "__new__", natives::type_new),
            (&builtins.tuple, "__iter__", natives::tuple_iter),
            (&builtins.tuple_iterator, "__iter__", natives::iterator_iter),
            (&builtins.tuple_iterator, "__next__", natives::iterator_next),
            (&builtins.int, "__new__", natives::int_new),
            (&builtins.float, "__new__", natives::float_new),
            (&builtins.str_, "__new__", natives::str_new),
            (&builtins.bool_type, "__new__", natives::bool_new),
            (&builtins.tuple, "__new__", natives::tuple_new),
        ];
        for (ty, name, func) in slots {
            ty.set_attribute(name, builtins.native(name, func));
        }

        let module = &builtins.module;
        module.set_attribute("__name__", builtins.str("builtins"));
        for ty in [
            &builtins.object,
            &builtins.type_,
            &builtins.int,
            &builtins.bool_type,
            &builtins.float,
            &builtins.str_,
            &builtins.tuple,
        ] {
            if let Some(name) = ty.name() {
                module.set_attribute(name.as_str(), ty.clone());
            }
        }
        for (kind, class) in ExceptionKind::ALL.iter().zip(&builtins.exceptions) {
            module.set_attribute(kind.name(), class.clone());
        }
        module.set_attribute("None", builtins.none.clone());
        module.set_attribute("True", builtins.true_.clone());
        module.set_attribute("False", builtins.false_.clone());
        module.set_attribute("__debug__", builtins.bool(debug));
        let functions: [(&'static str, NativeFn); 5] = [
            ("print", natives::print),
            ("iter", natives::iter),
            ("next", natives::next),
            ("len", natives::len),
            ("isinstance", natives::isinstance),
        ];
        for (name, func) in functions {
            module.set_attribute(name, builtins.native(name, func));
        }

        pin_reachable(&builtins.module);
        let assertions = debug;
        tracing::debug!(
            names = builtins.module.dir_size(),
            assertions,
            "builtins registry built"
        );
        builtins
    }

    /// The namespace holding every builtin by name.
    pub fn module(&self) -> &Object {
        &self.module
    }

    /// Look a builtin up by name.
    pub fn lookup_name(&self, name: &str) -> Option<Object> {
        self.module.get_attribute(name)
    }

    pub fn object_type(&self) -> &Object {
        &self.object
    }

    pub fn type_type(&self) -> &Object {
        &self.type_
    }

    pub fn function_type(&self) -> &Object {
        &self.function
    }

    pub fn none_type(&self) -> &Object {
        &self.none_type
    }

    pub fn int_type(&self) -> &Object {
        &self.int
    }

    pub fn str_type(&self) -> &Object {
        &self.str_
    }

    pub fn tuple_type(&self) -> &Object {
        &self.tuple
    }

    /// The default `object.__getattribute__`, used as an identity marker.
    pub fn default_getattribute(&self) -> &Object {
        &self.default_getattribute
    }

    pub fn exception_class(&self, kind: ExceptionKind) -> &Object {
        &self.exceptions[kind.index()]
    }

    // Value factories

    pub fn none(&self) -> Object {
        self.none.clone()
    }

    pub fn bool(&self, value: bool) -> Object {
        if value {
            self.true_.clone()
        } else {
            self.false_.clone()
        }
    }

    pub fn int(&self, value: i64) -> Object {
        Object::new(Payload::Int(value), Some(&self.int))
    }

    pub fn float(&self, value: f64) -> Object {
        Object::new(Payload::Float(value), Some(&self.float))
    }

    pub fn str(&self, value: &str) -> Object {
        Object::new(Payload::Str(Arc::from(value)), Some(&self.str_))
    }

    pub fn tuple(&self, items: Vec<Object>) -> Object {
        Object::new(Payload::Tuple(items), Some(&self.tuple))
    }

    pub fn tuple_iterator(&self, items: Vec<Object>) -> Object {
        Object::new(
            Payload::TupleIterator(TupleIterator::new(items)),
            Some(&self.tuple_iterator),
        )
    }

    /// A host function object.
    pub fn native(&self, name: &'static str, func: NativeFn) -> Object {
        let native = Object::new(
            Payload::Native(NativeFunction { name, func }),
            Some(&self.builtin_function),
        );
        native.set_attribute("__name__", self.str(name));
        native
    }

    /// Bind `function` to `receiver`.
    pub fn method(&self, function: Object, receiver: Object) -> Object {
        Object::new(
            Payload::Method(BoundMethod { function, receiver }),
            Some(&self.method),
        )
    }

    /// Create a class with a linear MRO: itself, then each base's MRO in
    /// order, skipping entries already present.
    pub fn new_type(&self, name: &str, bases: &[Object]) -> Object {
        let ty = Object::new(Payload::Plain, Some(&self.type_));
        let bases: Vec<&Object> = if bases.is_empty() {
            vec![&self.object]
        } else {
            bases.iter().collect()
        };
        Bootstrap {
            type_: &self.type_,
            str_: &self.str_,
            tuple: &self.tuple,
        }
        .finish_type(&ty, name, &bases);
        ty
    }

    /// An instance of `class` with `args` bound, as `class(*args)` produces
    /// for exception types.
    pub fn instantiate_exception(&self, class: &Object, args: Vec<Object>) -> Object {
        let instance = Object::new(Payload::Plain, Some(class));
        instance.set_attribute("args", self.tuple(args));
        instance
    }

    /// A raised exception of a builtin class with a message argument.
    pub fn new_exception(&self, kind: ExceptionKind, message: &str) -> BaseException {
        let class = self.exception_class(kind);
        let args = if message.is_empty() {
            Vec::new()
        } else {
            vec![self.str(message)]
        };
        BaseException::new(self.instantiate_exception(class, args))
    }

    /// Attribute lookup without any user hook: the object's own table, then
    /// its type's MRO. A function found on a type is bound to an instance
    /// receiver. A type also searches its own MRO.
    pub fn lookup(&self, object: &Object, name: &str) -> Option<Object> {
        if let Some(found) = object.get_attribute(name) {
            return Some(found);
        }
        if object.is_type() {
            if let Some(found) = object
                .own_mro()
                .iter()
                .skip(1)
                .find_map(|base| base.get_attribute(name))
            {
                return Some(found);
            }
        }
        let found = object
            .type_mro()
            .iter()
            .find_map(|class| class.get_attribute(name))?;
        let bindable = matches!(found.payload(), Payload::Function(_) | Payload::Native(_));
        if bindable && !object.is_type() {
            Some(self.method(found, object.clone()))
        } else {
            Some(found)
        }
    }
}

/// Type construction used before a `Builtins` exists.
struct Bootstrap<'a> {
    type_: &'a Object,
    str_: &'a Object,
    tuple: &'a Object,
}

impl Bootstrap<'_> {
    fn str(&self, value: &str) -> Object {
        Object::new(Payload::Str(Arc::from(value)), Some(self.str_))
    }

    fn tuple(&self, items: Vec<Object>) -> Object {
        Object::new(Payload::Tuple(items), Some(self.tuple))
    }

    fn finish_type(&self, ty: &Object, name: &str, bases: &[&Object]) {
        if !ty.has_attribute("__class__") {
            ty.set_attribute("__class__", self.type_.clone());
        }
        let mut mro = vec![ty.clone()];
        for base in bases {
            for entry in base.own_mro() {
                if !mro.iter().any(|seen| seen.is(&entry)) {
                    mro.push(entry);
                }
            }
        }
        ty.set_attribute("__name__", self.str(name));
        ty.set_attribute("__qualname__", self.str(name));
        ty.set_attribute(
            "__bases__",
            self.tuple(bases.iter().map(|base| (*base).clone()).collect()),
        );
        ty.set_attribute("__mro__", self.tuple(mro));
    }
}

/// Pin every object reachable from `root` through attributes and payloads.
fn pin_reachable(root: &Object) {
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([root.clone()]);
    while let Some(object) = queue.pop_front() {
        if !seen.insert(object.id()) {
            continue;
        }
        object.pin();
        for name in object.dir() {
            if let Some(value) = object.get_attribute(name.as_str()) {
                queue.push_back(value);
            }
        }
        if let Some(items) = object.as_tuple() {
            queue.extend(items.iter().cloned());
        }
    }
}
