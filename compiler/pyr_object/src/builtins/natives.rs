//! Host implementations of builtin functions and slot methods.
//!
//! Each takes the caller's host services and the positional arguments; slot
//! methods receive their receiver as the first argument.

use crate::payload::{NativeError, NativeHost, NativeResult};
use crate::{ExceptionKind, Object, Payload};

#[cold]
fn raise(host: &dyn NativeHost, kind: ExceptionKind, message: &str) -> NativeError {
    NativeError::Raise(host.builtins().new_exception(kind, message))
}

fn arity(
    host: &dyn NativeHost,
    name: &str,
    args: &[Object],
    expected: usize,
) -> Result<(), NativeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(raise(
            host,
            ExceptionKind::TypeError,
            &format!(
                "{name}() takes exactly {expected} argument(s) ({} given)",
                args.len()
            ),
        ))
    }
}

pub(super) fn print(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let line: Vec<String> = args.iter().map(Object::display_string).collect();
    host.write_line(&line.join(" "));
    Ok(host.builtins().none())
}

pub(super) fn iter(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "iter", args, 1)?;
    let target = &args[0];
    match target.payload() {
        Payload::Tuple(items) => Ok(host.builtins().tuple_iterator(items.clone())),
        Payload::TupleIterator(_) => Ok(target.clone()),
        _ => Err(raise(
            host,
            ExceptionKind::TypeError,
            &format!("'{}' object is not iterable", target.type_name()),
        )),
    }
}

pub(super) fn next(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "next", args, 1)?;
    iterator_next(host, args)
}

pub(super) fn len(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "len", args, 1)?;
    let length = match args[0].payload() {
        Payload::Tuple(items) => items.len(),
        Payload::Str(text) => text.chars().count(),
        _ => {
            return Err(raise(
                host,
                ExceptionKind::TypeError,
                &format!("object of type '{}' has no len()", args[0].type_name()),
            ))
        }
    };
    let length = i64::try_from(length)
        .map_err(|_| raise(host, ExceptionKind::OverflowError, "length too large"))?;
    Ok(host.builtins().int(length))
}

pub(super) fn isinstance(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "isinstance", args, 2)?;
    let (object, spec) = (&args[0], &args[1]);
    let matched = match spec.as_tuple() {
        Some(classes) => classes.iter().any(|class| object.is_instance(class)),
        None if spec.is_type() => object.is_instance(spec),
        None => {
            return Err(raise(
                host,
                ExceptionKind::TypeError,
                "isinstance() arg 2 must be a type or tuple of types",
            ))
        }
    };
    Ok(host.builtins().bool(matched))
}

pub(super) fn object_getattribute(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "__getattribute__", args, 2)?;
    let (object, name) = (&args[0], &args[1]);
    let Some(name) = name.as_str() else {
        return Err(raise(
            host,
            ExceptionKind::TypeError,
            "attribute name must be string",
        ));
    };
    host.builtins().lookup(object, name).ok_or_else(|| {
        raise(
            host,
            ExceptionKind::AttributeError,
            &format!("'{}' object has no attribute '{name}'", object.type_name()),
        )
    })
}

pub(super) fn object_init(host: &dyn NativeHost, _args: &[Object]) -> NativeResult {
    Ok(host.builtins().none())
}

/// `BaseException.__init__(self, *args)` records `args`.
pub(super) fn exception_init(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some((receiver, rest)) = args.split_first() else {
        return Err(raise(
            host,
            ExceptionKind::TypeError,
            "__init__() missing receiver",
        ));
    };
    receiver.set_attribute("args", host.builtins().tuple(rest.to_vec()));
    Ok(host.builtins().none())
}

pub(super) fn tuple_iter(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "__iter__", args, 1)?;
    iter(host, args)
}

pub(super) fn iterator_iter(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "__iter__", args, 1)?;
    Ok(args[0].clone())
}

pub(super) fn iterator_next(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    arity(host, "__next__", args, 1)?;
    let Some(cursor) = args[0].as_tuple_iterator() else {
        return Err(raise(
            host,
            ExceptionKind::TypeError,
            &format!("'{}' object is not an iterator", args[0].type_name()),
        ));
    };
    cursor
        .advance()
        .ok_or_else(|| raise(host, ExceptionKind::StopIteration, ""))
}

// Constructors. `args[0]` is the class being instantiated.

fn single_argument<'a>(
    host: &dyn NativeHost,
    name: &str,
    args: &'a [Object],
) -> Result<Option<&'a Object>, NativeError> {
    match args {
        [_class] => Ok(None),
        [_class, value] => Ok(Some(value)),
        _ => Err(raise(
            host,
            ExceptionKind::TypeError,
            &format!("{name}() takes at most 1 argument"),
        )),
    }
}

/// `type(x)` returns the class of `x`.
pub(super) fn type_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    match args {
        [_class, value] => Ok(value.class().unwrap_or_else(|| host.builtins().none())),
        _ => Err(raise(
            host,
            ExceptionKind::TypeError,
            "type() takes exactly 1 argument",
        )),
    }
}

pub(super) fn int_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some(value) = single_argument(host, "int", args)? else {
        return Ok(host.builtins().int(0));
    };
    let converted = match value.payload() {
        Payload::Int(number) => Some(*number),
        Payload::Bool(flag) => Some(i64::from(*flag)),
        #[allow(
            clippy::cast_possible_truncation,
            reason = "int() truncates toward zero after the range check"
        )]
        Payload::Float(number) if number.is_finite() && number.abs() < 9.2e18 => {
            Some(number.trunc() as i64)
        }
        Payload::Str(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    converted.map(|number| host.builtins().int(number)).ok_or_else(|| {
        raise(
            host,
            ExceptionKind::TypeError,
            &format!("int() cannot convert {}", value.repr_string()),
        )
    })
}

pub(super) fn float_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some(value) = single_argument(host, "float", args)? else {
        return Ok(host.builtins().float(0.0));
    };
    #[allow(
        clippy::cast_precision_loss,
        reason = "float() of a large int rounds, as the language does"
    )]
    let converted = match value.payload() {
        Payload::Float(number) => Some(*number),
        Payload::Int(number) => Some(*number as f64),
        Payload::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Payload::Str(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    converted.map(|number| host.builtins().float(number)).ok_or_else(|| {
        raise(
            host,
            ExceptionKind::TypeError,
            &format!("float() cannot convert {}", value.repr_string()),
        )
    })
}

pub(super) fn str_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some(value) = single_argument(host, "str", args)? else {
        return Ok(host.builtins().str(""));
    };
    if value.as_str().is_some() {
        return Ok(value.clone());
    }
    Ok(host.builtins().str(&value.display_string()))
}

pub(super) fn bool_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some(value) = single_argument(host, "bool", args)? else {
        return Ok(host.builtins().bool(false));
    };
    Ok(host.builtins().bool(value.native_truth().unwrap_or(true)))
}

pub(super) fn tuple_new(host: &dyn NativeHost, args: &[Object]) -> NativeResult {
    let Some(value) = single_argument(host, "tuple", args)? else {
        return Ok(host.builtins().tuple(Vec::new()));
    };
    if let Some(items) = value.as_tuple() {
        return Ok(host.builtins().tuple(items.to_vec()));
    }
    if let Some(cursor) = value.as_tuple_iterator() {
        let mut items = Vec::new();
        while let Some(item) = cursor.advance() {
            items.push(item);
        }
        return Ok(host.builtins().tuple(items));
    }
    Err(raise(
        host,
        ExceptionKind::TypeError,
        &format!("'{}' object is not iterable", value.type_name()),
    ))
}
