//! The call protocol and function creation.
//!
//! A user-function call does not recurse: it pushes `CollectReturn` in the
//! caller's Frame, enters a new Scope and pushes the body. The return slot
//! is saved in that Step and restored when the result is collected, so a
//! nested call never clobbers a return that is still pending.

use std::sync::Arc;

use pyr_ir::{Expr, FunctionDef, Name};
use pyr_object::{FunctionCode, NativeError, Object, Payload};

use super::{Args, Evaluator};
use crate::errors::{recursion_error, type_error, EvalResult, Fault, Unwind};
use crate::scopes::Scope;
use crate::step::Step;

impl Evaluator<'_> {
    /// Stack: callee, then `argc` arguments.
    pub(super) fn call_step(&mut self, argc: usize) -> EvalResult {
        let args = self.pop_values(argc, "call arguments")?;
        let callee = self.pop_value("callee")?;
        self.invoke(callee, args)
    }

    fn invoke(&mut self, callee: Object, mut args: Args) -> EvalResult {
        match callee.payload() {
            Payload::Method(method) => {
                args.insert(0, method.receiver.clone());
                let function = method.function.clone();
                self.invoke(function, args)
            }
            Payload::Native(native) => {
                let func = native.func;
                match func(&*self, &args) {
                    Ok(result) => {
                        self.push_value(result);
                        Ok(())
                    }
                    Err(NativeError::Raise(exception)) => Err(Unwind::Raise(exception)),
                    Err(NativeError::Host(message)) => Err(Fault::Host(message).into()),
                }
            }
            Payload::Function(code) => {
                let code = code.clone();
                self.call_function(&callee, &code, args)
            }
            _ if callee.is_type() => self.instantiate(callee.clone(), args),
            _ => Err(type_error(
                self.builtins(),
                &format!("'{}' object is not callable", callee.type_name()),
            )
            .into()),
        }
    }

    fn call_function(&mut self, callee: &Object, code: &FunctionCode, args: Args) -> EvalResult {
        if let Some(limit) = self.ctx.limits().max_scope_depth {
            if self.call_depth() >= limit {
                return Err(recursion_error(self.builtins(), limit).into());
            }
        }
        let qualname: Arc<str> = callee
            .get_attribute("__qualname__")
            .and_then(|name| name.as_str().map(Arc::from))
            .unwrap_or_else(|| Arc::from(code.def.name.as_str()));
        let bindings = self.bind_arguments(callee, &code.def, &qualname, args)?;

        let saved = self.ctx.replace_return(None);
        self.push(Step::CollectReturn { saved })?;
        self.scopes
            .enter_scope(Scope::function(Arc::from(code.closure.as_slice()), qualname));
        self.scopes.enter()?;
        if !bindings.is_empty() {
            let namespace = self.self_object()?;
            for (name, value) in bindings {
                namespace.set_attribute(name, value);
            }
        }
        self.push_body(&code.def.body)?;
        Ok(())
    }

    /// Positional binding with trailing defaults and an optional `*args`.
    fn bind_arguments(
        &self,
        callee: &Object,
        def: &FunctionDef,
        qualname: &str,
        args: Args,
    ) -> EvalResult<Vec<(Name, Object)>> {
        let params = &def.args.args;
        let builtins = self.builtins();
        if args.len() > params.len() && def.args.vararg.is_none() {
            return Err(type_error(
                builtins,
                &format!(
                    "{qualname}() takes {} positional arguments but {} were given",
                    params.len(),
                    args.len()
                ),
            )
            .into());
        }
        let defaults: Vec<Object> = callee
            .get_attribute("__defaults__")
            .and_then(|defaults| defaults.as_tuple().map(<[Object]>::to_vec))
            .unwrap_or_default();
        let first_default = params.len().saturating_sub(defaults.len());

        let mut args = args.into_iter();
        let mut bindings = Vec::with_capacity(params.len() + 1);
        for (index, param) in params.iter().enumerate() {
            let value = match args.next() {
                Some(value) => value,
                None if index >= first_default => defaults[index - first_default].clone(),
                None => {
                    return Err(type_error(
                        builtins,
                        &format!(
                            "{qualname}() missing required positional argument: '{}'",
                            param.name
                        ),
                    )
                    .into())
                }
            };
            bindings.push((param.name.clone(), value));
        }
        if let Some(vararg) = &def.args.vararg {
            bindings.push((vararg.clone(), builtins.tuple(args.collect())));
        }
        Ok(bindings)
    }

    /// Calling a class: a native `__new__` on its MRO builds the value;
    /// otherwise a plain instance is created and `__init__` is called on it.
    fn instantiate(&mut self, class: Object, args: Args) -> EvalResult {
        let constructor = class.own_mro().iter().find_map(|base| {
            base.get_attribute("__new__")
                .filter(|new| new.as_native().is_some())
        });
        if let Some(constructor) = constructor {
            let mut with_class = Args::with_capacity(args.len() + 1);
            with_class.push(class);
            with_class.extend(args);
            return self.invoke(constructor, with_class);
        }

        let instance = Object::new(Payload::Plain, Some(&class));
        let Some(init) = self.builtins().lookup(&instance, "__init__") else {
            self.push_value(instance);
            return Ok(());
        };
        let argc = args.len();
        let steps: Vec<Step> = std::iter::once(Step::Push(init))
            .chain(args.into_iter().map(Step::Push))
            .chain([Step::Call(argc), Step::Discard, Step::Push(instance)])
            .collect();
        self.push_seq(steps)?;
        Ok(())
    }

    /// Stack: decorator values, then default values. Builds the function and
    /// applies decorators innermost first.
    pub(super) fn make_function(&mut self, def: Arc<FunctionDef>) -> EvalResult {
        let defaults = self.pop_values(def.args.defaults.len(), "function defaults")?;
        let builtins = self.builtins();
        let scope = self.scopes.current_mut().ok_or(Fault::NoActiveScope)?;
        let namespace = scope.self_object();
        let qualname = match scope.qualname() {
            Some(outer) => format!("{outer}.<locals>.{}", def.name),
            None => def.name.to_string(),
        };
        let closure: Vec<Object> = std::iter::once(namespace.clone())
            .chain(scope.outer().iter().cloned())
            .collect();

        let function = Object::new(
            Payload::Function(FunctionCode {
                def: Arc::clone(&def),
                closure,
            }),
            Some(builtins.function_type()),
        );
        let body = self.ctx.body();
        let module = body
            .get_attribute("__name__")
            .unwrap_or_else(|| builtins.none());
        let doc = match &def.docstring {
            Some(doc) => builtins.str(doc),
            None => builtins.none(),
        };
        function.set_attribute("__name__", builtins.str(def.name.as_str()));
        function.set_attribute("__qualname__", builtins.str(&qualname));
        function.set_attribute("__module__", module);
        function.set_attribute("__doc__", doc);
        function.set_attribute("__defaults__", builtins.tuple(defaults.into_vec()));
        function.set_attribute("__code__", builtins.none());
        function.set_attribute("__globals__", body.clone());
        function.set_attribute("__closure__", namespace);
        tracing::debug!(function = %qualname, "function defined");

        let steps: Vec<Step> = std::iter::once(Step::Push(function))
            .chain(def.decorator_list.iter().map(|_| Step::Call(1)))
            .chain([Step::Store(Expr::Name(def.name.clone()))])
            .collect();
        self.push_seq(steps)?;
        Ok(())
    }
}
