//! Attribute resolution.
//!
//! 1. An instance-level `__getattribute__` that is not the default marker
//!    handles the lookup.
//! 2. Otherwise the first `__getattribute__` along the type's MRO decides:
//!    the default marker means plain lookup, anything else is called.
//! 3. Plain lookup: the object, then its type's MRO, then a `__getattr__`
//!    hook from the MRO, else `AttributeError`.
//!
//! The marker is recognised by identity, so the default getter never calls
//! itself.

use pyr_object::Object;

use super::Evaluator;
use crate::errors::{attribute_error, EvalResult};

impl Evaluator<'_> {
    pub(crate) fn lookup_attribute(&mut self, object: &Object, name: &str) -> EvalResult<Object> {
        let builtins = self.builtins();
        let marker = builtins.default_getattribute();

        if !object.is_type() {
            if let Some(getter) = object.get_attribute("__getattribute__") {
                if !getter.is(marker) {
                    return self.call_guarded(getter, vec![builtins.str(name)]);
                }
            }
        }

        let mro = object.type_mro();
        let getter = mro
            .iter()
            .find_map(|class| class.get_attribute("__getattribute__"));
        if let Some(getter) = getter {
            if !getter.is(marker) {
                return self.call_guarded(getter, vec![object.clone(), builtins.str(name)]);
            }
        }

        if let Some(found) = builtins.lookup(object, name) {
            return Ok(found);
        }
        if let Some(hook) = mro.iter().find_map(|class| class.get_attribute("__getattr__")) {
            return self.call_guarded(hook, vec![object.clone(), builtins.str(name)]);
        }
        Err(attribute_error(builtins, &object.type_name(), name).into())
    }
}
