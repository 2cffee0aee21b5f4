//! Assignment and deletion targets.

use pyr_ir::{Expr, Name};
use pyr_object::Object;

use super::Evaluator;
use crate::errors::{attribute_error, name_error, type_error, EvalResult};
use crate::step::Step;

impl Evaluator<'_> {
    /// Pop a value and bind it to `target`.
    pub(super) fn store(&mut self, target: Expr) -> EvalResult {
        match target {
            Expr::Name(name) => {
                let value = self.pop_value("store")?;
                self.self_object()?.set_attribute(name, value);
            }
            Expr::Attribute(node) => {
                self.push_seq([Step::Eval(node.value.clone()), Step::SetAttr(node.attr.clone())])?;
            }
            Expr::Tuple(targets) => {
                let value = self.pop_value("unpack")?;
                let items = self.unpack(&value, targets.len())?;
                let mut steps = Vec::with_capacity(targets.len() * 2);
                for (item, target) in items.into_iter().zip(targets.iter()) {
                    steps.push(Step::Push(item));
                    steps.push(Step::Store(target.clone()));
                }
                self.push_seq(steps)?;
            }
            _ => return Err(type_error(self.builtins(), "cannot assign to expression").into()),
        }
        Ok(())
    }

    fn unpack(&self, value: &Object, expected: usize) -> EvalResult<Vec<Object>> {
        let items = if let Some(items) = value.as_tuple() {
            items.to_vec()
        } else if let Some(cursor) = value.as_tuple_iterator() {
            std::iter::from_fn(|| cursor.advance()).collect()
        } else {
            return Err(type_error(
                self.builtins(),
                &format!("cannot unpack non-iterable {} object", value.type_name()),
            )
            .into());
        };
        if items.len() != expected {
            return Err(type_error(
                self.builtins(),
                &format!(
                    "expected {expected} values to unpack, got {}",
                    items.len()
                ),
            )
            .into());
        }
        Ok(items)
    }

    /// Stack: value, object.
    pub(super) fn set_attr(&mut self, name: &Name) -> EvalResult {
        let object = self.pop_value("attribute store")?;
        let value = self.pop_value("attribute store")?;
        if object.is_type() && object.is_pinned() {
            return Err(type_error(
                self.builtins(),
                &format!(
                    "cannot set '{name}' attribute of immutable type '{}'",
                    object.name().unwrap_or_default()
                ),
            )
            .into());
        }
        object.set_attribute(name.clone(), value);
        Ok(())
    }

    pub(super) fn delete(&mut self, target: Expr) -> EvalResult {
        match target {
            Expr::Name(name) => {
                if self.self_object()?.delete_attribute(name.as_str()).is_none() {
                    return Err(name_error(self.builtins(), name.as_str()).into());
                }
            }
            Expr::Attribute(node) => {
                self.push_seq([Step::Eval(node.value.clone()), Step::DelAttr(node.attr.clone())])?;
            }
            Expr::Tuple(targets) => {
                self.push_seq(targets.iter().cloned().map(Step::Delete))?;
            }
            _ => return Err(type_error(self.builtins(), "cannot delete expression").into()),
        }
        Ok(())
    }

    pub(super) fn del_attr(&mut self, name: &Name) -> EvalResult {
        let object = self.pop_value("attribute delete")?;
        if object.delete_attribute(name.as_str()).is_none() {
            return Err(attribute_error(self.builtins(), &object.type_name(), name.as_str()).into());
        }
        Ok(())
    }
}
