//! Expression evaluation: each node becomes Steps that leave its value on
//! the Value Stack.

use std::sync::Arc;

use pyr_ir::{BoolExpr, BoolOp, CompareExpr, Constant, Expr, UnaryOp};
use pyr_object::Object;

use super::Evaluator;
use crate::errors::{malformed, name_error, EvalResult, Fault};
use crate::step::Step;

impl Evaluator<'_> {
    pub(super) fn eval_expr(&mut self, expr: Expr) -> EvalResult {
        match expr {
            Expr::Constant(constant) => {
                let value = self.constant(&constant);
                self.push_value(value);
            }
            Expr::Name(name) => {
                let value = self.resolve_name(name.as_str())?;
                self.push_value(value);
            }
            Expr::Attribute(node) => {
                self.push_seq([Step::Eval(node.value.clone()), Step::GetAttr(node.attr.clone())])?;
            }
            Expr::Tuple(items) => {
                let steps: Vec<Step> = items
                    .iter()
                    .cloned()
                    .map(Step::Eval)
                    .chain([Step::BuildTuple(items.len())])
                    .collect();
                self.push_seq(steps)?;
            }
            Expr::BinOp(node) => {
                self.push_seq([
                    Step::Eval(node.left.clone()),
                    Step::Eval(node.right.clone()),
                    Step::Binary(node.op),
                ])?;
            }
            Expr::UnaryOp(node) => {
                let operand = Step::Eval(node.operand.clone());
                if node.op == UnaryOp::Not {
                    self.push_seq([operand, Step::ToBool, Step::Unary(UnaryOp::Not)])?;
                } else {
                    self.push_seq([operand, Step::Unary(node.op)])?;
                }
            }
            Expr::BoolOp(node) => self.eval_bool_op(node)?,
            Expr::Compare(node) => self.eval_compare(node)?,
            Expr::Call(node) => {
                let steps: Vec<Step> = std::iter::once(Step::Eval(node.func.clone()))
                    .chain(node.args.iter().cloned().map(Step::Eval))
                    .chain([Step::Call(node.args.len())])
                    .collect();
                self.push_seq(steps)?;
            }
        }
        Ok(())
    }

    fn constant(&self, constant: &Constant) -> Object {
        let builtins = self.builtins();
        match constant {
            Constant::None => builtins.none(),
            Constant::Bool(value) => builtins.bool(*value),
            Constant::Int(value) => builtins.int(*value),
            Constant::Float(value) => builtins.float(*value),
            Constant::Str(value) => builtins.str(value),
        }
    }

    /// Name lookup: the current namespace, the enclosing namespaces, the
    /// program namespace, then builtins.
    fn resolve_name(&mut self, name: &str) -> EvalResult<Object> {
        let scope = self
            .scopes
            .current_mut()
            .ok_or(Fault::NoActiveScope)?;
        if let Some(found) = scope.self_object().get_attribute(name) {
            return Ok(found);
        }
        if let Some(found) = scope
            .outer()
            .iter()
            .find_map(|namespace| namespace.get_attribute(name))
        {
            return Ok(found);
        }
        if let Some(found) = self.ctx.body().get_attribute(name) {
            return Ok(found);
        }
        self.builtins()
            .lookup_name(name)
            .ok_or_else(|| name_error(self.builtins(), name).into())
    }

    fn eval_bool_op(&mut self, node: Arc<BoolExpr>) -> EvalResult {
        let first = node.values.first().cloned().map(Step::Eval);
        match first {
            Some(first) => self.push_seq([first, Step::ShortCircuit { node, index: 0 }])?,
            None => {
                let empty = self.builtins().none();
                self.push_value(empty);
            }
        }
        Ok(())
    }

    /// `values[index]` is on the stack. The last operand's value is the
    /// result; otherwise test it.
    pub(super) fn short_circuit(&mut self, node: Arc<BoolExpr>, index: usize) -> EvalResult {
        if index + 1 < node.values.len() {
            self.push_seq([Step::Dup, Step::ToBool, Step::BoolDecide { node, index }])?;
        }
        Ok(())
    }

    /// Keep `values[index]` if it decides the operator, else evaluate the
    /// next operand in its place.
    pub(super) fn bool_decide(&mut self, node: Arc<BoolExpr>, index: usize) -> EvalResult {
        let truth = self.pop_flag("boolean operator")?;
        let decided = match node.op {
            BoolOp::And => !truth,
            BoolOp::Or => truth,
        };
        if decided {
            return Ok(());
        }
        self.pop_value("boolean operator")?;
        let next = index + 1;
        let operand = node
            .values
            .get(next)
            .cloned()
            .ok_or_else(|| malformed("boolean operator"))?;
        self.push_seq([Step::Eval(operand), Step::ShortCircuit { node, index: next }])?;
        Ok(())
    }

    fn eval_compare(&mut self, node: Arc<CompareExpr>) -> EvalResult {
        let Some(first) = node.comparators.first().cloned() else {
            return self.push_seq([Step::Eval(node.left.clone())]).map_err(Into::into);
        };
        self.push_seq([
            Step::Eval(node.left.clone()),
            Step::Eval(first),
            Step::Compare { node, index: 0 },
        ])?;
        Ok(())
    }

    /// `left` and `comparators[index]` are on the stack.
    ///
    /// A chain `a < b < c` keeps `b` for the next link and stops at the first
    /// false result.
    pub(super) fn compare(&mut self, node: Arc<CompareExpr>, index: usize) -> EvalResult {
        let op = node
            .ops
            .get(index)
            .copied()
            .ok_or_else(|| malformed("comparison"))?;
        if index + 1 >= node.comparators.len() {
            self.push(Step::CompareOp(op))?;
            return Ok(());
        }
        let right = self.pop_value("comparison")?;
        let left = self.pop_value("comparison")?;
        self.push_seq([
            Step::Push(right.clone()),
            Step::Push(left),
            Step::Push(right),
            Step::CompareOp(op),
            Step::Dup,
            Step::ToBool,
            Step::ChainDecide { node, index },
        ])?;
        Ok(())
    }

    pub(super) fn chain_decide(&mut self, node: Arc<CompareExpr>, index: usize) -> EvalResult {
        let truth = self.pop_flag("comparison chain")?;
        let result = self.pop_value("comparison chain")?;
        if !truth {
            self.pop_value("comparison chain")?;
            self.push_value(result);
            return Ok(());
        }
        let next = index + 1;
        let comparator = node
            .comparators
            .get(next)
            .cloned()
            .ok_or_else(|| malformed("comparison"))?;
        self.push_seq([Step::Eval(comparator), Step::Compare { node, index: next }])?;
        Ok(())
    }
}
