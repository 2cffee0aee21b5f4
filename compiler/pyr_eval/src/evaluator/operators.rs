//! Binary, unary and comparison operators, and the truth test.
//!
//! Native payloads are handled directly; anything else goes to the dunder
//! method its type defines, called by pushing `Call` Steps.

use std::cmp::Ordering;

use pyr_ir::{BinaryOp, CmpOp, UnaryOp};
use pyr_object::{BaseException, Builtins, Object, Payload};

use super::Evaluator;
use crate::errors::{
    overflow_error, type_error, unsupported_operands, zero_division_error, EvalResult,
};
use crate::step::Step;

/// A native operator result, or `None` when the operands have no native
/// implementation.
type NativeOutcome = Option<Result<Object, BaseException>>;

impl Evaluator<'_> {
    pub(super) fn binary(&mut self, op: BinaryOp) -> EvalResult {
        let right = self.pop_value("binary operator")?;
        let left = self.pop_value("binary operator")?;
        let builtins = self.builtins();
        if let Some(outcome) = native_binary(builtins, op, &left, &right) {
            self.push_value(outcome?);
            return Ok(());
        }
        match builtins.lookup(&left, op.dunder()) {
            Some(method) => {
                self.push_seq([Step::Push(method), Step::Push(right), Step::Call(1)])?;
                Ok(())
            }
            None => Err(unsupported_operands(
                builtins,
                op.as_symbol(),
                &left.type_name(),
                &right.type_name(),
            )
            .into()),
        }
    }

    pub(super) fn unary(&mut self, op: UnaryOp) -> EvalResult {
        let operand = self.pop_value("unary operator")?;
        let builtins = self.builtins();
        let Some(dunder) = op.dunder() else {
            // `not`: the operand was coerced by `ToBool`.
            let truth = operand.native_truth().unwrap_or(true);
            self.push_value(builtins.bool(!truth));
            return Ok(());
        };
        if let Some(outcome) = native_unary(builtins, op, &operand) {
            self.push_value(outcome?);
            return Ok(());
        }
        match builtins.lookup(&operand, dunder) {
            Some(method) => {
                self.push_seq([Step::Push(method), Step::Call(0)])?;
                Ok(())
            }
            None => Err(type_error(
                builtins,
                &format!(
                    "bad operand type for unary {}: '{}'",
                    op.as_symbol(),
                    operand.type_name()
                ),
            )
            .into()),
        }
    }

    pub(super) fn compare_op(&mut self, op: CmpOp) -> EvalResult {
        let right = self.pop_value("comparison")?;
        let left = self.pop_value("comparison")?;
        let builtins = self.builtins();
        let identical = left.is(&right);
        match op {
            CmpOp::Is => {
                self.push_value(builtins.bool(identical));
                return Ok(());
            }
            CmpOp::IsNot => {
                self.push_value(builtins.bool(!identical));
                return Ok(());
            }
            _ => {}
        }
        if let Some(result) = native_compare(op, &left, &right) {
            self.push_value(builtins.bool(result));
            return Ok(());
        }
        if let Some(method) = builtins.lookup(&left, compare_dunder(op)) {
            self.push_seq([Step::Push(method), Step::Push(right), Step::Call(1)])?;
            return Ok(());
        }
        match op {
            CmpOp::Eq => self.push_value(builtins.bool(identical)),
            CmpOp::NotEq => self.push_value(builtins.bool(!identical)),
            _ => {
                return Err(type_error(
                    builtins,
                    &format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op.as_symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                )
                .into())
            }
        }
        Ok(())
    }

    /// Replace the top value with `True` or `False`.
    ///
    /// Values without native truthiness ask `__bool__`, then `__len__`; the
    /// result is pushed back through `ToBool`.
    pub(super) fn to_bool(&mut self) -> EvalResult {
        let value = self.pop_value("truth test")?;
        let builtins = self.builtins();
        if let Some(truth) = value.native_truth() {
            self.push_value(builtins.bool(truth));
            return Ok(());
        }
        let hook = builtins
            .lookup(&value, "__bool__")
            .or_else(|| builtins.lookup(&value, "__len__"));
        match hook {
            Some(method) => {
                self.push_seq([Step::Push(method), Step::Call(0), Step::ToBool])?;
            }
            None => self.push_value(builtins.bool(true)),
        }
        Ok(())
    }
}

fn compare_dunder(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq | CmpOp::Is => "__eq__",
        CmpOp::NotEq | CmpOp::IsNot => "__ne__",
        CmpOp::Lt => "__lt__",
        CmpOp::LtE => "__le__",
        CmpOp::Gt => "__gt__",
        CmpOp::GtE => "__ge__",
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(object: &Object) -> Option<Number> {
        match object.payload() {
            Payload::Int(_) | Payload::Bool(_) => object.as_int().map(Number::Int),
            Payload::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "mixed int/float arithmetic rounds the int, as the language does"
    )]
    fn to_float(&self) -> f64 {
        match self {
            Number::Int(value) => *value as f64,
            Number::Float(value) => *value,
        }
    }
}

fn native_binary(builtins: &Builtins, op: BinaryOp, left: &Object, right: &Object) -> NativeOutcome {
    if let (Some(l), Some(r)) = (Number::of(left), Number::of(right)) {
        return match (l, r) {
            (Number::Int(l), Number::Int(r)) => int_binary(builtins, op, l, r),
            (l, r) => float_binary(builtins, op, l.to_float(), r.to_float()),
        };
    }
    match (left.payload(), right.payload(), op) {
        (Payload::Str(l), Payload::Str(r), BinaryOp::Add) => {
            Some(Ok(builtins.str(&format!("{l}{r}"))))
        }
        (Payload::Str(text), Payload::Int(count), BinaryOp::Mult)
        | (Payload::Int(count), Payload::Str(text), BinaryOp::Mult) => {
            let count = usize::try_from(*count).unwrap_or(0);
            Some(Ok(builtins.str(&text.repeat(count))))
        }
        (Payload::Tuple(l), Payload::Tuple(r), BinaryOp::Add) => {
            Some(Ok(builtins.tuple(l.iter().chain(r).cloned().collect())))
        }
        (Payload::Tuple(items), Payload::Int(count), BinaryOp::Mult)
        | (Payload::Int(count), Payload::Tuple(items), BinaryOp::Mult) => {
            let count = usize::try_from(*count).unwrap_or(0);
            let repeated = std::iter::repeat(items.iter().cloned())
                .take(count)
                .flatten()
                .collect();
            Some(Ok(builtins.tuple(repeated)))
        }
        _ => None,
    }
}

fn int_binary(builtins: &Builtins, op: BinaryOp, l: i64, r: i64) -> NativeOutcome {
    let overflow = || overflow_error(builtins, op.as_symbol());
    let checked = |value: Option<i64>| Some(value.map(|v| builtins.int(v)).ok_or_else(overflow));
    match op {
        BinaryOp::Add => checked(l.checked_add(r)),
        BinaryOp::Sub => checked(l.checked_sub(r)),
        BinaryOp::Mult => checked(l.checked_mul(r)),
        BinaryOp::Div => {
            if r == 0 {
                return Some(Err(zero_division_error(builtins, "division by zero")));
            }
            float_binary(builtins, op, Number::Int(l).to_float(), Number::Int(r).to_float())
        }
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if r == 0 {
                let what = if op == BinaryOp::Mod {
                    "integer modulo by zero"
                } else {
                    "integer division or modulo by zero"
                };
                return Some(Err(zero_division_error(builtins, what)));
            }
            let (Some(quotient), Some(remainder)) = (l.checked_div(r), l.checked_rem(r)) else {
                return Some(Err(overflow()));
            };
            // Round toward negative infinity.
            let (quotient, remainder) = if remainder != 0 && (remainder < 0) != (r < 0) {
                (quotient - 1, remainder + r)
            } else {
                (quotient, remainder)
            };
            Some(Ok(builtins.int(if op == BinaryOp::Mod { remainder } else { quotient })))
        }
        BinaryOp::Pow => match u32::try_from(r) {
            Ok(exponent) => checked(l.checked_pow(exponent)),
            Err(_) if r < 0 => {
                if l == 0 {
                    return Some(Err(zero_division_error(
                        builtins,
                        "0.0 cannot be raised to a negative power",
                    )));
                }
                float_binary(builtins, op, Number::Int(l).to_float(), Number::Int(r).to_float())
            }
            Err(_) => Some(Err(overflow())),
        },
        BinaryOp::LShift | BinaryOp::RShift => {
            let Ok(shift) = u32::try_from(r) else {
                return Some(Err(type_error(builtins, "negative shift count")));
            };
            if op == BinaryOp::LShift {
                let shifted = l.checked_shl(shift).filter(|v| v >> shift == l);
                checked(shifted)
            } else {
                checked(Some(l >> shift.min(63)))
            }
        }
        BinaryOp::BitOr => checked(Some(l | r)),
        BinaryOp::BitXor => checked(Some(l ^ r)),
        BinaryOp::BitAnd => checked(Some(l & r)),
        BinaryOp::MatMult => None,
    }
}

fn float_binary(builtins: &Builtins, op: BinaryOp, l: f64, r: f64) -> NativeOutcome {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mult => l * r,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if r == 0.0 => {
            return Some(Err(zero_division_error(builtins, "float division by zero")));
        }
        BinaryOp::Div => l / r,
        BinaryOp::FloorDiv => (l / r).floor(),
        BinaryOp::Mod => {
            let remainder = l % r;
            if remainder != 0.0 && (remainder < 0.0) != (r < 0.0) {
                remainder + r
            } else {
                remainder
            }
        }
        BinaryOp::Pow => l.powf(r),
        _ => return None,
    };
    Some(Ok(builtins.float(value)))
}

fn native_unary(builtins: &Builtins, op: UnaryOp, operand: &Object) -> NativeOutcome {
    match (Number::of(operand)?, op) {
        (Number::Int(value), UnaryOp::USub) => Some(
            value
                .checked_neg()
                .map(|v| builtins.int(v))
                .ok_or_else(|| overflow_error(builtins, op.as_symbol())),
        ),
        (Number::Int(value), UnaryOp::UAdd) => Some(Ok(builtins.int(value))),
        (Number::Int(value), UnaryOp::Invert) => Some(Ok(builtins.int(!value))),
        (Number::Float(value), UnaryOp::USub) => Some(Ok(builtins.float(-value))),
        (Number::Float(value), UnaryOp::UAdd) => Some(Ok(builtins.float(value))),
        (Number::Float(_), _) | (Number::Int(_), UnaryOp::Not) => None,
    }
}

fn native_compare(op: CmpOp, left: &Object, right: &Object) -> Option<bool> {
    let ordering = native_ordering(left, right);
    match op {
        CmpOp::Eq => native_equal(left, right),
        CmpOp::NotEq => native_equal(left, right).map(|equal| !equal),
        CmpOp::Lt => ordering.map(Ordering::is_lt),
        CmpOp::LtE => ordering.map(Ordering::is_le),
        CmpOp::Gt => ordering.map(Ordering::is_gt),
        CmpOp::GtE => ordering.map(Ordering::is_ge),
        CmpOp::Is | CmpOp::IsNot => None,
    }
}

fn native_equal(left: &Object, right: &Object) -> Option<bool> {
    if let (Some(l), Some(r)) = (Number::of(left), Number::of(right)) {
        return Some(match (l, r) {
            (Number::Int(l), Number::Int(r)) => l == r,
            (l, r) => l.to_float().partial_cmp(&r.to_float()) == Some(Ordering::Equal),
        });
    }
    match (left.payload(), right.payload()) {
        (Payload::Str(l), Payload::Str(r)) => Some(l == r),
        (Payload::None, Payload::None) => Some(true),
        (Payload::Tuple(l), Payload::Tuple(r)) => {
            if l.len() != r.len() {
                return Some(false);
            }
            let mut equal = true;
            for (l, r) in l.iter().zip(r) {
                equal &= l.is(r) || native_equal(l, r)?;
            }
            Some(equal)
        }
        (Payload::None | Payload::Str(_) | Payload::Tuple(_), _)
        | (_, Payload::None | Payload::Str(_) | Payload::Tuple(_))
            if Number::of(left).is_some() || Number::of(right).is_some() =>
        {
            Some(false)
        }
        _ => None,
    }
}

fn native_ordering(left: &Object, right: &Object) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (Number::of(left), Number::of(right)) {
        return match (l, r) {
            (Number::Int(l), Number::Int(r)) => Some(l.cmp(&r)),
            (l, r) => l.to_float().partial_cmp(&r.to_float()),
        };
    }
    match (left.payload(), right.payload()) {
        (Payload::Str(l), Payload::Str(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
