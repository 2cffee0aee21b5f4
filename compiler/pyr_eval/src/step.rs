//! Pending actions.
//!
//! A [`Step`] is consumed exactly once, when the dispatch loop pops it from
//! the current Frame. The set is closed and dispatched by exhaustive `match`;
//! [`Step::Deferred`] is the one opaque escape hatch.

use std::fmt;
use std::sync::Arc;

use pyr_ir::{
    Assert, BinaryOp, BoolExpr, CmpOp, CompareExpr, Expr, For, FunctionDef, If, Name, Stmt, Try,
    UnaryOp, While, With,
};
use pyr_object::Object;

use crate::errors::{EvalResult, Jump};
use crate::evaluator::Evaluator;

/// An opaque continuation.
pub(crate) type Deferred = Box<dyn FnOnce(&mut Evaluator<'_>) -> EvalResult>;

pub(crate) enum Step {
    /// Run a statement's handler.
    Stmt(Stmt),

    // Expressions and the value stack
    /// Evaluate an expression, leaving its value on the value stack.
    Eval(Expr),
    Push(Object),
    Dup,
    Discard,
    /// Pop a value and bind it to a target.
    Store(Expr),
    Delete(Expr),
    GetAttr(Name),
    SetAttr(Name),
    DelAttr(Name),
    BuildTuple(usize),
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// `values[index]` is on the stack; continue the boolean chain.
    ShortCircuit { node: Arc<BoolExpr>, index: usize },
    BoolDecide { node: Arc<BoolExpr>, index: usize },
    /// `left` and `comparators[index]` are on the stack.
    Compare { node: Arc<CompareExpr>, index: usize },
    CompareOp(CmpOp),
    ChainDecide { node: Arc<CompareExpr>, index: usize },
    /// Pop `n` arguments and a callee, then call.
    Call(usize),
    /// Replace the top value with its truth value.
    ToBool,

    // Statement continuations
    Branch(Arc<If>),
    ForStart(Arc<For>),
    ForNext { node: Arc<For>, iterator: Object },
    WhileTest(Arc<While>),
    WhileBranch(Arc<While>),
    TryRun(Arc<Try>),
    WithEnter { node: Arc<With>, index: usize },
    /// Resume a jump that ended a guarded block, once `finally` has run.
    Jump(Jump),
    Return,
    Raise { with_cause: bool },
    ReRaise,
    AssertCheck(Arc<Assert>),
    AssertFail,
    MakeFunction(Arc<FunctionDef>),
    /// Take a finished call's result from the return slot and restore the
    /// caller's pending value.
    CollectReturn { saved: Option<Object> },
    /// Move the top value into the return slot.
    SetResult,

    Deferred(Deferred),
}

impl Step {
    pub(crate) fn kind(&self) -> StepKind {
        match self {
            Step::Stmt(_) => StepKind::Stmt,
            Step::Eval(_) => StepKind::Eval,
            Step::Push(_) => StepKind::Push,
            Step::Dup => StepKind::Dup,
            Step::Discard => StepKind::Discard,
            Step::Store(_) => StepKind::Store,
            Step::Delete(_) => StepKind::Delete,
            Step::GetAttr(_) => StepKind::GetAttr,
            Step::SetAttr(_) => StepKind::SetAttr,
            Step::DelAttr(_) => StepKind::DelAttr,
            Step::BuildTuple(_) => StepKind::BuildTuple,
            Step::Binary(_) => StepKind::Binary,
            Step::Unary(_) => StepKind::Unary,
            Step::ShortCircuit { .. } => StepKind::ShortCircuit,
            Step::BoolDecide { .. } => StepKind::BoolDecide,
            Step::Compare { .. } => StepKind::Compare,
            Step::CompareOp(_) => StepKind::CompareOp,
            Step::ChainDecide { .. } => StepKind::ChainDecide,
            Step::Call(_) => StepKind::Call,
            Step::ToBool => StepKind::ToBool,
            Step::Branch(_) => StepKind::Branch,
            Step::ForStart(_) => StepKind::ForStart,
            Step::ForNext { .. } => StepKind::ForNext,
            Step::WhileTest(_) => StepKind::WhileTest,
            Step::WhileBranch(_) => StepKind::WhileBranch,
            Step::TryRun(_) => StepKind::TryRun,
            Step::WithEnter { .. } => StepKind::WithEnter,
            Step::Jump(_) => StepKind::Jump,
            Step::Return => StepKind::Return,
            Step::Raise { .. } => StepKind::Raise,
            Step::ReRaise => StepKind::ReRaise,
            Step::AssertCheck(_) => StepKind::AssertCheck,
            Step::AssertFail => StepKind::AssertFail,
            Step::MakeFunction(_) => StepKind::MakeFunction,
            Step::CollectReturn { .. } => StepKind::CollectReturn,
            Step::SetResult => StepKind::SetResult,
            Step::Deferred(_) => StepKind::Deferred,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Stmt(stmt) => write!(f, "Stmt({})", stmt.kind_name()),
            Step::GetAttr(name) | Step::SetAttr(name) | Step::DelAttr(name) => {
                write!(f, "{}({name})", self.kind().name())
            }
            Step::Call(argc) => write!(f, "Call({argc})"),
            Step::Jump(jump) => write!(f, "Jump({jump})"),
            _ => f.write_str(self.kind().name()),
        }
    }
}

/// Fieldless mirror of [`Step`], for counters and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    Stmt,
    Eval,
    Push,
    Dup,
    Discard,
    Store,
    Delete,
    GetAttr,
    SetAttr,
    DelAttr,
    BuildTuple,
    Binary,
    Unary,
    ShortCircuit,
    BoolDecide,
    Compare,
    CompareOp,
    ChainDecide,
    Call,
    ToBool,
    Branch,
    ForStart,
    ForNext,
    WhileTest,
    WhileBranch,
    TryRun,
    WithEnter,
    Jump,
    Return,
    Raise,
    ReRaise,
    AssertCheck,
    AssertFail,
    MakeFunction,
    CollectReturn,
    SetResult,
    Deferred,
}

impl StepKind {
    pub const COUNT: usize = 37;

    pub const ALL: [StepKind; StepKind::COUNT] = [
        StepKind::Stmt,
        StepKind::Eval,
        StepKind::Push,
        StepKind::Dup,
        StepKind::Discard,
        StepKind::Store,
        StepKind::Delete,
        StepKind::GetAttr,
        StepKind::SetAttr,
        StepKind::DelAttr,
        StepKind::BuildTuple,
        StepKind::Binary,
        StepKind::Unary,
        StepKind::ShortCircuit,
        StepKind::BoolDecide,
        StepKind::Compare,
        StepKind::CompareOp,
        StepKind::ChainDecide,
        StepKind::Call,
        StepKind::ToBool,
        StepKind::Branch,
        StepKind::ForStart,
        StepKind::ForNext,
        StepKind::WhileTest,
        StepKind::WhileBranch,
        StepKind::TryRun,
        StepKind::WithEnter,
        StepKind::Jump,
        StepKind::Return,
        StepKind::Raise,
        StepKind::ReRaise,
        StepKind::AssertCheck,
        StepKind::AssertFail,
        StepKind::MakeFunction,
        StepKind::CollectReturn,
        StepKind::SetResult,
        StepKind::Deferred,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StepKind::Stmt => "Stmt",
            StepKind::Eval => "Eval",
            StepKind::Push => "Push",
            StepKind::Dup => "Dup",
            StepKind::Discard => "Discard",
            StepKind::Store => "Store",
            StepKind::Delete => "Delete",
            StepKind::GetAttr => "GetAttr",
            StepKind::SetAttr => "SetAttr",
            StepKind::DelAttr => "DelAttr",
            StepKind::BuildTuple => "BuildTuple",
            StepKind::Binary => "Binary",
            StepKind::Unary => "Unary",
            StepKind::ShortCircuit => "ShortCircuit",
            StepKind::BoolDecide => "BoolDecide",
            StepKind::Compare => "Compare",
            StepKind::CompareOp => "CompareOp",
            StepKind::ChainDecide => "ChainDecide",
            StepKind::Call => "Call",
            StepKind::ToBool => "ToBool",
            StepKind::Branch => "Branch",
            StepKind::ForStart => "ForStart",
            StepKind::ForNext => "ForNext",
            StepKind::WhileTest => "WhileTest",
            StepKind::WhileBranch => "WhileBranch",
            StepKind::TryRun => "TryRun",
            StepKind::WithEnter => "WithEnter",
            StepKind::Jump => "Jump",
            StepKind::Return => "Return",
            StepKind::Raise => "Raise",
            StepKind::ReRaise => "ReRaise",
            StepKind::AssertCheck => "AssertCheck",
            StepKind::AssertFail => "AssertFail",
            StepKind::MakeFunction => "MakeFunction",
            StepKind::CollectReturn => "CollectReturn",
            StepKind::SetResult => "SetResult",
            StepKind::Deferred => "Deferred",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
