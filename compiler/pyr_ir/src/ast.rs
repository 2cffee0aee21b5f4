//! Statement and expression nodes.

use std::sync::Arc;

use crate::{BinaryOp, BoolOp, CmpOp, Name, UnaryOp};

// Entry nodes

/// A complete program.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    /// Leading string literal of the module, bound as `__doc__`.
    pub docstring: Option<Arc<str>>,
}

/// One unit of interactive input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interactive {
    pub body: Vec<Stmt>,
}

/// A single expression evaluated for its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub body: Expr,
}

// Statements

/// A statement node.
///
/// Compound statements are held behind `Arc` so the evaluator can keep a
/// node alive inside a pending step (loops re-push themselves).
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    FunctionDef(Arc<FunctionDef>),
    AsyncFunctionDef(Arc<FunctionDef>),
    ClassDef(Arc<ClassDef>),
    Return(Option<Expr>),
    Delete(Arc<Delete>),
    Assign(Arc<Assign>),
    AugAssign(Arc<AugAssign>),
    AnnAssign(Arc<AnnAssign>),
    For(Arc<For>),
    AsyncFor(Arc<For>),
    While(Arc<While>),
    If(Arc<If>),
    With(Arc<With>),
    AsyncWith(Arc<With>),
    Raise(Arc<Raise>),
    Try(Arc<Try>),
    Assert(Arc<Assert>),
    Import(Arc<Import>),
    ImportFrom(Arc<ImportFrom>),
    Global(Vec<Name>),
    Nonlocal(Vec<Name>),
    /// An expression evaluated for its side effects.
    Expr(Expr),
    Pass,
    Break,
    Continue,
}

impl Stmt {
    /// Short kind name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::FunctionDef(_) => "FunctionDef",
            Stmt::AsyncFunctionDef(_) => "AsyncFunctionDef",
            Stmt::ClassDef(_) => "ClassDef",
            Stmt::Return(_) => "Return",
            Stmt::Delete(_) => "Delete",
            Stmt::Assign(_) => "Assign",
            Stmt::AugAssign(_) => "AugAssign",
            Stmt::AnnAssign(_) => "AnnAssign",
            Stmt::For(_) => "For",
            Stmt::AsyncFor(_) => "AsyncFor",
            Stmt::While(_) => "While",
            Stmt::If(_) => "If",
            Stmt::With(_) => "With",
            Stmt::AsyncWith(_) => "AsyncWith",
            Stmt::Raise(_) => "Raise",
            Stmt::Try(_) => "Try",
            Stmt::Assert(_) => "Assert",
            Stmt::Import(_) => "Import",
            Stmt::ImportFrom(_) => "ImportFrom",
            Stmt::Global(_) => "Global",
            Stmt::Nonlocal(_) => "Nonlocal",
            Stmt::Expr(_) => "Expr",
            Stmt::Pass => "Pass",
            Stmt::Break => "Break",
            Stmt::Continue => "Continue",
        }
    }
}

/// `def name(args): body`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Name,
    pub args: Arguments,
    pub body: Vec<Stmt>,
    pub decorator_list: Vec<Expr>,
    pub returns: Option<Expr>,
    pub docstring: Option<Arc<str>>,
}

/// Positional parameter list.
///
/// `defaults` line up with the *last* `defaults.len()` entries of `args`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    pub args: Vec<Arg>,
    pub defaults: Vec<Expr>,
    pub vararg: Option<Name>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub name: Name,
    pub annotation: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: Name,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub decorator_list: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    pub targets: Vec<Expr>,
}

/// `t1 = t2 = value`
#[derive(Clone, Debug, PartialEq)]
pub struct Assign {
    pub targets: Vec<Expr>,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AugAssign {
    pub target: Expr,
    pub op: BinaryOp,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnAssign {
    pub target: Expr,
    pub annotation: Expr,
    pub value: Option<Expr>,
}

/// `for target in iter: body else: orelse`
#[derive(Clone, Debug, PartialEq)]
pub struct For {
    pub target: Expr,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct While {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Vec<Stmt>,
}

/// `context_expr as optional_vars`
#[derive(Clone, Debug, PartialEq)]
pub struct WithItem {
    pub context_expr: Expr,
    pub optional_vars: Option<Expr>,
}

/// `raise`, `raise exc` or `raise exc from cause`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Raise {
    pub exc: Option<Expr>,
    pub cause: Option<Expr>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Try {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<Stmt>,
    pub finalbody: Vec<Stmt>,
}

/// `except type_ as name: body`; a missing `type_` catches everything.
#[derive(Clone, Debug, PartialEq)]
pub struct ExceptHandler {
    pub type_: Option<Expr>,
    pub name: Option<Name>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assert {
    pub test: Expr,
    pub msg: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    pub names: Vec<Alias>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportFrom {
    pub module: Name,
    pub names: Vec<Alias>,
    pub level: u32,
}

/// `name as asname`
#[derive(Clone, Debug, PartialEq)]
pub struct Alias {
    pub name: Name,
    pub asname: Option<Name>,
}

impl Alias {
    /// The name this alias binds in the importing namespace.
    pub fn bound_name(&self) -> &Name {
        self.asname.as_ref().unwrap_or(&self.name)
    }
}

// Expressions

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(Constant),
    Name(Name),
    Attribute(Arc<AttributeExpr>),
    Tuple(Arc<[Expr]>),
    BinOp(Arc<BinaryExpr>),
    UnaryOp(Arc<UnaryExpr>),
    BoolOp(Arc<BoolExpr>),
    Compare(Arc<CompareExpr>),
    Call(Arc<CallExpr>),
}

/// Literal constants.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
}

/// `value.attr`
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeExpr {
    pub value: Expr,
    pub attr: Name,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub left: Expr,
    pub op: BinaryOp,
    pub right: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
}

/// `a and b and c`: at least two values.
#[derive(Clone, Debug, PartialEq)]
pub struct BoolExpr {
    pub op: BoolOp,
    pub values: Vec<Expr>,
}

/// `left op0 c0 op1 c1 ...`
#[derive(Clone, Debug, PartialEq)]
pub struct CompareExpr {
    pub left: Expr,
    pub ops: Vec<CmpOp>,
    pub comparators: Vec<Expr>,
}

/// `func(args...)`
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    pub func: Expr,
    pub args: Vec<Expr>,
}
