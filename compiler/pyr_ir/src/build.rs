//! Free-function constructors for node trees.
//!
//! Drivers and tests build trees by hand without a parser; these keep that
//! readable:
//!
//! ```text
//! let program = module(vec![
//!     assign(name("x"), int(1)),
//!     expr_stmt(call(name("print"), vec![name("x")])),
//! ]);
//! ```

use std::sync::Arc;

use crate::{
    Alias, Arg, Arguments, Assert, Assign, AttributeExpr, BinaryExpr, BinaryOp, BoolExpr, BoolOp,
    CallExpr, CmpOp, CompareExpr, Constant, Delete, ExceptHandler, Expr, Expression, For,
    FunctionDef, If, Import, ImportFrom, Interactive, Module, Name, Raise, Stmt, Try, UnaryExpr,
    UnaryOp, While, With, WithItem,
};

pub fn module(body: Vec<Stmt>) -> Module {
    Module {
        body,
        docstring: None,
    }
}

pub fn module_with_doc(doc: &str, body: Vec<Stmt>) -> Module {
    Module {
        body,
        docstring: Some(Arc::from(doc)),
    }
}

pub fn interactive(body: Vec<Stmt>) -> Interactive {
    Interactive { body }
}

pub fn expression(body: Expr) -> Expression {
    Expression { body }
}

// Expressions

pub fn name(id: &str) -> Expr {
    Expr::Name(Name::new(id))
}

pub fn none() -> Expr {
    Expr::Constant(Constant::None)
}

pub fn boolean(value: bool) -> Expr {
    Expr::Constant(Constant::Bool(value))
}

pub fn int(value: i64) -> Expr {
    Expr::Constant(Constant::Int(value))
}

pub fn float(value: f64) -> Expr {
    Expr::Constant(Constant::Float(value))
}

pub fn string(value: &str) -> Expr {
    Expr::Constant(Constant::Str(Arc::from(value)))
}

pub fn attr(value: Expr, attr: &str) -> Expr {
    Expr::Attribute(Arc::new(AttributeExpr {
        value,
        attr: Name::new(attr),
    }))
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    Expr::Tuple(Arc::from(items))
}

pub fn binop(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::BinOp(Arc::new(BinaryExpr { left, op, right }))
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::UnaryOp(Arc::new(UnaryExpr { op, operand }))
}

pub fn boolop(op: BoolOp, values: Vec<Expr>) -> Expr {
    Expr::BoolOp(Arc::new(BoolExpr { op, values }))
}

pub fn compare(left: Expr, op: CmpOp, right: Expr) -> Expr {
    Expr::Compare(Arc::new(CompareExpr {
        left,
        ops: vec![op],
        comparators: vec![right],
    }))
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(Arc::new(CallExpr { func, args }))
}

// Statements

pub fn expr_stmt(value: Expr) -> Stmt {
    Stmt::Expr(value)
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    assign_many(vec![target], value)
}

pub fn assign_many(targets: Vec<Expr>, value: Expr) -> Stmt {
    Stmt::Assign(Arc::new(Assign { targets, value }))
}

pub fn delete(targets: Vec<Expr>) -> Stmt {
    Stmt::Delete(Arc::new(Delete { targets }))
}

pub fn for_loop(target: Expr, iter: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
    Stmt::For(Arc::new(For {
        target,
        iter,
        body,
        orelse,
    }))
}

pub fn while_loop(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
    Stmt::While(Arc::new(While { test, body, orelse }))
}

pub fn if_stmt(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
    Stmt::If(Arc::new(If { test, body, orelse }))
}

pub fn with_stmt(items: Vec<(Expr, Option<Expr>)>, body: Vec<Stmt>) -> Stmt {
    let items = items
        .into_iter()
        .map(|(context_expr, optional_vars)| WithItem {
            context_expr,
            optional_vars,
        })
        .collect();
    Stmt::With(Arc::new(With { items, body }))
}

pub fn raise(exc: Option<Expr>, cause: Option<Expr>) -> Stmt {
    Stmt::Raise(Arc::new(Raise { exc, cause }))
}

pub fn try_stmt(
    body: Vec<Stmt>,
    handlers: Vec<ExceptHandler>,
    orelse: Vec<Stmt>,
    finalbody: Vec<Stmt>,
) -> Stmt {
    Stmt::Try(Arc::new(Try {
        body,
        handlers,
        orelse,
        finalbody,
    }))
}

pub fn handler(type_: Option<Expr>, bind: Option<&str>, body: Vec<Stmt>) -> ExceptHandler {
    ExceptHandler {
        type_,
        name: bind.map(Name::new),
        body,
    }
}

pub fn assert_stmt(test: Expr, msg: Option<Expr>) -> Stmt {
    Stmt::Assert(Arc::new(Assert { test, msg }))
}

pub fn return_stmt(value: Option<Expr>) -> Stmt {
    Stmt::Return(value)
}

pub fn alias(name: &str, asname: Option<&str>) -> Alias {
    Alias {
        name: Name::new(name),
        asname: asname.map(Name::new),
    }
}

pub fn import(names: Vec<Alias>) -> Stmt {
    Stmt::Import(Arc::new(Import { names }))
}

pub fn import_from(module: &str, names: Vec<Alias>) -> Stmt {
    Stmt::ImportFrom(Arc::new(ImportFrom {
        module: Name::new(module),
        names,
        level: 0,
    }))
}

/// `def name(params): body` with no defaults, decorators or annotations.
pub fn function_def(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
    Stmt::FunctionDef(Arc::new(function(name, params, body)))
}

/// The bare `FunctionDef` node, for callers that fill in more fields.
pub fn function(name: &str, params: &[&str], body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        name: Name::new(name),
        args: Arguments {
            args: params
                .iter()
                .map(|param| Arg {
                    name: Name::new(param),
                    annotation: None,
                })
                .collect(),
            defaults: Vec::new(),
            vararg: None,
        },
        body,
        decorator_list: Vec::new(),
        returns: None,
        docstring: None,
    }
}

#[cfg(test)]
mod tests;
