//! Pyr IR - the node tree executed by the Pyrite engine.
//!
//! The parser is an external collaborator; this crate only defines the shapes
//! it produces. Every compound node sits behind an `Arc`, so cloning a `Stmt`
//! or an `Expr` is a reference-count bump. Pending evaluator steps hold node
//! clones instead of borrowing the tree, which lets a step outlive the call
//! that pushed it.
//!
//! # Entry nodes
//!
//! - [`Module`]: a whole program, with an optional docstring
//! - [`Interactive`]: one interactive unit (no docstring handling)
//! - [`Expression`]: a single top-level expression whose value is the result

mod ast;
pub mod build;
mod name;
mod operators;

pub use ast::{
    Alias, Arg, Arguments, Assert, Assign, AttributeExpr, AugAssign, AnnAssign, BinaryExpr,
    BoolExpr, CallExpr, ClassDef, CompareExpr, Constant, Delete, ExceptHandler, Expr, Expression,
    For, FunctionDef, If, Import, ImportFrom, Interactive, Module, Raise, Stmt, Try, UnaryExpr,
    While, With, WithItem,
};
pub use name::Name;
pub use operators::{BinaryOp, BoolOp, CmpOp, UnaryOp};
