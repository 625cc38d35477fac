//! Syntax tree for the Foolish language.
//!
//! The tree is produced by an external parser and handed to the execution
//! core as-is. Nodes are immutable and shared through [`ExprRef`]
//! (`Arc<Expr>`), so the core can keep a handle on the syntax it wraps
//! without copying subtrees.
//!
//! The whole tree is serde-serializable; front ends that live in another
//! process hand it over as JSON.

pub mod ast;
pub mod constructors;
mod display;

pub use ast::{
    Assignment, BinaryOp, Brane, ConditionalStage, DetachmentBrane, DetachmentStatement, Expr,
    ExprRef, Identifier, IfExpr, SearchExpr, SearchOperator, UnaryOp,
};
