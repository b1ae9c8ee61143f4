//! Abstract Syntax Tree.

pub mod expr;
pub mod stmt;

pub use expr::{BinaryOp, Expr, ExprKind, LogicalOp, UnaryOp};
pub use stmt::{Program, Stmt, StmtKind};
