//! Parser module: recursive descent for programs, Pratt for expressions.

mod core;
mod expressions;
mod pratt;
mod precedence;
mod statements;


use crate::ast::Expr;
use crate::error::ParserError;

pub use self::core::{ParseResult, Parser};
pub use self::pratt::PrattParser;
pub use self::precedence::Precedence;

/// A parse result with every diagnostic collected along the way.
///
/// `ast` holds whatever could be recovered, even when `errors` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub ast: T,
    pub errors: Vec<ParserError>,
}

impl<T> Parsed<T> {
    pub fn new(ast: T, errors: Vec<ParserError>) -> Self {
        Self { ast, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<T, Vec<ParserError>> {
        if self.is_ok() {
            Ok(self.ast)
        } else {
            Err(self.errors)
        }
    }
}

impl Parsed<Option<Expr>> {
    /// Collapse an expression parse into the expression or its diagnostics.
    pub fn into_expression(self) -> Result<Expr, Vec<ParserError>> {
        match self.into_result()? {
            Some(expr) => Ok(expr),
            None => Err(vec![ParserError::expression_expected("end of input", 1)]),
        }
    }
}
