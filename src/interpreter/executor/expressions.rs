//! Expression evaluation.

use std::io::Write;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::value::Value;

use super::{Interpreter, RuntimeResult};

impl<W: Write> Interpreter<W> {
    /// Evaluate an expression against the current scope.
    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        let line = expr.line;

        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                self.evaluate_unary(*operator, value, line)
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.evaluate_binary(*operator, &left, &right, line)
            }

            ExprKind::Variable(name) => self
                .environment
                .borrow()
                .get(name)
                .ok_or_else(|| RuntimeError::undefined_variable(name.as_str(), line)),

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                if self.environment.borrow_mut().assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::undefined_variable(name.as_str(), line))
                }
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
        }
    }
}
