//! Statement execution.

use std::io::Write;

use crate::ast::*;
use crate::interpreter::environment::Environment;
use crate::value::Value;

use super::{Interpreter, RuntimeResult};

impl<W: Write> Interpreter<W> {
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<()> {
        match &stmt.kind {
            StmtKind::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.write_line(&value, stmt.line)
            }

            StmtKind::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.as_str(), value);
                Ok(())
            }

            StmtKind::Block(statements) => {
                let env = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, env)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
        }
    }
}
