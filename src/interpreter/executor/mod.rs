//! Tree-walking interpreter.

mod expressions;
mod operators;
mod statements;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::trace;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::environment::Environment;
use crate::value::Value;

pub(crate) type RuntimeResult<T> = Result<T, RuntimeError>;

/// The interpreter. `print` output goes to `W`.
pub struct Interpreter<W: Write = io::Stdout> {
    pub(crate) environment: Rc<RefCell<Environment>>,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            environment: Rc::new(RefCell::new(Environment::new())),
            out,
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Look up a binding visible from the current scope.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.environment.borrow().get(name)
    }

    /// Execute statements in order, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        trace!(statements = statements.len(), "interpreting");
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    /// Run `statements` in `env`, restoring the current scope on every exit path.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Environment,
    ) -> RuntimeResult<()> {
        let previous = std::mem::replace(&mut self.environment, Rc::new(RefCell::new(env)));

        let mut result = Ok(());
        for stmt in statements {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    pub(crate) fn write_line(&mut self, value: &Value, line: usize) -> RuntimeResult<()> {
        writeln!(self.out, "{}", value).map_err(|source| RuntimeError::Output { line, source })
    }
}
