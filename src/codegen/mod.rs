//! Code generation: AST to bytecode for either target.
//!
//! A single walker, [`CodeGenerator`], does the post-order traversal, line
//! bookkeeping, static operand checks and control-flow layout. Each target
//! implements [`Backend`] to choose opcodes and operand encodings.

mod target_a;
mod target_b;

use std::fmt;

use tracing::debug;

use crate::ast::*;
use crate::bytecode::{Chunk, Opcode};
use crate::error::CodegenError;
use crate::value::{Object, Value};
use crate::Target;

pub use target_a::TargetA;
pub use target_b::TargetB;

pub type CodegenResult<T> = Result<T, CodegenError>;

/// Generate a chunk for a statement list, terminated for the given target.
pub fn generate(statements: &[Stmt], target: Target) -> CodegenResult<Chunk> {
    let chunk = match target {
        Target::A => CodeGenerator::<TargetA>::new().program(statements)?,
        Target::B => CodeGenerator::<TargetB>::new().program(statements)?,
    };
    debug!(%target, bytes = chunk.len(), constants = chunk.constants().len(), "generated chunk");
    Ok(chunk)
}

/// Generate a chunk that leaves the value of `expr` on the stack.
pub fn generate_expression(expr: &Expr, target: Target) -> CodegenResult<Chunk> {
    let chunk = match target {
        Target::A => CodeGenerator::<TargetA>::new().single_expression(expr)?,
        Target::B => CodeGenerator::<TargetB>::new().single_expression(expr)?,
    };
    debug!(%target, bytes = chunk.len(), "generated expression chunk");
    Ok(chunk)
}

/// Statically known operand kind, used to reject ill-typed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticType {
    Int,
    Double,
    String,
    Bool,
    Nil,
    /// Variables, assignments and logical results.
    Unknown,
}

impl StaticType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Int(_) => StaticType::Int,
            Value::Double(_) => StaticType::Double,
            Value::Bool(_) => StaticType::Bool,
            Value::Object(Object::String(_)) => StaticType::String,
            Value::Nil => StaticType::Nil,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, StaticType::Int | StaticType::Double | StaticType::Unknown)
    }

    fn is_stringy(self) -> bool {
        matches!(self, StaticType::String | StaticType::Unknown)
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StaticType::Int => "int",
            StaticType::Double => "double",
            StaticType::String => "string",
            StaticType::Bool => "bool",
            StaticType::Nil => "nil",
            StaticType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Byte sink that stamps every byte with the line of the current node.
pub struct Emitter {
    chunk: Chunk,
    line: i32,
    source_line: usize,
}

impl Emitter {
    fn new() -> Self {
        Self {
            chunk: Chunk::new(),
            line: 1,
            source_line: 1,
        }
    }

    /// Set the line for the bytes that follow.
    fn at(&mut self, line: usize) -> CodegenResult<()> {
        if line == 0 {
            return Err(CodegenError::UnknownLine(line));
        }
        self.line = i32::try_from(line).map_err(|_| CodegenError::UnknownLine(line))?;
        self.source_line = line;
        Ok(())
    }

    /// Source line of the node being emitted, for diagnostics.
    pub fn line(&self) -> usize {
        self.source_line
    }

    pub fn offset(&self) -> usize {
        self.chunk.len()
    }

    pub fn op<O: Opcode>(&mut self, op: O) -> CodegenResult<usize> {
        self.byte(op.byte())
    }

    pub fn byte(&mut self, byte: u8) -> CodegenResult<usize> {
        let line = self.source_line;
        self.chunk
            .write(byte, self.line)
            .map_err(|e| CodegenError::from_chunk(e, line))
    }

    pub fn word(&mut self, word: u16) -> CodegenResult<usize> {
        let line = self.source_line;
        self.chunk
            .write_word(word, self.line)
            .map_err(|e| CodegenError::from_chunk(e, line))
    }

    /// Add `value` to the constant pool.
    pub fn constant(&mut self, value: Value) -> CodegenResult<u8> {
        let line = self.source_line;
        self.chunk
            .add_constant(value)
            .map_err(|e| CodegenError::from_chunk(e, line))
    }

    /// Emit `op` with a placeholder 16-bit operand; returns the operand offset.
    pub fn jump<O: Opcode>(&mut self, op: O) -> CodegenResult<usize> {
        self.op(op)?;
        self.word(0xFFFF)
    }

    /// Distance from the end of the jump operand at `operand` to the current offset.
    pub fn distance_from(&self, operand: usize) -> i64 {
        self.offset() as i64 - (operand as i64 + 2)
    }

    pub fn patch(&mut self, operand: usize, word: u16) -> CodegenResult<()> {
        let line = self.source_line;
        self.chunk
            .patch_word(operand, word)
            .map_err(|e| CodegenError::from_chunk(e, line))
    }

    fn finish(self) -> Chunk {
        self.chunk
    }
}

/// Target-specific half of code generation.
///
/// Stack effects every implementation must honor:
/// - `literal`, `default_value`, `get_variable`: push one value
/// - `set_variable`: leaves the assigned value on the stack
/// - `declare_variable`: consumes the value on the stack (it may stay as a slot)
/// - conditional jumps may pop their condition or leave it; `keep_condition`
///   and `drop_condition` make both kinds behave alike for the walker
pub trait Backend: Default {
    const NAME: &'static str;
    const SUPPORTS_STRINGS: bool;

    fn literal(&mut self, e: &mut Emitter, value: &Value) -> CodegenResult<()>;

    /// Value of a declared but uninitialized variable.
    fn default_value(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    fn unary(&mut self, e: &mut Emitter, operator: UnaryOp) -> CodegenResult<()>;

    fn binary(&mut self, e: &mut Emitter, operator: BinaryOp) -> CodegenResult<()>;

    fn get_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()>;

    fn set_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()>;

    fn declare_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()>;

    fn begin_scope(&mut self);

    fn end_scope(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    fn print(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    fn pop(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    /// Copy the condition so a popping jump leaves the original behind.
    fn keep_condition(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    /// Discard a condition that the jump left on the stack.
    fn drop_condition(&mut self, e: &mut Emitter) -> CodegenResult<()>;

    fn jump(&mut self, e: &mut Emitter) -> CodegenResult<usize>;

    fn jump_if_false(&mut self, e: &mut Emitter) -> CodegenResult<usize>;

    fn jump_if_true(&mut self, e: &mut Emitter) -> CodegenResult<usize>;

    /// Point the jump whose operand is at `operand` to the current offset.
    fn patch_jump(&mut self, e: &mut Emitter, operand: usize) -> CodegenResult<()>;

    fn loop_back(&mut self, e: &mut Emitter, start: usize) -> CodegenResult<()>;

    fn terminate(&mut self, e: &mut Emitter) -> CodegenResult<()>;
}

/// The shared AST walker.
pub struct CodeGenerator<B: Backend> {
    emitter: Emitter,
    backend: B,
}

impl<B: Backend> Default for CodeGenerator<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> CodeGenerator<B> {
    pub fn new() -> Self {
        Self {
            emitter: Emitter::new(),
            backend: B::default(),
        }
    }

    pub fn program(mut self, statements: &[Stmt]) -> CodegenResult<Chunk> {
        for stmt in statements {
            self.statement(stmt)?;
        }
        self.backend.terminate(&mut self.emitter)?;
        Ok(self.emitter.finish())
    }

    pub fn single_expression(mut self, expr: &Expr) -> CodegenResult<Chunk> {
        self.expression(expr)?;
        self.backend.terminate(&mut self.emitter)?;
        Ok(self.emitter.finish())
    }

    fn statement(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        match &stmt.kind {
            StmtKind::Print(expr) => {
                self.expression(expr)?;
                self.emitter.at(stmt.line)?;
                self.backend.print(&mut self.emitter)
            }

            StmtKind::Expression(expr) => {
                self.expression(expr)?;
                self.emitter.at(stmt.line)?;
                self.backend.pop(&mut self.emitter)
            }

            StmtKind::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        self.expression(expr)?;
                        self.emitter.at(stmt.line)?;
                    }
                    None => {
                        self.emitter.at(stmt.line)?;
                        self.backend.default_value(&mut self.emitter)?;
                    }
                }
                self.backend.declare_variable(&mut self.emitter, name)
            }

            StmtKind::Block(statements) => {
                self.backend.begin_scope();
                for inner in statements {
                    self.statement(inner)?;
                }
                self.emitter.at(stmt.line)?;
                self.backend.end_scope(&mut self.emitter)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition)?;
                self.emitter.at(stmt.line)?;
                let else_jump = self.backend.jump_if_false(&mut self.emitter)?;
                self.backend.drop_condition(&mut self.emitter)?;

                self.statement(then_branch)?;

                self.emitter.at(stmt.line)?;
                let end_jump = self.backend.jump(&mut self.emitter)?;
                self.backend.patch_jump(&mut self.emitter, else_jump)?;
                self.backend.drop_condition(&mut self.emitter)?;

                if let Some(else_branch) = else_branch {
                    self.statement(else_branch)?;
                    self.emitter.at(stmt.line)?;
                }
                self.backend.patch_jump(&mut self.emitter, end_jump)
            }

            StmtKind::While { condition, body } => {
                let start = self.emitter.offset();
                self.expression(condition)?;
                self.emitter.at(stmt.line)?;
                let exit_jump = self.backend.jump_if_false(&mut self.emitter)?;
                self.backend.drop_condition(&mut self.emitter)?;

                self.statement(body)?;

                self.emitter.at(stmt.line)?;
                self.backend.loop_back(&mut self.emitter, start)?;
                self.backend.patch_jump(&mut self.emitter, exit_jump)?;
                self.backend.drop_condition(&mut self.emitter)
            }
        }
    }

    /// Emit `expr` in post order and return its static type.
    fn expression(&mut self, expr: &Expr) -> CodegenResult<StaticType> {
        match &expr.kind {
            ExprKind::Literal(value) => {
                self.emitter.at(expr.line)?;
                self.backend.literal(&mut self.emitter, value)?;
                Ok(StaticType::of(value))
            }

            ExprKind::Grouping(inner) => self.expression(inner),

            ExprKind::Unary { operator, operand } => {
                let operand_type = self.expression(operand)?;
                self.emitter.at(expr.line)?;
                let result = match operator {
                    UnaryOp::Negate if operand_type.is_numeric() => operand_type,
                    UnaryOp::Negate => {
                        return Err(CodegenError::invalid_operand(
                            operator.to_string(),
                            operand_type.to_string(),
                            expr.line,
                        ))
                    }
                    UnaryOp::Not => StaticType::Bool,
                };
                self.backend.unary(&mut self.emitter, *operator)?;
                Ok(result)
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left_type = self.expression(left)?;
                let right_type = self.expression(right)?;
                self.emitter.at(expr.line)?;
                let result = Self::check_binary(*operator, left_type, right_type, expr.line)?;
                self.backend.binary(&mut self.emitter, *operator)?;
                Ok(result)
            }

            ExprKind::Variable(name) => {
                self.emitter.at(expr.line)?;
                self.backend.get_variable(&mut self.emitter, name)?;
                Ok(StaticType::Unknown)
            }

            ExprKind::Assign { name, value } => {
                self.expression(value)?;
                self.emitter.at(expr.line)?;
                self.backend.set_variable(&mut self.emitter, name)?;
                Ok(StaticType::Unknown)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                self.expression(left)?;
                self.emitter.at(expr.line)?;
                self.backend.keep_condition(&mut self.emitter)?;
                let end_jump = match operator {
                    LogicalOp::And => self.backend.jump_if_false(&mut self.emitter)?,
                    LogicalOp::Or => self.backend.jump_if_true(&mut self.emitter)?,
                };
                self.backend.pop(&mut self.emitter)?;

                self.expression(right)?;

                self.emitter.at(expr.line)?;
                self.backend.patch_jump(&mut self.emitter, end_jump)?;
                Ok(StaticType::Unknown)
            }
        }
    }

    fn check_binary(
        operator: BinaryOp,
        left: StaticType,
        right: StaticType,
        line: usize,
    ) -> CodegenResult<StaticType> {
        let invalid = || {
            CodegenError::invalid_operand(
                operator.to_string(),
                format!("{} and {}", left, right),
                line,
            )
        };

        if operator == BinaryOp::Equal || operator == BinaryOp::NotEqual {
            return Ok(StaticType::Bool);
        }

        let concatenation = operator == BinaryOp::Add
            && B::SUPPORTS_STRINGS
            && left.is_stringy()
            && right.is_stringy()
            && (left == StaticType::String || right == StaticType::String);
        if concatenation {
            return Ok(StaticType::String);
        }

        let mixed = matches!(
            (left, right),
            (StaticType::Int, StaticType::Double) | (StaticType::Double, StaticType::Int)
        );
        if !left.is_numeric() || !right.is_numeric() || mixed {
            return Err(invalid());
        }

        if operator.is_comparison() {
            return Ok(StaticType::Bool);
        }
        Ok(if left == StaticType::Unknown { right } else { left })
    }
}
