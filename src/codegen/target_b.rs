//! Target-B backend: constant pool literals, named globals and stack locals.

use std::collections::HashMap;

use crate::ast::{BinaryOp, UnaryOp};
use crate::bytecode::OpB;
use crate::error::CodegenError;
use crate::value::Value;

use super::{Backend, CodegenResult, Emitter};

const MAX_LOCALS: usize = u8::MAX as usize + 1;

/// A local variable in a scope.
#[derive(Debug, Clone)]
struct Local {
    name: String,
    depth: usize,
}

/// Variables declared at depth 0 are globals addressed by a name constant.
/// Inside blocks they are stack slots numbered from the bottom of the stack.
#[derive(Debug, Default)]
pub struct TargetB {
    locals: Vec<Local>,
    scope_depth: usize,
    /// Name constants already in the pool, reused on every reference.
    names: HashMap<String, u8>,
}

impl TargetB {
    fn resolve_local(&self, name: &str) -> Option<u8> {
        self.locals
            .iter()
            .rposition(|local| local.name == name)
            .and_then(|slot| u8::try_from(slot).ok())
    }

    fn identifier_constant(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<u8> {
        if let Some(index) = self.names.get(name) {
            return Ok(*index);
        }
        let index = e.constant(Value::string(name))?;
        self.names.insert(name.to_string(), index);
        Ok(index)
    }

    /// A redeclaration in the same scope takes a fresh slot that shadows the
    /// old one; both are popped when the scope ends.
    fn declare_local(&mut self, name: &str, line: usize) -> CodegenResult<()> {
        if self.locals.len() >= MAX_LOCALS {
            return Err(CodegenError::evaluation_failed(
                "too many local variables in scope",
                line,
            ));
        }

        self.locals.push(Local {
            name: name.to_string(),
            depth: self.scope_depth,
        });
        Ok(())
    }

    fn jump_operand(e: &Emitter, distance: i64) -> CodegenResult<u16> {
        u16::try_from(distance).map_err(|_| CodegenError::JumpTooLarge {
            distance,
            line: e.line(),
        })
    }

    fn ops(e: &mut Emitter, ops: &[OpB]) -> CodegenResult<()> {
        for op in ops {
            e.op(*op)?;
        }
        Ok(())
    }
}

impl Backend for TargetB {
    const NAME: &'static str = "Target-B";
    const SUPPORTS_STRINGS: bool = true;

    fn literal(&mut self, e: &mut Emitter, value: &Value) -> CodegenResult<()> {
        match value {
            Value::Bool(true) => e.op(OpB::True)?,
            Value::Bool(false) => e.op(OpB::False)?,
            Value::Nil => e.op(OpB::Nil)?,
            Value::Int(_) | Value::Double(_) | Value::Object(_) => {
                let index = e.constant(value.clone())?;
                e.op(OpB::Constant)?;
                e.byte(index)?
            }
        };
        Ok(())
    }

    fn default_value(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpB::Nil)?;
        Ok(())
    }

    fn unary(&mut self, e: &mut Emitter, operator: UnaryOp) -> CodegenResult<()> {
        let op = match operator {
            UnaryOp::Negate => OpB::Negate,
            UnaryOp::Not => OpB::Not,
        };
        e.op(op)?;
        Ok(())
    }

    fn binary(&mut self, e: &mut Emitter, operator: BinaryOp) -> CodegenResult<()> {
        match operator {
            BinaryOp::Add => Self::ops(e, &[OpB::Add]),
            BinaryOp::Subtract => Self::ops(e, &[OpB::Subtract]),
            BinaryOp::Multiply => Self::ops(e, &[OpB::Multiply]),
            BinaryOp::Divide => Self::ops(e, &[OpB::Divide]),
            BinaryOp::Equal => Self::ops(e, &[OpB::Equal]),
            BinaryOp::NotEqual => Self::ops(e, &[OpB::Equal, OpB::Not]),
            BinaryOp::Greater => Self::ops(e, &[OpB::Greater]),
            BinaryOp::GreaterEqual => Self::ops(e, &[OpB::Less, OpB::Not]),
            BinaryOp::Less => Self::ops(e, &[OpB::Less]),
            BinaryOp::LessEqual => Self::ops(e, &[OpB::Greater, OpB::Not]),
        }
    }

    fn get_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        if let Some(slot) = self.resolve_local(name) {
            e.op(OpB::GetLocal)?;
            e.byte(slot)?;
        } else {
            let index = self.identifier_constant(e, name)?;
            e.op(OpB::GetGlobal)?;
            e.byte(index)?;
        }
        Ok(())
    }

    fn set_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        if let Some(slot) = self.resolve_local(name) {
            e.op(OpB::SetLocal)?;
            e.byte(slot)?;
        } else {
            let index = self.identifier_constant(e, name)?;
            e.op(OpB::SetGlobal)?;
            e.byte(index)?;
        }
        Ok(())
    }

    fn declare_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        if self.scope_depth > 0 {
            // The initializer's value stays on the stack as the local's slot
            return self.declare_local(name, e.line());
        }
        let index = self.identifier_constant(e, name)?;
        e.op(OpB::DefineGlobal)?;
        e.byte(index)?;
        Ok(())
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        self.scope_depth = self.scope_depth.saturating_sub(1);

        while let Some(local) = self.locals.last() {
            if local.depth <= self.scope_depth {
                break;
            }
            e.op(OpB::Pop)?;
            self.locals.pop();
        }
        Ok(())
    }

    fn print(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpB::Print)?;
        Ok(())
    }

    fn pop(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpB::Pop)?;
        Ok(())
    }

    fn keep_condition(&mut self, _e: &mut Emitter) -> CodegenResult<()> {
        Ok(())
    }

    fn drop_condition(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpB::Pop)?;
        Ok(())
    }

    fn jump(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        e.jump(OpB::Jump)
    }

    fn jump_if_false(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        e.jump(OpB::JumpIfFalse)
    }

    /// No JUMP_IF_TRUE opcode: skip an unconditional jump when falsey.
    fn jump_if_true(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        let skip = e.jump(OpB::JumpIfFalse)?;
        let end = e.jump(OpB::Jump)?;
        self.patch_jump(e, skip)?;
        Ok(end)
    }

    fn patch_jump(&mut self, e: &mut Emitter, operand: usize) -> CodegenResult<()> {
        let word = Self::jump_operand(e, e.distance_from(operand))?;
        e.patch(operand, word)
    }

    fn loop_back(&mut self, e: &mut Emitter, start: usize) -> CodegenResult<()> {
        e.op(OpB::Loop)?;
        let word = Self::jump_operand(e, (e.offset() + 2) as i64 - start as i64)?;
        e.word(word)?;
        Ok(())
    }

    fn terminate(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpB::Return)?;
        Ok(())
    }
}
