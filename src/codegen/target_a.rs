//! Target-A backend: inline immediates and numbered variable slots.

use std::collections::HashMap;

use crate::ast::{BinaryOp, UnaryOp};
use crate::bytecode::OpA;
use crate::error::CodegenError;
use crate::value::{Object, Value};

use super::{Backend, CodegenResult, Emitter};

/// Slots are handed out in declaration order and never reused, so a
/// shadowing declaration in a block gets a fresh slot and the outer one is
/// visible again once the block ends.
#[derive(Debug)]
pub struct TargetA {
    scopes: Vec<HashMap<String, u16>>,
    next_slot: u16,
}

impl Default for TargetA {
    fn default() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            next_slot: 0,
        }
    }
}

impl TargetA {
    fn resolve(&self, name: &str, line: usize) -> CodegenResult<u16> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| {
                CodegenError::evaluation_failed(format!("undefined variable '{}'", name), line)
            })
    }

    fn allocate(&mut self, name: &str, line: usize) -> CodegenResult<u16> {
        if let Some(slot) = self.scopes.last().and_then(|scope| scope.get(name)) {
            return Ok(*slot);
        }

        let slot = self.next_slot;
        self.next_slot = slot
            .checked_add(1)
            .ok_or_else(|| CodegenError::evaluation_failed("too many variables", line))?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), slot);
        }
        Ok(slot)
    }

    fn jump_operand(e: &Emitter, distance: i64) -> CodegenResult<u16> {
        i16::try_from(distance)
            .map(|d| d as u16)
            .map_err(|_| CodegenError::JumpTooLarge {
                distance,
                line: e.line(),
            })
    }
}

impl Backend for TargetA {
    const NAME: &'static str = "Target-A";
    const SUPPORTS_STRINGS: bool = false;

    fn literal(&mut self, e: &mut Emitter, value: &Value) -> CodegenResult<()> {
        let word = match value {
            Value::Int(n) => i16::try_from(*n).ok(),
            Value::Bool(b) => Some(i16::from(*b)),
            Value::Double(_) | Value::Object(_) | Value::Nil => None,
        };

        let Some(word) = word else {
            let literal = match value {
                Value::Object(Object::String(s)) => format!("\"{}\"", s),
                other => other.to_string(),
            };
            return Err(CodegenError::UnknownLiteral {
                literal,
                target: Self::NAME,
                line: e.line(),
            });
        };

        e.op(OpA::PushWord)?;
        e.word(word as u16)?;
        Ok(())
    }

    fn default_value(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpA::PushWord)?;
        e.word(0)?;
        Ok(())
    }

    fn unary(&mut self, e: &mut Emitter, operator: UnaryOp) -> CodegenResult<()> {
        let op = match operator {
            UnaryOp::Negate => OpA::Negate,
            UnaryOp::Not => OpA::Not,
        };
        e.op(op)?;
        Ok(())
    }

    fn binary(&mut self, e: &mut Emitter, operator: BinaryOp) -> CodegenResult<()> {
        let op = match operator {
            BinaryOp::Add => OpA::Add,
            BinaryOp::Subtract => OpA::Sub,
            BinaryOp::Multiply => OpA::Mul,
            BinaryOp::Divide => OpA::Div,
            BinaryOp::Equal => OpA::Eq,
            BinaryOp::NotEqual => OpA::Neq,
            BinaryOp::Greater => OpA::Gt,
            BinaryOp::GreaterEqual => OpA::Ge,
            BinaryOp::Less => OpA::Lt,
            BinaryOp::LessEqual => OpA::Le,
        };
        e.op(op)?;
        Ok(())
    }

    fn get_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        let slot = self.resolve(name, e.line())?;
        e.op(OpA::GetVar)?;
        e.word(slot)?;
        Ok(())
    }

    fn set_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        let slot = self.resolve(name, e.line())?;
        // SET_VAR pops; the assignment's value stays as the expression result
        e.op(OpA::Dup)?;
        e.op(OpA::SetVar)?;
        e.word(slot)?;
        Ok(())
    }

    fn declare_variable(&mut self, e: &mut Emitter, name: &str) -> CodegenResult<()> {
        let slot = self.allocate(name, e.line())?;
        e.op(OpA::SetVar)?;
        e.word(slot)?;
        Ok(())
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self, _e: &mut Emitter) -> CodegenResult<()> {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        Ok(())
    }

    fn print(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpA::Print)?;
        Ok(())
    }

    fn pop(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpA::Pop)?;
        Ok(())
    }

    fn keep_condition(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpA::Dup)?;
        Ok(())
    }

    fn drop_condition(&mut self, _e: &mut Emitter) -> CodegenResult<()> {
        Ok(())
    }

    fn jump(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        e.jump(OpA::Jump)
    }

    fn jump_if_false(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        e.jump(OpA::JumpUnless)
    }

    fn jump_if_true(&mut self, e: &mut Emitter) -> CodegenResult<usize> {
        e.jump(OpA::JumpIf)
    }

    fn patch_jump(&mut self, e: &mut Emitter, operand: usize) -> CodegenResult<()> {
        let word = Self::jump_operand(e, e.distance_from(operand))?;
        e.patch(operand, word)
    }

    fn loop_back(&mut self, e: &mut Emitter, start: usize) -> CodegenResult<()> {
        let operand = e.jump(OpA::Jump)?;
        let word = Self::jump_operand(e, start as i64 - (operand as i64 + 2))?;
        e.patch(operand, word)
    }

    fn terminate(&mut self, e: &mut Emitter) -> CodegenResult<()> {
        e.op(OpA::StopScript)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::bytecode::{Chunk, Decompiler, Opcode};
    use crate::codegen::generate;
    use crate::error::CodegenError;
    use crate::lexer::scan;
    use crate::parser::Parser;
    use crate::value::Value;
    use crate::Target;

    use super::*;

    fn compile(source: &str) -> Result<Chunk, CodegenError> {
        let (tokens, errors) = scan(source);
        assert!(errors.is_empty(), "lexer errors: {:?}", errors);
        let statements = Parser::new(tokens).parse().into_result().unwrap();
        generate(&statements, Target::A)
    }

    fn ops(chunk: &Chunk) -> Vec<OpA> {
        Decompiler::<OpA>::new(chunk)
            .decompile()
            .unwrap()
            .into_iter()
            .map(|r| r.opcode)
            .collect()
    }

    #[test]
    fn test_negative_literal() {
        let chunk = compile("-5;").unwrap();
        assert_eq!(
            chunk.code(),
            &[
                OpA::PushWord.byte(),
                0x05,
                0x00,
                OpA::Negate.byte(),
                OpA::Pop.byte(),
                OpA::StopScript.byte()
            ]
        );

        let records = Decompiler::<OpA>::new(&chunk).decompile().unwrap();
        assert_eq!(records[0].constant, Some(Value::Int(5)));
        assert_eq!(records[1].opcode, OpA::Negate);
    }

    #[test]
    fn test_post_order_without_folding() {
        let chunk = compile("1 + 2 * 3;").unwrap();
        assert_eq!(
            ops(&chunk),
            vec![
                OpA::PushWord,
                OpA::PushWord,
                OpA::PushWord,
                OpA::Mul,
                OpA::Add,
                OpA::Pop,
                OpA::StopScript
            ]
        );
        assert!(chunk.constants().is_empty());
    }

    #[test]
    fn test_booleans_are_words() {
        let chunk = compile("print !true;").unwrap();
        assert_eq!(&chunk.code()[..3], &[OpA::PushWord.byte(), 0x01, 0x00]);
    }

    #[test]
    fn test_variable_slots() {
        let chunk = compile("var a = 1; var b = 2; { var a = 3; print a; } print a + b;").unwrap();
        let slots: Vec<(OpA, i64)> = Decompiler::<OpA>::new(&chunk)
            .decompile()
            .unwrap()
            .into_iter()
            .filter_map(|r| r.operand.map(|slot| (r.opcode, slot)))
            .collect();
        assert_eq!(
            slots,
            vec![
                (OpA::SetVar, 0),
                (OpA::SetVar, 1),
                (OpA::SetVar, 2),
                (OpA::GetVar, 2),
                (OpA::GetVar, 0),
                (OpA::GetVar, 1),
            ]
        );
    }

    #[test]
    fn test_assignment_keeps_value() {
        let chunk = compile("var a; a = 4;").unwrap();
        assert_eq!(
            ops(&chunk),
            vec![
                OpA::PushWord,
                OpA::SetVar,
                OpA::PushWord,
                OpA::Dup,
                OpA::SetVar,
                OpA::Pop,
                OpA::StopScript
            ]
        );
    }

    #[test]
    fn test_while_jumps() {
        let chunk = compile("var i = 0; while (i < 3) i = i + 1;").unwrap();
        let records = Decompiler::<OpA>::new(&chunk).decompile().unwrap();

        let exit = records.iter().find(|r| r.opcode == OpA::JumpUnless).unwrap();
        let back = records.iter().find(|r| r.opcode == OpA::Jump).unwrap();

        // Loop start is the condition's first instruction, right after `var i`
        assert_eq!(back.jump_target(), Some(records[2].offset));
        assert_eq!(exit.jump_target(), Some(back.next_offset()));
        assert_eq!(records.last().map(|r| r.opcode), Some(OpA::StopScript));
    }

    #[test]
    fn test_unknown_literals() {
        for source in ["40000;", "1.5;", "\"s\";", "nil;"] {
            assert!(
                matches!(
                    compile(source),
                    Err(CodegenError::UnknownLiteral { target: "Target-A", .. })
                ),
                "{}",
                source
            );
        }
        assert!(compile("-32767;").is_ok());
    }

    #[test]
    fn test_undeclared_variable() {
        assert!(matches!(
            compile("print x;"),
            Err(CodegenError::ExpressionEvaluationFailed { line: 1, .. })
        ));
        assert!(matches!(
            compile("{ var x = 1; }\nx = 2;"),
            Err(CodegenError::ExpressionEvaluationFailed { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_operands() {
        assert!(matches!(
            compile("-true;"),
            Err(CodegenError::InvalidOperandType { .. })
        ));
        assert!(matches!(
            compile("true + 1;"),
            Err(CodegenError::InvalidOperandType { .. })
        ));
    }
}
