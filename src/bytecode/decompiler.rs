//! Generic bytecode disassembler.
//!
//! `Decompiler<O>` walks a chunk with the operand layouts declared by the
//! opcode set `O`. A byte that `O` does not define is fatal: a chunk is only
//! meaningful to the decoder of the target that produced it.

use std::marker::PhantomData;

use crate::bytecode::chunk::Chunk;
use crate::bytecode::opcode::{Opcode, Operand};
use crate::error::DecompileError;
use crate::value::Value;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Decompilation<O> {
    pub offset: usize,
    pub line: i32,
    pub opcode: O,
    /// Constant bound by the instruction: a pool entry or an inline literal.
    pub constant: Option<Value>,
    /// Raw operand: slot, pool index or signed jump displacement.
    pub operand: Option<i64>,
    /// Total instruction width in bytes.
    pub width: usize,
}

impl<O: Opcode> Decompilation<O> {
    /// Offset of the next instruction in sequence.
    pub fn next_offset(&self) -> usize {
        self.offset + self.width
    }

    /// Destination of a jump instruction.
    pub fn jump_target(&self) -> Option<usize> {
        if !self.opcode.operand().is_jump() {
            return None;
        }
        let displacement = self.operand?;
        let target = self.next_offset() as i64 + displacement;
        usize::try_from(target).ok()
    }

    /// Mnemonic with its decoded operand, without the offset/line prefix.
    pub fn describe(&self) -> String {
        let name = self.opcode.name();
        match self.opcode.operand() {
            Operand::None => name,
            Operand::Immediate => match &self.constant {
                Some(value) => format!("{:<16} {}", name, value),
                None => name,
            },
            Operand::Constant => format!(
                "{:<16} {:>4} '{}'",
                name,
                self.operand.unwrap_or_default(),
                self.constant.as_ref().unwrap_or(&Value::Nil)
            ),
            Operand::Byte | Operand::Word => {
                format!("{:<16} {:>4}", name, self.operand.unwrap_or_default())
            }
            Operand::RelativeJump | Operand::ForwardJump | Operand::BackwardJump => {
                let target = self
                    .jump_target()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!(
                    "{:<16} {:>4} -> {}",
                    name,
                    self.operand.unwrap_or_default(),
                    target
                )
            }
        }
    }
}

/// Disassembler over one chunk, parameterized by its opcode set.
pub struct Decompiler<'a, O> {
    chunk: &'a Chunk,
    _opcodes: PhantomData<O>,
}

impl<'a, O: Opcode> Decompiler<'a, O> {
    pub fn new(chunk: &'a Chunk) -> Self {
        Self {
            chunk,
            _opcodes: PhantomData,
        }
    }

    /// Decode every instruction from offset 0 to the end of the chunk.
    pub fn decompile(&self) -> Result<Vec<Decompilation<O>>, DecompileError> {
        let mut records = Vec::new();
        let mut offset = 0;

        while offset < self.chunk.len() {
            let record = self.trace(offset)?;
            offset = record.next_offset();
            records.push(record);
        }

        Ok(records)
    }

    /// Decode exactly one instruction at `offset`.
    pub fn trace(&self, offset: usize) -> Result<Decompilation<O>, DecompileError> {
        let byte = self.chunk.read(offset)?;
        let opcode = O::from_byte(byte).ok_or(DecompileError::UnknownOpcode { byte, offset })?;
        let line = self.chunk.line_at(offset)?;
        let layout = opcode.operand();
        let at = offset + 1;

        let (constant, operand) = match layout {
            Operand::None => (None, None),
            Operand::Byte => (None, Some(i64::from(self.chunk.read(at)?))),
            Operand::Word => (None, Some(i64::from(self.chunk.read_word(at)?))),
            Operand::Immediate => {
                let literal = self.chunk.read_word(at)? as i16;
                (Some(Value::Int(i64::from(literal))), None)
            }
            Operand::Constant => {
                let index = usize::from(self.chunk.read(at)?);
                let value = self.chunk.read_constant(index).map_err(|_| {
                    DecompileError::UnknownIndex {
                        index,
                        offset,
                        size: self.chunk.constants().len(),
                    }
                })?;
                (Some(value.clone()), Some(index as i64))
            }
            Operand::RelativeJump => (None, Some(i64::from(self.chunk.read_word(at)? as i16))),
            Operand::ForwardJump => (None, Some(i64::from(self.chunk.read_word(at)?))),
            Operand::BackwardJump => (None, Some(-i64::from(self.chunk.read_word(at)?))),
        };

        Ok(Decompilation {
            offset,
            line,
            opcode,
            constant,
            operand,
            width: 1 + layout.width(),
        })
    }

    /// Decode the whole chunk and render it as text lines.
    pub fn disassemble(&self) -> Result<Vec<String>, DecompileError> {
        Ok(Self::format_records(&self.decompile()?))
    }

    /// Render records as `OFFSET LINE MNEMONIC OPERAND` lines.
    ///
    /// The line column shows `|` when unchanged from the previous instruction.
    pub fn format_records(records: &[Decompilation<O>]) -> Vec<String> {
        let mut previous_line = None;

        records
            .iter()
            .map(|record| {
                let line = if previous_line == Some(record.line) {
                    "   |".to_string()
                } else {
                    format!("{:>4}", record.line)
                };
                previous_line = Some(record.line);
                format!("{:04} {} {}", record.offset, line, record.describe())
            })
            .collect()
    }
}
