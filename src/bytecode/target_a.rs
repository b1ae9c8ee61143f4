//! Target-A instruction set: a word machine with inline 16-bit literals.
//!
//! Variables live in numbered 16-bit slots. Jumps carry a signed 16-bit
//! displacement measured from the end of the jump instruction; the
//! conditional jumps pop their condition.

use super::opcode::opcodes;

opcodes! {
    /// Target-A opcodes.
    pub enum OpA {
        /// PUSH_WORD <imm:i16>
        PushWord = 0x01 => Immediate,
        /// GET_VAR <slot:u16>
        GetVar = 0x02 => Word,
        /// SET_VAR <slot:u16>; pops the value
        SetVar = 0x03 => Word,

        Add = 0x10 => None,
        Sub = 0x11 => None,
        Mul = 0x12 => None,
        Div = 0x13 => None,
        Negate = 0x14 => None,
        Not = 0x15 => None,
        Eq = 0x16 => None,
        Neq = 0x17 => None,
        Gt = 0x18 => None,
        Ge = 0x19 => None,
        Lt = 0x1A => None,
        Le = 0x1B => None,
        Pop = 0x1C => None,
        Dup = 0x1D => None,

        Print = 0x20 => None,

        /// JUMP_UNLESS <rel:i16>; pops the condition
        JumpUnless = 0x30 => RelativeJump,
        /// JUMP <rel:i16>
        Jump = 0x31 => RelativeJump,
        /// JUMP_IF <rel:i16>; pops the condition
        JumpIf = 0x32 => RelativeJump,

        StopScript = 0xA0 => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::bytecode::opcode::{Opcode, Operand};

    #[test]
    fn test_opcode_roundtrip() {
        for &op in OpA::ALL {
            assert_eq!(OpA::from_byte(op.byte()), Some(op));
        }
    }

    #[test]
    fn test_bytes_are_unique() {
        let bytes: HashSet<u8> = OpA::ALL.iter().map(|op| op.byte()).collect();
        assert_eq!(bytes.len(), OpA::ALL.len());
    }

    #[test]
    fn test_invalid_opcode() {
        assert!(OpA::from_byte(0x00).is_none());
        assert!(OpA::from_byte(0xFF).is_none());
    }

    #[test]
    fn test_names_and_operands() {
        assert_eq!(OpA::PushWord.name(), "PUSH_WORD");
        assert_eq!(OpA::StopScript.name(), "STOP_SCRIPT");
        assert_eq!(OpA::PushWord.operand(), Operand::Immediate);
        assert_eq!(OpA::JumpUnless.operand(), Operand::RelativeJump);
    }
}
