//! Target-B instruction set: a stack machine with a constant pool.

use super::opcode::opcodes;

opcodes! {
    /// Target-B opcodes.
    pub enum OpB {
        /// CONSTANT <index:u8>
        Constant = 0x00 => Constant,
        Nil = 0x01 => None,
        True = 0x02 => None,
        False = 0x03 => None,
        Pop = 0x04 => None,
        /// GET_LOCAL <slot:u8>
        GetLocal = 0x05 => Byte,
        /// SET_LOCAL <slot:u8>
        SetLocal = 0x06 => Byte,
        /// GET_GLOBAL <name:u8>
        GetGlobal = 0x07 => Constant,
        /// DEFINE_GLOBAL <name:u8>
        DefineGlobal = 0x08 => Constant,
        /// SET_GLOBAL <name:u8>
        SetGlobal = 0x09 => Constant,
        Equal = 0x0A => None,
        Greater = 0x0B => None,
        Less = 0x0C => None,
        Add = 0x0D => None,
        Subtract = 0x0E => None,
        Multiply = 0x0F => None,
        Divide = 0x10 => None,
        Not = 0x11 => None,
        Negate = 0x12 => None,
        Print = 0x13 => None,
        /// JUMP <distance:u16>
        Jump = 0x14 => ForwardJump,
        /// JUMP_IF_FALSE <distance:u16>; leaves the condition on the stack
        JumpIfFalse = 0x15 => ForwardJump,
        /// LOOP <distance:u16>
        Loop = 0x16 => BackwardJump,
        Return = 0x17 => None,
    }
}
