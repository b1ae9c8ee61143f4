//! Opcode sets and their operand layouts.
//!
//! Each target declares its instruction set with the `opcodes!` macro, which
//! fixes every variant's byte and operand layout and implements [`Opcode`].

use std::fmt;

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    /// One-byte slot number.
    Byte,
    /// Two-byte slot number.
    Word,
    /// Inline signed 16-bit literal.
    Immediate,
    /// One-byte constant pool index.
    Constant,
    /// Signed 16-bit displacement from the end of the instruction.
    RelativeJump,
    /// Unsigned 16-bit forward distance from the end of the instruction.
    ForwardJump,
    /// Unsigned 16-bit backward distance from the end of the instruction.
    BackwardJump,
}

impl Operand {
    /// Operand size in bytes.
    pub fn width(self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Byte | Operand::Constant => 1,
            Operand::Word
            | Operand::Immediate
            | Operand::RelativeJump
            | Operand::ForwardJump
            | Operand::BackwardJump => 2,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Operand::RelativeJump | Operand::ForwardJump | Operand::BackwardJump
        )
    }
}

/// A one-byte opcode of a particular target.
pub trait Opcode: Copy + Eq + fmt::Debug + 'static {
    /// Every opcode of the set, in declaration order.
    const ALL: &'static [Self];

    fn from_byte(byte: u8) -> Option<Self>;

    fn byte(self) -> u8;

    fn operand(self) -> Operand;

    /// Canonical mnemonic, e.g. `JumpIfFalse` → `JUMP_IF_FALSE`.
    fn name(self) -> String {
        canonical_name(&format!("{:?}", self))
    }
}

pub fn canonical_name(variant: &str) -> String {
    let mut name = String::with_capacity(variant.len() + 4);
    for (i, c) in variant.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            name.push('_');
        }
        name.push(c.to_ascii_uppercase());
    }
    name
}

macro_rules! opcodes {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $byte:literal => $operand:ident,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $byte,
            )*
        }

        impl $crate::bytecode::opcode::Opcode for $name {
            const ALL: &'static [Self] = &[$($name::$variant),*];

            fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some($name::$variant),)*
                    _ => None,
                }
            }

            fn byte(self) -> u8 {
                self as u8
            }

            fn operand(self) -> $crate::bytecode::opcode::Operand {
                match self {
                    $($name::$variant => $crate::bytecode::opcode::Operand::$operand,)*
                }
            }
        }
    };
}

pub(crate) use opcodes;
