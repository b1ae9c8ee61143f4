//! Bytecode module.
//!
//! # Architecture
//!
//! - `chunk`: the bytecode container (code bytes, line table, constant pool)
//! - `opcode`: the `Opcode` trait and operand layouts shared by both targets
//! - `target_a`, `target_b`: the two instruction sets
//! - `decompiler`: generic disassembly over any opcode set

pub mod chunk;
pub mod decompiler;
pub mod opcode;
pub mod target_a;
pub mod target_b;

pub use chunk::{Chunk, MAX_CONSTANTS};
pub use decompiler::{Decompilation, Decompiler};
pub use opcode::{Opcode, Operand};
pub use target_a::OpA;
pub use target_b::OpB;
