//! Lexer module.

pub mod scanner;
pub mod token;

pub use scanner::{scan, Scanner};
pub use token::{Token, TokenKind};
