//! Retroscript: a small retargetable scripting-language toolchain.
//!
//! This is the library root that exports all modules.
//!
//! # Pipeline
//!
//! `source → tokens → AST → (optional interpreter sanity pass) → Chunk`,
//! and `Chunk → decoded records → text` for disassembly.
//!
//! - **Parsing**: recursive descent (statements) or Pratt (one expression)
//! - **Targets**: Target-A (inline word immediates) or Target-B (constant pool)
//!
//! Configuration is an explicit [`CompilerConfig`] value; nothing here reads
//! global state.

#![allow(clippy::result_large_err)]

pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use ast::{Program, StmtKind};
use bytecode::{Chunk, Decompiler, OpA, OpB};
use error::{CompileError, DecompileError};
use interpreter::Interpreter;
use lexer::Token;
use parser::{Parser, PrattParser};
use value::Value;

/// Parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserStrategy {
    /// Recursive descent over full programs
    #[default]
    RecursiveDescent,
    /// Pratt parsing of a single expression
    Pratt,
}

/// Bytecode target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Word machine with inline 16-bit literals
    A,
    /// Stack machine with a constant pool
    #[default]
    B,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::A => write!(f, "Target-A"),
            Target::B => write!(f, "Target-B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown target '{0}', expected 'a' or 'b'")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "target-a" => Ok(Target::A),
            "b" | "target-b" => Ok(Target::B),
            _ => Err(UnknownTarget(s.to_string())),
        }
    }
}

/// Compiler configuration, passed to every pipeline entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerConfig {
    pub parser: ParserStrategy,
    pub target: Target,
    /// Run the program through the interpreter before generating code.
    /// Output is discarded; runtime errors abort compilation.
    pub sanity_check: bool,
}

impl CompilerConfig {
    pub fn new(parser: ParserStrategy, target: Target) -> Self {
        Self {
            parser,
            target,
            sanity_check: false,
        }
    }

    pub fn with_sanity_check(mut self, enabled: bool) -> Self {
        self.sanity_check = enabled;
        self
    }
}

/// Tokenize `source`, failing with every lexical error at once.
pub fn scan(source: &str) -> Result<Vec<Token>, CompileError> {
    let (tokens, errors) = lexer::scan(source);
    if !errors.is_empty() {
        return Err(CompileError::Lexer(errors));
    }
    debug!(tokens = tokens.len(), "scanned");
    Ok(tokens)
}

/// Parse `source` with the configured strategy.
///
/// A Pratt parse yields a one-statement program wrapping its expression.
pub fn parse(source: &str, config: &CompilerConfig) -> Result<Program, CompileError> {
    let tokens = scan(source)?;

    let program = match config.parser {
        ParserStrategy::RecursiveDescent => {
            Program::new(Parser::new(tokens).parse().into_result()?)
        }
        ParserStrategy::Pratt => {
            Program::from_expression(PrattParser::new(tokens).parse().into_expression()?)
        }
    };

    debug!(
        strategy = ?config.parser,
        statements = program.statements.len(),
        "parsed"
    );
    Ok(program)
}

/// Compile `source` to a bytecode chunk for the configured target.
pub fn compile(source: &str, config: &CompilerConfig) -> Result<Chunk, CompileError> {
    let program = parse(source, config)?;

    if config.sanity_check {
        debug!("running sanity pass");
        Interpreter::with_writer(io::sink()).interpret(&program.statements)?;
    }

    let chunk = codegen::generate(&program.statements, config.target)?;
    debug!(target = %config.target, bytes = chunk.len(), "compiled");
    Ok(chunk)
}

/// Run `source` on the tree-walking interpreter, printing to stdout.
pub fn interpret(source: &str, config: &CompilerConfig) -> Result<(), CompileError> {
    interpret_with_writer(source, config, io::stdout())
}

/// Run `source` on the tree-walking interpreter, printing to `out`.
pub fn interpret_with_writer<W: Write>(
    source: &str,
    config: &CompilerConfig,
    out: W,
) -> Result<(), CompileError> {
    let program = parse(source, config)?;
    Interpreter::with_writer(out).interpret(&program.statements)?;
    Ok(())
}

/// Run `source` and return the value of its final expression statement,
/// printing to stdout.
///
/// Earlier statements execute normally. Returns `nil` when the program does
/// not end with an expression statement.
pub fn evaluate(source: &str, config: &CompilerConfig) -> Result<Value, CompileError> {
    evaluate_with_writer(source, config, io::stdout())
}

/// Like [`evaluate`], printing to `out`.
pub fn evaluate_with_writer<W: Write>(
    source: &str,
    config: &CompilerConfig,
    out: W,
) -> Result<Value, CompileError> {
    let mut program = parse(source, config)?;
    let mut interpreter = Interpreter::with_writer(out);

    let last = match program.statements.last().map(|stmt| &stmt.kind) {
        Some(StmtKind::Expression(_)) => program.statements.pop(),
        _ => None,
    };

    interpreter.interpret(&program.statements)?;

    match last.map(|stmt| stmt.kind) {
        Some(StmtKind::Expression(expr)) => Ok(interpreter.evaluate(&expr)?),
        _ => Ok(Value::Nil),
    }
}

/// Disassemble `chunk` with the decoder for `target`.
pub fn disassemble(chunk: &Chunk, target: Target) -> Result<Vec<String>, DecompileError> {
    match target {
        Target::A => Decompiler::<OpA>::new(chunk).disassemble(),
        Target::B => Decompiler::<OpB>::new(chunk).disassemble(),
    }
}
