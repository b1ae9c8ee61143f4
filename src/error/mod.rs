//! Error types for all compilation phases.

use thiserror::Error;

/// Lexer errors. Collected in batch; scanning continues after each one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
    #[error("Unexpected character '{0}' at line {1}")]
    UnexpectedChar(char, usize),

    #[error("Unterminated string at line {0}")]
    UnterminatedString(usize),

    #[error("Invalid number '{0}' at line {1}")]
    InvalidNumber(String, usize),
}

impl LexerError {
    pub fn unexpected_char(c: char, line: usize) -> Self {
        Self::UnexpectedChar(c, line)
    }

    pub fn unterminated_string(line: usize) -> Self {
        Self::UnterminatedString(line)
    }

    pub fn invalid_number(s: impl Into<String>, line: usize) -> Self {
        Self::InvalidNumber(s.into(), line)
    }

    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedChar(_, line) => *line,
            Self::UnterminatedString(line) => *line,
            Self::InvalidNumber(_, line) => *line,
        }
    }
}

/// Parser errors. Recoverable: the parser synchronizes and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    #[error("Expected expression, found '{found}' at line {line}")]
    ExpressionExpected { found: String, line: usize },

    #[error("Expected ';' after {after}, found '{found}' at line {line}")]
    MissingSemicolon {
        after: &'static str,
        found: String,
        line: usize,
    },

    #[error("Expected ')' to close {context}, found '{found}' at line {line}")]
    MissingClosingParenthesis {
        context: &'static str,
        found: String,
        line: usize,
    },

    #[error("Expected '(' after '{keyword}', found '{found}' at line {line}")]
    MissingOpeningParenthesis {
        keyword: &'static str,
        found: String,
        line: usize,
    },

    #[error("Expected '}}' after block, found '{found}' at line {line}")]
    MissingBrace { found: String, line: usize },

    #[error("Expected variable name after 'var', found '{found}' at line {line}")]
    MissingVariableName { found: String, line: usize },

    #[error("Invalid assignment target at line {0}")]
    InvalidAssignment(usize),

    #[error("Unexpected token '{found}', expected {expected} at line {line}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: usize,
    },
}

impl ParserError {
    pub fn expression_expected(found: impl Into<String>, line: usize) -> Self {
        Self::ExpressionExpected {
            found: found.into(),
            line,
        }
    }

    pub fn unexpected_token(expected: &'static str, found: impl Into<String>, line: usize) -> Self {
        Self::UnexpectedToken {
            expected,
            found: found.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::ExpressionExpected { line, .. } => *line,
            Self::MissingSemicolon { line, .. } => *line,
            Self::MissingClosingParenthesis { line, .. } => *line,
            Self::MissingOpeningParenthesis { line, .. } => *line,
            Self::MissingBrace { line, .. } => *line,
            Self::MissingVariableName { line, .. } => *line,
            Self::InvalidAssignment(line) => *line,
            Self::UnexpectedToken { line, .. } => *line,
        }
    }
}

/// Failure of a typed accessor on [`crate::value::Value`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ValueError {
    pub fn new(expected: &'static str, found: &'static str) -> Self {
        Self { expected, found }
    }
}

/// Runtime errors raised by the tree-walking interpreter.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Type mismatch: cannot apply '{operator}' to {left} and {right} at line {line}")]
    TypeMismatch {
        operator: String,
        left: &'static str,
        right: &'static str,
        line: usize,
    },

    #[error("Operand of '{operator}' must be a number, found {found} at line {line}")]
    InvalidOperand {
        operator: String,
        found: &'static str,
        line: usize,
    },

    #[error("Undefined variable '{0}' at line {1}")]
    UndefinedVariable(String, usize),

    #[error("Division by zero at line {0}")]
    DivisionByZero(usize),

    #[error("Unsupported operator '{operator}' for {operand} at line {line}")]
    UnsupportedOperator {
        operator: String,
        operand: &'static str,
        line: usize,
    },

    #[error("Missing operand for '{operator}' at line {line}")]
    MissingOperand { operator: String, line: usize },

    #[error("Integer overflow in '{operator}' at line {line}")]
    IntegerOverflow { operator: String, line: usize },

    #[error("Failed to write output at line {line}: {source}")]
    Output {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl RuntimeError {
    pub fn type_mismatch(
        operator: impl Into<String>,
        left: &'static str,
        right: &'static str,
        line: usize,
    ) -> Self {
        Self::TypeMismatch {
            operator: operator.into(),
            left,
            right,
            line,
        }
    }

    pub fn undefined_variable(name: impl Into<String>, line: usize) -> Self {
        Self::UndefinedVariable(name.into(), line)
    }

    pub fn division_by_zero(line: usize) -> Self {
        Self::DivisionByZero(line)
    }

    pub fn missing_operand(operator: impl Into<String>, line: usize) -> Self {
        Self::MissingOperand {
            operator: operator.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::TypeMismatch { line, .. } => *line,
            Self::InvalidOperand { line, .. } => *line,
            Self::UndefinedVariable(_, line) => *line,
            Self::DivisionByZero(line) => *line,
            Self::UnsupportedOperator { line, .. } => *line,
            Self::MissingOperand { line, .. } => *line,
            Self::IntegerOverflow { line, .. } => *line,
            Self::Output { line, .. } => *line,
        }
    }
}

/// Bytecode container errors. These indicate a corrupted or mis-generated chunk.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    #[error("Offset {offset} out of bounds (chunk size {size})")]
    OutOfBounds { offset: usize, size: usize },

    #[error("Need {needed} bytes at offset {offset}, chunk size is {size}")]
    InsufficientBytes {
        offset: usize,
        needed: usize,
        size: usize,
    },

    #[error("Invalid line number {line} at offset {offset}")]
    InvalidLineNumber { line: i32, offset: usize },

    #[error("Invalid constant index {index} (pool size {size})")]
    InvalidConstantIndex { index: usize, size: usize },

    #[error("Too many constants in one chunk (limit {limit})")]
    TooManyConstants { limit: usize },
}

/// Code generation errors. Fatal to the current `generate` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("Expression evaluation failed: {reason} at line {line}")]
    ExpressionEvaluationFailed { reason: String, line: usize },

    #[error("Invalid operand type for '{operator}': {found} at line {line}")]
    InvalidOperandType {
        operator: String,
        found: String,
        line: usize,
    },

    #[error("Too many constants in one chunk (limit {limit}) at line {line}")]
    TooManyConstants { limit: usize, line: usize },

    #[error("Literal {literal} cannot be encoded for {target} at line {line}")]
    UnknownLiteral {
        literal: String,
        target: &'static str,
        line: usize,
    },

    #[error("Unknown source line {0}")]
    UnknownLine(usize),

    #[error("Jump distance {distance} does not fit the operand at line {line}")]
    JumpTooLarge { distance: i64, line: usize },

    #[error("Bytecode error at line {line}: {source}")]
    Chunk {
        line: usize,
        #[source]
        source: ChunkError,
    },
}

impl CodegenError {
    pub fn evaluation_failed(reason: impl Into<String>, line: usize) -> Self {
        Self::ExpressionEvaluationFailed {
            reason: reason.into(),
            line,
        }
    }

    pub fn invalid_operand(
        operator: impl Into<String>,
        found: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::InvalidOperandType {
            operator: operator.into(),
            found: found.into(),
            line,
        }
    }

    /// Attach a source line to a container failure.
    pub fn from_chunk(source: ChunkError, line: usize) -> Self {
        match source {
            ChunkError::TooManyConstants { limit } => Self::TooManyConstants { limit, line },
            source => Self::Chunk { line, source },
        }
    }
}

/// Disassembly errors. Indicate a malformed chunk or a target mismatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecompileError {
    #[error("Unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("Unknown constant index {index} at offset {offset} (pool size {size})")]
    UnknownIndex {
        index: usize,
        offset: usize,
        size: usize,
    },

    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{} lexical error(s), first: {}", .0.len(), first_message(.0))]
    Lexer(Vec<LexerError>),

    #[error("{} syntax error(s), first: {}", .0.len(), first_message(.0))]
    Parser(Vec<ParserError>),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Codegen error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("Disassembly error: {0}")]
    Decompile(#[from] DecompileError),
}

impl From<Vec<LexerError>> for CompileError {
    fn from(errors: Vec<LexerError>) -> Self {
        Self::Lexer(errors)
    }
}

impl From<Vec<ParserError>> for CompileError {
    fn from(errors: Vec<ParserError>) -> Self {
        Self::Parser(errors)
    }
}

fn first_message<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_error_line() {
        assert_eq!(LexerError::unexpected_char('@', 3).line(), 3);
        assert_eq!(
            LexerError::unterminated_string(7).to_string(),
            "Unterminated string at line 7"
        );
    }

    #[test]
    fn test_chunk_error_maps_constant_overflow() {
        let err = CodegenError::from_chunk(ChunkError::TooManyConstants { limit: 256 }, 4);
        assert_eq!(err, CodegenError::TooManyConstants { limit: 256, line: 4 });

        let err =
            CodegenError::from_chunk(ChunkError::InvalidLineNumber { line: -1, offset: 0 }, 2);
        assert!(matches!(err, CodegenError::Chunk { line: 2, .. }));
    }

    #[test]
    fn test_unified_error_reports_batch() {
        let err = CompileError::from(vec![
            ParserError::InvalidAssignment(1),
            ParserError::InvalidAssignment(2),
        ]);
        assert_eq!(
            err.to_string(),
            "2 syntax error(s), first: Invalid assignment target at line 1"
        );
    }
}
