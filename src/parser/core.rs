//! Core parser struct and helper methods.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};

use super::Parsed;

pub type ParseResult<T> = Result<T, ParserError>;

/// The recursive-descent parser.
///
/// Also hosts the Pratt expression routines (see `pratt.rs`), which share
/// this token cursor.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    pub(crate) errors: Vec<ParserError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The cursor relies on a trailing Eof token
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::eof(line));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parse a complete program, recovering after each malformed statement.
    pub fn parse(mut self) -> Parsed<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        Parsed::new(statements, self.errors)
    }

    // ===== Token manipulation =====

    pub(crate) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.iter().any(|kind| self.check(*kind)) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of `kind`, or build an error from the offending token.
    pub(crate) fn expect(
        &mut self,
        kind: TokenKind,
        error: impl FnOnce(String, usize) -> ParserError,
    ) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(error(found.describe(), found.line))
        }
    }

    pub(crate) fn current_line(&self) -> usize {
        self.peek().line
    }

    /// Discard tokens up to the next statement boundary.
    ///
    /// Stops after a `;`, or before a statement keyword or a brace once the
    /// failing declaration (which began at `start`) has consumed a token.
    pub(crate) fn synchronize(&mut self, start: usize) {
        while !self.is_at_end() {
            let kind = self.peek().kind;
            if kind == TokenKind::Semicolon {
                self.advance();
                return;
            }
            let boundary = kind.starts_statement()
                || matches!(kind, TokenKind::LeftBrace | TokenKind::RightBrace);
            if self.current > start && boundary {
                return;
            }
            self.advance();
        }
    }
}
