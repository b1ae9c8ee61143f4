//! Statement parsing: declarations, print, if, while, blocks.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};

impl Parser {
    /// Parse one declaration, recording the error and resynchronizing on failure.
    pub(crate) fn declaration(&mut self) -> Option<Stmt> {
        let start = self.current;
        let result = if self.check(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.errors.push(err);
                self.synchronize(start);
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line;

        let name = self
            .expect(TokenKind::Identifier, |found, line| {
                ParserError::MissingVariableName { found, line }
            })?
            .lexeme;

        let initializer = if self.match_token(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect_semicolon("variable declaration")?;
        Ok(Stmt::new(StmtKind::Var { name, initializer }, line))
    }

    pub(crate) fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Print => self.print_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::LeftBrace => self.block_statement(),
            _ => self.expression_statement(),
        }
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line;
        let value = self.expression()?;
        self.expect_semicolon("value")?;
        Ok(Stmt::new(StmtKind::Print(value), line))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line;
        let condition = self.parenthesized_condition("if")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        ))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line;
        let condition = self.parenthesized_condition("while")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::new(StmtKind::While { condition, body }, line))
    }

    fn block_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.expect(TokenKind::RightBrace, |found, line| {
            ParserError::MissingBrace { found, line }
        })?;

        Ok(Stmt::new(StmtKind::Block(statements), line))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        let line = expr.line;
        self.expect_semicolon("expression")?;
        Ok(Stmt::new(StmtKind::Expression(expr), line))
    }

    fn parenthesized_condition(&mut self, keyword: &'static str) -> ParseResult<Expr> {
        self.expect(TokenKind::LeftParen, |found, line| {
            ParserError::MissingOpeningParenthesis {
                keyword,
                found,
                line,
            }
        })?;
        let condition = self.expression()?;
        self.expect(TokenKind::RightParen, |found, line| {
            ParserError::MissingClosingParenthesis {
                context: "condition",
                found,
                line,
            }
        })?;
        Ok(condition)
    }

    fn expect_semicolon(&mut self, after: &'static str) -> ParseResult<()> {
        self.expect(TokenKind::Semicolon, |found, line| {
            ParserError::MissingSemicolon { after, found, line }
        })?;
        Ok(())
    }
}
