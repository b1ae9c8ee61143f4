//! Expression parsing by precedence climbing, one function per level.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

use super::core::{ParseResult, Parser};

type Level = fn(&mut Parser) -> ParseResult<Expr>;

impl Parser {
    pub(crate) fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logic_or()?;

        if self.match_token(TokenKind::Equal) {
            let equals_line = self.previous().line;
            let value = self.assignment()?;

            return match expr.kind {
                ExprKind::Variable(name) => Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    expr.line,
                )),
                // Reported without unwinding: the statement itself is well formed
                kind => {
                    self.errors.push(ParserError::InvalidAssignment(equals_line));
                    Ok(Expr::new(kind, expr.line))
                }
            };
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        self.logical(TokenKind::Or, LogicalOp::Or, Parser::logic_and)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        self.logical(TokenKind::And, LogicalOp::And, Parser::equality)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[TokenKind::EqualEqual, TokenKind::BangEqual],
            Parser::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Parser::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenKind::Plus, TokenKind::Minus], Parser::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenKind::Star, TokenKind::Slash], Parser::unary)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if let Some(token) = self.match_any(&[TokenKind::Minus, TokenKind::Bang]) {
            let operator = if token.kind == TokenKind::Minus {
                UnaryOp::Negate
            } else {
                UnaryOp::Not
            };
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    operator,
                    operand: Box::new(operand),
                },
                token.line,
            ));
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();

        let kind = match token.kind {
            TokenKind::Number | TokenKind::String => {
                ExprKind::Literal(token.literal.clone().unwrap_or(Value::Nil))
            }
            TokenKind::True => ExprKind::Literal(Value::Bool(true)),
            TokenKind::False => ExprKind::Literal(Value::Bool(false)),
            TokenKind::Nil => ExprKind::Literal(Value::Nil),
            TokenKind::Identifier => ExprKind::Variable(token.lexeme.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect_closing_paren()?;
                return Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), token.line));
            }
            _ => {
                return Err(ParserError::expression_expected(
                    token.describe(),
                    token.line,
                ))
            }
        };

        self.advance();
        Ok(Expr::new(kind, token.line))
    }

    // ===== Helpers =====

    /// Left-associative binary level: `next ((op) next)*`.
    fn binary(&mut self, operators: &[TokenKind], next: Level) -> ParseResult<Expr> {
        let mut expr = next(self)?;

        while let Some(token) = self.match_any(operators) {
            let right = next(self)?;
            expr = Expr::binary(expr, binary_operator(&token)?, right, token.line);
        }

        Ok(expr)
    }

    fn logical(&mut self, kind: TokenKind, operator: LogicalOp, next: Level) -> ParseResult<Expr> {
        let mut expr = next(self)?;

        while self.match_token(kind) {
            let line = self.previous().line;
            let right = next(self)?;
            expr = Expr::new(
                ExprKind::Logical {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                },
                line,
            );
        }

        Ok(expr)
    }

    pub(crate) fn expect_closing_paren(&mut self) -> ParseResult<Token> {
        self.expect(TokenKind::RightParen, |found, line| {
            ParserError::MissingClosingParenthesis {
                context: "grouping",
                found,
                line,
            }
        })
    }
}

pub(crate) fn binary_operator(token: &Token) -> ParseResult<BinaryOp> {
    BinaryOp::from_token(token.kind).ok_or_else(|| {
        ParserError::unexpected_token("binary operator", token.describe(), token.line)
    })
}
