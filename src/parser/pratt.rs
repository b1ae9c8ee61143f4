//! Pratt (operator-precedence) expression parser.
//!
//! Each token kind maps to a rule of optional prefix and infix handlers plus
//! a binding power. `parse_precedence` keeps folding infix operators while
//! the next operator binds at least as tightly as the requested level; the
//! right operand of a binary operator is parsed one level tighter, which
//! makes every binary operator left associative.

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

use super::core::{ParseResult, Parser};
use super::expressions::binary_operator;
use super::precedence::{get_precedence, Precedence};
use super::Parsed;

type PrefixFn = fn(&mut Parser, Token, bool) -> ParseResult<Expr>;
type InfixFn = fn(&mut Parser, Expr, Token) -> ParseResult<Expr>;

/// One row of the rule table.
#[derive(Clone, Copy)]
pub(crate) struct ParseRule {
    pub prefix: Option<PrefixFn>,
    pub infix: Option<InfixFn>,
    pub precedence: Precedence,
}

pub(crate) fn rule(kind: TokenKind) -> ParseRule {
    ParseRule {
        prefix: prefix_rule(kind),
        infix: infix_rule(kind),
        precedence: get_precedence(kind),
    }
}

fn prefix_rule(kind: TokenKind) -> Option<PrefixFn> {
    match kind {
        TokenKind::LeftParen => Some(Parser::grouping),
        TokenKind::Minus | TokenKind::Bang => Some(Parser::prefix_unary),
        TokenKind::Number
        | TokenKind::String
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Nil => Some(Parser::literal),
        TokenKind::Identifier => Some(Parser::variable),
        _ => None,
    }
}

fn infix_rule(kind: TokenKind) -> Option<InfixFn> {
    match kind {
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Star
        | TokenKind::Slash
        | TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual => Some(Parser::infix_binary),
        TokenKind::And | TokenKind::Or => Some(Parser::infix_logical),
        _ => None,
    }
}

/// Expression-only front end driven by the rule table.
pub struct PrattParser {
    parser: Parser,
}

impl PrattParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            parser: Parser::new(tokens),
        }
    }

    /// Parse a single expression with an optional trailing `;`.
    pub fn parse(mut self) -> Parsed<Option<Expr>> {
        let ast = match self.parser.pratt_expression() {
            Ok(expr) => {
                self.parser.match_token(TokenKind::Semicolon);
                if !self.parser.is_at_end() {
                    let token = self.parser.peek();
                    let err = ParserError::unexpected_token(
                        "end of expression",
                        token.describe(),
                        token.line,
                    );
                    self.parser.errors.push(err);
                }
                Some(expr)
            }
            Err(err) => {
                self.parser.errors.push(err);
                None
            }
        };

        Parsed::new(ast, self.parser.errors)
    }
}

impl Parser {
    pub(crate) fn pratt_expression(&mut self) -> ParseResult<Expr> {
        self.parse_precedence(Precedence::Assignment)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let Some(prefix) = rule(token.kind).prefix else {
            return Err(ParserError::expression_expected(
                token.describe(),
                token.line,
            ));
        };
        self.advance();

        let can_assign = precedence <= Precedence::Assignment;
        let mut left = prefix(self, token, can_assign)?;

        while precedence <= rule(self.peek().kind).precedence {
            let operator = self.advance();
            let Some(infix) = rule(operator.kind).infix else {
                break;
            };
            left = infix(self, left, operator)?;
        }

        if can_assign && self.check(TokenKind::Equal) {
            return Err(ParserError::InvalidAssignment(self.current_line()));
        }

        Ok(left)
    }

    // ===== Prefix handlers =====

    fn grouping(&mut self, token: Token, _can_assign: bool) -> ParseResult<Expr> {
        let inner = self.parse_precedence(Precedence::Assignment)?;
        self.expect_closing_paren()?;
        Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), token.line))
    }

    fn prefix_unary(&mut self, token: Token, _can_assign: bool) -> ParseResult<Expr> {
        let operator = if token.kind == TokenKind::Minus {
            UnaryOp::Negate
        } else {
            UnaryOp::Not
        };
        let operand = self.parse_precedence(Precedence::Unary)?;
        Ok(Expr::new(
            ExprKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            token.line,
        ))
    }

    fn literal(&mut self, token: Token, _can_assign: bool) -> ParseResult<Expr> {
        let value = match token.kind {
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Nil => Value::Nil,
            _ => token.literal.unwrap_or(Value::Nil),
        };
        Ok(Expr::new(ExprKind::Literal(value), token.line))
    }

    fn variable(&mut self, token: Token, can_assign: bool) -> ParseResult<Expr> {
        if can_assign && self.match_token(TokenKind::Equal) {
            let value = self.parse_precedence(Precedence::Assignment)?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    name: token.lexeme,
                    value: Box::new(value),
                },
                token.line,
            ));
        }

        Ok(Expr::new(ExprKind::Variable(token.lexeme), token.line))
    }

    // ===== Infix handlers =====

    fn infix_binary(&mut self, left: Expr, operator: Token) -> ParseResult<Expr> {
        let precedence = get_precedence(operator.kind);
        let right = self.parse_precedence(precedence.next())?;
        Ok(Expr::binary(
            left,
            binary_operator(&operator)?,
            right,
            operator.line,
        ))
    }

    fn infix_logical(&mut self, left: Expr, operator: Token) -> ParseResult<Expr> {
        let (logical, precedence) = if operator.kind == TokenKind::And {
            (LogicalOp::And, Precedence::And)
        } else {
            (LogicalOp::Or, Precedence::Or)
        };
        let right = self.parse_precedence(precedence.next())?;
        Ok(Expr::new(
            ExprKind::Logical {
                left: Box::new(left),
                operator: logical,
                right: Box::new(right),
            },
            operator.line,
        ))
    }
}
