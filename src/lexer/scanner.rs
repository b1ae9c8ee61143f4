//! Lexer/Scanner for script source code.

use crate::error::LexerError;
use crate::lexer::token::{Token, TokenKind};
use crate::value::Value;

/// Scan `source` into tokens, collecting every lexical error in one pass.
pub fn scan(source: &str) -> (Vec<Token>, Vec<LexerError>) {
    Scanner::new(source).scan_tokens()
}

/// The lexer transforms source code into a stream of tokens.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    start_pos: usize,
    start_line: usize,
    errors: Vec<LexerError>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            start_pos: 0,
            start_line: 1,
            errors: Vec::new(),
        }
    }

    /// Scan all tokens from the source.
    ///
    /// The token stream always ends with a single `Eof` token, even when
    /// errors were recorded.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<LexerError>) {
        let mut tokens = Vec::new();

        loop {
            match self.scan_token() {
                Some(token) => {
                    let is_eof = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if is_eof {
                        break;
                    }
                }
                None => continue,
            }
        }

        (tokens, self.errors)
    }

    /// Scan the next token. Returns `None` when the characters consumed
    /// produced a diagnostic instead of a token.
    fn scan_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        self.mark_start();

        let Some((_, c)) = self.advance() else {
            return Some(Token::eof(self.line));
        };

        match c {
            '(' => Some(self.make_token(TokenKind::LeftParen)),
            ')' => Some(self.make_token(TokenKind::RightParen)),
            '{' => Some(self.make_token(TokenKind::LeftBrace)),
            '}' => Some(self.make_token(TokenKind::RightBrace)),
            ',' => Some(self.make_token(TokenKind::Comma)),
            '.' => Some(self.make_token(TokenKind::Dot)),
            '-' => Some(self.make_token(TokenKind::Minus)),
            '+' => Some(self.make_token(TokenKind::Plus)),
            ';' => Some(self.make_token(TokenKind::Semicolon)),
            '*' => Some(self.make_token(TokenKind::Star)),
            '/' => Some(self.make_token(TokenKind::Slash)),

            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                Some(self.make_token(kind))
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                Some(self.make_token(kind))
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                Some(self.make_token(kind))
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                Some(self.make_token(kind))
            }

            '"' => self.scan_string(),

            c if c.is_ascii_digit() => self.scan_number(),

            c if c.is_alphabetic() || c == '_' => Some(self.scan_identifier()),

            _ => {
                self.errors
                    .push(LexerError::unexpected_char(c, self.start_line));
                None
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Strings have no escape sequences and may span lines.
    fn scan_string(&mut self) -> Option<Token> {
        loop {
            match self.peek() {
                None => {
                    self.errors
                        .push(LexerError::unterminated_string(self.start_line));
                    return None;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        // Strip the surrounding quotes
        let value = &self.source[self.start_pos + 1..self.current_pos - 1];
        Some(self.make_literal(TokenKind::String, Value::string(value)))
    }

    fn scan_number(&mut self) -> Option<Token> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // A '.' only belongs to the number when a digit follows it
        let mut is_double = false;
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            is_double = true;
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.lexeme();
        let literal = if is_double {
            text.parse::<f64>().ok().map(Value::Double)
        } else {
            text.parse::<i64>().ok().map(Value::Int)
        };

        match literal {
            Some(value) => Some(self.make_literal(TokenKind::Number, value)),
            None => {
                self.errors
                    .push(LexerError::invalid_number(text, self.start_line));
                None
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let kind = TokenKind::keyword(self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let (pos, c) = self.chars.next()?;
        self.current_pos = pos + c.len_utf8();
        Some((pos, c))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark_start(&mut self) {
        self.start_pos = self.current_pos;
        self.start_line = self.line;
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start_pos..self.current_pos]
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.start_line)
    }

    fn make_literal(&self, kind: TokenKind, literal: Value) -> Token {
        Token::with_literal(kind, self.lexeme(), literal, self.start_line)
    }
}
