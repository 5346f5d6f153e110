// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Lexer for plugin source units.

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Half-open byte range into a source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    Fn,
    Let,
    Return,
    If,
    Else,
    For,
    In,
    While,
    True,
    False,
    None,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,

    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,

    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(v) => format!("integer {}", v),
            TokenKind::Float(v) => format!("float {}", v),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while let Some((start, ch)) = self.chars.next() {
            match ch {
                c if c.is_whitespace() => continue,
                '/' if self.peek_is('/') => self.skip_line(),
                '(' => self.push(TokenKind::LParen, start, 1),
                ')' => self.push(TokenKind::RParen, start, 1),
                '{' => self.push(TokenKind::LBrace, start, 1),
                '}' => self.push(TokenKind::RBrace, start, 1),
                '[' => self.push(TokenKind::LBracket, start, 1),
                ']' => self.push(TokenKind::RBracket, start, 1),
                ',' => self.push(TokenKind::Comma, start, 1),
                ';' => self.push(TokenKind::Semi, start, 1),
                '+' => self.push(TokenKind::Plus, start, 1),
                '-' => self.push(TokenKind::Minus, start, 1),
                '*' => self.push(TokenKind::Star, start, 1),
                '/' => self.push(TokenKind::Slash, start, 1),
                '%' => self.push(TokenKind::Percent, start, 1),
                '=' => self.either('=', TokenKind::Eq, TokenKind::Assign, start),
                '!' => self.either('=', TokenKind::Ne, TokenKind::Bang, start),
                '<' => self.either('=', TokenKind::Le, TokenKind::Lt, start),
                '>' => self.either('=', TokenKind::Ge, TokenKind::Gt, start),
                '&' => self.pair('&', TokenKind::AndAnd, start)?,
                '|' => self.pair('|', TokenKind::OrOr, start)?,
                '"' => self.string(start)?,
                c if c.is_ascii_digit() => self.number(start)?,
                c if c.is_alphabetic() || c == '_' => self.word(start, c),
                other => {
                    return Err(ParseError::new(
                        format!("unexpected character '{}'", other),
                        start,
                    ))
                }
            }
        }
        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
        });
        Ok(self.tokens)
    }

    fn peek_is(&mut self, expected: char) -> bool {
        matches!(self.chars.peek(), Some((_, c)) if *c == expected)
    }

    fn push(&mut self, kind: TokenKind, start: usize, len: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, start + len),
        });
    }

    fn either(&mut self, next: char, double: TokenKind, single: TokenKind, start: usize) {
        if self.peek_is(next) {
            self.chars.next();
            self.push(double, start, 2);
        } else {
            self.push(single, start, 1);
        }
    }

    fn pair(&mut self, next: char, kind: TokenKind, start: usize) -> Result<(), ParseError> {
        if self.peek_is(next) {
            self.chars.next();
            self.push(kind, start, 2);
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected '{}{}'", next, next),
                start,
            ))
        }
    }

    fn skip_line(&mut self) {
        while let Some((_, c)) = self.chars.peek() {
            if *c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn string(&mut self, start: usize) -> Result<(), ParseError> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((end, '"')) => {
                    self.tokens.push(Token {
                        kind: TokenKind::Str(value),
                        span: Span::new(start, end + 1),
                    });
                    return Ok(());
                }
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c)) => value.push(c),
                    None => break,
                },
                Some((_, c)) => value.push(c),
                None => break,
            }
        }
        Err(ParseError::new("unterminated string literal", start))
    }

    fn number(&mut self, start: usize) -> Result<(), ParseError> {
        let mut end = start + 1;
        let mut is_float = false;
        while let Some((idx, c)) = self.chars.peek().copied() {
            if c.is_ascii_digit() {
                end = idx + 1;
                self.chars.next();
            } else if c == '.' && !is_float && self.digit_follows(idx) {
                is_float = true;
                end = idx + 1;
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        let kind = if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| ParseError::new(format!("invalid float '{}'", text), start))?
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| ParseError::new(format!("integer '{}' out of range", text), start))?
        };
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
        Ok(())
    }

    fn digit_follows(&self, dot: usize) -> bool {
        self.source[dot + 1..]
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    }

    fn word(&mut self, start: usize, first: char) {
        let mut end = start + first.len_utf8();
        while let Some((idx, c)) = self.chars.peek().copied() {
            if c.is_alphanumeric() || c == '_' {
                end = idx + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        let kind = match text {
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "none" => TokenKind::None,
            _ => TokenKind::Ident(text.to_string()),
        };
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }
}
