//! A hand-written lexer for the schema source language (spec §6).
//!
//! The distilled spec assumes a syntax tree already exists and puts the
//! concrete grammar out of scope; SPEC_FULL still needs *something* to
//! turn source text into one. This scans one character at a time with an
//! explicit position cursor, the same style as the teacher's
//! `utils/parsed_type::TypeParser`, scaled up to the full declaration
//! grammar instead of just a type spelling.

use crate::error::ParseError;
use crate::span::{Cursor, Position, Span};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    Equals,
    Dot,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    file: &'a Path,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: &'a Path) -> Self {
        Self {
            cursor: Cursor::new(source),
            file,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn err(&self, at: Position, message: impl Into<String>) -> ParseError {
        ParseError {
            file: self.file.to_path_buf(),
            location: at,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.cursor.take_while(char::is_whitespace);
            match (self.cursor.peek(), self.cursor.peek_at(1)) {
                (Some('/'), Some('/')) => {
                    self.cursor.take_while(|c| c != '\n');
                }
                (Some('/'), Some('*')) => {
                    self.cursor.bump();
                    self.cursor.bump();
                    while !self.cursor.is_eof() {
                        if self.cursor.peek() == Some('*') && self.cursor.peek_at(1) == Some('/') {
                            self.cursor.bump();
                            self.cursor.bump();
                            break;
                        }
                        self.cursor.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let start = self.cursor.position();
        let Some(c) = self.cursor.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        };

        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '=' => self.single(TokenKind::Equals),
            '.' => self.single(TokenKind::Dot),
            '"' => self.lex_string(start)?,
            c if c == '-' || c.is_ascii_digit() => self.lex_number(start)?,
            c if c == '_' || c.is_alphabetic() => self.lex_ident(),
            other => return Err(self.err(start, format!("unexpected character '{other}'"))),
        };

        Ok(Token {
            kind,
            span: Span::new(start, self.cursor.position()),
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.bump();
        kind
    }

    fn lex_ident(&mut self) -> TokenKind {
        let text = self
            .cursor
            .take_while(|c| c == '_' || c.is_alphanumeric());
        TokenKind::Ident(text.to_string())
    }

    fn lex_number(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        let negative = self.cursor.peek() == Some('-');
        if negative {
            self.cursor.bump();
        }

        let mut text = String::new();
        text.push_str(self.cursor.take_while(|c| c.is_ascii_digit()));

        let mut is_float = false;
        if self.cursor.peek() == Some('.') && self.cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.cursor.bump();
            text.push('.');
            text.push_str(self.cursor.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.cursor.peek(), Some('e') | Some('E')) {
            is_float = true;
            text.push(self.cursor.bump().unwrap());
            if matches!(self.cursor.peek(), Some('+') | Some('-')) {
                text.push(self.cursor.bump().unwrap());
            }
            text.push_str(self.cursor.take_while(|c| c.is_ascii_digit()));
        }

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.err(start, format!("invalid float literal '{text}'")))?;
            Ok(TokenKind::Float(if negative { -value } else { value }))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.err(start, format!("invalid integer literal '{text}'")))?;
            Ok(TokenKind::Int(if negative { -value } else { value }))
        }
    }

    fn lex_string(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        self.cursor.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.cursor.bump() {
                None => return Err(self.err(start, "unterminated string literal")),
                Some('"') => break,
                Some('\\') => match self.cursor.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => value.push(other),
                    None => return Err(self.err(start, "unterminated string literal")),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::Str(value))
    }
}
