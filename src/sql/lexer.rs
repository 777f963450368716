//! SQL Lexer (Tokenizer)
//!
//! This module converts statement strings into a stream of tokens.
//! Anything that is not a keyword, operator, delimiter or quoted literal is
//! a bare word, so values such as `pedro-32` or `3.14` survive untouched and
//! `age=54` splits into `age`, `=`, `54`.

use super::token::Token;
use crate::error::{Error, Result};

/// SQL Lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '*' => Token::Asterisk,
            '=' => Token::Eq,
            '<' => {
                self.advance();
                return Ok(match self.current() {
                    Some('=') => {
                        self.advance();
                        Token::Lte
                    }
                    Some('>') => {
                        self.advance();
                        Token::Neq
                    }
                    _ => Token::Lt,
                });
            }
            '>' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::Gte);
                }
                return Ok(Token::Gt);
            }
            '!' => {
                self.advance();
                if self.current() == Some('=') {
                    self.advance();
                    return Ok(Token::Neq);
                }
                return Err(Error::syntax(format!(
                    "'=' after '!' at position {}",
                    self.position
                )));
            }
            '\'' => return self.read_string(),
            _ => return Ok(self.read_word()),
        };

        self.advance();
        Ok(token)
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// The current character, if any
    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a string literal (single-quoted, `''` escapes a quote)
    fn read_string(&mut self) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == '\'' {
                if self.peek_char() == Some('\'') {
                    value.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    return Ok(Token::StringLiteral(value));
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::syntax(format!(
            "closing quote for literal starting at position {}",
            start_pos
        )))
    }

    /// Read a bare word, which may be a keyword
    fn read_word(&mut self) -> Token {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_whitespace() || is_delimiter(ch) {
                break;
            }
            value.push(ch);
            self.advance();
        }

        Token::from_keyword(&value).unwrap_or(Token::Word(value))
    }
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '(' | ')' | ',' | ';' | '=' | '<' | '>' | '!' | '\'')
}
