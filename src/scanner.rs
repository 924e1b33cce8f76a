//! Streaming lexer.
//!
//! [`Scanner`] is an iterator over `Result<Token>`: lexical errors are yielded
//! in place and scanning carries on, so one pass reports every bad character.
//! Exactly one `EOF` token closes the stream, after which the iterator is
//! fused.
//!
//! Trivia (spaces, tabs, carriage returns, newlines and `//` comments) is
//! consumed before each token; newlines bump the line counter, as do newlines
//! inside string literals. Comments are skipped with `memchr`, and keywords
//! are recognised through a compile‑time perfect hash.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"for"    => TokenType::FOR,
    b"fun"    => TokenType::FUN,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// One past the last byte consumed.
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Byte `offset` ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn look(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b: u8 = self.look(0);
        self.pos += 1;
        b
    }

    /// `long` if the next byte is `=` (consuming it), else `short`.
    #[inline(always)]
    fn with_equal(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.pos += 1;
            long
        } else {
            short
        }
    }

    fn skip_trivia(&mut self) {
        while !self.at_end() {
            match self.look(0) {
                b' ' | b'\r' | b'\t' => self.pos += 1,
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b'/' if self.look(1) == b'/' => {
                    // Leave the newline itself for the next iteration.
                    self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(offset) => self.pos + offset,
                        None => self.bytes.len(),
                    };
                }
                _ => return,
            }
        }
    }

    /// Scan one token starting at `self.start`; trivia is already gone.
    fn scan_token(&mut self) -> Result<TokenType> {
        let kind: TokenType = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => return Err(self.unexpected()),
        };

        Ok(kind)
    }

    /// Skip the whole offending character, which may span several bytes.
    fn unexpected(&mut self) -> LoxError {
        let ch: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
        self.pos = self.start + ch.len_utf8();

        LoxError::lex(self.line, format!("Unexpected character: {}", ch))
    }

    /// Strings may span lines and have no escapes.
    fn string(&mut self) -> Result<TokenType> {
        match memchr(b'"', &self.bytes[self.pos..]) {
            Some(offset) => {
                let body: &str = &self.src[self.pos..self.pos + offset];
                self.line += body.bytes().filter(|&b| b == b'\n').count();
                self.pos += offset + 1;

                Ok(TokenType::STRING(body.to_owned()))
            }
            None => {
                self.line += self.bytes[self.pos..].iter().filter(|&&b| b == b'\n').count();
                self.pos = self.bytes.len();

                Err(LoxError::lex(self.line, "Unterminated string."))
            }
        }
    }

    /// `123` or `12.5`; a trailing `.` is left for the next token.
    fn number(&mut self) -> TokenType {
        while self.look(0).is_ascii_digit() {
            self.pos += 1;
        }

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.pos += 1;
            while self.look(0).is_ascii_digit() {
                self.pos += 1;
            }
        }

        // Only ASCII digits with at most one interior dot reach here.
        let value: f64 = self.src[self.start..self.pos].parse().unwrap_or(0.0);
        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.look(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.pos])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.skip_trivia();

        if self.at_end() {
            self.done = true;
            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        }

        self.start = self.pos;

        let item: Result<Token> = self.scan_token().map(|kind| {
            let lexeme: &str = &self.src[self.start..self.pos];
            debug!("Scanned {:?} on line {}", kind, self.line);
            Token::new(kind, lexeme, self.line)
        });

        Some(item)
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
