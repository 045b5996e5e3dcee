//! One‑pass streaming lexer for Lox.
//!
//! `Scanner` turns a byte slice into `Result<Token>` items, skipping
//! whitespace and `//` comments and yielding exactly one `EOF` token at the
//! end. A lexing error does not stop the scan: the offending byte is reported
//! and scanning resumes with the next one, so a single pass surfaces every
//! lexical error of the input.
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let tokens: Vec<_> = Scanner::new(b"print 123; // example")
//!     .filter_map(Result::ok)
//!     .collect();
//! assert_eq!(tokens.len(), 4);
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
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
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
    src: &'a [u8],
    start: usize,               // first byte of the current lexeme
    curr: usize,                // one past the last byte examined
    line: usize,                // 1‑based
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    /// Drain the scanner, splitting tokens from lexical errors.
    pub fn scan_all(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        (tokens, errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.src.get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.src.get(self.curr + 1).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == expected && !self.is_at_end() {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    fn either(&mut self, second: u8, matched: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(second) {
            matched
        } else {
            single
        }
    }

    fn lexeme(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.src[from..to]).into_owned()
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan one lexeme starting at `self.curr`. Whitespace and comments leave
    /// `pending` empty.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
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

            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;
                return Ok(());
            }

            b'/' if self.match_byte(b'/') => {
                // Jump straight to the newline; it is consumed (and counted)
                // by the next call.
                match memchr(b'\n', &self.src[self.curr..]) {
                    Some(pos) => self.curr += pos,
                    None => self.curr = self.src.len(),
                }
                return Ok(());
            }

            b'/' => TokenType::SLASH,

            b'"' => self.string()?,

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// `self.start` points at the opening quote; on success `self.curr` is
    /// past the closing one. Strings may span lines.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1;

        Ok(TokenType::STRING(self.lexeme(self.start + 1, self.curr - 1)))
    }

    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;

            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        // Only ASCII digits and one dot were consumed, so parsing cannot fail.
        let n = self
            .lexeme(self.start, self.curr)
            .parse::<f64>()
            .unwrap_or_default();

        TokenType::NUMBER(n)
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.src.len() {
            if self.curr == self.src.len() {
                // Step past the end so the iterator stays fused.
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                debug!("Lex error: {}", e);
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme = self.lexeme(self.start, self.curr);
                return Some(Ok(Token::new(tt, lexeme, self.line)));
            }
        }

        None
    }
}

impl FusedIterator for Scanner<'_> {}
