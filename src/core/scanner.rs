use std::iter::Peekable;

use log::debug;
use owned_chars::OwnedChars;

use super::{Diagnostics, Token, TokenType};

pub struct Scanner {
    // Scratch pad for the lexeme being scanned
    scratch: String,
    chars: Peekable<OwnedChars>,
    tokens: Vec<Token>,
    line: usize,
}

impl Scanner {
    /// Creates a new `Scanner` whose referent is `source`.
    ///
    /// A `Scanner` is really just an encapsulated iterator over a given
    /// source `String`. Rather than borrowing the source, it owns it as a
    /// `Peekable<OwnedChars>` iterator and accumulates each lexeme in a
    /// scratch buffer.
    #[must_use]
    pub fn new(source: String) -> Self {
        Scanner {
            // cautiously optimistic allocation
            scratch: String::with_capacity(1024),
            chars: OwnedChars::from_string(source).peekable(),
            tokens: Vec::new(),
            line: 1,
        }
    }

    /// Scans the whole source into a token stream.
    ///
    /// Scanning is total: illegal characters, unterminated strings, and
    /// malformed numbers are reported into `diagnostics` and scanning keeps
    /// going, so the caller always receives a stream ending in exactly one
    /// `Eof` token.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while let Some(c) = self.advance() {
            self.scan_token(c, diagnostics);
            self.scratch.clear();
        }

        self.tokens.push(Token::new(TokenType::Eof, self.line));
        debug!("scanned {} tokens", self.tokens.len());

        self.tokens
    }

    fn scan_token(&mut self, c: char, diagnostics: &mut Diagnostics) {
        match c {
            // advance() already bumped the line counter for '\n'
            ' ' | '\r' | '\t' | '\n' => {}
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '!' => self.is_compound_equal_operator(TokenType::BangEqual, TokenType::Bang),
            '=' => self.is_compound_equal_operator(TokenType::EqualEqual, TokenType::Equal),
            '<' => self.is_compound_equal_operator(TokenType::LessEqual, TokenType::Less),
            '>' => self.is_compound_equal_operator(TokenType::GreaterEqual, TokenType::Greater),
            '/' => {
                if let Some('/') = self.peek() {
                    // A comment runs to end-of-line but leaves the newline
                    // for the next scan step, so line accounting stays with
                    // advance().
                    while self.peek().map_or(false, |c| c != '\n') {
                        self.advance();
                    }

                    self.add_token(TokenType::Comment);
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            '"' => self.string(diagnostics),
            c => {
                if Scanner::is_digit(Some(c)) {
                    self.number(diagnostics);
                } else if c.is_ascii_alphabetic() || c == '_' {
                    self.identifier();
                } else {
                    diagnostics.error(self.line, "Unexpected character.");
                }
            }
        };
    }

    // this method has weird semantics. it feels like the right abstraction
    // but maybe it can use some work
    fn is_compound_equal_operator(&mut self, yes: TokenType, no: TokenType) {
        if let Some('=') = self.peek() {
            self.advance();
            self.add_token(yes);
        } else {
            self.add_token(no);
        };
    }

    fn identifier(&mut self) {
        while Scanner::is_identifier_char(self.peek()) {
            self.advance();
        }

        self.add_token(TokenType::identifier_from_str(&self.scratch));
    }

    /// Adapter for Option<char>
    fn is_identifier_char(c: Option<char>) -> bool {
        c.map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Adapter for Option<char>
    fn is_digit(c: Option<char>) -> bool {
        c.map_or(false, |c| c.is_ascii_digit())
    }

    fn number(&mut self, diagnostics: &mut Diagnostics) {
        while Scanner::is_digit(self.peek()) {
            self.advance();
        }

        if let Some('.') = self.peek() {
            self.advance();

            while Scanner::is_digit(self.peek()) {
                self.advance();
            }
        }

        match self.scratch.parse::<f64>() {
            Ok(value) => self.add_token(TokenType::Number(value)),
            Err(_) => diagnostics.error(self.line, "Invalid number"),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn string(&mut self, diagnostics: &mut Diagnostics) {
        while self.peek().map_or(false, |c| c != '"') {
            self.advance();
        }

        // Reaching end-of-source before the closing quote is reported at the
        // line scanning stopped on, which for a multi-line literal is not
        // the line it started on.
        if self.peek().is_none() {
            diagnostics.error(self.line, "Unterminated string");
            return;
        }

        self.advance();

        debug_assert!(self.scratch.starts_with('"'));
        let value = self
            .scratch
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or_default();

        self.add_token(TokenType::String(value.to_owned()));
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|c| {
            if c == '\n' {
                self.line += 1;
            }

            self.scratch.push(c);
            c
        })
    }

    fn add_token(&mut self, token: TokenType) {
        self.tokens.push(Token::new(token, self.line));
    }
}
