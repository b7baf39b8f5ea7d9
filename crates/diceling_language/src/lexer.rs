//! Lexer for dice expressions.
//!
//! The lexer converts expression text into a stream of tokens. A lone `d`
//! (or `D`) is the dice operator whenever it is not the start of a longer
//! identifier, so `1d20`, `d` and `2d(3)` all lex as dice while `dex` stays
//! a variable name.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for dice expression source.
pub struct Lexer<'src> {
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            position: 0,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek_char() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '%' => self.single(TokenKind::Percent),
            '^' => self.single(TokenKind::Caret),
            '=' => self.single(TokenKind::Assign),
            '+' => self.with_assign(TokenKind::Plus, TokenKind::PlusAssign),
            '-' => self.with_assign(TokenKind::Minus, TokenKind::MinusAssign),
            '/' => self.with_assign(TokenKind::Slash, TokenKind::SlashAssign),
            '*' => {
                self.advance();
                match self.peek_char() {
                    Some('*') => self.single(TokenKind::Caret),
                    Some('=') => self.single(TokenKind::StarAssign),
                    _ => TokenKind::Star,
                }
            }
            '"' => self.scan_string(),
            '`' => self.scan_format_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            'd' | 'D' if !self.peek_char_n(1).is_some_and(is_ident_continue)
                || self.peek_char_n(1).is_some_and(|n| n.is_ascii_digit()) =>
            {
                self.single(TokenKind::Dice)
            }
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(kind, Span::new(start, self.position))
    }

    /// Tokenizes all source. The last token is always [`TokenKind::Eof`].
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Scans `op` or `op=`.
    fn with_assign(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some('=') {
            self.advance();
            assign
        } else {
            plain
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.rest;
        let mut len = 0;
        while let Some(c) = self.peek_char() {
            if !c.is_ascii_digit() {
                break;
            }
            len += 1;
            self.advance();
        }
        match start[..len].parse::<i64>() {
            Ok(n) => TokenKind::Int(n),
            Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let mut name = String::new();
        if let Some(c) = self.peek_char() {
            name.push(c);
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.advance();
        }
        TokenKind::Ident(name)
    }

    /// Scans a `"..."` literal, resolving escapes.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return TokenKind::Str(text);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error("unterminated string literal".into());
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated string literal".into()),
            }
        }
    }

    /// Scans a `` `...` `` literal. Placeholders are left for the compiler.
    fn scan_format_string(&mut self) -> TokenKind {
        self.advance(); // opening '`'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('`') => {
                    self.advance();
                    return TokenKind::FormatStr(text);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated format string".into()),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}
