//! Lexer for GraphQL.

use std::borrow::Cow;

use crate::token::{Token, TokenKind};
use strawberry_core::{Interner, Span, Text};

/// A lexer for GraphQL source text.
///
/// Commas, whitespace, line terminators, comments and a leading byte
/// order mark are insignificant and never produce tokens.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
    interner: &'a Interner,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    /// Returns the current position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::empty(start));
        };

        let kind = match c {
            b'{' => self.punct(TokenKind::LBrace),
            b'}' => self.punct(TokenKind::RBrace),
            b'(' => self.punct(TokenKind::LParen),
            b')' => self.punct(TokenKind::RParen),
            b'[' => self.punct(TokenKind::LBracket),
            b']' => self.punct(TokenKind::RBracket),
            b':' => self.punct(TokenKind::Colon),
            b'=' => self.punct(TokenKind::Eq),
            b'|' => self.punct(TokenKind::Pipe),
            b'&' => self.punct(TokenKind::Amp),
            b'@' => self.punct(TokenKind::At),
            b'!' => self.punct(TokenKind::Bang),
            b'$' => self.punct(TokenKind::Dollar),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    self.advance();
                    TokenKind::Error
                }
            }

            b'"' => self.scan_string(),
            b'-' | b'0'..=b'9' => self.scan_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                // Skip the whole UTF-8 sequence so spans stay on char boundaries.
                let width = self.source[self.pos as usize..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.advance_by(u32::try_from(width).unwrap_or(1));
                TokenKind::Error
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    #[inline]
    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => {
                    self.advance();
                }
                Some(b'#') => {
                    let rest = &self.bytes[self.pos as usize..];
                    let len = memchr::memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
                    self.advance_by(u32::try_from(len).unwrap_or(u32::MAX));
                }
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        TokenKind::from_keyword(self.slice_from(start)).unwrap_or(TokenKind::Ident)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.advance();
        }

        match self.peek() {
            Some(b'0') => self.advance(),
            Some(c) if c.is_ascii_digit() => self.advance_while(|c| c.is_ascii_digit()),
            _ => return TokenKind::Error,
        }

        if self.peek() == Some(b'.') {
            if !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                return TokenKind::Error;
            }
            is_float = true;
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return TokenKind::Error;
            }
            self.advance_while(|c| c.is_ascii_digit());
        }

        // `123abc` is not two tokens.
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            self.advance_while(|c| c.is_ascii_alphanumeric() || c == b'_');
            return TokenKind::Error;
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance();

        if self.peek() == Some(b'"') && self.peek_at(1) == Some(b'"') {
            self.advance_by(2);
            return self.scan_block_string();
        }

        loop {
            let rest = &self.bytes[self.pos as usize..];
            let Some(offset) = memchr::memchr3(b'"', b'\\', b'\n', rest) else {
                self.advance_by(u32::try_from(rest.len()).unwrap_or(u32::MAX));
                return TokenKind::Error;
            };
            self.advance_by(u32::try_from(offset).unwrap_or(u32::MAX));
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return TokenKind::StringLiteral;
                }
                Some(b'\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => return TokenKind::Error,
            }
        }
    }

    fn scan_block_string(&mut self) -> TokenKind {
        loop {
            match self.peek() {
                None => return TokenKind::Error,
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    self.advance_by(3);
                    return TokenKind::BlockStringLiteral;
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    self.advance_by(4);
                }
                _ => self.advance(),
            }
        }
    }

    #[inline]
    fn slice_from(&self, start: u32) -> &'a str {
        &self.source[start as usize..self.pos as usize]
    }

    /// Interns the text at the given span.
    pub fn intern_span(&self, span: Span) -> Text {
        self.interner.intern(self.span_text(span))
    }

    /// Gets the text at the given span.
    pub fn span_text(&self, span: Span) -> &'a str {
        span.slice(self.source).unwrap_or_default()
    }
}

/// Tokenizes the entire source.
pub fn tokenize(source: &str, interner: &Interner) -> Vec<Token> {
    let mut lexer = Lexer::new(source, interner);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    tokens
}

/// Decodes the escape sequences of a quoted string's contents (without the
/// surrounding quotes). Returns `None` on an invalid escape.
pub fn unescape_string(raw: &str) -> Option<Cow<'_, str>> {
    if memchr::memchr(b'\\', raw.as_bytes()).is_none() {
        return Some(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let code = read_hex4(&mut chars)?;
                if (0xD800..0xDC00).contains(&code) {
                    // High surrogate: must be followed by `\uDC00..\uDFFF`.
                    if chars.next()? != '\\' || chars.next()? != 'u' {
                        return None;
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(combined)?);
                } else {
                    out.push(char::from_u32(code)?);
                }
            }
            _ => return None,
        }
    }
    Some(Cow::Owned(out))
}

fn read_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// Computes the value of a block string's raw contents (without the
/// surrounding triple quotes): common indentation is removed and leading
/// and trailing blank lines are dropped.
pub fn block_string_value(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\n', '\r']) && !raw.contains("\\\"\"\"") {
        return if raw.trim_matches([' ', '\t']).is_empty() {
            Cow::Borrowed("")
        } else {
            Cow::Borrowed(raw)
        };
    }

    let raw = raw.replace("\\\"\"\"", "\"\"\"");
    let lines: Vec<&str> = raw.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();

    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();
    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| indent_of(line) < line.len())
        .map(|line| indent_of(line))
        .min();

    let mut dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| match common_indent {
            Some(indent) if i > 0 => line.get(indent..).unwrap_or(""),
            _ => line,
        })
        .collect();

    let is_blank = |line: &&str| line.trim_matches([' ', '\t']).is_empty();
    while dedented.first().is_some_and(is_blank) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(is_blank) {
        dedented.pop();
    }

    Cow::Owned(dedented.join("\n"))
}
