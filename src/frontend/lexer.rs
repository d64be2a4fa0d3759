//! Lexer for Go declarations
//!
//! Converts source code into a stream of tokens. Newlines and comments are
//! kept as tokens: spec boundaries and doc-comment association both depend
//! on them.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source (char index)
    pos: usize,
    /// Start position of current token (char index)
    start: usize,
    /// Byte offset of `pos`
    byte_pos: usize,
    /// Byte offset of `start`
    start_byte: usize,
    /// Line of `pos`
    line: usize,
    /// Line of `start`
    start_line: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            byte_pos: 0,
            start_byte: 0,
            line: 1,
            start_line: 1,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.pos += 1;
            self.byte_pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
            }
        }
        c
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start_byte, self.byte_pos, self.start_line, self.line)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn text(&self) -> String {
        self.source[self.start..self.pos].iter().collect()
    }

    /// Skip horizontal whitespace; newlines are tokens
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn read_line_comment(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        // Drop a trailing '\r' from CRLF sources
        let text = self.text();
        self.make_token(TokenKind::Comment(text.trim_end_matches('\r').to_string()))
    }

    fn read_block_comment(&mut self) -> Token {
        self.advance(); // skip /
        self.advance(); // skip *
        loop {
            match (self.peek(), self.peek_next()) {
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    return self.make_token(TokenKind::Comment(self.text()));
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => return self.make_token(TokenKind::Unterminated("block comment")),
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.text();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a number literal
    ///
    /// Handles Go's `0x`, `0o`, `0b` and legacy `0` octal prefixes and `_`
    /// digit separators. Floats and imaginary literals are recognized so
    /// the declaration can be parsed, but only integers are ever evaluated.
    fn read_number(&mut self) -> Token {
        let radix = if self.peek() == Some('0') {
            match self.peek_next() {
                Some('x') | Some('X') => 16,
                Some('o') | Some('O') => 8,
                Some('b') | Some('B') => 2,
                _ => 10,
            }
        } else {
            10
        };

        if radix != 10 {
            self.advance(); // 0
            self.advance(); // prefix
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            let digits: String = self.text()[2..].chars().filter(|&c| c != '_').collect();
            return self.integer_token(&digits, radix);
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_next().map_or(true, |c| c.is_ascii_digit() || !c.is_alphabetic()) {
            is_float = true;
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Imaginary suffix
        if self.peek() == Some('i') {
            is_float = true;
            self.advance();
        }

        let text: String = self.text().chars().filter(|&c| c != '_').collect();
        if is_float {
            let value = text.trim_end_matches('i').parse().unwrap_or(0.0);
            return self.make_token(TokenKind::FloatLit(value));
        }

        // Legacy octal: 0755
        if text.len() > 1 && text.starts_with('0') {
            return self.integer_token(&text[1..], 8);
        }
        self.integer_token(&text, 10)
    }

    fn integer_token(&self, digits: &str, radix: u32) -> Token {
        match i64::from_str_radix(digits, radix) {
            Ok(value) => self.make_token(TokenKind::IntLit(value)),
            Err(_) => self.make_token(TokenKind::BigIntLit(self.text())),
        }
    }

    /// Read an interpreted string literal
    fn read_string(&mut self) -> Token {
        self.advance(); // consume opening quote

        let mut value = String::new();
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.advance();
                    return self.make_token(TokenKind::StringLit(value));
                }
                '\\' => {
                    self.advance();
                    if let Some(escaped) = self.read_escape() {
                        value.push(escaped);
                    }
                }
                '\n' => break,
                _ => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.make_token(TokenKind::Unterminated("string literal"))
    }

    /// Read a raw (backquoted) string literal, which may span lines
    fn read_raw_string(&mut self) -> Token {
        self.advance(); // consume opening backquote

        let mut value = String::new();
        while let Some(c) = self.advance() {
            if c == '`' {
                return self.make_token(TokenKind::StringLit(value));
            }
            if c != '\r' {
                value.push(c);
            }
        }

        self.make_token(TokenKind::Unterminated("raw string literal"))
    }

    /// Read a rune literal
    fn read_char(&mut self) -> Token {
        self.advance(); // consume opening quote

        let c = match self.peek() {
            Some('\\') => {
                self.advance();
                self.read_escape()
            }
            Some('\n') | Some('\'') | None => None,
            Some(_) => self.advance(),
        };

        match (c, self.peek()) {
            (Some(c), Some('\'')) => {
                self.advance();
                self.make_token(TokenKind::CharLit(c))
            }
            _ => self.make_token(TokenKind::Unterminated("rune literal")),
        }
    }

    /// Decode the escape after a backslash
    fn read_escape(&mut self) -> Option<char> {
        let c = self.advance()?;
        let decoded = match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0'..='7' => {
                let mut code = c.to_digit(8)?;
                for _ in 0..2 {
                    code = code * 8 + self.advance()?.to_digit(8)?;
                }
                return char::from_u32(code);
            }
            'x' | 'u' | 'U' => {
                let len = match c {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut code = 0u32;
                for _ in 0..len {
                    code = code * 16 + self.advance()?.to_digit(16)?;
                }
                return char::from_u32(code);
            }
            other => other,
        };
        Some(decoded)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;
        self.start_byte = self.byte_pos;
        self.start_line = self.line;

        let Some(c) = self.peek() else {
            return Token::eof(self.make_span());
        };

        if c.is_alphabetic() || c == '_' {
            return self.read_identifier();
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_next().map_or(false, |n| n.is_ascii_digit())) {
            return self.read_number();
        }
        match c {
            '"' => return self.read_string(),
            '`' => return self.read_raw_string(),
            '\'' => return self.read_char(),
            '/' if self.peek_next() == Some('/') => return self.read_line_comment(),
            '/' if self.peek_next() == Some('*') => return self.read_block_comment(),
            _ => {}
        }

        self.advance();
        let kind = match c {
            '\n' => TokenKind::Newline,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '&' => match self.peek() {
                Some('&') => {
                    self.advance();
                    TokenKind::AndAnd
                }
                Some('^') => {
                    self.advance();
                    TokenKind::AndNot
                }
                _ => TokenKind::And,
            },
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    TokenKind::Or
                }
            }
            '<' => match self.peek() {
                Some('<') => {
                    self.advance();
                    TokenKind::Shl
                }
                Some('=') => {
                    self.advance();
                    TokenKind::Le
                }
                _ => TokenKind::Lt,
            },
            '>' => match self.peek() {
                Some('>') => {
                    self.advance();
                    TokenKind::Shr
                }
                Some('=') => {
                    self.advance();
                    TokenKind::Ge
                }
                _ => TokenKind::Gt,
            },
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Define
                } else {
                    TokenKind::Colon
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            _ => TokenKind::Unknown(c),
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
