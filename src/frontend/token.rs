//! Token definitions for the Go declaration reader

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
///
/// Only the top-level declaration keywords are distinguished; every other
/// Go keyword is lexed as an identifier since the reader never parses
/// statement bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// package
    Package,
    /// import
    Import,
    /// type
    Type,
    /// const
    Const,
    /// var
    Var,
    /// func
    Func,

    // ============ Identifiers and Literals ============
    /// Identifier
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// Integer literal that does not fit in an i64
    BigIntLit(String),
    /// Floating-point (or imaginary) literal
    FloatLit(f64),
    /// Interpreted or raw string literal
    StringLit(String),
    /// Rune literal
    CharLit(char),

    // ============ Trivia ============
    /// `// ...` or `/* ... */`, text includes the markers
    Comment(String),
    /// End of line; significant for spec termination
    Newline,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// <<
    Shl,
    /// >>
    Shr,
    /// &^
    AndNot,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// !
    Not,
    /// =
    Eq,
    /// :=
    Define,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,

    // ============ Special ============
    /// Unterminated string, rune or block comment
    Unterminated(&'static str),
    /// Anything else Go allows outside declarations (`~`, `<-`, `...` pieces)
    Unknown(char),
    /// End of file
    Eof,
}

impl TokenKind {
    /// Get keyword from string
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "package" => Some(TokenKind::Package),
            "import" => Some(TokenKind::Import),
            "type" => Some(TokenKind::Type),
            "const" => Some(TokenKind::Const),
            "var" => Some(TokenKind::Var),
            "func" => Some(TokenKind::Func),
            _ => None,
        }
    }

    /// Whether the token ends a spec at bracket depth zero
    pub fn is_terminator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof)
    }

    /// Get the precedence of a binary operator (for Pratt parsing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Logical OR
            TokenKind::OrOr => Some(1),

            // Logical AND
            TokenKind::AndAnd => Some(2),

            // Comparison
            TokenKind::EqEq | TokenKind::Ne | TokenKind::Lt | TokenKind::Le
                | TokenKind::Gt | TokenKind::Ge => Some(3),

            // Additive
            TokenKind::Plus | TokenKind::Minus | TokenKind::Or | TokenKind::Caret => Some(4),

            // Multiplicative, shifts and masks bind tightest in Go
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::Shl
                | TokenKind::Shr | TokenKind::And | TokenKind::AndNot => Some(5),

            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Package => write!(f, "package"),
            TokenKind::Import => write!(f, "import"),
            TokenKind::Type => write!(f, "type"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Func => write!(f, "func"),
            TokenKind::Ident(s) => write!(f, "identifier `{}`", s),
            TokenKind::IntLit(n) => write!(f, "{}", n),
            TokenKind::BigIntLit(s) => write!(f, "{}", s),
            TokenKind::FloatLit(n) => write!(f, "{}", n),
            TokenKind::StringLit(s) => write!(f, "{:?}", s),
            TokenKind::CharLit(c) => write!(f, "{:?}", c),
            TokenKind::Comment(_) => write!(f, "comment"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::And => write!(f, "&"),
            TokenKind::Or => write!(f, "|"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Shl => write!(f, "<<"),
            TokenKind::Shr => write!(f, ">>"),
            TokenKind::AndNot => write!(f, "&^"),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Define => write!(f, ":="),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Unterminated(what) => write!(f, "unterminated {}", what),
            TokenKind::Unknown(c) => write!(f, "`{}`", c),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
