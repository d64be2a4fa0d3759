//! Declaration tree for the Go subset the reader understands

use crate::utils::Span;

/// A parsed source file: its package clause and top-level declarations
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub package: Ident,
    pub decls: Vec<Decl>,
}

/// Top-level declarations
#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeDecl),
    Const(ConstDecl),
    /// `import`, `var`, `func`: skipped, only the extent is recorded
    Other(Span),
}

/// Identifier with location
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

/// A single `//` or `/* */` comment
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Raw text including the comment markers
    pub text: String,
    pub span: Span,
    /// No code precedes the comment on its line
    pub own_line: bool,
}

/// Run of comments on adjacent lines with nothing else between them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
}

impl CommentGroup {
    /// Comment text with one level of markers removed, one line per
    /// source line, leading and trailing blank lines dropped.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for comment in &self.comments {
            if let Some(rest) = comment.text.strip_prefix("//") {
                lines.push(rest.trim_end().to_string());
            } else {
                let body = comment
                    .text
                    .strip_prefix("/*")
                    .and_then(|t| t.strip_suffix("*/"))
                    .unwrap_or(&comment.text);
                lines.extend(body.lines().map(|l| l.trim_end().to_string()));
            }
        }

        while lines.first().map_or(false, |l| l.trim().is_empty()) {
            lines.remove(0);
        }
        while lines.last().map_or(false, |l| l.trim().is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

/// `type ...` declaration, possibly grouped
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub doc: Option<CommentGroup>,
    pub specs: Vec<TypeSpec>,
}

/// `name Underlying` inside a type declaration
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    /// Set when the underlying type is a plain (possibly qualified) name
    pub underlying: Option<Ident>,
    /// `type a = b`
    pub alias: bool,
    pub doc: Option<CommentGroup>,
    pub span: Span,
}

/// `const ...` declaration, possibly grouped
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub specs: Vec<ValueSpec>,
    /// `const ( ... )` rather than a single spec
    pub grouped: bool,
    pub span: Span,
}

/// One line of a const declaration: `a, b T = x, y`
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Ident>,
    pub values: Vec<Expr>,
    /// Comment group directly above the spec
    pub doc: Option<CommentGroup>,
    /// Comment trailing the spec on its last line
    pub comment: Option<CommentGroup>,
}

impl ValueSpec {
    /// Doc comment text followed by the trailing comment text
    pub fn comment_text(&self) -> String {
        let parts: Vec<String> = [&self.doc, &self.comment]
            .into_iter()
            .flatten()
            .map(CommentGroup::text)
            .filter(|t| !t.is_empty())
            .collect();
        parts.join("\n")
    }
}

/// Constant expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, Span),
    /// Integer literal beyond i64, kept as written
    BigInt(String, Span),
    Float(f64, Span),
    Str(String, Span),
    Char(char, Span),
    /// Identifier, possibly package-qualified (`pkg.Name`)
    Ident(Ident),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    Paren(Box<Expr>, Span),
    /// Calls and conversions: `T(x)`, `len("abc")`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_, span)
            | Expr::BigInt(_, span)
            | Expr::Float(_, span)
            | Expr::Str(_, span)
            | Expr::Char(_, span)
            | Expr::Paren(_, span) => *span,
            Expr::Ident(ident) => ident.span,
            Expr::Unary { span, .. } | Expr::Binary { span, .. } | Expr::Call { span, .. } => *span,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    AndNot,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    /// `^x`, bitwise complement
    BitNot,
    Not,
}
