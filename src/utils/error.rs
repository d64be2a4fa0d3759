//! Error handling for goenum

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Generator error
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ==================== Structural Errors ====================

    #[error("line {}: unexpected token: expected {expected}, got {got}", .span.line)]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("line {}: expected identifier", .span.line)]
    ExpectedIdent { span: Span },

    #[error("line {}: expected expression", .span.line)]
    ExpectedExpr { span: Span },

    #[error("line {}: integer literal `{text}` out of range", .span.line)]
    IntegerOutOfRange { text: String, span: Span },

    #[error("line {}: unterminated {what}", .span.line)]
    UnterminatedLiteral { what: &'static str, span: Span },

    // ==================== Model Errors ====================

    #[error("line {}: enum type `{name}` must have a named base type", .span.line)]
    UnsupportedBaseType { name: String, span: Span },

    #[error("line {}: enum type `{name}` collides with its generated wrapper; declare it unexported", .span.line)]
    WrapperNameCollision { name: String, span: Span },

    #[error("line {}: `{variant}` is declared more than once in enum `{enum_name}`", .span.line)]
    DuplicateVariant {
        enum_name: String,
        variant: String,
        span: Span,
    },

    #[error("line {}: `{variant}` transitions to unknown state `{target}` in enum `{enum_name}`", .span.line)]
    UnknownTransitionTarget {
        enum_name: String,
        variant: String,
        target: String,
        span: Span,
    },

    // ==================== Emission Errors ====================

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("generated `{enum_name}` is missing {}", .missing.join(", "))]
    Conformance {
        enum_name: String,
        missing: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::ExpectedIdent { span }
            | Self::ExpectedExpr { span }
            | Self::IntegerOutOfRange { span, .. }
            | Self::UnterminatedLiteral { span, .. }
            | Self::UnsupportedBaseType { span, .. }
            | Self::WrapperNameCollision { span, .. }
            | Self::DuplicateVariant { span, .. }
            | Self::UnknownTransitionTarget { span, .. } => Some(*span),
            Self::CodeGen(_) | Self::Conformance { .. } | Self::Io(_) => None,
        }
    }

    /// Whether the error came from reading the declarations
    /// rather than from building or emitting the model.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedToken { .. }
                | Self::ExpectedIdent { .. }
                | Self::ExpectedExpr { .. }
                | Self::IntegerOutOfRange { .. }
                | Self::UnterminatedLiteral { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
