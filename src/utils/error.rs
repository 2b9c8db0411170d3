//! Error handling for regcc

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Every error is fatal: the first one raised aborts the compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexical Errors ====================

    #[error("Unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Invalid integer literal: {text}")]
    InvalidNumber { text: String, span: Span },

    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    // ==================== Semantic Errors ====================

    #[error("Unbound name: {name}")]
    UnboundName { name: String, span: Span },

    #[error("Duplicate declaration: {name}")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("Left side of assignment is not assignable")]
    NotAssignable { span: Span },

    // ==================== Capacity Limits ====================

    #[error("Register pool exhausted: expression needs more than {capacity} registers")]
    RegisterExhaustion { capacity: usize, span: Span },

    #[error("Too many arguments: {count} given, at most {limit} are supported")]
    TooManyArguments {
        count: usize,
        limit: usize,
        span: Span,
    },

    // ==================== Internal Errors ====================

    #[error("Register slot {slot} still held at end of statement")]
    RegisterLeak { slot: usize, span: Span },

    #[error("Code generation error: {0}")]
    CodeGen(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedChar { span, .. } => Some(*span),
            Self::UnterminatedString { span } => Some(*span),
            Self::InvalidNumber { span, .. } => Some(*span),
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::UnboundName { span, .. } => Some(*span),
            Self::DuplicateDeclaration { span, .. } => Some(*span),
            Self::NotAssignable { span } => Some(*span),
            Self::RegisterExhaustion { span, .. } => Some(*span),
            Self::TooManyArguments { span, .. } => Some(*span),
            Self::RegisterLeak { span, .. } => Some(*span),
            Self::CodeGen(_) => None,
        }
        .filter(|span| !span.is_dummy())
    }

    /// Short stable code used in structured diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedChar { .. }
            | Self::UnterminatedString { .. }
            | Self::InvalidNumber { .. } => "E0001",
            Self::UnexpectedToken { .. } => "E0100",
            Self::UnboundName { .. } => "E0200",
            Self::DuplicateDeclaration { .. } => "E0201",
            Self::NotAssignable { .. } => "E0202",
            Self::RegisterExhaustion { .. } => "L0001",
            Self::TooManyArguments { .. } => "L0002",
            Self::RegisterLeak { .. } => "I0001",
            Self::CodeGen(_) => "I0002",
        }
    }

    /// Whether this error is a fixed design limit of the compiler rather
    /// than a mistake in the compiled program
    pub fn is_capacity_limit(&self) -> bool {
        matches!(self, Self::RegisterExhaustion { .. } | Self::TooManyArguments { .. })
    }

    /// Whether this error signals a bug in the compiler itself
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::RegisterLeak { .. } | Self::CodeGen(_))
    }
}
