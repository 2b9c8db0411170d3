//! Token definitions for regcc

use std::fmt;

use serde::Serialize;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize)]
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
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    // ============ Identifiers and Literals ============
    /// Identifier (variable name, function name, type name)
    Ident(String),
    /// Integer literal
    IntLit(i64),
    /// String literal, escapes already resolved
    StringLit(String),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// &
    And,
    /// ^
    Caret,
    /// |
    Or,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// ,
    Comma,
    /// ;
    Semicolon,

    // ============ Special ============
    /// End of input
    Eof,
}

impl TokenKind {
    /// Whether this token is an identifier naming one of the built-in types
    pub fn is_type_name(&self) -> bool {
        matches!(self, TokenKind::Ident(name) if TYPE_NAMES.contains(&name.as_str()))
    }
}

/// Names accepted in type position. The language has a single integer type.
pub const TYPE_NAMES: &[&str] = &["int"];

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier `{}`", name),
            TokenKind::IntLit(n) => write!(f, "integer `{}`", n),
            TokenKind::StringLit(s) => write!(f, "string {:?}", s),
            TokenKind::Plus => f.write_str("`+`"),
            TokenKind::Minus => f.write_str("`-`"),
            TokenKind::Star => f.write_str("`*`"),
            TokenKind::Slash => f.write_str("`/`"),
            TokenKind::And => f.write_str("`&`"),
            TokenKind::Caret => f.write_str("`^`"),
            TokenKind::Or => f.write_str("`|`"),
            TokenKind::Eq => f.write_str("`=`"),
            TokenKind::EqEq => f.write_str("`==`"),
            TokenKind::Ne => f.write_str("`!=`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::LBrace => f.write_str("`{`"),
            TokenKind::RBrace => f.write_str("`}`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Semicolon => f.write_str("`;`"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert!(TokenKind::Ident("int".to_string()).is_type_name());
        assert!(!TokenKind::Ident("x".to_string()).is_type_name());
        assert!(!TokenKind::IntLit(3).is_type_name());
    }

    #[test]
    fn test_display_for_diagnostics() {
        assert_eq!(TokenKind::Semicolon.to_string(), "`;`");
        assert_eq!(TokenKind::Ident("foo".to_string()).to_string(), "identifier `foo`");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
