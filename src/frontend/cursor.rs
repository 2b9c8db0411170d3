//! Token cursor with single-step pushback and mark/reset backtracking

use crate::frontend::token::{Token, TokenKind};

/// A saved cursor position, produced by [`TokenCursor::mark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Cursor over a finite, `Eof`-terminated token sequence.
///
/// Reading past the end keeps returning the final `Eof` token.
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    /// Wrap a token vector. An `Eof` token is appended when missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::eof(span));
        }
        Self { tokens, pos: 0 }
    }

    fn clamp(&self, pos: usize) -> usize {
        pos.min(self.tokens.len() - 1)
    }

    /// The token the next call to [`next`](Self::next) will return
    pub fn peek(&self) -> &Token {
        &self.tokens[self.clamp(self.pos)]
    }

    /// Consume and return the current token
    pub fn next(&mut self) -> &Token {
        let idx = self.clamp(self.pos);
        self.pos += 1;
        &self.tokens[idx]
    }

    /// Undo exactly one [`next`](Self::next)
    pub fn pushback(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Snapshot the cursor position
    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    /// Restore a position previously returned by [`mark`](Self::mark)
    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn cursor(source: &str) -> TokenCursor {
        TokenCursor::new(Lexer::new(source).tokenize().unwrap())
    }

    #[test]
    fn test_next_and_pushback() {
        let mut c = cursor("a ;");
        assert!(matches!(c.next().kind, TokenKind::Ident(_)));
        c.pushback();
        assert!(matches!(c.next().kind, TokenKind::Ident(_)));
        assert_eq!(c.next().kind, TokenKind::Semicolon);
        assert!(c.is_at_end());
    }

    #[test]
    fn test_mark_and_reset() {
        let mut c = cursor("a b c");
        c.next();
        let mark = c.mark();
        c.next();
        c.next();
        c.reset(mark);
        assert_eq!(c.next().kind, TokenKind::Ident("b".to_string()));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut c = TokenCursor::new(Vec::new());
        assert_eq!(c.next().kind, TokenKind::Eof);
        assert_eq!(c.next().kind, TokenKind::Eof);
        c.pushback();
        assert!(c.is_at_end());
    }
}
