//! Lexer for regcc
//!
//! Converts source code into a stream of tokens. The lexer only classifies
//! characters; it knows nothing about the grammar.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Current line (1-based)
    line: usize,
    /// Position of the first character of the current line
    line_start: usize,
    /// Span of the token being read
    start: Span,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            line_start: 0,
            start: Span::new(1, 1),
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
        self.pos += 1;
        if c == Some('\n') {
            self.line += 1;
            self.line_start = self.pos;
        }
        c
    }

    fn current_span(&self) -> Span {
        Span::new(self.line, self.pos - self.line_start + 1)
    }

    /// Create a token starting at the recorded start position
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start)
    }

    /// Skip whitespace and line comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                c if c.is_ascii_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier
    fn read_identifier(&mut self) -> Token {
        let begin = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[begin..self.pos].iter().collect();
        self.make_token(TokenKind::Ident(text))
    }

    /// Read an integer literal: `0x` hexadecimal, leading-`0` octal,
    /// otherwise decimal
    fn read_number(&mut self) -> Result<Token> {
        let begin = self.pos;

        let radix = match (self.peek(), self.peek_next()) {
            (Some('0'), Some('x') | Some('X')) => {
                self.advance(); // 0
                self.advance(); // x
                16
            }
            // The leading zero is itself an octal digit; reading stops at
            // the first non-octal character.
            (Some('0'), _) => 8,
            _ => 10,
        };

        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[begin..self.pos].iter().collect();
        let digits: String = self.source[digits_start..self.pos].iter().collect();
        let value = i64::from_str_radix(&digits, radix).map_err(|_| Error::InvalidNumber {
            text: text.clone(),
            span: self.start,
        })?;

        Ok(self.make_token(TokenKind::IntLit(value)))
    }

    /// Read a string literal
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('0') => '\0',
                        Some(c @ ('\\' | '"')) => c,
                        Some(c) => {
                            return Err(Error::UnexpectedChar { ch: c, span: self.current_span() });
                        }
                        None => return Err(Error::UnterminatedString { span: self.start }),
                    };
                    value.push(escaped);
                    self.advance();
                }
                Some('\n') | None => return Err(Error::UnterminatedString { span: self.start }),
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.start = self.current_span();

        let Some(c) = self.peek() else {
            return Ok(Token::eof(self.start));
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.read_identifier());
        }

        if c.is_ascii_digit() {
            return self.read_number();
        }

        if c == '"' {
            return self.read_string();
        }

        self.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '&' => TokenKind::And,
            '^' => TokenKind::Caret,
            '|' => TokenKind::Or,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::Ne
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => return Err(Error::UnexpectedChar { ch: c, span: self.start }),
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("int main() { }");

        assert!(matches!(tokens[0], TokenKind::Ident(ref s) if s == "int"));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "main"));
        assert!(matches!(tokens[2], TokenKind::LParen));
        assert!(matches!(tokens[3], TokenKind::RParen));
        assert!(matches!(tokens[4], TokenKind::LBrace));
        assert!(matches!(tokens[5], TokenKind::RBrace));
        assert!(matches!(tokens[6], TokenKind::Eof));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a==b!=c=d|e^f&g+h-i*j/k,;");

        assert_eq!(tokens[1], TokenKind::EqEq);
        assert_eq!(tokens[3], TokenKind::Ne);
        assert_eq!(tokens[5], TokenKind::Eq);
        assert_eq!(tokens[7], TokenKind::Or);
        assert_eq!(tokens[9], TokenKind::Caret);
        assert_eq!(tokens[11], TokenKind::And);
        assert_eq!(tokens[13], TokenKind::Plus);
        assert_eq!(tokens[15], TokenKind::Minus);
        assert_eq!(tokens[17], TokenKind::Star);
        assert_eq!(tokens[19], TokenKind::Slash);
        assert_eq!(tokens[21], TokenKind::Comma);
        assert_eq!(tokens[22], TokenKind::Semicolon);
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 0xFF 0");

        assert_eq!(tokens[0], TokenKind::IntLit(42));
        assert_eq!(tokens[1], TokenKind::IntLit(255));
        assert_eq!(tokens[2], TokenKind::IntLit(0));
    }

    #[test]
    fn test_leading_zero_is_octal() {
        assert_eq!(kinds("010 0777")[..2], [TokenKind::IntLit(8), TokenKind::IntLit(511)]);
        // Reading stops at the first non-octal digit
        assert_eq!(
            kinds("09"),
            vec![TokenKind::IntLit(0), TokenKind::IntLit(9), TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = kinds(r#""hello\n\"world\"""#);

        assert!(matches!(tokens[0], TokenKind::StringLit(ref s) if s == "hello\n\"world\""));
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("int x;\n  x = 1; // note\n").tokenize().unwrap();

        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(1, 5));
        assert_eq!(tokens[3].span, Span::new(2, 3));
        assert_eq!(tokens[5].span, Span::new(2, 7));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lexical_errors() {
        assert!(matches!(
            Lexer::new("x = 1 $ 2;").tokenize(),
            Err(Error::UnexpectedChar { ch: '$', span }) if span == Span::new(1, 7)
        ));
        assert!(matches!(
            Lexer::new("\"open").tokenize(),
            Err(Error::UnterminatedString { .. })
        ));
        assert!(matches!(
            Lexer::new("99999999999999999999").tokenize(),
            Err(Error::InvalidNumber { .. })
        ));
        assert!(matches!(Lexer::new("!x").tokenize(), Err(Error::UnexpectedChar { ch: '!', .. })));
    }
}
