//! Parser for regcc
//!
//! Recursive descent with one function per precedence level. Declarations
//! are an ordered choice: each alternative is tried as an attempt that either
//! yields a node or restores the cursor and reports "no match".

use crate::frontend::ast::*;
use crate::frontend::cursor::TokenCursor;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The parser
pub struct Parser {
    cursor: TokenCursor,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        Ok(Self::from_tokens(lexer.tokenize()?))
    }

    /// Create a parser from pre-tokenized input
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
        }
    }

    // ==================== Helper Methods ====================

    fn unexpected(token: &Token, expected: &str) -> Error {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: token.kind.to_string(),
            span: token.span,
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.cursor.peek().kind) == std::mem::discriminant(kind)
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.cursor.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.cursor.next().clone();
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(&kind) {
            Ok(token)
        } else {
            self.cursor.pushback();
            Err(Self::unexpected(&token, &kind.to_string()))
        }
    }

    fn consume_type(&mut self) -> bool {
        if self.cursor.peek().kind.is_type_name() {
            self.cursor.next();
            true
        } else {
            false
        }
    }

    fn consume_ident(&mut self) -> Option<Ident> {
        match &self.cursor.peek().kind {
            TokenKind::Ident(name) if !self.cursor.peek().kind.is_type_name() => {
                let ident = Ident {
                    name: name.clone(),
                    span: self.cursor.peek().span,
                };
                self.cursor.next();
                Some(ident)
            }
            _ => None,
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        self.consume_ident()
            .ok_or_else(|| Self::unexpected(self.cursor.peek(), "identifier"))
    }

    // ==================== Declarations ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut functions = Vec::new();

        while !self.cursor.is_at_end() {
            let first = self.cursor.peek().clone();
            match self.declare()? {
                Stmt::Function(func) => functions.push(func),
                _ => return Err(Self::unexpected(&first, "function declaration")),
            }
        }

        log::debug!("parsed {} top-level functions", functions.len());
        Ok(Program { functions })
    }

    /// Ordered choice: function declaration, variable declaration, statement
    fn declare(&mut self) -> Result<Stmt> {
        if let Some(func) = self.try_function()? {
            return Ok(Stmt::Function(func));
        }
        if let Some(var) = self.try_var_decl() {
            return Ok(Stmt::VarDecl(var));
        }
        Ok(Stmt::Expr(self.parse_statement()?))
    }

    /// `type ident "(" params ")" "{" statements "}"`
    ///
    /// Commits once `type ident (` has been seen; anything wrong after that
    /// is a syntax error rather than a fallback to the next alternative.
    fn try_function(&mut self) -> Result<Option<FunctionDecl>> {
        let mark = self.cursor.mark();
        let span = self.cursor.peek().span;

        let header = if self.consume_type() {
            self.consume_ident()
                .filter(|_| self.consume(&TokenKind::LParen))
        } else {
            None
        };
        let Some(name) = header else {
            self.cursor.reset(mark);
            return Ok(None);
        };

        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        self.expect(TokenKind::RBrace)?;

        Ok(Some(FunctionDecl::new(name, params, body, span)))
    }

    fn parse_params(&mut self) -> Result<Vec<Ident>> {
        let mut params = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            if !self.consume_type() {
                return Err(Self::unexpected(self.cursor.peek(), "parameter type"));
            }
            params.push(self.parse_ident()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// `type ident ";"`
    fn try_var_decl(&mut self) -> Option<Ident> {
        let mark = self.cursor.mark();

        if self.consume_type() {
            if let Some(name) = self.consume_ident() {
                if self.consume(&TokenKind::Semicolon) {
                    return Some(name);
                }
            }
        }

        self.cursor.reset(mark);
        None
    }

    /// Statements up to (not including) a closing `}` or end of input
    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.cursor.is_at_end() {
            stmts.push(self.declare()?);
        }
        Ok(stmts)
    }

    /// `expr ("=" expr)* ";"`, assignments folding to the right
    fn parse_statement(&mut self) -> Result<Expr> {
        let mut value = self.parse_expr()?;
        let mut targets = Vec::new();
        while self.consume(&TokenKind::Eq) {
            targets.push(value);
            value = self.parse_expr()?;
        }
        self.expect(TokenKind::Semicolon)?;

        while let Some(target) = targets.pop() {
            value = Expr::assign(target, value);
        }
        Ok(value)
    }

    // ==================== Expressions ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_bit_or()
    }

    fn parse_bit_or(&mut self) -> Result<Expr> {
        let mut node = self.parse_bit_xor()?;
        while self.consume(&TokenKind::Or) {
            let rhs = self.parse_bit_xor()?;
            node = Expr::binary(BinOp::BitOr, node, rhs);
        }
        Ok(node)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr> {
        let mut node = self.parse_bit_and()?;
        while self.consume(&TokenKind::Caret) {
            let rhs = self.parse_bit_and()?;
            node = Expr::binary(BinOp::BitXor, node, rhs);
        }
        Ok(node)
    }

    fn parse_bit_and(&mut self) -> Result<Expr> {
        let mut node = self.parse_equality()?;
        while self.consume(&TokenKind::And) {
            let rhs = self.parse_equality()?;
            node = Expr::binary(BinOp::BitAnd, node, rhs);
        }
        Ok(node)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut node = self.parse_add()?;

        loop {
            let op = match self.cursor.next().kind {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::Ne => CmpOp::Ne,
                _ => {
                    self.cursor.pushback();
                    break;
                }
            };
            let rhs = self.parse_add()?;
            node = Expr::compare(op, node, rhs);
        }

        Ok(node)
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let mut node = self.parse_mul()?;

        loop {
            let op = match self.cursor.next().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => {
                    self.cursor.pushback();
                    break;
                }
            };
            let rhs = self.parse_mul()?;
            node = Expr::binary(op, node, rhs);
        }

        Ok(node)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let mut node = self.parse_primary()?;

        loop {
            let op = match self.cursor.next().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => {
                    self.cursor.pushback();
                    break;
                }
            };
            let rhs = self.parse_primary()?;
            node = Expr::binary(op, node, rhs);
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.cursor.next().clone();

        match token.kind {
            TokenKind::IntLit(n) => Ok(Expr::number(n, token.span)),
            TokenKind::StringLit(s) => Ok(Expr::string(s, token.span)),
            TokenKind::Ident(ref name) if !token.kind.is_type_name() => {
                if self.consume(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::call(name.clone(), args, token.span))
                } else {
                    Ok(Expr::ident(name.clone(), token.span))
                }
            }
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => {
                self.cursor.pushback();
                Err(Self::unexpected(&token, "expression"))
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }
}
