//! Abstract Syntax Tree definitions for regcc
//!
//! The parser builds the tree; the semantic analyzer fills in the annotation
//! fields (`reg`, `offset`, `live`, `locals`, `result`, `used`) in place and the code
//! generator reads them back.

use serde::Serialize;

use crate::frontend::scope::LocalTable;
use crate::middle::regalloc::RegMask;
use crate::utils::Span;

/// A complete program: top-level function declarations in source order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}

/// Function declaration
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    /// Locals resolved by the analyzer, parameters first
    pub locals: LocalTable,
    /// Register holding the value of the last expression statement
    pub result: Option<usize>,
    /// Every register slot the body uses
    pub used: RegMask,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: Ident, params: Vec<Ident>, body: Vec<Stmt>, span: Span) -> Self {
        Self {
            name,
            params,
            body,
            locals: LocalTable::new(),
            result: None,
            used: RegMask::EMPTY,
            span,
        }
    }
}

/// Identifier with its source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// Nested function declaration
    Function(FunctionDecl),
    /// `int name;`
    VarDecl(Ident),
    /// Assignment or bare expression followed by `;`
    Expr(Expr),
}

/// Binary operators computed as `left := left OP right`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitXor,
    BitOr,
}

/// Equality comparisons producing 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    Ne,
}

/// An expression node plus its register annotation
#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Register slot holding this node's value once generated
    pub reg: Option<usize>,
}

/// Expressions
#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    Number(i64),
    Str(String),
    Ident {
        name: String,
        /// Frame offset resolved by the analyzer
        offset: Option<usize>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        /// Registers that must survive the call
        live: RegMask,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span, reg: None }
    }

    pub fn number(value: i64, span: Span) -> Self {
        Self::new(ExprKind::Number(value), span)
    }

    pub fn string(text: String, span: Span) -> Self {
        Self::new(ExprKind::Str(text), span)
    }

    pub fn ident(name: String, span: Span) -> Self {
        Self::new(ExprKind::Ident { name, offset: None }, span)
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        let span = left.span;
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn compare(op: CmpOp, left: Expr, right: Expr) -> Self {
        let span = left.span;
        Self::new(
            ExprKind::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        let span = target.span;
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn call(name: String, args: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::Call {
                name,
                args,
                live: RegMask::EMPTY,
            },
            span,
        )
    }
}
