//! Frontend module - Lexer, Parser, Semantic Analysis

pub mod token;
pub mod lexer;
pub mod cursor;
pub mod ast;
pub mod parser;
pub mod scope;
pub mod semantic;
