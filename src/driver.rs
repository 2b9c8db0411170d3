//! Compilation pipeline
//!
//! Each stage runs to completion before the next starts, and the first error
//! aborts the whole compilation: nothing is returned on failure.

use crate::backend::{CodeGen, X86CodeGen};
use crate::frontend::ast::Program;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::frontend::semantic::SemanticAnalyzer;
use crate::frontend::token::Token;
use crate::utils::Result;

pub const DEFAULT_TARGET: &str = "x86_64-unknown-linux-gnu";

/// Lex source text into tokens, ending with `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Lex and parse source text
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(Lexer::new(source))?.parse_program()
}

/// Lex, parse and annotate source text
pub fn analyze(source: &str) -> Result<Program> {
    let mut program = parse(source)?;
    SemanticAnalyzer::new().analyze(&mut program)?;
    Ok(program)
}

/// Annotate an already parsed program and generate its listing
pub fn compile_program(program: &mut Program) -> Result<Vec<String>> {
    SemanticAnalyzer::new().analyze(program)?;
    X86CodeGen::new(DEFAULT_TARGET).generate(program)
}

/// Compile source text to an assembly listing
pub fn compile(source: &str) -> Result<Vec<String>> {
    let mut program = parse(source)?;
    compile_program(&mut program)
}
