//! Backend module - Code generation

pub mod codegen;

pub mod x86_64;

pub use codegen::CodeGen;
pub use x86_64::X86CodeGen;
