//! x86-64 Backend - Generate GNU assembler listings (Intel syntax)
//!
//! Register slots map onto registers that never take part in argument
//! passing or in the `rax`/`rdx` multiply/divide staging.

mod x86_codegen;

pub use x86_codegen::X86CodeGen;
