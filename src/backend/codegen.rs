//! Code Generation trait - Backend abstraction

use crate::frontend::ast::Program;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Generate an assembly listing, one line per element, from an
    /// analyzed program
    fn generate(&mut self, program: &Program) -> Result<Vec<String>>;

    /// Get the target triple (e.g., "x86_64-unknown-linux-gnu")
    fn target_triple(&self) -> &str;

    /// Get the backend name
    fn name(&self) -> &str;
}
