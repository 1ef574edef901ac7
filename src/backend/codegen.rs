//! Code Generation trait - Backend abstraction
//!
//! A backend turns a checked program into target source text.

use crate::frontend::ast::Program;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Generate target source from a semantically valid program
    fn generate(&mut self, program: &Program) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}
