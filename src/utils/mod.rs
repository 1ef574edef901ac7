//! Utility module

mod diagnostic;
mod error;

pub use diagnostic::Diagnostic;
pub use error::{Error, LexError, Result, SemanticError};
