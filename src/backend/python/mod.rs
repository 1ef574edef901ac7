//! Python Backend
//!
//! Emits Python 3 source from the Wax AST.

pub mod python_codegen;

pub use python_codegen::PythonCodeGen;
