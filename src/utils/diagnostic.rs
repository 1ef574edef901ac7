//! Compiler diagnostics
//!
//! Every phase reports user-facing problems as a `Diagnostic`. The list is
//! ordered by discovery and rendered verbatim by the driver.

use std::fmt;

use serde::Serialize;

use crate::utils::{Error, LexError, SemanticError};

/// Compilation phase that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
    CodeGen,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lexical => "Lexical",
            Phase::Syntax => "Syntax",
            Phase::Semantic => "Semantic",
            Phase::CodeGen => "Code Generation",
        };
        f.write_str(name)
    }
}

/// A reported compiler message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub line: usize,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>, line: usize) -> Self {
        Self {
            phase,
            message: message.into(),
            line,
        }
    }

    pub fn lexical(err: LexError, line: usize) -> Self {
        Self::new(Phase::Lexical, err.to_string(), line)
    }

    pub fn semantic(err: SemanticError, line: usize) -> Self {
        Self::new(Phase::Semantic, err.to_string(), line)
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let phase = match err {
            Error::UnexpectedToken { .. }
            | Error::UnexpectedEof { .. }
            | Error::NestingTooDeep { .. } => Phase::Syntax,
            Error::CodeGen(_) => Phase::CodeGen,
        };
        Self::new(phase, err.to_string(), err.line().unwrap_or(0))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} Error] Line {}: {}", self.phase, self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_phase_and_line() {
        let diag = Diagnostic::semantic(
            SemanticError::Undeclared { name: "x".to_string() },
            7,
        );
        assert_eq!(
            diag.to_string(),
            "[Semantic Error] Line 7: The symbol 'x' has not been declared"
        );
    }

    #[test]
    fn test_syntax_error_conversion() {
        let err = Error::UnexpectedToken {
            kind: "RBRACE".to_string(),
            value: "}".to_string(),
            line: 3,
        };
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.phase, Phase::Syntax);
        assert_eq!(diag.line, 3);
        assert_eq!(diag.message, "Unexpected token RBRACE ('}')");
    }
}
