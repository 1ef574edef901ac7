//! Error handling for the Wax compiler

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Parser Errors ====================

    #[error("Unexpected token {kind} ('{value}')")]
    UnexpectedToken {
        kind: String,
        value: String,
        line: usize,
    },

    #[error("Unexpected end of input: {hint}")]
    UnexpectedEof { hint: String, line: usize },

    #[error("Nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize, line: usize },

    // ==================== Backend Errors ====================

    #[error("Code generation error: {0}")]
    CodeGen(String),
}

impl Error {
    /// Get the source line associated with this error
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { line, .. } => Some(*line),
            Self::UnexpectedEof { line, .. } => Some(*line),
            Self::NestingTooDeep { line, .. } => Some(*line),
            Self::CodeGen(_) => None,
        }
    }
}

/// Lexical errors. Recovered locally by the lexer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Illegal character '{0}'")]
    IllegalCharacter(char),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated block comment")]
    UnterminatedComment,

    #[error("Integer literal '{0}' is out of range")]
    IntegerOutOfRange(String),
}

/// Semantic rule violations. Collected by the analyzer, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    // ==================== Scoping ====================

    #[error("The symbol '{name}' has not been declared")]
    Undeclared { name: String },

    #[error("The symbol '{name}' has already been declared in this scope")]
    Redeclared { name: String },

    #[error("Unknown type '{name}'")]
    UnknownType { name: String },

    #[error("Variable '{name}' cannot be declared with type 'void'")]
    VoidVariable { name: String },

    // ==================== Assignment ====================

    #[error("Cannot assign a value of type '{got}' to variable '{name}' of type '{expected}'")]
    AssignMismatch {
        name: String,
        expected: String,
        got: String,
    },

    #[error("Cannot assign a value to the function '{name}'")]
    AssignToFunction { name: String },

    #[error("Multiple assignment has {targets} targets but {values} values")]
    MultiAssignArity { targets: usize, values: usize },

    #[error("Compound assignment '{op}' cannot be applied to {what} '{name}'")]
    CompoundTarget {
        op: String,
        what: &'static str,
        name: String,
    },

    #[error("Compound assignment '{op}' is invalid between types '{target}' and '{value}'")]
    CompoundOperands {
        op: String,
        target: String,
        value: String,
    },

    #[error("Operator '{op}' can only be applied to numeric variables, but '{name}' is '{ty}'")]
    StepNotNumeric {
        op: String,
        name: String,
        ty: String,
    },

    // ==================== Lists ====================

    #[error("'{name}' is of type '{ty}' and is not a list")]
    NotAList { name: String, ty: String },

    #[error("Cannot append a value of type '{got}' to list '{name}' of type '{list}'")]
    AppendMismatch {
        name: String,
        list: String,
        got: String,
    },

    #[error("List index must be of type 'int', found '{got}'")]
    IndexNotInt { got: String },

    #[error("List index {index} is negative")]
    NegativeIndex { index: i64 },

    #[error("Cannot index into the empty list '{name}'")]
    IndexEmptyList { name: String },

    #[error("List element {position} has type '{got}', expected '{expected}'")]
    ListElementMismatch {
        position: usize,
        expected: String,
        got: String,
    },

    // ==================== Control Flow ====================

    #[error("The condition of '{construct}' must be of type 'bool', found '{got}'")]
    ConditionNotBool {
        construct: &'static str,
        got: String,
    },

    #[error("The control variable '{name}' of a 'for' loop must be of type 'int', found '{got}'")]
    ForControlNotInt { name: String, got: String },

    #[error("The initializer of 'for' loop variable '{name}' must be of type 'int', found '{got}'")]
    ForInitNotInt { name: String, got: String },

    #[error("The increment of a 'for' loop must update '{expected}', found '{found}'")]
    ForControlMismatch { expected: String, found: String },

    #[error("The increment expression of a 'for' loop must be of type 'int', found '{got}'")]
    ForStepNotInt { got: String },

    #[error("'return' can only be used inside a function")]
    ReturnOutsideFunction,

    #[error("A 'void' function cannot return a value")]
    ReturnValueFromVoid,

    #[error("A function that is not 'void' must return a value")]
    MissingReturnValue,

    #[error("Return type mismatch: expected '{expected}' but found '{got}'")]
    ReturnMismatch { expected: String, got: String },

    #[error("Unreachable code after 'return'")]
    Unreachable,

    // ==================== Expressions ====================

    #[error("Invalid arithmetic operation '{op}' between types '{left}' and '{right}'")]
    InvalidArithmetic {
        op: String,
        left: String,
        right: String,
    },

    #[error("Logical operation '{op}' is only allowed between 'bool' values")]
    InvalidLogic { op: String },

    #[error("Operator '!' requires a 'bool' operand, found '{got}'")]
    InvalidNot { got: String },

    #[error("Unary '-' requires a numeric operand, found '{got}'")]
    InvalidNegation { got: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Modulo by zero")]
    ModuloByZero,

    #[error("'{name}' is not a function or has not been declared")]
    NotCallable { name: String },

    #[error("Function '{name}' expected {expected} arguments but received {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument {position} of '{name}': expected type '{expected}' but found '{got}'")]
    ArgMismatch {
        name: String,
        position: usize,
        expected: String,
        got: String,
    },
}
