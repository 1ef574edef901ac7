//! Token definitions for Wax

use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }

    pub fn eof(line: usize) -> Self {
        Self { kind: TokenKind::Eof, line }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// wax (declaration introducer)
    Wax,
    /// function
    Function,
    /// print
    Print,
    /// input
    Input,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// for
    For,
    /// return
    Return,
    /// str (string cast)
    Str,
    /// void
    Void,

    // ============ Identifiers and Literals ============
    Ident(String),
    IntLit(i64),
    DoubleLit(f64),
    StringLit(String),
    BoolLit(bool),

    // ============ Operators ============
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Eq,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Not,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PlusPlus,
    MinusMinus,

    // ============ Delimiters ============
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    // ============ Special ============
    Eof,
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "wax" => Some(TokenKind::Wax),
            "function" => Some(TokenKind::Function),
            "print" => Some(TokenKind::Print),
            "input" => Some(TokenKind::Input),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "for" => Some(TokenKind::For),
            "return" => Some(TokenKind::Return),
            "str" => Some(TokenKind::Str),
            "void" => Some(TokenKind::Void),
            "true" => Some(TokenKind::BoolLit(true)),
            "false" => Some(TokenKind::BoolLit(false)),
            _ => None,
        }
    }

    /// Terminal name used in token dumps and syntax errors
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Wax => "WAX",
            TokenKind::Function => "FUNCTION",
            TokenKind::Print => "PRINT",
            TokenKind::Input => "INPUT",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Return => "RETURN",
            TokenKind::Str => "STR",
            TokenKind::Void => "VOID",
            TokenKind::Ident(_) => "IDENT",
            TokenKind::IntLit(_) => "INT",
            TokenKind::DoubleLit(_) => "DOUBLE",
            TokenKind::StringLit(_) => "STRING",
            TokenKind::BoolLit(_) => "BOOL",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::StarStar => "POW",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "MOD",
            TokenKind::Eq => "EQUAL",
            TokenKind::EqEq => "EQEQ",
            TokenKind::Ne => "NOTEQ",
            TokenKind::Lt => "LT",
            TokenKind::Le => "LE",
            TokenKind::Gt => "GT",
            TokenKind::Ge => "GE",
            TokenKind::AndAnd => "AND",
            TokenKind::OrOr => "OR",
            TokenKind::Not => "NOT",
            TokenKind::PlusEq => "PLUSEQ",
            TokenKind::MinusEq => "MINUSEQ",
            TokenKind::StarEq => "STAREQ",
            TokenKind::SlashEq => "SLASHEQ",
            TokenKind::PlusPlus => "INCREMENT",
            TokenKind::MinusMinus => "DECREMENT",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMI",
            TokenKind::Dot => "DOT",
            TokenKind::Eof => "EOF",
        }
    }
}

/// Renders the token's literal value (the source text for symbols)
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Ident(name) => return f.write_str(name),
            TokenKind::IntLit(v) => return write!(f, "{}", v),
            TokenKind::DoubleLit(v) => return write!(f, "{:?}", v),
            TokenKind::StringLit(s) => return f.write_str(s),
            TokenKind::BoolLit(b) => return write!(f, "{}", b),
            TokenKind::Wax => "wax",
            TokenKind::Function => "function",
            TokenKind::Print => "print",
            TokenKind::Input => "input",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Return => "return",
            TokenKind::Str => "str",
            TokenKind::Void => "void",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Ne => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eof => "<eof>",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (line {})", self.kind.name(), self.kind, self.line)
    }
}
