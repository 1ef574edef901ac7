//! Lexer for Wax
//!
//! Converts source code into a stream of tokens. Illegal characters are
//! reported and skipped; lexing never aborts early.

use log::trace;

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Diagnostic, LexError};

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Current line (1-based)
    line: usize,
    /// Line on which the current token started
    start_line: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            start_line: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character, counting newlines
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start_line)
    }

    fn report(&mut self, err: LexError, line: usize) {
        self.diagnostics.push(Diagnostic::lexical(err, line));
    }

    /// Skip whitespace, newlines and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment
                '/' if self.peek_next() == Some('*') => {
                    let opened_at = self.line;
                    self.advance();
                    self.advance();
                    loop {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                self.report(LexError::UnterminatedComment, opened_at);
                                break;
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a number literal (integer or double)
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // A double needs digits on both sides of the dot
        let is_double = self.peek() == Some('.')
            && matches!(self.peek_next(), Some(c) if c.is_ascii_digit());
        if is_double {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let kind = if is_double {
            TokenKind::DoubleLit(text.parse().unwrap_or(0.0))
        } else {
            match text.parse() {
                Ok(value) => TokenKind::IntLit(value),
                Err(_) => {
                    self.report(LexError::IntegerOutOfRange(text), self.start_line);
                    TokenKind::IntLit(0)
                }
            }
        };
        self.make_token(kind)
    }

    /// Read a string literal, decoding backslash escapes
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(other) => value.push(other),
                    None => {
                        self.report(LexError::UnterminatedString, self.start_line);
                        break;
                    }
                },
                Some(c) => value.push(c),
                None => {
                    self.report(LexError::UnterminatedString, self.start_line);
                    break;
                }
            }
        }

        self.make_token(TokenKind::StringLit(value))
    }

    /// Pick `double` when the next char is `second`, otherwise `single`
    fn either(&mut self, second: char, double: TokenKind, single: TokenKind) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            self.make_token(double)
        } else {
            self.make_token(single)
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.start_line = self.line;

            let Some(c) = self.peek() else {
                return Token::eof(self.line);
            };

            if c.is_ascii_alphabetic() || c == '_' {
                return self.read_identifier();
            }
            if c.is_ascii_digit() {
                return self.read_number();
            }
            if c == '"' {
                return self.read_string();
            }

            self.advance();
            let token = match c {
                '+' => match self.peek() {
                    Some('+') => {
                        self.advance();
                        self.make_token(TokenKind::PlusPlus)
                    }
                    _ => self.either('=', TokenKind::PlusEq, TokenKind::Plus),
                },
                '-' => match self.peek() {
                    Some('-') => {
                        self.advance();
                        self.make_token(TokenKind::MinusMinus)
                    }
                    _ => self.either('=', TokenKind::MinusEq, TokenKind::Minus),
                },
                '*' => match self.peek() {
                    Some('*') => {
                        self.advance();
                        self.make_token(TokenKind::StarStar)
                    }
                    _ => self.either('=', TokenKind::StarEq, TokenKind::Star),
                },
                '/' => self.either('=', TokenKind::SlashEq, TokenKind::Slash),
                '%' => self.make_token(TokenKind::Percent),
                '=' => self.either('=', TokenKind::EqEq, TokenKind::Eq),
                '!' => self.either('=', TokenKind::Ne, TokenKind::Not),
                '<' => self.either('=', TokenKind::Le, TokenKind::Lt),
                '>' => self.either('=', TokenKind::Ge, TokenKind::Gt),
                '&' if self.peek() == Some('&') => {
                    self.advance();
                    self.make_token(TokenKind::AndAnd)
                }
                '|' if self.peek() == Some('|') => {
                    self.advance();
                    self.make_token(TokenKind::OrOr)
                }
                '(' => self.make_token(TokenKind::LParen),
                ')' => self.make_token(TokenKind::RParen),
                '{' => self.make_token(TokenKind::LBrace),
                '}' => self.make_token(TokenKind::RBrace),
                '[' => self.make_token(TokenKind::LBracket),
                ']' => self.make_token(TokenKind::RBracket),
                ',' => self.make_token(TokenKind::Comma),
                ':' => self.make_token(TokenKind::Colon),
                ';' => self.make_token(TokenKind::Semicolon),
                '.' => self.make_token(TokenKind::Dot),
                other => {
                    trace!("skipping illegal character {:?} at line {}", other, self.start_line);
                    self.report(LexError::IllegalCharacter(other), self.start_line);
                    continue;
                }
            };
            return token;
        }
    }

    /// Tokenize the whole input. The token vector always ends with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Consume the lexer, returning its diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            kinds("wax x:int = 5;"),
            vec![
                TokenKind::Wax,
                TokenKind::Ident("x".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("int".to_string()),
                TokenKind::Eq,
                TokenKind::IntLit(5),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_boolean_keywords_become_literals() {
        assert_eq!(
            kinds("true false truth"),
            vec![
                TokenKind::BoolLit(true),
                TokenKind::BoolLit(false),
                TokenKind::Ident("truth".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.25 7."),
            vec![
                TokenKind::IntLit(42),
                TokenKind::DoubleLit(3.25),
                TokenKind::IntLit(7),
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("+= -= *= /= ++ -- ** % && || ! != <= >="),
            vec![
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::StarEq,
                TokenKind::SlashEq,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::StarStar,
                TokenKind::Percent,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Not,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n\\""#),
            vec![TokenKind::StringLit("a\"b\n\\".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_track_lines() {
        let source = "# line comment\n/* block\ncomment\n*/ x";
        let tokens = Lexer::new(source).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Ident("x".to_string()));
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn test_illegal_character_is_skipped() {
        let mut lexer = Lexer::new("wax @x:int = 1;\n$");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Ident("x".to_string()));
        let diags = lexer.into_diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "Illegal character '@'");
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[1].line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        let tokens = lexer.tokenize();
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
        assert_eq!(lexer.into_diagnostics().len(), 1);
    }
}
