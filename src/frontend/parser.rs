//! Parser for Wax
//!
//! Recursive descent parser with one function per precedence level.
//! Parsing is all-or-nothing: the first syntax error aborts the file.

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// Deepest nesting of blocks, sub-expressions and list types accepted
const MAX_NESTING: usize = 64;

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Openers (`{`, `(`, `[`) not yet matched by their closer
    open: Vec<(TokenKind, usize)>,
    depth: usize,
}

impl Parser {
    /// Create a parser from pre-tokenized input
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::eof(line));
        }
        Self {
            tokens,
            pos: 0,
            open: Vec::new(),
            depth: 0,
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // `from_tokens` guarantees a trailing Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> &TokenKind {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        match token.kind {
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => {
                self.open.push((token.kind.clone(), token.line));
            }
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                self.open.pop();
            }
            _ => {}
        }
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected())
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Error for the current token, with an unclosed-opener hint at end of input
    fn unexpected(&self) -> Error {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            let hint = match self.open.last() {
                Some((opener, line)) => {
                    format!("'{}' opened at line {} may be unclosed", opener, line)
                }
                None => "check for a missing ';' or closing '}'".to_string(),
            };
            return Error::UnexpectedEof {
                hint,
                line: token.line,
            };
        }
        Error::UnexpectedToken {
            kind: token.kind.name().to_string(),
            value: token.kind.to_string(),
            line: token.line,
        }
    }

    /// Run a recursive rule one level deeper, failing past `MAX_NESTING`
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(Error::NestingTooDeep {
                limit: MAX_NESTING,
                line: self.current().line,
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn parse_ident(&mut self) -> Result<(String, usize)> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, token.line))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        if self.check(&TokenKind::Void) {
            let token = self.advance();
            return Ok(TypeExpr::named("void", token.line));
        }
        let (name, line) = self.parse_ident()?;
        let subtype = if name == "list" && self.consume(&TokenKind::LBracket) {
            let inner = self.nested(Self::parse_type)?;
            self.expect(TokenKind::RBracket)?;
            Some(Box::new(inner))
        } else {
            None
        };
        Ok(TypeExpr { name, subtype, line })
    }

    // ==================== Statements ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        debug!("parsed {} top-level statements", stmts.len());
        Ok(Program { stmts })
    }

    fn parse_block(&mut self) -> Result<Block> {
        self.expect(TokenKind::LBrace)?;
        let stmts = self.nested(|parser| {
            let mut stmts = Vec::new();
            while !parser.check(&TokenKind::RBrace) && !parser.is_at_end() {
                stmts.push(parser.parse_stmt()?);
            }
            Ok(stmts)
        })?;
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.current_kind() {
            TokenKind::Wax if matches!(self.peek_kind(), TokenKind::Function) => {
                Ok(Stmt::Function(self.parse_function()?))
            }
            TokenKind::Wax => self.parse_declaration(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => Ok(Stmt::For(self.parse_for()?)),
            TokenKind::Print => self.parse_print(),
            TokenKind::Return => self.parse_return(),
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let token = self.advance();
                let op = Self::step_op(&token.kind);
                let (name, _) = self.parse_ident()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Step {
                    name,
                    op,
                    prefix: true,
                    line: token.line,
                })
            }
            TokenKind::Ident(_) => self.parse_ident_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `wax name: type = expr;`
    fn parse_declaration(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Wax)?;
        let (name, _) = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Declaration {
            ty,
            name,
            value,
            line: start.line,
        })
    }

    /// `wax function name: ret(params) { body }`
    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let start = self.expect(TokenKind::Wax)?;
        self.expect(TokenKind::Function)?;
        let (name, _) = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;

        let ret = self.parse_type()?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let (param_name, line) = self.parse_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param {
                name: param_name,
                ty,
                line,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            ret,
            params,
            body,
            line: start.line,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_block = self.parse_block()?;

        let else_block = if self.consume(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            line: start.line,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::While {
            cond,
            body,
            line: start.line,
        })
    }

    /// `for (wax i: int = init; cond; step) { body }`
    fn parse_for(&mut self) -> Result<ForLoop> {
        let start = self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::Wax)?;
        let (var, _) = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let step = self.parse_for_step()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;

        Ok(ForLoop {
            var,
            ty,
            init,
            cond,
            step,
            body,
            line: start.line,
        })
    }

    /// The increment clause is restricted to steps and assignments on a name
    fn parse_for_step(&mut self) -> Result<ForStep> {
        if matches!(self.current_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let token = self.advance();
            let (name, _) = self.parse_ident()?;
            return Ok(ForStep::Step {
                name,
                op: Self::step_op(&token.kind),
                line: token.line,
            });
        }

        let (name, line) = self.parse_ident()?;
        match self.current_kind().clone() {
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.advance();
                Ok(ForStep::Step {
                    name,
                    op: Self::step_op(&kind),
                    line,
                })
            }
            TokenKind::Eq => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(ForStep::Assign {
                    name,
                    op: None,
                    value,
                    line,
                })
            }
            kind => match Self::compound_op(&kind) {
                Some(op) => {
                    self.advance();
                    let value = self.parse_expr()?;
                    Ok(ForStep::Assign {
                        name,
                        op: Some(op),
                        value,
                        line,
                    })
                }
                None => Err(self.unexpected()),
            },
        }
    }

    fn parse_print(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Print)?;
        self.expect(TokenKind::LParen)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Print {
            value,
            line: start.line,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Return)?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return {
            value,
            line: start.line,
        })
    }

    /// Statements that start with an identifier
    fn parse_ident_stmt(&mut self) -> Result<Stmt> {
        match self.peek_kind().clone() {
            TokenKind::Eq => {
                let (name, line) = self.parse_ident()?;
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Assign { name, value, line })
            }
            TokenKind::Comma => self.parse_multi_assign(),
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                let (name, line) = self.parse_ident()?;
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Step {
                    name,
                    op: Self::step_op(&kind),
                    prefix: false,
                    line,
                })
            }
            TokenKind::Dot => self.parse_list_method(),
            kind => match Self::compound_op(&kind) {
                Some(op) => {
                    let (name, line) = self.parse_ident()?;
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Semicolon)?;
                    Ok(Stmt::CompoundAssign {
                        name,
                        op,
                        value,
                        line,
                    })
                }
                None => self.parse_expr_stmt(),
            },
        }
    }

    /// `a, b = x, y;`
    fn parse_multi_assign(&mut self) -> Result<Stmt> {
        let (first, line) = self.parse_ident()?;
        let mut targets = vec![first];
        while self.consume(&TokenKind::Comma) {
            targets.push(self.parse_ident()?.0);
        }
        self.expect(TokenKind::Eq)?;

        let mut values = vec![self.parse_expr()?];
        while self.consume(&TokenKind::Comma) {
            values.push(self.parse_expr()?);
        }
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::MultiAssign {
            targets,
            values,
            line,
        })
    }

    /// `list.append(value);` and `list.remove(index);`
    fn parse_list_method(&mut self) -> Result<Stmt> {
        let (list, line) = self.parse_ident()?;
        self.expect(TokenKind::Dot)?;

        let method = match self.current_kind() {
            TokenKind::Ident(m) if m == "append" || m == "remove" => m.clone(),
            _ => return Err(self.unexpected()),
        };
        self.advance();

        self.expect(TokenKind::LParen)?;
        let arg = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;

        if method == "append" {
            Ok(Stmt::Append {
                list,
                value: arg,
                line,
            })
        } else {
            Ok(Stmt::Remove {
                list,
                index: arg,
                line,
            })
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }

    fn step_op(kind: &TokenKind) -> StepOp {
        if *kind == TokenKind::MinusMinus {
            StepOp::Decrement
        } else {
            StepOp::Increment
        }
    }

    fn compound_op(kind: &TokenKind) -> Option<CompoundOp> {
        match kind {
            TokenKind::PlusEq => Some(CompoundOp::Add),
            TokenKind::MinusEq => Some(CompoundOp::Sub),
            TokenKind::StarEq => Some(CompoundOp::Mul),
            TokenKind::SlashEq => Some(CompoundOp::Div),
            _ => None,
        }
    }

    // ==================== Expressions ====================
    //
    // Lowest to highest: ||, &&, !, unary -, relational, additive,
    // multiplicative, ** (right-associative).

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Self::parse_or)
    }

    fn binary(op: BinOp, left: Expr, right: Expr, line: usize) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            line,
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            let line = self.advance().line;
            let right = self.parse_and()?;
            left = Self::binary(BinOp::Or, left, right, line);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::AndAnd) {
            let line = self.advance().line;
            let right = self.parse_not()?;
            left = Self::binary(BinOp::And, left, right, line);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Not) {
            let line = self.advance().line;
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_neg()
    }

    fn parse_neg(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Minus) {
            let line = self.advance().line;
            let operand = self.nested(Self::parse_neg)?;
            return Ok(Expr::Unary {
                op: UnOp::Neg,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right, line);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right, line);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_power()?;
            left = Self::binary(op, left, right, line);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.check(&TokenKind::StarStar) {
            let line = self.advance().line;
            let exponent = self.nested(Self::parse_power)?;
            return Ok(Self::binary(BinOp::Pow, base, exponent, line));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let line = token.line;

        let expr = match token.kind {
            TokenKind::IntLit(value) => {
                self.advance();
                Expr::Int { value, line }
            }
            TokenKind::DoubleLit(value) => {
                self.advance();
                Expr::Double { value, line }
            }
            TokenKind::StringLit(value) => {
                self.advance();
                Expr::Str { value, line }
            }
            TokenKind::BoolLit(value) => {
                self.advance();
                Expr::Bool { value, line }
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.consume(&TokenKind::LBracket) {
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    Expr::Index {
                        list: name,
                        index: Box::new(index),
                        line,
                    }
                } else if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Expr::Call {
                        callee: name,
                        args,
                        line,
                    }
                } else {
                    Expr::Ident { name, line }
                }
            }
            TokenKind::Str => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let arg = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Expr::Call {
                    callee: "str".to_string(),
                    args: vec![arg],
                    line,
                }
            }
            TokenKind::Input => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let prompt = if self.check(&TokenKind::RParen) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                self.expect(TokenKind::RParen)?;
                Expr::Input { prompt, line }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                inner
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                    elements.push(self.parse_expr()?);
                    if !self.consume(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Expr::List { elements, line }
            }
            // A prefix operator after a binary operator
            TokenKind::Not => self.parse_not()?,
            TokenKind::Minus => self.parse_neg()?,
            _ => return Err(self.unexpected()),
        };

        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Result<Program> {
        let tokens = Lexer::new(source).tokenize();
        let mut parser = Parser::from_tokens(tokens);
        parser.parse_program()
    }

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::from_tokens(Lexer::new(source).tokenize());
        parser.parse_expr().unwrap()
    }

    #[test]
    fn test_declaration() {
        let program = parse("wax x:int = 5;").unwrap();
        assert_eq!(program.stmts.len(), 1);
        match &program.stmts[0] {
            Stmt::Declaration { ty, name, value, line } => {
                assert_eq!(ty.name, "int");
                assert_eq!(name, "x");
                assert_eq!(*value, Expr::Int { value: 5, line: 1 });
                assert_eq!(*line, 1);
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_list_type_annotation() {
        let program = parse("wax xs:list[double] = [];").unwrap();
        match &program.stmts[0] {
            Stmt::Declaration { ty, .. } => assert_eq!(ty.to_string(), "list[double]"),
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_function_with_params() {
        let program =
            parse("wax function add:int(a:int, b:int) { return a + b; }").unwrap();
        match &program.stmts[0] {
            Stmt::Function(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.ret.name, "int");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.params[1].name, "b");
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_void_function() {
        let program = parse("wax function hello:void() { print(\"hi\"); return; }").unwrap();
        match &program.stmts[0] {
            Stmt::Function(f) => {
                assert_eq!(f.ret.name, "void");
                assert!(matches!(f.body[1], Stmt::Return { value: None, .. }));
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let expr = parse_expr("1 + 2 * 3");
        match expr {
            Expr::Binary { op: BinOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("Expected addition, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_expr("2 ** 3 ** 2");
        match expr {
            Expr::Binary { op: BinOp::Pow, left, right, .. } => {
                assert_eq!(*left, Expr::Int { value: 2, line: 1 });
                assert!(matches!(*right, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("Expected power, got {:?}", other),
        }
    }

    #[test]
    fn test_relational_is_left_associative() {
        let expr = parse_expr("a < b == c");
        match expr {
            Expr::Binary { op: BinOp::Eq, left, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinOp::Lt, .. }));
            }
            other => panic!("Expected equality, got {:?}", other),
        }
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let expr = parse_expr("!a == b && c");
        match expr {
            Expr::Binary { op: BinOp::And, left, .. } => match *left {
                Expr::Unary { op: UnOp::Not, operand, .. } => {
                    assert!(matches!(*operand, Expr::Binary { op: BinOp::Eq, .. }));
                }
                other => panic!("Expected not, got {:?}", other),
            },
            other => panic!("Expected and, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_operand() {
        let expr = parse_expr("-a + b");
        match expr {
            Expr::Unary { op: UnOp::Neg, operand, .. } => {
                assert!(matches!(*operand, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("Expected negation, got {:?}", other),
        }
    }

    #[test]
    fn test_statement_forms() {
        let source = "
x = 1;
a, b = 1, 2;
x += 2;
x++;
--x;
xs.append(3);
xs.remove(0);
f(x);
";
        let program = parse(source).unwrap();
        let stmts = &program.stmts;
        assert_eq!(stmts.len(), 8);
        assert!(matches!(stmts[0], Stmt::Assign { .. }));
        assert!(matches!(&stmts[1], Stmt::MultiAssign { targets, values, .. }
            if targets.len() == 2 && values.len() == 2));
        assert!(matches!(stmts[2], Stmt::CompoundAssign { op: CompoundOp::Add, .. }));
        assert!(matches!(stmts[3], Stmt::Step { op: StepOp::Increment, prefix: false, .. }));
        assert!(matches!(stmts[4], Stmt::Step { op: StepOp::Decrement, prefix: true, .. }));
        assert!(matches!(stmts[5], Stmt::Append { .. }));
        assert!(matches!(stmts[6], Stmt::Remove { .. }));
        assert!(matches!(stmts[7], Stmt::Expr(Expr::Call { .. })));
        assert_eq!(stmts[7].line(), 9);
    }

    #[test]
    fn test_for_loop() {
        let program =
            parse("for (wax i:int = 0; i < 3; i += 1) { print(i); }").unwrap();
        match &program.stmts[0] {
            Stmt::For(f) => {
                assert_eq!(f.var, "i");
                assert_eq!(f.step.name(), "i");
                assert!(matches!(f.step, ForStep::Assign { op: Some(CompoundOp::Add), .. }));
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_and_input() {
        let source = "if (x > 0) { wax s:string = input(\"name? \"); } else { print(str(x)); }";
        let program = parse(source).unwrap();
        match &program.stmts[0] {
            Stmt::If { then_block, else_block: Some(else_block), .. } => {
                assert!(matches!(&then_block[0], Stmt::Declaration {
                    value: Expr::Input { prompt: Some(_), .. }, ..
                }));
                assert!(matches!(&else_block[0], Stmt::Print {
                    value: Expr::Call { callee, .. }, ..
                } if callee == "str"));
            }
            other => panic!("Expected if-else, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse("wax x:int = 5\nprint(x);").unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedToken {
                kind: "PRINT".to_string(),
                value: "print".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn test_unclosed_brace_hint() {
        let err = parse("while (true) {\n  if (x) {\n  }\n").unwrap_err();
        match err {
            Error::UnexpectedEof { hint, .. } => {
                assert_eq!(hint, "'{' opened at line 1 may be unclosed");
            }
            other => panic!("Expected EOF error, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_paren_hint() {
        let err = parse("print((1 + 2);").unwrap_err();
        // `;` is unexpected inside the still-open first paren
        assert!(matches!(err, Error::UnexpectedToken { ref kind, .. } if kind == "SEMI"));

        let err = parse("print(1 + 2").unwrap_err();
        match err {
            Error::UnexpectedEof { hint, .. } => {
                assert_eq!(hint, "'(' opened at line 1 may be unclosed");
            }
            other => panic!("Expected EOF error, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_eof_hint() {
        let err = parse("x = 1").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { ref hint, .. } if hint.contains("';'")));
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("print({}1{});", "(".repeat(500), ")".repeat(500));
        let err = parse(&source).unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep { line: 1, .. }));

        let source = format!("wax b:bool = {}true;", "!".repeat(500));
        assert!(matches!(parse(&source), Err(Error::NestingTooDeep { .. })));

        let source = format!("{}{}", "if (true) {\n".repeat(200), "}\n".repeat(200));
        assert!(matches!(parse(&source), Err(Error::NestingTooDeep { .. })));
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let source = format!("print({}1{});", "(".repeat(20), ")".repeat(20));
        assert!(parse(&source).is_ok());
        assert!(parse("wax xs:list[list[list[int]]] = [];").is_ok());
    }
}
