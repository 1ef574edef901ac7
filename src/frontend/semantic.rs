//! Semantic Analysis for Wax
//!
//! Performs:
//! - Symbol table management (scopes, definitions)
//! - Type inference and type checking
//! - Control-flow validation (returns, unreachable code, for-loop control)
//!
//! Every violation becomes a diagnostic and analysis carries on; nothing
//! here aborts early.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use serde::Serialize;

use crate::frontend::ast::*;
use crate::types::*;
use crate::utils::{Diagnostic, SemanticError};

// ==================== Symbol Table ====================

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Symbol information
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Position of this symbol's entry in the symbol log
    log_index: Option<usize>,
}

/// Kind of symbol
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable(Type),
    Function(Signature),
}

/// A scope containing symbols
#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    label: String,
    symbols: HashMap<String, Symbol>,
}

/// Symbol table with nested scopes, stored as an arena of frames
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let global = Scope {
            parent: None,
            label: "global".to_string(),
            symbols: HashMap::new(),
        };
        Self {
            scopes: vec![global],
            current: ScopeId(0),
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self, label: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let label = label.into();
        debug!("entering scope '{}'", label);
        self.scopes.push(Scope {
            parent: Some(self.current),
            label,
            symbols: HashMap::new(),
        });
        self.current = id;
        id
    }

    /// Exit the current scope
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            debug!("exiting scope '{}'", self.scopes[self.current.0].label);
            self.current = parent;
        }
    }

    pub fn is_global(&self) -> bool {
        self.current == ScopeId(0)
    }

    pub fn current_label(&self) -> &str {
        &self.scopes[self.current.0].label
    }

    /// Define a symbol in the current scope
    pub fn define(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        let scope = &mut self.scopes[self.current.0];
        if scope.symbols.contains_key(&symbol.name) {
            return Err(SemanticError::Redeclared { name: symbol.name });
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<ScopeId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if self.scopes[id.0].symbols.contains_key(name) {
                return Some(id);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }

    /// Look up a symbol, searching from current scope upward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let id = self.resolve(name)?;
        self.scopes[id.0].symbols.get(name)
    }

    /// Mutable lookup, for back-patching inferred list types
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let id = self.resolve(name)?;
        self.scopes[id.0].symbols.get_mut(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the persistent symbol log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub scope: String,
    pub line: usize,
}

impl std::fmt::Display for SymbolRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<16} {:<24} {:<20} line {}",
            self.name, self.ty, self.scope, self.line
        )
    }
}

/// Identity of an AST node, taken from its address in the analyzed program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Expr(usize),
    Stmt(usize),
}

impl From<&Expr> for NodeId {
    fn from(expr: &Expr) -> Self {
        NodeId::Expr(expr as *const Expr as usize)
    }
}

impl From<&Stmt> for NodeId {
    fn from(stmt: &Stmt) -> Self {
        NodeId::Stmt(stmt as *const Stmt as usize)
    }
}

/// Typing facts the Python backend needs but cannot recompute from the tree.
/// Only valid for the program instance that was analyzed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// `+` and `+=` joining a string with a non-string
    concat: HashSet<NodeId>,
    /// `/` and `/=` between two ints
    int_division: HashSet<NodeId>,
}

impl Annotations {
    pub fn is_concat(&self, node: impl Into<NodeId>) -> bool {
        self.concat.contains(&node.into())
    }

    pub fn is_int_division(&self, node: impl Into<NodeId>) -> bool {
        self.int_division.contains(&node.into())
    }
}

fn describe_signature(sig: &Signature) -> String {
    let params: Vec<String> = sig.params.iter().map(|p| p.to_string()).collect();
    format!("function({}) -> {}", params.join(", "), sig.ret)
}

// ==================== Semantic Analyzer ====================

/// Marker for an expression whose type could not be determined.
/// The cause has already been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poisoned;

type Inferred = std::result::Result<Type, Poisoned>;

/// Semantic analyzer
pub struct SemanticAnalyzer {
    pub symbols: SymbolTable,
    log: Vec<SymbolRecord>,
    diagnostics: Vec<Diagnostic>,
    annotations: Annotations,
    /// Declared return type of the enclosing function
    current_return: Option<Type>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let mut analyzer = Self {
            symbols: SymbolTable::new(),
            log: Vec::new(),
            diagnostics: Vec::new(),
            annotations: Annotations::default(),
            current_return: None,
        };
        analyzer.register_builtins();
        analyzer
    }

    /// Register built-in functions
    fn register_builtins(&mut self) {
        self.define_builtin("str", vec![Type::Any], Type::STRING);
    }

    fn define_builtin(&mut self, name: &str, params: Vec<Type>, ret: Type) {
        let symbol = Symbol {
            name: name.to_string(),
            kind: SymbolKind::Function(Signature::new(params, ret)),
            log_index: None,
        };
        let _ = self.symbols.define(symbol);
    }

    /// Analyze a program, returning every diagnostic in discovery order
    pub fn analyze(&mut self, program: &Program) -> Vec<Diagnostic> {
        *self = Self::new();

        // Pass 1: collect function signatures so calls may precede declarations
        for stmt in &program.stmts {
            if let Stmt::Function(func) = stmt {
                self.collect_signature(func);
            }
        }

        // Pass 2: check everything in declaration order
        self.check_block(&program.stmts);

        debug!(
            "semantic analysis finished: {} diagnostics, {} symbols",
            self.diagnostics.len(),
            self.log.len()
        );
        self.diagnostics.clone()
    }

    /// Backend annotations from the last `analyze` call
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Every symbol declared during the last `analyze` call
    pub fn into_symbol_log(self) -> Vec<SymbolRecord> {
        self.log
    }

    fn error(&mut self, err: SemanticError, line: usize) {
        trace!("line {}: {}", line, err);
        self.diagnostics.push(Diagnostic::semantic(err, line));
    }

    /// Define a symbol in the current scope and record it in the log
    fn declare(&mut self, name: &str, kind: SymbolKind, line: usize) {
        let rendered = match &kind {
            SymbolKind::Variable(ty) => ty.to_string(),
            SymbolKind::Function(sig) => describe_signature(sig),
        };
        let scope = self.symbols.current_label().to_string();
        let symbol = Symbol {
            name: name.to_string(),
            kind,
            log_index: Some(self.log.len()),
        };
        match self.symbols.define(symbol) {
            Ok(()) => self.log.push(SymbolRecord {
                name: name.to_string(),
                ty: rendered,
                scope,
                line,
            }),
            Err(err) => self.error(err, line),
        }
    }

    /// Replace a variable's stored type wherever it resolves, keeping the log in sync
    fn refine(&mut self, name: &str, ty: Type) {
        let rendered = ty.to_string();
        let mut log_index = None;
        if let Some(symbol) = self.symbols.lookup_mut(name) {
            symbol.kind = SymbolKind::Variable(ty);
            log_index = symbol.log_index;
        }
        if let Some(record) = log_index.and_then(|i| self.log.get_mut(i)) {
            record.ty = rendered;
        }
    }

    fn lookup_kind(&self, name: &str) -> Option<SymbolKind> {
        self.symbols.lookup(name).map(|s| s.kind.clone())
    }

    /// Resolve an annotation to a type
    fn resolve_type(&mut self, ty: &TypeExpr) -> Inferred {
        if let Some(prim) = PrimitiveType::from_name(&ty.name) {
            if ty.subtype.is_none() {
                return Ok(Type::Primitive(prim));
            }
        }
        if ty.name == "list" {
            return match &ty.subtype {
                Some(sub) => Ok(Type::list(self.resolve_type(sub)?)),
                None => Ok(Type::list(Type::Any)),
            };
        }
        self.error(
            SemanticError::UnknownType {
                name: ty.to_string(),
            },
            ty.line,
        );
        Err(Poisoned)
    }

    // ==================== Declarations ====================

    fn signature_of(&mut self, func: &FunctionDecl) -> Signature {
        let params = func
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty).unwrap_or(Type::Any))
            .collect();
        let ret = self.resolve_type(&func.ret).unwrap_or(Type::Any);
        Signature::new(params, ret)
    }

    fn collect_signature(&mut self, func: &FunctionDecl) {
        let sig = self.signature_of(func);
        self.declare(&func.name, SymbolKind::Function(sig), func.line);
    }

    fn check_function(&mut self, func: &FunctionDecl) {
        // Nested declarations are not seen by pass 1
        if !self.symbols.is_global() {
            self.collect_signature(func);
        }
        let sig = match self.symbols.lookup(&func.name).map(|s| &s.kind) {
            Some(SymbolKind::Function(sig)) => sig.clone(),
            _ => return,
        };

        self.symbols.enter_scope(format!("function:{}", func.name));
        let outer_return = self.current_return.replace(sig.ret.clone());

        for (param, ty) in func.params.iter().zip(sig.params.iter()) {
            self.declare(&param.name, SymbolKind::Variable(ty.clone()), param.line);
        }
        self.check_block(&func.body);

        self.current_return = outer_return;
        self.symbols.exit_scope();
    }

    fn check_declaration(&mut self, ty: &TypeExpr, name: &str, value: &Expr, line: usize) {
        let declared = self.resolve_type(ty);
        let value_ty = self.infer(value);

        let stored = match declared {
            Ok(Type::Primitive(PrimitiveType::Void)) => {
                self.error(
                    SemanticError::VoidVariable {
                        name: name.to_string(),
                    },
                    line,
                );
                Type::Any
            }
            Ok(declared) => match value_ty {
                Ok(actual) if !declared.accepts(&actual) => {
                    self.error(
                        SemanticError::AssignMismatch {
                            name: name.to_string(),
                            expected: declared.to_string(),
                            got: actual.to_string(),
                        },
                        line,
                    );
                    declared
                }
                // An untyped `list` takes the initializer's element type
                Ok(actual) if declared == Type::list(Type::Any) && actual.is_list() => actual,
                _ => declared,
            },
            Err(Poisoned) => Type::Any,
        };

        self.declare(name, SymbolKind::Variable(stored), line);
    }

    // ==================== Statements ====================

    /// Check a block's statements. Every statement after a `return` is unreachable.
    fn check_block(&mut self, stmts: &[Stmt]) {
        let mut terminated = false;
        for stmt in stmts {
            if terminated {
                self.error(SemanticError::Unreachable, stmt.line());
            }
            if self.check_stmt(stmt) {
                terminated = true;
            }
        }
    }

    fn check_scoped_block(&mut self, label: &str, stmts: &[Stmt]) {
        self.symbols.enter_scope(label);
        self.check_block(stmts);
        self.symbols.exit_scope();
    }

    /// Check a statement. Returns true if it terminates its block.
    fn check_stmt(&mut self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::Declaration {
                ty,
                name,
                value,
                line,
            } => self.check_declaration(ty, name, value, *line),
            Stmt::Assign { name, value, line } => {
                let value_ty = self.infer(value);
                self.check_assignment(name, value_ty, *line);
            }
            Stmt::MultiAssign {
                targets,
                values,
                line,
            } => {
                let value_tys: Vec<Inferred> = values.iter().map(|v| self.infer(v)).collect();
                if targets.len() != values.len() {
                    self.error(
                        SemanticError::MultiAssignArity {
                            targets: targets.len(),
                            values: values.len(),
                        },
                        *line,
                    );
                } else {
                    for (target, value_ty) in targets.iter().zip(value_tys) {
                        self.check_assignment(target, value_ty, *line);
                    }
                }
            }
            Stmt::CompoundAssign {
                name,
                op,
                value,
                line,
            } => {
                if let Some((target, value_ty)) = self.check_compound(name, *op, value, *line) {
                    self.annotate_compound(stmt, *op, &target, &value_ty);
                }
            }
            Stmt::Step { name, op, line, .. } => self.check_step(name, *op, *line),
            Stmt::Append { list, value, line } => self.check_append(list, value, *line),
            Stmt::Remove { list, index, line } => self.check_remove(list, index, *line),
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.check_condition("if", cond);
                self.check_scoped_block("if", then_block);
                if let Some(else_block) = else_block {
                    self.check_scoped_block("else", else_block);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition("while", cond);
                self.check_scoped_block("while", body);
            }
            Stmt::For(for_loop) => self.check_for(for_loop),
            Stmt::Print { value, .. } => {
                let _ = self.infer(value);
            }
            Stmt::Return { value, line } => {
                self.check_return(value.as_ref(), *line);
                return true;
            }
            Stmt::Function(func) => self.check_function(func),
            Stmt::Expr(expr) => {
                let _ = self.infer(expr);
            }
        }
        false
    }

    fn check_assignment(&mut self, name: &str, value_ty: Inferred, line: usize) {
        let current = match self.lookup_kind(name) {
            None => {
                self.error(
                    SemanticError::Undeclared {
                        name: name.to_string(),
                    },
                    line,
                );
                return;
            }
            Some(SymbolKind::Function(_)) => {
                self.error(
                    SemanticError::AssignToFunction {
                        name: name.to_string(),
                    },
                    line,
                );
                return;
            }
            Some(SymbolKind::Variable(ty)) => ty,
        };

        let Ok(actual) = value_ty else {
            return;
        };
        if !current.accepts(&actual) {
            self.error(
                SemanticError::AssignMismatch {
                    name: name.to_string(),
                    expected: current.to_string(),
                    got: actual.to_string(),
                },
                line,
            );
        } else if current == Type::EmptyList && matches!(actual, Type::List(_)) {
            self.refine(name, actual);
        }
    }

    /// Check `name op= value`. Returns the operand types when both are known.
    fn check_compound(
        &mut self,
        name: &str,
        op: CompoundOp,
        value: &Expr,
        line: usize,
    ) -> Option<(Type, Type)> {
        let value_ty = self.infer(value);
        if op == CompoundOp::Div && value.is_zero_literal() {
            self.error(SemanticError::DivisionByZero, line);
        }

        let target = match self.lookup_kind(name) {
            None => {
                self.error(
                    SemanticError::Undeclared {
                        name: name.to_string(),
                    },
                    line,
                );
                return None;
            }
            Some(SymbolKind::Function(_)) => {
                self.error(
                    SemanticError::CompoundTarget {
                        op: op.symbol().to_string(),
                        what: "function",
                        name: name.to_string(),
                    },
                    line,
                );
                return None;
            }
            Some(SymbolKind::Variable(ty)) if ty.is_list() => {
                self.error(
                    SemanticError::CompoundTarget {
                        op: op.symbol().to_string(),
                        what: "list",
                        name: name.to_string(),
                    },
                    line,
                );
                return None;
            }
            Some(SymbolKind::Variable(ty)) => ty,
        };

        let Ok(value_ty) = value_ty else {
            return None;
        };
        if target == Type::Any || value_ty == Type::Any {
            return Some((target, value_ty));
        }
        let numeric = target.is_numeric() && value_ty.is_numeric();
        let valid = match op {
            CompoundOp::Add => numeric || target.is_string() || value_ty.is_string(),
            CompoundOp::Sub | CompoundOp::Mul | CompoundOp::Div => numeric,
        };
        if !valid {
            self.error(
                SemanticError::CompoundOperands {
                    op: op.symbol().to_string(),
                    target: target.to_string(),
                    value: value_ty.to_string(),
                },
                line,
            );
        }
        Some((target, value_ty))
    }

    fn annotate_compound(&mut self, stmt: &Stmt, op: CompoundOp, target: &Type, value: &Type) {
        match op {
            CompoundOp::Add if target.is_string() != value.is_string() => {
                self.annotations.concat.insert(NodeId::from(stmt));
            }
            CompoundOp::Div if *target == Type::INT && *value == Type::INT => {
                self.annotations.int_division.insert(NodeId::from(stmt));
            }
            _ => {}
        }
    }

    fn check_step(&mut self, name: &str, op: StepOp, line: usize) {
        let ty = match self.lookup_kind(name) {
            None => {
                self.error(
                    SemanticError::Undeclared {
                        name: name.to_string(),
                    },
                    line,
                );
                return;
            }
            Some(SymbolKind::Function(_)) => {
                self.error(
                    SemanticError::StepNotNumeric {
                        op: op.symbol().to_string(),
                        name: name.to_string(),
                        ty: "function".to_string(),
                    },
                    line,
                );
                return;
            }
            Some(SymbolKind::Variable(ty)) => ty,
        };
        if !ty.is_numeric() && ty != Type::Any {
            self.error(
                SemanticError::StepNotNumeric {
                    op: op.symbol().to_string(),
                    name: name.to_string(),
                    ty: ty.to_string(),
                },
                line,
            );
        }
    }

    /// Resolve `name` as a list variable, reporting when it is not one
    fn list_type(&mut self, name: &str, line: usize) -> Option<Type> {
        match self.lookup_kind(name) {
            None => {
                self.error(
                    SemanticError::Undeclared {
                        name: name.to_string(),
                    },
                    line,
                );
                None
            }
            Some(SymbolKind::Variable(ty)) if ty.is_list() || ty == Type::Any => Some(ty),
            Some(kind) => {
                let ty = match kind {
                    SymbolKind::Variable(ty) => ty.to_string(),
                    SymbolKind::Function(_) => "function".to_string(),
                };
                self.error(
                    SemanticError::NotAList {
                        name: name.to_string(),
                        ty,
                    },
                    line,
                );
                None
            }
        }
    }

    fn check_append(&mut self, list: &str, value: &Expr, line: usize) {
        let value_ty = self.infer(value);
        let Some(list_ty) = self.list_type(list, line) else {
            return;
        };
        let Ok(value_ty) = value_ty else {
            return;
        };

        match list_ty {
            // The first append fixes the element type
            Type::EmptyList => self.refine(list, Type::list(value_ty)),
            Type::List(ref elem) if !elem.accepts(&value_ty) => {
                self.error(
                    SemanticError::AppendMismatch {
                        name: list.to_string(),
                        list: list_ty.to_string(),
                        got: value_ty.to_string(),
                    },
                    line,
                );
            }
            _ => {}
        }
    }

    fn check_remove(&mut self, list: &str, index: &Expr, line: usize) {
        let index_ty = self.infer(index);
        let _ = self.list_type(list, line);
        if let Ok(ty) = index_ty {
            if ty != Type::INT && ty != Type::Any {
                self.error(
                    SemanticError::IndexNotInt {
                        got: ty.to_string(),
                    },
                    line,
                );
            }
        }
    }

    fn check_condition(&mut self, construct: &'static str, cond: &Expr) {
        if let Ok(ty) = self.infer(cond) {
            if ty != Type::BOOL && ty != Type::Any {
                self.error(
                    SemanticError::ConditionNotBool {
                        construct,
                        got: ty.to_string(),
                    },
                    cond.line(),
                );
            }
        }
    }

    fn check_for(&mut self, f: &ForLoop) {
        self.symbols.enter_scope("for");

        let declared = self.resolve_type(&f.ty);
        if let Ok(ty) = &declared {
            if *ty != Type::INT {
                self.error(
                    SemanticError::ForControlNotInt {
                        name: f.var.clone(),
                        got: ty.to_string(),
                    },
                    f.line,
                );
            }
        }

        if let Ok(ty) = self.infer(&f.init) {
            if !Type::INT.accepts(&ty) {
                self.error(
                    SemanticError::ForInitNotInt {
                        name: f.var.clone(),
                        got: ty.to_string(),
                    },
                    f.line,
                );
            }
        }

        let control_ty = declared.unwrap_or(Type::Any);
        self.declare(&f.var, SymbolKind::Variable(control_ty), f.line);

        self.check_condition("for", &f.cond);

        if f.step.name() != f.var {
            self.error(
                SemanticError::ForControlMismatch {
                    expected: f.var.clone(),
                    found: f.step.name().to_string(),
                },
                f.step.line(),
            );
        }
        if let ForStep::Assign { op, value, line, .. } = &f.step {
            if *op == Some(CompoundOp::Div) && value.is_zero_literal() {
                self.error(SemanticError::DivisionByZero, *line);
            }
            if let Ok(ty) = self.infer(value) {
                if !Type::INT.accepts(&ty) {
                    self.error(
                        SemanticError::ForStepNotInt {
                            got: ty.to_string(),
                        },
                        *line,
                    );
                }
            }
        }

        self.check_scoped_block("for", &f.body);
        self.symbols.exit_scope();
    }

    fn check_return(&mut self, value: Option<&Expr>, line: usize) {
        let value_ty = value.map(|v| self.infer(v));
        let Some(expected) = self.current_return.clone() else {
            self.error(SemanticError::ReturnOutsideFunction, line);
            return;
        };

        match value_ty {
            None if expected != Type::VOID => {
                self.error(SemanticError::MissingReturnValue, line);
            }
            None => {}
            Some(_) if expected == Type::VOID => {
                self.error(SemanticError::ReturnValueFromVoid, line);
            }
            Some(Ok(actual)) if !Self::return_matches(&expected, &actual) => {
                self.error(
                    SemanticError::ReturnMismatch {
                        expected: expected.to_string(),
                        got: actual.to_string(),
                    },
                    line,
                );
            }
            Some(_) => {}
        }
    }

    /// Return values must match the declared type exactly. A bare `list`
    /// return type takes any list.
    fn return_matches(expected: &Type, actual: &Type) -> bool {
        if expected == actual || *expected == Type::Any || *actual == Type::Any {
            return true;
        }
        match expected {
            Type::List(elem) if **elem == Type::Any => actual.is_list(),
            Type::List(_) => *actual == Type::EmptyList,
            _ => false,
        }
    }

    // ==================== Expressions ====================

    /// Infer the type of an expression
    fn infer(&mut self, expr: &Expr) -> Inferred {
        match expr {
            Expr::Int { .. } => Ok(Type::INT),
            Expr::Double { .. } => Ok(Type::DOUBLE),
            Expr::Str { .. } => Ok(Type::STRING),
            Expr::Bool { .. } => Ok(Type::BOOL),
            Expr::Input { prompt, .. } => {
                if let Some(prompt) = prompt {
                    let _ = self.infer(prompt);
                }
                Ok(Type::STRING)
            }
            Expr::Ident { name, line } => match self.lookup_kind(name) {
                Some(SymbolKind::Variable(ty)) => Ok(ty),
                Some(SymbolKind::Function(sig)) => Ok(Type::Function(Box::new(sig))),
                None => {
                    self.error(
                        SemanticError::Undeclared { name: name.clone() },
                        *line,
                    );
                    Err(Poisoned)
                }
            },
            Expr::List { elements, line } => self.infer_list(elements, *line),
            Expr::Index { list, index, line } => self.infer_index(list, index, *line),
            Expr::Call { callee, args, line } => self.infer_call(callee, args, *line),
            Expr::Unary { op, operand, line } => {
                let ty = self.infer(operand)?;
                match op {
                    UnOp::Not if ty == Type::BOOL || ty == Type::Any => Ok(Type::BOOL),
                    UnOp::Not => {
                        self.error(
                            SemanticError::InvalidNot {
                                got: ty.to_string(),
                            },
                            *line,
                        );
                        Err(Poisoned)
                    }
                    UnOp::Neg if ty.is_numeric() || ty == Type::Any => Ok(ty),
                    UnOp::Neg => {
                        self.error(
                            SemanticError::InvalidNegation {
                                got: ty.to_string(),
                            },
                            *line,
                        );
                        Err(Poisoned)
                    }
                }
            }
            Expr::Binary {
                op,
                left,
                right,
                line,
            } => self.infer_binary(expr, *op, left, right, *line),
        }
    }

    fn infer_list(&mut self, elements: &[Expr], line: usize) -> Inferred {
        let types: Vec<Inferred> = elements.iter().map(|e| self.infer(e)).collect();
        let Some(first) = types.first() else {
            return Ok(Type::EmptyList);
        };
        let first = first.clone()?;

        let mut poisoned = false;
        for (i, ty) in types.iter().enumerate().skip(1) {
            match ty {
                Ok(ty) if !first.accepts(ty) => {
                    self.error(
                        SemanticError::ListElementMismatch {
                            position: i + 1,
                            expected: first.to_string(),
                            got: ty.to_string(),
                        },
                        elements.get(i).map(|e| e.line()).unwrap_or(line),
                    );
                }
                Ok(_) => {}
                Err(Poisoned) => poisoned = true,
            }
        }
        if poisoned {
            return Err(Poisoned);
        }
        Ok(Type::list(first))
    }

    fn infer_index(&mut self, list: &str, index: &Expr, line: usize) -> Inferred {
        let index_ty = self.infer(index);

        let negative = match index {
            Expr::Int { value, .. } if *value < 0 => Some(*value),
            Expr::Unary {
                op: UnOp::Neg,
                operand,
                ..
            } => match operand.as_ref() {
                Expr::Int { value, .. } if *value > 0 => Some(-*value),
                _ => None,
            },
            _ => None,
        };
        if let Some(index) = negative {
            self.error(SemanticError::NegativeIndex { index }, line);
        }
        if let Ok(ty) = &index_ty {
            if *ty != Type::INT && *ty != Type::Any {
                self.error(
                    SemanticError::IndexNotInt {
                        got: ty.to_string(),
                    },
                    line,
                );
            }
        }

        match self.list_type(list, line) {
            Some(Type::EmptyList) => {
                self.error(
                    SemanticError::IndexEmptyList {
                        name: list.to_string(),
                    },
                    line,
                );
                Err(Poisoned)
            }
            Some(Type::List(elem)) => Ok(*elem),
            Some(_) => Ok(Type::Any),
            None => Err(Poisoned),
        }
    }

    fn infer_call(&mut self, callee: &str, args: &[Expr], line: usize) -> Inferred {
        let arg_tys: Vec<Inferred> = args.iter().map(|a| self.infer(a)).collect();

        let sig = match self.lookup_kind(callee) {
            Some(SymbolKind::Function(sig)) => sig,
            _ => {
                self.error(
                    SemanticError::NotCallable {
                        name: callee.to_string(),
                    },
                    line,
                );
                return Err(Poisoned);
            }
        };

        if args.len() != sig.params.len() && !sig.is_variadic() {
            self.error(
                SemanticError::ArgCountMismatch {
                    name: callee.to_string(),
                    expected: sig.params.len(),
                    got: args.len(),
                },
                line,
            );
            return Err(Poisoned);
        }

        for (i, (arg_ty, expected)) in arg_tys.iter().zip(sig.params.iter()).enumerate() {
            if let Ok(actual) = arg_ty {
                if !expected.accepts(actual) {
                    self.error(
                        SemanticError::ArgMismatch {
                            name: callee.to_string(),
                            position: i + 1,
                            expected: expected.to_string(),
                            got: actual.to_string(),
                        },
                        line,
                    );
                }
            }
        }

        Ok(sig.ret)
    }

    fn infer_binary(
        &mut self,
        expr: &Expr,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        line: usize,
    ) -> Inferred {
        let left_ty = self.infer(left);
        let right_ty = self.infer(right);

        // Reported even when operands are invalid or the code is unreachable
        if right.is_zero_literal() {
            match op {
                BinOp::Div => self.error(SemanticError::DivisionByZero, line),
                BinOp::Mod => self.error(SemanticError::ModuloByZero, line),
                _ => {}
            }
        }

        let (left_ty, right_ty) = (left_ty?, right_ty?);

        match op {
            BinOp::Add if left_ty.is_string() != right_ty.is_string() => {
                self.annotations.concat.insert(NodeId::from(expr));
            }
            BinOp::Div if left_ty == Type::INT && right_ty == Type::INT => {
                self.annotations.int_division.insert(NodeId::from(expr));
            }
            _ => {}
        }

        if op.is_comparison() {
            return Ok(Type::BOOL);
        }

        if op.is_logical() {
            let is_bool = |t: &Type| *t == Type::BOOL || *t == Type::Any;
            if is_bool(&left_ty) && is_bool(&right_ty) {
                return Ok(Type::BOOL);
            }
            self.error(
                SemanticError::InvalidLogic {
                    op: op.symbol().to_string(),
                },
                line,
            );
            return Err(Poisoned);
        }

        if op == BinOp::Add && (left_ty.is_string() || right_ty.is_string()) {
            return Ok(Type::STRING);
        }
        if left_ty == Type::Any || right_ty == Type::Any {
            return Ok(Type::Any);
        }
        if left_ty.is_numeric() && right_ty.is_numeric() {
            if left_ty == Type::DOUBLE || right_ty == Type::DOUBLE {
                return Ok(Type::DOUBLE);
            }
            return Ok(Type::INT);
        }

        self.error(
            SemanticError::InvalidArithmetic {
                op: op.symbol().to_string(),
                left: left_ty.to_string(),
                right: right_ty.to_string(),
            },
            line,
        );
        Err(Poisoned)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut parser = Parser::from_tokens(Lexer::new(source).tokenize());
        let program = parser.parse_program().expect("source should parse");
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program)
    }

    fn messages(source: &str) -> Vec<String> {
        analyze(source).into_iter().map(|d| d.message).collect()
    }

    fn symbols(source: &str) -> Vec<SymbolRecord> {
        let mut parser = Parser::from_tokens(Lexer::new(source).tokenize());
        let program = parser.parse_program().expect("source should parse");
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program);
        analyzer.into_symbol_log()
    }

    #[test]
    fn test_valid_program() {
        let source = "
wax x:int = 5;
wax y:double = x;
wax s:string = \"n = \" + str(x);
print(s);
";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_promotion_asymmetry() {
        assert!(analyze("wax d:double = 1;").is_empty());
        assert_eq!(
            messages("wax i:int = 1.5;"),
            vec!["Cannot assign a value of type 'double' to variable 'i' of type 'int'"]
        );
    }

    #[test]
    fn test_declaration_mismatch_names_types_and_line() {
        let diags = analyze("\n\nwax x:int = \"hello\";");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 3);
        assert!(diags[0].message.contains("'string'"));
        assert!(diags[0].message.contains("'int'"));
    }

    #[test]
    fn test_block_scope_ends() {
        let source = "
if (true) {
    wax inner:int = 1;
}
print(inner);
";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "The symbol 'inner' has not been declared");
        assert_eq!(diags[0].line, 5);
    }

    #[test]
    fn test_shadowing_and_sibling_scopes() {
        let source = "
wax x:int = 1;
while (x < 3) {
    wax x:string = \"shadow\";
}
if (true) { wax y:int = 1; } else { wax y:bool = false; }
for (wax i:int = 0; i < 2; i++) { wax z:int = i; }
for (wax i:int = 0; i < 2; i++) { wax z:int = i; }
";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            messages("wax x:int = 1;\nwax x:int = 2;"),
            vec!["The symbol 'x' has already been declared in this scope"]
        );
    }

    #[test]
    fn test_forward_reference() {
        let source = "
wax function a:int(n:int) { return b(n) + 1; }
wax function b:int(n:int) { return n * 2; }
print(a(3));
";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_list_inference_from_append() {
        let source = "
wax x:list = [];
x.append(1);
x.append(\"s\");
";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, 4);
        assert_eq!(
            diags[0].message,
            "Cannot append a value of type 'string' to list 'x' of type 'list[int]'"
        );

        let log = symbols(source);
        assert_eq!(log[0].name, "x");
        assert_eq!(log[0].ty, "list[int]");
    }

    #[test]
    fn test_list_backpatch_from_assignment() {
        let source = "
wax xs:list = [];
xs = [1.5, 2.5];
wax d:double = xs[0];
";
        assert!(analyze(source).is_empty());
        assert_eq!(symbols(source)[0].ty, "list[double]");
    }

    #[test]
    fn test_list_literal_elements() {
        assert_eq!(
            messages("wax xs:list = [1, \"two\"];"),
            vec!["List element 2 has type 'string', expected 'int'"]
        );
    }

    #[test]
    fn test_list_indexing_rules() {
        let source = "
wax xs:list = [1, 2];
wax empty:list = [];
wax a:int = xs[-1];
wax b:int = xs[true];
wax c:int = empty[0];
";
        assert_eq!(
            messages(source),
            vec![
                "List index -1 is negative",
                "List index must be of type 'int', found 'bool'",
                "Cannot index into the empty list 'empty'",
            ]
        );
    }

    #[test]
    fn test_list_remove_requires_int() {
        let source = "wax xs:list = [1];\nxs.remove(\"a\");\nwax n:int = 3;\nn.remove(0);";
        assert_eq!(
            messages(source),
            vec![
                "List index must be of type 'int', found 'string'",
                "'n' is of type 'int' and is not a list",
            ]
        );
    }

    #[test]
    fn test_reachability_reports_each_statement() {
        let source = "
wax function f:int() {
    return 1;
    print(2);
    print(3);
}
";
        let diags = analyze(source);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.message == "Unreachable code after 'return'"));
        assert_eq!(diags[0].line, 4);
        assert_eq!(diags[1].line, 5);
    }

    #[test]
    fn test_for_increment_binding() {
        let source = "wax j:int = 0;\nfor (wax i:int = 0; i < 3; j += 1) { print(i); }";
        assert_eq!(
            messages(source),
            vec!["The increment of a 'for' loop must update 'i', found 'j'"]
        );
    }

    #[test]
    fn test_for_control_rules() {
        let source = "for (wax d:double = 0.5; d < 3; d++) { print(d); }";
        assert_eq!(
            messages(source),
            vec![
                "The control variable 'd' of a 'for' loop must be of type 'int', found 'double'",
                "The initializer of 'for' loop variable 'd' must be of type 'int', found 'double'",
            ]
        );
        assert_eq!(
            messages("for (wax i:int = 0; 1; i = i + 0.5) { }"),
            vec![
                "The condition of 'for' must be of type 'bool', found 'int'",
                "The increment expression of a 'for' loop must be of type 'int', found 'double'",
            ]
        );
    }

    #[test]
    fn test_division_by_zero_even_unreachable() {
        let source = "
wax function f:int() {
    return 1;
    wax x:int = 5 / 0;
}
wax y:int = 4 % 0;
";
        assert_eq!(
            messages(source),
            vec!["Unreachable code after 'return'", "Division by zero", "Modulo by zero"]
        );
    }

    #[test]
    fn test_compound_assignment_rules() {
        let source = "
wax s:string = \"a\";
s += 1;
wax n:int = 1;
n -= \"x\";
n /= 0;
wax xs:list = [1];
xs += 1;
";
        assert_eq!(
            messages(source),
            vec![
                "Compound assignment '-=' is invalid between types 'int' and 'string'",
                "Division by zero",
                "Compound assignment '+=' cannot be applied to list 'xs'",
            ]
        );
    }

    #[test]
    fn test_increment_requires_numeric() {
        assert_eq!(
            messages("wax b:bool = true;\nb++;"),
            vec!["Operator '++' can only be applied to numeric variables, but 'b' is 'bool'"]
        );
    }

    #[test]
    fn test_assign_to_function() {
        let source = "wax function f:void() { return; }\nf = 1;";
        assert_eq!(messages(source), vec!["Cannot assign a value to the function 'f'"]);
    }

    #[test]
    fn test_return_rules() {
        let source = "
wax function v:void() { return 1; }
wax function i:int() { return; }
wax function s:string() { return 1; }
return 1;
";
        assert_eq!(
            messages(source),
            vec![
                "A 'void' function cannot return a value",
                "A function that is not 'void' must return a value",
                "Return type mismatch: expected 'string' but found 'int'",
                "'return' can only be used inside a function",
            ]
        );
    }

    #[test]
    fn test_top_level_return_makes_rest_unreachable() {
        let diags = analyze("return;\nprint(1);");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[1].message, "Unreachable code after 'return'");
        assert_eq!(diags[1].line, 2);
    }

    #[test]
    fn test_conditions_must_be_bool() {
        assert_eq!(
            messages("if (1) { }\nwhile (\"s\") { }"),
            vec![
                "The condition of 'if' must be of type 'bool', found 'int'",
                "The condition of 'while' must be of type 'bool', found 'string'",
            ]
        );
    }

    #[test]
    fn test_call_checks() {
        let source = "
wax function f:int(a:int, b:double) { return a; }
wax x:int = f(1);
wax y:int = f(1, \"s\");
wax z:int = g(1);
wax w:string = str(1);
";
        assert_eq!(
            messages(source),
            vec![
                "Function 'f' expected 2 arguments but received 1",
                "Argument 2 of 'f': expected type 'double' but found 'string'",
                "'g' is not a function or has not been declared",
            ]
        );
    }

    #[test]
    fn test_operator_typing() {
        let source = "
wax a:bool = !1;
wax b:int = -\"s\";
wax c:bool = 1 && true;
wax d:int = true * 2;
wax e:bool = 1 < 2.5;
";
        assert_eq!(
            messages(source),
            vec![
                "Operator '!' requires a 'bool' operand, found 'int'",
                "Unary '-' requires a numeric operand, found 'string'",
                "Logical operation '&&' is only allowed between 'bool' values",
                "Invalid arithmetic operation '*' between types 'bool' and 'int'",
            ]
        );
    }

    #[test]
    fn test_errors_do_not_cascade() {
        // Only the undeclared name is reported; the arithmetic and the
        // declaration that depend on it stay silent.
        assert_eq!(
            messages("wax x:int = missing * 2 + 1;"),
            vec!["The symbol 'missing' has not been declared"]
        );
    }

    #[test]
    fn test_multi_assign() {
        let source = "wax a:int = 1;\nwax b:string = \"x\";\na, b = 2, 3;\na, b = 1;";
        assert_eq!(
            messages(source),
            vec![
                "Cannot assign a value of type 'int' to variable 'b' of type 'string'",
                "Multiple assignment has 2 targets but 1 values",
            ]
        );
    }

    #[test]
    fn test_unknown_and_void_types() {
        assert_eq!(
            messages("wax x:number = 1;\nwax v:void = 1;"),
            vec![
                "Unknown type 'number'",
                "Variable 'v' cannot be declared with type 'void'",
            ]
        );
    }

    #[test]
    fn test_symbol_log_keeps_scoped_symbols() {
        let source = "
wax function sum:int(xs:list[int]) {
    wax total:int = 0;
    for (wax i:int = 0; i < 3; i++) {
        total += xs[i];
    }
    return total;
}
";
        let log = symbols(source);
        let entries: Vec<(&str, &str, &str, usize)> = log
            .iter()
            .map(|r| (r.name.as_str(), r.ty.as_str(), r.scope.as_str(), r.line))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("sum", "function(list[int]) -> int", "global", 2),
                ("xs", "list[int]", "function:sum", 2),
                ("total", "int", "function:sum", 3),
                ("i", "int", "for", 4),
            ]
        );
    }

    #[test]
    fn test_analyze_resets_state() {
        let mut parser = Parser::from_tokens(Lexer::new("wax x:int = 1;").tokenize());
        let program = parser.parse_program().unwrap();
        let mut analyzer = SemanticAnalyzer::new();
        assert!(analyzer.analyze(&program).is_empty());
        // A second run must not see `x` from the first
        assert!(analyzer.analyze(&program).is_empty());
        assert_eq!(analyzer.into_symbol_log().len(), 1);
    }

    #[test]
    fn test_for_accepts_unconstrained_elements() {
        let source = "
wax function f:void(p:list) {
    for (wax i:int = p[0]; i < 3; i = p[1]) {
        print(i);
    }
}
";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn test_for_body_may_shadow_control_variable() {
        let source = "for (wax i:int = 0; i < 3; i++) { wax i:string = \"body\"; print(i); }";
        assert!(analyze(source).is_empty());
        let scopes: Vec<(String, String)> = symbols(source)
            .into_iter()
            .map(|r| (r.name, r.scope))
            .collect();
        assert_eq!(
            scopes,
            vec![
                ("i".to_string(), "for".to_string()),
                ("i".to_string(), "for".to_string()),
            ]
        );
    }

    #[test]
    fn test_increment_of_function() {
        assert_eq!(
            messages("wax function f:void() { return; }\nf++;"),
            vec!["Operator '++' can only be applied to numeric variables, but 'f' is 'function'"]
        );
    }

    #[test]
    fn test_annotations_mark_concat_and_int_division() {
        let source = "
print(\"n=\" + 5);
wax s:string = \"a\" + \"b\";
wax q:int = 7 / 2;
wax r:double = 7.0 / 2;
s += 1;
s += \"c\";
q /= 2;
";
        let mut parser = Parser::from_tokens(Lexer::new(source).tokenize());
        let program = parser.parse_program().unwrap();
        let mut analyzer = SemanticAnalyzer::new();
        assert!(analyzer.analyze(&program).is_empty());
        let notes = analyzer.annotations();

        let exprs: Vec<&Expr> = program.stmts[..4]
            .iter()
            .map(|stmt| match stmt {
                Stmt::Print { value, .. } | Stmt::Declaration { value, .. } => value,
                other => panic!("Expected a statement with a value, got {:?}", other),
            })
            .collect();
        assert!(notes.is_concat(exprs[0]));
        assert!(!notes.is_concat(exprs[1]));
        assert!(notes.is_int_division(exprs[2]));
        assert!(!notes.is_int_division(exprs[3]));

        assert!(notes.is_concat(&program.stmts[4]));
        assert!(!notes.is_concat(&program.stmts[5]));
        assert!(notes.is_int_division(&program.stmts[6]));
    }
}
