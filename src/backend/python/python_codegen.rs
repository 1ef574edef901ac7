//! Python Code Generator
//!
//! Translates a checked Wax AST to Python 3 source for an external interpreter.
//!
//! Wax scopes every block while Python scopes whole functions, so names are
//! rewritten on the way out: a declaration that shadows a visible name gets a
//! fresh `name_N`, and functions that assign to outer variables declare them
//! `global` or `nonlocal`.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use crate::backend::codegen::CodeGen;
use crate::frontend::ast::*;
use crate::frontend::semantic::Annotations;
use crate::utils::{Error, Result};

/// Python keywords and the builtins generated code calls
const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "input", "is", "lambda", "nonlocal", "not", "or", "pass", "print",
    "raise", "return", "str", "try", "while", "with", "yield",
];

/// Wax names bound by one block
struct Scope {
    names: HashMap<String, String>,
    /// Function nesting depth the block belongs to (0 is module level)
    frame: usize,
}

/// Outer variables a function body assigns to
#[derive(Default)]
struct FunctionFrame {
    globals: BTreeSet<String>,
    nonlocals: BTreeSet<String>,
}

/// Python code generator
pub struct PythonCodeGen {
    annotations: Annotations,
    lines: Vec<String>,
    indent: usize,
    scopes: Vec<Scope>,
    frames: Vec<FunctionFrame>,
    /// Every Python name in use, so fresh names never collide
    taken: HashSet<String>,
}

impl PythonCodeGen {
    pub fn new(annotations: Annotations) -> Self {
        Self {
            annotations,
            lines: Vec::new(),
            indent: 0,
            scopes: Vec::new(),
            frames: Vec::new(),
            taken: HashSet::new(),
        }
    }

    /// Write indented line
    fn writeln(&mut self, line: &str) {
        self.lines.push(format!("{}{}", "    ".repeat(self.indent), line));
    }

    // ==================== Names ====================

    fn collect_names(stmts: &[Stmt], names: &mut HashSet<String>) {
        for stmt in stmts {
            match stmt {
                Stmt::Declaration { name, .. } => {
                    names.insert(name.clone());
                }
                Stmt::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    Self::collect_names(then_block, names);
                    if let Some(else_block) = else_block {
                        Self::collect_names(else_block, names);
                    }
                }
                Stmt::While { body, .. } => Self::collect_names(body, names),
                Stmt::For(f) => {
                    names.insert(f.var.clone());
                    Self::collect_names(&f.body, names);
                }
                Stmt::Function(func) => {
                    names.insert(func.name.clone());
                    names.extend(func.params.iter().map(|p| p.name.clone()));
                    Self::collect_names(&func.body, names);
                }
                _ => {}
            }
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope {
            names: HashMap::new(),
            frame: self.frames.len(),
        });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Python name and owning frame of a visible Wax name
    fn lookup(&self, name: &str) -> Option<(&str, usize)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).map(|py| (py.as_str(), scope.frame)))
    }

    /// Python name for a read. Unbound names (builtins) pass through.
    fn resolve(&self, name: &str) -> String {
        self.lookup(name)
            .map(|(py, _)| py.to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Python name for a write, recording the `global`/`nonlocal` it needs
    fn assign_target(&mut self, name: &str) -> String {
        let Some((py, frame)) = self.lookup(name).map(|(py, frame)| (py.to_string(), frame)) else {
            return name.to_string();
        };
        let depth = self.frames.len();
        if let Some(current) = self.frames.last_mut() {
            if frame == 0 {
                current.globals.insert(py.clone());
            } else if frame < depth {
                current.nonlocals.insert(py.clone());
            }
        }
        py
    }

    /// Bind a declared Wax name in the innermost scope
    fn bind(&mut self, name: &str) -> String {
        let py = if RESERVED.contains(&name) || self.lookup(name).is_some() {
            self.fresh(name)
        } else {
            name.to_string()
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_string(), py.clone());
        }
        py
    }

    fn fresh(&mut self, name: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", name, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    // ==================== Statements ====================

    /// Emit an indented block, `pass` when it has no statements
    fn gen_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.indent += 1;
        if stmts.is_empty() {
            self.writeln("pass");
        }
        for stmt in stmts {
            self.gen_stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn gen_scoped_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.push_scope();
        let result = self.gen_block(stmts);
        self.pop_scope();
        result
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Declaration { name, value, .. } => {
                let value = self.gen_expr(value);
                let name = self.bind(name);
                self.writeln(&format!("{} = {}", name, value));
            }
            Stmt::Assign { name, value, .. } => {
                let value = self.gen_expr(value);
                let name = self.assign_target(name);
                self.writeln(&format!("{} = {}", name, value));
            }
            Stmt::MultiAssign {
                targets, values, ..
            } => {
                if targets.len() != values.len() {
                    return Err(Error::CodeGen(format!(
                        "multiple assignment with {} targets and {} values",
                        targets.len(),
                        values.len()
                    )));
                }
                let values: Vec<String> = values.iter().map(|v| self.gen_expr(v)).collect();
                let targets: Vec<String> = targets.iter().map(|t| self.assign_target(t)).collect();
                self.writeln(&format!("{} = {}", targets.join(", "), values.join(", ")));
            }
            Stmt::CompoundAssign {
                name, op, value, ..
            } => {
                let value = self.gen_expr(value);
                let name = self.assign_target(name);
                let line = if self.annotations.is_concat(stmt) {
                    format!("{} = (str({}) + str({}))", name, name, value)
                } else if self.annotations.is_int_division(stmt) {
                    format!("{} //= {}", name, value)
                } else {
                    format!("{} {} {}", name, op.symbol(), value)
                };
                self.writeln(&line);
            }
            Stmt::Step { name, op, .. } => {
                let name = self.assign_target(name);
                self.writeln(&Self::step_line(&name, *op));
            }
            Stmt::Append { list, value, .. } => {
                let value = self.gen_expr(value);
                let list = self.resolve(list);
                self.writeln(&format!("{}.append({})", list, value));
            }
            Stmt::Remove { list, index, .. } => {
                let index = self.gen_expr(index);
                let list = self.resolve(list);
                self.writeln(&format!("del {}[{}]", list, index));
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                let cond = self.gen_expr(cond);
                self.writeln(&format!("if {}:", cond));
                self.gen_scoped_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.writeln("else:");
                    self.gen_scoped_block(else_block)?;
                }
            }
            Stmt::While { cond, body, .. } => {
                let cond = self.gen_expr(cond);
                self.writeln(&format!("while {}:", cond));
                self.gen_scoped_block(body)?;
            }
            Stmt::For(f) => self.gen_for(f)?,
            Stmt::Print { value, .. } => {
                let value = self.gen_expr(value);
                self.writeln(&format!("print({}, flush=True)", value));
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => {
                    let value = self.gen_expr(value);
                    self.writeln(&format!("return {}", value));
                }
                None => self.writeln("return"),
            },
            Stmt::Function(func) => self.gen_function(func)?,
            Stmt::Expr(expr) => {
                let expr = self.gen_expr(expr);
                self.writeln(&expr);
            }
        }
        Ok(())
    }

    fn gen_function(&mut self, func: &FunctionDecl) -> Result<()> {
        // Top-level functions were bound up front so calls may precede them
        let name = if self.scopes.len() == 1 {
            self.resolve(&func.name)
        } else {
            self.bind(&func.name)
        };

        self.frames.push(FunctionFrame::default());
        self.push_scope();
        let params: Vec<String> = func.params.iter().map(|p| self.bind(&p.name)).collect();
        self.writeln(&format!("def {}({}):", name, params.join(", ")));
        let header = self.lines.len();
        let result = self.gen_block(&func.body);
        self.pop_scope();
        let frame = self.frames.pop().unwrap_or_default();
        result?;

        let pad = "    ".repeat(self.indent + 1);
        let mut decls = Vec::new();
        if !frame.globals.is_empty() {
            let names: Vec<&str> = frame.globals.iter().map(String::as_str).collect();
            decls.push(format!("{}global {}", pad, names.join(", ")));
        }
        if !frame.nonlocals.is_empty() {
            let names: Vec<&str> = frame.nonlocals.iter().map(String::as_str).collect();
            decls.push(format!("{}nonlocal {}", pad, names.join(", ")));
        }
        for (offset, decl) in decls.into_iter().enumerate() {
            self.lines.insert(header + offset, decl);
        }
        Ok(())
    }

    /// `for` becomes an initializer followed by a `while` whose body ends with the step.
    /// The control variable lives in its own scope around the body's.
    fn gen_for(&mut self, f: &ForLoop) -> Result<()> {
        let init = self.gen_expr(&f.init);
        self.push_scope();
        let var = self.bind(&f.var);
        self.writeln(&format!("{} = {}", var, init));
        let cond = self.gen_expr(&f.cond);
        self.writeln(&format!("while {}:", cond));

        self.indent += 1;
        self.push_scope();
        let body = f.body.iter().try_for_each(|stmt| self.gen_stmt(stmt));
        self.pop_scope();
        body?;

        let step = match &f.step {
            ForStep::Step { name, op, .. } => {
                let name = self.assign_target(name);
                Self::step_line(&name, *op)
            }
            ForStep::Assign {
                name, op, value, ..
            } => {
                let value = self.gen_expr(value);
                let name = self.assign_target(name);
                match op {
                    // The control variable is always an int
                    Some(CompoundOp::Div) => format!("{} //= {}", name, value),
                    Some(op) => format!("{} {} {}", name, op.symbol(), value),
                    None => format!("{} = {}", name, value),
                }
            }
        };
        self.writeln(&step);
        self.indent -= 1;
        self.pop_scope();
        Ok(())
    }

    fn step_line(name: &str, op: StepOp) -> String {
        match op {
            StepOp::Increment => format!("{} += 1", name),
            StepOp::Decrement => format!("{} -= 1", name),
        }
    }

    // ==================== Expressions ====================

    fn binop_to_python(op: BinOp) -> &'static str {
        match op {
            BinOp::And => "and",
            BinOp::Or => "or",
            other => other.symbol(),
        }
    }

    /// Convert expression to Python source
    fn gen_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Int { value, .. } => value.to_string(),
            Expr::Double { value, .. } => format!("{:?}", value),
            Expr::Str { value, .. } => Self::quote(value),
            Expr::Bool { value: true, .. } => "True".to_string(),
            Expr::Bool { value: false, .. } => "False".to_string(),
            Expr::Ident { name, .. } => self.resolve(name),
            Expr::List { elements, .. } => {
                let elements: Vec<String> = elements.iter().map(|e| self.gen_expr(e)).collect();
                format!("[{}]", elements.join(", "))
            }
            Expr::Index { list, index, .. } => {
                format!("{}[{}]", self.resolve(list), self.gen_expr(index))
            }
            Expr::Call { callee, args, .. } => {
                let args: Vec<String> = args.iter().map(|a| self.gen_expr(a)).collect();
                format!("{}({})", self.resolve(callee), args.join(", "))
            }
            // Flush pending output so the prompt appears before blocking on stdin
            Expr::Input { prompt, .. } => {
                let prompt = prompt.as_ref().map(|p| self.gen_expr(p)).unwrap_or_default();
                format!("(print(end='', flush=True) or input({}))", prompt)
            }
            Expr::Unary { op, operand, .. } => match op {
                UnOp::Not => format!("(not {})", self.gen_expr(operand)),
                UnOp::Neg => format!("(-{})", self.gen_expr(operand)),
            },
            Expr::Binary {
                op, left, right, ..
            } => {
                let (left, right) = (self.gen_expr(left), self.gen_expr(right));
                if self.annotations.is_concat(expr) {
                    format!("(str({}) + str({}))", left, right)
                } else if self.annotations.is_int_division(expr) {
                    format!("({} // {})", left, right)
                } else {
                    format!("({} {} {})", left, Self::binop_to_python(*op), right)
                }
            }
        }
    }

    /// Render a string literal with Python escapes
    fn quote(value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for c in value.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                '\0' => out.push_str("\\x00"),
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl CodeGen for PythonCodeGen {
    fn generate(&mut self, program: &Program) -> Result<String> {
        self.lines.clear();
        self.indent = 0;
        self.scopes.clear();
        self.frames.clear();
        self.taken.clear();
        debug!("generating {} code", self.name());

        Self::collect_names(&program.stmts, &mut self.taken);
        self.push_scope();
        for stmt in &program.stmts {
            if let Stmt::Function(func) = stmt {
                self.bind(&func.name);
            }
        }

        for stmt in &program.stmts {
            self.gen_stmt(stmt)?;
        }

        debug!("generated {} lines of Python", self.lines.len());
        Ok(self.lines.join("\n"))
    }

    fn name(&self) -> &str {
        "python"
    }
}
