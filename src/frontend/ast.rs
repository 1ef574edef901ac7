//! Abstract Syntax Tree definitions for Wax

/// A complete program (one source file)
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// A block is an ordered list of statements, not a node itself
pub type Block = Vec<Stmt>;

/// A written type annotation (`int`, `list`, `list[double]`, `void`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub subtype: Option<Box<TypeExpr>>,
    pub line: usize,
}

impl TypeExpr {
    pub fn named(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            subtype: None,
            line,
        }
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subtype {
            Some(sub) => write!(f, "{}[{}]", self.name, sub),
            None => f.write_str(&self.name),
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `wax name: ty = value;`
    Declaration {
        ty: TypeExpr,
        name: String,
        value: Expr,
        line: usize,
    },
    /// `name = value;`
    Assign {
        name: String,
        value: Expr,
        line: usize,
    },
    /// `a, b = x, y;`
    MultiAssign {
        targets: Vec<String>,
        values: Vec<Expr>,
        line: usize,
    },
    /// `name op= value;`
    CompoundAssign {
        name: String,
        op: CompoundOp,
        value: Expr,
        line: usize,
    },
    /// `name++;`, `--name;`, ...
    Step {
        name: String,
        op: StepOp,
        prefix: bool,
        line: usize,
    },
    /// `list.append(value);`
    Append {
        list: String,
        value: Expr,
        line: usize,
    },
    /// `list.remove(index);`
    Remove {
        list: String,
        index: Expr,
        line: usize,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        line: usize,
    },
    While {
        cond: Expr,
        body: Block,
        line: usize,
    },
    For(ForLoop),
    Print {
        value: Expr,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    Function(FunctionDecl),
    Expr(Expr),
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Declaration { line, .. }
            | Stmt::Assign { line, .. }
            | Stmt::MultiAssign { line, .. }
            | Stmt::CompoundAssign { line, .. }
            | Stmt::Step { line, .. }
            | Stmt::Append { line, .. }
            | Stmt::Remove { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::Return { line, .. } => *line,
            Stmt::For(f) => f.line,
            Stmt::Function(f) => f.line,
            Stmt::Expr(e) => e.line(),
        }
    }
}

/// C-style counting loop
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub var: String,
    pub ty: TypeExpr,
    pub init: Expr,
    pub cond: Expr,
    pub step: ForStep,
    pub body: Block,
    pub line: usize,
}

/// The increment clause of a `for` loop
#[derive(Debug, Clone, PartialEq)]
pub enum ForStep {
    /// `i++`, `--i`, ...
    Step {
        name: String,
        op: StepOp,
        line: usize,
    },
    /// `i += e` (with `op`) or `i = e` (without)
    Assign {
        name: String,
        op: Option<CompoundOp>,
        value: Expr,
        line: usize,
    },
}

impl ForStep {
    pub fn name(&self) -> &str {
        match self {
            ForStep::Step { name, .. } | ForStep::Assign { name, .. } => name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ForStep::Step { line, .. } | ForStep::Assign { line, .. } => *line,
        }
    }
}

/// Function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub ret: TypeExpr,
    pub params: Vec<Param>,
    pub body: Block,
    pub line: usize,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub line: usize,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int {
        value: i64,
        line: usize,
    },
    Double {
        value: f64,
        line: usize,
    },
    Str {
        value: String,
        line: usize,
    },
    Bool {
        value: bool,
        line: usize,
    },
    Ident {
        name: String,
        line: usize,
    },
    List {
        elements: Vec<Expr>,
        line: usize,
    },
    Index {
        list: String,
        index: Box<Expr>,
        line: usize,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        line: usize,
    },
    Input {
        prompt: Option<Box<Expr>>,
        line: usize,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        line: usize,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Int { line, .. }
            | Expr::Double { line, .. }
            | Expr::Str { line, .. }
            | Expr::Bool { line, .. }
            | Expr::Ident { line, .. }
            | Expr::List { line, .. }
            | Expr::Index { line, .. }
            | Expr::Call { line, .. }
            | Expr::Input { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. } => *line,
        }
    }

    /// Datatype known from the syntax alone
    pub fn datatype(&self) -> Option<&'static str> {
        match self {
            Expr::Int { .. } => Some("int"),
            Expr::Double { .. } => Some("double"),
            Expr::Str { .. } | Expr::Input { .. } => Some("string"),
            Expr::Bool { .. } => Some("bool"),
            Expr::Binary { op, .. } if op.is_comparison() || op.is_logical() => Some("bool"),
            Expr::Unary { op: UnOp::Not, .. } => Some("bool"),
            _ => None,
        }
    }

    /// True for a literal `0` or `0.0`
    pub fn is_zero_literal(&self) -> bool {
        match self {
            Expr::Int { value, .. } => *value == 0,
            Expr::Double { value, .. } => *value == 0.0,
            _ => false,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

/// Compound assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl CompoundOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompoundOp::Add => "+=",
            CompoundOp::Sub => "-=",
            CompoundOp::Mul => "*=",
            CompoundOp::Div => "/=",
        }
    }
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOp {
    Increment,
    Decrement,
}

impl StepOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            StepOp::Increment => "++",
            StepOp::Decrement => "--",
        }
    }
}
