//! AST Printer - Tree-formatted dump of a Wax program
//!
//! Each node prints as `KIND value : datatype [line N]`, children indented
//! beneath it with box-drawing connectors.

use crate::frontend::ast::*;

/// Intermediate tree of labelled nodes
struct Node {
    label: String,
    children: Vec<Node>,
}

impl Node {
    fn new(kind: &str, value: Option<String>, datatype: Option<&str>, line: usize) -> Self {
        let mut label = kind.to_string();
        if let Some(value) = value {
            label.push(' ');
            label.push_str(&value);
        }
        if let Some(datatype) = datatype {
            label.push_str(" : ");
            label.push_str(datatype);
        }
        label.push_str(&format!(" [line {}]", line));
        Self {
            label,
            children: Vec::new(),
        }
    }

    /// Unlabelled grouping of a nested block
    fn group(name: &str, stmts: &[Stmt]) -> Self {
        Self {
            label: name.to_string(),
            children: stmts.iter().map(stmt_node).collect(),
        }
    }

    fn with(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    fn with_all(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Pretty printer for the AST
pub struct AstPrinter {
    output: String,
}

impl AstPrinter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Print a program to string
    pub fn print_program(&mut self, program: &Program) -> String {
        self.output.clear();
        self.output.push_str("PROGRAM\n");

        let nodes: Vec<Node> = program.stmts.iter().map(stmt_node).collect();
        self.print_children(&nodes, "");

        std::mem::take(&mut self.output)
    }

    fn print_children(&mut self, nodes: &[Node], prefix: &str) {
        for (i, node) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let connector = if last { "└── " } else { "├── " };
            self.output.push_str(prefix);
            self.output.push_str(connector);
            self.output.push_str(&node.label);
            self.output.push('\n');

            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            self.print_children(&node.children, &child_prefix);
        }
    }
}

impl Default for AstPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to dump a program
pub fn print_ast(program: &Program) -> String {
    AstPrinter::new().print_program(program)
}

fn stmt_node(stmt: &Stmt) -> Node {
    match stmt {
        Stmt::Declaration {
            ty,
            name,
            value,
            line,
        } => Node::new("DECLARATION", Some(name.clone()), Some(&ty.to_string()), *line)
            .with(expr_node(value)),
        Stmt::Assign { name, value, line } => {
            Node::new("ASSIGN", Some(name.clone()), None, *line).with(expr_node(value))
        }
        Stmt::MultiAssign {
            targets,
            values,
            line,
        } => Node::new("ASSIGN_MULTI", Some(targets.join(", ")), None, *line)
            .with_all(values.iter().map(expr_node)),
        Stmt::CompoundAssign {
            name,
            op,
            value,
            line,
        } => Node::new(
            "ASSIGN_COMPOUND",
            Some(format!("{} {}", name, op.symbol())),
            None,
            *line,
        )
        .with(expr_node(value)),
        Stmt::Step {
            name,
            op,
            prefix,
            line,
        } => {
            let value = if *prefix {
                format!("{}{}", op.symbol(), name)
            } else {
                format!("{}{}", name, op.symbol())
            };
            Node::new("INCREMENT", Some(value), None, *line)
        }
        Stmt::Append { list, value, line } => {
            Node::new("LIST_APPEND", Some(list.clone()), None, *line).with(expr_node(value))
        }
        Stmt::Remove { list, index, line } => {
            Node::new("LIST_REMOVE", Some(list.clone()), None, *line).with(expr_node(index))
        }
        Stmt::If {
            cond,
            then_block,
            else_block,
            line,
        } => {
            let kind = if else_block.is_some() { "IF_ELSE" } else { "IF" };
            let node = Node::new(kind, None, None, *line)
                .with(expr_node(cond))
                .with(Node::group("then", then_block));
            match else_block {
                Some(else_block) => node.with(Node::group("else", else_block)),
                None => node,
            }
        }
        Stmt::While { cond, body, line } => Node::new("WHILE", None, None, *line)
            .with(expr_node(cond))
            .with(Node::group("body", body)),
        Stmt::For(f) => {
            let step = match &f.step {
                ForStep::Step { name, op, line } => {
                    Node::new("INCREMENT", Some(format!("{}{}", name, op.symbol())), None, *line)
                }
                ForStep::Assign {
                    name,
                    op: Some(op),
                    value,
                    line,
                } => Node::new(
                    "ASSIGN_COMPOUND",
                    Some(format!("{} {}", name, op.symbol())),
                    None,
                    *line,
                )
                .with(expr_node(value)),
                ForStep::Assign {
                    name,
                    op: None,
                    value,
                    line,
                } => Node::new("ASSIGN", Some(name.clone()), None, *line).with(expr_node(value)),
            };
            Node::new("FOR", Some(f.var.clone()), Some(&f.ty.to_string()), f.line)
                .with(expr_node(&f.init))
                .with(expr_node(&f.cond))
                .with(step)
                .with(Node::group("body", &f.body))
        }
        Stmt::Print { value, line } => {
            Node::new("PRINT", None, None, *line).with(expr_node(value))
        }
        Stmt::Return {
            value: Some(value),
            line,
        } => Node::new("RETURN_VALUE", None, None, *line).with(expr_node(value)),
        Stmt::Return { value: None, line } => Node::new("RETURN_EMPTY", None, None, *line),
        Stmt::Function(func) => {
            let params = func.params.iter().map(|p| {
                Node::new("PARAM", Some(p.name.clone()), Some(&p.ty.to_string()), p.line)
            });
            Node::new(
                "FUNCTION",
                Some(func.name.clone()),
                Some(&func.ret.to_string()),
                func.line,
            )
            .with_all(params)
            .with(Node::group("body", &func.body))
        }
        Stmt::Expr(expr) => Node::new("EXPR", None, None, expr.line()).with(expr_node(expr)),
    }
}

fn expr_node(expr: &Expr) -> Node {
    let datatype = expr.datatype();
    let line = expr.line();
    match expr {
        Expr::Int { value, .. } => Node::new("NUMBER", Some(value.to_string()), datatype, line),
        Expr::Double { value, .. } => {
            Node::new("NUMBER", Some(format!("{:?}", value)), datatype, line)
        }
        Expr::Str { value, .. } => {
            Node::new("STRING", Some(format!("{:?}", value)), datatype, line)
        }
        Expr::Bool { value, .. } => Node::new("BOOL", Some(value.to_string()), datatype, line),
        Expr::Ident { name, .. } => Node::new("IDENT", Some(name.clone()), datatype, line),
        Expr::List { elements, .. } => {
            Node::new("LIST", None, datatype, line).with_all(elements.iter().map(expr_node))
        }
        Expr::Index { list, index, .. } => {
            Node::new("LIST_ACCESS", Some(list.clone()), datatype, line).with(expr_node(index))
        }
        Expr::Call { callee, args, .. } => Node::new("FUNC_CALL", Some(callee.clone()), datatype, line)
            .with_all(args.iter().map(expr_node)),
        Expr::Input { prompt, .. } => {
            let node = Node::new("INPUT", None, datatype, line);
            match prompt {
                Some(prompt) => node.with(expr_node(prompt)),
                None => node,
            }
        }
        Expr::Unary { op, operand, .. } => {
            let kind = match op {
                UnOp::Not => "NOT",
                UnOp::Neg => "UNARY_MINUS",
            };
            Node::new(kind, None, datatype, line).with(expr_node(operand))
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            let kind = if op.is_logical() { "LOGIC" } else { "BINOP" };
            Node::new(kind, Some(op.symbol().to_string()), datatype, line)
                .with(expr_node(left))
                .with(expr_node(right))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn dump(source: &str) -> String {
        let mut parser = Parser::from_tokens(Lexer::new(source).tokenize());
        let program = parser.parse_program().unwrap();
        print_ast(&program)
    }

    #[test]
    fn test_declaration_tree() {
        let expected = "\
PROGRAM
├── DECLARATION x : int [line 1]
│   └── BINOP + [line 1]
│       ├── NUMBER 1 : int [line 1]
│       └── IDENT y [line 1]
└── PRINT [line 2]
    └── IDENT x [line 2]
";
        assert_eq!(dump("wax x:int = 1 + y;\nprint(x);"), expected);
    }

    #[test]
    fn test_if_else_groups() {
        let expected = "\
PROGRAM
└── IF_ELSE [line 1]
    ├── LOGIC && : bool [line 1]
    │   ├── BOOL true : bool [line 1]
    │   └── NOT : bool [line 1]
    │       └── BOOL false : bool [line 1]
    ├── then
    │   └── RETURN_EMPTY [line 1]
    └── else
        └── INCREMENT x++ [line 1]
";
        assert_eq!(dump("if (true && !false) { return; } else { x++; }"), expected);
    }

    #[test]
    fn test_function_params() {
        let out = dump("wax function f:list[int](xs:list[int], n:int) { return xs; }");
        assert!(out.contains("FUNCTION f : list[int] [line 1]"));
        assert!(out.contains("├── PARAM xs : list[int] [line 1]"));
        assert!(out.contains("├── PARAM n : int [line 1]"));
        assert!(out.contains("RETURN_VALUE [line 1]"));
    }
}
