//! Compilation pipeline
//!
//! Runs lexer, parser, semantic analyzer and code generator in order and
//! decides which stage failures stop the pipeline.

use log::{debug, info};

use crate::backend::{CodeGen, PythonCodeGen};
use crate::frontend::ast::Program;
use crate::frontend::ast_printer::print_ast;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::frontend::semantic::{SemanticAnalyzer, SymbolRecord};
use crate::utils::Diagnostic;

/// Outcome of compiling one source file
#[derive(Debug, Clone, PartialEq)]
pub enum Compilation {
    Success {
        code: String,
        symbols: Vec<SymbolRecord>,
    },
    Failure {
        diagnostics: Vec<Diagnostic>,
    },
}

/// Result of the front half of the pipeline (lexing and parsing)
struct Parsed {
    program: Option<Program>,
    diagnostics: Vec<Diagnostic>,
}

fn parse(source: &str) -> Parsed {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let mut diagnostics = lexer.into_diagnostics();
    debug!(
        "lexed {} tokens with {} lexical diagnostics",
        tokens.len(),
        diagnostics.len()
    );

    let mut parser = Parser::from_tokens(tokens);
    let program = match parser.parse_program() {
        Ok(program) => Some(program),
        Err(err) => {
            diagnostics.push(Diagnostic::from(&err));
            None
        }
    };
    Parsed {
        program,
        diagnostics,
    }
}

/// Compile Wax source to Python
pub fn compile(source: &str) -> Compilation {
    let Parsed {
        program,
        diagnostics,
    } = parse(source);

    // Any lexical problem fails the build, even if the parse recovered
    let program = match program {
        Some(program) if diagnostics.is_empty() => program,
        _ => return Compilation::Failure { diagnostics },
    };

    let mut analyzer = SemanticAnalyzer::new();
    let diagnostics = analyzer.analyze(&program);
    if !diagnostics.is_empty() {
        info!("semantic analysis reported {} problems", diagnostics.len());
        return Compilation::Failure { diagnostics };
    }

    let mut codegen = PythonCodeGen::new(analyzer.annotations().clone());
    match codegen.generate(&program) {
        Ok(code) => Compilation::Success {
            code,
            symbols: analyzer.into_symbol_log(),
        },
        Err(err) => Compilation::Failure {
            diagnostics: vec![Diagnostic::from(&err)],
        },
    }
}

/// Analyze without generating code. Returns the symbol log alongside any diagnostics.
pub fn check(source: &str) -> (Vec<SymbolRecord>, Vec<Diagnostic>) {
    let Parsed {
        program,
        diagnostics,
    } = parse(source);
    let program = match program {
        Some(program) if diagnostics.is_empty() => program,
        _ => return (Vec::new(), diagnostics),
    };

    let mut analyzer = SemanticAnalyzer::new();
    let diagnostics = analyzer.analyze(&program);
    (analyzer.into_symbol_log(), diagnostics)
}

/// Token stream dump, one token per line
pub fn dump_tokens(source: &str) -> (String, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    let lines: Vec<String> = lexer.tokenize().iter().map(|t| t.to_string()).collect();
    (lines.join("\n"), lexer.into_diagnostics())
}

/// Tree dump of the parsed program
pub fn dump_ast(source: &str) -> std::result::Result<String, Vec<Diagnostic>> {
    let Parsed {
        program,
        diagnostics,
    } = parse(source);
    match program {
        Some(program) if diagnostics.is_empty() => Ok(print_ast(&program)),
        _ => Err(diagnostics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failure(result: Compilation) -> Vec<Diagnostic> {
        match result {
            Compilation::Failure { diagnostics } => diagnostics,
            Compilation::Success { code, .. } => panic!("unexpected success:\n{}", code),
        }
    }

    fn phases(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(|d| d.phase.to_string()).collect()
    }

    #[test]
    fn test_scenario_declare_and_print() {
        match compile("wax x:int = 5;\nprint(x);") {
            Compilation::Success { code, symbols } => {
                assert_eq!(code.lines().collect::<Vec<_>>(), vec!["x = 5", "print(x, flush=True)"]);
                assert_eq!(symbols.len(), 1);
            }
            Compilation::Failure { diagnostics } => panic!("unexpected failure: {:?}", diagnostics),
        }
    }

    #[test]
    fn test_scenario_type_mismatch() {
        let diagnostics = failure(compile("wax x:int = \"hello\";"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].to_string(),
            "[Semantic Error] Line 1: Cannot assign a value of type 'string' to variable 'x' of type 'int'"
        );
    }

    #[test]
    fn test_lexical_error_fails_after_parse() {
        let diagnostics = failure(compile("wax x:int = 5 @;"));
        assert_eq!(phases(&diagnostics), vec!["Lexical"]);
    }

    #[test]
    fn test_lexical_then_syntax_report() {
        let diagnostics = failure(compile("wax x:int = $ 5\nprint(x);"));
        assert_eq!(phases(&diagnostics), vec!["Lexical", "Syntax"]);
    }

    #[test]
    fn test_syntax_error_skips_analysis() {
        // `y` is undeclared but analysis never runs
        let diagnostics = failure(compile("print(y)\n"));
        assert_eq!(phases(&diagnostics), vec!["Syntax"]);
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let source = format!("print({}1{});", "(".repeat(300), ")".repeat(300));
        let diagnostics = failure(compile(&source));
        assert_eq!(phases(&diagnostics), vec!["Syntax"]);
        assert!(diagnostics[0].message.contains("Nesting"));
    }

    #[test]
    fn test_function_updating_global_and_concat() {
        let source = "
wax hits:int = 0;
wax function hit:void() { hits++; }
hit();
print(\"hits: \" + hits);
";
        match compile(source) {
            Compilation::Success { code, .. } => assert_eq!(
                code,
                "hits = 0\ndef hit():\n    global hits\n    hits += 1\nhit()\nprint((str(\"hits: \") + str(hits)), flush=True)"
            ),
            Compilation::Failure { diagnostics } => panic!("unexpected failure: {:?}", diagnostics),
        }
    }

    #[test]
    fn test_check_returns_symbols() {
        let (symbols, diagnostics) = check("wax a:double = 1;\nwax b:list = [a];");
        assert!(diagnostics.is_empty());
        let types: Vec<&str> = symbols.iter().map(|s| s.ty.as_str()).collect();
        assert_eq!(types, vec!["double", "list[double]"]);
    }

    #[test]
    fn test_dump_tokens() {
        let (dump, diagnostics) = dump_tokens("print(1);");
        assert!(diagnostics.is_empty());
        assert_eq!(dump.lines().count(), 6);
        assert!(dump.starts_with("PRINT"));
    }

    #[test]
    fn test_dump_ast_reports_syntax_error() {
        assert!(dump_ast("wax x:int = ;").is_err());
        assert!(dump_ast("wax x:int = 1;").is_ok());
    }
}
