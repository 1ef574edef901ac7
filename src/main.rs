//! Wax Compiler
//!
//! Compiles Wax source files to Python.

mod backend;
mod driver;
mod frontend;
mod types;
mod utils;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{self, Command, Stdio};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use driver::Compilation;
use frontend::semantic::SymbolRecord;
use utils::Diagnostic;

/// Wax Compiler
#[derive(Parser, Debug)]
#[command(name = "waxc")]
#[command(version = "0.1.0")]
#[command(about = "Wax compiler - compiles Wax programs to Python")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.wax)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report diagnostics and dumps as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file
    Build {
        /// Input source file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a source file for errors
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print the token stream
    Tokens {
        /// Input source file
        input: PathBuf,
    },
    /// Print the syntax tree
    Ast {
        /// Input source file
        input: PathBuf,
    },
    /// Print every declared symbol with its type and scope
    Symbols {
        /// Input source file
        input: PathBuf,
    },
    /// Compile and execute with a Python interpreter
    Run {
        /// Input source file
        input: PathBuf,

        /// Interpreter to execute the generated program
        #[arg(long, default_value = "python3")]
        python: String,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Dispatch a command. `Ok(false)` means the source had errors.
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Some(Commands::Build { input, output }) => build(input, output.as_deref(), cli.json),
        Some(Commands::Check { input }) => check(input, cli.json),
        Some(Commands::Tokens { input }) => tokens(input, cli.json),
        Some(Commands::Ast { input }) => ast(input, cli.json),
        Some(Commands::Symbols { input }) => symbols(input, cli.json),
        Some(Commands::Run { input, python }) => execute(input, python, cli.json),
        Some(Commands::Version) => {
            println!("waxc 0.1.0");
            println!("Wax Compiler (Python backend)");
            Ok(true)
        }
        None => match &cli.input {
            Some(input) => build(input, cli.output.as_deref(), cli.json),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: waxc <FILE> or waxc build <FILE>");
                Ok(false)
            }
        },
    }
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn report(diagnostics: &[Diagnostic], json: bool) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string_pretty(diagnostics)?);
    } else {
        for diagnostic in diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
    Ok(())
}

/// Compile, reporting diagnostics. Returns generated code on success.
fn compile_source(input: &Path, json: bool) -> Result<Option<String>> {
    let source = read_source(input)?;
    info!("compiling {}", input.display());
    match driver::compile(&source) {
        Compilation::Success { code, .. } => Ok(Some(code)),
        Compilation::Failure { diagnostics } => {
            report(&diagnostics, json)?;
            Ok(None)
        }
    }
}

fn build(input: &Path, output: Option<&Path>, json: bool) -> Result<bool> {
    let Some(code) = compile_source(input, json)? else {
        return Ok(false);
    };

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("py"));
    fs::write(&out_path, format!("{}\n", code))
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    println!("Output: {}", out_path.display());
    Ok(true)
}

fn check(input: &Path, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    let (_, diagnostics) = driver::check(&source);
    if diagnostics.is_empty() {
        println!("No errors found");
        return Ok(true);
    }
    report(&diagnostics, json)?;
    Ok(false)
}

fn tokens(input: &Path, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    let (dump, diagnostics) = driver::dump_tokens(&source);
    println!("{}", dump);
    report(&diagnostics, json)?;
    Ok(diagnostics.is_empty())
}

fn ast(input: &Path, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    match driver::dump_ast(&source) {
        Ok(dump) => {
            print!("{}", dump);
            Ok(true)
        }
        Err(diagnostics) => {
            report(&diagnostics, json)?;
            Ok(false)
        }
    }
}

fn symbols(input: &Path, json: bool) -> Result<bool> {
    let source = read_source(input)?;
    let (symbols, diagnostics) = driver::check(&source);
    if json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
    } else {
        print_symbols(&symbols);
    }
    report(&diagnostics, json)?;
    Ok(diagnostics.is_empty())
}

fn print_symbols(symbols: &[SymbolRecord]) {
    println!(
        "{:<16} {:<24} {:<20} {}",
        "NAME", "TYPE", "SCOPE", "DECLARED"
    );
    for symbol in symbols {
        println!("{}", symbol);
    }
}

/// Write the generated program next to the input and run it.
/// The interpreter inherits stdio so `input()` reads from the terminal.
fn execute(input: &Path, python: &str, json: bool) -> Result<bool> {
    let Some(code) = compile_source(input, json)? else {
        return Ok(false);
    };

    let script = input.with_extension("py");
    fs::write(&script, format!("{}\n", code))
        .with_context(|| format!("failed to write {}", script.display()))?;

    let mut child = Command::new(python)
        .arg(&script)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start interpreter '{}'", python))?;
    let status = child
        .wait()
        .with_context(|| format!("interpreter '{}' did not run", python))?;

    if !status.success() {
        bail!("program exited with {}", status);
    }
    std::io::stdout().flush()?;
    Ok(true)
}
