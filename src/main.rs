// File: src/main.rs
//
// Entry point for the Monkey bytecode compiler and VM. Handles
// command-line argument parsing and dispatches to the appropriate
// subcommand (run or repl).

mod ast;
mod builtins;
mod bytecode;
mod compiler;
mod errors;
mod frame;
mod lexer;
mod parser;
mod repl;
mod symbol_table;
mod value;
mod vm;

use std::fs;
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};

use compiler::Compiler;
use errors::{CompileError, ParseError, RuntimeError, SourceLocation};
use lexer::Lexer;
use parser::Parser as MonkeyParser;
use vm::VM;

#[derive(ClapParser)]
#[command(
    name = "monkey",
    about = "A bytecode compiler and virtual machine for the Monkey language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Monkey script file
    Run {
        /// Path to the .monkey file
        file: PathBuf,
    },

    /// Launch the interactive REPL
    Repl,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            let code = fs::read_to_string(&file).unwrap_or_else(|e| {
                eprintln!("failed to read {}: {e}", file.display());
                std::process::exit(1);
            });

            if let Err(e) = run_source(&code) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Commands::Repl => {
            if let Err(e) = repl::Repl::new().and_then(|mut r| r.run()) {
                eprintln!("REPL error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn run_source(code: &str) -> Result<(), String> {
    let tokens = Lexer::new(code).tokenize();
    let program = MonkeyParser::new(tokens)
        .parse_program()
        .map_err(|e| ParseError { message: e, location: SourceLocation::unknown() }.to_string())?;

    let ends_in_expression = matches!(program.statements.last(), Some(ast::Stmt::Expression(_)));

    let mut compiler = Compiler::new();
    compiler.compile(&program).map_err(|e| CompileError::new(e).to_string())?;

    let mut vm = VM::new(compiler.bytecode());
    vm.run().map_err(|e| RuntimeError::new(e).to_string())?;

    if ends_in_expression {
        println!("{}", vm.last_popped_stack_elem());
    }

    Ok(())
}
