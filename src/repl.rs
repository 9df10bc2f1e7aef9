// File: src/repl.rs
//
// Interactive REPL for the Monkey language. Carries compiler and VM
// state across inputs so a `let` or function definition on one line
// is visible on the next, the same persistent-session shape as the
// tree-walking REPL this one replaces.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::compiler::Compiler;
use crate::errors::{CompileError, ParseError, RuntimeError, SourceLocation};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::symbol_table::SymbolTable;
use crate::value::Value;
use crate::vm::VM;

pub struct Repl {
    editor: DefaultEditor,
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    globals: Vec<Value>,
}

impl Repl {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in crate::builtins::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index as u16, builtin.name);
        }
        Ok(Repl {
            editor,
            constants: Vec::new(),
            symbol_table,
            globals: vec![Value::Null; 65536],
        })
    }

    fn show_banner(&self) {
        println!("{}", "╔══════════════════════════════════════════╗".bright_cyan());
        println!("{}", "║   Monkey REPL — bytecode VM, type :help   ║".bright_cyan());
        println!("{}", "╚══════════════════════════════════════════╝".bright_cyan());
        println!();
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();
        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() { "monkey> ".bright_green().to_string() } else { "....... ".bright_blue().to_string() };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {err}", "Error:".bright_red());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Returns true to continue the REPL, false to quit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":help" => {
                self.show_help();
                true
            }
            ":quit" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                false
            }
            ":reset" => {
                let mut symbol_table = SymbolTable::new();
                for (index, builtin) in crate::builtins::BUILTINS.iter().enumerate() {
                    symbol_table.define_builtin(index as u16, builtin.name);
                }
                self.constants.clear();
                self.symbol_table = symbol_table;
                self.globals = vec![Value::Null; 65536];
                println!("{}", "Environment reset".bright_green());
                true
            }
            _ => {
                println!("{} unknown command: {cmd}. Type :help for a list.", "Error:".bright_red());
                true
            }
        }
    }

    fn show_help(&self) {
        println!();
        println!("{}", "Commands:".bright_cyan().bold());
        println!("  :help           show this message");
        println!("  :quit, :exit    leave the REPL");
        println!("  :reset          clear all bindings");
        println!();
        println!("Unclosed braces/brackets/parens continue the input on the next line.");
        println!();
    }

    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        let tokens = Lexer::new(input).tokenize();
        let program = match Parser::new(tokens).parse_program() {
            Ok(program) => program,
            Err(e) => {
                println!("{}", ParseError { message: e, location: SourceLocation::unknown() });
                return;
            }
        };

        let mut compiler = Compiler::new_with_state(
            std::mem::take(&mut self.constants),
            std::mem::replace(&mut self.symbol_table, SymbolTable::new()),
        );
        if let Err(e) = compiler.compile(&program) {
            println!("{}", CompileError::new(e));
            let (constants, symbol_table) = compiler.into_state();
            self.constants = constants;
            self.symbol_table = symbol_table;
            return;
        }

        let bytecode = compiler.bytecode();
        let (constants, symbol_table) = compiler.into_state();
        self.constants = constants;
        self.symbol_table = symbol_table;

        let mut vm = VM::new_with_globals_store(bytecode, std::mem::take(&mut self.globals));
        match vm.run() {
            Ok(()) => println!("{} {}", "=>".bright_blue(), vm.last_popped_stack_elem()),
            Err(e) => println!("{}", RuntimeError::new(e)),
        }
        self.globals = vm.globals;
    }
}

fn is_input_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '(' | '[' if !in_string => depth += 1,
            '}' | ')' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }
    !in_string && depth <= 0
}
