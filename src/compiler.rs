// File: src/compiler.rs
//
// Bytecode compiler for the Monkey language.
// Compiles AST nodes into bytecode instructions for the VM.

use std::rc::Rc;

use crate::ast::{BlockStatement, Expr, Program, Stmt};
use crate::builtins::BUILTINS;
use crate::bytecode::{make, Bytecode, Instructions, OpCode};
use crate::symbol_table::{SymbolScope, SymbolTable};
use crate::value::{CompiledFunction, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmittedInstruction {
    opcode: OpCode,
    position: usize,
}

/// One nested function body's worth of in-progress instructions. The
/// compiler keeps a stack of these, one per enclosing function
/// literal, with the bottom entry compiling the top-level program.
#[derive(Debug, Clone, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index as u16, builtin.name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Resume compiling into a previously produced constant pool and
    /// symbol table, the way the REPL carries state between inputs.
    pub fn new_with_state(constants: Vec<Value>, symbol_table: SymbolTable) -> Self {
        Compiler { constants, symbol_table, scopes: vec![CompilationScope::default()] }
    }

    pub fn into_state(self) -> (Vec<Value>, SymbolTable) {
        (self.constants, self.symbol_table)
    }

    pub fn compile(&mut self, program: &Program) -> Result<(), String> {
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode { instructions: self.current_instructions().clone(), constants: self.constants.clone() }
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes.last().expect("compiler always has at least one scope").instructions
    }

    fn scope(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().expect("compiler always has at least one scope")
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = outer.push();
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("leave_scope without matching enter_scope");
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = outer.pop();
        scope.instructions
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit(&mut self, opcode: OpCode, operands: &[usize]) -> usize {
        let ins = make(opcode, operands);
        let position = self.current_instructions().len();
        self.scope().instructions.extend_from_slice(&ins);

        let previous = self.scope().last_instruction;
        self.scope().previous_instruction = previous;
        self.scope().last_instruction = Some(EmittedInstruction { opcode, position });
        position
    }

    fn last_instruction_is(&self, opcode: OpCode) -> bool {
        matches!(self.scopes.last().unwrap().last_instruction, Some(EmittedInstruction { opcode: op, .. }) if op == opcode)
    }

    fn remove_last_pop(&mut self) {
        let scope = self.scope();
        let Some(last) = scope.last_instruction else { return };
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: Instructions) {
        let ins = &mut self.scope().instructions;
        ins[position..position + new_instruction.len()].copy_from_slice(&new_instruction);
    }

    fn change_operand(&mut self, position: usize, operand: usize) {
        let opcode = OpCode::from_byte(self.current_instructions()[position]).expect("valid opcode byte");
        let new_instruction = make(opcode, &[operand]);
        self.replace_instruction(position, new_instruction);
    }

    /// Replace a trailing `Pop` with `ReturnValue` so an implicit
    /// function-body tail expression becomes the function's result.
    fn replace_last_pop_with_return(&mut self) {
        let Some(last) = self.scope().last_instruction else { return };
        let new_instruction = make(OpCode::ReturnValue, &[]);
        self.replace_instruction(last.position, new_instruction);
        self.scope().last_instruction = Some(EmittedInstruction { opcode: OpCode::ReturnValue, position: last.position });
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), String> {
        match stmt {
            Stmt::Expression(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, &[]);
                Ok(())
            }
            Stmt::Let { name, value } => {
                // Define before compiling the value: a global `let`
                // binding a recursive function then resolves through
                // its own Global/Local slot while the body compiles.
                let symbol = self.symbol_table.define(name);
                self.compile_expr(value)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(OpCode::SetGlobal, &[symbol.index as usize]),
                    SymbolScope::Local => self.emit(OpCode::SetLocal, &[symbol.index as usize]),
                    _ => unreachable!("let always defines Global or Local"),
                };
                Ok(())
            }
            Stmt::Return(expr) => {
                self.compile_expr(expr)?;
                self.emit(OpCode::ReturnValue, &[]);
                Ok(())
            }
        }
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), String> {
        for stmt in &block.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), String> {
        match expr {
            Expr::IntegerLiteral(n) => {
                let index = self.add_constant(Value::Integer(*n));
                self.emit(OpCode::Constant, &[index]);
                Ok(())
            }
            Expr::StringLiteral(s) => {
                let index = self.add_constant(Value::new_string(s.as_str()));
                self.emit(OpCode::Constant, &[index]);
                Ok(())
            }
            Expr::BooleanLiteral(true) => {
                self.emit(OpCode::True, &[]);
                Ok(())
            }
            Expr::BooleanLiteral(false) => {
                self.emit(OpCode::False, &[]);
                Ok(())
            }
            Expr::Identifier(name) => {
                let symbol = match self.symbol_table.resolve(name) {
                    Some(symbol) => symbol,
                    None => {
                        let known_names = self.symbol_table.known_names();
                        return Err(crate::errors::CompileError::undefined_identifier(name, &known_names).message);
                    }
                };
                self.load_symbol(symbol);
                Ok(())
            }
            Expr::ArrayLiteral(elements) => {
                for el in elements {
                    self.compile_expr(el)?;
                }
                self.emit(OpCode::Array, &[elements.len()]);
                Ok(())
            }
            Expr::HashLiteral(pairs) => {
                for (key, value) in pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(OpCode::Hash, &[pairs.len() * 2]);
                Ok(())
            }
            Expr::Index { left, index } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(OpCode::Index, &[]);
                Ok(())
            }
            Expr::Prefix { operator, right } => {
                self.compile_expr(right)?;
                match operator.as_str() {
                    "!" => self.emit(OpCode::Bang, &[]),
                    "-" => self.emit(OpCode::Minus, &[]),
                    other => return Err(format!("unknown prefix operator: {other}")),
                };
                Ok(())
            }
            Expr::Infix { left, operator, right } => {
                if operator == "<" {
                    // Normalize `a < b` to `b > a` so the VM only
                    // needs one comparison direction.
                    self.compile_expr(right)?;
                    self.compile_expr(left)?;
                    self.emit(OpCode::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                match operator.as_str() {
                    "+" => self.emit(OpCode::Add, &[]),
                    "-" => self.emit(OpCode::Subtract, &[]),
                    "*" => self.emit(OpCode::Multiply, &[]),
                    "/" => self.emit(OpCode::Divide, &[]),
                    ">" => self.emit(OpCode::GreaterThan, &[]),
                    "==" => self.emit(OpCode::Equal, &[]),
                    "!=" => self.emit(OpCode::NotEqual, &[]),
                    other => return Err(format!("unknown infix operator: {other}")),
                };
                Ok(())
            }
            Expr::If { condition, consequence, alternative } => {
                self.compile_expr(condition)?;
                let jump_not_truthy_pos = self.emit(OpCode::JumpNotTruthy, &[0xFFFF]);

                self.compile_block(consequence)?;
                if self.last_instruction_is(OpCode::Pop) {
                    self.remove_last_pop();
                }

                let jump_pos = self.emit(OpCode::Jump, &[0xFFFF]);
                let after_consequence = self.current_instructions().len();
                self.change_operand(jump_not_truthy_pos, after_consequence);

                match alternative {
                    None => {
                        self.emit(OpCode::Null, &[]);
                    }
                    Some(alt) => {
                        self.compile_block(alt)?;
                        if self.last_instruction_is(OpCode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                }

                let after_alternative = self.current_instructions().len();
                self.change_operand(jump_pos, after_alternative);
                Ok(())
            }
            Expr::FunctionLiteral { name, parameters, body } => {
                self.enter_scope();

                if let Some(fn_name) = name {
                    self.symbol_table.define_function_name(fn_name);
                }
                for param in parameters {
                    self.symbol_table.define(param);
                }

                self.compile_block(body)?;

                if self.last_instruction_is(OpCode::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(OpCode::ReturnValue) {
                    self.emit(OpCode::Return, &[]);
                }

                let free_symbols = self.symbol_table.free_symbols.clone();
                let num_locals = self.symbol_table.num_definitions();
                let instructions = self.leave_scope();

                for free in &free_symbols {
                    self.load_symbol(free.clone());
                }

                let compiled = CompiledFunction {
                    instructions,
                    num_locals,
                    num_parameters: parameters.len() as u8,
                };
                let index = self.add_constant(Value::CompiledFunction(Rc::new(compiled)));
                self.emit(OpCode::Closure, &[index, free_symbols.len()]);
                Ok(())
            }
            Expr::Call { function, arguments } => {
                self.compile_expr(function)?;
                for arg in arguments {
                    self.compile_expr(arg)?;
                }
                self.emit(OpCode::Call, &[arguments.len()]);
                Ok(())
            }
        }
    }

    fn load_symbol(&mut self, symbol: crate::symbol_table::Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(OpCode::GetGlobal, &[symbol.index as usize]),
            SymbolScope::Local => self.emit(OpCode::GetLocal, &[symbol.index as usize]),
            SymbolScope::Builtin => self.emit(OpCode::GetBuiltin, &[symbol.index as usize]),
            SymbolScope::Free => self.emit(OpCode::GetFree, &[symbol.index as usize]),
            SymbolScope::Function => self.emit(OpCode::CurrentClosure, &[]),
        };
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(input: &str) -> Bytecode {
        let tokens = Lexer::new(input).tokenize();
        let program = Parser::new(tokens).parse_program().expect("parse error");
        let mut compiler = Compiler::new();
        compiler.compile(&program).expect("compile error");
        compiler.bytecode()
    }

    #[test]
    fn compiles_integer_arithmetic() {
        let bc = compile("1 + 2");
        assert_eq!(bc.constants, vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(
            bc.instructions,
            [
                make(OpCode::Constant, &[0]),
                make(OpCode::Constant, &[1]),
                make(OpCode::Add, &[]),
                make(OpCode::Pop, &[]),
            ]
            .concat()
        );
    }

    #[test]
    fn less_than_is_compiled_as_flipped_greater_than() {
        let bc = compile("1 < 2");
        assert_eq!(
            bc.instructions,
            [
                make(OpCode::Constant, &[0]),
                make(OpCode::Constant, &[1]),
                make(OpCode::GreaterThan, &[]),
                make(OpCode::Pop, &[]),
            ]
            .concat()
        );
    }

    #[test]
    fn if_without_else_pushes_null_on_the_skipped_branch() {
        let bc = compile("if (true) { 10 }; 3333;");
        assert_eq!(
            bc.instructions,
            [
                make(OpCode::True, &[]),
                make(OpCode::JumpNotTruthy, &[10]),
                make(OpCode::Constant, &[0]),
                make(OpCode::Jump, &[11]),
                make(OpCode::Null, &[]),
                make(OpCode::Pop, &[]),
                make(OpCode::Constant, &[1]),
                make(OpCode::Pop, &[]),
            ]
            .concat()
        );
    }

    #[test]
    fn globals_get_sequential_indices() {
        let bc = compile("let one = 1; let two = 2;");
        assert_eq!(
            bc.instructions,
            [
                make(OpCode::Constant, &[0]),
                make(OpCode::SetGlobal, &[0]),
                make(OpCode::Constant, &[1]),
                make(OpCode::SetGlobal, &[1]),
            ]
            .concat()
        );
    }

    #[test]
    fn function_literal_compiles_to_closure_with_return_value() {
        let bc = compile("fn() { return 5 + 10; }");
        assert_eq!(bc.constants.len(), 3);
        let Value::CompiledFunction(func) = &bc.constants[2] else { panic!("expected CompiledFunction") };
        assert_eq!(
            func.instructions,
            [make(OpCode::Constant, &[0]), make(OpCode::Constant, &[1]), make(OpCode::Add, &[]), make(OpCode::ReturnValue, &[])]
                .concat()
        );
    }

    #[test]
    fn compiler_state_can_carry_across_compiles() {
        let tokens = Lexer::new("let a = 1;").tokenize();
        let program = Parser::new(tokens).parse_program().unwrap();
        let mut compiler = Compiler::new();
        compiler.compile(&program).unwrap();
        let (constants, symbols) = compiler.into_state();

        let tokens2 = Lexer::new("a + 1").tokenize();
        let program2 = Parser::new(tokens2).parse_program().unwrap();
        let mut compiler2 = Compiler::new_with_state(constants, symbols);
        compiler2.compile(&program2).unwrap();
        assert!(compiler2.bytecode().instructions.len() > 0);
    }

    #[test]
    fn free_variables_are_captured_in_declaration_order() {
        let bc = compile("fn(a) { fn(b) { a + b } }");
        let Value::CompiledFunction(outer) = bc.constants.last().unwrap() else { panic!("expected function") };
        assert!(crate::bytecode::disassemble(&outer.instructions).contains("GetFree"));
    }

    #[test]
    fn identifier_not_found_is_an_error() {
        let tokens = Lexer::new("nope").tokenize();
        let program = Parser::new(tokens).parse_program().unwrap();
        let err = Compiler::new().compile(&program).unwrap_err();
        assert!(err.contains("nope"));
    }
}
