// File: src/frame.rs
//
// A single call frame on the VM's frame stack: the closure being
// executed, its instruction pointer, and the base pointer into the
// operand stack where its locals begin.

use std::rc::Rc;

use crate::bytecode::Instructions;
use crate::value::Closure;

#[derive(Debug, Clone)]
pub struct Frame {
    pub closure: Rc<Closure>,
    /// Index of the next instruction to execute, pre-incremented
    /// before the opcode at that index is dispatched.
    pub ip: i64,
    /// Operand-stack index below this frame's locals and arguments.
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame { closure, ip: -1, base_pointer }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}
