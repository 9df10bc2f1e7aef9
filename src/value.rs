// File: src/value.rs
//
// Runtime value model for the Monkey bytecode pipeline.
// A single tagged union covers every value the compiler can emit as
// a constant and every value the VM can push onto its operand stack.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::rc::Rc;

use ahash::AHasher;

use crate::bytecode::Instructions;

/// Hasher used for `Value::Hash`'s backing map. Keys are restricted to
/// `Integer`, `Boolean`, and `String` at construction time (see
/// `HashKey::from_value`), so only those three variants need a `Hash`
/// impl.
pub type ValueMap = HashMap<HashKey, Value, BuildHasherDefault<AHasher>>;

/// A compiled, not-yet-closed-over function: its instruction stream
/// plus the slot counts the VM needs to set up a call frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: u16,
    pub num_parameters: u8,
}

/// A native function bound into the `GET_BUILTIN` slot table. `func`
/// is a plain function pointer since built-ins close over nothing.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    /// `Some(n)` requires exactly `n` arguments; `None` means variadic
    /// (only `puts` is variadic).
    pub arity: Option<usize>,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A compiled function plus the free values it captured at the
/// `CLOSURE` site that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// The runtime value tagged union described by the data model.
///
/// `ReturnValue` and `Error` only ever arise in the tree-walking
/// evaluator, which this crate does not implement; the VM never
/// constructs either and callers should treat their presence as
/// unreachable. They are kept as variants so `Value` remains the
/// complete model the data model describes, carrying not-yet-exercised
/// variants (see `bytecode::OpCode`) rather than narrowing the type to
/// only what's wired up today.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Hash(Rc<ValueMap>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
    #[allow(dead_code)]
    ReturnValue(Box<Value>),
    #[allow(dead_code)]
    Error(String),
}

impl Value {
    /// Truthy = not NULL and not FALSE. Every other value, including
    /// integer zero and the empty string, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION_OBJ",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
        }
    }

    pub fn new_string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn new_array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(elements))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{el}")?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, val)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key.as_value(), val)?;
                }
                write!(f, "}}")
            }
            Value::CompiledFunction(_) => write!(f, "CompiledFunction[...]"),
            Value::Closure(_) => write!(f, "Closure[...]"),
            Value::Builtin(b) => write!(f, "builtin function {}", b.name),
            Value::ReturnValue(v) => write!(f, "{v}"),
            Value::Error(msg) => write!(f, "ERROR: {msg}"),
        }
    }
}

/// The restricted subset of `Value` that may appear as a `Hash` key.
/// Only these three variants have well-defined structural equality
/// and hashing, matching the data model's hashable-variant list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Result<HashKey, String> {
        match value {
            Value::Integer(n) => Ok(HashKey::Integer(*n)),
            Value::Boolean(b) => Ok(HashKey::Boolean(*b)),
            Value::String(s) => Ok(HashKey::String(s.clone())),
            other => Err(format!("unusable as hash key: {}", other.type_name())),
        }
    }

    pub fn as_value(&self) -> Value {
        match self {
            HashKey::Integer(n) => Value::Integer(*n),
            HashKey::Boolean(b) => Value::Boolean(*b),
            HashKey::String(s) => Value::String(s.clone()),
        }
    }
}
