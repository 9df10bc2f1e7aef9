// File: src/builtins.rs
//
// Native functions reachable from Monkey source via `GET_BUILTIN`.
// The table is ordered; the order is load-bearing because the
// compiler binds each name to its numeric index at compile time and
// the VM indexes into this same table at run time.

use once_cell::sync::Lazy;

use crate::value::{Builtin, Value};

fn len(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        Value::Hash(map) => Ok(Value::Integer(map.len() as i64)),
        other => Err(format!("argument to `len` not supported, got {}", other.type_name())),
    }
}

fn puts(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        match arg {
            Value::Boolean(b) => println!("{}", if *b { "true" } else { "false" }),
            other => println!("{other}"),
        }
    }
    Ok(Value::Null)
}

fn first(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(elements) => Ok(elements.first().cloned().unwrap_or(Value::Null)),
        other => Err(format!("argument to `first` must be ARRAY, got {}", other.type_name())),
    }
}

fn last(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(elements) => Ok(elements.last().cloned().unwrap_or(Value::Null)),
        other => Err(format!("argument to `last` must be ARRAY, got {}", other.type_name())),
    }
}

fn rest(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::new_array(elements[1..].to_vec()))
            }
        }
        other => Err(format!("argument to `rest` must be ARRAY, got {}", other.type_name())),
    }
}

fn push(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(elements) => {
            let mut new_elements = elements.as_ref().clone();
            new_elements.push(args[1].clone());
            Ok(Value::new_array(new_elements))
        }
        other => Err(format!("argument to `push` must be ARRAY, got {}", other.type_name())),
    }
}

/// The built-ins table, in the fixed order the compiler and VM both
/// rely on: `len`, `puts`, `first`, `last`, `rest`, `push`.
pub static BUILTINS: Lazy<Vec<Builtin>> = Lazy::new(|| {
    vec![
        Builtin { name: "len", arity: Some(1), func: len },
        Builtin { name: "puts", arity: None, func: puts },
        Builtin { name: "first", arity: Some(1), func: first },
        Builtin { name: "last", arity: Some(1), func: last },
        Builtin { name: "rest", arity: Some(1), func: rest },
        Builtin { name: "push", arity: Some(2), func: push },
    ]
});

pub fn lookup_by_name(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}

pub fn get(index: usize) -> Option<&'static Builtin> {
    BUILTINS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_fixed() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["len", "puts", "first", "last", "rest", "push"]);
    }

    #[test]
    fn len_of_string_counts_chars() {
        let v = len(&[Value::new_string("hello")]).unwrap();
        assert_eq!(v, Value::Integer(5));
    }

    #[test]
    fn len_of_array_counts_elements() {
        let v = len(&[Value::new_array(vec![Value::Integer(1), Value::Integer(2)])]).unwrap();
        assert_eq!(v, Value::Integer(2));
    }

    #[test]
    fn len_of_hash_counts_pairs() {
        let mut map = crate::value::ValueMap::default();
        map.insert(crate::value::HashKey::String("a".into()), Value::Integer(1));
        map.insert(crate::value::HashKey::String("b".into()), Value::Integer(2));
        let v = len(&[Value::Hash(std::rc::Rc::new(map))]).unwrap();
        assert_eq!(v, Value::Integer(2));
    }

    #[test]
    fn len_rejects_unsupported_type() {
        let err = len(&[Value::Integer(1)]).unwrap_err();
        assert!(err.contains("not supported"));
    }

    #[test]
    fn first_and_last_of_empty_array_is_null() {
        let empty = Value::new_array(vec![]);
        assert_eq!(first(&[empty.clone()]).unwrap(), Value::Null);
        assert_eq!(last(&[empty]).unwrap(), Value::Null);
    }

    #[test]
    fn rest_of_empty_array_is_null() {
        assert_eq!(rest(&[Value::new_array(vec![])]).unwrap(), Value::Null);
    }

    #[test]
    fn rest_drops_first_element() {
        let arr = Value::new_array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let result = rest(&[arr]).unwrap();
        assert_eq!(result, Value::new_array(vec![Value::Integer(2), Value::Integer(3)]));
    }

    #[test]
    fn push_does_not_mutate_original() {
        let original = Value::new_array(vec![Value::Integer(1)]);
        let pushed = push(&[original.clone(), Value::Integer(2)]).unwrap();
        assert_eq!(original, Value::new_array(vec![Value::Integer(1)]));
        assert_eq!(pushed, Value::new_array(vec![Value::Integer(1), Value::Integer(2)]));
    }

    #[test]
    fn lookup_by_name_matches_table_order() {
        assert_eq!(lookup_by_name("len"), Some(0));
        assert_eq!(lookup_by_name("push"), Some(5));
        assert_eq!(lookup_by_name("nope"), None);
    }
}
