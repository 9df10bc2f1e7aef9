// Integration tests for the Monkey bytecode compiler and VM.
//
// Each test lexes, parses, compiles, and runs a complete program,
// then inspects the value left behind by the VM's last `Pop`.

use monkey::compiler::Compiler;
use monkey::lexer::Lexer;
use monkey::parser::Parser;
use monkey::value::Value;
use monkey::vm::VM;

fn run_vm(code: &str) -> Value {
    let tokens = Lexer::new(code).tokenize();
    let program = Parser::new(tokens).parse_program().expect("parse error");
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile error");
    let mut vm = VM::new(compiler.bytecode());
    vm.run().expect("vm error");
    vm.last_popped_stack_elem().clone()
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(run_vm("50 / 2 * 2 + 10 - 5"), Value::Integer(55));
}

#[test]
fn if_else_branches() {
    assert_eq!(run_vm("if (1 > 2) { 10 } else { 20 }"), Value::Integer(20));
    assert_eq!(run_vm("if (1 < 2) { 10 } else { 20 }"), Value::Integer(10));
}

#[test]
fn let_bindings_across_statements() {
    assert_eq!(run_vm("let a = 5; let b = a * 2; a + b;"), Value::Integer(15));
}

#[test]
fn string_concatenation_and_comparison() {
    assert_eq!(run_vm(r#""foo" + "bar""#), Value::new_string("foobar"));
    assert_eq!(run_vm(r#""abc" == "abc""#), Value::Boolean(true));
}

#[test]
fn higher_order_functions_and_closures() {
    let input = "
        let adder = fn(x) {
            fn(y) { x + y };
        };
        let addThree = adder(3);
        addThree(7);
    ";
    assert_eq!(run_vm(input), Value::Integer(10));
}

#[test]
fn recursive_fibonacci_via_current_closure() {
    let input = "
        let fib = fn(n) {
            if (n < 2) {
                n
            } else {
                fib(n - 1) + fib(n - 2)
            }
        };
        fib(15);
    ";
    assert_eq!(run_vm(input), Value::Integer(610));
}

#[test]
fn self_recursive_global_sees_its_own_binding() {
    // A global `let` is defined before its value is compiled, so the
    // function body can call itself through its own slot. A later
    // global is not visible yet while an earlier one's body compiles
    // (no forward declarations), so this only covers self-recursion.
    let input = "
        let countdown = fn(n) { if (n == 0) { 0 } else { countdown(n - 1) } };
        countdown(5);
    ";
    assert_eq!(run_vm(input), Value::Integer(0));
}

#[test]
fn array_and_hash_indexing_with_out_of_bounds_and_missing_keys() {
    assert_eq!(run_vm("[1, 2, 3][0]"), Value::Integer(1));
    assert_eq!(run_vm("[1, 2, 3][10]"), Value::Null);
    assert_eq!(run_vm(r#"{"name": "monkey"}["name"]"#), Value::new_string("monkey"));
    assert_eq!(run_vm(r#"{"name": "monkey"}["age"]"#), Value::Null);
}

#[test]
fn builtins_len_first_last_rest_push() {
    assert_eq!(run_vm(r#"len([1, 2, 3])"#), Value::Integer(3));
    assert_eq!(run_vm("first([1, 2, 3])"), Value::Integer(1));
    assert_eq!(run_vm("last([1, 2, 3])"), Value::Integer(3));
    assert_eq!(run_vm("rest([1, 2, 3])[0]"), Value::Integer(2));
    assert_eq!(run_vm("push([1, 2], 3)[2]"), Value::Integer(3));
}

#[test]
fn integer_division_truncates_toward_zero() {
    assert_eq!(run_vm("7 / 2"), Value::Integer(3));
    assert_eq!(run_vm("-7 / 2"), Value::Integer(-3));
}

#[test]
fn map_and_reduce_built_from_recursion_and_closures() {
    let input = r#"
        let map = fn(arr, f) {
            let iter = fn(arr, accumulated) {
                if (len(arr) == 0) {
                    accumulated
                } else {
                    iter(rest(arr), push(accumulated, f(first(arr))));
                }
            };
            iter(arr, []);
        };
        let double = fn(x) { x * 2 };
        map([1, 2, 3], double);
    "#;
    let result = run_vm(input);
    let Value::Array(elements) = result else { panic!("expected array result") };
    assert_eq!(*elements, vec![Value::Integer(2), Value::Integer(4), Value::Integer(6)]);
}

#[test]
fn reduce_built_from_recursion_and_closures() {
    let input = r#"
        let reduce = fn(arr, initial, f) {
            let iter = fn(arr, result) {
                if (len(arr) == 0) {
                    result
                } else {
                    iter(rest(arr), f(result, first(arr)));
                }
            };
            iter(arr, initial);
        };
        let sum = fn(arr) {
            reduce(arr, 0, fn(result, el) { result + el });
        };
        sum([1, 2, 3, 4, 5]);
    "#;
    assert_eq!(run_vm(input), Value::Integer(15));
}
