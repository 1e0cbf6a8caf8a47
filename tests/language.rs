//! End-to-end checks through the public API: parse, read, evaluate, render.

#![cfg(feature = "parser")]
#![expect(clippy::unwrap_used)] // test code OK

use lispy::ast::{Function, Value};
use lispy::parser::read_str;
use lispy::{Environment, Error, create_environment, evaluate, register_builtins, render};
use pretty_assertions::assert_eq;

fn global_env() -> Environment {
    let mut env = create_environment();
    register_builtins(&mut env);
    env
}

fn run(env: &mut Environment, input: &str) -> Value {
    evaluate(env, read_str(input).unwrap())
}

fn run_rendered(env: &mut Environment, input: &str) -> String {
    render(&run(env, input))
}

fn expect_error(env: &mut Environment, input: &str) -> Error {
    match run(env, input) {
        Value::Error(err) => err,
        other => panic!("'{input}' should fail, got {other}"),
    }
}

#[test]
fn arithmetic_matches_integer_semantics() {
    let mut env = global_env();
    let pairs = [(7, 3), (-7, 3), (7, -3), (0, 5), (i64::MAX, 2)];

    for (a, b) in pairs {
        let cases = [
            ("+", a.wrapping_add(b)),
            ("-", a.wrapping_sub(b)),
            ("*", a.wrapping_mul(b)),
            ("/", a.wrapping_div(b)),
            ("%", a.wrapping_rem(b)),
        ];
        for (op, expected) in cases {
            let input = format!("({op} {a} {b})");
            assert_eq!(run_rendered(&mut env, &input), expected.to_string(), "{input}");
        }
    }

    assert_eq!(run_rendered(&mut env, "(^ 3 4)"), "81");
    assert_eq!(run_rendered(&mut env, "(^ -2 3)"), "-8");
    assert_eq!(expect_error(&mut env, "(/ 10 0)"), Error::DivisionByZero);
    assert_eq!(expect_error(&mut env, "(% 10 0)"), Error::DivisionByZero);
}

#[test]
fn list_operations() {
    let mut env = global_env();
    let cases = [
        ("head {1 2 3}", "{1}"),
        ("tail {1 2 3}", "{2 3}"),
        ("init {1 2 3}", "{1 2}"),
        ("join {1 2} {3 4}", "{1 2 3 4}"),
        ("cons 1 {2 3}", "{1 2 3}"),
        ("len {1 {2 3} 4}", "4"),
        ("eval {+ 1 2}", "3"),
        ("list 1 2 3", "{1 2 3}"),
    ];
    for (input, expected) in cases {
        assert_eq!(run_rendered(&mut env, input), expected, "{input}");
    }

    for function in ["head", "tail", "init"] {
        let err = expect_error(&mut env, &format!("{function} {{}}"));
        assert_eq!(err.to_string(), format!("Function '{function}' passed {{}}"));
    }

    assert!(matches!(
        expect_error(&mut env, "cons {1} {2}"),
        Error::TypeMismatch { .. }
    ));
    assert!(matches!(
        expect_error(&mut env, "eval 1"),
        Error::TypeMismatch { .. }
    ));
}

#[test]
fn join_is_associative() {
    let mut env = global_env();
    let lists = ["{1 2}", "{}", "{3 {4}}"];
    for a in lists {
        for b in lists {
            for c in lists {
                let left = run_rendered(&mut env, &format!("join (join {a} {b}) {c}"));
                let right = run_rendered(&mut env, &format!("join {a} (join {b} {c})"));
                assert_eq!(left, right, "{a} {b} {c}");
            }
        }
    }
}

#[test]
fn rendering_round_trip() {
    let mut env = global_env();
    assert_eq!(render(&evaluate(&mut env, read_str("(+ 1 2)").unwrap())), "3");
}

#[test]
fn global_and_local_bindings() {
    let mut env = global_env();
    assert_eq!(run_rendered(&mut env, "def {x} 5"), "()");
    assert_eq!(run_rendered(&mut env, "x"), "5");

    // Visible from nested lambda frames
    run(&mut env, "def {outer} (\\ {a} {(\\ {b} {+ x b}) a})");
    assert_eq!(run_rendered(&mut env, "outer 1"), "6");

    // `=` inside a closure binds only the closure's frame
    run(&mut env, "def {shadow} (\\ {v} {eval {= {x} v}})");
    assert_eq!(run_rendered(&mut env, "shadow 6"), "()");
    assert_eq!(run_rendered(&mut env, "x"), "5");

    // At top level `=` acts like `def`
    run(&mut env, "= {x} 6");
    assert_eq!(run_rendered(&mut env, "x"), "6");
}

#[test]
fn currying() {
    let mut env = global_env();
    run(&mut env, "def {add2} (\\ {a b} {+ a b})");

    assert_eq!(run_rendered(&mut env, "((add2 1) 2)"), "3");
    assert!(matches!(
        run(&mut env, "(add2 1)"),
        Value::Function(Function::Lambda(_))
    ));
}

#[test]
fn unbound_symbols() {
    let mut env = global_env();
    assert_eq!(
        expect_error(&mut env, "nothing"),
        Error::UnboundSymbol("nothing".into())
    );
    assert_eq!(
        run_rendered(&mut env, "nothing"),
        "Error: Unbound symbol 'nothing'"
    );
}

#[test]
fn errors_propagate_out_of_nested_expressions() {
    let mut env = global_env();
    assert_eq!(expect_error(&mut env, "(+ 1 (/ 1 0))"), Error::DivisionByZero);
    assert_eq!(
        expect_error(&mut env, "head (list (/ 1 0) undefined)"),
        Error::DivisionByZero
    );
}

#[test]
fn fresh_environment_is_empty() {
    let mut env = create_environment();
    assert!(env.bindings().is_empty());
    assert_eq!(
        expect_error(&mut env, "+ 1 2"),
        Error::UnboundSymbol("+".into())
    );
}
