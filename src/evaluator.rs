//! Reduction of values to normal form and the call protocol.
//!
//! Numbers, errors, functions and q-expressions evaluate to themselves. Symbols are
//! looked up in the [`Environment`]. An s-expression evaluates every child left to
//! right and then applies its head to the remaining children.

use crate::Error;
use crate::ast::{Function, Lambda, Value};
use crate::environment::Environment;

/// Evaluate a value in `env`
pub fn evaluate(env: &mut Environment, value: Value) -> Value {
    match value {
        Value::Symbol(name) => env.get(&name).unwrap_or_else(Value::Error),
        Value::SExpr(cells) => evaluate_sexpr(env, cells),
        // Self-evaluating forms
        Value::Number(_) | Value::Error(_) | Value::QExpr(_) | Value::Function(_) => value,
    }
}

fn evaluate_sexpr(env: &mut Environment, cells: Vec<Value>) -> Value {
    let mut cells: Vec<Value> = cells.into_iter().map(|cell| evaluate(env, cell)).collect();

    // Every child is evaluated before the first error is reported
    if let Some(index) = cells.iter().position(Value::is_error) {
        return cells.swap_remove(index);
    }

    match cells.len() {
        0 => Value::SExpr(cells),
        1 => cells.swap_remove(0),
        _ => {
            let head = cells.remove(0);
            match head {
                Value::Function(function) => call(env, function, cells),
                other => Value::Error(Error::NotCallable(other.type_name())),
            }
        }
    }
}

/// Apply a function to already evaluated arguments
pub fn call(env: &mut Environment, function: Function, args: Vec<Value>) -> Value {
    match function {
        Function::Builtin(builtin) => {
            tracing::trace!(name = builtin.name(), argc = args.len(), "call builtin");
            builtin.call(env, args)
        }
        Function::Lambda(lambda) => apply_lambda(env, lambda, args),
    }
}

/// Bind arguments to formals in order.
///
/// A lambda left with unbound formals is returned as-is (partial application).
/// Once every formal is bound, its frame is stacked on top of the caller's chain
/// while the body runs.
fn apply_lambda(env: &mut Environment, mut lambda: Lambda, args: Vec<Value>) -> Value {
    let given = args.len();
    let total = lambda.formals.len();
    if given > total {
        return Value::Error(Error::arity("\\", given, total));
    }

    for (formal, arg) in lambda.formals.drain(..given).zip(args) {
        lambda.env.put(formal, arg);
    }

    if !lambda.formals.is_empty() {
        tracing::trace!(remaining = lambda.formals.len(), "partial application");
        return Value::Function(Function::Lambda(lambda));
    }

    tracing::trace!(depth = env.depth(), "call lambda");
    let Lambda { body, env: frame, .. } = lambda;
    env.push_frame(frame);
    let result = evaluate(env, Value::SExpr(body));
    env.pop_frame();
    result
}
