//! Built-in operations registry.
//!
//! Every primitive of the language is defined here once, as a [`Builtin`] carrying its
//! canonical name, its [`Arity`] and its implementation. [`register_builtins`] binds the
//! whole catalog into a root [`Environment`].
//!
//! ```text
//! (+ 1 2 3)              ; arithmetic: + - * / % ^
//! list 1 2 3             ; list construction
//! head {1 2 3}           ; list access: head tail init len
//! join {1} {2 3}         ; list combination: join cons
//! eval {+ 1 2}           ; evaluation of quoted code
//! def {x y} 1 2          ; global binding
//! = {x} 3                ; binding in the innermost frame
//! \ {a b} {+ a b}        ; lambda construction
//! ```
//!
//! ## Error Handling
//!
//! Builtins validate arity and argument types before doing any work and fail fast.
//! The argument vector is consumed either way, so nothing is left half-mutated on an
//! error path.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the [`BuiltinFn`] signature
//! 2. **Add it to `BUILTIN_OPS`** with its name and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{Builtin, BuiltinFn, Function, Lambda, NumberType, Value};
use crate::environment::Environment;
use crate::evaluator::evaluate;

/// Number of arguments accepted by a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// At least n arguments
    AtLeast(usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    pub(crate) fn validate(self, function: &str, got: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(expected) if got != expected => Err(Error::arity(function, got, expected)),
            Arity::AtLeast(expected) if got < expected => {
                Err(Error::arity(function, got, expected))
            }
            _ => Ok(()),
        }
    }
}

//
// Arithmetic
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
            ArithOp::Pow => "^",
        }
    }

    fn apply(self, x: NumberType, y: NumberType) -> Result<NumberType, Error> {
        match self {
            ArithOp::Add => Ok(x.wrapping_add(y)),
            ArithOp::Sub => Ok(x.wrapping_sub(y)),
            ArithOp::Mul => Ok(x.wrapping_mul(y)),
            ArithOp::Div if y == 0 => Err(Error::DivisionByZero),
            ArithOp::Div => Ok(x.wrapping_div(y)),
            ArithOp::Rem if y == 0 => Err(Error::DivisionByZero),
            ArithOp::Rem => Ok(x.wrapping_rem(y)),
            ArithOp::Pow => power(x, y),
        }
    }
}

/// Integer power with wrapping multiplication.
///
/// Negative exponents truncate the fractional result toward zero.
fn power(base: NumberType, exponent: NumberType) -> Result<NumberType, Error> {
    if exponent < 0 {
        return match base {
            0 => Err(Error::DivisionByZero),
            1 => Ok(1),
            -1 if exponent % 2 == 0 => Ok(1),
            -1 => Ok(-1),
            _ => Ok(0),
        };
    }

    let mut result: NumberType = 1;
    let mut base = base;
    let mut exponent = exponent.unsigned_abs();
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    Ok(result)
}

/// Left fold over numeric arguments. A lone argument to `-` is negated.
fn fold_numbers(op: ArithOp, args: Vec<Value>) -> Result<Value, Error> {
    let numbers = args
        .iter()
        .enumerate()
        .map(|(index, arg)| match arg {
            Value::Number(n) => Ok(*n),
            other => Err(Error::type_mismatch(
                op.symbol(),
                index,
                other.type_name(),
                "Number",
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let Some((&first, rest)) = numbers.split_first() else {
        return Err(Error::arity(op.symbol(), 0, 1));
    };

    if op == ArithOp::Sub && rest.is_empty() {
        return Ok(Value::Number(first.wrapping_neg()));
    }

    rest.iter()
        .try_fold(first, |acc, &n| op.apply(acc, n))
        .map(Value::Number)
}

// Macro to generate the arithmetic builtins
macro_rules! arithmetic_builtin {
    ($name:ident, $op:expr) => {
        fn $name(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
            fold_numbers($op, args)
        }
    };
}

arithmetic_builtin!(builtin_add, ArithOp::Add);
arithmetic_builtin!(builtin_sub, ArithOp::Sub);
arithmetic_builtin!(builtin_mul, ArithOp::Mul);
arithmetic_builtin!(builtin_div, ArithOp::Div);
arithmetic_builtin!(builtin_rem, ArithOp::Rem);
arithmetic_builtin!(builtin_pow, ArithOp::Pow);

//
// List operations
//

/// Unwrap a q-expression argument or report a type mismatch at `index`.
fn expect_qexpr(function: &str, index: usize, value: Value) -> Result<Vec<Value>, Error> {
    match value {
        Value::QExpr(cells) => Ok(cells),
        other => Err(Error::type_mismatch(
            function,
            index,
            other.type_name(),
            "Q-Expression",
        )),
    }
}

/// The single non-empty q-expression argument of head/tail/init/len.
fn single_list(function: &str, args: Vec<Value>) -> Result<Value, Error> {
    let [list]: [Value; 1] = args
        .try_into()
        .map_err(|args: Vec<Value>| Error::arity(function, args.len(), 1))?;

    let cells = expect_qexpr(function, 0, list)?;
    if cells.is_empty() {
        return Err(Error::empty_list(function));
    }
    Ok(Value::QExpr(cells))
}

fn builtin_list(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::QExpr(args))
}

fn builtin_head(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let mut list = single_list("head", args)?;
    while list.remove_at(1).is_some() {}
    Ok(list)
}

fn builtin_tail(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let mut list = single_list("tail", args)?;
    list.remove_at(0);
    Ok(list)
}

fn builtin_init(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let mut list = single_list("init", args)?;
    let last = list.children().map_or(0, |cells| cells.len() - 1);
    list.remove_at(last);
    Ok(list)
}

fn builtin_len(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let list = single_list("len", args)?;
    let count = NumberType::try_from(list.leaf_count()).unwrap_or(NumberType::MAX);
    Ok(Value::Number(count))
}

fn builtin_join(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let lists = args
        .into_iter()
        .enumerate()
        .map(|(index, arg)| expect_qexpr("join", index, arg))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::QExpr(lists.into_iter().flatten().collect()))
}

// The head element is restricted to numbers; see DESIGN.md.
fn builtin_cons(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let [head, tail]: [Value; 2] = args
        .try_into()
        .map_err(|args: Vec<Value>| Error::arity("cons", args.len(), 2))?;

    match (head, tail) {
        (head @ Value::Number(_), Value::QExpr(mut cells)) => {
            cells.insert(0, head);
            Ok(Value::QExpr(cells))
        }
        (Value::Number(_), other) => Err(Error::type_mismatch(
            "cons",
            1,
            other.type_name(),
            "Q-Expression",
        )),
        (other, _) => Err(Error::type_mismatch("cons", 0, other.type_name(), "Number")),
    }
}

fn builtin_eval(env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let [code]: [Value; 1] = args
        .try_into()
        .map_err(|args: Vec<Value>| Error::arity("eval", args.len(), 1))?;

    let cells = expect_qexpr("eval", 0, code)?;
    Ok(evaluate(env, Value::SExpr(cells)))
}

//
// Binding forms
//

/// Collect symbol names from a formals or binding list.
fn symbol_names(function: &str, cells: Vec<Value>) -> Result<Vec<String>, Error> {
    cells
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(Error::NonSymbolBinding {
                function: function.to_owned(),
                got: other.type_name(),
            }),
        })
        .collect()
}

fn builtin_lambda(_env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    let [formals, body]: [Value; 2] = args
        .try_into()
        .map_err(|args: Vec<Value>| Error::arity("\\", args.len(), 2))?;

    let formals = expect_qexpr("\\", 0, formals)?;
    let body = expect_qexpr("\\", 1, body)?;
    let formals = symbol_names("\\", formals)?;

    Ok(Value::Function(Function::Lambda(Lambda::new(formals, body))))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindScope {
    /// The root frame
    Global,
    /// The innermost frame
    Local,
}

fn bind(
    env: &mut Environment,
    function: &str,
    scope: BindScope,
    args: Vec<Value>,
) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let Some(names) = args.next() else {
        return Err(Error::arity(function, 0, 1));
    };

    let names = symbol_names(function, expect_qexpr(function, 0, names)?)?;
    let values: Vec<Value> = args.collect();
    if names.len() != values.len() {
        return Err(Error::arity(function, values.len(), names.len()));
    }

    for (name, value) in names.into_iter().zip(values) {
        match scope {
            BindScope::Global => {
                tracing::debug!(%name, "define global");
                env.def(name, value);
            }
            BindScope::Local => {
                tracing::trace!(%name, depth = env.depth(), "define local");
                env.put(name, value);
            }
        }
    }

    Ok(Value::SExpr(vec![]))
}

fn builtin_def(env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    bind(env, "def", BindScope::Global, args)
}

fn builtin_put(env: &mut Environment, args: Vec<Value>) -> Result<Value, Error> {
    bind(env, "=", BindScope::Local, args)
}

fn builtin_print_env(env: &mut Environment, _args: Vec<Value>) -> Result<Value, Error> {
    for (name, value) in env.bindings() {
        println!("{name}: {value}");
    }
    Ok(Value::SExpr(vec![]))
}

/// Registry of all builtin operations, in registration order.
static BUILTIN_OPS: &[Builtin] = &[
    // Arithmetic operations
    Builtin::new("+", Arity::AtLeast(1), builtin_add),
    Builtin::new("-", Arity::AtLeast(1), builtin_sub),
    Builtin::new("*", Arity::AtLeast(1), builtin_mul),
    Builtin::new("/", Arity::AtLeast(1), builtin_div),
    Builtin::new("%", Arity::AtLeast(1), builtin_rem),
    Builtin::new("^", Arity::AtLeast(1), builtin_pow),
    // List operations
    Builtin::new("list", Arity::Any, builtin_list),
    Builtin::new("head", Arity::Exact(1), builtin_head),
    Builtin::new("tail", Arity::Exact(1), builtin_tail),
    Builtin::new("init", Arity::Exact(1), builtin_init),
    Builtin::new("join", Arity::Any, builtin_join),
    Builtin::new("cons", Arity::Exact(2), builtin_cons),
    Builtin::new("len", Arity::Exact(1), builtin_len),
    Builtin::new("eval", Arity::Exact(1), builtin_eval),
    // Functions and bindings
    Builtin::new("\\", Arity::Exact(2), builtin_lambda),
    Builtin::new("def", Arity::AtLeast(1), builtin_def),
    Builtin::new("=", Arity::AtLeast(1), builtin_put),
    Builtin::new("printEnv", Arity::Any, builtin_print_env),
];

/// Get all builtin operations
pub fn builtin_ops() -> &'static [Builtin] {
    BUILTIN_OPS
}

/// Find a builtin operation by its name
pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTIN_OPS.iter().find(|op| op.name() == name)
}

/// Bind every builtin into the root frame of `env`
pub fn register_builtins(env: &mut Environment) {
    for op in BUILTIN_OPS {
        env.def(op.name(), Value::Function(Function::Builtin(*op)));
    }
    tracing::debug!(count = BUILTIN_OPS.len(), "registered builtins");
}

/// Convenience for embedders registering a single extra primitive with any arity
pub fn builtin(name: &'static str, func: BuiltinFn) -> Builtin {
    Builtin::new(name, Arity::Any, func)
}
