//! This module defines the runtime [`Value`] model shared by the reader, the evaluator
//! and the builtin catalog. Values are a closed set of variants: numbers, first-class
//! errors, symbols, s-expressions, q-expressions and functions. Functions are either
//! named builtins or user lambdas that own a private [`Frame`] of bound arguments.
//!
//! Values own their children outright. Cloning is a deep structural copy (a lambda's
//! frame included), and dropping a value releases everything it owns, so no value
//! ever aliases storage held by an environment or another container.
//!
//! Ergonomic helpers ([`num`], [`sym`], [`sexpr`], [`qexpr`]) are provided for building
//! values in code and tests.

use crate::Error;
use crate::builtinops::Arity;
use crate::environment::{Environment, Frame};

/// Type alias for number values in the interpreter
pub type NumberType = i64;

/// Signature shared by every builtin primitive.
///
/// Arguments arrive already evaluated, in call order. An `Err` becomes a
/// [`Value::Error`] at the call boundary.
pub type BuiltinFn = fn(&mut Environment, Vec<Value>) -> Result<Value, Error>;

/// Core value type of the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numbers (signed 64-bit integers, wrapping arithmetic)
    Number(NumberType),
    /// First-class errors, propagated instead of evaluated
    Error(Error),
    /// Identifiers, resolved through the environment
    Symbol(String),
    /// Expressions evaluated by function application
    SExpr(Vec<Value>),
    /// Quoted, evaluation-inert lists
    QExpr(Vec<Value>),
    /// Builtins and user lambdas
    Function(Function),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    Lambda(Lambda),
}

/// A named primitive. The name is fixed at registration time and used for display.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    func: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, arity: Arity, func: BuiltinFn) -> Self {
        Builtin { name, arity, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Validate the argument count, then run the primitive.
    pub(crate) fn call(&self, env: &mut Environment, args: Vec<Value>) -> Value {
        let result = self
            .arity
            .validate(self.name, args.len())
            .and_then(|()| (self.func)(env, args));

        match result {
            Ok(value) => value,
            Err(error) => Value::Error(error),
        }
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        // Compare builtins by name, not function pointer
        self.name == other.name
    }
}

/// A user-defined function created by `\`.
///
/// `formals` holds the parameters still waiting for an argument; formals bound by
/// partial application have moved into `env`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub(crate) formals: Vec<String>,
    pub(crate) body: Vec<Value>,
    pub(crate) env: Frame,
}

impl Lambda {
    pub fn new(formals: Vec<String>, body: Vec<Value>) -> Self {
        Lambda {
            formals,
            body,
            env: Frame::new(),
        }
    }

    pub fn formals(&self) -> &[String] {
        &self.formals
    }

    pub fn body(&self) -> &[Value] {
        &self.body
    }

    /// Arguments already bound by partial application.
    pub fn bound(&self) -> &Frame {
        &self.env
    }
}

impl Value {
    /// Human-readable variant name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Children of an s-expression or q-expression
    pub fn children(&self) -> Option<&[Value]> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    /// Append one child to an s-expression or q-expression.
    ///
    /// Returns the container for chaining; other values are returned unchanged.
    pub fn append(mut self, item: Value) -> Value {
        if let Value::SExpr(cells) | Value::QExpr(cells) = &mut self {
            cells.push(item);
        }
        self
    }

    /// Remove the child at `index`, shifting later children left.
    ///
    /// Returns `None` for non-containers and out-of-range indexes.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) if index < cells.len() => {
                Some(cells.remove(index))
            }
            _ => None,
        }
    }

    /// Number of leaf values, counting through nested expressions
    pub fn leaf_count(&self) -> usize {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => cells.iter().map(Value::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl From<Error> for Value {
    fn from(error: Error) -> Self {
        Value::Error(error)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

/// Helper function for creating numbers
pub fn num<T: Into<Value>>(n: T) -> Value {
    n.into()
}

/// Helper function for creating symbols; accepts both &str and String
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating s-expressions
pub fn sexpr(cells: Vec<Value>) -> Value {
    Value::SExpr(cells)
}

/// Helper function for creating q-expressions
pub fn qexpr(cells: Vec<Value>) -> Value {
    Value::QExpr(cells)
}

fn write_cells(
    f: &mut std::fmt::Formatter<'_>,
    cells: &[Value],
    open: char,
    close: char,
) -> std::fmt::Result {
    write!(f, "{open}")?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{cell}")?;
    }
    write!(f, "{close}")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Error(e) => write!(f, "Error: {e}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::SExpr(cells) => write_cells(f, cells, '(', ')'),
            Value::QExpr(cells) => write_cells(f, cells, '{', '}'),
            Value::Function(function) => write!(f, "{function}"),
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Builtin(builtin) => write!(f, "{}", builtin.name),
            Function::Lambda(lambda) => {
                write!(f, "(\\ {{")?;
                for (i, formal) in lambda.formals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{formal}")?;
                }
                write!(f, "}} ")?;
                write_cells(f, &lambda.body, '{', '}')?;
                write!(f, ")")
            }
        }
    }
}
