//! Lispy - a small s-expression / q-expression language
//!
//! This crate provides a tree-walking evaluator over symbolic expressions and quoted
//! lists, with chained environments, user-defined closures, partial application and a
//! fixed catalog of builtin primitives.
//!
//! ```text
//! (+ 1 2 3)                    ; arithmetic
//! head {1 2 3}                 ; q-expressions are inert lists
//! def {add} (\ {a b} {+ a b})  ; lambdas and global definitions
//! ((add 1) 2)                  ; partial application
//! ```
//!
//! ## Errors as values
//!
//! Evaluation never fails out-of-band. Every failure is an [`ast::Value::Error`]
//! that flows through the same containers as ordinary results and short-circuits
//! the enclosing s-expression. Only the source parser reports failures through
//! `Result`, using [`ParseError`].
//!
//! ## Modules
//!
//! - `ast`: the runtime [`Value`] model
//! - `environment`: binding frames and the frame chain used during evaluation
//! - `builtinops`: the builtin catalog
//! - `evaluator`: reduction and the call protocol
//! - `syntax`: the generic syntax tree and its conversion into values
//! - `parser`: the default source parser (feature `parser`)

use std::fmt;

/// Maximum parsing depth to prevent stack overflow while reading source text.
///
/// Evaluation itself is not depth-limited; unbounded recursion in user code
/// exhausts the native stack.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed parens or braces)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after the last complete expression
    TrailingContent,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        let context_start = error_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.len() < input.len() {
            display_context.push_str("[...]");
        }
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        let found = input.chars().nth(error_offset).map(String::from);

        Self::new(kind, message, Some(display_context), found)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ParseError: {}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, "\nFound: {found}")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Evaluation errors.
///
/// These are carried inside [`ast::Value::Error`] rather than returned through
/// `Result`; `Display` is the message shown after `Error: ` when rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unbound symbol '{0}'")]
    UnboundSymbol(String),

    #[error("Function '{function}' passed incorrect number of arguments. Got {got}, expected {expected}.")]
    ArityMismatch {
        function: String,
        got: usize,
        expected: usize,
    },

    #[error("Function '{function}' passed incorrect type for argument {index}. Got {got}, expected {expected}.")]
    TypeMismatch {
        function: String,
        index: usize,
        got: &'static str,
        expected: &'static str,
    },

    #[error("Function '{function}' passed {{}}")]
    EmptyList { function: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("invalid number '{0}'")]
    InvalidLiteral(String),

    #[error("S-Expression starts with incorrect type. Got {0}, expected Function.")]
    NotCallable(&'static str),

    #[error("Function '{function}' cannot bind non-symbol. Got {got}, expected Symbol.")]
    NonSymbolBinding {
        function: String,
        got: &'static str,
    },

    #[error("Unrecognised syntax node '{0}'")]
    UnknownSyntax(String),
}

impl Error {
    pub(crate) fn arity(function: &str, got: usize, expected: usize) -> Self {
        Error::ArityMismatch {
            function: function.to_owned(),
            got,
            expected,
        }
    }

    pub(crate) fn type_mismatch(
        function: &str,
        index: usize,
        got: &'static str,
        expected: &'static str,
    ) -> Self {
        Error::TypeMismatch {
            function: function.to_owned(),
            index,
            got,
            expected,
        }
    }

    pub(crate) fn empty_list(function: &str) -> Self {
        Error::EmptyList {
            function: function.to_owned(),
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod syntax;

#[cfg(feature = "parser")]
pub mod parser;

pub use ast::Value;
pub use environment::Environment;

/// Create a fresh root environment with no bindings.
pub fn create_environment() -> Environment {
    Environment::new()
}

/// Populate a root environment with the builtin catalog.
pub fn register_builtins(env: &mut Environment) {
    builtinops::register_builtins(env);
}

/// Reduce a value to normal form in `env`.
pub fn evaluate(env: &mut Environment, value: Value) -> Value {
    evaluator::evaluate(env, value)
}

/// Canonical text form of a value.
pub fn render(value: &Value) -> String {
    value.to_string()
}
