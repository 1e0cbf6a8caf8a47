//! Environments for variable bindings.
//!
//! A [`Frame`] is one level of insertion-ordered bindings. An [`Environment`] is the
//! chain of frames currently in scope, kept as a stack with the root frame at the
//! bottom. Calling a saturated lambda pushes the lambda's own frame on top of the
//! caller's chain for the duration of the body and pops it afterwards, so the caller's
//! frames act as the parent without the lambda ever owning them.

use crate::Error;
use crate::ast::{Builtin, BuiltinFn, Function, Value};
use crate::builtinops::Arity;

/// A single level of bindings. Names are unique within a frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    bindings: Vec<(String, Value)>,
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            bindings: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Replace an existing binding or append a new one.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// The chain of frames visible to an evaluation, innermost last.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// A root environment with a single empty frame.
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::new()],
        }
    }

    /// Number of frames in the chain, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Look up `name` from the innermost frame outwards and return a copy.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
            .ok_or_else(|| Error::UnboundSymbol(name.to_owned()))
    }

    /// Bind `name` in the innermost frame.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.put(name, value);
        }
    }

    /// Bind `name` in the root frame, whatever the current depth.
    pub fn def(&mut self, name: impl Into<String>, value: Value) {
        if let Some(root) = self.frames.first_mut() {
            root.put(name, value);
        }
    }

    /// Stack `frame` on top of the current chain.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Remove the innermost frame. The root frame is never popped.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Register a primitive under `name` in the root frame.
    ///
    /// The argument count is checked against `arity` before `func` runs.
    ///
    /// # Example
    /// ```
    /// use lispy::ast::{Value, num, sexpr, sym};
    /// use lispy::builtinops::Arity;
    /// use lispy::{Environment, Error, create_environment, evaluate};
    ///
    /// fn answer(_env: &mut Environment, _args: Vec<Value>) -> Result<Value, Error> {
    ///     Ok(num(42))
    /// }
    ///
    /// let mut env = create_environment();
    /// env.register_builtin("answer", Arity::Exact(1), answer);
    /// let result = evaluate(&mut env, sexpr(vec![sym("answer"), num(0)]));
    /// assert_eq!(result, num(42));
    /// ```
    pub fn register_builtin(&mut self, name: &'static str, arity: Arity, func: BuiltinFn) {
        self.def(
            name,
            Value::Function(Function::Builtin(Builtin::new(name, arity, func))),
        );
    }

    /// Get all visible bindings, inner frames shadowing outer ones.
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut visible: Vec<(String, Value)> = Vec::new();

        for frame in self.frames.iter().rev() {
            for (name, value) in frame.iter() {
                if !visible.iter().any(|(seen, _)| seen == name) {
                    visible.push((name.to_owned(), value.clone()));
                }
            }
        }

        visible.sort_by(|a, b| a.0.cmp(&b.0));
        visible
    }
}
