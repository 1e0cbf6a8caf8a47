//! Generic syntax tree and its conversion into [`Value`]s.
//!
//! Any source-tree producer can feed the evaluator as long as it emits
//! [`SyntaxNode`]s tagged the way [`read`] expects:
//!
//! - a tag containing `number`: a base-10 integer literal in `contents`
//! - a tag containing `symbol`: an identifier in `contents`
//! - the root tag `>` or a tag containing `sexpr`: an s-expression
//! - a tag containing `qexpr`: a q-expression
//!
//! Bracket punctuation and `regex` anchor nodes inside containers are skipped.

use crate::Error;
use crate::ast::{NumberType, Value};

/// Tag of the root node of a whole program
pub const ROOT_TAG: &str = ">";

/// A node of a parsed source tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyntaxNode {
    pub tag: String,
    /// Literal text of leaves; empty for containers
    pub contents: String,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(tag: impl Into<String>, contents: impl Into<String>) -> Self {
        SyntaxNode {
            tag: tag.into(),
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(tag: impl Into<String>, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode {
            tag: tag.into(),
            contents: String::new(),
            children,
        }
    }

    fn is_ignored(&self) -> bool {
        matches!(self.contents.as_str(), "(" | ")" | "{" | "}") || self.tag == "regex"
    }
}

/// Convert a syntax tree into a value.
///
/// Malformed literals and unknown tags become [`Value::Error`]s in place, so a
/// single bad leaf does not discard the rest of the tree.
pub fn read(node: &SyntaxNode) -> Value {
    if node.tag.contains("number") {
        return read_number(&node.contents);
    }
    if node.tag.contains("symbol") {
        return Value::Symbol(node.contents.clone());
    }

    let cells = || -> Vec<Value> {
        node.children
            .iter()
            .filter(|child| !child.is_ignored())
            .map(read)
            .collect()
    };

    if node.tag == ROOT_TAG || node.tag.contains("sexpr") {
        Value::SExpr(cells())
    } else if node.tag.contains("qexpr") {
        Value::QExpr(cells())
    } else {
        Value::Error(Error::UnknownSyntax(node.tag.clone()))
    }
}

fn read_number(text: &str) -> Value {
    text.parse::<NumberType>()
        .map_or_else(|_| Value::Error(Error::InvalidLiteral(text.to_owned())), Value::Number)
}
