//! Default source parser.
//!
//! Turns program text into a [`SyntaxNode`] tree using the tag conventions of
//! an mpc-generated grammar, so the tree is interchangeable with one produced
//! by any other front end:
//!
//! ```text
//! number : /-?[0-9]+/ ;
//! symbol : /[a-zA-Z0-9_+\-*\/\\=<>!&%^]+/ ;
//! sexpr  : '(' <expr>* ')' ;
//! qexpr  : '{' <expr>* '}' ;
//! expr   : <number> | <symbol> | <sexpr> | <qexpr> ;
//! lispy  : /^/ <expr>* /$/ ;
//! ```

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0, not_line_ending},
    combinator::{cut, opt, recognize, value},
    error::ErrorKind,
    multi::many0_count,
    sequence::pair,
};

use crate::ast::Value;
use crate::syntax::{self, ROOT_TAG, SyntaxNode};
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

const NUMBER_TAG: &str = "expr|number|regex";
const SYMBOL_TAG: &str = "expr|symbol|regex";
const SEXPR_TAG: &str = "expr|sexpr|>";
const QEXPR_TAG: &str = "expr|qexpr|>";
const CHAR_TAG: &str = "char";
const ANCHOR_TAG: &str = "regex";

/// Characters allowed in symbols besides ASCII letters and digits
const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^";

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseConfig {
    /// Treat `;` up to the end of the line as whitespace
    pub handle_comments: bool,
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Skip whitespace, and comments when enabled
fn skip_ignored(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    if config.handle_comments {
        let comment = recognize(pair(char(';'), not_line_ending));
        value((), pair(multispace0, many0_count(pair(comment, multispace0)))).parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

fn parse_number(input: &str) -> IResult<&str, SyntaxNode> {
    let (input, text) = recognize(pair(opt(char('-')), digit1)).parse(input)?;
    Ok((input, SyntaxNode::leaf(NUMBER_TAG, text)))
}

fn parse_symbol(input: &str) -> IResult<&str, SyntaxNode> {
    let (input, text) = take_while1(is_symbol_char).parse(input)?;
    Ok((input, SyntaxNode::leaf(SYMBOL_TAG, text)))
}

/// Parse a bracketed sequence of expressions.
///
/// Once the opening bracket is consumed, failures are not backtracked.
fn parse_container<'a>(
    input: &'a str,
    config: ParseConfig,
    depth: usize,
    (open, close, tag): (char, char, &'static str),
) -> IResult<&'a str, SyntaxNode> {
    let (mut input, _) = char(open).parse(input)?;
    let mut children = vec![SyntaxNode::leaf(CHAR_TAG, open)];

    loop {
        let (rest, ()) = skip_ignored(input, config)?;

        let (rest, closed) = opt(char(close)).parse(rest)?;
        if closed.is_some() {
            children.push(SyntaxNode::leaf(CHAR_TAG, close));
            return Ok((rest, SyntaxNode::branch(tag, children)));
        }

        if rest.is_empty() {
            return Err(nom::Err::Failure(nom::error::Error::new(rest, ErrorKind::Eof)));
        }

        let (rest, child) = cut(|input| parse_expr(input, config, depth + 1)).parse(rest)?;
        children.push(child);
        input = rest;
    }
}

fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, SyntaxNode> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }

    alt((
        |input| parse_container(input, config, depth, ('(', ')', SEXPR_TAG)),
        |input| parse_container(input, config, depth, ('{', '}', QEXPR_TAG)),
        parse_number,
        parse_symbol,
    ))
    .parse(input)
}

/// Convert nom parsing errors to a [`ParseError`] pointing into `input`
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let byte_offset = input.len().saturating_sub(e.input.len());
            let offset = input[..byte_offset].chars().count();

            let (kind, message) = match e.code {
                ErrorKind::TooLarge => (
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                ErrorKind::Eof => (
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input".to_owned(),
                ),
                _ => {
                    let near: String = e.input.chars().take(10).collect();
                    (
                        ParseErrorKind::InvalidSyntax,
                        format!("Invalid syntax near '{near}' at position {offset}"),
                    )
                }
            };
            ParseError::with_context(kind, message, input, offset)
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// Parse a whole program with default options
pub fn parse(input: &str) -> Result<SyntaxNode, ParseError> {
    parse_with_config(input, ParseConfig::default())
}

/// Parse a whole program into a tree rooted at a `>` node.
///
/// The root holds zero or more expressions between two `regex` anchors.
pub fn parse_with_config(input: &str, config: ParseConfig) -> Result<SyntaxNode, ParseError> {
    let mut children = vec![SyntaxNode::leaf(ANCHOR_TAG, "")];
    let mut rest = input;

    loop {
        let (after, ()) = skip_ignored(rest, config).map_err(|e| to_parse_error(input, e))?;
        if after.is_empty() {
            break;
        }

        if let Some(stray) = after.chars().next().filter(|&c| matches!(c, ')' | '}')) {
            let offset = input[..input.len() - after.len()].chars().count();
            return Err(ParseError::with_context(
                ParseErrorKind::TrailingContent,
                format!("Unexpected '{stray}' with no matching opening bracket"),
                input,
                offset,
            ));
        }

        let (after, node) = parse_expr(after, config, 0).map_err(|e| to_parse_error(input, e))?;
        children.push(node);
        rest = after;
    }

    children.push(SyntaxNode::leaf(ANCHOR_TAG, ""));
    tracing::trace!(expressions = children.len() - 2, "parsed program");
    Ok(SyntaxNode::branch(ROOT_TAG, children))
}

/// Parse a program and read it into a single s-expression value
pub fn read_str(input: &str) -> Result<Value, ParseError> {
    parse(input).map(|tree| syntax::read(&tree))
}

/// Like [`read_str`], with explicit parser options
pub fn read_str_with_config(input: &str, config: ParseConfig) -> Result<Value, ParseError> {
    parse_with_config(input, config).map(|tree| syntax::read(&tree))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::Error;
    use crate::ast::{num, qexpr, sexpr, sym};
    use pretty_assertions::assert_eq;

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value),        // Parsing should succeed and read as this value
        Fails(ParseErrorKind), // Parsing should fail with this kind
    }
    use ParseTestResult::*;

    fn program(cells: Vec<Value>) -> ParseTestResult {
        Success(sexpr(cells))
    }

    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("Parse test #{} ({input:?})", i + 1);

            match (read_str(input), expected) {
                (Ok(actual), Success(expected)) => assert_eq!(actual, expected, "{test_id}"),
                (Err(err), Fails(kind)) => assert_eq!(err.kind, kind, "{test_id}: {err}"),
                (Ok(actual), Fails(kind)) => {
                    panic!("{test_id}: expected {kind:?}, got {actual:?}")
                }
                (Err(err), Success(expected)) => {
                    panic!("{test_id}: expected {expected:?}, got error {err}")
                }
            }
        }
    }

    #[test]
    fn test_parse_data_driven() {
        let test_cases = vec![
            // === ATOMS ===
            ("", program(vec![])),
            ("   \n\t ", program(vec![])),
            ("42", program(vec![num(42)])),
            ("-17", program(vec![num(-17)])),
            ("-", program(vec![sym("-")])),
            ("+1", program(vec![sym("+1")])),
            ("printEnv", program(vec![sym("printEnv")])),
            ("\\", program(vec![sym("\\")])),
            ("a_b<=>!&%^", program(vec![sym("a_b<=>!&%^")])),
            // A number prefix splits from the following symbol characters
            ("12ab", program(vec![num(12), sym("ab")])),
            // === CONTAINERS ===
            ("()", program(vec![sexpr(vec![])])),
            ("{}", program(vec![qexpr(vec![])])),
            ("+ 1 2", program(vec![sym("+"), num(1), num(2)])),
            (
                "(+ 1 (* 2 3))",
                program(vec![sexpr(vec![
                    sym("+"),
                    num(1),
                    sexpr(vec![sym("*"), num(2), num(3)]),
                ])]),
            ),
            (
                "head {1 {2} ()}",
                program(vec![
                    sym("head"),
                    qexpr(vec![num(1), qexpr(vec![num(2)]), sexpr(vec![])]),
                ]),
            ),
            ("(1)(2)", program(vec![sexpr(vec![num(1)]), sexpr(vec![num(2)])])),
            ("{ 1\n 2 }", program(vec![qexpr(vec![num(1), num(2)])])),
            // === ERRORS ===
            ("(+ 1", Fails(ParseErrorKind::Incomplete)),
            ("{1 {2}", Fails(ParseErrorKind::Incomplete)),
            ("(", Fails(ParseErrorKind::Incomplete)),
            (")", Fails(ParseErrorKind::TrailingContent)),
            ("(+ 1 2))", Fails(ParseErrorKind::TrailingContent)),
            ("(+ 1 #)", Fails(ParseErrorKind::InvalidSyntax)),
            ("(+ 1 })", Fails(ParseErrorKind::InvalidSyntax)),
            ("\"str\"", Fails(ParseErrorKind::InvalidSyntax)),
            ("; comments are off by default", Fails(ParseErrorKind::InvalidSyntax)),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_tree_uses_mpc_tags() {
        let tree = parse("(+ 1 {x})").unwrap();

        let expected = SyntaxNode::branch(
            ROOT_TAG,
            vec![
                SyntaxNode::leaf("regex", ""),
                SyntaxNode::branch(
                    "expr|sexpr|>",
                    vec![
                        SyntaxNode::leaf("char", "("),
                        SyntaxNode::leaf("expr|symbol|regex", "+"),
                        SyntaxNode::leaf("expr|number|regex", "1"),
                        SyntaxNode::branch(
                            "expr|qexpr|>",
                            vec![
                                SyntaxNode::leaf("char", "{"),
                                SyntaxNode::leaf("expr|symbol|regex", "x"),
                                SyntaxNode::leaf("char", "}"),
                            ],
                        ),
                        SyntaxNode::leaf("char", ")"),
                    ],
                ),
                SyntaxNode::leaf("regex", ""),
            ],
        );

        assert_eq!(tree, expected);
    }

    #[test]
    fn test_overflowing_literal_reads_as_error() {
        assert_eq!(
            read_str("99999999999999999999").unwrap(),
            sexpr(vec![Value::Error(Error::InvalidLiteral(
                "99999999999999999999".into()
            ))])
        );
    }

    #[test]
    fn test_comments() {
        let config = ParseConfig {
            handle_comments: true,
        };

        let source = "; a comment\n(+ 1 ; inline\n 2) ; trailing";
        assert_eq!(
            read_str_with_config(source, config).unwrap(),
            sexpr(vec![sexpr(vec![sym("+"), num(1), num(2)])])
        );
        assert_eq!(read_str_with_config(";", config).unwrap(), sexpr(vec![]));
    }

    #[test]
    fn test_depth_limit() {
        let within = format!("{}{}", "(".repeat(MAX_PARSE_DEPTH), ")".repeat(MAX_PARSE_DEPTH));
        assert!(parse(&within).is_ok());

        let beyond = format!(
            "{}{}",
            "(".repeat(MAX_PARSE_DEPTH + 1),
            ")".repeat(MAX_PARSE_DEPTH + 1)
        );
        assert_eq!(parse(&beyond).unwrap_err().kind, ParseErrorKind::TooDeeplyNested);
    }

    #[test]
    fn test_error_context() {
        let err = parse("(+ 1 #)").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("#"));
        assert!(err.message.contains("position 5"), "{}", err.message);

        let err = parse("(head {1 2})}").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("}"));
    }
}
