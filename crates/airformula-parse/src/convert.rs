//! Finalized expression trees to array notation.

use airformula_common::{FALSE_FUNCTION, Formula, TRUE_FUNCTION};

use crate::error::SyntaxError;
use crate::expression::{FunctionCall, Modifier, Operation};
use crate::node::{Node, NodeKind, Token};

/// Convert an expression node to its [`Formula`] value.
pub fn to_formula(node: &Node) -> Result<Formula, SyntaxError> {
    match node {
        Node::Token(token) => literal(node, token),
        Node::FieldReference(token) => Ok(Formula::field(token.value.clone())),
        Node::Modifier(modifier) => negate(node, modifier),
        Node::Operation(operation) => flatten(operation),
        Node::FunctionCall(call) => call_value(call),
        Node::EnclosedExpression(enclosed) => to_formula(enclosed.expression()),
        _ => Err(SyntaxError::internal_at(
            node,
            format!("cannot convert a {} node to a formula value", node.kind()),
        )),
    }
}

fn literal(node: &Node, token: &Token) -> Result<Formula, SyntaxError> {
    match token.kind {
        NodeKind::Number => token.value.parse::<f64>().map(Formula::Number).map_err(|err| {
            SyntaxError::internal_at(node, format!("invalid number `{}`: {err}", token.value))
        }),
        NodeKind::String => {
            let quote = token
                .enclosure
                .as_ref()
                .and_then(|enclosure| enclosure.opener.value.chars().next())
                .unwrap_or('"');
            Ok(Formula::Text(unescape(&token.value, quote)))
        }
        _ => Err(SyntaxError::internal_at(
            node,
            format!("a {} token is not a literal", token.kind),
        )),
    }
}

/// Undo the quoted-string escapes: `\<quote>` and `\\`.
pub fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == quote || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Runs of prefix operators are unwound in a loop; `--1` is `1`.
fn negate(node: &Node, modifier: &Modifier) -> Result<Formula, SyntaxError> {
    let mut depth = 0;
    let mut current = (node, modifier);
    loop {
        let (at, modifier) = current;
        let symbol = modifier.operator().value();
        if symbol != "-" {
            return Err(SyntaxError::internal_at(
                at,
                format!("unsupported modifier operator `{symbol}`"),
            ));
        }
        depth += 1;
        let operand = modifier.operand();
        match operand {
            Node::Modifier(next) => current = (operand, next),
            _ => break,
        }
    }

    let mut value = to_formula(current.1.operand())?;
    for _ in 0..depth {
        value = match value {
            Formula::Number(n) => Formula::Number(-n),
            other => Formula::call("-", vec![other]),
        };
    }
    Ok(value)
}

/// Same-symbol binary children are spliced in: `a+b+c` is `[+, a, b, c]`.
///
/// Operator chains nest to the left, so the left spine is walked in a loop
/// and folded back up from the innermost operation.
fn flatten(operation: &Operation) -> Result<Formula, SyntaxError> {
    let mut spine = vec![operation];
    let mut bottom = operation.left();
    while let Node::Operation(inner) = bottom {
        spine.push(inner);
        bottom = inner.left();
    }

    let mut value = to_formula(bottom)?;
    for operation in spine.into_iter().rev() {
        let symbol = operation.symbol();
        let mut args = match value {
            Formula::Call(inner) if inner.name == symbol && inner.args.len() >= 2 => inner.args,
            other => vec![other],
        };
        match to_formula(operation.right())? {
            Formula::Call(inner) if inner.name == symbol && inner.args.len() >= 2 => {
                args.extend(inner.args)
            }
            other => args.push(other),
        }
        value = Formula::call(symbol, args);
    }
    Ok(value)
}

fn call_value(call: &FunctionCall) -> Result<Formula, SyntaxError> {
    let args = call
        .args()
        .into_iter()
        .map(to_formula)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match (call.name(), args.is_empty()) {
        (TRUE_FUNCTION, true) => Formula::Boolean(true),
        (FALSE_FUNCTION, true) => Formula::Boolean(false),
        (name, _) => Formula::call(name, args),
    })
}
