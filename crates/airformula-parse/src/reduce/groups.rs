use super::{Reduction, fold, fold_all, meaningful, neighbours, relabel};
use crate::error::SyntaxError;
use crate::expression::{ArgumentList, DelimitedExpressionList, EnclosedExpression, FunctionCall};
use crate::node::{Node, NodeKind};

fn follows_reference(prev: Option<&Node>) -> bool {
    prev.is_some_and(|prev| prev.is_reference() || prev.kind() == NodeKind::FunctionReference)
}

fn describe(node: Option<&Node>) -> &'static str {
    node.map_or("nothing", |node| node.kind().as_str())
}

/// Parenthesized groups that can only be argument lists: those after a
/// reference, empty ones, and ones holding a comma-separated list.
pub(crate) fn argument_lists(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let mut targets = Vec::new();
    for (k, &idx) in order.iter().enumerate() {
        let Node::Group(group) = &nodes[idx] else {
            continue;
        };
        if group.enclosure.is_none() {
            continue;
        }
        let (prev, _) = neighbours(&nodes, &order, k);
        let preceded = follows_reference(prev);
        let empty = group.meaningful().next().is_none();
        let listed = group.meaningful().any(|member| {
            member.is_separator() || member.kind() == NodeKind::DelimitedExpressionList
        });
        if !(preceded || empty || listed) {
            continue;
        }
        if !preceded {
            return Err(SyntaxError::at(
                &nodes[idx],
                format!(
                    "Expected an argument list to be preceded by a reference, but got {} instead",
                    describe(prev)
                ),
            ));
        }
        targets.push(idx);
    }

    relabel(nodes, &targets, |node| match node {
        Node::Group(group) => ArgumentList::new(group).map(Node::ArgumentList),
        other => Err(SyntaxError::internal_at(&other, "only groups hold arguments")),
    })
}

/// A parenthesized group around exactly one expression, not after a
/// reference.
pub(crate) fn enclosed_expressions(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let mut targets = Vec::new();
    for (k, &idx) in order.iter().enumerate() {
        let Node::Group(group) = &nodes[idx] else {
            continue;
        };
        let (prev, _) = neighbours(&nodes, &order, k);
        if group.enclosure.is_none() || follows_reference(prev) {
            continue;
        }
        let expressions = group.meaningful().filter(|m| m.is_expression()).count();
        if expressions != 1 {
            continue;
        }
        if group.meaningful().count() != 1 {
            return Err(SyntaxError::new(
                NodeKind::EnclosedExpression,
                group.start,
                "Invalid enclosed expression",
            ));
        }
        targets.push(idx);
    }

    relabel(nodes, &targets, |node| match node {
        Node::Group(group) => EnclosedExpression::new(group).map(Node::EnclosedExpression),
        other => Err(SyntaxError::internal_at(&other, "only groups enclose expressions")),
    })
}

/// A function reference and the argument list after it.
pub(crate) fn function_calls(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let ranges = order
        .iter()
        .enumerate()
        .filter_map(|(k, &idx)| {
            let (_, next) = neighbours(&nodes, &order, k);
            let applies = nodes[idx].kind() == NodeKind::FunctionReference
                && next.is_some_and(|next| next.kind() == NodeKind::ArgumentList);
            applies.then(|| idx..=order[k + 1])
        })
        .collect();

    fold_all(nodes, ranges, |members| {
        FunctionCall::new(members).map(Node::FunctionCall)
    })
}

/// Fold the leftmost separator with the operands around it into a delimited
/// expression list, extending a list already on its left.
pub(crate) fn delimited_lists(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let Some(k) = order.iter().position(|&idx| nodes[idx].is_separator()) else {
        return Ok(Reduction::unchanged(nodes));
    };
    let separator = &nodes[order[k]];
    let (prev, next) = neighbours(&nodes, &order, k);
    let (Some(left), Some(right)) = (prev, next) else {
        return Err(SyntaxError::at(
            separator,
            "expected an expression to the left and right of separator to exist",
        ));
    };
    if !(left.is_expression() || left.kind() == NodeKind::DelimitedExpressionList) {
        return Err(SyntaxError::at(
            separator,
            format!(
                "expected an expression to the left of separator, but got {}",
                left.kind()
            ),
        ));
    }
    if !right.is_expression() {
        return Err(SyntaxError::at(
            separator,
            format!(
                "expected an expression to the right of separator, but got {}",
                right.kind()
            ),
        ));
    }

    let range = order[k - 1]..=order[k + 1];
    let nodes = fold(nodes, range, |members| {
        DelimitedExpressionList::new(members).map(Node::DelimitedExpressionList)
    })?;
    Ok(Reduction::changed(nodes))
}
