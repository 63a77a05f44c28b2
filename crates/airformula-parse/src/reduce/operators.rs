use std::cmp::Reverse;

use super::{Reduction, fold, fold_all, is_boundary, meaningful, neighbours};
use crate::error::SyntaxError;
use crate::expression::{Modifier, Operation};
use crate::node::{Node, NodeKind};

/// Fold order of a binary operator: higher folds first.
pub(crate) fn precedence(symbol: &str) -> u8 {
    match symbol {
        "&" => 5,
        "*" | "/" => 4,
        "+" | "-" => 3,
        "<" | "<=" | ">" | ">=" => 2,
        "=" | "!=" => 1,
        _ => 0,
    }
}

/// Nodes that later passes may still turn into operands.
fn is_pending(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Reference | NodeKind::FunctionReference | NodeKind::Group | NodeKind::ArgumentList
    )
}

/// `-x` where the `-` does not follow an operand.
pub(crate) fn modifiers(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let ranges = order
        .iter()
        .enumerate()
        .filter_map(|(k, &idx)| {
            let (prev, next) = neighbours(&nodes, &order, k);
            let applies = nodes[idx].is_unary_operator()
                && is_boundary(prev)
                && next.is_some_and(Node::is_expression);
            applies.then(|| idx..=order[k + 1])
        })
        .collect();

    fold_all(nodes, ranges, |members| Modifier::new(members).map(Node::Modifier))
}

/// Fold the tightest-binding well-formed `left op right` triple, leftmost
/// first among equals. Waits while any operand is still unresolved so that a
/// call or group cannot be split across operators.
pub(crate) fn operations(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    if order.iter().any(|&idx| is_pending(&nodes[idx])) {
        return Ok(Reduction::unchanged(nodes));
    }

    let mut candidates: Vec<usize> = (0..order.len())
        .filter(|&k| nodes[order[k]].is_operator())
        .collect();
    candidates.sort_by_key(|&k| (Reverse(precedence(nodes[order[k]].value())), k));

    let triple = candidates.into_iter().find_map(|k| {
        let (prev, next) = neighbours(&nodes, &order, k);
        let well_formed =
            prev.is_some_and(Node::is_expression) && next.is_some_and(Node::is_expression);
        well_formed.then(|| order[k - 1]..=order[k + 1])
    });

    match triple {
        Some(range) => {
            let nodes = fold(nodes, range, |members| {
                Operation::new(members).map(Node::Operation)
            })?;
            Ok(Reduction::changed(nodes))
        }
        None => Ok(Reduction::unchanged(nodes)),
    }
}
