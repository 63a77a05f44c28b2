use super::{Reduction, is_boundary, meaningful, neighbours, relabel};
use crate::error::SyntaxError;
use crate::node::{Node, NodeKind};

/// A reference standing between boundaries is a field reference.
pub(crate) fn field_references(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let targets: Vec<usize> = order
        .iter()
        .enumerate()
        .filter(|&(k, &idx)| {
            let (prev, next) = neighbours(&nodes, &order, k);
            nodes[idx].is_reference() && is_boundary(prev) && is_boundary(next)
        })
        .map(|(_, &idx)| idx)
        .collect();

    relabel(nodes, &targets, |node| match node {
        Node::Token(token) => Ok(Node::FieldReference(token)),
        other => Err(SyntaxError::internal_at(&other, "only tokens name fields")),
    })
}

/// A bare reference right before an argument list names a function.
pub(crate) fn function_references(nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let order = meaningful(&nodes);
    let targets: Vec<usize> = order
        .iter()
        .enumerate()
        .filter(|&(k, &idx)| {
            let (prev, next) = neighbours(&nodes, &order, k);
            let node = &nodes[idx];
            node.is_reference()
                && !node.is_braced_reference()
                && is_boundary(prev)
                && next.is_some_and(|next| next.kind() == NodeKind::ArgumentList)
        })
        .map(|(_, &idx)| idx)
        .collect();

    relabel(nodes, &targets, |node| match node {
        Node::Token(token) => Ok(Node::FunctionReference(token)),
        other => Err(SyntaxError::internal_at(&other, "only tokens name functions")),
    })
}
