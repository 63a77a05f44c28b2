//! Parsing as repeated tree rewriting.
//!
//! Every pass is a pure function from an owned member sequence to a new one,
//! reporting whether it rewrote anything. [`Pipeline`] drives the passes of
//! one nesting level to a fixpoint under an iteration bound, after first
//! reducing every parenthesized group below that level.

mod groups;
mod operators;
mod references;

use std::ops::RangeInclusive;

use crate::error::SyntaxError;
use crate::node::{Group, Node, NodeKind};

pub(crate) use crate::node::meaningful_indices as meaningful;

/// Output of one pass.
pub(crate) struct Reduction {
    pub nodes: Vec<Node>,
    pub changed: bool,
}

impl Reduction {
    pub fn changed(nodes: Vec<Node>) -> Self {
        Reduction {
            nodes,
            changed: true,
        }
    }

    pub fn unchanged(nodes: Vec<Node>) -> Self {
        Reduction {
            nodes,
            changed: false,
        }
    }
}

pub(crate) type Pass = fn(Vec<Node>) -> Result<Reduction, SyntaxError>;

/// Passes of one level, in the order they assume of each other.
const LEVEL_PASSES: &[(&str, Pass)] = &[
    ("field_references", references::field_references),
    ("function_references", references::function_references),
    ("modifiers", operators::modifiers),
    ("operations", operators::operations),
    ("argument_lists", groups::argument_lists),
    ("enclosed_expressions", groups::enclosed_expressions),
    ("function_calls", groups::function_calls),
];

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Pipeline {
    max_iterations: Option<usize>,
}

impl Pipeline {
    pub fn new(max_iterations: Option<usize>) -> Self {
        Pipeline { max_iterations }
    }

    /// Reduce `nodes` bottom-up: the members of every parenthesized group
    /// first, then the sequence itself.
    pub fn reduce(&self, nodes: Vec<Node>) -> Result<Vec<Node>, SyntaxError> {
        let nodes = nodes
            .into_iter()
            .map(|node| match node {
                Node::Group(group) if group.enclosure.is_some() => {
                    self.reduce_group(group).map(Node::Group)
                }
                other => Ok(other),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.reduce_level(nodes)
    }

    fn reduce_group(&self, mut group: Group) -> Result<Group, SyntaxError> {
        let members = std::mem::take(&mut group.members);
        let members = self.reduce(members)?;
        Ok(group.rebuild(members))
    }

    fn reduce_level(&self, nodes: Vec<Node>) -> Result<Vec<Node>, SyntaxError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("reduce_level", len = nodes.len()).entered();

        let nodes = self.until_stable(nodes, apply_level_passes)?;
        self.until_stable(nodes, groups::delimited_lists)
    }

    /// At least one pass always runs, so a sequence with nothing to rewrite
    /// settles under any bound.
    fn iteration_limit(&self, len: usize) -> usize {
        self.max_iterations.unwrap_or(2 * len + 16).max(1)
    }

    /// Re-apply `pass` until it stops rewriting.
    fn until_stable(&self, mut nodes: Vec<Node>, pass: Pass) -> Result<Vec<Node>, SyntaxError> {
        let limit = self.iteration_limit(nodes.len());
        for _iteration in 0..limit {
            let reduction = pass(nodes)?;
            #[cfg(feature = "tracing")]
            tracing::trace!(
                iteration = _iteration,
                len = reduction.nodes.len(),
                changed = reduction.changed,
                "reduction pass"
            );
            if !reduction.changed {
                return Ok(reduction.nodes);
            }
            nodes = reduction.nodes;
        }
        let (kind, position) = nodes
            .first()
            .map_or((NodeKind::Group, 0), |node| (node.kind(), node.start()));
        Err(SyntaxError::internal(
            kind,
            position,
            format!("reduction did not settle within {limit} iterations"),
        ))
    }
}

fn apply_level_passes(mut nodes: Vec<Node>) -> Result<Reduction, SyntaxError> {
    let mut changed = false;
    for (_name, pass) in LEVEL_PASSES {
        let reduction = pass(nodes)?;
        #[cfg(feature = "tracing")]
        {
            if reduction.changed {
                tracing::trace!(pass = _name, "rewrote sequence");
            }
        }
        changed |= reduction.changed;
        nodes = reduction.nodes;
    }
    Ok(Reduction { nodes, changed })
}

/// Nearest non-space neighbours of the `k`-th meaningful node.
pub(crate) fn neighbours<'a>(
    nodes: &'a [Node],
    meaningful: &[usize],
    k: usize,
) -> (Option<&'a Node>, Option<&'a Node>) {
    let prev = k
        .checked_sub(1)
        .and_then(|p| meaningful.get(p))
        .map(|&idx| &nodes[idx]);
    let next = meaningful.get(k + 1).map(|&idx| &nodes[idx]);
    (prev, next)
}

/// Nothing, an operator or a separator: a position where an operand may start
/// or end.
pub(crate) fn is_boundary(node: Option<&Node>) -> bool {
    node.is_none_or(|node| node.is_operator() || node.is_separator())
}

/// Replace `nodes[range]` with the node `build` makes from it.
pub(crate) fn fold(
    nodes: Vec<Node>,
    range: RangeInclusive<usize>,
    build: impl FnOnce(Vec<Node>) -> Result<Node, SyntaxError>,
) -> Result<Vec<Node>, SyntaxError> {
    let (start, end) = range.into_inner();
    let mut out = Vec::with_capacity(nodes.len() - (end - start));
    let mut rest = nodes.into_iter();
    out.extend(rest.by_ref().take(start));
    let folded: Vec<Node> = rest.by_ref().take(end - start + 1).collect();
    out.push(build(folded)?);
    out.extend(rest);
    Ok(out)
}

/// Fold several disjoint, ascending ranges.
pub(crate) fn fold_all(
    mut nodes: Vec<Node>,
    ranges: Vec<RangeInclusive<usize>>,
    build: impl Fn(Vec<Node>) -> Result<Node, SyntaxError>,
) -> Result<Reduction, SyntaxError> {
    if ranges.is_empty() {
        return Ok(Reduction::unchanged(nodes));
    }
    // right to left keeps earlier indices valid
    for range in ranges.into_iter().rev() {
        nodes = fold(nodes, range, &build)?;
    }
    Ok(Reduction::changed(nodes))
}

/// Rewrite the nodes at `targets` (ascending) in place of the originals.
pub(crate) fn relabel(
    nodes: Vec<Node>,
    targets: &[usize],
    rewrite: impl Fn(Node) -> Result<Node, SyntaxError>,
) -> Result<Reduction, SyntaxError> {
    if targets.is_empty() {
        return Ok(Reduction::unchanged(nodes));
    }
    let nodes = nodes
        .into_iter()
        .enumerate()
        .map(|(idx, node)| {
            if targets.binary_search(&idx).is_ok() {
                rewrite(node)
            } else {
                Ok(node)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Reduction::changed(nodes))
}
