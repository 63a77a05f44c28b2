//! Typed nodes produced by the reduction passes.
//!
//! Each keeps the group it was folded from, spaces included, and records the
//! positions of its meaningful parts inside `group.members`. Constructors
//! check the shape they are given and fail with a [`SyntaxError`] instead of
//! building a node that breaks its invariant.

use crate::error::SyntaxError;
use crate::node::{Group, Node, NodeKind, meaningful_indices};

fn shape_error(kind: NodeKind, group: &Group, message: impl Into<String>) -> SyntaxError {
    SyntaxError::internal(kind, group.start, message)
}

fn ensure_expression(node: &Node, message: impl FnOnce(&Node) -> String) -> Result<(), SyntaxError> {
    if node.is_expression() {
        Ok(())
    } else {
        Err(SyntaxError::at(node, message(node)))
    }
}

/// A prefix operator applied to one operand, e.g. `-x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub group: Group,
    operator: usize,
    operand: usize,
}

impl Modifier {
    pub(crate) fn new(members: Vec<Node>) -> Result<Self, SyntaxError> {
        let group = Group::new(members);
        let parts = meaningful_indices(&group.members);
        let &[operator, operand] = parts.as_slice() else {
            return Err(shape_error(
                NodeKind::Modifier,
                &group,
                "a modifier holds one operator and one operand",
            ));
        };
        let op = &group.members[operator];
        if !op.is_unary_operator() {
            return Err(SyntaxError::at(
                op,
                format!("`{}` cannot be used as a prefix operator", op.value()),
            ));
        }
        ensure_expression(&group.members[operand], |found| {
            format!("Expected an expression after `{}`, but got {} instead", op.value(), found.kind())
        })?;
        Ok(Modifier {
            group,
            operator,
            operand,
        })
    }

    pub fn operator(&self) -> &Node {
        &self.group.members[self.operator]
    }

    pub fn operand(&self) -> &Node {
        &self.group.members[self.operand]
    }

    pub(crate) fn without_spaces(self) -> Self {
        let (group, remap) = self.group.without_spaces();
        Modifier {
            group,
            operator: remap[self.operator],
            operand: remap[self.operand],
        }
    }
}

/// `left operator right`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub group: Group,
    left: usize,
    operator: usize,
    right: usize,
}

impl Operation {
    pub(crate) fn new(members: Vec<Node>) -> Result<Self, SyntaxError> {
        let group = Group::new(members);
        let parts = meaningful_indices(&group.members);
        let &[left, operator, right] = parts.as_slice() else {
            return Err(shape_error(
                NodeKind::Operation,
                &group,
                "an operation holds two operands around one operator",
            ));
        };
        let op = &group.members[operator];
        if !op.is_operator() {
            return Err(SyntaxError::at(
                op,
                format!("Expected an operator, but got {} instead", op.kind()),
            ));
        }
        ensure_expression(&group.members[left], |found| {
            format!(
                "Expected an expression to the left of `{}`, but got {} instead",
                op.value(),
                found.kind()
            )
        })?;
        ensure_expression(&group.members[right], |found| {
            format!(
                "Expected an expression to the right of `{}`, but got {} instead",
                op.value(),
                found.kind()
            )
        })?;
        Ok(Operation {
            group,
            left,
            operator,
            right,
        })
    }

    pub fn symbol(&self) -> &str {
        self.operator().value()
    }

    pub fn operator(&self) -> &Node {
        &self.group.members[self.operator]
    }

    pub fn left(&self) -> &Node {
        &self.group.members[self.left]
    }

    pub fn right(&self) -> &Node {
        &self.group.members[self.right]
    }

    pub(crate) fn without_spaces(self) -> Self {
        let (group, remap) = self.group.without_spaces();
        Operation {
            group,
            left: remap[self.left],
            operator: remap[self.operator],
            right: remap[self.right],
        }
    }
}

/// Expressions separated by commas, `a, b, c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedExpressionList {
    pub group: Group,
    expressions: Vec<usize>,
    separators: Vec<usize>,
}

impl DelimitedExpressionList {
    /// Fold `members`, which run from a left operand to a right operand. A
    /// list on the left is extended rather than nested.
    pub(crate) fn new(members: Vec<Node>) -> Result<Self, SyntaxError> {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            match member {
                Node::DelimitedExpressionList(list) if flat.is_empty() => {
                    flat.extend(list.group.members)
                }
                other => flat.push(other),
            }
        }
        let group = Group::new(flat);

        let mut expressions = Vec::new();
        let mut separators = Vec::new();
        for (nth, idx) in meaningful_indices(&group.members).into_iter().enumerate() {
            let member = &group.members[idx];
            if nth % 2 == 1 {
                if !member.is_separator() {
                    return Err(SyntaxError::at(
                        member,
                        format!("Expected a separator, but got {} instead", member.kind()),
                    ));
                }
                separators.push(idx);
            } else {
                ensure_expression(member, |found| {
                    format!("Expected an expression, but got {} instead", found.kind())
                })?;
                expressions.push(idx);
            }
        }
        if separators.is_empty() || expressions.len() != separators.len() + 1 {
            return Err(shape_error(
                NodeKind::DelimitedExpressionList,
                &group,
                "a delimited list alternates expressions and separators",
            ));
        }
        Ok(DelimitedExpressionList {
            group,
            expressions,
            separators,
        })
    }

    pub fn expressions(&self) -> impl Iterator<Item = &Node> + '_ {
        self.expressions.iter().map(|&idx| &self.group.members[idx])
    }

    pub fn separators(&self) -> impl Iterator<Item = &Node> + '_ {
        self.separators.iter().map(|&idx| &self.group.members[idx])
    }

    pub(crate) fn without_spaces(self) -> Self {
        let (group, remap) = self.group.without_spaces();
        DelimitedExpressionList {
            group,
            expressions: self.expressions.iter().map(|&idx| remap[idx]).collect(),
            separators: self.separators.iter().map(|&idx| remap[idx]).collect(),
        }
    }
}

/// The parenthesized arguments of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    pub group: Group,
}

impl ArgumentList {
    /// Accepts an empty interior, one expression, or one delimited list.
    pub(crate) fn new(group: Group) -> Result<Self, SyntaxError> {
        if group.enclosure.is_none() {
            return Err(shape_error(
                NodeKind::ArgumentList,
                &group,
                "an argument list must be parenthesized",
            ));
        }
        {
            let mut interior = group.meaningful();
            if let Some(first) = interior.next() {
                if !(first.is_expression() || first.kind() == NodeKind::DelimitedExpressionList) {
                    return Err(SyntaxError::at(
                        first,
                        format!("Expected an argument, but got {} instead", first.kind()),
                    ));
                }
                if let Some(extra) = interior.next() {
                    return Err(SyntaxError::at(
                        extra,
                        format!("Unexpected {} after the last argument", extra.kind()),
                    ));
                }
            }
        }
        Ok(ArgumentList { group })
    }

    pub fn args(&self) -> Vec<&Node> {
        match self.group.meaningful().next() {
            Some(Node::DelimitedExpressionList(list)) => list.expressions().collect(),
            Some(expression) => vec![expression],
            None => Vec::new(),
        }
    }

    pub(crate) fn without_spaces(self) -> Self {
        ArgumentList {
            group: self.group.without_spaces().0,
        }
    }
}

/// `name(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub group: Group,
    reference: usize,
    argument_list: usize,
}

impl FunctionCall {
    pub(crate) fn new(members: Vec<Node>) -> Result<Self, SyntaxError> {
        let group = Group::new(members);
        let parts = meaningful_indices(&group.members);
        match parts.as_slice() {
            &[reference, argument_list]
                if group.members[reference].kind() == NodeKind::FunctionReference
                    && group.members[argument_list].kind() == NodeKind::ArgumentList =>
            {
                Ok(FunctionCall {
                    group,
                    reference,
                    argument_list,
                })
            }
            _ => Err(shape_error(
                NodeKind::FunctionCall,
                &group,
                "a function call holds a function reference and its argument list",
            )),
        }
    }

    pub fn name(&self) -> &str {
        self.reference().value()
    }

    pub fn reference(&self) -> &Node {
        &self.group.members[self.reference]
    }

    pub fn argument_list(&self) -> &Node {
        &self.group.members[self.argument_list]
    }

    pub fn args(&self) -> Vec<&Node> {
        match self.argument_list() {
            Node::ArgumentList(list) => list.args(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn without_spaces(self) -> Self {
        let (group, remap) = self.group.without_spaces();
        FunctionCall {
            group,
            reference: remap[self.reference],
            argument_list: remap[self.argument_list],
        }
    }
}

/// A parenthesized expression kept to preserve the original grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosedExpression {
    pub group: Group,
    expression: usize,
}

impl EnclosedExpression {
    pub(crate) fn new(group: Group) -> Result<Self, SyntaxError> {
        let parts = meaningful_indices(&group.members);
        match parts.as_slice() {
            &[expression]
                if group.enclosure.is_some() && group.members[expression].is_expression() =>
            {
                Ok(EnclosedExpression { group, expression })
            }
            _ => Err(SyntaxError::new(
                NodeKind::EnclosedExpression,
                group.start,
                "Invalid enclosed expression",
            )),
        }
    }

    pub fn expression(&self) -> &Node {
        &self.group.members[self.expression]
    }

    pub(crate) fn without_spaces(self) -> Self {
        let (group, remap) = self.group.without_spaces();
        EnclosedExpression {
            group,
            expression: remap[self.expression],
        }
    }
}
