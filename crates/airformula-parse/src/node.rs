//! Node primitives shared by the tokenizer and the reduction passes.
//!
//! Every node carries a [`NodeKind`], a half-open `start..end` byte span and
//! the text it stands for. Enclosed nodes (quoted strings, braced references,
//! parenthesized groups) additionally keep their opener and closer tokens and
//! report the span *between* them, so `("a")` renders back exactly.

use std::fmt;

use airformula_common::UNARY_OPERATORS;

use crate::expression::{
    ArgumentList, DelimitedExpressionList, EnclosedExpression, FunctionCall, Modifier, Operation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "camelCase")
)]
pub enum NodeKind {
    Space,
    Number,
    String,
    QuoteMark,
    Operator,
    OpenParenthesis,
    CloseParenthesis,
    OpenBrace,
    CloseBrace,
    Reference,
    ArgumentSeparator,
    Group,
    FieldReference,
    FunctionReference,
    Modifier,
    Operation,
    ArgumentList,
    DelimitedExpressionList,
    FunctionCall,
    EnclosedExpression,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Space => "space",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::QuoteMark => "quoteMark",
            NodeKind::Operator => "operator",
            NodeKind::OpenParenthesis => "openParenthesis",
            NodeKind::CloseParenthesis => "closeParenthesis",
            NodeKind::OpenBrace => "openBrace",
            NodeKind::CloseBrace => "closeBrace",
            NodeKind::Reference => "reference",
            NodeKind::ArgumentSeparator => "argumentSeparator",
            NodeKind::Group => "group",
            NodeKind::FieldReference => "fieldReference",
            NodeKind::FunctionReference => "functionReference",
            NodeKind::Modifier => "modifier",
            NodeKind::Operation => "operation",
            NodeKind::ArgumentList => "argumentList",
            NodeKind::DelimitedExpressionList => "delimitedExpressionList",
            NodeKind::FunctionCall => "functionCall",
            NodeKind::EnclosedExpression => "enclosedExpression",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matched delimiters around an enclosed node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Enclosure {
    pub opener: Token,
    pub closer: Token,
}

/// A leaf of the token tree.
///
/// Quoted strings and braced references are leaves too: their `value` is the
/// raw text between the delimiters, escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    pub value: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub enclosure: Option<Box<Enclosure>>,
}

impl Token {
    pub fn new(kind: NodeKind, start: usize, end: usize, value: impl Into<String>) -> Self {
        Token {
            kind,
            start,
            end,
            value: value.into(),
            enclosure: None,
        }
    }

    pub fn enclosed(kind: NodeKind, value: impl Into<String>, opener: Token, closer: Token) -> Self {
        Token {
            kind,
            start: opener.end,
            end: closer.start,
            value: value.into(),
            enclosure: Some(Box::new(Enclosure { opener, closer })),
        }
    }

    pub fn is_enclosed(&self) -> bool {
        self.enclosure.is_some()
    }
}

/// An ordered run of member nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    pub start: usize,
    pub end: usize,
    pub value: String,
    pub members: Vec<Node>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub enclosure: Option<Box<Enclosure>>,
}

impl Group {
    /// Group spanning its first to its last member.
    pub fn new(members: Vec<Node>) -> Self {
        let start = members.first().map_or(0, Node::outer_start);
        let end = members.last().map_or(start, Node::outer_end);
        Group {
            start,
            end,
            value: gap_filled(&members),
            members,
            enclosure: None,
        }
    }

    /// Group between an opener and a closer; the span excludes both.
    pub fn wrapped(members: Vec<Node>, enclosure: Box<Enclosure>) -> Self {
        Group {
            start: enclosure.opener.end,
            end: enclosure.closer.start,
            value: gap_filled(&members),
            members,
            enclosure: Some(enclosure),
        }
    }

    /// The top-level group covering a whole formula of `len` bytes.
    pub fn root(len: usize, members: Vec<Node>) -> Self {
        Group {
            start: 0,
            end: len,
            value: gap_filled(&members),
            members,
            enclosure: None,
        }
    }

    /// Members that are not spaces.
    pub fn meaningful(&self) -> impl Iterator<Item = &Node> + '_ {
        self.members.iter().filter(|member| !member.is_space())
    }

    /// Rebuild with the same span and delimiters around new members.
    pub(crate) fn rebuild(self, members: Vec<Node>) -> Self {
        Group {
            value: gap_filled(&members),
            members,
            ..self
        }
    }

    /// Drop space members recursively. The returned table maps every old
    /// member index to its new index; the entry for a removed space points at
    /// the next kept member.
    pub(crate) fn without_spaces(self) -> (Group, Vec<usize>) {
        let Group {
            start,
            end,
            value,
            members,
            enclosure,
        } = self;
        let mut remap = Vec::with_capacity(members.len());
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            remap.push(kept.len());
            if !member.is_space() {
                kept.push(member.without_spaces());
            }
        }
        let group = Group {
            start,
            end,
            value,
            members: kept,
            enclosure,
        };
        (group, remap)
    }
}

/// Concatenate rendered members, filling the textual gap between two
/// neighbours with spaces.
pub fn gap_filled(members: &[Node]) -> String {
    let mut value = String::new();
    for (idx, member) in members.iter().enumerate() {
        member.render_into(&mut value);
        if let Some(next) = members.get(idx + 1) {
            let gap = next.outer_start().saturating_sub(member.outer_end());
            value.push_str(&" ".repeat(gap));
        }
    }
    value
}

/// Indices of the non-space members of `nodes`.
pub(crate) fn meaningful_indices(nodes: &[Node]) -> Vec<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.is_space())
        .map(|(idx, _)| idx)
        .collect()
}

/// A node of the token tree or of the reduced expression tree.
///
/// With the `serde` feature a node serializes as one map tagged by its
/// [`kind`](Node::kind). Typed nodes carry their parts by role (`left`,
/// `operand`, `arguments`, ...) in place of raw members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    /// Untyped group: the token tree's root or a parenthesized run.
    Group(Group),
    FieldReference(Token),
    FunctionReference(Token),
    Modifier(Modifier),
    Operation(Operation),
    ArgumentList(ArgumentList),
    DelimitedExpressionList(DelimitedExpressionList),
    FunctionCall(FunctionCall),
    EnclosedExpression(EnclosedExpression),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Token(token) => token.kind,
            Node::Group(_) => NodeKind::Group,
            Node::FieldReference(_) => NodeKind::FieldReference,
            Node::FunctionReference(_) => NodeKind::FunctionReference,
            Node::Modifier(_) => NodeKind::Modifier,
            Node::Operation(_) => NodeKind::Operation,
            Node::ArgumentList(_) => NodeKind::ArgumentList,
            Node::DelimitedExpressionList(_) => NodeKind::DelimitedExpressionList,
            Node::FunctionCall(_) => NodeKind::FunctionCall,
            Node::EnclosedExpression(_) => NodeKind::EnclosedExpression,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) | Node::FieldReference(token) | Node::FunctionReference(token) => {
                Some(token)
            }
            _ => None,
        }
    }

    pub fn group(&self) -> Option<&Group> {
        match self {
            Node::Token(_) | Node::FieldReference(_) | Node::FunctionReference(_) => None,
            Node::Group(group) => Some(group),
            Node::Modifier(node) => Some(&node.group),
            Node::Operation(node) => Some(&node.group),
            Node::ArgumentList(node) => Some(&node.group),
            Node::DelimitedExpressionList(node) => Some(&node.group),
            Node::FunctionCall(node) => Some(&node.group),
            Node::EnclosedExpression(node) => Some(&node.group),
        }
    }

    pub fn start(&self) -> usize {
        match (self.token(), self.group()) {
            (Some(token), _) => token.start,
            (_, Some(group)) => group.start,
            _ => 0,
        }
    }

    pub fn end(&self) -> usize {
        match (self.token(), self.group()) {
            (Some(token), _) => token.end,
            (_, Some(group)) => group.end,
            _ => 0,
        }
    }

    pub fn value(&self) -> &str {
        match (self.token(), self.group()) {
            (Some(token), _) => &token.value,
            (_, Some(group)) => &group.value,
            _ => "",
        }
    }

    pub fn enclosure(&self) -> Option<&Enclosure> {
        match (self.token(), self.group()) {
            (Some(token), _) => token.enclosure.as_deref(),
            (_, Some(group)) => group.enclosure.as_deref(),
            _ => None,
        }
    }

    /// Child nodes; empty for leaves.
    pub fn members(&self) -> &[Node] {
        match self.group() {
            Some(group) => &group.members,
            None => &[],
        }
    }

    /// Start including the opener, if any.
    pub fn outer_start(&self) -> usize {
        self.enclosure()
            .map_or_else(|| self.start(), |enclosure| enclosure.opener.start)
    }

    /// End including the closer, if any.
    pub fn outer_end(&self) -> usize {
        self.enclosure()
            .map_or_else(|| self.end(), |enclosure| enclosure.closer.end)
    }

    /// The text this node stands for, delimiters included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self.enclosure() {
            Some(enclosure) => {
                out.push_str(&enclosure.opener.value);
                out.push_str(self.value());
                out.push_str(&enclosure.closer.value);
            }
            None => out.push_str(self.value()),
        }
    }

    pub fn is_space(&self) -> bool {
        self.kind() == NodeKind::Space
    }

    pub fn is_operator(&self) -> bool {
        self.kind() == NodeKind::Operator
    }

    pub fn is_unary_operator(&self) -> bool {
        self.is_operator() && UNARY_OPERATORS.contains(&self.value())
    }

    pub fn is_separator(&self) -> bool {
        self.kind() == NodeKind::ArgumentSeparator
    }

    /// A not yet classified reference, bare or braced.
    pub fn is_reference(&self) -> bool {
        self.kind() == NodeKind::Reference
    }

    pub fn is_braced_reference(&self) -> bool {
        matches!(self, Node::Token(token) if token.kind == NodeKind::Reference && token.is_enclosed())
    }

    /// An untyped parenthesized group.
    pub fn is_parenthesized_group(&self) -> bool {
        matches!(self, Node::Group(group) if group.enclosure.is_some())
    }

    /// Whether this node may stand as an operand.
    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Number
                | NodeKind::String
                | NodeKind::FieldReference
                | NodeKind::Modifier
                | NodeKind::Operation
                | NodeKind::FunctionCall
                | NodeKind::EnclosedExpression
        )
    }

    /// Remove every space node from this subtree.
    pub fn without_spaces(self) -> Node {
        match self {
            Node::Token(_) | Node::FieldReference(_) | Node::FunctionReference(_) => self,
            Node::Group(group) => Node::Group(group.without_spaces().0),
            Node::Modifier(node) => Node::Modifier(node.without_spaces()),
            Node::Operation(node) => Node::Operation(node.without_spaces()),
            Node::ArgumentList(node) => Node::ArgumentList(node.without_spaces()),
            Node::DelimitedExpressionList(node) => {
                Node::DelimitedExpressionList(node.without_spaces())
            }
            Node::FunctionCall(node) => Node::FunctionCall(node.without_spaces()),
            Node::EnclosedExpression(node) => Node::EnclosedExpression(node.without_spaces()),
        }
    }

    /// Depth-first walk over this node and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Node {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", &self.kind())?;
        map.serialize_entry("start", &self.start())?;
        map.serialize_entry("end", &self.end())?;
        map.serialize_entry("value", self.value())?;
        if let Some(enclosure) = self.enclosure() {
            map.serialize_entry("enclosure", enclosure)?;
        }
        match self {
            Node::Token(_) | Node::FieldReference(_) | Node::FunctionReference(_) => {}
            Node::Group(group) => map.serialize_entry("members", &group.members)?,
            Node::Modifier(node) => {
                map.serialize_entry("operator", node.operator())?;
                map.serialize_entry("operand", node.operand())?;
            }
            Node::Operation(node) => {
                map.serialize_entry("left", node.left())?;
                map.serialize_entry("operator", node.operator())?;
                map.serialize_entry("right", node.right())?;
            }
            Node::ArgumentList(node) => map.serialize_entry("arguments", &node.args())?,
            Node::DelimitedExpressionList(node) => {
                map.serialize_entry("expressions", &node.expressions().collect::<Vec<_>>())?;
                map.serialize_entry("separators", &node.separators().collect::<Vec<_>>())?;
            }
            Node::FunctionCall(node) => {
                map.serialize_entry("reference", node.reference())?;
                map.serialize_entry("argumentList", node.argument_list())?;
            }
            Node::EnclosedExpression(node) => {
                map.serialize_entry("expression", node.expression())?;
            }
        }
        map.end()
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.members().iter().rev());
        Some(node)
    }
}
