use std::fmt;

use airformula_common::ValidationError;
use smallvec::SmallVec;

use crate::node::NodeKind;
use crate::tokenizer::{Context, Pattern};

/// Failure while splitting formula text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error(
        "unexpected character {found:?} at position {position} in {context}, expected {}",
        describe_patterns(.expected)
    )]
    UnexpectedCharacter {
        position: usize,
        found: char,
        context: Context,
        expected: SmallVec<[Pattern; 8]>,
    },
    #[error("Unexpected closing token `{token}` at position {position}")]
    UnexpectedClosing { token: String, position: usize },
    #[error("Unclosed {context}, with `{opener}` at position {position}")]
    Unclosed {
        context: Context,
        opener: String,
        position: usize,
    },
    #[error("Nesting deeper than {limit} levels at position {position}")]
    TooDeep { position: usize, limit: usize },
}

fn describe_patterns(patterns: &[Pattern]) -> String {
    patterns
        .iter()
        .map(|pattern| pattern.describe())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TokenizeError {
    pub fn position(&self) -> usize {
        match self {
            TokenizeError::UnexpectedCharacter { position, .. }
            | TokenizeError::UnexpectedClosing { position, .. }
            | TokenizeError::Unclosed { position, .. }
            | TokenizeError::TooDeep { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input is malformed.
    Syntax,
    /// The reducer reached a state it should never reach.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// A malformed node found while reducing the token tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} error while parsing {node} node at position {position}: {message}")]
pub struct SyntaxError {
    pub category: ErrorCategory,
    pub node: NodeKind,
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(node: NodeKind, position: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            category: ErrorCategory::Syntax,
            node,
            position,
            message: message.into(),
        }
    }

    pub fn internal(node: NodeKind, position: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            category: ErrorCategory::Internal,
            ..SyntaxError::new(node, position, message)
        }
    }

    /// Syntax error located at `node`.
    pub(crate) fn at(node: &crate::node::Node, message: impl Into<String>) -> Self {
        SyntaxError::new(node.kind(), node.start(), message)
    }

    pub(crate) fn internal_at(node: &crate::node::Node, message: impl Into<String>) -> Self {
        SyntaxError::internal(node.kind(), node.start(), message)
    }

    pub fn is_internal(&self) -> bool {
        self.category == ErrorCategory::Internal
    }
}

/// Any failure of [`parse_tree`](crate::parse_tree) or
/// [`parse_formula`](crate::parse_formula).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ParseError {
    /// Byte offset of the failure, when it can be localized in the text.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Tokenize(err) => Some(err.position()),
            ParseError::Syntax(err) => Some(err.position),
            ParseError::Validation(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid field name: '{0}'")]
    InvalidFieldName(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("formula value is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
