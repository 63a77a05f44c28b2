mod parser;
mod tokenizer;

use crate::node::Node;
use crate::{FormulaOptions, ParseOptions, SyntaxError};

pub(crate) fn tree(text: &str) -> Node {
    crate::parse_tree(text, ParseOptions::default())
        .unwrap_or_else(|err| panic!("failed to parse {text:?}: {err}"))
        .unwrap_or_else(|| panic!("no expression in {text:?}"))
}

pub(crate) fn syntax_error(text: &str) -> SyntaxError {
    match crate::parse_tree(text, ParseOptions::default()) {
        Err(crate::ParseError::Syntax(err)) => err,
        other => panic!("expected a syntax error for {text:?}, got {other:?}"),
    }
}

pub(crate) fn formula(text: &str) -> airformula_common::Formula {
    crate::parse_formula(text, FormulaOptions { validate: true })
        .unwrap_or_else(|err| panic!("failed to parse {text:?}: {err}"))
        .unwrap_or_else(|| panic!("no expression in {text:?}"))
}
