//! Tokenizer, parser and compiler for Airtable-style formulas.
//!
//! Text is tokenized into a tree of leaves and parenthesized groups, reduced
//! by rewrite passes into a single expression [`Node`], converted to the
//! array-notation [`Formula`] value, and compiled back to text:
//!
//! ```ignore
//! use airformula_parse::{FormulaOptions, compile, parse_formula};
//!
//! let value = parse_formula("1 + NOT(2)", FormulaOptions::default())?.unwrap();
//! assert_eq!(compile(&value)?, "1+NOT(2)");
//! ```

pub mod compiler;
pub mod convert;
mod error;
pub mod expression;
pub mod node;
pub mod parser;
mod reduce;
#[cfg(test)]
mod tests;
pub mod tokenizer;

pub use compiler::{compile, compile_json, compile_with};
pub use convert::to_formula;
pub use error::{CompileError, ErrorCategory, ParseError, SyntaxError, TokenizeError};
pub use expression::{
    ArgumentList, DelimitedExpressionList, EnclosedExpression, FunctionCall, Modifier, Operation,
};
pub use node::{Enclosure, Group, Node, NodeKind, Token};
pub use parser::{FormulaOptions, ParseOptions, Parser, parse_formula, parse_tree};
pub use tokenizer::{Context, MAX_NESTING_DEPTH, Pattern, TokenTree, Tokenizer, tokenize};

// Re-export common types
pub use airformula_common::{Formula, Registry, ValidationError, ValidationIssue};
