//! Meta crate that re-exports the airformula building blocks. Downstream
//! users can depend on this crate alone and still reach the underlying
//! crates when deeper integration is required.

pub use airformula_common as common;
pub use airformula_parse as parse;

pub use airformula_common::{Formula, Registry, RegistryError, ValidationError, ValidationIssue};
pub use airformula_parse::{
    CompileError, FormulaOptions, Node, NodeKind, ParseError, ParseOptions, Parser, SyntaxError,
    TokenTree, TokenizeError, compile, compile_json, compile_with, parse_formula, parse_tree,
    tokenize,
};
