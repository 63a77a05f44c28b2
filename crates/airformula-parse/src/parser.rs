use airformula_common::{Formula, Registry, ValidationError, validate};

use crate::convert::to_formula;
use crate::error::{ParseError, SyntaxError, TokenizeError};
use crate::node::Node;
use crate::reduce::Pipeline;
use crate::tokenizer::{TokenTree, Tokenizer};

/// Options for [`parse_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Strip every space node from the returned tree.
    pub remove_space: bool,
    /// Bound on the iterations of each fixpoint loop. `None` scales the bound
    /// with the length of the sequence being reduced.
    pub max_iterations: Option<usize>,
}

/// Options for [`parse_formula`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormulaOptions {
    /// Check the result against the registry before returning it.
    pub validate: bool,
}

/// A parser bound to a registry and a set of options.
///
/// ```ignore
/// let registry = Registry::airtable();
/// let tree = Parser::new(registry).remove_space(true).parse_tree("1 + 2")?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r Registry,
    options: ParseOptions,
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Parser::new(Registry::airtable())
    }
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Parser {
            registry,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn remove_space(mut self, remove_space: bool) -> Self {
        self.options.remove_space = remove_space;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.options.max_iterations = Some(max_iterations);
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn tokenize(&self, text: &str) -> Result<TokenTree, TokenizeError> {
        Tokenizer::new(text, self.registry).tokenize()
    }

    /// Parse `text` into a single expression node, or `None` when the text
    /// holds nothing but spaces.
    pub fn parse_tree(&self, text: &str) -> Result<Option<Node>, ParseError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("parse_tree", len = text.len()).entered();

        let root = self.tokenize(text)?;
        let nodes = Pipeline::new(self.options.max_iterations).reduce(root.members)?;

        let mut meaningful = nodes.into_iter().filter(|node| !node.is_space());
        let Some(expression) = meaningful.next() else {
            return Ok(None);
        };
        if let Some(extra) = meaningful.next() {
            return Err(SyntaxError::at(&extra, format!("Unexpected node {}", extra.kind())).into());
        }
        if !expression.is_expression() {
            return Err(SyntaxError::at(
                &expression,
                format!("Expected to find an expression, got {} instead", expression.kind()),
            )
            .into());
        }

        Ok(Some(if self.options.remove_space {
            expression.without_spaces()
        } else {
            expression
        }))
    }

    /// Parse `text` into its array-notation value.
    pub fn parse_formula(
        &self,
        text: &str,
        options: FormulaOptions,
    ) -> Result<Option<Formula>, ParseError> {
        let Some(tree) = self.parse_tree(text)? else {
            return Ok(None);
        };
        let formula = to_formula(&tree)?;
        if options.validate {
            ValidationError::check(validate(&formula, self.registry))?;
        }
        Ok(Some(formula))
    }
}

/// [`Parser::parse_tree`] with the default Airtable registry.
pub fn parse_tree(text: &str, options: ParseOptions) -> Result<Option<Node>, ParseError> {
    Parser::default().with_options(options).parse_tree(text)
}

/// [`Parser::parse_formula`] with the default Airtable registry.
pub fn parse_formula(text: &str, options: FormulaOptions) -> Result<Option<Formula>, ParseError> {
    Parser::default().parse_formula(text, options)
}
