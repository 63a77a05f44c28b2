//! The closed sets of function names and operator symbols a formula may use.
//!
//! A [`Registry`] is validated once when it is built, so the tokenizer and
//! the validator can rely on its contents without re-checking them per call.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Operators that may prefix an expression as a modifier.
pub const UNARY_OPERATORS: &[&str] = &["-"];

/// Zero-argument functions that stand for boolean literals.
pub const TRUE_FUNCTION: &str = "TRUE";
pub const FALSE_FUNCTION: &str = "FALSE";

static AIRTABLE_FUNCTIONS: &[&str] = &[
    // logical
    "AND",
    "BLANK",
    "ERROR",
    "FALSE",
    "IF",
    "ISERROR",
    "NOT",
    "OR",
    "SWITCH",
    "TRUE",
    "XOR",
    // numeric
    "ABS",
    "AVERAGE",
    "CEILING",
    "COUNT",
    "COUNTA",
    "COUNTALL",
    "EVEN",
    "EXP",
    "FLOOR",
    "INT",
    "LOG",
    "MAX",
    "MIN",
    "MOD",
    "ODD",
    "POWER",
    "ROUND",
    "ROUNDDOWN",
    "ROUNDUP",
    "SQRT",
    "SUM",
    "VALUE",
    // text
    "CONCATENATE",
    "ENCODE_URL_COMPONENT",
    "FIND",
    "LEFT",
    "LEN",
    "LOWER",
    "MID",
    "REPLACE",
    "REPT",
    "RIGHT",
    "SEARCH",
    "SUBSTITUTE",
    "T",
    "TRIM",
    "UPPER",
    // regex
    "REGEX_EXTRACT",
    "REGEX_MATCH",
    "REGEX_REPLACE",
    // date and time
    "CREATED_TIME",
    "DATEADD",
    "DATESTR",
    "DATETIME_DIFF",
    "DATETIME_FORMAT",
    "DATETIME_PARSE",
    "DAY",
    "FROMNOW",
    "HOUR",
    "IS_AFTER",
    "IS_BEFORE",
    "IS_SAME",
    "LAST_MODIFIED_TIME",
    "MINUTE",
    "MONTH",
    "NOW",
    "SECOND",
    "SET_LOCALE",
    "SET_TIMEZONE",
    "TIMESTR",
    "TODAY",
    "TONOW",
    "WEEKDAY",
    "WEEKNUM",
    "WORKDAY",
    "WORKDAY_DIFF",
    "YEAR",
    // arrays
    "ARRAYCOMPACT",
    "ARRAYFLATTEN",
    "ARRAYJOIN",
    "ARRAYSLICE",
    "ARRAYUNIQUE",
    // records
    "RECORD_ID",
];

static AIRTABLE_OPERATORS: &[&str] = &["*", "+", "-", "/", "&", "=", "!=", "<", ">", "<=", ">="];

static AIRTABLE: Lazy<Registry> = Lazy::new(|| Registry {
    function_names: AIRTABLE_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
    operator_symbols: AIRTABLE_OPERATORS.iter().map(|s| s.to_string()).collect(),
    longest_first: longest_first(AIRTABLE_OPERATORS.iter().map(|s| s.to_string())),
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("operator symbols cannot be empty")]
    EmptyOperator,
    #[error("operator symbol `{0}` contains characters reserved for other tokens")]
    InvalidOperatorSymbol(String),
    #[error("function name `{0}` is not a valid bare reference")]
    InvalidFunctionName(String),
    #[error("registry is malformed: {0}")]
    Malformed(String),
}

/// Injected configuration: which function names and operator symbols exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRegistry")]
pub struct Registry {
    function_names: BTreeSet<String>,
    operator_symbols: BTreeSet<String>,
    #[serde(skip)]
    longest_first: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRegistry {
    function_names: Vec<String>,
    operator_symbols: Vec<String>,
}

impl TryFrom<RawRegistry> for Registry {
    type Error = RegistryError;

    fn try_from(raw: RawRegistry) -> Result<Self, Self::Error> {
        Registry::new(raw.function_names, raw.operator_symbols)
    }
}

fn longest_first(symbols: impl Iterator<Item = String>) -> Vec<String> {
    let mut symbols: Vec<String> = symbols.collect();
    symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    symbols
}

/// `[A-Za-z][A-Za-z0-9_]*`, the shape of a bare reference.
pub fn is_bare_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_operator_char(c: char) -> bool {
    !(c.is_whitespace()
        || c.is_alphanumeric()
        || matches!(c, '_' | '"' | '\'' | '(' | ')' | '{' | '}' | ',' | '\\' | '.'))
}

impl Registry {
    pub fn new<F, O>(functions: F, operators: O) -> Result<Self, RegistryError>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let function_names: BTreeSet<String> = functions.into_iter().map(Into::into).collect();
        let operator_symbols: BTreeSet<String> = operators.into_iter().map(Into::into).collect();

        if let Some(bad) = function_names.iter().find(|name| !is_bare_name(name)) {
            return Err(RegistryError::InvalidFunctionName(bad.clone()));
        }
        for symbol in &operator_symbols {
            if symbol.is_empty() {
                return Err(RegistryError::EmptyOperator);
            }
            if !symbol.chars().all(is_operator_char) {
                return Err(RegistryError::InvalidOperatorSymbol(symbol.clone()));
            }
        }
        // the character rules above keep the two sets disjoint
        let longest_first = longest_first(operator_symbols.iter().cloned());
        Ok(Registry {
            function_names,
            operator_symbols,
            longest_first,
        })
    }

    /// The Airtable function and operator set.
    pub fn airtable() -> &'static Registry {
        &AIRTABLE
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(json).map_err(|err| RegistryError::Malformed(err.to_string()))
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.function_names.contains(name)
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        self.operator_symbols.contains(symbol)
    }

    pub fn is_unary_operator(&self, symbol: &str) -> bool {
        self.is_operator(symbol) && UNARY_OPERATORS.contains(&symbol)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.function_names.iter().map(String::as_str)
    }

    pub fn operator_symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.operator_symbols.iter().map(String::as_str)
    }

    /// Longest registered operator symbol that `rest` starts with.
    pub fn match_operator(&self, rest: &str) -> Option<&str> {
        self.longest_first
            .iter()
            .find(|symbol| rest.starts_with(symbol.as_str()))
            .map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::airtable().clone()
    }
}
