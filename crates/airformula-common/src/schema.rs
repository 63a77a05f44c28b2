//! Structural validation of formula values against a [`Registry`].
//!
//! Two entry points share the same rules: [`validate`] checks an already
//! decoded [`Formula`], and [`validate_value`] checks raw JSON before it is
//! decoded so that malformed wire values are reported with a path instead of
//! a single decode error.

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::formula::{Call, Formula};
use crate::registry::{Registry, UNARY_OPERATORS};

/// Array notation holds at most this many items, head included.
pub const MAX_ITEMS: usize = 1024;

/// A single rule violation at `path` (`$` is the root, `$[1]` its second item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("formula value failed validation: {}", summarize(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// `Ok(())` when `issues` is empty.
    pub fn check(issues: Vec<ValidationIssue>) -> Result<(), ValidationError> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

/// Validate a decoded formula value.
pub fn validate(formula: &Formula, registry: &Registry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_formula(formula, registry, "$", &mut issues);
    issues
}

/// Validate a raw JSON wire value.
pub fn validate_value(value: &JsonValue, registry: &Registry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_value(value, registry, "$", &mut issues);
    issues
}

fn check_formula(formula: &Formula, registry: &Registry, path: &str, out: &mut Vec<ValidationIssue>) {
    match formula {
        Formula::Text(_) | Formula::Boolean(_) | Formula::Field(_) => {}
        Formula::Number(n) => {
            if !n.is_finite() {
                out.push(ValidationIssue::new(
                    path,
                    format!("number must be finite, found {n}"),
                ));
            }
        }
        Formula::Call(Call { name, args }) => {
            check_head(name, args.len(), registry, path, out);
            for (idx, arg) in args.iter().enumerate() {
                check_formula(arg, registry, &item_path(path, idx + 1), out);
            }
        }
    }
}

fn check_value(value: &JsonValue, registry: &Registry, path: &str, out: &mut Vec<ValidationIssue>) {
    match value {
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_) => {}
        JsonValue::Null => out.push(ValidationIssue::new(
            path,
            "expected a string, number, boolean, field reference or array, found null",
        )),
        JsonValue::Object(map) => {
            for key in map.keys().filter(|key| key.as_str() != "field") {
                out.push(ValidationIssue::new(
                    path,
                    format!("field reference has unexpected key `{key}`"),
                ));
            }
            match map.get("field") {
                Some(JsonValue::String(_)) => {}
                Some(other) => out.push(ValidationIssue::new(
                    format!("{path}.field"),
                    format!("field name must be a string, found {}", json_type(other)),
                )),
                None => out.push(ValidationIssue::new(
                    path,
                    "field reference must have a `field` key",
                )),
            }
        }
        JsonValue::Array(items) => {
            let Some((head, args)) = items.split_first() else {
                out.push(ValidationIssue::new(
                    path,
                    "array notation needs a function name or operator symbol",
                ));
                return;
            };
            match head {
                JsonValue::String(name) => check_head(name, args.len(), registry, path, out),
                other => out.push(ValidationIssue::new(
                    item_path(path, 0),
                    format!(
                        "expected a function name or operator symbol, found {}",
                        json_type(other)
                    ),
                )),
            }
            for (idx, arg) in args.iter().enumerate() {
                check_value(arg, registry, &item_path(path, idx + 1), out);
            }
        }
    }
}

fn check_head(
    name: &str,
    arity: usize,
    registry: &Registry,
    path: &str,
    out: &mut Vec<ValidationIssue>,
) {
    if arity + 1 > MAX_ITEMS {
        out.push(ValidationIssue::new(
            path,
            format!("array notation holds at most {MAX_ITEMS} items, found {}", arity + 1),
        ));
    }

    if registry.is_function(name) {
        return;
    }
    if registry.is_operator(name) {
        let unary = UNARY_OPERATORS.contains(&name);
        if arity < 2 && !(unary && arity == 1) {
            out.push(ValidationIssue::new(
                path,
                format!("operator `{name}` needs at least two operands, found {arity}"),
            ));
        }
        return;
    }
    out.push(ValidationIssue::new(
        item_path(path, 0),
        format!("`{name}` is neither a known function name nor an operator symbol"),
    ));
}

fn item_path(path: &str, idx: usize) -> String {
    format!("{path}[{idx}]")
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
