//! Array notation back to formula text.
//!
//! An operation nested directly under another operation is always wrapped in
//! parentheses, whatever the precedence, so compiled text parses back to the
//! same grouping.

use airformula_common::{
    FALSE_FUNCTION, Formula, Registry, TRUE_FUNCTION, ValidationError, validate, validate_value,
};
use serde_json::Value as JsonValue;

use crate::error::CompileError;

/// Compile with the default Airtable registry.
pub fn compile(formula: &Formula) -> Result<String, CompileError> {
    compile_with(formula, Registry::airtable())
}

pub fn compile_with(formula: &Formula, registry: &Registry) -> Result<String, CompileError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("compile").entered();

    ValidationError::check(validate(formula, registry))?;
    let mut out = String::new();
    Compiler { registry }.write(formula, false, &mut out)?;
    Ok(out)
}

/// Validate and compile a raw JSON wire value.
pub fn compile_json(value: &JsonValue, registry: &Registry) -> Result<String, CompileError> {
    ValidationError::check(validate_value(value, registry))?;
    let formula: Formula = serde_json::from_value(value.clone())?;
    compile_with(&formula, registry)
}

struct Compiler<'r> {
    registry: &'r Registry,
}

impl Compiler<'_> {
    fn write(
        &self,
        formula: &Formula,
        under_operation: bool,
        out: &mut String,
    ) -> Result<(), CompileError> {
        match formula {
            Formula::Text(text) => write_string(text, out),
            Formula::Number(n) => out.push_str(&n.to_string()),
            Formula::Boolean(b) => {
                out.push_str(if *b { TRUE_FUNCTION } else { FALSE_FUNCTION });
                out.push_str("()");
            }
            Formula::Field(field) => {
                if field.field.contains(['{', '}']) {
                    return Err(CompileError::InvalidFieldName(field.field.clone()));
                }
                out.push('{');
                out.push_str(&field.field);
                out.push('}');
            }
            Formula::Call(call) if self.registry.is_function(&call.name) => {
                out.push_str(&call.name);
                out.push('(');
                for (idx, arg) in call.args.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    self.write(arg, false, out)?;
                }
                out.push(')');
            }
            Formula::Call(call) => {
                if under_operation {
                    out.push('(');
                }
                if let [operand] = call.args.as_slice() {
                    out.push_str(&call.name);
                    self.write(operand, true, out)?;
                } else {
                    for (idx, arg) in call.args.iter().enumerate() {
                        if idx > 0 {
                            out.push_str(&call.name);
                        }
                        self.write(arg, true, out)?;
                    }
                }
                if under_operation {
                    out.push(')');
                }
            }
        }
        Ok(())
    }
}

/// Double-quoted with `\` and `"` escaped.
fn write_string(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}
