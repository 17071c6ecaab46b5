//! Argument extraction shared by the unit functions

use unitkit_core::{UnitError, Value};

/// Extract a Text string from a Value
pub fn extract_text(value: &Value, func: &str, arg: &str) -> Result<String, UnitError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Null => Err(UnitError::arg_type(func, arg, "Text", "Null")),
        Value::Error(e) => Err(e.clone()),
        other => Err(UnitError::arg_type(func, arg, "Text", other.type_name())),
    }
}

/// Require at least `expected` arguments
pub fn require_args(args: &[Value], expected: usize, func: &str) -> Result<(), UnitError> {
    if args.len() < expected {
        return Err(UnitError::arg_count(func, expected, args.len()));
    }
    Ok(())
}
