//! Runtime values
//!
//! Values can be numbers, text, booleans, objects, lists, null, or errors.
//! Plugin functions take and return them; the server maps them to JSON.

use crate::UnitError;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

/// Runtime value passed to and returned from plugin functions
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Object(HashMap<String, Value>),
    List(Vec<Value>),
    Null,
    Error(UnitError),
}

impl Value {
    // ========== Safe Accessors (never panic) ==========

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&UnitError> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    // ========== Object Field Access ==========

    /// Get field from object. Returns Error value if not found or not an object.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => {
                map.get(key).cloned().unwrap_or_else(|| {
                    Value::Error(UnitError::undefined_field(key))
                })
            }
            Value::Error(e) => Value::Error(e.clone()),
            _ => Value::Error(UnitError::type_error("Object", self.type_name())),
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bool(_) => "Bool",
            Value::Object(_) => "Object",
            Value::List(_) => "List",
            Value::Null => "Null",
            Value::Error(_) => "Error",
        }
    }

    // ========== JSON Mapping ==========

    /// Build a value from JSON. Strings stay text; numbers stay numbers.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => Value::Text(n.to_string()),
            },
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(arr) => Value::List(arr.iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Object(
                obj.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            ),
        }
    }

    /// Render as plain JSON (numbers as JSON numbers, errors as `_error` objects)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => json!(n),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::List(l) => JsonValue::Array(l.iter().map(Value::to_json).collect()),
            Value::Object(o) => JsonValue::Object(
                o.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Error(e) => json!({"_error": {"code": e.code, "message": e.message, "suggestion": e.suggestion}}),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Object(obj) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys.iter()
                    .map(|k| format!("{}: {}", k, obj[*k]))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::List(items) => {
                // Small lists inline, large ones by count
                if items.len() <= 8 {
                    let contents: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                    write!(f, "[{}]", contents.join(", "))
                } else {
                    write!(f, "[{} items]", items.len())
                }
            }
            Value::Null => write!(f, "null"),
            Value::Error(e) => write!(f, "#ERROR: {}", e.code),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_field() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::from(1_i64));
        let obj = Value::Object(map);
        assert_eq!(obj.get("a"), Value::Number(1.0));
        assert!(obj.get("b").as_error().is_some());
        assert!(Value::from("x").get("a").as_error().is_some());
    }

    #[test]
    fn test_json_mapping() {
        let json = json!({"n": 1.5, "s": "km", "l": [true, null]});
        let value = Value::from_json(&json);
        assert_eq!(value.get("n"), Value::Number(1.5));
        assert_eq!(value.get("s"), Value::Text("km".to_string()));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(2.20462).to_string(), "2.20462");
        assert_eq!(Value::List(vec![Value::from("m"), Value::from("km")]).to_string(), "[m, km]");
        assert_eq!(Value::Error(UnitError::not_found("x")).to_string(), "#ERROR: NOT_FOUND");
    }
}
