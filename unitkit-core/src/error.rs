//! Structured errors
//!
//! Errors never crash the system. They are values that travel back to the
//! caller with a machine-readable code and a hint for fixing the input.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INVALID_CATEGORY: &str = "INVALID_CATEGORY";
    pub const INVALID_UNIT: &str = "INVALID_UNIT";
    pub const INVALID_VALUE: &str = "INVALID_VALUE";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const UNDEFINED_FIELD: &str = "UNDEFINED_FIELD";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORAGE: &str = "STORAGE";
}

/// Structured error carried by plugin calls and server responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl UnitError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    // ========== Conversion Error Constructors ==========

    pub fn invalid_category(id: &str, known: &[&str]) -> Self {
        Self::new(codes::INVALID_CATEGORY, format!("Invalid category: {}", id))
            .with_suggestion(format!("Known categories: {}", known.join(", ")))
    }

    pub fn invalid_unit(category: &str, unit: &str) -> Self {
        Self::new(codes::INVALID_UNIT, format!("Invalid unit '{}' for category {}", unit, category))
            .with_suggestion(format!("Use units('{}') to list valid unit codes", category))
    }

    pub fn invalid_value(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_VALUE, format!("Invalid value: {}", details.into()))
            .with_suggestion("Provide a finite decimal number, e.g. 12.5 or 1e-3")
    }

    // ========== Call Error Constructors ==========

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
            .with_suggestion("Use help() to list available functions")
    }

    pub fn undefined_field(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FIELD, format!("Undefined field: {}", name))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(codes::TYPE_ERROR, format!("Expected {}, got {}", expected, got))
    }

    pub fn arg_count(func: &str, expected: usize, got: usize) -> Self {
        Self::new(codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", func, expected, got))
            .with_suggestion(format!("Use help('{}') for usage", func))
    }

    pub fn arg_type(func: &str, arg: &str, expected: &str, got: &str) -> Self {
        Self::new(codes::ARG_TYPE,
            format!("{}() argument '{}': expected {}, got {}", func, arg, expected, got))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, format!("Not found: {}", what.into()))
    }

    pub fn storage(details: impl Into<String>) -> Self {
        Self::new(codes::STORAGE, format!("Storage error: {}", details.into()))
    }
}

impl std::fmt::Display for UnitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnitError {}

impl From<NumberError> for UnitError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => Self::invalid_value(format!("'{}' is not a number", s)),
            NumberError::NotFinite(s) => Self::invalid_value(format!("{} is not finite", s)),
            NumberError::Overflow(details) => Self::invalid_value(details)
                .with_suggestion("Use a smaller magnitude"),
        }
    }
}
