//! Numeric magnitudes
//!
//! Magnitudes are plain `f64`. This module owns the two places where text
//! and floats meet: parsing caller input and rounding results for display.

use crate::Value;
use thiserror::Error;

/// Error type for magnitude parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Number is not finite: {0}")]
    NotFinite(String),

    /// A finite input produced a result too large for f64
    #[error("{0}")]
    Overflow(String),
}

/// Decimal places kept in conversion results
pub const DISPLAY_DECIMALS: u32 = 6;

/// Upper bound on decimal places; f64 has no more significant digits
pub const MAX_DECIMALS: u32 = 15;

/// Parse a caller-supplied magnitude.
///
/// Surrounding whitespace is ignored; anything else must be a complete
/// decimal or scientific literal ("12", "-3.5", "1e-3"). Trailing garbage,
/// empty input, `inf` and `NaN` are rejected.
pub fn parse_magnitude(s: &str) -> Result<f64, NumberError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(NumberError::ParseError(s.to_string()));
    }
    let n: f64 = trimmed
        .parse()
        .map_err(|_| NumberError::ParseError(s.to_string()))?;
    check_finite(n)
}

/// Reject NaN and infinities
pub fn check_finite(n: f64) -> Result<f64, NumberError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(NumberError::NotFinite(n.to_string()))
    }
}

/// Round to a fixed number of decimal places.
///
/// Works on the exact decimal expansion of the double (the same digits
/// `format!("{:.N}")` produces), so ties resolve to even and the result is
/// deterministic across platforms. Negative zero is normalized to zero.
/// `places` is capped at [`MAX_DECIMALS`].
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let places = places.min(MAX_DECIMALS) as usize;
    let text = format!("{:.*}", places, value);
    let rounded: f64 = text.parse().unwrap_or(value);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Anything that can be interpreted as a finite magnitude.
///
/// Conversion is deferred until the caller asks for it, so validation of
/// other inputs can run first.
pub trait IntoMagnitude {
    fn into_magnitude(self) -> Result<f64, NumberError>;
}

impl IntoMagnitude for f64 {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        check_finite(self)
    }
}

impl IntoMagnitude for f32 {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        check_finite(f64::from(self))
    }
}

impl IntoMagnitude for i64 {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        Ok(self as f64)
    }
}

impl IntoMagnitude for i32 {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        Ok(f64::from(self))
    }
}

impl IntoMagnitude for &str {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        parse_magnitude(self)
    }
}

impl IntoMagnitude for String {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        parse_magnitude(&self)
    }
}

impl IntoMagnitude for &String {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        parse_magnitude(self)
    }
}

impl IntoMagnitude for &Value {
    fn into_magnitude(self) -> Result<f64, NumberError> {
        match self {
            Value::Number(n) => check_finite(*n),
            Value::Text(s) => parse_magnitude(s),
            other => Err(NumberError::ParseError(other.type_name().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_and_decimal() {
        assert_eq!(parse_magnitude("42"), Ok(42.0));
        assert_eq!(parse_magnitude(" -3.5 "), Ok(-3.5));
        assert_eq!(parse_magnitude("1e-3"), Ok(0.001));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_magnitude("not-a-number"), Err(NumberError::ParseError(_))));
        assert!(matches!(parse_magnitude("12abc"), Err(NumberError::ParseError(_))));
        assert!(matches!(parse_magnitude(""), Err(NumberError::ParseError(_))));
        assert!(matches!(parse_magnitude("   "), Err(NumberError::ParseError(_))));
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert!(matches!(parse_magnitude("NaN"), Err(NumberError::NotFinite(_))));
        assert!(matches!(parse_magnitude("inf"), Err(NumberError::NotFinite(_))));
        assert!(matches!(parse_magnitude("-infinity"), Err(NumberError::NotFinite(_))));
    }

    #[test]
    fn test_round_to_places() {
        assert_eq!(round_to_places(2.204620000001, 6), 2.20462);
        assert_eq!(round_to_places(1.0000004, 6), 1.0);
        assert_eq!(round_to_places(1.0000006, 6), 1.000001);
        assert_eq!(round_to_places(-0.0000001, 6), 0.0);
        assert!(round_to_places(-0.0000001, 6).is_sign_positive());
    }

    #[test]
    fn test_round_caps_places() {
        assert_eq!(round_to_places(1.0 / 3.0, u32::MAX), round_to_places(1.0 / 3.0, MAX_DECIMALS));
        assert_eq!(round_to_places(0.1, 40), 0.1);
    }

    #[test]
    fn test_round_ties_to_even() {
        // 0.5 and 2.5 are exact in binary, so these are true ties
        assert_eq!(round_to_places(0.5, 0), 0.0);
        assert_eq!(round_to_places(1.5, 0), 2.0);
        assert_eq!(round_to_places(2.5, 0), 2.0);
    }

    #[test]
    fn test_into_magnitude() {
        assert_eq!(3.0_f64.into_magnitude(), Ok(3.0));
        assert_eq!(7_i64.into_magnitude(), Ok(7.0));
        assert_eq!("8.25".into_magnitude(), Ok(8.25));
        assert!(f64::NAN.into_magnitude().is_err());
        assert_eq!((&Value::Text("2".to_string())).into_magnitude(), Ok(2.0));
        assert!((&Value::Bool(true)).into_magnitude().is_err());
    }
}
