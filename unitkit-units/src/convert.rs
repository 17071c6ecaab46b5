//! Conversion engine
//!
//! Linear categories pivot through their base unit using the registered
//! factors. Temperature is affine and pivots through Celsius with explicit
//! formulas. Results are rounded to a fixed number of decimal places.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use unitkit_core::{
    round_to_places, IntoMagnitude, NumberError, UnitError, Value, DISPLAY_DECIMALS,
};

use crate::registry::{Category, CategoryId, RegistryError, Unit, REGISTRY};

/// Errors that can occur during unit conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid unit '{unit}' for category {category}")]
    InvalidUnit { category: String, unit: String },

    #[error("invalid value: {0}")]
    InvalidValue(#[from] NumberError),
}

impl From<RegistryError> for ConversionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownCategory(id) => ConversionError::InvalidCategory(id),
            RegistryError::UnknownUnit { category, unit } => {
                ConversionError::InvalidUnit { category, unit }
            }
        }
    }
}

impl From<ConversionError> for UnitError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidCategory(id) => {
                let known: Vec<&str> = CategoryId::ALL.iter().map(|c| c.as_str()).collect();
                UnitError::invalid_category(&id, &known)
            }
            ConversionError::InvalidUnit { category, unit } => {
                UnitError::invalid_unit(&category, &unit)
            }
            ConversionError::InvalidValue(e) => UnitError::from(e),
        }
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub category: CategoryId,
    pub from_unit: String,
    pub to_unit: String,
    /// The parsed input, unrounded
    pub from_value: f64,
    /// The converted value, rounded
    pub to_value: f64,
    pub from_unit_name: String,
    pub to_unit_name: String,
}

impl ConversionResult {
    pub fn to_value(&self) -> Value {
        let mut obj = HashMap::new();
        obj.insert("category".to_string(), Value::Text(self.category.to_string()));
        obj.insert("fromUnit".to_string(), Value::Text(self.from_unit.clone()));
        obj.insert("toUnit".to_string(), Value::Text(self.to_unit.clone()));
        obj.insert("fromValue".to_string(), Value::Number(self.from_value));
        obj.insert("toValue".to_string(), Value::Number(self.to_value));
        obj.insert("fromUnitName".to_string(), Value::Text(self.from_unit_name.clone()));
        obj.insert("toUnitName".to_string(), Value::Text(self.to_unit_name.clone()));
        Value::Object(obj)
    }
}

/// Convert `value` between two units of a category, rounded to 6 places.
///
/// Checks run in a fixed order and the first failure wins: the category,
/// then both unit codes, then the value. The value is not interpreted
/// until the category and units resolve.
///
/// Text values must be a complete number literal. Unlike prefix parsing
/// (`parseFloat` style), `"12abc"` is rejected as an invalid value rather
/// than read as 12. A result that overflows `f64` is also an invalid value.
pub fn convert<V: IntoMagnitude>(
    category: &str,
    from_unit: &str,
    to_unit: &str,
    value: V,
) -> Result<ConversionResult, ConversionError> {
    convert_with_decimals(category, from_unit, to_unit, value, DISPLAY_DECIMALS)
}

/// Same as [`convert`] with an explicit number of decimal places
pub fn convert_with_decimals<V: IntoMagnitude>(
    category: &str,
    from_unit: &str,
    to_unit: &str,
    value: V,
    decimals: u32,
) -> Result<ConversionResult, ConversionError> {
    let cat = REGISTRY
        .get_category(category)
        .map_err(|_| ConversionError::InvalidCategory(category.to_string()))?;
    let from = resolve_unit(cat, from_unit)?;
    let to = resolve_unit(cat, to_unit)?;
    let value = value.into_magnitude()?;

    let raw = if from.code == to.code {
        value
    } else if cat.id == CategoryId::Temperature {
        convert_temperature(cat, from, to, value)?
    } else {
        convert_linear(cat, from, to, value)
    };
    if !raw.is_finite() {
        return Err(ConversionError::InvalidValue(NumberError::Overflow(format!(
            "result of converting {:e} {} to {} overflows",
            value, from.code, to.code
        ))));
    }
    let to_value = round_to_places(raw, decimals);

    Ok(ConversionResult {
        category: cat.id,
        from_unit: from.code.to_string(),
        to_unit: to.code.to_string(),
        from_value: value,
        to_value,
        from_unit_name: from.name.to_string(),
        to_unit_name: to.name.to_string(),
    })
}

fn resolve_unit<'a>(cat: &'a Category, code: &str) -> Result<&'a Unit, ConversionError> {
    cat.unit(code).ok_or_else(|| ConversionError::InvalidUnit {
        category: cat.id.to_string(),
        unit: code.to_string(),
    })
}

fn convert_linear(cat: &Category, from: &Unit, to: &Unit, value: f64) -> f64 {
    let in_base = if cat.is_base(from.code) {
        value
    } else {
        value / from.factor
    };
    if cat.is_base(to.code) {
        in_base
    } else {
        in_base * to.factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemperatureScale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureScale {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(TemperatureScale::Celsius),
            "f" => Some(TemperatureScale::Fahrenheit),
            "k" => Some(TemperatureScale::Kelvin),
            _ => None,
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => value,
            TemperatureScale::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            TemperatureScale::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureScale::Celsius => celsius,
            TemperatureScale::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            TemperatureScale::Kelvin => celsius + 273.15,
        }
    }
}

fn convert_temperature(cat: &Category, from: &Unit, to: &Unit, value: f64) -> Result<f64, ConversionError> {
    let scale = |unit: &Unit| {
        TemperatureScale::from_code(unit.code).ok_or_else(|| ConversionError::InvalidUnit {
            category: cat.id.to_string(),
            unit: unit.code.to_string(),
        })
    };
    let celsius = scale(from)?.to_celsius(value);
    Ok(scale(to)?.from_celsius(celsius))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_value(category: &str, from: &str, to: &str, value: f64) -> f64 {
        convert(category, from, to, value).unwrap().to_value
    }

    #[test]
    fn test_meters_to_kilometers() {
        assert_eq!(to_value("length", "m", "km", 1000.0), 1.0);
    }

    #[test]
    fn test_kilograms_to_pounds() {
        assert_eq!(to_value("weight", "kg", "lb", 1.0), 2.20462);
    }

    #[test]
    fn test_temperature_fixed_points() {
        assert_eq!(to_value("temperature", "c", "f", 0.0), 32.0);
        assert_eq!(to_value("temperature", "f", "c", 32.0), 0.0);
        assert_eq!(to_value("temperature", "c", "k", 0.0), 273.15);
        assert_eq!(to_value("temperature", "c", "f", 100.0), 212.0);
        assert_eq!(to_value("temperature", "k", "c", 0.0), -273.15);
        assert_eq!(to_value("temperature", "f", "k", 32.0), 273.15);
    }

    #[test]
    fn test_between_non_base_units() {
        // 1 km = 1000 m = 100000 cm
        assert_eq!(to_value("length", "km", "cm", 1.0), 100_000.0);
        // 2 h = 120 min
        assert_eq!(to_value("time", "h", "min", 2.0), 120.0);
        // 1 kph = 1/3.6 mps
        assert_eq!(to_value("speed", "kph", "mps", 36.0), 10.0);
    }

    #[test]
    fn test_result_fields() {
        let result = convert("length", "ft", "m", "3.28084").unwrap();
        assert_eq!(result.category, CategoryId::Length);
        assert_eq!(result.from_unit, "ft");
        assert_eq!(result.to_unit, "m");
        assert_eq!(result.from_value, 3.28084);
        assert_eq!(result.to_value, 1.0);
        assert_eq!(result.from_unit_name, "Feet");
        assert_eq!(result.to_unit_name, "Meters");
    }

    #[test]
    fn test_result_is_rounded_to_six_places() {
        // 1 in = 1/39.3701 m = 0.0253999...
        let v = to_value("length", "in", "m", 1.0);
        assert_eq!(v, 0.0254);
        let v = to_value("time", "s", "h", 1.0);
        assert_eq!(v, 0.000278);
    }

    #[test]
    fn test_identity_every_unit() {
        for category in REGISTRY.categories() {
            for unit in &category.units {
                for v in [0.0, 1.0, -17.25, 123_456.789, 0.000001] {
                    let result = to_value(category.id.as_str(), unit.code, unit.code, v);
                    assert_eq!(result, v, "{} {} {}", category.id, unit.code, v);
                }
            }
        }
    }

    #[test]
    fn test_identity_rounds_long_inputs() {
        assert_eq!(to_value("weight", "g", "g", 1.23456789), 1.234568);
    }

    #[test]
    fn test_temperature_affine_path_collapses_to_identity() {
        for code in ["c", "f", "k"] {
            let scale = TemperatureScale::from_code(code).unwrap();
            for v in [-40.0, 0.0, 37.5, 451.0] {
                let back = scale.from_celsius(scale.to_celsius(v));
                assert!((back - v).abs() < 1e-9, "{} {} -> {}", code, v, back);
            }
        }
    }

    #[test]
    fn test_minus_forty_agrees() {
        assert_eq!(to_value("temperature", "c", "f", -40.0), -40.0);
        assert_eq!(to_value("temperature", "f", "c", -40.0), -40.0);
    }

    // Rounding to 6 places adds at most 5e-7 per leg; the first leg's error
    // is scaled by the slope of the return conversion.
    fn slope(category: &Category, from: &Unit, to: &Unit) -> f64 {
        if category.id == CategoryId::Temperature {
            9.0 / 5.0
        } else {
            to.factor / from.factor
        }
    }

    #[test]
    fn test_round_trip_within_rounding_tolerance() {
        for category in REGISTRY.categories() {
            for a in &category.units {
                for b in &category.units {
                    for v in [1.0, 42.5, 1000.0, -3.75] {
                        let there = to_value(category.id.as_str(), a.code, b.code, v);
                        let back = to_value(category.id.as_str(), b.code, a.code, there);
                        let tolerance = 5e-7 * (1.0 + slope(category, b, a)) + 1e-9 * v.abs();
                        assert!(
                            (back - v).abs() <= tolerance,
                            "{}: {} {} -> {} {} -> {} (tolerance {})",
                            category.id, v, a.code, there, b.code, back, tolerance
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_category() {
        assert_eq!(
            convert("bogus-category", "m", "km", 1.0),
            Err(ConversionError::InvalidCategory("bogus-category".to_string()))
        );
    }

    #[test]
    fn test_invalid_unit() {
        let err = convert("length", "xx", "km", 1.0).unwrap_err();
        assert_eq!(err, ConversionError::InvalidUnit {
            category: "length".to_string(),
            unit: "xx".to_string(),
        });
        assert!(matches!(
            convert("length", "m", "kg", 1.0),
            Err(ConversionError::InvalidUnit { .. })
        ));
    }

    #[test]
    fn test_invalid_value() {
        assert!(matches!(
            convert("length", "m", "km", "not-a-number"),
            Err(ConversionError::InvalidValue(_))
        ));
        // A numeric prefix is not enough
        assert!(matches!(
            convert("length", "m", "km", "12abc"),
            Err(ConversionError::InvalidValue(_))
        ));
        assert!(matches!(
            convert("length", "m", "km", f64::NAN),
            Err(ConversionError::InvalidValue(_))
        ));
        assert!(matches!(
            convert("length", "m", "km", f64::INFINITY),
            Err(ConversionError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_category_error_wins_over_unit_error() {
        assert!(matches!(
            convert("bogus-category", "xx", "yy", "nan"),
            Err(ConversionError::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_unit_error_wins_over_value_error() {
        assert!(matches!(
            convert("length", "xx", "km", "not-a-number"),
            Err(ConversionError::InvalidUnit { .. })
        ));
        assert!(matches!(
            convert("length", "m", "yy", "not-a-number"),
            Err(ConversionError::InvalidUnit { .. })
        ));
    }

    #[test]
    fn test_overflowing_result_is_invalid_value() {
        let err = convert("weight", "kg", "mg", 1e305).unwrap_err();
        assert_eq!(
            err,
            ConversionError::InvalidValue(NumberError::Overflow(
                "result of converting 1e305 kg to mg overflows".to_string()
            ))
        );

        let unit_err = UnitError::from(err);
        assert_eq!(unit_err.code, unitkit_core::codes::INVALID_VALUE);
        assert!(unit_err.message.contains("1e305 kg to mg"));
        assert!(!unit_err.message.contains("inf"));
    }

    #[test]
    fn test_explicit_decimals() {
        let result = convert_with_decimals("length", "in", "m", 1.0, 2).unwrap();
        assert_eq!(result.to_value, 0.03);
    }

    #[test]
    fn test_into_unit_error() {
        let err: UnitError = convert("length", "m", "xx", 1.0).unwrap_err().into();
        assert_eq!(err.code, unitkit_core::codes::INVALID_UNIT);
        let err: UnitError = convert("nope", "m", "km", 1.0).unwrap_err().into();
        assert!(err.suggestion.unwrap_or_default().contains("temperature"));
    }

    #[test]
    fn test_serialized_shape_is_camel_case() {
        let result = convert("weight", "kg", "lb", 1.0).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], "weight");
        assert_eq!(json["fromUnit"], "kg");
        assert_eq!(json["toValue"], 2.20462);
        assert_eq!(json["toUnitName"], "Pounds");
    }
}
