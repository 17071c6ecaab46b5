//! Unit definitions - seven categories, each pivoting through a base unit

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Global unit registry
pub static REGISTRY: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown unit '{unit}' in category {category}")]
    UnknownUnit { category: String, unit: String },
}

/// A measurable dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryId {
    Length,
    Weight,
    Temperature,
    Area,
    Volume,
    Speed,
    Time,
}

impl CategoryId {
    /// Declaration order
    pub const ALL: [CategoryId; 7] = [
        CategoryId::Length,
        CategoryId::Weight,
        CategoryId::Temperature,
        CategoryId::Area,
        CategoryId::Volume,
        CategoryId::Speed,
        CategoryId::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Length => "length",
            CategoryId::Weight => "weight",
            CategoryId::Temperature => "temperature",
            CategoryId::Area => "area",
            CategoryId::Volume => "volume",
            CategoryId::Speed => "speed",
            CategoryId::Time => "time",
        }
    }
}

impl FromStr for CategoryId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A convertible unit within a category.
///
/// `value_in_unit = value_in_base * factor`. Only temperature units carry a
/// non-zero `offset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub code: &'static str,
    pub name: &'static str,
    pub factor: f64,
    pub offset: f64,
}

impl Unit {
    pub fn linear(code: &'static str, name: &'static str, factor: f64) -> Self {
        Unit { code, name, factor, offset: 0.0 }
    }

    pub fn affine(code: &'static str, name: &'static str, factor: f64, offset: f64) -> Self {
        Unit { code, name, factor, offset }
    }
}

/// A category with its base unit and units in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: &'static str,
    pub base_unit: &'static str,
    pub units: Vec<Unit>,
}

impl Category {
    pub fn unit(&self, code: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.code == code)
    }

    pub fn is_base(&self, code: &str) -> bool {
        self.base_unit == code
    }

    pub fn unit_codes(&self) -> Vec<&'static str> {
        self.units.iter().map(|u| u.code).collect()
    }
}

/// Registry of all known categories
pub struct UnitRegistry {
    categories: Vec<Category>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = UnitRegistry { categories: Vec::new() };
        registry.register_all_categories();
        registry
    }

    /// All categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get_category(&self, id: &str) -> Result<&Category, RegistryError> {
        let id: CategoryId = id.parse()?;
        self.category(id)
            .ok_or_else(|| RegistryError::UnknownCategory(id.to_string()))
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn get_unit(&self, category: &str, code: &str) -> Result<&Unit, RegistryError> {
        self.get_category(category)?
            .unit(code)
            .ok_or_else(|| RegistryError::UnknownUnit {
                category: category.to_string(),
                unit: code.to_string(),
            })
    }

    /// Unit codes of a category in declaration order
    pub fn list_unit_codes(&self, category: &str) -> Result<Vec<&'static str>, RegistryError> {
        Ok(self.get_category(category)?.unit_codes())
    }

    /// The first two units of a category, the defaults for a fresh selection
    pub fn default_pair(&self, category: &str) -> Result<(&'static str, &'static str), RegistryError> {
        let codes = self.list_unit_codes(category)?;
        match codes.as_slice() {
            [first, second, ..] => Ok((*first, *second)),
            [only] => Ok((*only, *only)),
            [] => Err(RegistryError::UnknownUnit {
                category: category.to_string(),
                unit: String::new(),
            }),
        }
    }

    fn register(&mut self, id: CategoryId, name: &'static str, base_unit: &'static str, units: Vec<Unit>) {
        self.categories.push(Category { id, name, base_unit, units });
    }

    fn register_all_categories(&mut self) {
        self.register_length();
        self.register_weight();
        self.register_temperature();
        self.register_area();
        self.register_volume();
        self.register_speed();
        self.register_time();
    }

    fn register_length(&mut self) {
        self.register(CategoryId::Length, "Length", "m", vec![
            Unit::linear("km", "Kilometers", 0.001),
            Unit::linear("m", "Meters", 1.0),
            Unit::linear("cm", "Centimeters", 100.0),
            Unit::linear("mm", "Millimeters", 1000.0),
            Unit::linear("mi", "Miles", 0.000621371),
            Unit::linear("yd", "Yards", 1.09361),
            Unit::linear("ft", "Feet", 3.28084),
            Unit::linear("in", "Inches", 39.3701),
        ]);
    }

    fn register_weight(&mut self) {
        self.register(CategoryId::Weight, "Weight", "kg", vec![
            Unit::linear("t", "Metric Tons", 0.001),
            Unit::linear("kg", "Kilograms", 1.0),
            Unit::linear("g", "Grams", 1000.0),
            Unit::linear("mg", "Milligrams", 1_000_000.0),
            Unit::linear("lb", "Pounds", 2.20462),
            Unit::linear("oz", "Ounces", 35.274),
        ]);
    }

    // Factor and offset describe `unit = celsius * factor + offset`; the
    // engine applies the explicit formulas rather than these fields.
    fn register_temperature(&mut self) {
        self.register(CategoryId::Temperature, "Temperature", "c", vec![
            Unit::affine("c", "Celsius", 1.0, 0.0),
            Unit::affine("f", "Fahrenheit", 9.0 / 5.0, 32.0),
            Unit::affine("k", "Kelvin", 1.0, 273.15),
        ]);
    }

    fn register_area(&mut self) {
        self.register(CategoryId::Area, "Area", "m2", vec![
            Unit::linear("km2", "Square Kilometers", 0.000001),
            Unit::linear("m2", "Square Meters", 1.0),
            Unit::linear("cm2", "Square Centimeters", 10_000.0),
            Unit::linear("mm2", "Square Millimeters", 1_000_000.0),
            Unit::linear("ha", "Hectares", 0.0001),
            Unit::linear("acre", "Acres", 0.000247105),
            Unit::linear("ft2", "Square Feet", 10.7639),
            Unit::linear("in2", "Square Inches", 1550.0),
        ]);
    }

    fn register_volume(&mut self) {
        self.register(CategoryId::Volume, "Volume", "l", vec![
            Unit::linear("m3", "Cubic Meters", 0.001),
            Unit::linear("l", "Liters", 1.0),
            Unit::linear("ml", "Milliliters", 1000.0),
            Unit::linear("gal", "Gallons (US)", 0.264172),
            Unit::linear("qt", "Quarts (US)", 1.05669),
            Unit::linear("pt", "Pints (US)", 2.11338),
            Unit::linear("cup", "Cups (US)", 4.22675),
            Unit::linear("fl_oz", "Fluid Ounces (US)", 33.814),
        ]);
    }

    fn register_speed(&mut self) {
        self.register(CategoryId::Speed, "Speed", "mps", vec![
            Unit::linear("mps", "Meters per second", 1.0),
            Unit::linear("kph", "Kilometers per hour", 3.6),
            Unit::linear("mph", "Miles per hour", 2.23694),
            Unit::linear("fps", "Feet per second", 3.28084),
            Unit::linear("knot", "Knots", 1.94384),
        ]);
    }

    fn register_time(&mut self) {
        self.register(CategoryId::Time, "Time", "s", vec![
            Unit::linear("yr", "Years", 1.0 / (365.25 * SECONDS_PER_DAY)),
            Unit::linear("mo", "Months (avg)", 1.0 / (30.4375 * SECONDS_PER_DAY)),
            Unit::linear("wk", "Weeks", 1.0 / (7.0 * SECONDS_PER_DAY)),
            Unit::linear("d", "Days", 1.0 / SECONDS_PER_DAY),
            Unit::linear("h", "Hours", 1.0 / 3600.0),
            Unit::linear("min", "Minutes", 1.0 / 60.0),
            Unit::linear("s", "Seconds", 1.0),
            Unit::linear("ms", "Milliseconds", 1000.0),
        ]);
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
