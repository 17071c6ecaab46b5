//! unitkit Units - Unit Registry and Conversion Engine
//!
//! A static registry of measurement categories, each with a base unit and
//! an ordered set of units, and a pure conversion function over it.
//!
//! Categories:
//! - Length (km, m, cm, mm, mi, yd, ft, in)
//! - Weight (t, kg, g, mg, lb, oz)
//! - Temperature (c, f, k), affine through Celsius
//! - Area (km2, m2, cm2, mm2, ha, acre, ft2, in2)
//! - Volume (m3, l, ml, gal, qt, pt, cup, fl_oz)
//! - Speed (mps, kph, mph, fps, knot)
//! - Time (yr, mo, wk, d, h, min, s, ms)
//!
//! ```
//! let result = unitkit_units::convert("length", "m", "km", 1000.0).unwrap();
//! assert_eq!(result.to_value, 1.0);
//! ```

mod registry;
mod convert;
mod functions;
mod helpers;

pub use registry::{Category, CategoryId, RegistryError, Unit, UnitRegistry, REGISTRY};
pub use convert::{convert, convert_with_decimals, ConversionError, ConversionResult};

use unitkit_plugin::PluginRegistry;

/// Load unit functions into registry
pub fn load_units_library(registry: PluginRegistry) -> PluginRegistry {
    registry
        // Conversion
        .with_function(functions::Convert)

        // Inspection
        .with_function(functions::Categories)
        .with_function(functions::Units)
        .with_function(functions::DefaultUnits)
}

/// Registry with every unit function loaded
pub fn standard_registry() -> PluginRegistry {
    load_units_library(PluginRegistry::new())
}
