//! unitkit Core - Fundamental types
//!
//! This crate provides the core types used throughout unitkit:
//! - magnitude parsing and display rounding (`parse_magnitude`, `round_to_places`)
//! - `Value`: Runtime values (numbers, text, objects, errors)
//! - `UnitError`: Structured errors with machine-readable codes

mod number;
mod value;
mod error;

pub use number::{
    check_finite, parse_magnitude, round_to_places, IntoMagnitude, NumberError,
    DISPLAY_DECIMALS, MAX_DECIMALS,
};
pub use value::Value;
pub use error::{UnitError, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Value, UnitError, IntoMagnitude};
    pub use crate::error::codes;
}
