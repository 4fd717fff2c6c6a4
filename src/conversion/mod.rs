//! Unit conversion module
//!
//! Converts product quantities between units of measure through a kilogram
//! intermediate, using per-product packaging configuration.

pub mod engine;
pub mod error;
pub mod lookup;
pub mod units;

pub use engine::{decimal_from_f64, ConvertOptions, UnitConverter};
pub use error::{ConversionError, ConversionResult};
pub use lookup::{PackagingLookup, StaticPackaging};
pub use units::{PieceRounding, UnitName, KG_PER_TON};
