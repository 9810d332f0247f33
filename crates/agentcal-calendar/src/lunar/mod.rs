//! Korean lunisolar calendar conversion.
//!
//! A [`LunarConverter`] maps dates between the Gregorian calendar and the
//! lunisolar calendar using a precomputed [`LunarTable`] of month lengths and
//! leap months. The bundled table covers lunar years [`MIN_YEAR`] through
//! [`MAX_YEAR`].

mod converter;
mod data;
mod error;
mod table;

pub use converter::{LunarConverter, LunarDate};
pub use error::LunarError;
pub use table::{LunarTable, YearLunarProfile};

/// First lunar year in the bundled table.
pub const MIN_YEAR: i32 = data::FIRST_YEAR;

/// Last lunar year in the bundled table.
pub const MAX_YEAR: i32 = 2100;

/// Solar dates are plain Gregorian calendar days.
pub type SolarDate = chrono::NaiveDate;
