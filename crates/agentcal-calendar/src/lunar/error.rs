use chrono::NaiveDate;

/// Error raised by the lunar year table or the converter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LunarError {
    /// The table has no year entries.
    #[error("Lunar year table is empty")]
    EmptyTable,

    /// A packed year entry carries bits outside the known layout or names a
    /// leap month above 12.
    #[error("Invalid lunar table entry for year {year}: {bits:#07x}")]
    InvalidTableEntry { year: i32, bits: u32 },

    /// The solar date falls outside the lunar years covered by the table.
    #[error("Solar date {0} is outside the supported lunar range")]
    SolarOutOfRange(NaiveDate),
}
