//! Immutable per-year lunar month data.

use std::borrow::Cow;

use chrono::NaiveDate;

use super::data;
use super::error::LunarError;

const LEAP_MONTH_MASK: u32 = 0xf;
const LEAP_MONTH_LONG_BIT: u32 = 0x1_0000;
const ENTRY_MASK: u32 = 0x1_ffff;

const KOREAN_EPOCH: NaiveDate =
    match NaiveDate::from_ymd_opt(data::EPOCH.0, data::EPOCH.1, data::EPOCH.2) {
        Some(date) => date,
        None => panic!("lunar epoch must be a valid solar date"),
    };

/// ## Summary
/// Month layout of a single lunar year.
///
/// Exposes which month (if any) is doubled by a leap month, and whether each
/// month has 29 or 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearLunarProfile {
    year: i32,
    bits: u32,
}

impl YearLunarProfile {
    #[must_use]
    pub const fn from_bits(year: i32, bits: u32) -> Self {
        Self { year, bits }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The regular month that is followed by a leap month this year.
    #[must_use]
    pub fn leap_month(&self) -> Option<u32> {
        let month = self.bits & LEAP_MONTH_MASK;
        (month != 0).then_some(month)
    }

    /// Length of the leap month, or 0 if the year has none.
    #[must_use]
    pub fn leap_month_days(&self) -> u32 {
        match self.leap_month() {
            Some(_) if self.bits & LEAP_MONTH_LONG_BIT != 0 => 30,
            Some(_) => 29,
            None => 0,
        }
    }

    /// Length of regular month `month`, or `None` outside 1-12.
    #[must_use]
    pub fn month_days(&self, month: u32) -> Option<u32> {
        (1..=12).contains(&month).then(|| self.regular_days(month))
    }

    /// Total days in the lunar year, leap month included.
    #[must_use]
    pub fn total_days(&self) -> u32 {
        (1..=12).map(|month| self.regular_days(month)).sum::<u32>() + self.leap_month_days()
    }

    /// Caller guarantees `1 <= month <= 12`.
    pub(crate) fn regular_days(&self, month: u32) -> u32 {
        if self.bits & (LEAP_MONTH_LONG_BIT >> month) != 0 {
            30
        } else {
            29
        }
    }

    fn is_well_formed(&self) -> bool {
        self.bits & !ENTRY_MASK == 0 && self.bits & LEAP_MONTH_MASK <= 12
    }
}

/// ## Summary
/// A read-only table of [`YearLunarProfile`]s for consecutive lunar years,
/// anchored at the solar date of the first year's new year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunarTable {
    first_year: i32,
    epoch: NaiveDate,
    entries: Cow<'static, [u32]>,
}

impl LunarTable {
    /// ## Summary
    /// The bundled Korean lunisolar table covering 1900 through 2100.
    #[must_use]
    pub fn korean() -> Self {
        Self {
            first_year: data::FIRST_YEAR,
            epoch: KOREAN_EPOCH,
            entries: Cow::Borrowed(&data::YEAR_DATA),
        }
    }

    /// ## Summary
    /// Builds a table from packed year entries.
    ///
    /// `epoch` must be the solar date of lunar `first_year`-01-01. Entries use
    /// the layout documented on the bundled data.
    ///
    /// ## Errors
    /// Returns `LunarError::EmptyTable` for an empty entry list and
    /// `LunarError::InvalidTableEntry` for any malformed entry.
    pub fn new(
        first_year: i32,
        epoch: NaiveDate,
        entries: impl Into<Cow<'static, [u32]>>,
    ) -> Result<Self, LunarError> {
        let entries = entries.into();
        if entries.is_empty() {
            return Err(LunarError::EmptyTable);
        }

        let table = Self {
            first_year,
            epoch,
            entries,
        };

        if let Some(bad) = table.profiles().find(|p| !p.is_well_formed()) {
            return Err(LunarError::InvalidTableEntry {
                year: bad.year,
                bits: bad.bits,
            });
        }

        Ok(table)
    }

    #[must_use]
    pub const fn first_year(&self) -> i32 {
        self.first_year
    }

    #[must_use]
    pub fn last_year(&self) -> i32 {
        let span = i32::try_from(self.entries.len()).unwrap_or(i32::MAX);
        self.first_year.saturating_add(span - 1)
    }

    /// Solar date of the first lunar new year in the table.
    #[must_use]
    pub const fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    #[must_use]
    pub fn contains_year(&self, year: i32) -> bool {
        (self.first_year..=self.last_year()).contains(&year)
    }

    #[must_use]
    pub fn profile(&self, year: i32) -> Option<YearLunarProfile> {
        let index = usize::try_from(year.checked_sub(self.first_year)?).ok()?;
        self.entries
            .get(index)
            .map(|&bits| YearLunarProfile::from_bits(year, bits))
    }

    /// Profiles in ascending year order.
    pub fn profiles(&self) -> impl Iterator<Item = YearLunarProfile> + '_ {
        (self.first_year..)
            .zip(self.entries.iter())
            .map(|(year, &bits)| YearLunarProfile::from_bits(year, bits))
    }
}
