//! Bidirectional solar/lunar date conversion over a [`LunarTable`].

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::error::LunarError;
use super::table::{LunarTable, YearLunarProfile};

/// A day in the Korean lunisolar calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarDate {
    pub year: i32,
    /// Regular month number, 1-12. A leap month shares its number with the
    /// regular month it follows.
    pub month: u32,
    pub day: u32,
    pub is_leap_month: bool,
}

impl LunarDate {
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32, is_leap_month: bool) -> Self {
        Self {
            year,
            month,
            day,
            is_leap_month,
        }
    }
}

impl std::fmt::Display for LunarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)?;
        if self.is_leap_month {
            f.write_str(" (leap)")?;
        }
        Ok(())
    }
}

/// ## Summary
/// Converts between solar (Gregorian) and lunar dates using an injected
/// year table.
///
/// All arithmetic is whole-day offsets from the table's epoch; no time of
/// day or timezone is involved.
#[derive(Debug, Clone)]
pub struct LunarConverter {
    table: LunarTable,
}

impl LunarConverter {
    #[must_use]
    pub fn new(table: LunarTable) -> Self {
        Self { table }
    }

    /// Converter over the bundled 1900-2100 Korean table.
    #[must_use]
    pub fn korean() -> Self {
        Self::new(LunarTable::korean())
    }

    #[must_use]
    pub fn table(&self) -> &LunarTable {
        &self.table
    }

    /// ## Summary
    /// First and last solar dates that map into the table.
    #[must_use]
    pub fn supported_range(&self) -> (NaiveDate, NaiveDate) {
        let total: i64 = self
            .table
            .profiles()
            .map(|p| i64::from(p.total_days()))
            .sum();
        let epoch = self.table.epoch();
        let last = epoch
            .checked_add_signed(TimeDelta::days(total - 1))
            .unwrap_or(NaiveDate::MAX);
        (epoch, last)
    }

    #[must_use]
    pub fn leap_month(&self, year: i32) -> Option<u32> {
        self.table.profile(year)?.leap_month()
    }

    /// ## Summary
    /// Length of a lunar month.
    ///
    /// Returns `None` if the year is not covered, the month is outside 1-12,
    /// or a leap month is requested that the year does not have.
    #[must_use]
    pub fn month_days(&self, year: i32, month: u32, is_leap_month: bool) -> Option<u32> {
        let profile = self.table.profile(year)?;
        if is_leap_month {
            (profile.leap_month() == Some(month)).then(|| profile.leap_month_days())
        } else {
            profile.month_days(month)
        }
    }

    #[must_use]
    pub fn year_days(&self, year: i32) -> Option<u32> {
        self.table.profile(year).map(|p| p.total_days())
    }

    /// ## Summary
    /// Converts a solar date to its lunar date.
    ///
    /// ## Errors
    /// Returns `LunarError::SolarOutOfRange` if the date precedes the table's
    /// epoch or follows the last day of its final year.
    pub fn solar_to_lunar(&self, solar: NaiveDate) -> Result<LunarDate, LunarError> {
        let mut offset = solar.signed_duration_since(self.table.epoch()).num_days();
        if offset < 0 {
            tracing::trace!(%solar, "Solar date precedes lunar epoch");
            return Err(LunarError::SolarOutOfRange(solar));
        }

        for profile in self.table.profiles() {
            let year_days = i64::from(profile.total_days());
            if offset < year_days {
                return locate_in_year(profile, offset).ok_or(LunarError::SolarOutOfRange(solar));
            }
            offset -= year_days;
        }

        tracing::trace!(%solar, "Solar date follows last lunar year");
        Err(LunarError::SolarOutOfRange(solar))
    }

    /// ## Summary
    /// Converts a lunar date to its solar date.
    ///
    /// `day` is not checked against the month length; an overlong day rolls
    /// forward into the following month.
    ///
    /// Returns `None` if `year` is not covered, `month` is outside 1-12, or
    /// `is_leap_month` is set but `month` is not the year's leap month.
    #[must_use]
    pub fn lunar_to_solar(
        &self,
        year: i32,
        month: u32,
        day: u32,
        is_leap_month: bool,
    ) -> Option<NaiveDate> {
        let profile = self.table.profile(year)?;
        if !(1..=12).contains(&month) {
            return None;
        }

        let leap_month = profile.leap_month();
        if is_leap_month && leap_month != Some(month) {
            tracing::trace!(year, month, ?leap_month, "Requested leap month does not exist");
            return None;
        }

        let mut offset: i64 = self
            .table
            .profiles()
            .take_while(|p| p.year() < year)
            .map(|p| i64::from(p.total_days()))
            .sum();

        for m in 1..month {
            offset += i64::from(profile.regular_days(m));
            if leap_month == Some(m) {
                offset += i64::from(profile.leap_month_days());
            }
        }

        if is_leap_month {
            // The leap month follows its regular namesake.
            debug_assert_eq!(leap_month, Some(month));
            offset += i64::from(profile.regular_days(month));
        }

        offset += i64::from(day) - 1;

        self.table
            .epoch()
            .checked_add_signed(TimeDelta::days(offset))
    }

    /// Converts a [`LunarDate`] to its solar date. See [`Self::lunar_to_solar`].
    #[must_use]
    pub fn lunar_date_to_solar(&self, date: &LunarDate) -> Option<NaiveDate> {
        self.lunar_to_solar(date.year, date.month, date.day, date.is_leap_month)
    }
}

impl Default for LunarConverter {
    fn default() -> Self {
        Self::korean()
    }
}

/// Finds the month/day `offset` days into the lunar year of `profile`.
fn locate_in_year(profile: YearLunarProfile, mut offset: i64) -> Option<LunarDate> {
    let leap_month = profile.leap_month();

    for month in 1..=12 {
        let days = i64::from(profile.regular_days(month));
        if offset < days {
            let day = u32::try_from(offset + 1).ok()?;
            return Some(LunarDate::new(profile.year(), month, day, false));
        }
        offset -= days;

        if leap_month == Some(month) {
            let leap_days = i64::from(profile.leap_month_days());
            if offset < leap_days {
                let day = u32::try_from(offset + 1).ok()?;
                return Some(LunarDate::new(profile.year(), month, day, true));
            }
            offset -= leap_days;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_epoch_maps_to_lunar_new_year() {
        let converter = LunarConverter::korean();
        assert_eq!(
            converter.lunar_to_solar(1900, 1, 1, false),
            Some(solar(1900, 1, 31))
        );
        assert_eq!(
            converter.solar_to_lunar(solar(1900, 1, 31)),
            Ok(LunarDate::new(1900, 1, 1, false))
        );
    }

    #[test]
    fn test_seollal_dates() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.lunar_to_solar(2000, 1, 1, false), Some(solar(2000, 2, 5)));
        assert_eq!(converter.lunar_to_solar(2024, 1, 1, false), Some(solar(2024, 2, 10)));
        assert_eq!(converter.lunar_to_solar(2025, 1, 1, false), Some(solar(2025, 1, 29)));
        assert_eq!(converter.lunar_to_solar(2026, 1, 1, false), Some(solar(2026, 2, 17)));
    }

    #[test]
    fn test_chuseok_dates() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.lunar_to_solar(2024, 8, 15, false), Some(solar(2024, 9, 17)));
        assert_eq!(converter.lunar_to_solar(2025, 8, 15, false), Some(solar(2025, 10, 6)));
        assert_eq!(converter.lunar_to_solar(2026, 8, 15, false), Some(solar(2026, 9, 25)));
    }

    #[test]
    fn test_leap_month_follows_regular_month() {
        let converter = LunarConverter::korean();

        // 2023: regular 2nd month starts 2023-02-20, leap 2nd month 2023-03-22.
        assert_eq!(converter.lunar_to_solar(2023, 2, 1, false), Some(solar(2023, 2, 20)));
        assert_eq!(converter.lunar_to_solar(2023, 2, 1, true), Some(solar(2023, 3, 22)));
        assert_eq!(
            converter.solar_to_lunar(solar(2023, 3, 22)),
            Ok(LunarDate::new(2023, 2, 1, true))
        );
        assert_eq!(
            converter.solar_to_lunar(solar(2023, 4, 20)),
            Ok(LunarDate::new(2023, 3, 1, false))
        );
    }

    #[test]
    fn test_wrong_leap_month_is_rejected() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.lunar_to_solar(2023, 3, 1, true), None);
        assert_eq!(converter.lunar_to_solar(2024, 1, 1, true), None);
    }

    #[test]
    fn test_out_of_range_year_is_rejected() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.lunar_to_solar(1899, 1, 1, false), None);
        assert_eq!(converter.lunar_to_solar(2101, 1, 1, false), None);
    }

    #[test]
    fn test_out_of_range_month_is_rejected() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.lunar_to_solar(2024, 0, 1, false), None);
        assert_eq!(converter.lunar_to_solar(2024, 13, 1, false), None);
    }

    #[test]
    fn test_overlong_day_rolls_forward() {
        let converter = LunarConverter::korean();
        // Lunar 2024-01 has 29 days, so day 30 is the first of month 2.
        assert_eq!(converter.month_days(2024, 1, false), Some(29));
        assert_eq!(
            converter.lunar_to_solar(2024, 1, 30, false),
            converter.lunar_to_solar(2024, 2, 1, false)
        );
    }

    #[test]
    fn test_solar_out_of_range() {
        let converter = LunarConverter::korean();
        let (first, last) = converter.supported_range();

        assert_eq!(first, solar(1900, 1, 31));
        assert_eq!(last, solar(2101, 1, 28));
        assert!(converter.solar_to_lunar(last).is_ok());

        let before = first.pred_opt().unwrap();
        let after = last.succ_opt().unwrap();
        assert_eq!(
            converter.solar_to_lunar(before),
            Err(LunarError::SolarOutOfRange(before))
        );
        assert_eq!(
            converter.solar_to_lunar(after),
            Err(LunarError::SolarOutOfRange(after))
        );
    }

    #[test]
    fn test_last_supported_day_is_end_of_2100() {
        let converter = LunarConverter::korean();
        let last = converter.solar_to_lunar(solar(2101, 1, 28)).unwrap();
        assert_eq!(last.year, 2100);
        assert_eq!(last.month, 12);
        assert_eq!(Some(last.day), converter.month_days(2100, 12, false));
    }

    #[test]
    fn test_month_days_for_leap_request() {
        let converter = LunarConverter::korean();
        assert_eq!(converter.month_days(2023, 2, true), Some(29));
        assert_eq!(converter.month_days(2023, 3, true), None);
        assert_eq!(converter.leap_month(2025), Some(6));
        assert_eq!(converter.year_days(2025), Some(384));
        assert_eq!(converter.year_days(2200), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(LunarDate::new(1990, 6, 5, false).to_string(), "1990-06-05");
        assert_eq!(LunarDate::new(2023, 2, 1, true).to_string(), "2023-02-01 (leap)");
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(LunarDate::new(2023, 2, 1, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"year": 2023, "month": 2, "day": 1, "isLeapMonth": true})
        );
    }
}
