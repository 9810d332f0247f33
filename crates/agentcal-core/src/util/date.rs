//! Local calendar-date helpers for stored appointment records.
//!
//! ## Summary
//! Records store dates as `YYYY-MM-DD` strings meant as wall-calendar days.
//! Everything here stays timezone-naive: a date string maps to exactly one
//! `NaiveDate` with no UTC shift.

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::constants::{ISO_DATE_FORMAT, TIME_OF_DAY_FORMAT};
use crate::error::{CoreError, CoreResult};

/// ## Summary
/// Parses a stored date string as a local calendar date.
///
/// Accepts `YYYY-MM-DD`, optionally followed by a `T`-separated time part
/// which is ignored (some imports store full ISO timestamps).
///
/// ## Errors
/// Returns `CoreError::ParseError` if the string is empty or is not a valid
/// calendar date.
pub fn parse_local_date(value: &str) -> CoreResult<NaiveDate> {
    let date_part = date_part(value)?;

    NaiveDate::parse_from_str(date_part, ISO_DATE_FORMAT)
        .map_err(|e| CoreError::ParseError(format!("invalid date {value:?}: {e}")))
}

/// Numeric `YYYY-MM-DD` fields, not checked against any calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateFields {
    /// The Gregorian date with these fields, if one exists.
    #[must_use]
    pub fn to_solar(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateFields {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// ## Summary
/// Splits a stored date string into its numeric fields without Gregorian
/// validation.
///
/// Used for dates in other calendars (`1990-02-30` is a valid lunar day).
/// The same `T`-suffix and whitespace tolerance as [`parse_local_date`]
/// applies.
///
/// ## Errors
/// Returns `CoreError::ParseError` if the string is empty or is not three
/// dash-separated decimal numbers.
pub fn parse_date_fields(value: &str) -> CoreResult<DateFields> {
    let malformed = || CoreError::ParseError(format!("invalid date fields {value:?}"));

    let mut parts = date_part(value)?.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !(is_number(year) && is_number(month) && is_number(day)) {
        return Err(malformed());
    }

    let out_of_range =
        |e: std::num::ParseIntError| CoreError::ParseError(format!("invalid date fields {value:?}: {e}"));

    Ok(DateFields {
        year: year.parse().map_err(out_of_range)?,
        month: month.parse().map_err(out_of_range)?,
        day: day.parse().map_err(out_of_range)?,
    })
}

fn date_part(value: &str) -> CoreResult<&str> {
    let trimmed = value.trim();
    let date_part = trimmed.split_once('T').map_or(trimmed, |(date, _time)| date);

    if date_part.is_empty() {
        return Err(CoreError::ParseError("empty date".to_string()));
    }
    Ok(date_part)
}

/// ## Summary
/// Formats a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// ## Summary
/// Parses a stored `HH:MM` time of day.
///
/// ## Errors
/// Returns `CoreError::ParseError` if the value is not a valid `HH:MM` time.
pub fn parse_time_of_day(value: &str) -> CoreResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT)
        .map_err(|e| CoreError::ParseError(format!("invalid time {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let date = parse_local_date("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_ignores_time_part() {
        let date = parse_local_date("2024-03-10T23:30:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let date = parse_local_date("  2024-12-31 ").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_local_date("").is_err());
        assert!(parse_local_date("not a date").is_err());
        assert!(parse_local_date("2024-02-30").is_err());
        assert!(parse_local_date("2024-13-01").is_err());
    }

    #[test]
    fn test_format_round_trips() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(format_iso_date(date), "2025-06-05");
        assert_eq!(parse_local_date(&format_iso_date(date)).unwrap(), date);
    }

    #[test]
    fn test_date_fields_skip_calendar_checks() {
        assert_eq!(
            parse_date_fields("1990-02-30").unwrap(),
            DateFields {
                year: 1990,
                month: 2,
                day: 30
            }
        );
        assert_eq!(
            parse_date_fields(" 1991-02-29T00:00:00 ").unwrap().to_solar(),
            None
        );
    }

    #[test]
    fn test_date_fields_reject_garbage() {
        assert!(parse_date_fields("").is_err());
        assert!(parse_date_fields("1990-02").is_err());
        assert!(parse_date_fields("1990-02-03-04").is_err());
        assert!(parse_date_fields("1990-+2-03").is_err());
        assert!(parse_date_fields("1990-ab-03").is_err());
    }

    #[test]
    fn test_date_fields_from_solar() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let fields = DateFields::from(date);
        assert_eq!((fields.year, fields.month, fields.day), (2024, 2, 29));
        assert_eq!(fields.to_solar(), Some(date));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert!(parse_time_of_day("9h30").is_err());
    }
}
