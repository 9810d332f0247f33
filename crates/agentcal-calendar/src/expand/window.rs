//! Inclusive calendar-date windows for expansion queries.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

use crate::error::{CalendarError, CalendarResult};

/// ## Summary
/// A closed range of calendar days, `start..=end`.
///
/// Windows are day-granular: a query from a timestamp range covers every day
/// the range touches, from the start of its first day to the end of its last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// ## Summary
    /// Creates a window covering `start` through `end`.
    ///
    /// ## Errors
    /// Returns `CalendarError::InvalidWindow` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CalendarResult<Self> {
        if start > end {
            return Err(CalendarError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// ## Summary
    /// Creates a window from local timestamps, widened to whole days.
    ///
    /// ## Errors
    /// Returns `CalendarError::InvalidWindow` if `start` falls on a later day
    /// than `end`.
    pub fn from_datetimes(start: NaiveDateTime, end: NaiveDateTime) -> CalendarResult<Self> {
        Self::new(start.date(), end.date())
    }

    /// Window covering a single day.
    #[must_use]
    pub const fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Monday-to-Sunday week containing `date`.
    #[must_use]
    pub fn week_of(date: NaiveDate) -> Self {
        let back = u64::from(date.weekday().num_days_from_monday());
        let start = date.checked_sub_days(Days::new(back)).unwrap_or(date);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Whole calendar month, or `None` for an invalid year/month.
    #[must_use]
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the window, both ends included.
    #[must_use]
    pub fn len_days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days() + 1
    }
}
