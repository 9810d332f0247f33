/// Meeting type whose appointments are never expanded onto the calendar.
pub const SUPPRESSED_MEETING_TYPE: &str = "TA";

/// Joins a rule id and an occurrence date into a recurring occurrence id.
pub const OCCURRENCE_ID_SEPARATOR: char = '_';

/// Calendar date format used by stored records (`YYYY-MM-DD`).
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format used by stored records (`HH:MM`).
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";
