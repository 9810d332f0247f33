//! Concrete appointment instances produced by expansion.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::rule::AppointmentRule;

/// ## Summary
/// One appointment rule projected onto one calendar day.
///
/// Occurrences borrow their rule and are rebuilt on every query; they are
/// never stored. Serializes as the rule's record plus `occurrenceDate` and
/// `occurrenceId`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence<'r> {
    #[serde(flatten)]
    pub rule: &'r AppointmentRule,
    pub occurrence_date: NaiveDate,
    pub occurrence_id: String,
}

impl<'r> Occurrence<'r> {
    #[must_use]
    pub fn new(rule: &'r AppointmentRule, occurrence_date: NaiveDate) -> Self {
        Self {
            rule,
            occurrence_date,
            occurrence_id: rule.occurrence_id(occurrence_date),
        }
    }

    #[must_use]
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        self.rule.time_of_day()
    }
}

/// ## Summary
/// Orders occurrences for display: by date, then time of day, then id.
///
/// Occurrences without a usable time sort before timed ones on the same day.
pub fn sort_occurrences(occurrences: &mut [Occurrence<'_>]) {
    occurrences.sort_by(|a, b| {
        a.occurrence_date
            .cmp(&b.occurrence_date)
            .then_with(|| a.time_of_day().cmp(&b.time_of_day()))
            .then_with(|| a.occurrence_id.cmp(&b.occurrence_id))
    });
}
