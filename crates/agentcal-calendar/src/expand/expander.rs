//! Occurrence expansion for appointment rules.
//!
//! Each rule is turned into the concrete days it falls on inside a query
//! window. Yearly rules step year by year (optionally through the lunar
//! calendar); daily, weekly and monthly rules step one day at a time and
//! test each candidate day against the rule.

use std::collections::HashSet;

use agentcal_core::types::RecurrenceType;
use agentcal_core::util::date::DateFields;
use chrono::{Datelike, Days, NaiveDate};

use super::occurrence::Occurrence;
use super::rule::AppointmentRule;
use super::window::DateWindow;
use crate::lunar::LunarConverter;

/// ## Summary
/// Maximum candidate years examined for one yearly rule.
///
/// Bounds the loop even when the stored interval is corrupt.
pub const YEARLY_ITERATION_CAP: usize = 100;

/// ## Summary
/// Maximum candidate days examined for one daily, weekly or monthly rule
/// (about three years).
pub const DAILY_ITERATION_CAP: usize = 1095;

/// Everything parsed out of a rule before stepping through candidates.
struct Series<'r> {
    rule: &'r AppointmentRule,
    /// Base date fields as stored; lunar for lunar-anchored rules.
    anchor: DateFields,
    /// First solar day an occurrence may fall on.
    start: NaiveDate,
    interval: u32,
    end_date: Option<NaiveDate>,
    exceptions: HashSet<NaiveDate>,
}

impl Series<'_> {
    fn is_excepted(&self, date: NaiveDate) -> bool {
        self.exceptions.contains(&date)
    }

    fn past_end(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }
}

/// ## Summary
/// Expands appointment rules into occurrences using a lunar converter for
/// lunar-anchored yearly rules.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'c> {
    converter: &'c LunarConverter,
}

impl<'c> Expander<'c> {
    #[must_use]
    pub fn new(converter: &'c LunarConverter) -> Self {
        Self { converter }
    }

    /// ## Summary
    /// Expands every rule over `window`.
    ///
    /// Rules that cannot be expanded (malformed dates or interval, suppressed
    /// meeting type) contribute nothing. Occurrences of one rule are in
    /// chronological order; no order is imposed across rules.
    #[must_use]
    #[tracing::instrument(skip_all, fields(rules = rules.len(), start = %window.start(), end = %window.end()))]
    pub fn expand<'r>(&self, rules: &'r [AppointmentRule], window: DateWindow) -> Vec<Occurrence<'r>> {
        let occurrences: Vec<_> = rules
            .iter()
            .flat_map(|rule| self.expand_rule(rule, window))
            .collect();

        tracing::debug!(count = occurrences.len(), "Expanded appointment rules");
        occurrences
    }

    /// ## Summary
    /// Expands a single rule over `window`.
    #[must_use]
    pub fn expand_rule<'r>(&self, rule: &'r AppointmentRule, window: DateWindow) -> Vec<Occurrence<'r>> {
        if rule.is_suppressed() {
            tracing::trace!(rule_id = %rule.id, "Skipping suppressed meeting type");
            return Vec::new();
        }

        let Some(series) = self.prepare(rule) else {
            return Vec::new();
        };

        let occurrences = match rule.recurrence.kind {
            RecurrenceType::None => expand_single(&series, window),
            RecurrenceType::Yearly => self.expand_yearly(&series, window),
            RecurrenceType::Daily | RecurrenceType::Weekly | RecurrenceType::Monthly => {
                expand_stepped(&series, window)
            }
        };

        tracing::trace!(rule_id = %rule.id, count = occurrences.len(), "Expanded rule");
        occurrences
    }

    /// Parses the rule's dates and interval, logging why a rule is skipped.
    fn prepare<'r>(&self, rule: &'r AppointmentRule) -> Option<Series<'r>> {
        let anchored = if rule.is_lunar_anchored() {
            rule.lunar_base().map(|anchor| (anchor, self.lunar_series_start(anchor)))
        } else {
            rule.base_date().map(|base| (DateFields::from(base), base))
        };

        let (anchor, start) = match anchored {
            Ok(anchored) => anchored,
            Err(e) => {
                tracing::debug!(rule_id = %rule.id, error = %e, "Skipping rule with malformed date");
                return None;
            }
        };

        let interval = match u32::try_from(rule.recurrence.interval) {
            Ok(interval) if interval >= 1 => interval,
            _ if !rule.is_recurring() => 1,
            _ => {
                tracing::debug!(
                    rule_id = %rule.id,
                    interval = rule.recurrence.interval,
                    "Skipping rule with non-positive interval"
                );
                return None;
            }
        };

        let end_date = rule.end_date().unwrap_or_else(|e| {
            tracing::debug!(rule_id = %rule.id, error = %e, "Ignoring malformed end date");
            None
        });

        Some(Series {
            rule,
            anchor,
            start,
            interval,
            end_date,
            exceptions: rule.exception_dates(),
        })
    }

    /// Solar day of the stored lunar date. Falls back to the same fields read
    /// as a solar date, and to no lower bound when neither exists.
    fn lunar_series_start(&self, anchor: DateFields) -> NaiveDate {
        self.converter
            .lunar_to_solar(anchor.year, anchor.month, anchor.day, false)
            .or_else(|| anchor.to_solar())
            .unwrap_or(NaiveDate::MIN)
    }

    fn expand_yearly<'r>(&self, series: &Series<'r>, window: DateWindow) -> Vec<Occurrence<'r>> {
        let lunar = series.rule.is_lunar_anchored();
        let DateFields {
            year: anchor_year,
            month,
            day,
        } = series.anchor;

        // A late lunar month can land in the following solar January, so
        // lunar rules also look at the lunar year before the window.
        let lookback = i32::from(lunar);
        let lower = window
            .start()
            .year()
            .saturating_sub(lookback)
            .max(anchor_year);

        // Candidates keep the series' own cadence (anchor year + k * interval)
        // instead of restarting at the window's year, so an every-other-year
        // rule from 2020 lands on 2024 and 2026 for any window.
        let Some(first_year) = first_aligned_year(anchor_year, lower, series.interval) else {
            return Vec::new();
        };

        let mut occurrences = Vec::new();
        let mut year = first_year;

        for _ in 0..YEARLY_ITERATION_CAP {
            let candidate = if lunar {
                self.converter.lunar_to_solar(year, month, day, false)
            } else {
                solar_anniversary(year, month, day)
            };

            if let Some(candidate) = candidate {
                if candidate > window.end() || series.past_end(candidate) {
                    break;
                }

                if candidate >= series.start
                    && candidate >= window.start()
                    && !series.is_excepted(candidate)
                {
                    occurrences.push(Occurrence::new(series.rule, candidate));
                }
            }

            let Some(next) = i64::from(year)
                .checked_add(i64::from(series.interval))
                .and_then(|next| i32::try_from(next).ok())
            else {
                break;
            };
            year = next;
        }

        occurrences
    }
}

/// ## Summary
/// Expands `rules` over `window` with the given converter.
///
/// Shorthand for [`Expander::expand`].
#[must_use]
pub fn expand<'r>(
    rules: &'r [AppointmentRule],
    window: DateWindow,
    converter: &LunarConverter,
) -> Vec<Occurrence<'r>> {
    Expander::new(converter).expand(rules, window)
}

fn expand_single<'r>(series: &Series<'r>, window: DateWindow) -> Vec<Occurrence<'r>> {
    if window.contains(series.start) && !series.is_excepted(series.start) {
        vec![Occurrence::new(series.rule, series.start)]
    } else {
        Vec::new()
    }
}

fn expand_stepped<'r>(series: &Series<'r>, window: DateWindow) -> Vec<Occurrence<'r>> {
    let mut occurrences = Vec::new();
    let mut candidate = series.start.max(window.start());

    for _ in 0..DAILY_ITERATION_CAP {
        if series.past_end(candidate) || candidate > window.end() {
            break;
        }

        if candidate >= series.start
            && matches_rule(series, candidate)
            && !series.is_excepted(candidate)
        {
            occurrences.push(Occurrence::new(series.rule, candidate));
        }

        let Some(next) = candidate.succ_opt() else {
            break;
        };
        candidate = next;
    }

    occurrences
}

/// Whether `candidate` (on or after the series start) is a day the rule
/// falls on.
fn matches_rule(series: &Series<'_>, candidate: NaiveDate) -> bool {
    let interval = i64::from(series.interval);

    match series.rule.recurrence.kind {
        RecurrenceType::Daily => {
            let days = candidate.signed_duration_since(series.start).num_days();
            days >= 0 && days % interval == 0
        }
        RecurrenceType::Weekly => {
            let weekday = weekday_index(candidate);
            let on_day = if series.rule.recurrence.days_of_week.is_empty() {
                weekday == weekday_index(series.start)
            } else {
                series.rule.recurrence.days_of_week.contains(&weekday)
            };

            let weeks = week_start(candidate)
                .signed_duration_since(week_start(series.start))
                .num_days()
                / 7;
            on_day && weeks >= 0 && weeks % interval == 0
        }
        RecurrenceType::Monthly => {
            let months = i64::from(candidate.year() - series.start.year()) * 12
                + i64::from(candidate.month()) - i64::from(series.start.month());
            months >= 0 && months % interval == 0 && candidate.day() == series.start.day()
        }
        RecurrenceType::None | RecurrenceType::Yearly => false,
    }
}

/// First year `>= lower` that is a whole number of `interval`s after
/// `anchor`. Years before the anchor never qualify.
fn first_aligned_year(anchor: i32, lower: i32, interval: u32) -> Option<i32> {
    if lower <= anchor {
        return Some(anchor);
    }
    let interval = i64::from(interval);
    let gap = i64::from(lower) - i64::from(anchor);
    let steps = (gap + interval - 1) / interval;
    i32::try_from(i64::from(anchor) + steps * interval).ok()
}

/// `month`/`day` in `year`; a day past the end of the month rolls into the
/// next month (Feb 29 becomes Mar 1 in common years).
fn solar_anniversary(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
}

/// Weekday as stored in records: 0 = Sunday through 6 = Saturday.
fn weekday_index(date: NaiveDate) -> u8 {
    match date.weekday() {
        chrono::Weekday::Sun => 0,
        chrono::Weekday::Mon => 1,
        chrono::Weekday::Tue => 2,
        chrono::Weekday::Wed => 3,
        chrono::Weekday::Thu => 4,
        chrono::Weekday::Fri => 5,
        chrono::Weekday::Sat => 6,
    }
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}
