//! Stored appointment records ("series heads") as consumed by the expander.

use std::collections::{BTreeSet, HashSet};

use agentcal_core::constants::{OCCURRENCE_ID_SEPARATOR, SUPPRESSED_MEETING_TYPE};
use agentcal_core::error::{CoreError, CoreResult};
use agentcal_core::types::RecurrenceType;
use agentcal_core::util::date::{
    DateFields, format_iso_date, parse_date_fields, parse_local_date, parse_time_of_day,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// ## Summary
/// How an appointment repeats.
///
/// Serialized flattened into the appointment record under the
/// `recurrence*` field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDescriptor {
    #[serde(rename = "recurrenceType", default, deserialize_with = "null_as_default")]
    pub kind: RecurrenceType,

    /// Step between occurrences in units of `kind`. Values below 1 are
    /// malformed and cause the rule to be skipped.
    #[serde(
        rename = "recurrenceInterval",
        default = "default_interval",
        deserialize_with = "interval_or_default"
    )]
    pub interval: i64,

    /// Weekday indices, 0 = Sunday through 6 = Saturday. Weekly only.
    #[serde(
        rename = "recurrenceDays",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub days_of_week: BTreeSet<u8>,

    /// Inclusive last day of the series, as stored.
    #[serde(
        rename = "recurrenceEndDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<String>,
}

impl Default for RecurrenceDescriptor {
    fn default() -> Self {
        Self {
            kind: RecurrenceType::None,
            interval: default_interval(),
            days_of_week: BTreeSet::new(),
            end_date: None,
        }
    }
}

impl RecurrenceDescriptor {
    #[must_use]
    pub fn new(kind: RecurrenceType, interval: i64) -> Self {
        Self {
            kind,
            interval,
            ..Self::default()
        }
    }
}

/// ## Summary
/// A stored appointment definition.
///
/// Dates are kept as the raw strings found in the record; they are parsed
/// when the rule is expanded so that one malformed record only drops itself.
/// Fields the expander does not interpret are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRule {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    /// First occurrence, `YYYY-MM-DD`. For lunar-anchored rules this is the
    /// lunar date.
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<String>,

    #[serde(flatten)]
    pub recurrence: RecurrenceDescriptor,

    /// Occurrence dates cancelled from the series.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exceptions: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_lunar: bool,

    /// Unrecognised record fields. Keys that expansion derives
    /// (`occurrenceDate`, `occurrenceId`) are never written back out.
    #[serde(flatten, serialize_with = "serialize_extra")]
    pub extra: Map<String, Value>,
}

impl AppointmentRule {
    /// Creates a one-time appointment on `date`.
    #[must_use]
    pub fn new(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            customer_id: None,
            date: date.into(),
            time: None,
            meeting_type: None,
            recurrence: RecurrenceDescriptor::default(),
            exceptions: Vec::new(),
            is_lunar: false,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_recurrence(mut self, kind: RecurrenceType, interval: i64) -> Self {
        self.recurrence.kind = kind;
        self.recurrence.interval = interval;
        self
    }

    #[must_use]
    pub fn with_days_of_week(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.recurrence.days_of_week = days.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.recurrence.end_date = Some(end_date.into());
        self
    }

    #[must_use]
    pub fn with_exception(mut self, date: impl Into<String>) -> Self {
        self.exceptions.push(date.into());
        self
    }

    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    #[must_use]
    pub fn with_meeting_type(mut self, meeting_type: impl Into<String>) -> Self {
        self.meeting_type = Some(meeting_type.into());
        self
    }

    #[must_use]
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    #[must_use]
    pub fn lunar(mut self) -> Self {
        self.is_lunar = true;
        self
    }

    /// ## Summary
    /// Parses the stored base date as a local calendar date.
    ///
    /// ## Errors
    /// Returns `CoreError::ParseError` if the stored date is malformed.
    pub fn base_date(&self) -> CoreResult<NaiveDate> {
        parse_local_date(&self.date)
    }

    /// ## Summary
    /// Reads the stored base date as a lunar year, month and day.
    ///
    /// No Gregorian check is applied: `1990-02-30` is a valid lunar day.
    ///
    /// ## Errors
    /// Returns `CoreError::ParseError` if the date is not `YYYY-MM-DD`, or
    /// `CoreError::ValidationError` if the month is outside 1-12 or the day
    /// outside 1-30.
    pub fn lunar_base(&self) -> CoreResult<DateFields> {
        let fields = parse_date_fields(&self.date)?;
        if !(1..=12).contains(&fields.month) || !(1..=30).contains(&fields.day) {
            return Err(CoreError::ValidationError(format!(
                "lunar date {:?} has no month {} day {}",
                self.date, fields.month, fields.day
            )));
        }
        Ok(fields)
    }

    /// ## Summary
    /// Parses the stored series end date.
    ///
    /// A missing or blank end date is `Ok(None)`.
    ///
    /// ## Errors
    /// Returns `CoreError::ParseError` if a non-blank end date is malformed.
    pub fn end_date(&self) -> CoreResult<Option<NaiveDate>> {
        match self.recurrence.end_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_local_date(value).map(Some),
        }
    }

    /// Parsed exception dates; malformed entries are dropped.
    #[must_use]
    pub fn exception_dates(&self) -> HashSet<NaiveDate> {
        self.exceptions
            .iter()
            .filter_map(|value| match parse_local_date(value) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::debug!(rule_id = %self.id, error = %e, "Ignoring malformed exception date");
                    None
                }
            })
            .collect()
    }

    /// Parsed time of day, if present and well formed.
    #[must_use]
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        self.time.as_deref().and_then(|t| parse_time_of_day(t).ok())
    }

    #[must_use]
    pub fn is_recurring(&self) -> bool {
        self.recurrence.kind.is_recurring()
    }

    /// `true` when the base date is a lunar date repeated every lunar year.
    /// The lunar flag is ignored for other recurrence types.
    #[must_use]
    pub fn is_lunar_anchored(&self) -> bool {
        self.is_lunar && self.recurrence.kind == RecurrenceType::Yearly
    }

    /// `true` for meeting types that never appear on the calendar.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.meeting_type.as_deref() == Some(SUPPRESSED_MEETING_TYPE)
    }

    /// ## Summary
    /// Stable id for the occurrence of this rule on `date`.
    ///
    /// One-time appointments reuse the rule id; recurring ones append the
    /// occurrence date.
    #[must_use]
    pub fn occurrence_id(&self, date: NaiveDate) -> String {
        if self.is_recurring() {
            format!("{}{OCCURRENCE_ID_SEPARATOR}{}", self.id, format_iso_date(date))
        } else {
            self.id.clone()
        }
    }
}

/// Fields computed per occurrence; stale copies in a stored record are dropped.
const DERIVED_FIELDS: [&str; 2] = ["occurrenceDate", "occurrenceId"];

fn serialize_extra<S>(extra: &Map<String, Value>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(
        extra
            .iter()
            .filter(|(key, _)| !DERIVED_FIELDS.contains(&key.as_str())),
    )
}

const fn default_interval() -> i64 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn interval_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_else(default_interval))
}

/// Older records store numeric ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_deserialize_full_record() {
        let rule: AppointmentRule = serde_json::from_value(json!({
            "id": "apt-1",
            "customerId": "cust-9",
            "date": "2024-01-15",
            "time": "14:30",
            "meetingType": "visit",
            "recurrenceType": "weekly",
            "recurrenceInterval": 2,
            "recurrenceDays": [1, 3],
            "recurrenceEndDate": "2024-06-30",
            "exceptions": ["2024-01-29"],
            "isLunar": false,
            "title": "Policy review",
            "memo": "bring renewal papers"
        }))
        .expect("record should deserialize");

        assert_eq!(rule.id, "apt-1");
        assert_eq!(rule.customer_id.as_deref(), Some("cust-9"));
        assert_eq!(rule.recurrence.kind, RecurrenceType::Weekly);
        assert_eq!(rule.recurrence.interval, 2);
        assert_eq!(rule.recurrence.days_of_week, BTreeSet::from([1, 3]));
        assert_eq!(rule.end_date().unwrap(), Some(date(2024, 6, 30)));
        assert_eq!(rule.exception_dates(), HashSet::from([date(2024, 1, 29)]));
        assert_eq!(rule.time_of_day(), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(rule.extra.get("title"), Some(&json!("Policy review")));
        assert_eq!(rule.extra.get("memo"), Some(&json!("bring renewal papers")));
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let rule: AppointmentRule =
            serde_json::from_value(json!({"id": 1_700_000_000_000_i64, "date": "2024-03-01"}))
                .expect("minimal record should deserialize");

        assert_eq!(rule.id, "1700000000000");
        assert_eq!(rule.recurrence, RecurrenceDescriptor::default());
        assert_eq!(rule.recurrence.interval, 1);
        assert!(!rule.is_recurring());
        assert!(!rule.is_lunar);
        assert!(rule.exceptions.is_empty());
    }

    #[test]
    fn test_nulls_fall_back_to_defaults() {
        let rule: AppointmentRule = serde_json::from_value(json!({
            "id": "apt-2",
            "date": "2024-03-01",
            "recurrenceType": null,
            "recurrenceInterval": null,
            "recurrenceDays": null,
            "recurrenceEndDate": null,
            "exceptions": null,
            "isLunar": null
        }))
        .expect("nulls should be tolerated");

        assert_eq!(rule.recurrence.kind, RecurrenceType::None);
        assert_eq!(rule.recurrence.interval, 1);
        assert!(rule.recurrence.days_of_week.is_empty());
        assert_eq!(rule.end_date().unwrap(), None);
    }

    #[test]
    fn test_blank_end_date_is_open_ended() {
        let rule = AppointmentRule::new("a", "2024-01-01").with_end_date("  ");
        assert_eq!(rule.end_date().unwrap(), None);

        let rule = AppointmentRule::new("a", "2024-01-01").with_end_date("someday");
        assert!(rule.end_date().is_err());
    }

    #[test_log::test]
    fn test_malformed_exceptions_are_dropped() {
        let rule = AppointmentRule::new("a", "2024-01-01")
            .with_exception("2024-01-08")
            .with_exception("garbage");

        assert_eq!(rule.exception_dates(), HashSet::from([date(2024, 1, 8)]));
    }

    #[test]
    fn test_lunar_base_accepts_lunar_only_days() {
        let rule = AppointmentRule::new("a", "1990-02-30")
            .with_recurrence(RecurrenceType::Yearly, 1)
            .lunar();

        assert!(rule.base_date().is_err());
        let base = rule.lunar_base().unwrap();
        assert_eq!((base.year, base.month, base.day), (1990, 2, 30));
        assert!(rule.is_lunar_anchored());
    }

    #[test]
    fn test_lunar_base_rejects_impossible_days() {
        for date in ["1990-13-01", "1990-00-10", "1990-02-31", "1990-02-00", "soon"] {
            let rule = AppointmentRule::new("a", date).lunar();
            assert!(rule.lunar_base().is_err(), "{date}");
        }
    }

    #[test]
    fn test_lunar_flag_only_anchors_yearly_rules() {
        let rule = AppointmentRule::new("a", "1990-02-03")
            .with_recurrence(RecurrenceType::Monthly, 1)
            .lunar();
        assert!(!rule.is_lunar_anchored());
    }

    #[test]
    fn test_occurrence_id_format() {
        let once = AppointmentRule::new("apt-7", "2024-01-15");
        assert_eq!(once.occurrence_id(date(2024, 1, 15)), "apt-7");

        let monthly = once.with_recurrence(RecurrenceType::Monthly, 1);
        assert_eq!(monthly.occurrence_id(date(2024, 2, 15)), "apt-7_2024-02-15");
    }

    #[test]
    fn test_suppressed_meeting_type() {
        let rule = AppointmentRule::new("a", "2024-01-01").with_meeting_type("TA");
        assert!(rule.is_suppressed());

        let rule = AppointmentRule::new("a", "2024-01-01").with_meeting_type("visit");
        assert!(!rule.is_suppressed());
    }

    #[test]
    fn test_serialize_drops_derived_fields_from_extra() {
        let rule: AppointmentRule = serde_json::from_value(json!({
            "id": "apt-4",
            "date": "2024-01-01",
            "occurrenceId": "apt-4_2023-12-25",
            "occurrenceDate": "2023-12-25",
            "title": "Renewal"
        }))
        .unwrap();

        let value = serde_json::to_value(&rule).unwrap();
        assert!(value.get("occurrenceId").is_none());
        assert!(value.get("occurrenceDate").is_none());
        assert_eq!(value["title"], json!("Renewal"));
    }

    #[test]
    fn test_serialize_uses_record_field_names() {
        let rule = AppointmentRule::new("apt-3", "1990-06-05")
            .with_recurrence(RecurrenceType::Yearly, 1)
            .lunar();
        let value = serde_json::to_value(&rule).unwrap();

        assert_eq!(value["recurrenceType"], json!("yearly"));
        assert_eq!(value["recurrenceInterval"], json!(1));
        assert_eq!(value["isLunar"], json!(true));
        assert!(value.get("recurrenceDays").is_none());
    }
}
