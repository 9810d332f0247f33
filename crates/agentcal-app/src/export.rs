//! Reading rule exports and rendering expanded occurrences.

use std::path::Path;

use agentcal_calendar::expand::{AppointmentRule, DateWindow, Expander, sort_occurrences};
use agentcal_calendar::lunar::LunarConverter;
use agentcal_core::config::ExpandConfig;
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// ## Summary
/// Parses a JSON array of appointment records.
///
/// Records that do not deserialize are logged and dropped; one bad record
/// never hides the rest of the export.
///
/// ## Errors
/// Returns `AppError::MalformedExport` if the text is not a JSON array.
pub fn parse_rules(text: &str) -> AppResult<Vec<AppointmentRule>> {
    let records: Vec<Value> = serde_json::from_str(text).map_err(AppError::MalformedExport)?;
    let total = records.len();

    let rules: Vec<AppointmentRule> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping malformed appointment record");
                None
            }
        })
        .collect();

    tracing::debug!(total, loaded = rules.len(), "Parsed appointment records");
    Ok(rules)
}

/// ## Summary
/// Reads and parses the rule export at `path`.
///
/// ## Errors
/// Returns `AppError::ReadRules` if the file cannot be read, or
/// `AppError::MalformedExport` if it is not a JSON array.
pub fn load_rules(path: &Path) -> AppResult<Vec<AppointmentRule>> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadRules {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rules(&text)
}

/// ## Summary
/// Expands `rules` over `window` and renders the sorted occurrences as a
/// pretty-printed JSON array.
///
/// ## Errors
/// Returns `AppError::Render` if serialization fails.
pub fn render_window(
    rules: &[AppointmentRule],
    window: DateWindow,
    converter: &LunarConverter,
) -> AppResult<String> {
    let mut occurrences = Expander::new(converter).expand(rules, window);
    sort_occurrences(&mut occurrences);

    tracing::info!(
        start = %window.start(),
        end = %window.end(),
        count = occurrences.len(),
        "Expanded appointment window"
    );

    serde_json::to_string_pretty(&occurrences).map_err(AppError::Render)
}

/// ## Summary
/// Resolves the configured window relative to `today`.
///
/// ## Errors
/// Returns `AppError::CoreError` if the configured bounds are inverted.
pub fn configured_window(config: &ExpandConfig, today: NaiveDate) -> AppResult<DateWindow> {
    let (start, end) = config.window_bounds(today)?;
    Ok(DateWindow::new(start, end)?)
}

/// ## Summary
/// Loads the configured export and renders the configured window.
///
/// ## Errors
/// Propagates read, parse, window and render errors.
pub fn run(config: &ExpandConfig, today: NaiveDate) -> AppResult<String> {
    let window = configured_window(config, today)?;
    let rules = load_rules(Path::new(&config.rules_path))?;
    render_window(&rules, window, &LunarConverter::korean())
}
