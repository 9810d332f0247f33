//! Command-line harness around the appointment calendar: loads an exported
//! rule list, expands it over a window and renders the occurrences as JSON.

pub mod error;
pub mod export;
