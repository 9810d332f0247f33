use std::path::PathBuf;

use thiserror::Error;

/// Application-level errors (command-line harness)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read rules from {path}: {source}")]
    ReadRules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule export is not a JSON array of records: {0}")]
    MalformedExport(#[source] serde_json::Error),

    #[error("Failed to render occurrences: {0}")]
    Render(#[source] serde_json::Error),

    #[error(transparent)]
    CalendarError(#[from] agentcal_calendar::error::CalendarError),

    #[error(transparent)]
    CoreError(#[from] agentcal_core::error::CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
