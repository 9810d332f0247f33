use chrono::NaiveDate;
use thiserror::Error;

use crate::lunar::LunarError;

/// Calendar conversion and expansion errors
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    LunarError(#[from] LunarError),

    #[error(transparent)]
    CoreError(#[from] agentcal_core::error::CoreError),
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
