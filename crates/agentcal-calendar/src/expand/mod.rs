//! Appointment rule expansion.
//!
//! Stored [`AppointmentRule`]s are expanded into [`Occurrence`]s for a
//! [`DateWindow`]. Occurrences are never persisted; they are recomputed for
//! every query.

mod expander;
mod occurrence;
mod rule;
mod window;

pub use expander::{DAILY_ITERATION_CAP, Expander, YEARLY_ITERATION_CAP, expand};
pub use occurrence::{Occurrence, sort_occurrences};
pub use rule::{AppointmentRule, RecurrenceDescriptor};
pub use window::DateWindow;
