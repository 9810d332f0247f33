//! Appointment calendar core: lunar/solar date conversion and expansion of
//! appointment rules into concrete occurrences.
//!
//! ```no_run
//! use agentcal_calendar::expand::{AppointmentRule, DateWindow, expand};
//! use agentcal_calendar::lunar::LunarConverter;
//!
//! # fn rules() -> Vec<AppointmentRule> { Vec::new() }
//! let converter = LunarConverter::korean();
//! let rules = rules();
//! if let Some(window) = DateWindow::month(2025, 6) {
//!     let occurrences = expand(&rules, window, &converter);
//!     println!("{} appointments in June", occurrences.len());
//! }
//! ```

pub mod error;
pub mod expand;
pub mod lunar;
