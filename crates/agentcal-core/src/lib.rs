//! Shared building blocks for the agentcal workspace: errors, configuration,
//! common types, and local-date helpers.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
