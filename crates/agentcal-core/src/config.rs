use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, FileFormat};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub expand: ExpandConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpandConfig {
    /// Path of the JSON rule export to expand.
    pub rules_path: String,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
}

impl ExpandConfig {
    /// ## Summary
    /// Resolves the configured window, falling back to the calendar month
    /// containing `today` for whichever bound is missing.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the resolved start is after the end.
    pub fn window_bounds(&self, today: NaiveDate) -> CoreResult<(NaiveDate, NaiveDate)> {
        let month_start = today.with_day(1).unwrap_or(today);
        let month_end = month_start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);

        let start = self.window_start.unwrap_or(month_start);
        let end = self.window_end.unwrap_or(month_end);

        if start > end {
            return Err(CoreError::ConfigError(format!(
                "expand window start {start} is after end {end}"
            )));
        }

        Ok((start, end))
    }
}

impl Settings {
    fn builder() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("logging.level", "info")?
            .set_default("expand.rules_path", "rules.json")?)
    }

    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::builder()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env, e.g. AGENTCAL__EXPAND__RULES_PATH
            .add_source(
                config::Environment::with_prefix("AGENTCAL")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Builds settings from TOML text layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the text is not valid TOML or does not deserialize.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(Self::builder()?
            .add_source(config::File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) => tracing::trace!(error = %e, "No .env file loaded"),
    }

    Settings::load()
}
