//! Configuration loading for locale, timezone and session currencies.

use crate::types::{Currency, CurrencyTable};
use crate::Result;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Locale rules for numbers and dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Localization {
    /// Decimal separator
    pub decimal_point: String,
    /// Thousands separator
    pub thousands_sep: String,
    /// Digit grouping, right to left; `0` repeats the previous size, `-1` stops
    pub grouping: Vec<i32>,
    /// strftime format for dates
    pub date_format: String,
    /// strftime format for times
    pub time_format: String,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            decimal_point: ".".to_string(),
            thousands_sep: ",".to_string(),
            grouping: vec![3, 0],
            date_format: "%m/%d/%Y".to_string(),
            time_format: "%H:%M:%S".to_string(),
        }
    }
}

impl Localization {
    /// strftime format for datetimes.
    pub fn datetime_format(&self) -> String {
        format!("{} {}", self.date_format, self.time_format)
    }
}

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Catalog locale; detected from the environment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Offset of the user's timezone from UTC, in minutes
    pub tz_offset_minutes: i32,
    /// Number and date rules
    pub localization: Localization,
    /// Session currencies
    pub currencies: Vec<Currency>,
}

impl Config {
    /// Load the configuration from the default path.
    ///
    /// Default path: `~/.mail-message/config.toml`
    /// Can be overridden with `MAIL_MESSAGE_CONFIG` environment variable.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Get the default configuration file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("MAIL_MESSAGE_CONFIG") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".mail-message/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load the configuration from a specific path.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(
            "Loaded config from {} ({} currencies)",
            path.display(),
            config.currencies.len()
        );
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build the session currency table.
    pub fn currency_table(&self) -> CurrencyTable {
        self.currencies.iter().cloned().collect()
    }

    /// The configured timezone offset, UTC when out of range.
    pub fn timezone(&self) -> FixedOffset {
        let offset = self
            .tz_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        offset.unwrap_or_else(|| {
            tracing::warn!(
                "Timezone offset out of range: {} minutes",
                self.tz_offset_minutes
            );
            Utc.fix()
        })
    }
}
