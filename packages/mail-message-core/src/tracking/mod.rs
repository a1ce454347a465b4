//! Tracking value formatting.
//!
//! Turns the raw old/new values of audited field changes into display
//! strings according to the field type, the user's localization and the
//! session currencies.

pub mod format;

use crate::config::{Config, Localization};
use crate::i18n::Catalog;
use crate::types::{CurrencyTable, FieldType, TrackingValue};
use crate::Result;
use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

/// Formats tracking values for display.
#[derive(Debug, Clone)]
pub struct TrackingFormatter {
    catalog: Catalog,
    localization: Localization,
    currencies: CurrencyTable,
    timezone: FixedOffset,
}

impl TrackingFormatter {
    /// Create a formatter.
    pub fn new(
        catalog: Catalog,
        localization: Localization,
        currencies: CurrencyTable,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            catalog,
            localization,
            currencies,
            timezone,
        }
    }

    /// Create a formatter from user configuration.
    pub fn from_config(config: &Config, catalog: Catalog) -> Self {
        Self::new(
            catalog,
            config.localization.clone(),
            config.currency_table(),
            config.timezone(),
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn localization(&self) -> &Localization {
        &self.localization
    }

    /// Format every entry, preserving order.
    ///
    /// Fails on the first value whose shape does not match its field type.
    pub fn format_tracking_values(&self, entries: &[TrackingValue]) -> Result<Vec<TrackingValue>> {
        let formatted = entries
            .iter()
            .map(|entry| self.format_tracking_value(entry))
            .collect::<Result<Vec<_>>>()?;
        debug!("Formatted {} tracking values", formatted.len());
        Ok(formatted)
    }

    /// Format a single entry.
    ///
    /// The changed field label gets its trailing colon; values are replaced
    /// by their display strings, except for field types without a
    /// formatter whose values are kept as-is.
    pub fn format_tracking_value(&self, entry: &TrackingValue) -> Result<TrackingValue> {
        let old_value = self.format_value(&entry.field_type, &entry.old_value, entry.currency_id)?;
        let new_value = self.format_value(&entry.field_type, &entry.new_value, entry.currency_id)?;

        Ok(TrackingValue {
            id: entry.id,
            changed_field: self
                .catalog
                .format("{field}:", &[("field", &entry.changed_field)]),
            field_type: entry.field_type.clone(),
            old_value,
            new_value,
            currency_id: entry.currency_id,
        })
    }

    /// Format one raw value of the given field type.
    pub fn format_value(
        &self,
        field_type: &FieldType,
        value: &Value,
        currency_id: Option<i64>,
    ) -> Result<Value> {
        let loc = &self.localization;
        let text = match field_type {
            FieldType::Boolean => format::format_boolean(value, &self.catalog),
            FieldType::Char | FieldType::Many2one | FieldType::Selection => {
                format::format_char(value)
            }
            FieldType::Text => format::format_text(value),
            FieldType::Date => format::format_date(format::parse_utc_date(value)?, loc)?,
            FieldType::Datetime => {
                format::format_datetime(format::parse_utc_datetime(value)?, self.timezone, loc)?
            }
            FieldType::Float => format::format_float(value, format::DEFAULT_PRECISION, loc)?,
            FieldType::Integer => format::format_integer(value, loc)?,
            FieldType::Monetary => {
                let currency = currency_id.and_then(|id| {
                    let currency = self.currencies.get(id);
                    if currency.is_none() {
                        warn!("Unknown currency {}, formatting amount without symbol", id);
                    }
                    currency
                });
                format::format_monetary(value, currency, loc)?
            }
            FieldType::Other(name) => {
                debug!("No formatter for field type {}, keeping raw value", name);
                return Ok(value.clone());
            }
        };
        Ok(Value::String(text))
    }
}

impl Default for TrackingFormatter {
    fn default() -> Self {
        Self::new(
            Catalog::default(),
            Localization::default(),
            CurrencyTable::new(),
            Utc.fix(),
        )
    }
}
