//! Core data types for message tracking values and currencies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Type of a tracked field, as recorded by the server.
///
/// Tracking values are not always stored in the same field type as their
/// origin field; only the types listed here get a dedicated formatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Boolean,
    Char,
    Date,
    Datetime,
    Float,
    Integer,
    Many2one,
    Monetary,
    Selection,
    Text,
    /// Any type without a formatter; values pass through unformatted.
    Other(String),
}

impl FieldType {
    /// Name of the field type as used on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Char => "char",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Many2one => "many2one",
            FieldType::Monetary => "monetary",
            FieldType::Selection => "selection",
            FieldType::Text => "text",
            FieldType::Other(name) => name,
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        match value {
            "boolean" => FieldType::Boolean,
            "char" => FieldType::Char,
            "date" => FieldType::Date,
            "datetime" => FieldType::Datetime,
            "float" => FieldType::Float,
            "integer" => FieldType::Integer,
            "many2one" => FieldType::Many2one,
            "monetary" => FieldType::Monetary,
            "selection" => FieldType::Selection,
            "text" => FieldType::Text,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::from(value.as_str())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded old/new pair for an audited field change on a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingValue {
    /// Server identifier of the tracking value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Label of the changed field
    pub changed_field: String,
    /// Type the values are stored as
    pub field_type: FieldType,
    /// Value before the change
    #[serde(default)]
    pub old_value: Value,
    /// Value after the change
    #[serde(default)]
    pub new_value: Value,
    /// Currency of monetary values; `false` on the wire means none
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_record_id"
    )]
    pub currency_id: Option<i64>,
}

fn deserialize_record_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {n}"))),
        other => Err(serde::de::Error::custom(format!(
            "invalid record id: {other}"
        ))),
    }
}

impl TrackingValue {
    /// Create a tracking value without currency.
    pub fn new(
        changed_field: &str,
        field_type: impl Into<FieldType>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self {
            id: None,
            changed_field: changed_field.to_string(),
            field_type: field_type.into(),
            old_value,
            new_value,
            currency_id: None,
        }
    }

    /// Attach a currency to a monetary tracking value.
    pub fn with_currency(mut self, currency_id: i64) -> Self {
        self.currency_id = Some(currency_id);
        self
    }
}

/// Placement of the currency symbol relative to the amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    #[default]
    Before,
    After,
}

/// Total digits recorded when a currency only specifies its decimals.
pub const DEFAULT_TOTAL_DIGITS: u32 = 69;

/// A currency known to the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Currency {
    /// Currency identifier referenced by `currency_id`
    pub id: i64,
    /// Display symbol (e.g. "$")
    pub symbol: String,
    /// Where the symbol goes
    #[serde(default)]
    pub position: CurrencyPosition,
    /// Total and decimal digits; only the decimals are used for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digits: Option<(u32, u32)>,
}

impl Currency {
    /// Create a currency displayed before the amount with two decimals.
    pub fn new(id: i64, symbol: &str) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            position: CurrencyPosition::Before,
            digits: None,
        }
    }

    /// Set the symbol position.
    pub fn with_position(mut self, position: CurrencyPosition) -> Self {
        self.position = position;
        self
    }

    /// Set the number of decimals.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.digits = Some((DEFAULT_TOTAL_DIGITS, decimals));
        self
    }

    /// Number of decimals used when formatting amounts.
    pub fn decimals(&self) -> u32 {
        self.digits.map(|(_, decimals)| decimals).unwrap_or(2)
    }
}

/// Session currency table, keyed by currency id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyTable {
    currencies: HashMap<i64, Currency>,
}

impl CurrencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a currency.
    pub fn insert(&mut self, currency: Currency) {
        self.currencies.insert(currency.id, currency);
    }

    /// Look up a currency by id.
    pub fn get(&self, id: i64) -> Option<&Currency> {
        self.currencies.get(&id)
    }

    /// Number of known currencies.
    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

impl FromIterator<Currency> for CurrencyTable {
    fn from_iter<I: IntoIterator<Item = Currency>>(iter: I) -> Self {
        let mut table = CurrencyTable::new();
        for currency in iter {
            table.insert(currency);
        }
        table
    }
}

/// API response wrapper used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
