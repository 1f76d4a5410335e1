//! Field helpers shared by the models
//!
//! Timestamps are RFC 3339 UTC strings with millisecond precision, so that
//! their lexical order is their chronological order. The [`lenient`]
//! deserializers accept the loosely typed values web clients send.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a timestamp the way documents store it
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time as a stored timestamp
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date into a stored timestamp.
///
/// Dates without a time are taken as midnight UTC.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(format_timestamp(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| format_timestamp(naive.and_utc()))
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Coerce `true`/`"true"`/`false`/`"false"`, anything else is `None`
pub fn coerce_bool(value: &serde_json::Value) -> Option<bool> {
    use serde_json::Value;
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

/// Coerce a query-string flag the same way as [`coerce_bool`]
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Serde helpers for loosely typed request fields
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Strings, numbers and booleans as text; `null` as `None`
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_text))
    }

    /// Like [`text`], with `null` or a missing value read as `""`
    pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text(deserializer)?.unwrap_or_default())
    }

    /// A nested record; a value of the wrong shape is `None`
    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    /// Boolean-like values; anything unrecognised is `None`
    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .as_ref()
            .and_then(super::coerce_bool))
    }

    /// Numbers and numeric strings; anything else is `None`
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        })
    }

    /// An array of strings; a non-array is `None`
    pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => Some(items.into_iter().filter_map(scalar_text).collect()),
            _ => None,
        })
    }

    /// Any array; a non-array is `None`
    pub fn list<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        })
    }

    /// A decimal amount kept as text, accepting numbers too
    pub fn amount<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .and_then(scalar_text)
            .unwrap_or_else(super::zero_amount))
    }
}

/// Default for stored decimal counters such as `walletAmount`
pub fn zero_amount() -> String {
    "0.0".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}
