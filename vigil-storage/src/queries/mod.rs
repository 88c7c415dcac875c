//! SQL query modules plus the column codecs they share.

pub mod actions;
pub mod alerts;
pub mod notifications;
pub mod rules;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use vigil_core::errors::{StorageError, VigilError, VigilResult};

use crate::to_storage_err;

/// Fixed-width RFC 3339 so TEXT ordering is chronological.
pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn opt_ts(at: Option<&DateTime<Utc>>) -> Option<String> {
    at.map(ts)
}

pub(crate) fn parse_ts(column: &str, value: &str) -> VigilResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| corrupt(column, value))
}

pub(crate) fn parse_opt_ts(column: &str, value: Option<String>) -> VigilResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(column, &v)).transpose()
}

/// Decode an enum stored by name.
pub(crate) fn parse_name<T>(column: &str, value: &str, parse: fn(&str) -> Option<T>) -> VigilResult<T> {
    parse(value).ok_or_else(|| corrupt(column, value))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> VigilResult<String> {
    serde_json::to_string(value).map_err(|e| to_storage_err(e.to_string()))
}

pub(crate) fn from_json<T: DeserializeOwned>(column: &str, value: &str) -> VigilResult<T> {
    serde_json::from_str(value).map_err(|_| corrupt(column, value))
}

pub(crate) fn corrupt(column: &str, value: &str) -> VigilError {
    StorageError::CorruptValue {
        column: column.to_string(),
        value: value.to_string(),
    }
    .into()
}
