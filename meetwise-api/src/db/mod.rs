//! Database access layer for meetwise-api
//!
//! Plain runtime `sqlx` queries over the schema created by
//! `meetwise_common::db::init`. Ids are stored as hyphenated UUID text and
//! timestamps via `meetwise_common::time::to_storage`.

pub mod action_items;
pub mod dossiers;
pub mod meetings;
pub mod practice;
pub mod users;

use chrono::{DateTime, NaiveDate, Utc};
use meetwise_common::{time, Error, Result};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid stored id '{}': {}", value, e)))
}

pub(crate) fn parse_opt_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    time::from_storage(value)
}

pub(crate) fn parse_opt_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

pub(crate) fn parse_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("Invalid stored date '{}': {}", s, e)))
        })
        .transpose()
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Internal(format!("Failed to serialize: {}", e)))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|e| Error::Internal(format!("Failed to deserialize: {}", e)))
}
