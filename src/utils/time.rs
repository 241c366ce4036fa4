use chrono::{Datelike, TimeZone, Utc};
use mongodb::bson::DateTime;

pub fn to_utc(value: DateTime) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(value.timestamp_millis())
        .single()
        .unwrap_or_default()
}

pub fn from_utc(value: chrono::DateTime<Utc>) -> DateTime {
    DateTime::from_millis(value.timestamp_millis())
}

pub fn to_rfc3339(value: DateTime) -> String {
    to_utc(value).to_rfc3339()
}

/// Months since year 0; consecutive calendar months differ by one.
pub fn month_index(value: chrono::DateTime<Utc>) -> i32 {
    value.year() * 12 + value.month0() as i32
}
